use crate::error::{AirulesError, Result};
use crate::remote::{Fetcher, RequestContext, RuleSet, RuleSetType, RuleStream, fetch_url};
use reqwest::blocking::{Client, Response};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_RAW_URL: &str = "https://raw.githubusercontent.com";
pub const DEFAULT_OWNER: &str = "PatrickJS";
pub const DEFAULT_REPO: &str = "awesome-cursorrules";
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_RULES_PATH: &str = "rules";

const GITHUB_JSON: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!("airules/", env!("CARGO_PKG_VERSION"));

const RULE_FILE_SUFFIXES: [&str; 2] = [".mdc", ".rules"];
const RESERVED_RULE_FILE: &str = ".cursorrules";

/// One entry of a GitHub contents listing.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubContent {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

impl GitHubContent {
    fn is_dir(&self) -> bool {
        self.kind == "dir"
    }

    fn is_file(&self) -> bool {
        self.kind == "file"
    }
}

fn is_rule_file_name(name: &str) -> bool {
    if name == RESERVED_RULE_FILE {
        return true;
    }
    let mut suffixes = RULE_FILE_SUFFIXES.iter();
    suffixes.any(|suffix| name.ends_with(suffix))
}

/// First file entry whose name looks like a rules file.
pub fn select_rule_file(contents: &[GitHubContent]) -> Option<&GitHubContent> {
    contents
        .iter()
        .filter(|entry| entry.is_file())
        .find(|entry| is_rule_file_name(&entry.name))
}

/// Lists and downloads rule sets through the GitHub contents API.
#[derive(Debug, Clone)]
pub struct GitHubFetcher {
    client: Client,
    api_url: String,
    raw_url: String,
    owner: String,
    repo: String,
    branch: String,
    rules_path: String,
    token: Option<String>,
}

impl GitHubFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|source| AirulesError::Network {
                url: DEFAULT_API_URL.to_string(),
                source,
            })?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            api_url: DEFAULT_API_URL.to_string(),
            raw_url: DEFAULT_RAW_URL.to_string(),
            owner: DEFAULT_OWNER.to_string(),
            repo: DEFAULT_REPO.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            rules_path: DEFAULT_RULES_PATH.to_string(),
            token: None,
        }
    }

    pub fn api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn raw_url(mut self, raw_url: impl Into<String>) -> Self {
        self.raw_url = raw_url.into();
        self
    }

    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = repo.into();
        self
    }

    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn rules_path(mut self, rules_path: impl Into<String>) -> Self {
        self.rules_path = rules_path.into();
        self
    }

    pub fn token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|value| !value.trim().is_empty());
        self
    }

    pub fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_url.trim_end_matches('/'),
            self.owner,
            self.repo,
            path.trim_matches('/')
        )
    }

    // Used when a listing entry carries no download_url.
    fn raw_file_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.raw_url.trim_end_matches('/'),
            self.owner,
            self.repo,
            self.branch,
            path.trim_matches('/')
        )
    }

    fn get(&self, ctx: &RequestContext, url: &str) -> Result<Response> {
        let mut request = self.client.get(url).header(ACCEPT, GITHUB_JSON);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        fetch_url(ctx, request, url)
    }

    fn list_contents(&self, ctx: &RequestContext, path: &str) -> Result<Vec<GitHubContent>> {
        let url = self.contents_url(path);
        let body = self
            .get(ctx, &url)?
            .bytes()
            .map_err(|source| AirulesError::Network {
                url: url.clone(),
                source,
            })?;
        serde_json::from_slice(&body)
            .map_err(|source| AirulesError::RemoteDecode { url, source })
    }
}

impl Fetcher for GitHubFetcher {
    fn list_rule_sets(&self, ctx: &RequestContext) -> Result<Vec<RuleSet>> {
        let contents = self.list_contents(ctx, &self.rules_path)?;
        let rule_sets: Vec<RuleSet> = contents
            .into_iter()
            .filter(GitHubContent::is_dir)
            .map(|entry| RuleSet {
                kind: RuleSetType::classify(&entry.name),
                description: String::new(),
                url: entry.html_url.unwrap_or_default(),
                name: entry.name,
                path: entry.path,
            })
            .collect();
        debug!(count = rule_sets.len(), "listed rule sets");
        Ok(rule_sets)
    }

    fn fetch_rule_set(&self, ctx: &RequestContext, rule_set: &RuleSet) -> Result<RuleStream> {
        let contents = self.list_contents(ctx, &rule_set.path)?;
        let Some(rule_file) = select_rule_file(&contents) else {
            return Err(AirulesError::RuleFileNotFound {
                name: rule_set.name.clone(),
            });
        };
        debug!(rule_set = %rule_set.name, file = %rule_file.name, "selected rule file");

        let url = rule_file
            .download_url
            .clone()
            .unwrap_or_else(|| self.raw_file_url(&rule_file.path));
        let response = fetch_url(ctx, self.client.get(&url), &url)?;
        Ok(Box::new(response))
    }
}
