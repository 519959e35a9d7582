//! Remote rule sets: discovery and download.

pub mod context;
pub mod github;
pub mod lookup;

pub use context::{ContextReader, RequestContext};
pub use github::GitHubFetcher;
pub use lookup::{Lookup, lookup, of_kind, short_name};

use crate::editor::EditorKind;
use crate::error::{AirulesError, Result};
use reqwest::StatusCode;
use reqwest::blocking::{RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use tracing::debug;

/// Body of a downloaded rule file. Dropping it releases the connection.
pub type RuleStream = Box<dyn Read + Send>;

/// Target editor inferred from a rule set's directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSetType {
    Cursor,
    Windsurf,
    Unknown,
}

impl RuleSetType {
    /// Case-insensitive substring match; "cursor" wins over "windsurf".
    pub fn classify(name: &str) -> Self {
        let lowered = name.to_lowercase();
        if lowered.contains("cursor") {
            RuleSetType::Cursor
        } else if lowered.contains("windsurf") {
            RuleSetType::Windsurf
        } else {
            RuleSetType::Unknown
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RuleSetType::Cursor => "cursor",
            RuleSetType::Windsurf => "windsurf",
            RuleSetType::Unknown => "unknown",
        }
    }
}

impl From<EditorKind> for RuleSetType {
    fn from(editor: EditorKind) -> Self {
        match editor {
            EditorKind::Cursor => RuleSetType::Cursor,
            EditorKind::Windsurf => RuleSetType::Windsurf,
        }
    }
}

impl fmt::Display for RuleSetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub name: String,
    pub description: String,
    pub url: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: RuleSetType,
}

pub trait Fetcher {
    /// Rule-set directories under the configured root, in listing order.
    fn list_rule_sets(&self, ctx: &RequestContext) -> Result<Vec<RuleSet>>;

    /// Downloads the canonical rule file inside `rule_set`'s directory.
    fn fetch_rule_set(&self, ctx: &RequestContext, rule_set: &RuleSet) -> Result<RuleStream>;

    fn fetch_rule_set_by_name(&self, ctx: &RequestContext, name: &str) -> Result<RuleStream> {
        let rule_set = find_rule_set(self.list_rule_sets(ctx)?, name)?;
        self.fetch_rule_set(ctx, &rule_set)
    }
}

/// First rule set whose name matches exactly.
pub fn find_rule_set(rule_sets: Vec<RuleSet>, name: &str) -> Result<RuleSet> {
    rule_sets
        .into_iter()
        .find(|rule_set| rule_set.name == name)
        .ok_or_else(|| AirulesError::RuleSetNotFound {
            name: name.to_string(),
        })
}

/// Sends `request` under `ctx`; anything but 200 becomes [`AirulesError::RemoteFetch`].
pub fn fetch_url(ctx: &RequestContext, request: RequestBuilder, url: &str) -> Result<Response> {
    ctx.check()?;
    let request = match ctx.remaining() {
        Some(remaining) => request.timeout(remaining),
        None => request,
    };

    debug!(url, "GET");
    let response = request.send().map_err(|source| {
        if source.is_timeout() {
            AirulesError::TimedOut
        } else {
            AirulesError::Network {
                url: url.to_string(),
                source,
            }
        }
    })?;
    ctx.check()?;

    if response.status() != StatusCode::OK {
        return Err(AirulesError::RemoteFetch {
            status: response.status().as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response)
}
