use crate::editor::{CURSOR_EDITOR, DEFAULT_KEY, Mode, WINDSURF_EDITOR};
use crate::error::{AirulesError, Result};
use crate::fs_utils::{FileSystem, OsFileSystem};
use crate::installer::RuleSource;
use crate::path_utils::validate_path_str;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ENV_CONFIG_DIR: &str = "AIRULES_CONFIG_DIR";
pub const APP_NAME: &str = "airules";
pub const CONFIG_FILE: &str = "config.toml";
pub const TEMPLATES_DIR: &str = "templates";

/// Ordered file lists per rule key. Key order does not matter, list order does.
pub type RuleMap = BTreeMap<String, Vec<String>>;

pub fn resolve_config_dir(cli_override: Option<&Path>) -> Result<PathBuf> {
    let env_override = env::var(ENV_CONFIG_DIR).ok();
    resolve_config_dir_with(cli_override, env_override.as_deref())
}

pub fn resolve_config_dir_with(
    cli_override: Option<&Path>,
    env_override: Option<&str>,
) -> Result<PathBuf> {
    if let Some(path) = cli_override {
        validate_path_str(&path.to_string_lossy()).map_err(|e| AirulesError::Config {
            message: t!("errors.invalid_config_dir", error = e).to_string(),
        })?;
        return Ok(path.to_path_buf());
    }

    if let Some(env_config_dir) = env_override {
        validate_path_str(env_config_dir).map_err(|e| AirulesError::Config {
            message: t!("errors.invalid_config_dir_env", error = e).to_string(),
        })?;
        return Ok(PathBuf::from(env_config_dir));
    }

    let base_dirs = BaseDirs::new().ok_or_else(|| AirulesError::Config {
        message: t!("errors.not_find_config_dir").to_string(),
    })?;
    Ok(base_dirs.home_dir().join(".config").join(APP_NAME))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorRules {
    #[serde(default)]
    pub local: RuleMap,
    #[serde(default)]
    pub global: RuleMap,
}

impl EditorRules {
    pub fn rules(&self, mode: Mode) -> &RuleMap {
        match mode {
            Mode::Local => &self.local,
            Mode::Global => &self.global,
        }
    }

    pub fn rules_mut(&mut self, mode: Mode) -> &mut RuleMap {
        match mode {
            Mode::Local => &mut self.local,
            Mode::Global => &mut self.global,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default)]
    pub editors: BTreeMap<String, EditorRules>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        let mut editors = BTreeMap::new();
        editors.insert(
            WINDSURF_EDITOR.to_string(),
            EditorRules {
                local: single_default("templates/windsurf/local/.windsurfrules"),
                global: single_default("templates/windsurf/global/global_rules.md"),
            },
        );
        editors.insert(
            CURSOR_EDITOR.to_string(),
            EditorRules {
                local: single_default("templates/cursor/local/project_rules.mdc"),
                global: single_default("templates/cursor/global/global_rules.mdc"),
            },
        );
        Self { editors }
    }
}

fn single_default(path: &str) -> RuleMap {
    RuleMap::from([(DEFAULT_KEY.to_string(), vec![path.to_string()])])
}

impl RulesConfig {
    pub fn rules(&self, editor: &str, mode: Mode) -> Option<&RuleMap> {
        self.editors.get(editor).map(|rules| rules.rules(mode))
    }

    pub fn rules_mut(&mut self, editor: &str, mode: Mode) -> &mut RuleMap {
        self.editors
            .entry(editor.to_string())
            .or_default()
            .rules_mut(mode)
    }

    pub fn keys(&self, editor: &str, mode: Mode) -> Vec<String> {
        self.rules(editor, mode)
            .map(|rules| rules.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn rule_files(&self, editor: &str, mode: Mode, key: &str) -> Result<&[String]> {
        let Some(editor_rules) = self.editors.get(editor) else {
            return Err(AirulesError::EditorNotConfigured {
                editor: editor.to_string(),
            });
        };
        editor_rules
            .rules(mode)
            .get(key)
            .map(Vec::as_slice)
            .ok_or_else(|| AirulesError::RuleKeyNotFound {
                editor: editor.to_string(),
                mode,
                key: key.to_string(),
            })
    }

    /// Appends `file` to `key`. Returns false when the key already lists it.
    pub fn add_rule_file(&mut self, editor: &str, mode: Mode, key: &str, file: &str) -> bool {
        let files = self
            .rules_mut(editor, mode)
            .entry(key.to_string())
            .or_default();
        if files.iter().any(|existing| existing == file) {
            return false;
        }
        files.push(file.to_string());
        true
    }

    pub fn remove_key(&mut self, editor: &str, mode: Mode, key: &str) -> Result<Vec<String>> {
        self.editors
            .get_mut(editor)
            .and_then(|rules| rules.rules_mut(mode).remove(key))
            .ok_or_else(|| AirulesError::RuleKeyNotFound {
                editor: editor.to_string(),
                mode,
                key: key.to_string(),
            })
    }

    /// Drops one file from `key`; the key disappears with its last file.
    pub fn remove_rule_file(
        &mut self,
        editor: &str,
        mode: Mode,
        key: &str,
        file: &str,
    ) -> Result<()> {
        let key_missing = || AirulesError::RuleKeyNotFound {
            editor: editor.to_string(),
            mode,
            key: key.to_string(),
        };
        let rules = self
            .editors
            .get_mut(editor)
            .ok_or_else(key_missing)?
            .rules_mut(mode);
        let files = rules.get_mut(key).ok_or_else(key_missing)?;

        let before = files.len();
        files.retain(|existing| existing != file);
        if files.len() == before {
            return Err(AirulesError::RuleFileNotInKey {
                editor: editor.to_string(),
                mode,
                key: key.to_string(),
                file: file.to_string(),
            });
        }
        if files.is_empty() {
            rules.remove(key);
        }
        Ok(())
    }
}

pub struct ConfigStore {
    config_dir: PathBuf,
}

impl ConfigStore {
    pub fn new() -> Result<Self> {
        Self::with_config_dir(None)
    }

    pub fn with_config_dir(config_dir_override: Option<&Path>) -> Result<Self> {
        Ok(Self {
            config_dir: resolve_config_dir(config_dir_override)?,
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    pub fn ensure_config_dir(&self) -> Result<PathBuf> {
        fs::create_dir_all(&self.config_dir).map_err(|e| {
            AirulesError::fs("create config directory", &self.config_dir, e)
        })?;
        Ok(self.config_dir.clone())
    }

    /// Reads `config.toml`, writing the default mapping first if it does not exist.
    pub fn load(&self) -> Result<RulesConfig> {
        let config_file = self.config_file();
        if !config_file.exists() {
            debug!(path = %config_file.display(), "creating default config");
            let config = RulesConfig::default();
            self.save(&config)?;
            return Ok(config);
        }

        let content = fs::read_to_string(&config_file)
            .map_err(|e| AirulesError::fs("read config", &config_file, e))?;
        toml::from_str(&content).map_err(|source| AirulesError::ConfigParse {
            path: config_file,
            source,
        })
    }

    pub fn save(&self, config: &RulesConfig) -> Result<()> {
        self.ensure_config_dir()?;
        let config_file = self.config_file();
        let content = toml::to_string_pretty(config)?;
        OsFileSystem
            .write_atomic(&config_file, &mut content.as_bytes())
            .map_err(|e| AirulesError::fs("write config", &config_file, e))?;
        Ok(())
    }

    /// Resolves the configured files for a triple to paths under the config dir.
    pub fn rule_file_paths(&self, editor: &str, mode: Mode, key: &str) -> Result<Vec<PathBuf>> {
        let config = self.load()?;
        let files = config.rule_files(editor, mode, key)?;
        let paths = files.iter().map(|file| self.config_dir.join(file));
        Ok(paths.collect())
    }

    pub fn supported_editors(&self) -> Vec<String> {
        match self.load() {
            Ok(config) => config.editors.into_keys().collect(),
            Err(_) => vec![CURSOR_EDITOR.to_string(), WINDSURF_EDITOR.to_string()],
        }
    }
}

impl RuleSource for ConfigStore {
    fn ensure_config_dir(&self) -> Result<PathBuf> {
        ConfigStore::ensure_config_dir(self)
    }

    fn rule_file_paths(&self, editor: &str, mode: Mode, key: &str) -> Result<Vec<PathBuf>> {
        ConfigStore::rule_file_paths(self, editor, mode, key)
    }
}
