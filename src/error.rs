use anyhow::Result as _Result;
use std::path::PathBuf;
use thiserror::Error;

use crate::editor::{InstallType, Mode};
use crate::remote::RuleSetType;

#[derive(Debug, Error)]
pub enum AirulesError {
    #[error("Config Error: {message}")]
    Config { message: String },

    #[error("Unsupported editor: {editor}")]
    UnsupportedEditor { editor: String },

    #[error("Editor '{editor}' not found in configuration")]
    EditorNotConfigured { editor: String },

    #[error("Invalid mode '{value}', expected 'local' or 'global'")]
    InvalidMode { value: String },

    #[error("Unknown install type: {value}")]
    InvalidInstallType { value: String },

    #[error("Global installation is not supported for {editor}")]
    GlobalUnsupported { editor: String },

    #[error("Rule key '{key}' not found for {editor} {mode}")]
    RuleKeyNotFound {
        editor: String,
        mode: Mode,
        key: String,
    },

    #[error("File '{file}' not found in key '{key}' for {editor} {mode}")]
    RuleFileNotInKey {
        editor: String,
        mode: Mode,
        key: String,
        file: String,
    },

    #[error("Rule file not found: {}", path.display())]
    MissingSourceFile { path: PathBuf },

    #[error("Failed to {action} {}: {source}", path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("{mode} installation failed: {source}")]
    Install {
        mode: Mode,
        #[source]
        source: Box<AirulesError>,
    },

    #[error("Failed to fetch from {url} with status code {status}")]
    RemoteFetch { status: u16, url: String },

    #[error("Request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Malformed response from {url}: {source}")]
    RemoteDecode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Download of rule set {name} was interrupted: {source}")]
    Download {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Request timed out")]
    TimedOut,

    #[error("No rule file found in rule set {name}")]
    RuleFileNotFound { name: String },

    #[error("Rule set not found: {name}")]
    RuleSetNotFound { name: String },

    #[error("Rule set name '{name}' is ambiguous: {}", matches.join(", "))]
    AmbiguousRuleSet { name: String, matches: Vec<String> },

    #[error("Unsupported rule set type: {kind}")]
    UnsupportedRuleSetType { kind: RuleSetType },

    #[error("Unsupported installation type '{install_type}' for {kind} rule sets")]
    UnsupportedRemoteInstallType {
        kind: RuleSetType,
        install_type: InstallType,
    },

    #[error("Custom Error: {0}")]
    Custom(String),

    #[error("Inquire Error: {0}")]
    Inquire(#[from] inquire::InquireError),
}

/// Coarse classification used by callers that only care about the failure family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    MissingSourceFile,
    Filesystem,
    RemoteFetch,
    RemoteDecode,
    NotFound,
    Cancelled,
    Other,
}

impl AirulesError {
    pub fn fs(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AirulesError::Filesystem {
            action,
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AirulesError::Config { .. }
            | AirulesError::UnsupportedEditor { .. }
            | AirulesError::EditorNotConfigured { .. }
            | AirulesError::InvalidMode { .. }
            | AirulesError::InvalidInstallType { .. }
            | AirulesError::GlobalUnsupported { .. }
            | AirulesError::RuleKeyNotFound { .. }
            | AirulesError::RuleFileNotInKey { .. }
            | AirulesError::ConfigParse { .. }
            | AirulesError::ConfigSerialize(_)
            | AirulesError::UnsupportedRuleSetType { .. }
            | AirulesError::UnsupportedRemoteInstallType { .. } => ErrorKind::Configuration,
            AirulesError::MissingSourceFile { .. } => ErrorKind::MissingSourceFile,
            AirulesError::Filesystem { .. } => ErrorKind::Filesystem,
            AirulesError::Install { source, .. } => source.kind(),
            AirulesError::RemoteFetch { .. }
            | AirulesError::Network { .. }
            | AirulesError::Download { .. } => ErrorKind::RemoteFetch,
            AirulesError::RemoteDecode { .. } => ErrorKind::RemoteDecode,
            AirulesError::RuleFileNotFound { .. }
            | AirulesError::RuleSetNotFound { .. }
            | AirulesError::AmbiguousRuleSet { .. } => ErrorKind::NotFound,
            AirulesError::Cancelled | AirulesError::TimedOut => ErrorKind::Cancelled,
            AirulesError::Custom(_) | AirulesError::Inquire(_) => ErrorKind::Other,
        }
    }

    pub fn display_localized(&self) -> String {
        match self {
            AirulesError::Config { message } => {
                t!("errors.config_error", message = message).to_string()
            }
            AirulesError::UnsupportedEditor { editor } => {
                t!("errors.unsupported_editor", editor = editor).to_string()
            }
            AirulesError::GlobalUnsupported { editor } => {
                t!("errors.global_unsupported", editor = editor).to_string()
            }
            AirulesError::RuleKeyNotFound { editor, mode, key } => t!(
                "errors.rule_key_not_found",
                key = key,
                editor = editor,
                mode = mode
            )
            .to_string(),
            AirulesError::MissingSourceFile { path } => {
                t!("errors.missing_source_file", path = path.display()).to_string()
            }
            AirulesError::RuleSetNotFound { name } => {
                t!("errors.rule_set_not_found", name = name).to_string()
            }
            AirulesError::AmbiguousRuleSet { name, matches } => t!(
                "errors.ambiguous_rule_set",
                name = name,
                matches = matches.join(", ")
            )
            .to_string(),
            AirulesError::RuleFileNotFound { name } => {
                t!("errors.rule_file_not_found", name = name).to_string()
            }
            AirulesError::Download { name, source } => t!(
                "errors.download_interrupted",
                name = name,
                error = source
            )
            .to_string(),
            AirulesError::Install { mode, source } => t!(
                "errors.install_failed",
                mode = mode,
                error = source.display_localized()
            )
            .to_string(),
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = _Result<T, AirulesError>;
