use crate::error::{AirulesError, Result};
use directories::BaseDirs;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const WINDSURF_EDITOR: &str = "windsurf";
pub const CURSOR_EDITOR: &str = "cursor";
pub const DEFAULT_KEY: &str = "default";

pub const WINDSURF_LOCAL_FILE: &str = ".windsurfrules";
pub const WINDSURF_GLOBAL_FILE: &str = "global_rules.md";
pub const CURSOR_LOCAL_FILE: &str = "project_rules.mdc";
pub const CURSOR_GLOBAL_FILE: &str = "global_rules.mdc";
pub const CURSOR_LEGACY_FILE: &str = ".cursorrules";

/// Project-scoped or user-scoped half of an editor's configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Mode {
    Local,
    Global,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Local, Mode::Global];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Local => "local",
            Mode::Global => "global",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = AirulesError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Mode::Local),
            "global" => Ok(Mode::Global),
            _ => Err(AirulesError::InvalidMode {
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallType {
    Local,
    Global,
    /// Local first, then Global when the editor supports it.
    All,
}

impl InstallType {
    pub fn as_str(self) -> &'static str {
        match self {
            InstallType::Local => "local",
            InstallType::Global => "global",
            InstallType::All => "all",
        }
    }
}

impl fmt::Display for InstallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstallType {
    type Err = AirulesError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" | "l" => Ok(InstallType::Local),
            "global" | "g" => Ok(InstallType::Global),
            "all" | "a" => Ok(InstallType::All),
            _ => Err(AirulesError::InvalidInstallType {
                value: value.to_string(),
            }),
        }
    }
}

/// Where the current process lives; resolved once and passed down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEnv {
    pub home_dir: PathBuf,
    pub working_dir: PathBuf,
}

impl HostEnv {
    pub fn new(home_dir: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            home_dir: home_dir.into(),
            working_dir: working_dir.into(),
        }
    }

    pub fn detect() -> Result<Self> {
        let base_dirs = BaseDirs::new().ok_or_else(|| AirulesError::Config {
            message: "could not determine the home directory".to_string(),
        })?;
        let working_dir = match env::current_dir() {
            Ok(dir) => dir,
            Err(e) => return Err(AirulesError::fs("read working directory", ".", e)),
        };
        Ok(Self::new(base_dirs.home_dir(), working_dir))
    }
}

/// Destination layout for one editor. Built once, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorProfile {
    pub editor: String,
    pub local_dest_dir: PathBuf,
    pub global_dest_dir: PathBuf,
    pub local_file_name: String,
    pub global_file_name: String,
    pub global_supported: bool,
}

impl EditorProfile {
    pub fn local_destination(&self) -> PathBuf {
        self.local_dest_dir.join(&self.local_file_name)
    }

    pub fn global_destination(&self) -> PathBuf {
        self.global_dest_dir.join(&self.global_file_name)
    }

    pub fn destination(&self, mode: Mode) -> PathBuf {
        match mode {
            Mode::Local => self.local_destination(),
            Mode::Global => self.global_destination(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorKind {
    Windsurf,
    Cursor,
}

impl EditorKind {
    pub const ALL: [EditorKind; 2] = [EditorKind::Windsurf, EditorKind::Cursor];

    pub fn as_str(self) -> &'static str {
        match self {
            EditorKind::Windsurf => WINDSURF_EDITOR,
            EditorKind::Cursor => CURSOR_EDITOR,
        }
    }

    pub fn profile(self, host: &HostEnv) -> EditorProfile {
        match self {
            EditorKind::Windsurf => windsurf_profile(host),
            EditorKind::Cursor => cursor_profile(host),
        }
    }
}

impl fmt::Display for EditorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditorKind {
    type Err = AirulesError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            WINDSURF_EDITOR => Ok(EditorKind::Windsurf),
            CURSOR_EDITOR => Ok(EditorKind::Cursor),
            _ => Err(AirulesError::UnsupportedEditor {
                editor: value.to_string(),
            }),
        }
    }
}

pub fn windsurf_global_dir(host: &HostEnv) -> PathBuf {
    host.home_dir.join(".codeium/windsurf/memories")
}

pub fn cursor_rules_dir(host: &HostEnv) -> PathBuf {
    host.working_dir.join(".cursor").join("rules")
}

fn windsurf_profile(host: &HostEnv) -> EditorProfile {
    EditorProfile {
        editor: WINDSURF_EDITOR.to_string(),
        local_dest_dir: host.working_dir.clone(),
        global_dest_dir: windsurf_global_dir(host),
        local_file_name: WINDSURF_LOCAL_FILE.to_string(),
        global_file_name: WINDSURF_GLOBAL_FILE.to_string(),
        global_supported: true,
    }
}

// Cursor keeps both files under the project's .cursor/rules directory.
fn cursor_profile(host: &HostEnv) -> EditorProfile {
    let rules_dir = cursor_rules_dir(host);
    EditorProfile {
        editor: CURSOR_EDITOR.to_string(),
        local_dest_dir: rules_dir.clone(),
        global_dest_dir: rules_dir,
        local_file_name: CURSOR_LOCAL_FILE.to_string(),
        global_file_name: CURSOR_GLOBAL_FILE.to_string(),
        global_supported: true,
    }
}
