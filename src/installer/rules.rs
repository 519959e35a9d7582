use crate::editor::{DEFAULT_KEY, EditorKind, EditorProfile, HostEnv, InstallType, Mode};
use crate::error::{AirulesError, Result};
use crate::fs_utils::{Deployed, FileSystem, OsFileSystem, deploy};
use crate::installer::RuleSource;
use crate::path_utils::base_name;
use std::path::PathBuf;
use tracing::{debug, info};

/// Installs the files configured for an `(editor, mode, key)` triple.
pub struct RuleInstaller {
    profile: EditorProfile,
    source: Box<dyn RuleSource>,
    fs: Box<dyn FileSystem>,
}

impl RuleInstaller {
    pub fn new(editor: EditorKind, source: Box<dyn RuleSource>) -> Result<Self> {
        let host = HostEnv::detect()?;
        Ok(Self::with_parts(
            editor.profile(&host),
            source,
            Box::new(OsFileSystem),
        ))
    }

    pub fn with_parts(
        profile: EditorProfile,
        source: Box<dyn RuleSource>,
        fs: Box<dyn FileSystem>,
    ) -> Self {
        Self {
            profile,
            source,
            fs,
        }
    }

    pub fn install(&self, install_type: InstallType) -> Result<Vec<Deployed>> {
        self.install_with_key(install_type, DEFAULT_KEY)
    }

    /// Combines the key's files and writes them to every destination of
    /// `install_type`, local first. A failure on a later destination leaves
    /// earlier ones in place and is reported as that destination's error.
    pub fn install_with_key(&self, install_type: InstallType, key: &str) -> Result<Vec<Deployed>> {
        let modes = self.target_modes(install_type)?;

        self.source.ensure_config_dir()?;

        let mut rule_paths = Vec::new();
        for mode in &modes {
            let paths = self
                .source
                .rule_file_paths(&self.profile.editor, *mode, key)?;
            debug!(
                editor = %self.profile.editor,
                mode = %mode,
                key,
                count = paths.len(),
                "resolved rule files"
            );
            rule_paths.extend(paths);
        }

        self.ensure_sources_exist(&rule_paths)?;
        let combined = combine_rule_files(self.fs.as_ref(), &rule_paths)?;

        let mut deployed = Vec::with_capacity(modes.len());
        for mode in modes {
            let destination = self.profile.destination(mode);
            let written = deploy(self.fs.as_ref(), &destination, &mut combined.as_slice())
                .map_err(|source| AirulesError::Install {
                    mode,
                    source: Box::new(source),
                })?;
            info!(
                editor = %self.profile.editor,
                mode = %mode,
                destination = %written.destination.display(),
                "installed rules"
            );
            deployed.push(written);
        }
        Ok(deployed)
    }

    fn target_modes(&self, install_type: InstallType) -> Result<Vec<Mode>> {
        match install_type {
            InstallType::Local => Ok(vec![Mode::Local]),
            InstallType::Global if !self.profile.global_supported => {
                Err(AirulesError::GlobalUnsupported {
                    editor: self.profile.editor.clone(),
                })
            }
            InstallType::Global => Ok(vec![Mode::Global]),
            InstallType::All if self.profile.global_supported => {
                Ok(vec![Mode::Local, Mode::Global])
            }
            InstallType::All => Ok(vec![Mode::Local]),
        }
    }

    fn ensure_sources_exist(&self, rule_paths: &[PathBuf]) -> Result<()> {
        match rule_paths.iter().find(|path| !self.fs.is_file(path)) {
            Some(missing) => Err(AirulesError::MissingSourceFile {
                path: missing.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Concatenates files in order. Each file is introduced by `// From <name>`,
/// and every file after the first is separated from the previous by a blank line.
pub fn combine_rule_files(fs: &dyn FileSystem, rule_paths: &[PathBuf]) -> Result<Vec<u8>> {
    let mut combined = Vec::new();
    for (index, path) in rule_paths.iter().enumerate() {
        let content = fs
            .read(path)
            .map_err(|e| AirulesError::fs("read rule file", path, e))?;
        if index > 0 {
            combined.extend_from_slice(b"\n\n");
        }
        let marker = format!("// From {}\n", base_name(path));
        combined.extend_from_slice(marker.as_bytes());
        combined.extend_from_slice(&content);
    }
    Ok(combined)
}
