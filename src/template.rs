use crate::config::{ConfigStore, RulesConfig, TEMPLATES_DIR};
use crate::editor::{DEFAULT_KEY, EditorKind, Mode};
use crate::error::{AirulesError, Result};
use crate::fs_utils::{Deployed, FileSystem, OsFileSystem, deploy};
use crate::installer::combine_rule_files;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File extension a template gets when imported for `editor` and `mode`.
pub fn template_extension(editor: EditorKind, mode: Mode) -> &'static str {
    match (editor, mode) {
        (EditorKind::Windsurf, Mode::Local) => ".windsurfrules",
        (EditorKind::Windsurf, Mode::Global) => ".md",
        (EditorKind::Cursor, _) => ".mdc",
    }
}

/// Config-relative location of an imported template.
pub fn template_relative_path(editor: EditorKind, mode: Mode, key: &str) -> String {
    format!(
        "{TEMPLATES_DIR}/{editor}/{mode}/{key}{}",
        template_extension(editor, mode)
    )
}

/// Template files kept under the config directory, addressed by rule key.
pub struct Templates<'a> {
    store: &'a ConfigStore,
    fs: OsFileSystem,
}

impl<'a> Templates<'a> {
    pub fn new(store: &'a ConfigStore) -> Self {
        Self {
            store,
            fs: OsFileSystem,
        }
    }

    pub fn list(&self, editor: EditorKind, mode: Mode) -> Result<Vec<String>> {
        Ok(self.store.load()?.keys(editor.as_str(), mode))
    }

    /// The text an install of this key would write.
    pub fn show(&self, editor: EditorKind, mode: Mode, key: &str) -> Result<String> {
        let paths = self.store.rule_file_paths(editor.as_str(), mode, key)?;
        if let Some(missing) = paths.iter().find(|path| !self.fs.is_file(path)) {
            return Err(AirulesError::MissingSourceFile {
                path: missing.clone(),
            });
        }
        let combined = combine_rule_files(&self.fs, &paths)?;
        Ok(String::from_utf8_lossy(&combined).into_owned())
    }

    /// Copies `file` into the templates tree and points `key` at it alone.
    pub fn import(
        &self,
        editor: EditorKind,
        mode: Mode,
        key: &str,
        file: &Path,
    ) -> Result<PathBuf> {
        validate_key(key)?;
        if !self.fs.is_file(file) {
            return Err(AirulesError::MissingSourceFile {
                path: file.to_path_buf(),
            });
        }

        let relative = template_relative_path(editor, mode, key);
        let target = self.store.config_dir().join(&relative);
        let mut source = File::open(file).map_err(|e| AirulesError::fs("open", file, e))?;
        deploy(&self.fs, &target, &mut source)?;

        let mut config = self.store.load()?;
        config
            .rules_mut(editor.as_str(), mode)
            .insert(key.to_string(), vec![relative]);
        self.store.save(&config)?;

        info!(editor = %editor, mode = %mode, key, path = %target.display(), "imported template");
        Ok(target)
    }

    pub fn export(
        &self,
        editor: EditorKind,
        mode: Mode,
        key: &str,
        out: &Path,
    ) -> Result<Deployed> {
        let content = self.show(editor, mode, key)?;
        deploy(&self.fs, out, &mut content.as_bytes())
    }

    /// Writes the default config and a starter file for every default entry.
    /// Existing files are left alone; returns the ones created.
    pub fn seed_defaults(&self) -> Result<Vec<PathBuf>> {
        self.store.ensure_config_dir()?;
        let mut created = Vec::new();

        if !self.fs.exists(&self.store.config_file()) {
            self.store.save(&RulesConfig::default())?;
            created.push(self.store.config_file());
        }

        let defaults = RulesConfig::default();
        for editor in EditorKind::ALL {
            for mode in Mode::ALL {
                for file in defaults.rule_files(editor.as_str(), mode, DEFAULT_KEY)? {
                    let path = self.store.config_dir().join(file);
                    if self.fs.exists(&path) {
                        debug!(path = %path.display(), "template already present");
                        continue;
                    }
                    let starter = starter_template(editor, mode);
                    deploy(&self.fs, &path, &mut starter.as_bytes())?;
                    created.push(path);
                }
            }
        }
        Ok(created)
    }
}

fn validate_key(key: &str) -> Result<()> {
    let valid = !key.trim().is_empty() && !key.contains(['/', '\\']) && key != "." && key != "..";
    if valid {
        Ok(())
    } else {
        Err(AirulesError::Config {
            message: format!("invalid rule key '{key}'"),
        })
    }
}

fn starter_template(editor: EditorKind, mode: Mode) -> String {
    let scope = match mode {
        Mode::Local => "this project",
        Mode::Global => "every project",
    };
    format!(
        "# {editor} {mode} rules\n\n\
         Rules in this file apply to {scope}.\n\
         Edit it, or map more files to the key with `airules rules add`.\n"
    )
}
