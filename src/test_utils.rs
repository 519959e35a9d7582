use crate::editor::Mode;
use crate::error::{AirulesError, Result};
use crate::fs_utils::{FileSystem, OsFileSystem};
use crate::installer::RuleSource;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::env;
use std::ffi::{OsStr, OsString};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Mutex, MutexGuard};

pub static ENV_MUTEX: Mutex<()> = Mutex::new(());

pub fn lock_env() -> MutexGuard<'static, ()> {
    ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
}

#[must_use]
pub struct TestProcess {
    _lock: MutexGuard<'static, ()>,
    original_vars: HashMap<OsString, Option<OsString>>,
}

impl TestProcess {
    pub fn new() -> Self {
        Self {
            _lock: lock_env(),
            original_vars: HashMap::new(),
        }
    }

    pub fn set_var(&mut self, key: impl Into<OsString>, value: impl AsRef<OsStr>) {
        let key = key.into();
        self.remember_var(&key);
        unsafe {
            env::set_var(&key, value);
        }
    }

    pub fn remove_var(&mut self, key: impl Into<OsString>) {
        let key = key.into();
        self.remember_var(&key);
        unsafe {
            env::remove_var(&key);
        }
    }

    fn remember_var(&mut self, key: &OsStr) {
        if self.original_vars.contains_key(key) {
            return;
        }
        self.original_vars
            .insert(key.to_os_string(), env::var_os(key));
    }
}

impl Drop for TestProcess {
    fn drop(&mut self) {
        for (key, previous) in self.original_vars.drain() {
            if let Some(value) = previous {
                unsafe {
                    env::set_var(&key, value);
                }
            } else {
                unsafe {
                    env::remove_var(&key);
                }
            }
        }
    }
}

/// In-memory rule mapping standing in for the config store.
#[derive(Clone)]
pub struct StaticRuleSource {
    config_dir: PathBuf,
    rules: HashMap<(String, Mode, String), Vec<PathBuf>>,
    ensure_calls: Rc<Cell<usize>>,
}

impl StaticRuleSource {
    pub fn new(config_dir: &Path) -> Self {
        Self {
            config_dir: config_dir.to_path_buf(),
            rules: HashMap::new(),
            ensure_calls: Rc::new(Cell::new(0)),
        }
    }

    pub fn with(
        mut self,
        editor: &str,
        mode: Mode,
        key: &str,
        paths: impl IntoIterator<Item = PathBuf>,
    ) -> Self {
        self.rules.insert(
            (editor.to_string(), mode, key.to_string()),
            paths.into_iter().collect(),
        );
        self
    }

    pub fn ensure_calls(&self) -> usize {
        self.ensure_calls.get()
    }
}

impl RuleSource for StaticRuleSource {
    fn ensure_config_dir(&self) -> Result<PathBuf> {
        self.ensure_calls.set(self.ensure_calls.get() + 1);
        Ok(self.config_dir.clone())
    }

    fn rule_file_paths(&self, editor: &str, mode: Mode, key: &str) -> Result<Vec<PathBuf>> {
        self.rules
            .get(&(editor.to_string(), mode, key.to_string()))
            .cloned()
            .ok_or_else(|| AirulesError::RuleKeyNotFound {
                editor: editor.to_string(),
                mode,
                key: key.to_string(),
            })
    }
}

/// Real filesystem that records every mutating call.
#[derive(Default)]
pub struct RecordingFileSystem {
    log: Rc<RefCell<Vec<String>>>,
}

impl RecordingFileSystem {
    pub fn log(&self) -> Rc<RefCell<Vec<String>>> {
        Rc::clone(&self.log)
    }

    fn record(&self, op: &str, path: &Path) {
        self.log
            .borrow_mut()
            .push(format!("{op} {}", path.display()));
    }
}

impl FileSystem for RecordingFileSystem {
    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.record("mkdir", path);
        OsFileSystem.create_dir_all(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        OsFileSystem.read(path)
    }

    fn exists(&self, path: &Path) -> bool {
        OsFileSystem.exists(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        OsFileSystem.is_file(path)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        self.record("copy", to);
        OsFileSystem.copy(from, to)
    }

    fn write_atomic(&self, path: &Path, contents: &mut dyn Read) -> io::Result<u64> {
        self.record("write", path);
        OsFileSystem.write_atomic(path, contents)
    }
}
