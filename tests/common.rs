use airules::config::{CONFIG_FILE, ConfigStore, ENV_CONFIG_DIR};
use airules::editor::HostEnv;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::TempDir;

static CONFIG_DIR_ENV: Mutex<()> = Mutex::new(());

/// Points `AIRULES_CONFIG_DIR` at `value` until dropped.
///
/// Holds a process-wide lock for its lifetime, so tests using it run one at a time.
#[allow(dead_code)]
pub struct ConfigDirEnv {
    previous: Option<String>,
    _lock: MutexGuard<'static, ()>,
}

#[allow(dead_code)]
impl ConfigDirEnv {
    pub fn set(value: &str) -> Self {
        let lock = CONFIG_DIR_ENV.lock().unwrap_or_else(|e| e.into_inner());
        let previous = std::env::var(ENV_CONFIG_DIR).ok();
        unsafe {
            std::env::set_var(ENV_CONFIG_DIR, value);
        }
        Self {
            previous,
            _lock: lock,
        }
    }
}

impl Drop for ConfigDirEnv {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => unsafe { std::env::set_var(ENV_CONFIG_DIR, value) },
            None => unsafe { std::env::remove_var(ENV_CONFIG_DIR) },
        }
    }
}

/// Config snippets shared by the integration tests
#[allow(dead_code)]
pub mod test_config {
    /// Two windsurf keys and one cursor key, all relative to the config dir
    pub const MULTI_KEY_CONFIG: &str = r#"
[editors.windsurf.local]
default = ["templates/windsurf/local/base.md", "templates/shared/style.md"]
python = ["templates/windsurf/local/python.md"]

[editors.windsurf.global]
default = ["templates/windsurf/global/me.md"]

[editors.cursor.local]
default = ["templates/cursor/local/project.mdc"]

[editors.cursor.global]
default = ["templates/cursor/global/global.mdc"]
"#;
}

#[allow(dead_code)]
pub fn create_test_file_with_content(dir: &Path, filename: &str, content: &str) -> PathBuf {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    fs::write(&file_path, content).expect("Failed to write test file");
    file_path
}

/// Isolated config dir, project dir and home dir under one temp root.
pub struct TestEnvironment {
    // TempDir is kept to ensure cleanup happens when TestEnvironment is dropped
    #[allow(dead_code)]
    pub(crate) temp_dir: TempDir,
    pub config_dir: PathBuf,
    pub project_dir: PathBuf,
    pub home_dir: PathBuf,
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let config_dir = root.join("config");
        let project_dir = root.join("project");
        let home_dir = root.join("home");
        for dir in [&config_dir, &project_dir, &home_dir] {
            fs::create_dir_all(dir).expect("Failed to create test directory");
        }

        Self {
            temp_dir,
            config_dir,
            project_dir,
            home_dir,
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn host(&self) -> HostEnv {
        HostEnv::new(&self.home_dir, &self.project_dir)
    }

    pub fn store(&self) -> ConfigStore {
        ConfigStore::with_config_dir(Some(self.config_dir.as_path())).expect("config store")
    }

    pub fn write_config(&self, content: &str) -> PathBuf {
        create_test_file_with_content(&self.config_dir, CONFIG_FILE, content)
    }

    /// Writes a file relative to the config dir.
    pub fn create_template(&self, relative: &str, content: &str) -> PathBuf {
        create_test_file_with_content(&self.config_dir, relative, content)
    }

    pub fn project_file(&self, relative: &str) -> PathBuf {
        self.project_dir.join(relative)
    }

    pub fn read(&self, path: &Path) -> String {
        fs::read_to_string(path).expect("Failed to read file")
    }

    /// Names in `dir` that start with `prefix`, sorted.
    pub fn entries_with_prefix(&self, dir: &Path, prefix: &str) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .expect("Failed to read directory")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with(prefix))
            .collect();
        names.sort();
        names
    }
}
