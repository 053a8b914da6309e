//! Directory resolution for the hub.
//!
//! Every other component asks [`HubDirs`] for its paths:
//!
//! ```text
//! <config root>/hub/            config dir ("hub-debug" in debug mode)
//! ├── plugins/<name>.json       installed plugin files
//! ├── manifest.json             plugin identity registry
//! ├── settings.json             optional settings
//! └── data_dir.conf             shared data directory override
//!
//! <data root>/mem-note/         default shared data dir
//! <cwd>/.mem/                   project-local data dir (after `init`)
//! ```

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

pub const CONFIG_NAMESPACE: &str = "hub";
pub const DATA_NAMESPACE: &str = "mem-note";
const DEBUG_SUFFIX: &str = "-debug";

pub const LOCAL_MARKER_DIR: &str = ".mem";
pub const OVERRIDE_FILE: &str = "data_dir.conf";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const SETTINGS_FILE: &str = "settings.json";
pub const PLUGINS_DIR: &str = "plugins";

/// Keyword accepted by `load` to drop the data directory override.
pub const LOAD_DEFAULT: &str = "default";

/// Platform roots the namespaced directories hang off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirRoots {
    pub config_root: PathBuf,
    pub data_root: PathBuf,
}

impl DirRoots {
    pub fn new(config_root: impl Into<PathBuf>, data_root: impl Into<PathBuf>) -> Self {
        Self {
            config_root: config_root.into(),
            data_root: data_root.into(),
        }
    }

    /// Resolve roots from the environment.
    ///
    /// POSIX: `$XDG_CONFIG_HOME` / `$XDG_DATA_HOME`, falling back to
    /// `~/.config` and `~/.local/share`. Windows: `%APPDATA%` for both,
    /// falling back to the home directory.
    pub fn from_env() -> io::Result<Self> {
        if cfg!(windows) {
            let root = match env_path("APPDATA") {
                Some(p) => p,
                None => home_dir()?,
            };
            return Ok(Self::new(root.clone(), root));
        }

        let config_root = match env_path("XDG_CONFIG_HOME") {
            Some(p) => p,
            None => home_dir()?.join(".config"),
        };
        let data_root = match env_path("XDG_DATA_HOME") {
            Some(p) => p,
            None => home_dir()?.join(".local").join("share"),
        };
        Ok(Self::new(config_root, data_root))
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn home_dir() -> io::Result<PathBuf> {
    directories::UserDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "cannot determine home directory"))
}

fn ensure_dir(path: PathBuf) -> io::Result<PathBuf> {
    if !path.is_dir() {
        std::fs::create_dir_all(&path).map_err(|e| {
            io::Error::new(e.kind(), format!("failed to create {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "created directory");
    }
    Ok(path)
}

/// Result of `init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    Created(PathBuf),
    AlreadyInitialized(PathBuf),
}

impl fmt::Display for InitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created(path) => {
                write!(f, "Initialized memory directory at {}", path.display())
            }
            Self::AlreadyInitialized(_) => write!(f, "This directory is already initialized."),
        }
    }
}

/// Result of `load <path|default>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(PathBuf),
    Reverted,
    Invalid(String),
}

impl LoadOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Invalid(_))
    }
}

impl fmt::Display for LoadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded(path) => write!(f, "Loaded {} as data directory.", path.display()),
            Self::Reverted => write!(f, "Reverted to default data directory."),
            Self::Invalid(raw) => {
                write!(f, "Path '{raw}' does not exist or is not a directory.")
            }
        }
    }
}

/// Sole authority for config and data directory locations.
///
/// All accessors create the directory they return when it is missing; a
/// failure to create one is returned as an [`io::Error`] and is meant to
/// abort the current command.
#[derive(Debug, Clone)]
pub struct HubDirs {
    roots: DirRoots,
    cwd: PathBuf,
    debug: bool,
}

impl HubDirs {
    pub fn new(roots: DirRoots, cwd: impl Into<PathBuf>, debug: bool) -> Self {
        Self {
            roots,
            cwd: cwd.into(),
            debug,
        }
    }

    pub fn from_env(debug: bool) -> io::Result<Self> {
        Ok(Self::new(
            DirRoots::from_env()?,
            std::env::current_dir()?,
            debug,
        ))
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn roots(&self) -> &DirRoots {
        &self.roots
    }

    fn namespaced(&self, base: &str) -> String {
        if self.debug {
            format!("{base}{DEBUG_SUFFIX}")
        } else {
            base.to_string()
        }
    }

    pub fn config_dir(&self) -> io::Result<PathBuf> {
        ensure_dir(
            self.roots
                .config_root
                .join(self.namespaced(CONFIG_NAMESPACE)),
        )
    }

    pub fn plugins_dir(&self) -> io::Result<PathBuf> {
        ensure_dir(self.config_dir()?.join(PLUGINS_DIR))
    }

    pub fn manifest_path(&self) -> io::Result<PathBuf> {
        Ok(self.config_dir()?.join(MANIFEST_FILE))
    }

    pub fn settings_path(&self) -> io::Result<PathBuf> {
        Ok(self.config_dir()?.join(SETTINGS_FILE))
    }

    pub fn override_file(&self) -> io::Result<PathBuf> {
        Ok(self.config_dir()?.join(OVERRIDE_FILE))
    }

    /// OS default shared data directory, ignoring any override.
    pub fn default_data_dir(&self) -> io::Result<PathBuf> {
        ensure_dir(self.roots.data_root.join(self.namespaced(DATA_NAMESPACE)))
    }

    /// Shared data directory: the override file wins while the directory it
    /// names still exists.
    pub fn shared_data_dir(&self) -> io::Result<PathBuf> {
        if let Some(dir) = self.read_override()? {
            return Ok(dir);
        }
        self.default_data_dir()
    }

    fn read_override(&self) -> io::Result<Option<PathBuf>> {
        let file = self.override_file()?;
        if !file.is_file() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&file)?;
        let dir = PathBuf::from(raw.trim());
        if dir.as_os_str().is_empty() || !dir.is_dir() {
            debug!(path = %dir.display(), "ignoring stale data directory override");
            return Ok(None);
        }
        Ok(Some(dir))
    }

    pub fn local_marker(&self) -> PathBuf {
        self.cwd.join(LOCAL_MARKER_DIR)
    }

    pub fn is_local_initialized(&self) -> bool {
        self.local_marker().is_dir()
    }

    /// Project-local data directory when the working directory was
    /// initialized, otherwise the shared one.
    pub fn scoped_data_dir(&self) -> io::Result<PathBuf> {
        if self.is_local_initialized() {
            return Ok(self.local_marker());
        }
        self.shared_data_dir()
    }

    pub fn init_local(&self) -> io::Result<InitOutcome> {
        let marker = self.local_marker();
        if marker.is_dir() {
            return Ok(InitOutcome::AlreadyInitialized(marker));
        }
        std::fs::create_dir_all(&marker)?;
        Ok(InitOutcome::Created(marker))
    }

    /// Persist (or with `"default"`, remove) the shared data directory override.
    pub fn load_override(&self, raw: &str) -> io::Result<LoadOutcome> {
        let file = self.override_file()?;

        if raw == LOAD_DEFAULT {
            if file.exists() {
                std::fs::remove_file(&file)?;
            }
            return Ok(LoadOutcome::Reverted);
        }

        let candidate = Path::new(raw);
        let candidate = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.cwd.join(candidate)
        };
        if !candidate.is_dir() {
            return Ok(LoadOutcome::Invalid(raw.to_string()));
        }

        let absolute = std::path::absolute(&candidate)?;
        std::fs::write(&file, absolute.to_string_lossy().as_bytes())?;
        Ok(LoadOutcome::Loaded(absolute))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn dirs_in(root: &Path, debug: bool) -> HubDirs {
        let cwd = root.join("work");
        std::fs::create_dir_all(&cwd).unwrap();
        HubDirs::new(
            DirRoots::new(root.join("config"), root.join("data")),
            cwd,
            debug,
        )
    }

    #[test]
    fn test_config_dir_created_under_namespace() {
        let tmp = tempdir().unwrap();
        let dirs = dirs_in(tmp.path(), false);

        let config = dirs.config_dir().unwrap();
        assert_eq!(config, tmp.path().join("config").join("hub"));
        assert!(config.is_dir());
        assert!(dirs.plugins_dir().unwrap().ends_with("hub/plugins"));
    }

    #[test]
    fn test_debug_namespace_does_not_collide() {
        let tmp = tempdir().unwrap();
        let release = dirs_in(tmp.path(), false);
        let debug = dirs_in(tmp.path(), true);

        assert_ne!(release.config_dir().unwrap(), debug.config_dir().unwrap());
        assert_ne!(
            release.default_data_dir().unwrap(),
            debug.default_data_dir().unwrap()
        );
        assert!(debug.config_dir().unwrap().ends_with("hub-debug"));
    }

    #[test]
    fn test_scoped_prefers_local_marker() {
        let tmp = tempdir().unwrap();
        let dirs = dirs_in(tmp.path(), false);

        assert_eq!(
            dirs.scoped_data_dir().unwrap(),
            dirs.shared_data_dir().unwrap()
        );

        let outcome = dirs.init_local().unwrap();
        assert!(matches!(outcome, InitOutcome::Created(_)));
        assert_eq!(dirs.scoped_data_dir().unwrap(), dirs.local_marker());

        let again = dirs.init_local().unwrap();
        assert_eq!(again.to_string(), "This directory is already initialized.");
    }

    #[test]
    fn test_load_then_default_reverts() {
        let tmp = tempdir().unwrap();
        let dirs = dirs_in(tmp.path(), false);
        let target = tmp.path().join("notes");
        std::fs::create_dir_all(&target).unwrap();

        let loaded = dirs.load_override(target.to_str().unwrap()).unwrap();
        assert_eq!(loaded, LoadOutcome::Loaded(target.clone()));
        assert_eq!(dirs.shared_data_dir().unwrap(), target);

        let reverted = dirs.load_override(LOAD_DEFAULT).unwrap();
        assert_eq!(reverted, LoadOutcome::Reverted);
        assert_eq!(
            dirs.shared_data_dir().unwrap(),
            tmp.path().join("data").join("mem-note")
        );
    }

    #[test]
    fn test_load_rejects_missing_dir() {
        let tmp = tempdir().unwrap();
        let dirs = dirs_in(tmp.path(), false);

        let outcome = dirs.load_override("does/not/exist").unwrap();
        assert!(!outcome.is_success());
        assert!(!dirs.override_file().unwrap().exists());
        assert_eq!(
            outcome.to_string(),
            "Path 'does/not/exist' does not exist or is not a directory."
        );
    }

    #[test]
    fn test_stale_override_falls_back_to_default() {
        let tmp = tempdir().unwrap();
        let dirs = dirs_in(tmp.path(), false);
        std::fs::write(
            dirs.override_file().unwrap(),
            tmp.path().join("gone").to_string_lossy().as_bytes(),
        )
        .unwrap();

        assert_eq!(
            dirs.shared_data_dir().unwrap(),
            dirs.default_data_dir().unwrap()
        );
    }

    #[test]
    fn test_relative_load_resolves_against_cwd() {
        let tmp = tempdir().unwrap();
        let dirs = dirs_in(tmp.path(), false);
        std::fs::create_dir_all(dirs.cwd().join("rel")).unwrap();

        let outcome = dirs.load_override("rel").unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded(dirs.cwd().join("rel")));
    }

    #[cfg(unix)]
    #[test]
    fn test_unwritable_root_is_an_error() {
        let dirs = HubDirs::new(
            DirRoots::new("/proc/mem-hub-test", "/proc/mem-hub-test"),
            "/",
            false,
        );
        assert!(dirs.config_dir().is_err());
    }
}
