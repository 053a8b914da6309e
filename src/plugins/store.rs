//! Plugin files on disk: bundled sync, local add/remove/export, remote install.

use std::path::{Path, PathBuf};

use tracing::{Instrument, debug, info};

use super::descriptor::{PLUGIN_FILE_EXT, is_plugin_file, plugin_file_name};
use super::discovery;
use super::error::{PluginError, PluginResult};
use super::index::{self, PluginIndex};
use crate::client::{self, Downloader};
use crate::observability;
use crate::paths::HubDirs;

/// A plugin file shipped with the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundledFile {
    pub name: String,
    pub contents: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub written: Vec<String>,
    pub skipped: Vec<String>,
}

/// A successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installed {
    pub name: String,
    pub source: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PluginStore {
    dirs: HubDirs,
    bundled: Vec<BundledFile>,
    downloader: Downloader,
    default_index: PluginIndex,
}

impl PluginStore {
    pub fn new(dirs: HubDirs, bundled: Vec<BundledFile>, downloader: Downloader) -> Self {
        Self {
            dirs,
            bundled,
            downloader,
            default_index: index::default_index(),
        }
    }

    pub fn with_default_index(mut self, index: PluginIndex) -> Self {
        self.default_index = index;
        self
    }

    pub fn plugins_dir(&self) -> std::io::Result<PathBuf> {
        self.dirs.plugins_dir()
    }

    pub fn index_path(&self) -> std::io::Result<PathBuf> {
        Ok(index::index_path(&self.dirs.config_dir()?))
    }

    pub fn bundled(&self) -> &[BundledFile] {
        &self.bundled
    }

    /// Path of the plugin file for `name`, whether or not it exists.
    pub fn plugin_path(&self, name: &str) -> PluginResult<PathBuf> {
        validate_name(name)?;
        Ok(self.plugins_dir()?.join(plugin_file_name(name)))
    }

    pub fn find(&self, name: &str) -> PluginResult<Option<PathBuf>> {
        let path = self.plugin_path(name)?;
        Ok(path.is_file().then_some(path))
    }

    pub fn list(&self) -> std::io::Result<Vec<PathBuf>> {
        discovery::plugin_files(&self.plugins_dir()?)
    }

    /// Make sure `<plugins>/<name>.json` exists, syncing bundled plugins
    /// first when it does not (or always, in debug mode).
    pub fn ensure_present(&self, name: &str) -> std::io::Result<bool> {
        if validate_name(name).is_err() {
            return Ok(false);
        }
        let path = self.plugins_dir()?.join(plugin_file_name(name));
        if self.dirs.is_debug() || !path.is_file() {
            self.sync_bundled(self.dirs.is_debug())?;
        }
        Ok(path.is_file())
    }

    /// Copy every bundled plugin into the plugin directory. Existing files are
    /// only replaced when `overwrite` is set.
    pub fn sync_bundled(&self, overwrite: bool) -> std::io::Result<SyncReport> {
        let dir = self.plugins_dir()?;
        let mut report = SyncReport::default();

        for file in &self.bundled {
            let dest = dir.join(plugin_file_name(&file.name));
            if dest.exists() && !overwrite {
                report.skipped.push(file.name.clone());
                continue;
            }
            std::fs::write(&dest, file.contents.as_bytes())?;
            report.written.push(file.name.clone());
        }

        debug!(
            written = report.written.len(),
            skipped = report.skipped.len(),
            "synced bundled plugins"
        );
        Ok(report)
    }

    /// Install from a URL, or by name through the local index.
    pub async fn install_from_source(&self, source: &str) -> PluginResult<Installed> {
        let span = observability::install_span(source);
        if client::is_remote(source) {
            return self.install_from_url(source).instrument(span).await;
        }
        self.install_from_index(source).instrument(span).await
    }

    async fn install_from_url(&self, url: &str) -> PluginResult<Installed> {
        let file_name = client::file_name_from_url(url)
            .ok_or_else(|| PluginError::download(url, "URL has no file name"))?;
        validate_name(&file_name)?;
        if !Path::new(&file_name)
            .extension()
            .is_some_and(|e| e == PLUGIN_FILE_EXT)
        {
            return Err(PluginError::download(
                url,
                format!("URL does not name a .{PLUGIN_FILE_EXT} plugin file"),
            ));
        }

        let download = self.downloader.fetch(url).await?;
        let dest = self.plugins_dir()?.join(&file_name);
        tokio::fs::write(&dest, &download.bytes).await?;

        let name = Path::new(&file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&file_name)
            .to_string();
        info!(%url, path = %dest.display(), "installed plugin");
        Ok(Installed {
            name,
            source: url.to_string(),
            path: dest,
        })
    }

    async fn install_from_index(&self, name: &str) -> PluginResult<Installed> {
        validate_name(name)?;
        let index_path = self.index_path()?;

        let Some(index) = index::load_index(&index_path)? else {
            index::save_index(&index_path, &self.default_index)?;
            info!(path = %index_path.display(), "seeded default plugin index");
            return Err(PluginError::IndexSeeded { path: index_path });
        };

        let entry = index
            .get(name)
            .ok_or_else(|| PluginError::IndexEntryNotFound {
                name: name.to_string(),
            })?;
        let url = entry
            .url
            .as_deref()
            .ok_or_else(|| PluginError::download(name, "index entry has no url"))?;

        let download = self.downloader.fetch(url).await?;
        let dest = self.plugins_dir()?.join(plugin_file_name(name));
        tokio::fs::write(&dest, &download.bytes).await?;

        info!(%name, %url, path = %dest.display(), "installed plugin from index");
        Ok(Installed {
            name: name.to_string(),
            source: url.to_string(),
            path: dest,
        })
    }

    /// Copy a local plugin file into the plugin directory.
    pub fn add_local(&self, source: &Path) -> PluginResult<PathBuf> {
        if !source.is_file() {
            return Err(PluginError::NotFound {
                name: source.display().to_string(),
            });
        }
        if !source.extension().is_some_and(|e| e == PLUGIN_FILE_EXT) {
            return Err(PluginError::execution(format!(
                "Only .{PLUGIN_FILE_EXT} plugin files can be added."
            )));
        }
        let file_name = source
            .file_name()
            .ok_or_else(|| PluginError::NotFound {
                name: source.display().to_string(),
            })?;
        let dest = self.plugins_dir()?.join(file_name);
        std::fs::copy(source, &dest)?;
        Ok(dest)
    }

    pub fn remove(&self, name: &str) -> PluginResult<PathBuf> {
        let path = self.existing(name)?;
        std::fs::remove_file(&path)?;
        info!(%name, "removed plugin");
        Ok(path)
    }

    /// Copy a plugin file into `dest_dir`.
    pub fn export(&self, name: &str, dest_dir: &Path) -> PluginResult<PathBuf> {
        let path = self.existing(name)?;
        let dest = dest_dir.join(plugin_file_name(name));
        std::fs::copy(&path, &dest)?;
        Ok(dest)
    }

    fn existing(&self, name: &str) -> PluginResult<PathBuf> {
        self.find(name)?
            .filter(|p| is_plugin_file(p))
            .ok_or_else(|| PluginError::NotFound {
                name: name.to_string(),
            })
    }
}

/// Plugin names become file names; anything that could escape the plugin
/// directory is rejected.
fn validate_name(name: &str) -> PluginResult<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(PluginError::NotFound {
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::DEFAULT_TIMEOUT;
    use crate::paths::DirRoots;
    use crate::plugins::index::IndexEntry;
    use tempfile::{TempDir, tempdir};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn bundled() -> Vec<BundledFile> {
        vec![
            BundledFile {
                name: "hi".into(),
                contents: r#"{"id":"t.hi","version":{"major":0,"minor":4,"patch":0},"runtime":{"builtin":"hi"}}"#
                    .into(),
            },
            BundledFile {
                name: "mem".into(),
                contents: r#"{"id":"t.mem","version":{"major":0,"minor":4,"patch":0},"runtime":{"builtin":"mem"}}"#
                    .into(),
            },
        ]
    }

    fn store_in(tmp: &TempDir, debug: bool) -> PluginStore {
        let dirs = HubDirs::new(
            DirRoots::new(tmp.path().join("config"), tmp.path().join("data")),
            tmp.path(),
            debug,
        );
        PluginStore::new(dirs, bundled(), Downloader::new(DEFAULT_TIMEOUT).unwrap())
    }

    #[test]
    fn test_ensure_present_syncs_bundled() {
        let tmp = tempdir().unwrap();
        let store = store_in(&tmp, false);

        assert!(store.list().unwrap().is_empty());
        assert!(store.ensure_present("hi").unwrap());
        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn test_ensure_present_absent_after_sync() {
        let tmp = tempdir().unwrap();
        let store = store_in(&tmp, false);

        assert!(!store.ensure_present("ghost").unwrap());
        // sync still happened
        assert!(store.find("mem").unwrap().is_some());
    }

    #[test]
    fn test_sync_skips_existing_unless_overwrite() {
        let tmp = tempdir().unwrap();
        let store = store_in(&tmp, false);
        let hi = store.plugin_path("hi").unwrap();
        std::fs::write(&hi, "custom").unwrap();

        let report = store.sync_bundled(false).unwrap();
        assert_eq!(report.skipped, vec!["hi"]);
        assert_eq!(std::fs::read_to_string(&hi).unwrap(), "custom");

        let report = store.sync_bundled(true).unwrap();
        assert_eq!(report.written, vec!["hi", "mem"]);
        assert_ne!(std::fs::read_to_string(&hi).unwrap(), "custom");
    }

    #[test]
    fn test_debug_mode_refreshes_bundled() {
        let tmp = tempdir().unwrap();
        let store = store_in(&tmp, true);
        let hi = store.plugin_path("hi").unwrap();
        std::fs::write(&hi, "stale").unwrap();

        assert!(store.ensure_present("hi").unwrap());
        assert_ne!(std::fs::read_to_string(&hi).unwrap(), "stale");
    }

    #[test]
    fn test_names_cannot_escape_plugin_dir() {
        let tmp = tempdir().unwrap();
        let store = store_in(&tmp, false);
        assert!(store.plugin_path("../manifest").is_err());
        assert!(!store.ensure_present("..").unwrap());
    }

    #[test]
    fn test_add_remove_export() {
        let tmp = tempdir().unwrap();
        let store = store_in(&tmp, false);
        let src = tmp.path().join("extra.json");
        std::fs::write(&src, "{}").unwrap();

        let added = store.add_local(&src).unwrap();
        assert!(added.is_file());

        let out = tmp.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        let exported = store.export("extra", &out).unwrap();
        assert_eq!(exported, out.join("extra.json"));

        store.remove("extra").unwrap();
        assert!(store.find("extra").unwrap().is_none());
        assert!(matches!(
            store.remove("extra"),
            Err(PluginError::NotFound { .. })
        ));
    }

    #[test]
    fn test_add_rejects_non_plugin_files() {
        let tmp = tempdir().unwrap();
        let store = store_in(&tmp, false);
        let src = tmp.path().join("script.py");
        std::fs::write(&src, "print()").unwrap();

        assert!(store.add_local(&src).is_err());
        assert!(matches!(
            store.add_local(&tmp.path().join("missing.json")),
            Err(PluginError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_install_by_name_seeds_index_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/hi.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"x\":1}"))
            .mount(&server)
            .await;

        let tmp = tempdir().unwrap();
        let seeded = std::collections::BTreeMap::from([(
            "hi".to_string(),
            IndexEntry::with_url(format!("{}/hi.json", server.uri())),
        )]);
        let store = store_in(&tmp, false).with_default_index(seeded);

        let err = store.install_from_source("hi").await.unwrap_err();
        assert!(matches!(err, PluginError::IndexSeeded { .. }));
        assert!(store.find("hi").unwrap().is_none());
        assert!(store.index_path().unwrap().is_file());

        let installed = store.install_from_source("hi").await.unwrap();
        assert_eq!(installed.path, store.plugin_path("hi").unwrap());
        assert_eq!(std::fs::read_to_string(&installed.path).unwrap(), "{\"x\":1}");
    }

    #[tokio::test]
    async fn test_install_unknown_index_entry() {
        let tmp = tempdir().unwrap();
        let store = store_in(&tmp, false);
        index::save_index(&store.index_path().unwrap(), &index::default_index()).unwrap();

        let err = store.install_from_source("nope").await.unwrap_err();
        assert!(matches!(err, PluginError::IndexEntryNotFound { ref name } if name == "nope"));
    }

    #[tokio::test]
    async fn test_install_from_url_names_file_after_last_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dist/greeter.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let tmp = tempdir().unwrap();
        let store = store_in(&tmp, false);
        let installed = store
            .install_from_source(&format!("{}/dist/greeter.json", server.uri()))
            .await
            .unwrap();

        assert_eq!(installed.name, "greeter");
        assert_eq!(installed.path, store.plugins_dir().unwrap().join("greeter.json"));
    }

    #[tokio::test]
    async fn test_install_from_url_failure_writes_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let tmp = tempdir().unwrap();
        let store = store_in(&tmp, false);
        let err = store
            .install_from_source(&format!("{}/broken.json", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, PluginError::Download { .. }));
        assert!(store.find("broken").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_install_from_url_requires_json_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(0)
            .mount(&server)
            .await;

        let tmp = tempdir().unwrap();
        let store = store_in(&tmp, false);
        let err = store
            .install_from_source(&format!("{}/greeter", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, PluginError::Download { ref reason, .. } if reason.contains(".json")));
        assert!(!store.plugins_dir().unwrap().join("greeter").exists());
        assert!(store.find("greeter").unwrap().is_none());
    }
}
