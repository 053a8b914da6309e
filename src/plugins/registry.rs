//! Persistent plugin identity registry (`<config>/manifest.json`).

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::info;

use super::error::{PluginError, PluginResult};
use super::loader::LoadedPlugin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    New,
    Existing,
}

/// Identity → settings object. Entries are only ever added here.
#[derive(Debug, Clone)]
pub struct ManifestRegistry {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl ManifestRegistry {
    /// Read the manifest, creating it as `{}` when absent.
    pub fn load(path: &Path) -> PluginResult<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, b"{}")?;
        }

        let content = std::fs::read_to_string(path)?;
        let entries = if content.trim().is_empty() {
            Map::new()
        } else {
            match serde_json::from_str(&content)? {
                Value::Object(map) => map,
                _ => {
                    return Err(PluginError::load(
                        "manifest",
                        format!("{} is not a JSON object", path.display()),
                    ));
                }
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn register_if_new(&mut self, plugin: &LoadedPlugin) -> PluginResult<Registration> {
        let id = plugin.id().ok_or_else(|| PluginError::MissingIdentity {
            plugin: plugin.name().to_string(),
        })?;
        self.register_identity(id)
    }

    /// Insert `{}` for an unseen identity and persist; known identities are
    /// left untouched.
    pub fn register_identity(&mut self, id: &str) -> PluginResult<Registration> {
        if self.entries.contains_key(id) {
            return Ok(Registration::Existing);
        }

        let mut next = self.entries.clone();
        next.insert(id.to_string(), Value::Object(Map::new()));
        let bytes = serde_json::to_vec_pretty(&next)?;
        std::fs::write(&self.path, bytes)?;
        self.entries = next;

        info!(%id, "registered plugin identity");
        Ok(Registration::New)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn settings(&self, id: &str) -> Option<&Value> {
        self.entries.get(id)
    }

    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_creates_empty_manifest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("manifest.json");

        let registry = ManifestRegistry::load(&path).unwrap();
        assert!(registry.is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_register_twice_keeps_one_entry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        let mut registry = ManifestRegistry::load(&path).unwrap();

        assert_eq!(registry.register_identity("com.x.a").unwrap(), Registration::New);
        assert_eq!(
            registry.register_identity("com.x.a").unwrap(),
            Registration::Existing
        );
        assert_eq!(registry.len(), 1);

        let reloaded = ManifestRegistry::load(&path).unwrap();
        assert!(reloaded.contains("com.x.a"));
        assert_eq!(reloaded.settings("com.x.a"), Some(&Value::Object(Map::new())));
    }

    #[test]
    fn test_existing_settings_are_never_overwritten() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(&path, r#"{"com.x.a":{"theme":"dark"}}"#).unwrap();

        let mut registry = ManifestRegistry::load(&path).unwrap();
        registry.register_identity("com.x.a").unwrap();
        registry.register_identity("com.x.b").unwrap();

        let reloaded = ManifestRegistry::load(&path).unwrap();
        assert_eq!(reloaded.settings("com.x.a").unwrap()["theme"], "dark");
        assert_eq!(
            reloaded.identities().collect::<Vec<_>>(),
            vec!["com.x.a", "com.x.b"]
        );
    }

    #[test]
    fn test_non_object_manifest_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(&path, "[1,2]").unwrap();

        assert!(matches!(
            ManifestRegistry::load(&path),
            Err(PluginError::Load { .. })
        ));
    }
}
