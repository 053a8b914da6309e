//! Plugin repositories: JSON files under `<config>/repo/` that list
//! installable plugins. `build` flattens them into the install index.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::client;
use crate::plugins::index::{self, IndexEntry, PluginIndex};
use crate::plugins::{Api, Output, Plugin, PluginDescriptor, PluginResult};

pub const REPO_DIR: &str = "repo";
const REPO_FILE_EXT: &str = "json";

pub(super) fn descriptor() -> PluginDescriptor {
    super::bundled(
        "repo",
        "com.flench04.repo",
        "Manage plugin repositories: catalog, add, remove, update, search, build.",
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Plugins may be listed as objects carrying a `name`, or as a map from
/// name to an entry object or bare URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RepoPlugins {
    List(Vec<Value>),
    Map(Map<String, Value>),
}

impl Default for RepoPlugins {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoFile {
    #[serde(rename = "repo-info")]
    pub info: RepoInfo,
    #[serde(default)]
    pub plugins: RepoPlugins,
}

impl RepoFile {
    pub fn load(path: &Path) -> PluginResult<Self> {
        Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
    }

    /// `(name, entry)` for every plugin this repository lists.
    pub fn entries(&self) -> Vec<(String, IndexEntry)> {
        match &self.plugins {
            RepoPlugins::Map(map) => map
                .iter()
                .map(|(name, value)| {
                    let entry = match value {
                        Value::Object(_) => {
                            serde_json::from_value(value.clone()).unwrap_or_default()
                        }
                        Value::String(url) => IndexEntry::with_url(url.clone()),
                        other => IndexEntry::with_url(other.to_string()),
                    };
                    (name.clone(), entry)
                })
                .collect(),
            RepoPlugins::List(items) => items
                .iter()
                .filter(|v| v.is_object())
                .filter_map(|value| {
                    let entry: IndexEntry = serde_json::from_value(value.clone()).ok()?;
                    let name = list_entry_name(value, &entry)?;
                    Some((name, entry))
                })
                .collect(),
        }
    }
}

fn list_entry_name(value: &Value, entry: &IndexEntry) -> Option<String> {
    let field = |key: &str| value.get(key).and_then(Value::as_str).filter(|s| !s.is_empty());
    if let Some(name) = field("name").or_else(|| field("id")) {
        return Some(name.to_string());
    }
    let file = client::file_name_from_url(entry.url.as_deref()?)?;
    Some(
        file.strip_suffix(&format!(".{}", crate::plugins::PLUGIN_FILE_EXT))
            .unwrap_or(&file)
            .to_string(),
    )
}

fn description_of(entry: &IndexEntry) -> &str {
    entry
        .extra
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or("No description.")
}

pub struct RepoPlugin;

#[async_trait]
impl Plugin for RepoPlugin {
    fn commands(&self) -> Vec<String> {
        ["catalog", "add", "remove", "update", "search", "build"]
            .map(String::from)
            .to_vec()
    }

    async fn dispatch(&self, command: &str, api: &Api, args: &[String]) -> PluginResult<Output> {
        let dir = repo_dir(api)?;
        match command {
            "catalog" => catalog(&dir),
            "add" => add(api, &dir, args).await,
            "remove" => remove(&dir, args),
            "update" => update(api, &dir).await,
            "search" => search(&dir, args),
            _ => build(api, &dir),
        }
    }
}

fn repo_dir(api: &Api) -> PluginResult<PathBuf> {
    let dir = api.config_dir()?.join(REPO_DIR);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Parsed repository files, sorted by path. Unreadable files are skipped.
fn repos(dir: &Path) -> PluginResult<Vec<(PathBuf, RepoFile)>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == REPO_FILE_EXT))
        .collect();
    paths.sort();

    Ok(paths
        .into_iter()
        .filter_map(|path| match RepoFile::load(&path) {
            Ok(repo) => Some((path, repo)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable repo file");
                None
            }
        })
        .collect())
}

fn catalog(dir: &Path) -> PluginResult<Output> {
    let lines = repos(dir)?
        .into_iter()
        .map(|(_, repo)| format!("{}: {}", repo.info.name, repo.info.description))
        .collect();
    Ok(Output::Lines(lines))
}

async fn add(api: &Api, dir: &Path, args: &[String]) -> PluginResult<Output> {
    let Some(source) = super::first_arg(args) else {
        return Ok(Output::text("Please provide a repository URL or path."));
    };

    if client::is_remote(source) {
        let download = api.downloader().fetch(source).await?;
        let file_name = client::file_name_from_url(&download.final_url)
            .unwrap_or_else(|| format!("{}.{REPO_FILE_EXT}", REPO_DIR));
        let dest = dir.join(file_name);
        std::fs::write(&dest, &download.bytes)?;
        return Ok(Output::text(format!(
            "Installed repo from {source} to {}",
            dest.display()
        )));
    }

    let path = api.cwd().join(source);
    let Some(file_name) = path.file_name().filter(|_| path.is_file()) else {
        return Ok(Output::text(format!("Repo file '{source}' not found.")));
    };
    let dest = dir.join(file_name);
    std::fs::copy(&path, &dest)?;
    Ok(Output::text(format!(
        "Added repo from {source} to {}",
        dest.display()
    )))
}

fn remove(dir: &Path, args: &[String]) -> PluginResult<Output> {
    let Some(name) = super::first_arg(args) else {
        return Ok(Output::text("Please provide the repo name to remove."));
    };
    let path = dir.join(format!("{name}.{REPO_FILE_EXT}"));
    if name.contains(['/', '\\']) || !path.is_file() {
        return Ok(Output::text(format!("Repo '{name}' not found.")));
    }
    std::fs::remove_file(path)?;
    Ok(Output::text(format!("Removed repo '{name}'.")))
}

async fn update(api: &Api, dir: &Path) -> PluginResult<Output> {
    let mut out = Vec::new();
    for (path, repo) in repos(dir)? {
        let Some(url) = repo.info.url.as_deref() else {
            out.push(format!("Repo '{}' has no url; skipped.", repo.info.name));
            continue;
        };
        match api.downloader().fetch(url).await {
            Ok(download) => {
                std::fs::write(&path, &download.bytes)?;
                out.push(format!("Updated repo '{}' from {url}.", repo.info.name));
            }
            Err(e) => {
                warn!(%url, error = %e, "repo update failed");
                out.push(format!("Failed to update repo from {url}."));
            }
        }
    }
    Ok(Output::Lines(out))
}

fn search(dir: &Path, terms: &[String]) -> PluginResult<Output> {
    let terms: Vec<String> = terms.iter().map(|t| t.to_lowercase()).collect();
    let mut out = Vec::new();
    for (_, repo) in repos(dir)? {
        for (name, entry) in repo.entries() {
            let description = description_of(&entry);
            let haystack = [name.to_lowercase(), description.to_lowercase()];
            if terms.iter().any(|t| haystack.iter().any(|h| h.contains(t))) {
                out.push(format!("{name}: {description}"));
            }
        }
    }
    Ok(Output::Lines(out))
}

fn build(api: &Api, dir: &Path) -> PluginResult<Output> {
    let mut built = PluginIndex::new();
    for (_, repo) in repos(dir)? {
        built.extend(repo.entries());
    }

    let path = index::index_path(&api.config_dir()?);
    index::save_index(&path, &built)?;
    Ok(Output::text(format!(
        "Built plugin index with {} plugins at {}.",
        built.len(),
        path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::testing;
    use serde_json::json;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn write_repo(api: &Api, file: &str, body: Value) {
        let dir = repo_dir(api).unwrap();
        std::fs::write(dir.join(file), body.to_string()).unwrap();
    }

    fn sample(api: &Api) {
        write_repo(
            api,
            "main.json",
            json!({
                "repo-info": {"name": "main", "description": "Main repo"},
                "plugins": [
                    {"name": "hi", "url": "https://x/hi.json", "description": "Greets"},
                    {"url": "https://x/todo.json"},
                    "ignored"
                ]
            }),
        );
        write_repo(
            api,
            "extra.json",
            json!({
                "repo-info": {"name": "extra", "description": "Extras"},
                "plugins": {
                    "clock": {"url": "https://y/clock.json", "description": "Shows time"},
                    "bare": "https://y/bare.json"
                }
            }),
        );
    }

    #[test]
    fn test_entries_from_both_shapes() {
        let list: RepoFile = serde_json::from_value(json!({
            "repo-info": {"name": "l"},
            "plugins": [{"id": "by-id", "url": "https://x/a.json"}, {"url": "https://x/b.json"}]
        }))
        .unwrap();
        let names: Vec<_> = list.entries().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["by-id", "b"]);

        let map: RepoFile = serde_json::from_value(json!({
            "repo-info": {"name": "m"},
            "plugins": {"c": "https://x/c.json"}
        }))
        .unwrap();
        let entries = map.entries();
        assert_eq!(entries[0].1.url.as_deref(), Some("https://x/c.json"));
    }

    #[tokio::test]
    async fn test_catalog_and_search() {
        let tmp = tempdir().unwrap();
        let api = testing::api(&tmp);
        sample(&api);

        let out = RepoPlugin.dispatch("catalog", &api, &[]).await.unwrap();
        assert_eq!(out, Output::lines(["extra: Extras", "main: Main repo"]));

        let out = RepoPlugin
            .dispatch("search", &api, &testing::args(&["TIME", "greet"]))
            .await
            .unwrap();
        assert_eq!(out, Output::lines(["clock: Shows time", "hi: Greets"]));
    }

    #[tokio::test]
    async fn test_build_writes_index() {
        let tmp = tempdir().unwrap();
        let api = testing::api(&tmp);
        sample(&api);

        let out = RepoPlugin.dispatch("build", &api, &[]).await.unwrap();
        assert!(out.render()[0].starts_with("Built plugin index with 4 plugins at "));

        let built = index::load_index(&api.store().index_path().unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(built["todo"].url.as_deref(), Some("https://x/todo.json"));
        assert_eq!(built["bare"].url.as_deref(), Some("https://y/bare.json"));
        assert_eq!(built["hi"].extra["description"], "Greets");
    }

    #[tokio::test]
    async fn test_add_local_and_remove() {
        let tmp = tempdir().unwrap();
        let api = testing::api(&tmp);
        std::fs::write(
            api.cwd().join("local.json"),
            json!({"repo-info": {"name": "local", "description": "L"}}).to_string(),
        )
        .unwrap();

        let out = RepoPlugin
            .dispatch("add", &api, &testing::args(&["local.json"]))
            .await
            .unwrap();
        assert!(out.render()[0].starts_with("Added repo from local.json"));

        let out = RepoPlugin
            .dispatch("remove", &api, &testing::args(&["local"]))
            .await
            .unwrap();
        assert_eq!(out, Output::text("Removed repo 'local'."));
        let out = RepoPlugin
            .dispatch("remove", &api, &testing::args(&["local"]))
            .await
            .unwrap();
        assert_eq!(out, Output::text("Repo 'local' not found."));
    }

    #[tokio::test]
    async fn test_add_remote_and_update() {
        let server = MockServer::start().await;
        let url = format!("{}/repos/community.json", server.uri());
        let body = json!({
            "repo-info": {"name": "community", "description": "C", "url": url},
            "plugins": []
        });
        Mock::given(method("GET"))
            .and(path("/repos/community.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
            .mount(&server)
            .await;

        let tmp = tempdir().unwrap();
        let api = testing::api(&tmp);
        let out = RepoPlugin
            .dispatch("add", &api, &testing::args(&[url.as_str()]))
            .await
            .unwrap();
        assert!(out.render()[0].starts_with("Installed repo from "));
        assert!(repo_dir(&api).unwrap().join("community.json").is_file());

        write_repo(
            &api,
            "dead.json",
            json!({"repo-info": {"name": "dead", "url": format!("{}/gone.json", server.uri())}}),
        );
        let out = RepoPlugin.dispatch("update", &api, &[]).await.unwrap();
        let lines = out.render();
        assert!(lines.contains(&format!("Updated repo 'community' from {url}.")));
        assert!(lines.iter().any(|l| l.starts_with("Failed to update repo from ")));
    }
}
