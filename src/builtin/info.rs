use async_trait::async_trait;

use crate::plugins::{
    Api, Capabilities, Capability, Output, Plugin, PluginDescriptor, PluginResult, PluginStore,
    plugin_name_from_path,
};

pub(super) fn descriptor() -> PluginDescriptor {
    super::bundled("info", super::INFO_ID, "Display available plugins and metadata.")
}

pub struct InfoPlugin;

#[async_trait]
impl Plugin for InfoPlugin {
    fn commands(&self) -> Vec<String> {
        ["main", "catalog", "info"].map(String::from).to_vec()
    }

    fn contribute_api(&self, core: &Api) -> Option<Capabilities> {
        let store = core.store().clone();
        Some(Capabilities::from([(
            super::DESCRIBE_CAPABILITY.to_string(),
            Capability::function(move |args| describe(&store, args)),
        )]))
    }

    async fn dispatch(&self, command: &str, api: &Api, args: &[String]) -> PluginResult<Output> {
        match command {
            "catalog" => catalog(api.store()),
            "info" => info(api.store(), args),
            _ => describe(api.store(), args),
        }
    }
}

/// No arguments or `catalog|list|ls` lists every plugin; `info|show <names>`
/// or bare names describe the named plugins.
fn describe(store: &PluginStore, args: &[String]) -> PluginResult<Output> {
    let Some(first) = args.first() else {
        return catalog(store);
    };
    match first.to_lowercase().as_str() {
        "catalog" | "list" | "ls" => catalog(store),
        "info" | "show" => info(store, &args[1..]),
        _ => info(store, args),
    }
}

fn catalog(store: &PluginStore) -> PluginResult<Output> {
    let files = store.list()?;
    if files.is_empty() {
        return Ok(Output::text("No plugins found."));
    }

    let lines = files
        .iter()
        .map(|path| {
            let stem = plugin_name_from_path(path).unwrap_or_default();
            match PluginDescriptor::load(path) {
                Ok(d) => {
                    let meta = d.metadata(&stem, path);
                    format!("{}: {}", meta.name, meta.description)
                }
                Err(_) => stem,
            }
        })
        .collect();
    Ok(Output::Lines(lines))
}

fn info(store: &PluginStore, names: &[String]) -> PluginResult<Output> {
    if names.is_empty() {
        return Ok(Output::text("Error: Please provide at least one plugin name."));
    }

    let mut out = Vec::new();
    for name in names {
        if !out.is_empty() {
            out.push(String::new());
        }
        let Some(path) = store.find(name).ok().flatten() else {
            out.push(format!("Plugin '{name}' not found."));
            continue;
        };
        match PluginDescriptor::load(&path) {
            Ok(d) => {
                let meta = d.metadata(name, &path);
                out.push(format!("Name: {}", meta.name));
                out.push(format!("Description: {}", meta.description));
                out.push(format!("File: {}", meta.file_path.display()));
                if let Some(id) = &d.id {
                    out.push(format!("Id: {id}"));
                }
                out.push(format!("Version: {}", d.version));
            }
            Err(_) => out.push(format!("Plugin '{name}' has no metadata.")),
        }
    }
    Ok(Output::Lines(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::testing;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_catalog_lists_bundled_plugins() {
        let tmp = tempdir().unwrap();
        let api = testing::api(&tmp);
        api.store().sync_bundled(false).unwrap();

        let out = InfoPlugin.dispatch("main", &api, &[]).await.unwrap();
        let lines = out.render();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "hi: Example plugin that greets the user.");
    }

    #[tokio::test]
    async fn test_catalog_empty() {
        let tmp = tempdir().unwrap();
        let out = InfoPlugin
            .dispatch("catalog", &testing::api(&tmp), &[])
            .await
            .unwrap();
        assert_eq!(out, Output::text("No plugins found."));
    }

    #[tokio::test]
    async fn test_info_for_names_with_separator() {
        let tmp = tempdir().unwrap();
        let api = testing::api(&tmp);
        api.store().sync_bundled(false).unwrap();

        let out = InfoPlugin
            .dispatch("main", &api, &testing::args(&["show", "mem", "ghost"]))
            .await
            .unwrap();
        let lines = out.render();
        assert_eq!(lines[0], "Name: mem");
        assert!(lines.contains(&"Id: com.flench04.mem".to_string()));
        assert!(lines.contains(&String::new()));
        assert_eq!(lines.last().unwrap(), "Plugin 'ghost' not found.");
    }

    #[tokio::test]
    async fn test_info_requires_names() {
        let tmp = tempdir().unwrap();
        let out = InfoPlugin
            .dispatch("info", &testing::api(&tmp), &[])
            .await
            .unwrap();
        assert_eq!(
            out,
            Output::text("Error: Please provide at least one plugin name.")
        );
    }

    #[test]
    fn test_contributes_describe() {
        let tmp = tempdir().unwrap();
        let api = testing::api(&tmp);
        let caps = InfoPlugin.contribute_api(&api).unwrap();
        let out = caps[crate::builtin::DESCRIBE_CAPABILITY]
            .call(&testing::args(&["ls"]))
            .unwrap();
        assert_eq!(out, Output::text("No plugins found."));
    }
}
