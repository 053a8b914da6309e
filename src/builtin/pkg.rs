use async_trait::async_trait;

use crate::client;
use crate::plugins::{
    Api, Output, Plugin, PluginDescriptor, PluginError, PluginResult, plugin_file_name,
};

pub(super) fn descriptor() -> PluginDescriptor {
    super::bundled(
        "pkg",
        "com.flench04.pkg",
        "Manage plugins: add, remove, export, info, install.",
    )
}

const USAGE: &str = "Usage: pkg:add <path> | pkg:remove <name> | pkg:export <name> | pkg:info [names...] | pkg:install <url|name>";

pub struct PkgPlugin;

#[async_trait]
impl Plugin for PkgPlugin {
    fn commands(&self) -> Vec<String> {
        ["main", "help", "add", "remove", "export", "info", "install"]
            .map(String::from)
            .to_vec()
    }

    async fn dispatch(&self, command: &str, api: &Api, args: &[String]) -> PluginResult<Output> {
        match command {
            "add" => add(api, args),
            "remove" => remove(api, args),
            "export" => export(api, args),
            "info" => info(api, args),
            "install" => install(api, args).await,
            _ => Ok(Output::text(USAGE)),
        }
    }
}

fn add(api: &Api, args: &[String]) -> PluginResult<Output> {
    let Some(source) = super::first_arg(args) else {
        return Ok(Output::text("Please provide the path to the plugin file."));
    };
    let path = api.cwd().join(source);
    match api.store().add_local(&path) {
        Ok(dest) => Ok(Output::text(format!("Added plugin to {}", dest.display()))),
        Err(PluginError::NotFound { .. }) => {
            Ok(Output::text(format!("Plugin file '{source}' not found.")))
        }
        Err(PluginError::Execution(message)) => Ok(Output::Text(message)),
        Err(e) => Err(e),
    }
}

fn remove(api: &Api, args: &[String]) -> PluginResult<Output> {
    let Some(name) = super::first_arg(args) else {
        return Ok(Output::text("Please provide the plugin name to remove."));
    };
    match api.store().remove(name) {
        Ok(_) => Ok(Output::text(format!(
            "Removed plugin {}",
            plugin_file_name(name)
        ))),
        Err(e) if e.is_not_found() => Ok(Output::text(format!("Plugin '{name}' not found."))),
        Err(e) => Err(e),
    }
}

fn export(api: &Api, args: &[String]) -> PluginResult<Output> {
    let Some(name) = super::first_arg(args) else {
        return Ok(Output::text("Please provide the plugin name to export."));
    };
    match api.store().export(name, api.cwd()) {
        Ok(dest) => Ok(Output::text(format!("Exported plugin to {}", dest.display()))),
        Err(e) if e.is_not_found() => Ok(Output::text(format!("Plugin '{name}' not found."))),
        Err(e) => Err(e),
    }
}

fn info(api: &Api, args: &[String]) -> PluginResult<Output> {
    if api
        .capability(super::INFO_ID, super::DESCRIBE_CAPABILITY)
        .is_none()
    {
        return Ok(Output::text("Info plugin not found."));
    }
    api.call(super::INFO_ID, super::DESCRIBE_CAPABILITY, args)
}

async fn install(api: &Api, args: &[String]) -> PluginResult<Output> {
    let Some(source) = super::first_arg(args) else {
        return Ok(Output::text(
            "Please provide the plugin name or URL to install.",
        ));
    };

    match api.store().install_from_source(source).await {
        Ok(installed) if client::is_remote(source) => Ok(Output::text(format!(
            "Installed plugin from {source} to {}",
            installed.path.display()
        ))),
        Ok(installed) => Ok(Output::text(format!(
            "Installed plugin '{}' from {} to {}",
            installed.name,
            installed.source,
            installed.path.display()
        ))),
        // seeding the index is a completed step, not a failure
        Err(e @ PluginError::IndexSeeded { .. }) => Ok(Output::text(e.to_string())),
        Err(e) => Err(e),
    }
}
