use async_trait::async_trait;

use crate::plugins::{Api, Output, Plugin, PluginDescriptor, PluginResult};

pub(super) fn descriptor() -> PluginDescriptor {
    super::bundled("hi", "com.flench04.hi", "Example plugin that greets the user.")
}

pub struct HiPlugin;

#[async_trait]
impl Plugin for HiPlugin {
    fn commands(&self) -> Vec<String> {
        vec!["main".into()]
    }

    async fn dispatch(&self, _command: &str, api: &Api, args: &[String]) -> PluginResult<Output> {
        let name = super::first_arg(args).unwrap_or("there");
        let data_dir = api.data_dir()?;
        Ok(Output::text(format!(
            "Hi, {name}! Data lives in {}.",
            data_dir.display()
        )))
    }
}
