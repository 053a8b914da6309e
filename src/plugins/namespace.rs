pub const NAMESPACE_SEP: char = ':';
pub const DEFAULT_COMMAND: &str = "main";

pub fn namespaced(plugin: &str, command: &str) -> String {
    format!("{}{}{}", plugin, NAMESPACE_SEP, command)
}

pub fn parse(token: &str) -> Option<(&str, &str)> {
    token.split_once(NAMESPACE_SEP)
}

/// A parsed `<plugin>[:<command>] [args...]` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub plugin: String,
    pub command: String,
    pub args: Vec<String>,
    /// True when no separator was given and `main` was assumed.
    pub implicit: bool,
}

impl CommandInvocation {
    pub fn new(token: &str, args: Vec<String>) -> Self {
        match parse(token) {
            Some((plugin, command)) => Self {
                plugin: plugin.to_string(),
                command: command.to_string(),
                args,
                implicit: false,
            },
            None => Self {
                plugin: token.to_string(),
                command: DEFAULT_COMMAND.to_string(),
                args,
                implicit: true,
            },
        }
    }

    /// Build from a full token list, the first token naming the target.
    pub fn from_tokens(tokens: &[String]) -> Option<Self> {
        let (first, rest) = tokens.split_first()?;
        Some(Self::new(first, rest.to_vec()))
    }

    pub fn qualified_name(&self) -> String {
        namespaced(&self.plugin, &self.command)
    }
}
