//! Structured span definitions for tracing.

use tracing::{Level, Span, span};

use crate::plugins::namespace;

pub fn dispatch_span(plugin: &str, command: &str) -> Span {
    span!(
        Level::INFO,
        "plugin.dispatch",
        plugin = plugin,
        command = command,
        qualified = %namespace::namespaced(plugin, command),
    )
}

pub fn install_span(source: &str) -> Span {
    span!(Level::INFO, "plugin.install", source = source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spans_enter() {
        let span = dispatch_span("mem", "new");
        let _guard = span.enter();
        let install = install_span("hi");
        let _inner = install.enter();
    }
}
