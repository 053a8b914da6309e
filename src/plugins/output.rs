use serde_json::Value;

/// Value returned by a plugin command.
///
/// Commands return data; [`Output::render`] is the only place it becomes
/// printable lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Output {
    #[default]
    Empty,
    Text(String),
    Lines(Vec<String>),
    Value(Value),
}

impl Output {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Lines(lines.into_iter().map(Into::into).collect())
    }

    /// Interpret an arbitrary JSON result (process plugins).
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::String(s) => Self::Text(s),
            Value::Array(items) if items.iter().all(Value::is_string) => Self::Lines(
                items
                    .into_iter()
                    .filter_map(|v| match v {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            other => Self::Value(other),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            Self::Lines(_) => false,
            Self::Value(v) => v.is_null(),
        }
    }

    /// Lines to print: none for empty, one per element for a sequence,
    /// one display line otherwise.
    pub fn render(&self) -> Vec<String> {
        if self.is_empty() {
            return Vec::new();
        }
        match self {
            Self::Empty => Vec::new(),
            Self::Text(s) => vec![s.clone()],
            Self::Lines(lines) => lines.clone(),
            Self::Value(v) => vec![v.to_string()],
        }
    }
}

impl From<String> for Output {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Output {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Vec<String>> for Output {
    fn from(lines: Vec<String>) -> Self {
        Self::Lines(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_empty() {
        assert!(Output::Empty.render().is_empty());
        assert!(Output::text("").render().is_empty());
        assert!(Output::Value(Value::Null).render().is_empty());
    }

    #[test]
    fn test_render_lines_in_order() {
        let out = Output::lines(["c", "a", "b"]);
        assert_eq!(out.render(), vec!["c", "a", "b"]);
        assert!(Output::Lines(Vec::new()).render().is_empty());
    }

    #[test]
    fn test_render_text_is_one_line() {
        assert_eq!(Output::text("hello world").render(), vec!["hello world"]);
    }

    #[test]
    fn test_render_other_values_use_display() {
        assert_eq!(Output::Value(json!(42)).render(), vec!["42"]);
        assert_eq!(
            Output::Value(json!({"a": 1})).render(),
            vec![r#"{"a":1}"#]
        );
    }

    #[test]
    fn test_from_json() {
        assert_eq!(Output::from_json(Value::Null), Output::Empty);
        assert_eq!(Output::from_json(json!("x")), Output::text("x"));
        assert_eq!(
            Output::from_json(json!(["a", "b"])),
            Output::lines(["a", "b"])
        );
        assert_eq!(
            Output::from_json(json!(["a", 1])),
            Output::Value(json!(["a", 1]))
        );
    }
}
