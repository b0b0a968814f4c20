//! Path selectors
//!
//! This module splits schema path expressions (as used by `leafref` paths and
//! `when`/`must` conditions) into steps. Predicates are kept as text on the
//! step they qualify; the walker never evaluates them.

use std::fmt;

/// A parsed path expression
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaPath {
    /// The raw path expression
    pub expression: String,
    /// Whether the path starts at the schema root
    pub absolute: bool,
    /// Parsed path steps
    pub steps: Vec<PathStep>,
}

impl SchemaPath {
    /// Parse a path expression
    pub fn parse(expression: impl Into<String>) -> Self {
        let expression = expression.into();
        let absolute = expression.trim_start().starts_with('/');
        let steps = split_path(&expression)
            .into_iter()
            .map(PathStep::parse)
            .collect();
        Self {
            expression,
            absolute,
            steps,
        }
    }

    /// Get the parsed steps
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Check that every step is something the resolver understands
    pub fn is_well_formed(&self) -> bool {
        !self.steps.is_empty()
            && self.steps.iter().all(|s| match s.kind {
                PathStepKind::Child => is_identifier(&s.name),
                _ => true,
            })
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}

/// A single step in a path expression
#[derive(Debug, Clone, PartialEq)]
pub struct PathStep {
    /// The kind of step
    pub kind: PathStepKind,
    /// The local name (empty for non-child steps)
    pub name: String,
    /// Optional module prefix
    pub prefix: Option<String>,
    /// Optional predicate text, without brackets
    pub predicate: Option<String>,
}

impl PathStep {
    /// Parse a step from a string
    pub fn parse(step: &str) -> Self {
        let step = step.trim();

        let special = match step {
            "." | "self::node()" => Some(PathStepKind::Self_),
            ".." | "parent::node()" => Some(PathStepKind::Parent),
            "current()" => Some(PathStepKind::Current),
            _ => None,
        };
        if let Some(kind) = special {
            return Self {
                kind,
                name: String::new(),
                prefix: None,
                predicate: None,
            };
        }

        let rest = step.strip_prefix("child::").unwrap_or(step);

        // Extract predicate if present
        let (name_part, predicate) = if let Some(bracket_pos) = rest.find('[') {
            let name = &rest[..bracket_pos];
            let pred_end = rest.rfind(']').unwrap_or(rest.len());
            let pred = &rest[bracket_pos + 1..pred_end.max(bracket_pos + 1)];
            (name.trim(), Some(pred.trim().to_string()))
        } else {
            (rest, None)
        };

        // Extract prefix and local name
        let (prefix, name) = match name_part.split_once(':') {
            Some((prefix, local)) => (Some(prefix.to_string()), local.to_string()),
            None => (None, name_part.to_string()),
        };

        Self {
            kind: PathStepKind::Child,
            name,
            prefix,
            predicate,
        }
    }

    /// Create a child step
    pub fn child(name: impl Into<String>) -> Self {
        Self {
            kind: PathStepKind::Child,
            name: name.into(),
            prefix: None,
            predicate: None,
        }
    }

    /// Set the prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Get the qualified name (prefix:local)
    pub fn qname(&self) -> String {
        if let Some(prefix) = &self.prefix {
            format!("{}:{}", prefix, self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Kind of path step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStepKind {
    /// Child node by name
    Child,
    /// Self (.)
    Self_,
    /// Parent (..)
    Parent,
    /// `current()`: the node the expression is evaluated for
    Current,
}

/// Split a path expression into steps
///
/// A leading `/` is dropped; `/` inside predicates does not split.
pub fn split_path(path: &str) -> Vec<&str> {
    let path = path.trim();

    if path.is_empty() {
        return Vec::new();
    }

    let mut steps = Vec::new();
    let mut current_start = if path.starts_with('/') { 1 } else { 0 };

    let mut in_predicate = 0usize;
    let bytes = path.as_bytes();

    for (i, &b) in bytes.iter().enumerate().skip(current_start) {
        match b {
            b'[' => in_predicate += 1,
            b']' => in_predicate = in_predicate.saturating_sub(1),
            b'/' if in_predicate == 0 => {
                let step = path[current_start..i].trim();
                if !step.is_empty() {
                    steps.push(step);
                }
                current_start = i + 1;
            }
            _ => {}
        }
    }

    // Add final step
    if current_start < path.len() {
        let step = path[current_start..].trim();
        if !step.is_empty() {
            steps.push(step);
        }
    }

    steps
}

/// Check if a string is a plain identifier (letters, digits, `_`, `-`, `.`)
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(is_identifier_char)
}

/// Check if a character may continue an identifier
pub fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_path_simple() {
        assert_eq!(split_path("a/b/c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_split_path_with_leading_slash() {
        assert_eq!(split_path("/a/b"), vec!["a", "b"]);
    }

    #[test]
    fn test_split_path_relative() {
        assert_eq!(split_path("../../x"), vec!["..", "..", "x"]);
    }

    #[test]
    fn test_split_path_with_predicate() {
        assert_eq!(
            split_path("/if:interfaces/if:interface[if:name = current()/../ifname]/if:mtu"),
            vec![
                "if:interfaces",
                "if:interface[if:name = current()/../ifname]",
                "if:mtu"
            ]
        );
    }

    #[test]
    fn test_path_step_parse_prefixed() {
        let step = PathStep::parse("if:mtu");
        assert_eq!(step.kind, PathStepKind::Child);
        assert_eq!(step.name, "mtu");
        assert_eq!(step.prefix, Some("if".to_string()));
        assert_eq!(step.qname(), "if:mtu");
    }

    #[test]
    fn test_path_step_parse_with_predicate() {
        let step = PathStep::parse("interface[name = 'eth0']");
        assert_eq!(step.name, "interface");
        assert_eq!(step.predicate, Some("name = 'eth0'".to_string()));
    }

    #[test]
    fn test_path_step_special() {
        assert_eq!(PathStep::parse(".").kind, PathStepKind::Self_);
        assert_eq!(PathStep::parse("..").kind, PathStepKind::Parent);
        assert_eq!(PathStep::parse("current()").kind, PathStepKind::Current);
    }

    #[test]
    fn test_schema_path() {
        let path = SchemaPath::parse("/sys/hostname");
        assert!(path.absolute);
        assert_eq!(path.steps().len(), 2);
        assert!(path.is_well_formed());

        let relative = SchemaPath::parse("current()/../x");
        assert!(!relative.absolute);
        assert_eq!(relative.steps()[0].kind, PathStepKind::Current);

        assert!(!SchemaPath::parse("count(x)").is_well_formed());
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("mtu"));
        assert!(is_identifier("_x-1.2"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier("a b"));
    }
}
