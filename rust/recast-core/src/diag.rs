//! Warning accumulation. Nothing in the pipeline is fatal: unusual input
//! degrades to notes, lossy lowerings to warnings, unrecognized nodes to
//! placeholders, and the caller decides how to surface them.

use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// Recognized but unusual construct; not surfaced by default.
    Note,
    /// Unsupported or lossy lowering.
    Warning,
    /// Unrecognized node rendered as a diagnostic comment.
    Placeholder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    pub severity: Severity,
    pub message: String,
    /// Node discriminator for placeholder warnings.
    pub node_kind: Option<String>,
    pub span: Option<Span>,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Placeholder => "placeholder",
        };
        match (&self.span, &self.node_kind) {
            (Some(s), _) if s.is_known() => {
                write!(f, "{}: {} (line {})", tag, self.message, s.line)
            }
            (_, Some(kind)) => write!(f, "{}: {} [{}]", tag, self.message, kind),
            _ => write!(f, "{}: {}", tag, self.message),
        }
    }
}

/// Session warning buffer. Appending never fails and order is preserved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Warnings {
    items: Vec<Warning>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note(&mut self, message: impl Into<String>, span: Option<Span>) {
        self.items.push(Warning {
            severity: Severity::Note,
            message: message.into(),
            node_kind: None,
            span,
        });
    }

    pub fn warn(&mut self, message: impl Into<String>, span: Option<Span>) {
        self.items.push(Warning {
            severity: Severity::Warning,
            message: message.into(),
            node_kind: None,
            span,
        });
    }

    pub fn placeholder(&mut self, kind: &str, detail: &serde_json::Value, span: Option<Span>) {
        self.items.push(Warning {
            severity: Severity::Placeholder,
            message: format!("unknown node type: {} {}", kind, snapshot(detail, 160)),
            node_kind: Some(kind.to_string()),
            span,
        });
    }

    pub fn extend(&mut self, other: Warnings) {
        self.items.extend(other.items);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Warning> {
        self.items
    }
}

/// Render a JSON value as a single-line snapshot, truncated to `max` bytes
/// on a char boundary.
pub fn snapshot(value: &serde_json::Value, max: usize) -> String {
    let mut text = value.to_string();
    if text.len() > max {
        let mut cut = max;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push('…');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_truncates_on_char_boundary() {
        let v = serde_json::json!({"key": "ééééééééééééééééééééééééééééééééééééééé"});
        let s = snapshot(&v, 20);
        assert!(s.len() <= 24);
        assert!(s.ends_with('…'));
    }

    #[test]
    fn warnings_preserve_order() {
        let mut w = Warnings::new();
        w.note("first", None);
        w.warn("second", None);
        let messages: Vec<_> = w.iter().map(|x| x.message.clone()).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }
}
