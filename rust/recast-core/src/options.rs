//! Target dialect selection and the per-session options surface.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// Output language variant. Drives keyword and library choices throughout
/// the transformer and the emitter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[strum(ascii_case_insensitive)]
pub enum Dialect {
    #[default]
    Python,
    FreeBasic,
    VbNet,
    Vb6,
    Vba,
    VbScript,
    Gambas,
    Xojo,
}

impl Dialect {
    pub fn is_basic(&self) -> bool {
        !matches!(self, Dialect::Python)
    }

    /// Dialects whose grammar has shift operators (`<<`/`>>` or the
    /// `Shl`/`Shr` keywords). The rest go through prelude helper calls.
    pub fn has_shift_operators(&self) -> bool {
        matches!(self, Dialect::VbNet | Dialect::FreeBasic)
    }

    /// Dialects with structured exception handling; the rest only have
    /// `On Error` style flow.
    pub fn has_structured_exceptions(&self) -> bool {
        matches!(
            self,
            Dialect::VbNet | Dialect::FreeBasic | Dialect::Gambas | Dialect::Xojo
        )
    }

    /// Inheritance keyword for class blocks.
    pub fn inherits_keyword(&self) -> &'static str {
        match self {
            Dialect::FreeBasic => "Extends",
            _ => "Inherits",
        }
    }
}

/// Line terminator for emitted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// All options recognized by a transpile session.
///
/// Unknown keys in a JSON options payload are ignored (forward
/// compatibility); missing keys take the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetOptions {
    pub dialect: Dialect,
    /// Include explicit type annotations on declarations and signatures.
    pub add_type_hints: bool,
    /// Preserve module/class/function docstrings.
    pub add_docstrings: bool,
    /// Emit annotations even when the inferred type is `Any`.
    pub strict_types: bool,
    /// BASIC: emit `Class` blocks instead of `Type` + standalone functions.
    pub use_classes: bool,
    /// BASIC: emit `Property Get/Set` instead of paired getter/setters.
    pub use_properties: bool,
    /// BASIC: emit `Try/Catch` instead of `On Error` flow.
    pub use_exceptions: bool,
    /// Indent unit prepended once per nesting level.
    pub indent: String,
    pub line_ending: LineEnding,
}

impl Default for TargetOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::Python,
            add_type_hints: true,
            add_docstrings: true,
            strict_types: false,
            use_classes: true,
            use_properties: true,
            use_exceptions: true,
            indent: "    ".to_string(),
            line_ending: LineEnding::Lf,
        }
    }
}

impl TargetOptions {
    /// Parse an options payload from JSON, ignoring unrecognized keys.
    pub fn from_json(json: &str) -> Result<Self, OptionsError> {
        serde_json::from_str(json).map_err(OptionsError::Deserialize)
    }
}

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("unknown dialect: {0}")]
    UnknownDialect(String),
    #[error("invalid options payload: {0}")]
    Deserialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn dialect_parses_case_insensitively() {
        assert_eq!(Dialect::from_str("python").unwrap(), Dialect::Python);
        assert_eq!(Dialect::from_str("FREEBASIC").unwrap(), Dialect::FreeBasic);
        assert_eq!(Dialect::from_str("vbnet").unwrap(), Dialect::VbNet);
        assert!(Dialect::from_str("cobol").is_err());
    }

    #[test]
    fn options_ignore_unknown_keys() {
        let opts =
            TargetOptions::from_json(r#"{"dialect": "VbNet", "futureKnob": 12}"#).unwrap();
        assert_eq!(opts.dialect, Dialect::VbNet);
        assert!(opts.add_type_hints);
    }

    #[test]
    fn options_default_to_python() {
        let opts = TargetOptions::from_json("{}").unwrap();
        assert_eq!(opts.dialect, Dialect::Python);
        assert_eq!(opts.indent, "    ");
    }
}
