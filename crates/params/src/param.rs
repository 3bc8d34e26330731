use serde::{Deserialize, Serialize};
use std::fmt;

/// Names of the tunables exposed by the sketch.
pub mod names {
    pub const FONT_SIZE: &str = "fontSize";
    pub const FONT_WIDTH: &str = "fontWidth";
    pub const FONT: &str = "font";
    pub const CAMERA_Z: &str = "cameraZ";
}

/// Type and bounds of a tunable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParamKind {
    /// A scalar slider.
    Number { min: f32, max: f32, default: f32 },
    /// A dropdown over a fixed list of items.
    Choice { items: Vec<String>, default: String },
}

/// A current parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f32),
    Choice(String),
}

impl ParamValue {
    pub fn as_number(&self) -> Option<f32> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Choice(_) => None,
        }
    }

    pub fn as_choice(&self) -> Option<&str> {
        match self {
            Self::Choice(s) => Some(s),
            Self::Number(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Choice(s) => write!(f, "{s}"),
        }
    }
}

/// Declaration of one named tunable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
}

impl ParamSpec {
    pub fn number(name: &str, default: f32, min: f32, max: f32) -> Self {
        debug_assert!(min <= default && default <= max);
        Self {
            name: name.into(),
            kind: ParamKind::Number { min, max, default },
        }
    }

    pub fn choice(name: &str, items: Vec<String>, default: &str) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Choice {
                items,
                default: default.into(),
            },
        }
    }

    pub fn default_value(&self) -> ParamValue {
        match &self.kind {
            ParamKind::Number { default, .. } => ParamValue::Number(*default),
            ParamKind::Choice { default, .. } => ParamValue::Choice(default.clone()),
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self.kind, ParamKind::Number { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_defaults() {
        let s = ParamSpec::number(names::CAMERA_Z, 50.0, 1.0, 100.0);
        assert_eq!(s.default_value(), ParamValue::Number(50.0));
        assert!(s.is_number());

        let c = ParamSpec::choice(names::FONT, vec!["Orbitron".into()], "Orbitron");
        assert_eq!(c.default_value().as_choice(), Some("Orbitron"));
        assert!(!c.is_number());
    }

    #[test]
    fn declaration_serializes_with_type_tag() {
        let s = ParamSpec::number(names::FONT_WIDTH, 0.2, 0.0, 1.0);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["kind"]["type"], "number");
        assert_eq!(json["name"], "fontWidth");
    }
}
