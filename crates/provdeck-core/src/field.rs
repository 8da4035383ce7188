// ── Form input coercion ──
//
// Console inputs arrive as strings no matter what the field stores.
// `coerce` turns a raw input string into a typed `FieldValue` according
// to the widget that produced it; the entity's `set_field` then decides
// whether that value fits the target field.

use crate::error::CoreError;

/// The kind of form widget a raw input string came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Numeric input.
    Number,
    /// Checkbox; the raw value is `"true"` or `"false"`.
    Bool,
    /// Free-form text input.
    Text,
}

/// A coerced input value, ready to be written into an entity field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Number(i64),
    Bool(bool),
}

/// Coerce a raw input string according to the widget kind.
///
/// Numeric inputs parse to [`FieldValue::Number`]. An empty numeric
/// input stays `Text("")` so a cleared field reads as "unset" rather
/// than zero, and an unparsable one passes through as text for the
/// entity to reject with a proper error instead of storing garbage.
pub fn coerce(kind: InputKind, raw: &str) -> FieldValue {
    match kind {
        InputKind::Number if raw.is_empty() => FieldValue::Text(String::new()),
        InputKind::Number => raw
            .parse::<i64>()
            .map_or_else(|_| FieldValue::Text(raw.to_owned()), FieldValue::Number),
        InputKind::Bool => FieldValue::Bool(raw == "true"),
        InputKind::Text => FieldValue::Text(raw.to_owned()),
    }
}

impl FieldValue {
    /// Render the value as the string a text field stores.
    pub fn into_text(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }

    /// Render the value for an optional text field, where an empty
    /// input means "unset".
    pub fn into_optional_text(self) -> Option<String> {
        let text = self.into_text();
        if text.is_empty() { None } else { Some(text) }
    }

    /// Interpret the value for an optional unsigned field.
    ///
    /// Empty text is the "unset" placeholder and maps to `None`;
    /// anything else must be a number in range.
    pub fn optional_u32(&self, field: &str) -> Result<Option<u32>, CoreError> {
        match self {
            Self::Text(s) if s.is_empty() => Ok(None),
            Self::Number(n) => u32::try_from(*n).map(Some).map_err(|_| CoreError::InvalidValue {
                field: field.to_owned(),
                reason: format!("{n} is out of range"),
            }),
            Self::Text(s) => Err(CoreError::InvalidValue {
                field: field.to_owned(),
                reason: format!("{s:?} is not a number"),
            }),
            Self::Bool(_) => Err(CoreError::InvalidValue {
                field: field.to_owned(),
                reason: "expected a number, got true/false".to_owned(),
            }),
        }
    }

    /// Interpret the value for a boolean field.
    pub fn boolean(&self, field: &str) -> Result<bool, CoreError> {
        match self {
            Self::Bool(b) => Ok(*b),
            Self::Text(_) | Self::Number(_) => Err(CoreError::InvalidValue {
                field: field.to_owned(),
                reason: "expected true or false".to_owned(),
            }),
        }
    }
}
