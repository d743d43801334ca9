use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{FlowError, FlowResult};

pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

/// What to do with a bounded number the engine put outside its bounds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ScorePolicy {
    Clamp,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldType {
    Bool,
    Text,
    Number { min: f64, max: f64 },
    Enum(&'static [&'static str]),
}

/// When a field has to be present in the engine response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Always,
    /// Only checked when the relevance field is `true`.
    WhenRelevant,
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
    pub presence: Presence,
}

impl FieldSpec {
    pub const fn new(name: &'static str, ty: FieldType, presence: Presence) -> Self {
        Self { name, ty, presence }
    }

    pub const fn score(name: &'static str, presence: Presence) -> Self {
        Self::new(
            name,
            FieldType::Number {
                min: SCORE_MIN,
                max: SCORE_MAX,
            },
            presence,
        )
    }

    /// Type- and range-check one value, returning its normalized form.
    pub fn check(&self, value: &Value, policy: ScorePolicy) -> FlowResult<Value> {
        match self.ty {
            FieldType::Bool => value
                .as_bool()
                .map(Value::Bool)
                .ok_or_else(|| self.type_error("a boolean", value)),
            FieldType::Text => value
                .as_str()
                .map(|s| Value::String(s.to_string()))
                .ok_or_else(|| self.type_error("a string", value)),
            FieldType::Number { min, max } => {
                let number = value
                    .as_f64()
                    .ok_or_else(|| self.type_error("a number", value))?;
                if !number.is_finite() {
                    return Err(FlowError::validation(format!(
                        "{} must be finite",
                        self.name
                    )));
                }
                let bounded = if number < min || number > max {
                    match policy {
                        ScorePolicy::Reject => {
                            return Err(FlowError::validation(format!(
                                "{} = {number} is outside [{min}, {max}]",
                                self.name
                            )))
                        }
                        ScorePolicy::Clamp => number.clamp(min, max),
                    }
                } else {
                    number
                };
                Ok(Value::from(bounded))
            }
            FieldType::Enum(variants) => {
                let text = value
                    .as_str()
                    .ok_or_else(|| self.type_error("a string", value))?;
                if variants.contains(&text) {
                    Ok(Value::String(text.to_string()))
                } else {
                    Err(FlowError::validation(format!(
                        "{} = {text:?} is not one of {variants:?}",
                        self.name
                    )))
                }
            }
        }
    }

    fn type_error(&self, expected: &str, got: &Value) -> FlowError {
        FlowError::validation(format!(
            "{} must be {expected}, got {}",
            self.name,
            json_type_name(got)
        ))
    }
}

/// Validate `raw` against `fields`. Unknown keys are dropped and `null` is
/// treated as absent. `relevance_field` decides whether `WhenRelevant`
/// fields are required.
pub fn normalize_object(
    raw: &Value,
    fields: &[FieldSpec],
    relevance_field: Option<&str>,
    policy: ScorePolicy,
) -> FlowResult<Map<String, Value>> {
    let object = raw.as_object().ok_or_else(|| {
        FlowError::validation(format!(
            "engine response must be an object, got {}",
            json_type_name(raw)
        ))
    })?;

    let relevant = relevance_field
        .and_then(|name| object.get(name))
        .and_then(Value::as_bool)
        .unwrap_or(true);

    let mut normalized = Map::new();
    for field in fields {
        match object.get(field.name).filter(|value| !value.is_null()) {
            Some(value) => {
                normalized.insert(field.name.to_string(), field.check(value, policy)?);
            }
            None => {
                let required = match field.presence {
                    Presence::Always => true,
                    Presence::WhenRelevant => relevant,
                    Presence::Optional => false,
                };
                if required {
                    return Err(FlowError::validation(format!(
                        "missing required field {}",
                        field.name
                    )));
                }
            }
        }
    }

    Ok(normalized)
}

/// Check the `data:<type>/<subtype>;base64,<payload>` shape.
pub fn validate_data_uri(uri: &str) -> FlowResult<()> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| FlowError::validation("photoDataUri must start with \"data:\""))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| FlowError::validation("photoDataUri has no payload separator"))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| FlowError::validation("photoDataUri must be base64 encoded"))?;

    let valid_mime = mime
        .split_once('/')
        .map(|(top, sub)| !top.is_empty() && !sub.is_empty() && !sub.contains('/'))
        .unwrap_or(false);
    if !valid_mime {
        return Err(FlowError::validation(format!(
            "photoDataUri has an invalid MIME type {mime:?}"
        )));
    }

    if payload.is_empty() {
        return Err(FlowError::validation("photoDataUri payload is empty"));
    }
    STANDARD
        .decode(payload)
        .map_err(|err| FlowError::validation(format!("photoDataUri payload is not base64: {err}")))?;

    Ok(())
}

pub(crate) fn text_field(map: &Map<String, Value>, name: &str) -> String {
    map.get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

pub(crate) fn score_field(map: &Map<String, Value>, name: &str) -> u8 {
    map.get(name)
        .and_then(Value::as_f64)
        .map(|score| score.round().clamp(SCORE_MIN, SCORE_MAX) as u8)
        .unwrap_or(0)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
