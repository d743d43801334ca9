//! Per-kind request/response contracts for the inference engine.
//!
//! A contract fixes the single image input, the typed output fields with
//! their bounds, the out-of-range policy for scores, the fields that are
//! overwritten with canonical constants, and how relevance is decided.

pub mod kinds;
pub mod payload;
pub mod schema;

use serde_json::{Map, Value};

use crate::error::{FlowError, FlowResult};

pub use kinds::AnalysisKind;
pub use payload::{suggests_boosters, AnalysisResult, Payload, StressLevel};
pub use schema::{FieldSpec, FieldType, Presence, ScorePolicy};

use schema::{score_field, text_field};

/// Name of the single image field every analysis request carries.
pub const IMAGE_FIELD: &str = "photoDataUri";

pub const WELLNESS_DISCLAIMER: &str = "This is a demonstration of visual observation AI and is NOT a medical diagnosis. Always consult a healthcare professional for any health concerns.";

/// A field whose engine value is always replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedField {
    pub name: &'static str,
    pub value: &'static str,
}

const STRESS_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("isRelevant", FieldType::Bool, Presence::Always),
    FieldSpec::score("stressScore", Presence::WhenRelevant),
    FieldSpec::new("analysis", FieldType::Text, Presence::WhenRelevant),
];

const POSTURE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("isRelevant", FieldType::Bool, Presence::Always),
    FieldSpec::score("postureScore", Presence::WhenRelevant),
    FieldSpec::new("analysis", FieldType::Text, Presence::WhenRelevant),
];

const SIGN_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("isSignDetected", FieldType::Bool, Presence::Always),
    FieldSpec::new("interpretedText", FieldType::Text, Presence::WhenRelevant),
    FieldSpec::new("reasonIfNotDetected", FieldType::Text, Presence::Optional),
];

const OBJECT_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("isObjectDetected", FieldType::Bool, Presence::Always),
    FieldSpec::new("objectName", FieldType::Text, Presence::WhenRelevant),
    FieldSpec::new("spelling", FieldType::Text, Presence::WhenRelevant),
    FieldSpec::new("reasonIfNotDetected", FieldType::Text, Presence::Optional),
];

const WELLNESS_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("isFaceDetected", FieldType::Bool, Presence::Always),
    FieldSpec::new("observations", FieldType::Text, Presence::WhenRelevant),
    FieldSpec::new("disclaimer", FieldType::Text, Presence::Optional),
];

const WELLNESS_FIXED: &[FixedField] = &[FixedField {
    name: "disclaimer",
    value: WELLNESS_DISCLAIMER,
}];

/// Contract configuration for one analysis kind.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceContract {
    pub kind: AnalysisKind,
    pub output_fields: &'static [FieldSpec],
    pub relevance_field: &'static str,
    /// Field that explains an undetected outcome, when the engine has one.
    pub reason_field: Option<&'static str>,
    /// Relevant results with any of these empty are downgraded to undetected.
    pub required_content: &'static [&'static str],
    pub fixed_fields: &'static [FixedField],
    pub fallback_reason: &'static str,
    pub score_policy: ScorePolicy,
}

impl InferenceContract {
    pub fn for_kind(kind: AnalysisKind) -> Self {
        match kind {
            // The stress schema never bounded its score, so out-of-range
            // values are pulled back instead of failing the analysis.
            AnalysisKind::Stress => Self {
                kind,
                output_fields: STRESS_FIELDS,
                relevance_field: "isRelevant",
                reason_field: None,
                required_content: &[],
                fixed_fields: &[],
                fallback_reason: "The image captured does not seem to be a face. Please try again.",
                score_policy: ScorePolicy::Clamp,
            },
            AnalysisKind::Posture => Self {
                kind,
                output_fields: POSTURE_FIELDS,
                relevance_field: "isRelevant",
                reason_field: Some("analysis"),
                required_content: &[],
                fixed_fields: &[],
                fallback_reason: "The image was not suitable for posture analysis.",
                score_policy: ScorePolicy::Reject,
            },
            AnalysisKind::SignLanguage => Self {
                kind,
                output_fields: SIGN_FIELDS,
                relevance_field: "isSignDetected",
                reason_field: Some("reasonIfNotDetected"),
                required_content: &["interpretedText"],
                fixed_fields: &[],
                fallback_reason: "Could not interpret the sign. Please try a clearer gesture or ensure good lighting.",
                score_policy: ScorePolicy::Reject,
            },
            AnalysisKind::ObjectSpelling => Self {
                kind,
                output_fields: OBJECT_FIELDS,
                relevance_field: "isObjectDetected",
                reason_field: Some("reasonIfNotDetected"),
                required_content: &["objectName", "spelling"],
                fixed_fields: &[],
                fallback_reason: "Could not detect a suitable object. Please try a different object or angle.",
                score_policy: ScorePolicy::Reject,
            },
            AnalysisKind::WellnessObservation => Self {
                kind,
                output_fields: WELLNESS_FIELDS,
                relevance_field: "isFaceDetected",
                reason_field: Some("observations"),
                required_content: &[],
                fixed_fields: WELLNESS_FIXED,
                fallback_reason: "No clear face detected for observation.",
                score_policy: ScorePolicy::Reject,
            },
        }
    }

    pub fn with_score_policy(mut self, policy: ScorePolicy) -> Self {
        self.score_policy = policy;
        self
    }

    /// Input schema: exactly one image field holding a base64 data URI.
    pub fn validate_input(&self, data_uri: &str) -> FlowResult<()> {
        schema::validate_data_uri(data_uri)
    }

    /// Output schema: types, bounds and presence, with the score policy applied.
    pub fn normalize_output(&self, raw: &Value) -> FlowResult<Map<String, Value>> {
        schema::normalize_object(
            raw,
            self.output_fields,
            Some(self.relevance_field),
            self.score_policy,
        )
    }

    /// Replace every fixed field with its canonical value.
    pub fn apply_fixed(&self, fields: &mut Map<String, Value>) {
        for fixed in self.fixed_fields {
            fields.insert(fixed.name.to_string(), Value::String(fixed.value.to_string()));
        }
    }

    /// Relevance gate over normalized fields.
    pub fn classify(&self, fields: &Map<String, Value>) -> FlowResult<AnalysisResult> {
        let relevant = fields
            .get(self.relevance_field)
            .and_then(Value::as_bool)
            .ok_or_else(|| {
                FlowError::validation(format!("missing required field {}", self.relevance_field))
            })?;

        let content_missing = self
            .required_content
            .iter()
            .any(|name| text_field(fields, name).trim().is_empty());

        if !relevant || content_missing {
            return Ok(AnalysisResult::Undetected {
                reason: self.undetected_reason(fields),
            });
        }

        Ok(AnalysisResult::Detected {
            payload: self.payload(fields),
        })
    }

    fn undetected_reason(&self, fields: &Map<String, Value>) -> String {
        self.reason_field
            .map(|name| text_field(fields, name))
            .map(|reason| reason.trim().to_string())
            .filter(|reason| !reason.is_empty())
            .unwrap_or_else(|| self.fallback_reason.to_string())
    }

    fn payload(&self, fields: &Map<String, Value>) -> Payload {
        match self.kind {
            AnalysisKind::Stress => Payload::Stress {
                score: score_field(fields, "stressScore"),
                analysis: text_field(fields, "analysis"),
            },
            AnalysisKind::Posture => Payload::Posture {
                score: score_field(fields, "postureScore"),
                analysis: text_field(fields, "analysis"),
            },
            AnalysisKind::SignLanguage => Payload::SignLanguage {
                interpreted_text: text_field(fields, "interpretedText"),
            },
            AnalysisKind::ObjectSpelling => Payload::ObjectSpelling {
                object_name: text_field(fields, "objectName"),
                spelling: text_field(fields, "spelling"),
            },
            AnalysisKind::WellnessObservation => Payload::WellnessObservation {
                observations: text_field(fields, "observations"),
                disclaimer: text_field(fields, "disclaimer"),
            },
        }
    }
}
