//! Mood-booster suggestions for a measured stress score.
//!
//! Text-only follow-up to the stress analysis: the engine is asked for jokes,
//! affirmations and music picks, and the reply is held to the same kind of
//! contract as the camera flows.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Duration;

use crate::contract::schema::{FieldSpec, FieldType, Presence, ScorePolicy, SCORE_MAX};
use crate::error::{FlowError, FlowResult};
use crate::flow::{engine::EngineRequest, invoker::call_engine, InferenceEngine};

const ENABLE_LOGS: bool = true;
const LOG_TARGET: &str = "wellcam::boosters";

use crate::{log_info, log_warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum BoosterKind {
    Joke,
    Affirmation,
    Music,
}

const BOOSTER_KINDS: &[&str] = &["joke", "affirmation", "music"];

const SUGGESTION_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("type", FieldType::Enum(BOOSTER_KINDS), Presence::Always),
    FieldSpec::new("content", FieldType::Text, Presence::Always),
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoodBooster {
    #[serde(rename = "type")]
    pub kind: BoosterKind,
    pub content: String,
}

pub async fn suggest_mood_boosters(
    engine: &dyn InferenceEngine,
    stress_score: u8,
    preferences: Option<Vec<BoosterKind>>,
    timeout: Duration,
) -> FlowResult<Vec<MoodBooster>> {
    if f64::from(stress_score) > SCORE_MAX {
        return Err(FlowError::validation(format!(
            "stressScore = {stress_score} is outside [0, 100]"
        )));
    }

    let preferences = preferences.filter(|prefs| !prefs.is_empty());
    let request = EngineRequest::SuggestBoosters {
        stress_score,
        preferences,
    };

    let raw = call_engine(engine, request, timeout).await.map_err(|err| {
        log_warn!("mood booster request failed: {err}");
        err
    })?;

    let suggestions = parse_suggestions(&raw)?;
    log_info!(
        "{} mood boosters for stress score {stress_score}",
        suggestions.len()
    );
    Ok(suggestions)
}

fn parse_suggestions(raw: &Value) -> FlowResult<Vec<MoodBooster>> {
    let items = raw
        .get("suggestions")
        .and_then(Value::as_array)
        .ok_or_else(|| FlowError::validation("suggestions must be an array"))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let fields = crate::contract::schema::normalize_object(
                item,
                SUGGESTION_FIELDS,
                None,
                ScorePolicy::Reject,
            )
            .map_err(|err| FlowError::validation(format!("suggestions[{index}]: {err}")))?;

            let booster: MoodBooster = serde_json::from_value(Value::Object(fields))
                .map_err(|err| FlowError::validation(format!("suggestions[{index}]: {err}")))?;
            if booster.content.trim().is_empty() {
                return Err(FlowError::validation(format!(
                    "suggestions[{index}]: content is empty"
                )));
            }
            Ok(booster)
        })
        .collect()
}
