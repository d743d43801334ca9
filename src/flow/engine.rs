use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::boosters::BoosterKind;
use crate::contract::AnalysisKind;

/// A request as it crosses the engine boundary.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "flow", rename_all = "camelCase")]
pub enum EngineRequest {
    #[serde(rename_all = "camelCase")]
    Analyze {
        kind: AnalysisKind,
        photo_data_uri: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        options: Option<Value>,
    },
    #[serde(rename_all = "camelCase")]
    SuggestBoosters {
        stress_score: u8,
        #[serde(skip_serializing_if = "Option::is_none")]
        preferences: Option<Vec<BoosterKind>>,
    },
}

impl EngineRequest {
    /// Flow name the engine dispatches on.
    pub fn flow_name(&self) -> &'static str {
        match self {
            EngineRequest::Analyze { kind, .. } => kind.flow_name(),
            EngineRequest::SuggestBoosters { .. } => "suggestMoodBoostersFlow",
        }
    }
}

/// The opaque generative inference capability. Responses are unvalidated
/// JSON; contracts are enforced by the caller.
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    async fn call(&self, request: EngineRequest) -> anyhow::Result<Value>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn analyze_request_wire_shape() {
        let request = EngineRequest::Analyze {
            kind: AnalysisKind::Posture,
            photo_data_uri: "data:image/jpeg;base64,AAAA".into(),
            options: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "flow": "analyze",
                "kind": "posture",
                "photoDataUri": "data:image/jpeg;base64,AAAA"
            })
        );
        assert_eq!(request.flow_name(), "analyzePostureFlow");
    }

    #[test]
    fn booster_request_wire_shape() {
        let request = EngineRequest::SuggestBoosters {
            stress_score: 80,
            preferences: Some(vec![BoosterKind::Music]),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "flow": "suggestBoosters", "stressScore": 80, "preferences": ["music"] })
        );
    }
}
