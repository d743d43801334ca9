use serde::{Deserialize, Serialize};

use super::AnalysisKind;

/// Content of a detected result, one shape per analysis kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Payload {
    #[serde(rename_all = "camelCase")]
    Stress { score: u8, analysis: String },
    #[serde(rename_all = "camelCase")]
    Posture { score: u8, analysis: String },
    #[serde(rename_all = "camelCase")]
    SignLanguage { interpreted_text: String },
    #[serde(rename_all = "camelCase")]
    ObjectSpelling { object_name: String, spelling: String },
    #[serde(rename_all = "camelCase")]
    WellnessObservation {
        observations: String,
        disclaimer: String,
    },
}

impl Payload {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            Payload::Stress { .. } => AnalysisKind::Stress,
            Payload::Posture { .. } => AnalysisKind::Posture,
            Payload::SignLanguage { .. } => AnalysisKind::SignLanguage,
            Payload::ObjectSpelling { .. } => AnalysisKind::ObjectSpelling,
            Payload::WellnessObservation { .. } => AnalysisKind::WellnessObservation,
        }
    }

    pub fn score(&self) -> Option<u8> {
        match self {
            Payload::Stress { score, .. } | Payload::Posture { score, .. } => Some(*score),
            _ => None,
        }
    }

    pub fn disclaimer(&self) -> Option<&str> {
        match self {
            Payload::WellnessObservation { disclaimer, .. } => Some(disclaimer),
            _ => None,
        }
    }
}

/// Validated engine outcome. Undetected carries no content by construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum AnalysisResult {
    Detected { payload: Payload },
    Undetected { reason: String },
}

impl AnalysisResult {
    pub fn relevant(&self) -> bool {
        matches!(self, AnalysisResult::Detected { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            AnalysisResult::Undetected { reason } => Some(reason),
            AnalysisResult::Detected { .. } => None,
        }
    }

    pub fn payload(&self) -> Option<&Payload> {
        match self {
            AnalysisResult::Detected { payload } => Some(payload),
            AnalysisResult::Undetected { .. } => None,
        }
    }

    /// Flat score view: zero when nothing was detected.
    pub fn score(&self) -> u8 {
        self.payload().and_then(Payload::score).unwrap_or(0)
    }
}

/// Stress band used to colour and label a stress score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum StressLevel {
    Low,
    Moderate,
    High,
}

/// Scores above this prompt the UI to offer mood boosters.
pub const BOOSTER_HINT_THRESHOLD: u8 = 50;

impl StressLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=33 => StressLevel::Low,
            34..=66 => StressLevel::Moderate,
            _ => StressLevel::High,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StressLevel::Low => "Low Stress",
            StressLevel::Moderate => "Moderate Stress",
            StressLevel::High => "High Stress",
        }
    }
}

pub fn suggests_boosters(score: u8) -> bool {
    score > BOOSTER_HINT_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stress_bands() {
        assert_eq!(StressLevel::from_score(0), StressLevel::Low);
        assert_eq!(StressLevel::from_score(33), StressLevel::Low);
        assert_eq!(StressLevel::from_score(34), StressLevel::Moderate);
        assert_eq!(StressLevel::from_score(66), StressLevel::Moderate);
        assert_eq!(StressLevel::from_score(67).label(), "High Stress");
        assert!(!suggests_boosters(50));
        assert!(suggests_boosters(51));
    }

    #[test]
    fn undetected_has_no_content() {
        let result = AnalysisResult::Undetected {
            reason: "No person detected".into(),
        };
        assert!(!result.relevant());
        assert_eq!(result.score(), 0);
        assert!(result.payload().is_none());
        assert_eq!(result.reason(), Some("No person detected"));
    }

    #[test]
    fn payload_serializes_camel_case() {
        let payload = Payload::ObjectSpelling {
            object_name: "Apple".into(),
            spelling: "A P P L E".into(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["kind"], "objectSpelling");
        assert_eq!(json["objectName"], "Apple");
    }
}
