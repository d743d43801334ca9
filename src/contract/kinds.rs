use std::fmt;

use serde::{Deserialize, Serialize};

/// The camera-driven features that share the contract pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisKind {
    Stress,
    Posture,
    SignLanguage,
    ObjectSpelling,
    WellnessObservation,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 5] = [
        AnalysisKind::Stress,
        AnalysisKind::Posture,
        AnalysisKind::SignLanguage,
        AnalysisKind::ObjectSpelling,
        AnalysisKind::WellnessObservation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Stress => "stress",
            AnalysisKind::Posture => "posture",
            AnalysisKind::SignLanguage => "signLanguage",
            AnalysisKind::ObjectSpelling => "objectSpelling",
            AnalysisKind::WellnessObservation => "wellnessObservation",
        }
    }

    /// Flow name the engine knows this kind by.
    pub fn flow_name(&self) -> &'static str {
        match self {
            AnalysisKind::Stress => "analyzeStressFlow",
            AnalysisKind::Posture => "analyzePostureFlow",
            AnalysisKind::SignLanguage => "interpretSignLanguageFlow",
            AnalysisKind::ObjectSpelling => "detectObjectAndSpellFlow",
            AnalysisKind::WellnessObservation => "observeWellnessFlow",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
