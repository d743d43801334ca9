use serde::{Deserialize, Serialize};

use crate::contract::{AnalysisResult, Payload};
use crate::error::{ErrorKind, FlowError};

/// What the UI renders for one feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ViewModel {
    Detected {
        payload: Payload,
    },
    Undetected {
        reason: String,
    },
    #[serde(rename_all = "camelCase")]
    Failed {
        error_kind: ErrorKind,
        message: String,
    },
}

pub type Outcome = Result<AnalysisResult, FlowError>;

/// An outcome stamped with the capture generation it was issued under.
#[derive(Debug, Clone)]
pub struct TaggedOutcome {
    pub generation: u64,
    pub outcome: Outcome,
}

pub fn present(outcome: &Outcome) -> ViewModel {
    match outcome {
        Ok(AnalysisResult::Detected { payload }) => ViewModel::Detected {
            payload: payload.clone(),
        },
        Ok(AnalysisResult::Undetected { reason }) => ViewModel::Undetected {
            reason: reason.clone(),
        },
        Err(err) => failed(err),
    }
}

pub fn failed(err: &FlowError) -> ViewModel {
    ViewModel::Failed {
        error_kind: err.kind(),
        message: err.to_string(),
    }
}

/// Holds the rendered view model and drops results from old generations.
#[derive(Debug, Default)]
pub struct ResultPresenter {
    current: Option<ViewModel>,
}

impl ResultPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&ViewModel> {
        self.current.as_ref()
    }

    /// Render `tagged` if it belongs to `live_generation`. Returns the new
    /// view model, or `None` when the outcome was stale.
    pub fn accept(
        &mut self,
        tagged: &TaggedOutcome,
        live_generation: Option<u64>,
    ) -> Option<&ViewModel> {
        if live_generation != Some(tagged.generation) {
            return None;
        }
        self.current = Some(present(&tagged.outcome));
        self.current.as_ref()
    }

    /// Render a failure that did not come from an engine call.
    pub fn show(&mut self, view: ViewModel) -> &ViewModel {
        self.current.insert(view)
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detected(score: u8) -> Outcome {
        Ok(AnalysisResult::Detected {
            payload: Payload::Stress {
                score,
                analysis: "calm".into(),
            },
        })
    }

    #[test]
    fn maps_each_outcome() {
        assert_eq!(
            present(&detected(72)),
            ViewModel::Detected {
                payload: Payload::Stress {
                    score: 72,
                    analysis: "calm".into()
                }
            }
        );
        assert_eq!(
            present(&Ok(AnalysisResult::Undetected {
                reason: "No person detected".into()
            })),
            ViewModel::Undetected {
                reason: "No person detected".into()
            }
        );
        assert_eq!(
            present(&Err(FlowError::Engine("connection reset".into()))),
            ViewModel::Failed {
                error_kind: ErrorKind::Engine,
                message: "inference engine failed: connection reset".into()
            }
        );
    }

    #[test]
    fn stale_generation_is_dropped() {
        let mut presenter = ResultPresenter::new();
        let fresh = TaggedOutcome {
            generation: 2,
            outcome: detected(10),
        };
        assert!(presenter.accept(&fresh, Some(2)).is_some());

        let stale = TaggedOutcome {
            generation: 1,
            outcome: detected(99),
        };
        assert!(presenter.accept(&stale, Some(2)).is_none());
        assert!(presenter.accept(&fresh, None).is_none());
        assert_eq!(
            presenter.current().and_then(|view| match view {
                ViewModel::Detected { payload } => payload.score(),
                _ => None,
            }),
            Some(10)
        );
    }

    #[test]
    fn view_model_wire_shape() {
        let view = failed(&FlowError::Validation("postureScore = 150 is outside [0, 100]".into()));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["errorKind"], "validation");
    }
}
