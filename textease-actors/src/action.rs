//! The closed vocabulary a transport speaks to a session, and what it gets back.
use serde::{Deserialize, Serialize};
use std::fmt;
use textease_common::TextEaseError;
use textease_pipeline::Strength;
use uuid::Uuid;

/// Identifies one claim extraction. References minted for an older extraction
/// stop resolving once the claims are re-extracted or the text changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtractionId(Uuid);

impl ExtractionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ExtractionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExtractionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a claim, optionally pinned to the extraction it came from.
///
/// ```
/// use textease_actors::action::{ClaimRef, ExtractionId};
///
/// let loose = ClaimRef::at(2);
/// assert_eq!(loose.extraction, None);
///
/// let id = ExtractionId::new();
/// assert_eq!(ClaimRef::pinned(id, 2).extraction, Some(id));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRef {
    /// 0-based position in the extraction result.
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction: Option<ExtractionId>,
}

impl ClaimRef {
    /// Refers to whatever the session's latest extraction holds at `index`.
    pub fn at(index: usize) -> Self {
        Self {
            index,
            extraction: None,
        }
    }

    pub fn pinned(extraction: ExtractionId, index: usize) -> Self {
        Self {
            index,
            extraction: Some(extraction),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    SubmitText { text: String },
    /// Text already decoded from an uploaded document.
    SubmitDocument { text: String },
    ChooseStrength { strength: Strength },
    Translate,
    ExtractClaims,
    SimplifyClaim { claim: ClaimRef },
    ChangeClaimStrength { claim: ClaimRef, strength: Strength },
    ShowOriginal,
    ShowSimplified,
    ShowClaims,
    Back,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::SubmitText { .. } => "submit_text",
            Action::SubmitDocument { .. } => "submit_document",
            Action::ChooseStrength { .. } => "choose_strength",
            Action::Translate => "translate",
            Action::ExtractClaims => "extract_claims",
            Action::SimplifyClaim { .. } => "simplify_claim",
            Action::ChangeClaimStrength { .. } => "change_claim_strength",
            Action::ShowOriginal => "show_original",
            Action::ShowSimplified => "show_simplified",
            Action::ShowClaims => "show_claims",
            Action::Back => "back",
        }
    }
}

/// What the user currently sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum SessionView {
    Idle,
    TextReceived,
    Simplified,
    Translated,
    ClaimsExtracted,
    ClaimDetail { index: usize },
}

/// How an action ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Done,
    /// Nothing to work on: blank input, or no claims in the text.
    Empty,
    NotFound,
    TooLong,
    Failed,
    TimedOut,
}

impl From<&TextEaseError> for Outcome {
    fn from(err: &TextEaseError) -> Self {
        match err {
            TextEaseError::EmptyInput => Outcome::Empty,
            TextEaseError::NotFound(_) => Outcome::NotFound,
            TextEaseError::TooLong { .. } => Outcome::TooLong,
            TextEaseError::Timeout => Outcome::TimedOut,
            TextEaseError::Transformation(_) | TextEaseError::Config(_) | TextEaseError::Other(_) => {
                Outcome::Failed
            }
        }
    }
}

/// Messages to display plus the actions the user may take next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub messages: Vec<String>,
    pub actions: Vec<Action>,
    pub view: SessionView,
    pub outcome: Outcome,
}

impl Reply {
    pub fn done(messages: Vec<String>, actions: Vec<Action>, view: SessionView) -> Self {
        Self {
            messages,
            actions,
            view,
            outcome: Outcome::Done,
        }
    }

    pub fn text(&self) -> String {
        self.messages.join("\n\n")
    }

    pub fn is_done(&self) -> bool {
        self.outcome == Outcome::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_serialize_with_snake_case_tags() {
        let action = Action::ChangeClaimStrength {
            claim: ClaimRef::at(1),
            strength: Strength::Strong,
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], "change_claim_strength");
        assert_eq!(json["claim"]["index"], 1);
        assert_eq!(json["strength"], "strong");
        assert!(json["claim"].get("extraction").is_none());

        let back: Action = serde_json::from_value(json).unwrap();
        assert_eq!(back, action);
        assert_eq!(back.name(), "change_claim_strength");
    }

    #[test]
    fn errors_map_to_outcomes() {
        assert_eq!(Outcome::from(&TextEaseError::EmptyInput), Outcome::Empty);
        assert_eq!(
            Outcome::from(&TextEaseError::NotFound("claim".into())),
            Outcome::NotFound
        );
        assert_eq!(
            Outcome::from(&TextEaseError::Transformation("boom".into())),
            Outcome::Failed
        );
        assert_eq!(Outcome::from(&TextEaseError::Timeout), Outcome::TimedOut);
    }

    #[test]
    fn extraction_ids_are_unique() {
        assert_ne!(ExtractionId::new(), ExtractionId::new());
    }
}
