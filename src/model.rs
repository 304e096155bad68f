//! ## Structure
//! This module contains the output records handed back to the host test
//! framework.
//!
//! ```text
//! ImportResult
//!   ├── conversations: Vec<Conversation>
//!   │   ├── name: String
//!   │   └── steps: Vec<ConvoStep>
//!   │       ├── User  (sends an utterance set, may set contexts)
//!   │       └── Bot   (asserts an intent, may reference a reply set)
//!   └── utterances: Vec<UtteranceSet>
//!       ├── name: String
//!       └── utterances: Vec<String>
//! ```

use serde::{Deserialize, Serialize};

/// A named list of example phrases. Created once by an importer, never
/// mutated afterwards; the export path diffs it against the phrases already
/// stored in the agent archive.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UtteranceSet {
    pub name: String,
    pub utterances: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Conversation {
    pub name: String,
    pub steps: Vec<ConvoStep>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "sender")]
pub enum ConvoStep {
    /// A user turn sending the referenced utterance set. Each entry in
    /// `contexts` becomes one context-setting directive on the turn.
    #[serde(rename = "me")]
    User {
        #[serde(rename = "messageText")]
        utterances_ref: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        intent: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        contexts: Vec<String>,
    },
    /// A bot turn asserting the intent that should have fired. Carries a
    /// reply utterance set reference when the intent defines reply text for
    /// that step, or the incomprehension marker when it defines none at all.
    #[serde(rename = "bot")]
    Bot {
        #[serde(rename = "assertIntent", skip_serializing_if = "Option::is_none")]
        assert_intent: Option<String>,
        #[serde(rename = "messageText", skip_serializing_if = "Option::is_none")]
        utterances_ref: Option<String>,
        #[serde(default, skip_serializing_if = "is_false")]
        incomprehension: bool,
    },
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ImportResult {
    pub conversations: Vec<Conversation>,
    pub utterances: Vec<UtteranceSet>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convo_step_serializes_with_sender_tag() {
        let step = ConvoStep::User {
            utterances_ref: "greeting-input".to_string(),
            intent: Some("Greeting".to_string()),
            contexts: vec![],
        };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["sender"], "me");
        assert_eq!(json["messageText"], "greeting-input");
        assert!(json.get("contexts").is_none());
    }

    #[test]
    fn incomprehension_marker_round_trips() {
        let step = ConvoStep::Bot {
            assert_intent: None,
            utterances_ref: None,
            incomprehension: true,
        };
        let json = serde_json::to_string(&step).unwrap();
        let back: ConvoStep = serde_json::from_str(&json).unwrap();
        assert_eq!(step, back);
    }
}
