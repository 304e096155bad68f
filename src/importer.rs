//! Turns the intents stored in an agent archive into test conversations and
//! utterance sets.
//!
//! Two modes: `import_intents` walks root intents only and emits one
//! utterance set (and optionally one two-step conversation) per intent.
//! `import_conversations` rebuilds the full intent forest from the flat
//! parent-linked entries and materializes every root-to-leaf path as one
//! linear conversation.

use indexmap::IndexMap;
use serde_json::{json, Value};
use tracing::debug;

use crate::agent::{self, AgentArchive, IntentFile, SpeechValue, UserSaysEntry};
use crate::common::slug;
use crate::errors::Result;
use crate::model::{Conversation, ConvoStep, ImportResult, UtteranceSet};

/// Side-channel for non-fatal conditions (skipped intents, orphans, merge
/// outcomes). Reports never alter control flow.
pub trait StatusReporter {
    fn report(&self, message: &str, detail: Option<Value>);
}

pub struct NullReporter;

impl StatusReporter for NullReporter {
    fn report(&self, _message: &str, _detail: Option<Value>) {}
}

/// Forwards status reports to the log, for CLI use.
pub struct LogReporter;

impl StatusReporter for LogReporter {
    fn report(&self, message: &str, _detail: Option<Value>) {
        tracing::info!("{}", message);
    }
}

pub(crate) fn status(reporter: &dyn StatusReporter, message: String, detail: Option<Value>) {
    debug!("{}", message);
    reporter.report(&message, detail);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    pub build_convos: bool,
}

/// One imported intent. `children` holds identities of records linked under
/// this one during tree reconstruction; the records themselves stay in the
/// arena.
#[derive(Debug, Clone)]
pub struct IntentRecord {
    pub id: String,
    pub parent_id: Option<String>,
    pub name: String,
    pub contexts: Vec<String>,
    pub input_utterances: Vec<String>,
    pub output_utterances: Vec<Vec<String>>,
    pub children: Vec<String>,
}

/// Flat import: root intents only, no tree reconstruction.
pub fn import_intents(
    archive: &AgentArchive,
    options: &ImportOptions,
    reporter: &dyn StatusReporter,
) -> Result<ImportResult> {
    let language = archive.language().to_string();
    let mut result = ImportResult::default();

    for entry_name in archive.intent_entries() {
        let intent: IntentFile = archive.read_json(&entry_name)?;
        if intent.parent_id.is_some() {
            continue;
        }

        let user_says_name = agent::user_says_entry_name(&entry_name, &language);
        debug!(
            "found root intent \"{}\", checking for examples in {}",
            intent.name, user_says_name
        );
        let Some(entries) = archive.read_json_opt::<Vec<UserSaysEntry>>(&user_says_name)? else {
            status(
                reporter,
                format!(
                    "utterances file not found for \"{}\", ignoring intent",
                    intent.name
                ),
                None,
            );
            continue;
        };
        let input_utterances = agent::extract_phrases(&entries);

        if options.build_convos {
            let utterances_ref = slug(&intent.name);
            result.utterances.push(UtteranceSet {
                name: utterances_ref.clone(),
                utterances: input_utterances,
            });
            result.conversations.push(Conversation {
                name: intent.name.clone(),
                steps: vec![
                    ConvoStep::User {
                        utterances_ref,
                        intent: None,
                        contexts: intent.contexts.clone(),
                    },
                    ConvoStep::Bot {
                        assert_intent: Some(intent.name.clone()),
                        utterances_ref: None,
                        incomprehension: false,
                    },
                ],
            });
        } else if !intent.contexts.is_empty() {
            status(
                reporter,
                format!(
                    "found intent requiring context (\"{}\": {}), ignoring intent",
                    intent.name,
                    intent.contexts.join(",")
                ),
                Some(json!({ "contexts": intent.contexts })),
            );
        } else {
            result.utterances.push(UtteranceSet {
                name: intent.name.clone(),
                utterances: input_utterances,
            });
        }
    }

    Ok(result)
}

/// Tree import: index every intent, link children under parents, then
/// depth-first enumerate every root-to-leaf path into a conversation.
pub fn import_conversations(
    archive: &AgentArchive,
    reporter: &dyn StatusReporter,
) -> Result<ImportResult> {
    let language = archive.language().to_string();

    // Pass 1: read every intent (root or not) and index by identity.
    let mut arena: IndexMap<String, IntentRecord> = IndexMap::new();
    for entry_name in archive.intent_entries() {
        let intent: IntentFile = archive.read_json(&entry_name)?;

        let user_says_name = agent::user_says_entry_name(&entry_name, &language);
        debug!(
            "found intent {}, checking for examples in {}",
            intent.name, user_says_name
        );
        let Some(entries) = archive.read_json_opt::<Vec<UserSaysEntry>>(&user_says_name)? else {
            status(
                reporter,
                format!(
                    "utterances file not found for \"{}\", ignoring intent",
                    intent.name
                ),
                None,
            );
            continue;
        };
        let input_utterances = agent::extract_phrases(&entries);
        debug!("examples for {}: {:?}", intent.name, input_utterances);

        let output_utterances = collect_output_variants(&intent, &language);
        arena.insert(
            intent.id.clone(),
            IntentRecord {
                id: intent.id,
                parent_id: intent.parent_id,
                name: intent.name,
                contexts: intent.contexts,
                input_utterances,
                output_utterances,
                children: Vec::new(),
            },
        );
    }

    // Pass 2: link children under parents. A record whose parent is not in
    // the index is dropped from the output.
    let ids: Vec<String> = arena.keys().cloned().collect();
    for id in &ids {
        let Some(parent_id) = arena[id].parent_id.clone() else {
            continue;
        };
        if arena.contains_key(&parent_id) {
            if let Some(parent) = arena.get_mut(&parent_id) {
                parent.children.push(id.clone());
            }
        } else {
            status(
                reporter,
                format!(
                    "parent intent with id {} not found for {}, ignoring intent",
                    parent_id, arena[id].name
                ),
                None,
            );
        }
    }

    // Pass 3: only parentless records survive as roots; everything else is
    // reachable solely through its parent's children list.
    let roots: Vec<String> = arena
        .iter()
        .filter(|(_, record)| record.parent_id.is_none())
        .map(|(id, _)| id.clone())
        .collect();

    let mut walk = TreeWalk {
        arena: &arena,
        conversations: Vec::new(),
        utterances: Vec::new(),
    };
    for root in &roots {
        walk.follow(root, Vec::new(), Vec::new(), reporter);
    }

    Ok(ImportResult {
        conversations: walk.conversations,
        utterances: walk.utterances,
    })
}

/// One phrase list per declared response: messages matching the text type
/// and the agent language, array speech flattened, scalar speech wrapped.
fn collect_output_variants(intent: &IntentFile, language: &str) -> Vec<Vec<String>> {
    intent
        .responses
        .iter()
        .map(|response| {
            response
                .messages
                .iter()
                .filter(|message| {
                    message.message_type == agent::TEXT_MESSAGE_TYPE
                        && message.lang.as_deref() == Some(language)
                })
                .filter_map(|message| message.speech.as_ref())
                .flat_map(|speech| match speech {
                    SpeechValue::One(text) if text.is_empty() => Vec::new(),
                    SpeechValue::One(text) => vec![text.clone()],
                    SpeechValue::Many(texts) => texts.clone(),
                })
                .collect()
        })
        .collect()
}

struct TreeWalk<'a> {
    arena: &'a IndexMap<String, IntentRecord>,
    conversations: Vec<Conversation>,
    utterances: Vec<UtteranceSet>,
}

impl<'a> TreeWalk<'a> {
    /// Depth-first path enumeration. `steps` and `path` are owned copies per
    /// branch, so sibling subtrees never see each other's accumulated state.
    /// `path` carries the identities already on the current branch and guards
    /// against cycles in malformed source data.
    fn follow(
        &mut self,
        id: &str,
        mut steps: Vec<ConvoStep>,
        mut path: Vec<String>,
        reporter: &dyn StatusReporter,
    ) {
        let arena = self.arena;
        let Some(record) = arena.get(id) else {
            return;
        };

        let input_ref = slug(&format!("{}_input", record.name));
        steps.push(ConvoStep::User {
            utterances_ref: input_ref.clone(),
            intent: Some(record.name.clone()),
            contexts: Vec::new(),
        });
        self.utterances.push(UtteranceSet {
            name: input_ref,
            utterances: record.input_utterances.clone(),
        });

        if record.output_utterances.is_empty() {
            steps.push(ConvoStep::Bot {
                assert_intent: None,
                utterances_ref: None,
                incomprehension: true,
            });
        } else {
            for (index, phrases) in record.output_utterances.iter().enumerate() {
                let mut utterances_ref = None;
                if !phrases.is_empty() {
                    let output_ref = slug(&format!("{}_output_{}", record.name, index));
                    self.utterances.push(UtteranceSet {
                        name: output_ref.clone(),
                        utterances: phrases.clone(),
                    });
                    utterances_ref = Some(output_ref);
                }
                steps.push(ConvoStep::Bot {
                    assert_intent: Some(record.name.clone()),
                    utterances_ref,
                    incomprehension: false,
                });
            }
        }

        path.push(id.to_string());

        if record.children.is_empty() {
            let name = steps
                .iter()
                .filter_map(|step| match step {
                    ConvoStep::User {
                        intent: Some(intent),
                        ..
                    } => Some(intent.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(" - ");
            debug!("emitting conversation {}", name);
            self.conversations.push(Conversation { name, steps });
        } else {
            for child in &record.children {
                if path.contains(child) {
                    status(
                        reporter,
                        format!(
                            "cycle detected at intent {}, skipping branch",
                            record.name
                        ),
                        None,
                    );
                    continue;
                }
                self.follow(child, steps.clone(), path.clone(), reporter);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Collecting(Mutex<Vec<String>>);

    impl StatusReporter for Collecting {
        fn report(&self, message: &str, _detail: Option<Value>) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    fn record(id: &str, name: &str, children: &[&str]) -> IntentRecord {
        IntentRecord {
            id: id.to_string(),
            parent_id: None,
            name: name.to_string(),
            contexts: Vec::new(),
            input_utterances: vec!["hello".to_string()],
            output_utterances: Vec::new(),
            children: children.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn walk_guards_against_self_referential_children() {
        let mut arena = IndexMap::new();
        arena.insert("id-a".to_string(), record("id-a", "A", &["id-a"]));

        let reporter = Collecting::default();
        let mut walk = TreeWalk {
            arena: &arena,
            conversations: Vec::new(),
            utterances: Vec::new(),
        };
        walk.follow("id-a", Vec::new(), Vec::new(), &reporter);

        assert!(walk.conversations.is_empty());
        let messages = reporter.0.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("cycle detected"));
    }

    #[test]
    fn walk_skips_children_missing_from_the_arena() {
        let mut arena = IndexMap::new();
        arena.insert("id-a".to_string(), record("id-a", "A", &[]));

        let reporter = Collecting::default();
        let mut walk = TreeWalk {
            arena: &arena,
            conversations: Vec::new(),
            utterances: Vec::new(),
        };
        walk.follow("id-missing", Vec::new(), Vec::new(), &reporter);

        assert!(walk.conversations.is_empty());
        assert!(walk.utterances.is_empty());
    }
}
