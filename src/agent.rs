//! Reader/writer for the NLU provider's exported agent archive.
//!
//! The archive is a zip container of JSON entries: one `agent.json` metadata
//! entry, one `intents/<name>.json` per intent definition and one
//! `intents/<name>_usersays_<lang>.json` per intent carrying its example
//! phrases for a language.

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use zip::{write::FileOptions, CompressionMethod, ZipArchive, ZipWriter};

use crate::errors::{ConnectorError, Result};

pub const AGENT_INFO_ENTRY: &str = "agent.json";

/// Message type code carrying plain reply text.
pub const TEXT_MESSAGE_TYPE: &str = "0";

#[derive(Deserialize, Debug, Clone)]
pub struct AgentInfo {
    pub language: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct IntentFile {
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub contexts: Vec<String>,
    #[serde(default)]
    pub responses: Vec<IntentResponse>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct IntentResponse {
    #[serde(default)]
    pub messages: Vec<ResponseMessage>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ResponseMessage {
    #[serde(rename = "type", default)]
    pub message_type: String,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub speech: Option<SpeechValue>,
}

/// The provider stores reply text either as a single string or as a list of
/// candidate strings.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(untagged)]
pub enum SpeechValue {
    One(String),
    Many(Vec<String>),
}

/// One stored example phrase, split into token chunks. Provider fields not
/// modeled here (entry timestamps, entity annotations on chunks) are kept in
/// `extra` and survive re-encoding during export merges.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserSaysEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub data: Vec<UserSaysChunk>,
    #[serde(default)]
    pub is_template: bool,
    #[serde(default)]
    pub count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserSaysChunk {
    pub text: String,
    #[serde(default)]
    pub user_defined: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserSaysEntry {
    pub fn from_phrase(phrase: &str, language: &str) -> Self {
        UserSaysEntry {
            id: None,
            data: vec![UserSaysChunk {
                text: phrase.to_string(),
                user_defined: false,
                extra: Map::new(),
            }],
            is_template: false,
            count: 0,
            lang: Some(language.to_string()),
            extra: Map::new(),
        }
    }
}

/// Flattens each stored example into one plain-text phrase by concatenating
/// its chunk texts in order, with no separator.
pub fn extract_phrases(entries: &[UserSaysEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            entry
                .data
                .iter()
                .map(|chunk| chunk.text.as_str())
                .collect::<String>()
        })
        .collect()
}

/// Entry name of the usersays file paired with an intent entry.
pub fn user_says_entry_name(intent_entry_name: &str, language: &str) -> String {
    let stem = intent_entry_name
        .strip_suffix(".json")
        .unwrap_or(intent_entry_name);
    format!("{}_usersays_{}.json", stem, language)
}

/// Entry name of the usersays file for an intent referenced by name, as the
/// export path addresses it.
pub fn user_says_name_for(intent_name: &str, language: &str) -> String {
    format!("intents/{}_usersays_{}.json", intent_name, language)
}

/// An unpacked agent archive: the parsed metadata entry plus every other
/// entry keyed by name, in archive order.
#[derive(Debug)]
pub struct AgentArchive {
    info: AgentInfo,
    entries: IndexMap<String, Vec<u8>>,
}

impl AgentArchive {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|err| ConnectorError::Unpack(err.to_string()))?;

        let mut entries = IndexMap::new();
        for index in 0..archive.len() {
            let mut file = archive
                .by_index(index)
                .map_err(|err| ConnectorError::Unpack(err.to_string()))?;
            if file.is_dir() {
                continue;
            }
            let mut content = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut content)
                .map_err(|err| ConnectorError::Unpack(err.to_string()))?;
            debug!("agent archive got entry: {}", file.name());
            entries.insert(file.name().to_string(), content);
        }

        let info_bytes = entries
            .get(AGENT_INFO_ENTRY)
            .ok_or_else(|| ConnectorError::Unpack(format!("missing {} entry", AGENT_INFO_ENTRY)))?;
        let info: AgentInfo = serde_json::from_slice(info_bytes)
            .map_err(|err| ConnectorError::Unpack(err.to_string()))?;
        debug!("agent info: language={}", info.language);

        Ok(AgentArchive { info, entries })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes =
            fs::read(path).map_err(|err| ConnectorError::Unpack(err.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn info(&self) -> &AgentInfo {
        &self.info
    }

    pub fn language(&self) -> &str {
        &self.info.language
    }

    /// Intent definition entries in archive order, excluding the paired
    /// usersays entries.
    pub fn intent_entries(&self) -> Vec<String> {
        self.entries
            .keys()
            .filter(|name| name.starts_with("intent") && !name.contains("usersays"))
            .cloned()
            .collect()
    }

    /// Parses a named entry as JSON. Returns `Ok(None)` when the entry does
    /// not exist; a present but malformed entry is an error.
    pub fn read_json_opt<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        match self.entries.get(name) {
            Some(bytes) => Ok(Some(serde_json::from_slice(bytes)?)),
            None => Ok(None),
        }
    }

    pub fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        self.read_json_opt(name)?
            .ok_or_else(|| ConnectorError::Unpack(format!("missing {} entry", name)))
    }

    /// Replaces (or adds) an entry's content.
    pub fn replace_entry(&mut self, name: &str, content: Vec<u8>) {
        self.entries.insert(name.to_string(), content);
    }

    /// Serializes the archive back into zip bytes, entries in their current
    /// order.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut cursor);
            let options =
                FileOptions::default().compression_method(CompressionMethod::Deflated);
            for (name, content) in &self.entries {
                zip.start_file(name, options)?;
                zip.write_all(content)?;
            }
            zip.finish()?;
        }
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> UserSaysChunk {
        UserSaysChunk {
            text: text.to_string(),
            user_defined: false,
            extra: Map::new(),
        }
    }

    fn entry(chunks: Vec<UserSaysChunk>) -> UserSaysEntry {
        UserSaysEntry {
            id: None,
            data: chunks,
            is_template: false,
            count: 0,
            lang: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn phrases_concatenate_chunks_without_separator() {
        let entries = vec![entry(vec![chunk("book "), chunk("a "), chunk("flight")])];
        assert_eq!(extract_phrases(&entries), vec!["book a flight".to_string()]);
    }

    #[test]
    fn phrases_of_empty_chunk_list_is_empty_string() {
        let entries = vec![entry(vec![])];
        assert_eq!(extract_phrases(&entries), vec![String::new()]);
    }

    #[test]
    fn user_says_entry_round_trips_unmodeled_fields() {
        let source = serde_json::json!({
            "id": "abc",
            "data": [
                { "text": "fly to ", "userDefined": false },
                { "text": "Berlin", "alias": "city", "meta": "@sys.geo-city", "userDefined": true }
            ],
            "isTemplate": false,
            "count": 3,
            "updated": 1580000000
        });
        let parsed: UserSaysEntry = serde_json::from_value(source.clone()).unwrap();
        let back = serde_json::to_value(&parsed).unwrap();
        assert_eq!(back["updated"], 1580000000);
        assert_eq!(back["data"][1]["alias"], "city");
        assert_eq!(back["data"][1]["meta"], "@sys.geo-city");
    }

    #[test]
    fn user_says_entry_name_appends_language_suffix() {
        assert_eq!(
            user_says_entry_name("intents/Greeting.json", "en"),
            "intents/Greeting_usersays_en.json"
        );
        assert_eq!(
            user_says_name_for("Greeting", "en"),
            "intents/Greeting_usersays_en.json"
        );
    }

    #[test]
    fn speech_value_accepts_scalar_and_array() {
        let one: SpeechValue = serde_json::from_str(r#""hello""#).unwrap();
        let many: SpeechValue = serde_json::from_str(r#"["hi","hey"]"#).unwrap();
        assert!(matches!(one, SpeechValue::One(ref s) if s == "hello"));
        assert!(matches!(many, SpeechValue::Many(ref v) if v.len() == 2));
    }
}
