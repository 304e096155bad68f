#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::sync::Mutex;

use serde_json::{json, Value};
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

use convokit::importer::StatusReporter;

/// Builds agent archive bytes with an `agent.json` (language `en`) plus the
/// given entries.
pub fn build_archive(entries: &[(&str, Value)]) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut cursor);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file("agent.json", options).unwrap();
        zip.write_all(json!({ "language": "en" }).to_string().as_bytes())
            .unwrap();
        for (name, content) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.to_string().as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    cursor.into_inner()
}

pub fn intent_json(id: &str, parent_id: Option<&str>, name: &str, contexts: &[&str]) -> Value {
    let mut value = json!({
        "id": id,
        "name": name,
        "contexts": contexts,
        "responses": [],
    });
    if let Some(parent_id) = parent_id {
        value["parentId"] = json!(parent_id);
    }
    value
}

/// One response definition with a single text message for `en`.
pub fn text_response(speech: Value) -> Value {
    json!({
        "messages": [
            { "type": "0", "lang": "en", "speech": speech }
        ]
    })
}

pub fn user_says_json(phrases: &[&str]) -> Value {
    Value::Array(
        phrases
            .iter()
            .map(|phrase| {
                json!({
                    "data": [ { "text": phrase, "userDefined": false } ],
                    "isTemplate": false,
                    "count": 0,
                })
            })
            .collect(),
    )
}

#[derive(Default)]
pub struct CollectingReporter {
    messages: Mutex<Vec<String>>,
}

impl CollectingReporter {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl StatusReporter for CollectingReporter {
    fn report(&self, message: &str, _detail: Option<Value>) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
