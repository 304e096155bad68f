//! Capability map handed through from the host test framework. Connection
//! settings for the NLU provider live here rather than in CLI flags.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::errors::{ConnectorError, Result};

pub const PROJECT_ID: &str = "NLU_PROJECT_ID";
pub const ENDPOINT: &str = "NLU_ENDPOINT";
pub const API_TOKEN: &str = "NLU_API_TOKEN";
pub const LANGUAGE: &str = "NLU_LANGUAGE";

#[derive(Debug, Clone, Default)]
pub struct Caps(HashMap<String, Value>);

impl Caps {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let values: HashMap<String, Value> = serde_json::from_str(&content)?;
        Ok(Caps(values))
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn require_str(&self, key: &'static str) -> Result<&str> {
        self.get_str(key)
            .ok_or(ConnectorError::MissingCapability(key))
    }

}
