//! Wire types exchanged with the resume store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::models::resume::Document;

/// Keys a client may send but the store owns.
const STORE_OWNED_KEYS: &[&str] = &["id", "userId", "completion", "createdAt", "updatedAt"];

/// A document as persisted by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredResume {
    pub id: Uuid,
    #[serde(flatten)]
    pub document: Document,
    /// Completion summary computed by the store when the document was written.
    #[serde(default)]
    pub completion: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewResume {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub url: String,
}

/// A partial update: each top-level key replaces the stored value wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResumePatch(Map<String, Value>);

impl ResumePatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// A patch carrying every field of `document`.
    pub fn from_document(document: &Document) -> Result<Self, serde_json::Error> {
        match serde_json::to_value(document)? {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(serde::ser::Error::custom("document did not serialize to an object")),
        }
    }

    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merges the patch over `stored` and re-reads the result as a document,
    /// which re-applies the row and level invariants.
    pub fn apply_to(&self, stored: &Document) -> Result<Document, serde_json::Error> {
        let mut merged = match serde_json::to_value(stored)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in &self.0 {
            if STORE_OWNED_KEYS.contains(&key.as_str()) {
                continue;
            }
            merged.insert(key.clone(), value.clone());
        }
        serde_json::from_value(Value::Object(merged))
    }
}
