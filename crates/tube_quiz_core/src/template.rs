//! crates/tube_quiz_core/src/template.rs
//!
//! Typed views over the content descriptor of an interactive-content package.
//!
//! The descriptor is kept as a dynamic JSON tree so that every field this crate
//! does not interpret survives untouched. The views only check, at load time,
//! that the few fields the assembler writes to have the expected shape.

use crate::error::PackageError;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Archive path of the entry holding the `questions` document.
pub const CONTENT_DESCRIPTOR_PATH: &str = "content/content.json";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

fn invalid(msg: impl Into<String>) -> PackageError {
    PackageError::InvalidTemplate(msg.into())
}

//=========================================================================================
// Content Document
//=========================================================================================

/// The parsed content descriptor: a JSON object with a `questions` array.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentDocument {
    root: Map<String, Value>,
}

impl ContentDocument {
    /// Parses descriptor bytes. A leading UTF-8 byte order mark is tolerated.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PackageError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let text = std::str::from_utf8(bytes)
            .map_err(|e| invalid(format!("{CONTENT_DESCRIPTOR_PATH} is not valid UTF-8: {e}")))?;
        let value: Value = serde_json::from_str(text)
            .map_err(|e| invalid(format!("{CONTENT_DESCRIPTOR_PATH} is not valid JSON: {e}")))?;

        let Value::Object(root) = value else {
            return Err(invalid(format!(
                "{CONTENT_DESCRIPTOR_PATH} must hold a JSON object"
            )));
        };
        match root.get("questions") {
            Some(Value::Array(_)) => Ok(Self { root }),
            Some(_) => Err(invalid("'questions' is not an array")),
            None => Err(invalid(format!(
                "{CONTENT_DESCRIPTOR_PATH} has no 'questions' field"
            ))),
        }
    }

    pub fn questions(&self) -> &[Value] {
        match self.root.get("questions") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        }
    }

    /// The first question, validated as a cloning donor.
    pub fn donor_question(&self) -> Result<DonorQuestion, PackageError> {
        let first = self
            .questions()
            .first()
            .ok_or_else(|| invalid("template contains no questions to use as a donor"))?;
        DonorQuestion::from_value(first)
    }

    /// Every `subContentId` string anywhere in the document, at any depth.
    pub fn sub_content_ids(&self) -> HashSet<String> {
        let mut ids = HashSet::new();
        for value in self.root.values() {
            collect_sub_content_ids(value, &mut ids);
        }
        ids
    }

    pub fn replace_questions(&mut self, questions: Vec<Value>) {
        self.root
            .insert("questions".to_string(), Value::Array(questions));
    }

    /// Serializes as indented UTF-8 with non-ASCII characters kept literal.
    pub fn to_vec(&self) -> Result<Vec<u8>, PackageError> {
        serde_json::to_vec_pretty(&self.root)
            .map_err(|e| PackageError::PackagingFailed(format!("cannot serialize descriptor: {e}")))
    }
}

fn collect_sub_content_ids(value: &Value, ids: &mut HashSet<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                match child {
                    Value::String(id) if key == "subContentId" => {
                        ids.insert(id.clone());
                    }
                    _ => collect_sub_content_ids(child, ids),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_sub_content_ids(item, ids);
            }
        }
        _ => {}
    }
}

//=========================================================================================
// Donor Question
//=========================================================================================

/// A template question known to carry `params.question` (string),
/// a non-empty `params.answers` whose first entry is an object, and,
/// if present, an object-valued `metadata`.
#[derive(Debug, Clone, PartialEq)]
pub struct DonorQuestion {
    tree: Map<String, Value>,
    answer_donor: Map<String, Value>,
}

impl DonorQuestion {
    pub fn from_value(value: &Value) -> Result<Self, PackageError> {
        let tree = value
            .as_object()
            .ok_or_else(|| invalid("donor question is not an object"))?;
        let params = tree
            .get("params")
            .and_then(Value::as_object)
            .ok_or_else(|| invalid("donor question has no 'params' object"))?;
        if !params.get("question").is_some_and(Value::is_string) {
            return Err(invalid("donor question has no 'params.question' text"));
        }
        let answers = params
            .get("answers")
            .and_then(Value::as_array)
            .ok_or_else(|| invalid("donor question has no 'params.answers' array"))?;
        let answer_donor = answers
            .first()
            .and_then(Value::as_object)
            .ok_or_else(|| {
                invalid("donor question has no answer entry to use as 'params.answers[0]'")
            })?
            .clone();
        if tree.get("metadata").is_some_and(|m| !m.is_object()) {
            return Err(invalid("donor question 'metadata' is not an object"));
        }
        Ok(Self {
            tree: tree.clone(),
            answer_donor,
        })
    }

    /// The full donor tree.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.tree
    }

    /// `params.answers[0]`, the shape every generated answer is cloned from.
    pub fn answer_donor(&self) -> &Map<String, Value> {
        &self.answer_donor
    }
}

//=========================================================================================
// Generated Question
//=========================================================================================

/// A question produced by cloning a donor; owns its whole tree.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedQuestion {
    tree: Map<String, Value>,
}

impl GeneratedQuestion {
    pub(crate) fn from_tree(tree: Map<String, Value>) -> Self {
        Self { tree }
    }

    pub fn question_text(&self) -> Option<&str> {
        self.params()?.get("question")?.as_str()
    }

    pub fn answers(&self) -> &[Value] {
        self.params()
            .and_then(|p| p.get("answers"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn title(&self) -> Option<&str> {
        self.tree.get("metadata")?.get("title")?.as_str()
    }

    pub fn sub_content_id(&self) -> Option<&str> {
        self.tree.get("subContentId")?.as_str()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.tree
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.tree)
    }

    fn params(&self) -> Option<&Map<String, Value>> {
        self.tree.get("params")?.as_object()
    }
}
