//! Answer-set parsing
//!
//! Model output should be `{"questions": [{"question", "answer_en",
//! "answer_ur"}, ...]}` but sometimes arrives wrapped in prose or code
//! fences. Parsing never fails: whatever cannot be read becomes an empty
//! question list.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One extracted question with its English and Urdu answers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QaRecord {
    pub question: String,
    pub answer_en: String,
    pub answer_ur: String,
}

impl QaRecord {
    pub fn new(question: impl Into<String>, answer_en: impl Into<String>, answer_ur: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer_en: answer_en.into(),
            answer_ur: answer_ur.into(),
        }
    }

    pub fn has_urdu(&self) -> bool {
        !self.answer_ur.trim().is_empty()
    }
}

type Strategy = fn(&str) -> Option<Value>;

/// Parse attempts in order. The first one that yields JSON decides the result.
const STRATEGIES: &[(&str, Strategy)] = &[("direct", parse_direct), ("outer braces", parse_outer_braces)];

fn parse_direct(raw: &str) -> Option<Value> {
    serde_json::from_str(raw).ok()
}

/// The text from the first `{` to the last `}`.
fn parse_outer_braces(raw: &str) -> Option<Value> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&raw[start..=end]).ok()
}

/// Extract question records from a model response.
pub fn parse_answers(raw: &str) -> Vec<QaRecord> {
    for (name, strategy) in STRATEGIES {
        if let Some(value) = strategy(raw) {
            let records = records_from_value(&value);
            debug!("parsed {} question(s) with the {} strategy", records.len(), name);
            return records;
        }
    }
    warn!("model response is not valid JSON ({} bytes), using an empty question list", raw.len());
    Vec::new()
}

/// Records under the `questions` key of an already parsed value.
pub fn records_from_value(value: &Value) -> Vec<QaRecord> {
    let Some(questions) = value.get("questions") else {
        warn!("model response has no \"questions\" key");
        return Vec::new();
    };
    let Some(items) = questions.as_array() else {
        warn!("\"questions\" is not an array");
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item.as_object() {
            Some(fields) => Some(record_from_fields(fields)),
            None => {
                debug!("skipping non-object question entry");
                None
            }
        })
        .collect()
}

fn record_from_fields(fields: &Map<String, Value>) -> QaRecord {
    QaRecord {
        question: field_text(fields, "question"),
        answer_en: field_text(fields, "answer_en"),
        answer_ur: field_text(fields, "answer_ur"),
    }
}

/// Missing or null fields are empty; numbers and other scalars keep their JSON text.
fn field_text(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}
