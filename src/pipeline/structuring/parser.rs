use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::StructuringError;
use crate::models::{LabResult, LabStatus};

/// Keys every element must carry to be kept. `explanation` is optional.
pub const REQUIRED_KEYS: [&str; 5] = ["test", "value", "unit", "range", "status"];

static FENCED_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("valid regex"));
static OPENING_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[^\n]*\n?").expect("valid regex"));
static CLOSING_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n?```").expect("valid regex"));

/// Validated lab results plus how many elements were thrown away.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedLabData {
    pub results: Vec<LabResult>,
    pub dropped: usize,
}

/// Cut the JSON array candidate out of a model reply.
///
/// With a fence marker present, the content of the first fenced block wins;
/// an unpaired marker is just stripped. The candidate is then narrowed to
/// the first `[` through the last `]`. The result may still be invalid JSON.
pub fn recover_json_array(response: &str) -> String {
    let mut text = response.trim().to_string();

    if text.contains("```") {
        text = match FENCED_BLOCK_RE.captures(&text).and_then(|c| c.get(1)) {
            Some(inner) => inner.as_str().trim().to_string(),
            None => {
                let stripped = OPENING_FENCE_RE.replace_all(&text, "");
                CLOSING_FENCE_RE.replace_all(&stripped, "").into_owned()
            }
        };
    }

    match (text.find('['), text.rfind(']')) {
        (Some(start), Some(end)) if start <= end => text[start..=end].to_string(),
        (Some(_), Some(_)) => String::new(),
        _ => text,
    }
}

/// Recover, parse and validate in one step.
pub fn parse_lab_response(response: &str) -> Result<ParsedLabData, StructuringError> {
    let candidate = recover_json_array(response);
    let value: Value = serde_json::from_str(&candidate)
        .map_err(|e| StructuringError::JsonParsing(e.to_string()))?;
    if !value.is_array() {
        return Err(StructuringError::NotAnArray);
    }
    Ok(validate_lab_results(&value))
}

/// Keep the elements that are complete lab results, in their original order.
///
/// Non-object elements, elements missing a required key, and elements whose
/// `value` is not a finite number (or numeric string) are dropped. A
/// non-array input yields nothing.
pub fn validate_lab_results(value: &Value) -> ParsedLabData {
    let Some(items) = value.as_array() else {
        return ParsedLabData::default();
    };

    let mut parsed = ParsedLabData::default();
    for (index, item) in items.iter().enumerate() {
        match item.as_object().and_then(lab_result_from_object) {
            Some(result) => parsed.results.push(result),
            None => {
                tracing::debug!(index, "Dropping incomplete lab result");
                parsed.dropped += 1;
            }
        }
    }
    parsed
}

fn lab_result_from_object(obj: &Map<String, Value>) -> Option<LabResult> {
    if !REQUIRED_KEYS.iter().all(|key| obj.contains_key(*key)) {
        return None;
    }

    let value = coerce_number(&obj["value"])?;
    let test = text_field(&obj["test"]);
    if test.trim().is_empty() {
        return None;
    }

    Some(LabResult {
        test,
        value,
        unit: text_field(&obj["unit"]),
        range: text_field(&obj["range"]),
        status: LabStatus::new(text_field(&obj["status"])),
        explanation: obj.get("explanation").map(text_field).unwrap_or_default(),
    })
}

/// JSON numbers and numeric strings become `f64`; everything else,
/// including NaN and infinities, is rejected.
fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

/// Models sometimes emit numbers or null where a string belongs.
fn text_field(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
