//! # Cursor Codec
//!
//! Cursors are opaque to clients but have a stable wire format:
//!
//! ```text
//! base64url_nopad(
//!   {"json": {"type": "next", "payload": {"age": 30, "created_at": "2024-05-01T10:00:00Z"}},
//!    "meta": {"values": {"payload.created_at": ["Date"]}}}
//! )
//! ```
//!
//! The `json` part is plain JSON. Values JSON cannot represent faithfully are
//! written as strings and annotated in `meta.values`, keyed by their dotted
//! path (dots inside a key are escaped as `\.`):
//!
//! | Value                          | JSON                 | Annotation                   |
//! |--------------------------------|----------------------|------------------------------|
//! | UTC timestamp                  | RFC 3339, `Z` suffix | `["Date"]`                   |
//! | timestamp with offset          | RFC 3339, `±hh:mm`   | `["Date"]`                   |
//! | integer outside ±2^53          | decimal string       | `["bigint"]`                 |
//! | NaN / ±Infinity                | `"NaN"`, `"Infinity"`| `["number"]`                 |
//! | naive timestamp / date / UUID  | string               | `["custom", "<type name>"]`  |
//! | unknown value                  | `null`               | `["undefined"]`              |
//!
//! A `Date` with a numeric offset keeps that offset when decoded; some backends
//! store such timestamps as text and compare them as written.
//!
//! `meta` is omitted when nothing needs annotating. Entries annotated
//! `undefined` decode as absent. Decoding accepts padded and unpadded input.

use base64::{
    Engine as _, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value as Json, json};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::errors::MalformedCursor;
use crate::value::CursorValue;

/// Longest cursor string accepted by [`decode`]
pub const MAX_CURSOR_LENGTH: usize = 4096;

/// Largest integer a JavaScript client can hold exactly
const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

const NAIVE_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const CURSOR_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Which way the page a cursor leads to lies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorDirection {
    Next,
    Prev,
}

impl CursorDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Prev => "prev",
        }
    }
}

/// Decoded cursor: direction plus the boundary row's sort-key values.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorPayload {
    pub direction: CursorDirection,
    pub values: BTreeMap<String, CursorValue>,
}

impl CursorPayload {
    #[must_use]
    pub fn new(direction: CursorDirection) -> Self {
        Self {
            direction,
            values: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<CursorValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    json: Json,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    meta: Option<Meta>,
}

#[derive(Serialize, Deserialize, Default)]
struct Meta {
    #[serde(default)]
    values: BTreeMap<String, Json>,
}

/// Encode a payload into an opaque, URL-safe cursor string.
#[must_use]
pub fn encode(payload: &CursorPayload) -> String {
    let mut annotations = BTreeMap::new();
    let mut values = Map::new();

    for (key, value) in &payload.values {
        let (json, annotation) = encode_value(value);
        if let Some(annotation) = annotation {
            annotations.insert(format!("payload.{}", escape_key(key)), annotation);
        }
        values.insert(key.clone(), json);
    }

    let envelope = Envelope {
        json: json!({
            "type": payload.direction.as_str(),
            "payload": values,
        }),
        meta: (!annotations.is_empty()).then_some(Meta {
            values: annotations,
        }),
    };

    match serde_json::to_vec(&envelope) {
        Ok(bytes) => CURSOR_ENGINE.encode(bytes),
        Err(err) => {
            // empty output never decodes
            tracing::error!(error = %err, "Failed to serialize cursor payload");
            String::new()
        }
    }
}

/// Decode a cursor string produced by [`encode`].
///
/// # Errors
///
/// Returns `MalformedCursor` when the string is not base64url, is too long, or
/// does not contain a well-formed payload.
pub fn decode(cursor: &str) -> Result<CursorPayload, MalformedCursor> {
    if cursor.len() > MAX_CURSOR_LENGTH {
        return Err(MalformedCursor::new("cursor is too long"));
    }

    let bytes = CURSOR_ENGINE
        .decode(cursor.trim())
        .map_err(|_| MalformedCursor::new("cursor is not valid base64url"))?;
    let envelope: Envelope = serde_json::from_slice(&bytes)
        .map_err(|_| MalformedCursor::new("cursor does not contain a payload"))?;

    let Json::Object(mut body) = envelope.json else {
        return Err(MalformedCursor::new("cursor payload is not an object"));
    };

    let direction = match body.get("type").and_then(Json::as_str) {
        Some("next") => CursorDirection::Next,
        Some("prev") => CursorDirection::Prev,
        Some(_) => return Err(MalformedCursor::new("cursor type must be 'next' or 'prev'")),
        None => return Err(MalformedCursor::new("cursor is missing its type")),
    };

    let Some(Json::Object(raw_values)) = body.remove("payload") else {
        return Err(MalformedCursor::new("cursor values must be an object"));
    };

    let mut annotations = BTreeMap::new();
    for (path, annotation) in envelope.meta.unwrap_or_default().values {
        match parse_path(&path).as_deref() {
            Some([root, key]) if root == "payload" => {
                annotations.insert(key.clone(), annotation);
            }
            _ => return Err(MalformedCursor::new(format!("unexpected annotation path '{path}'"))),
        }
    }

    let mut values = BTreeMap::new();
    for (key, raw) in raw_values {
        let decoded = match annotations.remove(&key) {
            Some(annotation) => decode_annotated(&key, raw, &annotation)?,
            None => Some(decode_plain(&key, raw)?),
        };
        if let Some(value) = decoded {
            values.insert(key, value);
        }
    }

    if let Some(key) = annotations.keys().next() {
        return Err(MalformedCursor::new(format!("annotation for missing key '{key}'")));
    }

    Ok(CursorPayload { direction, values })
}

fn encode_value(value: &CursorValue) -> (Json, Option<Json>) {
    match value {
        CursorValue::Null => (Json::Null, None),
        CursorValue::Bool(v) => (Json::Bool(*v), None),
        CursorValue::Int(v) if (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(v) => (Json::from(*v), None),
        CursorValue::Int(v) => (Json::String(v.to_string()), Some(json!(["bigint"]))),
        CursorValue::Float(v) => Number::from_f64(*v).map_or_else(
            || {
                let text = if v.is_nan() {
                    "NaN"
                } else if v.is_sign_positive() {
                    "Infinity"
                } else {
                    "-Infinity"
                };
                (Json::String(text.to_string()), Some(json!(["number"])))
            },
            |number| (Json::Number(number), None),
        ),
        CursorValue::Text(v) => (Json::String(v.clone()), None),
        CursorValue::DateTime(v) => (
            Json::String(v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Some(json!(["Date"])),
        ),
        CursorValue::DateTimeOffset(v) => (
            Json::String(v.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
            Some(json!(["Date"])),
        ),
        CursorValue::NaiveDateTime(v) => (
            Json::String(v.format(NAIVE_DATETIME_FORMAT).to_string()),
            Some(json!(["custom", "NaiveDateTime"])),
        ),
        CursorValue::Date(v) => (Json::String(v.to_string()), Some(json!(["custom", "NaiveDate"]))),
        CursorValue::Uuid(v) => (Json::String(v.to_string()), Some(json!(["custom", "Uuid"]))),
    }
}

fn decode_plain(key: &str, raw: Json) -> Result<CursorValue, MalformedCursor> {
    match raw {
        Json::Null => Ok(CursorValue::Null),
        Json::Bool(v) => Ok(CursorValue::Bool(v)),
        Json::Number(n) => n
            .as_i64()
            .map(CursorValue::Int)
            .or_else(|| n.as_f64().map(CursorValue::Float))
            .ok_or_else(|| MalformedCursor::new(format!("unreadable number for '{key}'"))),
        Json::String(v) => Ok(CursorValue::Text(v)),
        Json::Array(_) | Json::Object(_) => Err(MalformedCursor::new(format!(
            "unsupported value for '{key}'"
        ))),
    }
}

/// `Ok(None)` means the value was annotated `undefined`
fn decode_annotated(
    key: &str,
    raw: Json,
    annotation: &Json,
) -> Result<Option<CursorValue>, MalformedCursor> {
    let tags: Vec<&str> = annotation
        .as_array()
        .map(|items| items.iter().filter_map(Json::as_str).collect())
        .unwrap_or_default();
    let invalid = || MalformedCursor::new(format!("invalid annotated value for '{key}'"));

    if matches!(tags.as_slice(), ["undefined"]) {
        return Ok(None);
    }

    let Json::String(text) = raw else {
        return Err(invalid());
    };

    let value = match tags.as_slice() {
        ["Date"] => {
            let parsed = DateTime::parse_from_rfc3339(&text).map_err(|_| invalid())?;
            if text.ends_with(['Z', 'z']) {
                CursorValue::DateTime(parsed.with_timezone(&Utc))
            } else {
                CursorValue::DateTimeOffset(parsed)
            }
        }
        ["bigint"] => text.parse::<i64>().map(CursorValue::Int).map_err(|_| invalid())?,
        ["number"] => match text.as_str() {
            "NaN" => CursorValue::Float(f64::NAN),
            "Infinity" => CursorValue::Float(f64::INFINITY),
            "-Infinity" => CursorValue::Float(f64::NEG_INFINITY),
            _ => return Err(invalid()),
        },
        ["custom", "NaiveDateTime"] => NaiveDateTime::parse_from_str(&text, NAIVE_DATETIME_FORMAT)
            .map(CursorValue::NaiveDateTime)
            .map_err(|_| invalid())?,
        ["custom", "NaiveDate"] => text
            .parse::<NaiveDate>()
            .map(CursorValue::Date)
            .map_err(|_| invalid())?,
        ["custom", "Uuid"] => Uuid::parse_str(&text)
            .map(CursorValue::Uuid)
            .map_err(|_| invalid())?,
        _ => {
            return Err(MalformedCursor::new(format!(
                "unknown annotation {annotation} for '{key}'"
            )));
        }
    };

    Ok(Some(value))
}

fn escape_key(key: &str) -> String {
    key.replace('\\', "\\\\").replace('.', "\\.")
}

/// Split a dotted annotation path, honouring `\.` and `\\` escapes
fn parse_path(path: &str) -> Option<Vec<String>> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => current.push(chars.next()?),
            '.' => segments.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    segments.push(current);

    Some(segments)
}
