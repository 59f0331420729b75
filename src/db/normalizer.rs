//! Result normalization.
//!
//! Rewrites driver-native values into plain JSON values:
//! - 64-bit integers become numbers when a double can hold them exactly,
//!   decimal strings otherwise
//! - nodes and relationships collapse to their property maps
//! - temporal values become field maps, with derived epoch timestamps for
//!   variants that carry a date
//! - lists and maps are rewritten element by element
//!
//! Normalization is synchronous and never fails; a value that cannot be
//! represented (a NaN float, a date outside chrono's range) becomes `null`.

use crate::models::{
    GraphValue, JsonRow, Params, Path, PathSegment, PropertyMap, Record, ResultSet, Temporal,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{NaiveDate, NaiveTime};
use serde_json::Value as JsonValue;

/// Largest integer a 64-bit float represents exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

/// Smallest integer a 64-bit float represents exactly.
pub const MIN_SAFE_INTEGER: i64 = -MAX_SAFE_INTEGER;

/// Check whether an integer survives a round trip through a JSON number.
pub fn is_safe_integer(value: i64) -> bool {
    (MIN_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&value)
}

/// Convert an integer to a JSON number, or to its decimal string when it
/// lies outside the safe range.
pub fn normalize_integer(value: i64) -> JsonValue {
    if is_safe_integer(value) {
        JsonValue::from(value)
    } else {
        JsonValue::String(value.to_string())
    }
}

// =============================================================================
// Result Sets
// =============================================================================

/// Trait for converting driver records to plain JSON rows.
pub trait RecordToJson {
    fn to_json_row(&self) -> JsonRow;
    fn into_json_row(self) -> JsonRow;
}

impl RecordToJson for Record {
    fn to_json_row(&self) -> JsonRow {
        self.iter()
            .map(|(key, value)| (key.to_string(), normalize_value(value.clone())))
            .collect()
    }

    fn into_json_row(self) -> JsonRow {
        self.into_pairs()
            .map(|(key, value)| (key, normalize_value(value)))
            .collect()
    }
}

/// Normalize a whole result set into rows keyed by column name.
///
/// Returns `None` when the result has no records, so callers can tell "no
/// rows" apart from a row list.
pub fn normalize_result_set(result: ResultSet) -> Option<Vec<JsonRow>> {
    if result.is_empty() {
        return None;
    }
    Some(
        result
            .records
            .into_iter()
            .map(RecordToJson::into_json_row)
            .collect(),
    )
}

// =============================================================================
// Values
// =============================================================================

/// Recursively rewrite a driver value into a plain JSON value.
pub fn normalize_value(value: GraphValue) -> JsonValue {
    match value {
        GraphValue::Temporal(temporal) => normalize_temporal(temporal),
        GraphValue::Node(node) => normalize_map(node.properties),
        GraphValue::Relationship(rel) => normalize_map(rel.properties),
        GraphValue::Integer(v) => normalize_integer(v),
        GraphValue::List(items) => {
            JsonValue::Array(items.into_iter().map(normalize_value).collect())
        }
        GraphValue::Map(map) => normalize_map(map),
        GraphValue::Path(path) => normalize_path(path),
        GraphValue::Duration(d) => JsonValue::Object(
            [
                ("months", d.months),
                ("days", d.days),
                ("seconds", d.seconds),
                ("nanoseconds", d.nanoseconds),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), normalize_integer(v)))
            .collect(),
        ),
        GraphValue::Point(p) => {
            let mut map = JsonRow::new();
            map.insert("srid".into(), normalize_integer(p.srid));
            map.insert("x".into(), float(p.x));
            map.insert("y".into(), float(p.y));
            if let Some(z) = p.z {
                map.insert("z".into(), float(z));
            }
            JsonValue::Object(map)
        }
        GraphValue::Bytes(bytes) => JsonValue::String(STANDARD.encode(bytes)),
        GraphValue::Float(v) => float(v),
        GraphValue::String(s) => JsonValue::String(s),
        GraphValue::Bool(b) => JsonValue::Bool(b),
        GraphValue::Null => JsonValue::Null,
    }
}

/// Shallow integer conversion for outgoing parameters.
///
/// Only top-level integers outside the safe range are touched (they become
/// decimal strings); nested lists and maps pass through as-is.
pub fn normalize_params(params: Params) -> Params {
    params
        .into_iter()
        .map(|(key, value)| match value {
            GraphValue::Integer(v) if !is_safe_integer(v) => {
                (key, GraphValue::String(v.to_string()))
            }
            other => (key, other),
        })
        .collect()
}

fn float(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v).map_or(JsonValue::Null, JsonValue::Number)
}

fn normalize_map(map: PropertyMap) -> JsonValue {
    JsonValue::Object(
        map.into_iter()
            .map(|(key, value)| (key, normalize_value(value)))
            .collect(),
    )
}

fn normalize_path(path: Path) -> JsonValue {
    let length = path.segments.len();
    let segments = path
        .segments
        .into_iter()
        .map(|PathSegment { start, relationship, end }| {
            let mut segment = JsonRow::new();
            segment.insert("start".into(), normalize_map(start.properties));
            segment.insert("relationship".into(), normalize_map(relationship.properties));
            segment.insert("end".into(), normalize_map(end.properties));
            JsonValue::Object(segment)
        })
        .collect();

    let mut map = JsonRow::new();
    map.insert("start".into(), normalize_map(path.start.properties));
    map.insert("end".into(), normalize_map(path.end.properties));
    map.insert("segments".into(), JsonValue::Array(segments));
    map.insert("length".into(), JsonValue::from(length));
    JsonValue::Object(map)
}

// =============================================================================
// Temporal Values
// =============================================================================

fn normalize_temporal(temporal: Temporal) -> JsonValue {
    let mut map: JsonRow = temporal
        .fields()
        .into_iter()
        .map(|(name, value)| (name.to_string(), normalize_value(value)))
        .collect();

    if temporal.kind.has_date() {
        let unix_tzo = wall_clock_millis(&temporal);
        let unix_utc = unix_tzo.and_then(|ms| {
            let offset_ms = temporal.time_zone_offset_seconds.unwrap_or(0).checked_mul(1000)?;
            ms.checked_sub(offset_ms)
        });
        if unix_utc.is_none() {
            tracing::debug!(kind = temporal.kind.name(), "Temporal value outside representable range");
        }
        map.insert("unixTZO".into(), unix_tzo.map_or(JsonValue::Null, JsonValue::from));
        map.insert("unixUTC".into(), unix_utc.map_or(JsonValue::Null, JsonValue::from));
    }

    JsonValue::Object(map)
}

/// Milliseconds since the epoch for the value's wall-clock fields, read as if
/// they were UTC. Missing time fields count as zero.
fn wall_clock_millis(t: &Temporal) -> Option<i64> {
    let part = |v: Option<i64>| u32::try_from(v.unwrap_or(0)).ok();

    let date = NaiveDate::from_ymd_opt(
        i32::try_from(t.year?).ok()?,
        u32::try_from(t.month?).ok()?,
        u32::try_from(t.day?).ok()?,
    )?;
    let time = NaiveTime::from_hms_milli_opt(
        part(t.hour)?,
        part(t.minute)?,
        part(t.second)?,
        part(t.nanosecond.map(|ns| ns / 1_000_000))?,
    )?;
    Some(date.and_time(time).and_utc().timestamp_millis())
}
