//! Driver-native value model.
//!
//! Values returned by a graph driver arrive as a [`GraphValue`] tree. The
//! variants cover everything the Bolt type system can hand back: scalars,
//! 64-bit integers, collections, graph structures and temporal values.

use std::collections::BTreeMap;

/// Property map shared by nodes, relationships and plain map values.
pub type PropertyMap = BTreeMap<String, GraphValue>;

/// A value as produced by the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphValue {
    Null,
    Bool(bool),
    /// Full 64-bit integer; may exceed the range a JSON consumer can hold exactly
    Integer(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<GraphValue>),
    Map(PropertyMap),
    Node(Node),
    Relationship(Relationship),
    Path(Path),
    Temporal(Temporal),
    Duration(Duration),
    Point(Point),
}

impl GraphValue {
    /// Build a map value from key/value pairs.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, GraphValue)>,
    {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Get the type name of this value for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Node(_) => "node",
            Self::Relationship(_) => "relationship",
            Self::Path(_) => "path",
            Self::Temporal(t) => t.kind.name(),
            Self::Duration(_) => "duration",
            Self::Point(_) => "point",
        }
    }
}

impl From<bool> for GraphValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for GraphValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for GraphValue {
    fn from(v: i32) -> Self {
        Self::Integer(v.into())
    }
}

impl From<f64> for GraphValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for GraphValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for GraphValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl<T: Into<GraphValue>> From<Vec<T>> for GraphValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<GraphValue>> From<Option<T>> for GraphValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl From<Node> for GraphValue {
    fn from(v: Node) -> Self {
        Self::Node(v)
    }
}

impl From<Relationship> for GraphValue {
    fn from(v: Relationship) -> Self {
        Self::Relationship(v)
    }
}

impl From<Temporal> for GraphValue {
    fn from(v: Temporal) -> Self {
        Self::Temporal(v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: i64,
    pub labels: Vec<String>,
    pub properties: PropertyMap,
}

impl Node {
    pub fn new(id: i64, labels: Vec<String>, properties: PropertyMap) -> Self {
        Self {
            id,
            labels,
            properties,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub id: i64,
    /// Identity of the start node
    pub start: i64,
    /// Identity of the end node
    pub end: i64,
    pub rel_type: String,
    pub properties: PropertyMap,
}

/// One hop of a path: `start -[relationship]-> end`.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment {
    pub start: Node,
    pub relationship: Relationship,
    pub end: Node,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub start: Node,
    pub end: Node,
    pub segments: Vec<PathSegment>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Duration {
    pub months: i64,
    pub days: i64,
    pub seconds: i64,
    pub nanoseconds: i64,
}

/// A spatial point; `z` is present only for 3D coordinate systems.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub srid: i64,
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

/// The five temporal variants of the Cypher type system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalKind {
    Date,
    DateTime,
    LocalDateTime,
    LocalTime,
    Time,
}

impl TemporalKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::DateTime => "date_time",
            Self::LocalDateTime => "local_date_time",
            Self::LocalTime => "local_time",
            Self::Time => "time",
        }
    }

    /// Whether values of this kind carry a calendar date.
    pub fn has_date(&self) -> bool {
        matches!(self, Self::Date | Self::DateTime | Self::LocalDateTime)
    }
}

/// A temporal value broken into its named fields.
///
/// Fields that a variant does not carry are `None`, e.g. a `Date` has no
/// `hour` and a `LocalTime` has no `year`.
#[derive(Debug, Clone, PartialEq)]
pub struct Temporal {
    pub kind: TemporalKind,
    pub year: Option<i64>,
    pub month: Option<i64>,
    pub day: Option<i64>,
    pub hour: Option<i64>,
    pub minute: Option<i64>,
    pub second: Option<i64>,
    pub nanosecond: Option<i64>,
    pub time_zone_offset_seconds: Option<i64>,
    pub time_zone_id: Option<String>,
}

impl Temporal {
    fn empty(kind: TemporalKind) -> Self {
        Self {
            kind,
            year: None,
            month: None,
            day: None,
            hour: None,
            minute: None,
            second: None,
            nanosecond: None,
            time_zone_offset_seconds: None,
            time_zone_id: None,
        }
    }

    fn with_date(mut self, year: i64, month: i64, day: i64) -> Self {
        self.year = Some(year);
        self.month = Some(month);
        self.day = Some(day);
        self
    }

    fn with_time(mut self, hour: i64, minute: i64, second: i64, nanosecond: i64) -> Self {
        self.hour = Some(hour);
        self.minute = Some(minute);
        self.second = Some(second);
        self.nanosecond = Some(nanosecond);
        self
    }

    pub fn date(year: i64, month: i64, day: i64) -> Self {
        Self::empty(TemporalKind::Date).with_date(year, month, day)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn date_time(
        year: i64,
        month: i64,
        day: i64,
        hour: i64,
        minute: i64,
        second: i64,
        nanosecond: i64,
        time_zone_offset_seconds: i64,
    ) -> Self {
        let mut value = Self::empty(TemporalKind::DateTime)
            .with_date(year, month, day)
            .with_time(hour, minute, second, nanosecond);
        value.time_zone_offset_seconds = Some(time_zone_offset_seconds);
        value
    }

    pub fn local_date_time(
        year: i64,
        month: i64,
        day: i64,
        hour: i64,
        minute: i64,
        second: i64,
        nanosecond: i64,
    ) -> Self {
        Self::empty(TemporalKind::LocalDateTime)
            .with_date(year, month, day)
            .with_time(hour, minute, second, nanosecond)
    }

    pub fn local_time(hour: i64, minute: i64, second: i64, nanosecond: i64) -> Self {
        Self::empty(TemporalKind::LocalTime).with_time(hour, minute, second, nanosecond)
    }

    pub fn time(
        hour: i64,
        minute: i64,
        second: i64,
        nanosecond: i64,
        time_zone_offset_seconds: i64,
    ) -> Self {
        let mut value =
            Self::empty(TemporalKind::Time).with_time(hour, minute, second, nanosecond);
        value.time_zone_offset_seconds = Some(time_zone_offset_seconds);
        value
    }

    /// Attach a named zone (e.g. `Europe/Paris`). A zoned date-time may carry
    /// a zone id without a resolved offset.
    pub fn with_zone_id(mut self, zone_id: impl Into<String>) -> Self {
        self.time_zone_id = Some(zone_id.into());
        self
    }

    /// Drop the resolved offset, leaving only the zone id.
    pub fn without_offset(mut self) -> Self {
        self.time_zone_offset_seconds = None;
        self
    }

    /// Present fields in declaration order, keyed by their wire names.
    pub fn fields(&self) -> Vec<(&'static str, GraphValue)> {
        let numeric = [
            ("year", self.year),
            ("month", self.month),
            ("day", self.day),
            ("hour", self.hour),
            ("minute", self.minute),
            ("second", self.second),
            ("nanosecond", self.nanosecond),
            ("timeZoneOffsetSeconds", self.time_zone_offset_seconds),
        ];
        let mut fields: Vec<(&'static str, GraphValue)> = numeric
            .into_iter()
            .filter_map(|(name, v)| v.map(|v| (name, GraphValue::Integer(v))))
            .collect();
        if let Some(zone) = &self.time_zone_id {
            fields.push(("timeZoneId", GraphValue::String(zone.clone())));
        }
        fields
    }
}
