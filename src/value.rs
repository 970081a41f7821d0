//! Typed values carried inside a cursor, and their conversions to and from
//! Sea-ORM values and raw result rows.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use sea_orm::{QueryResult, TryGetable, Value, sea_query::ColumnType};
use uuid::Uuid;

/// Last-seen value of one sort key.
///
/// A key whose value could not be determined is simply absent from the
/// payload; `Null` is a real SQL NULL.
#[derive(Debug, Clone, PartialEq)]
pub enum CursorValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(DateTime<Utc>),
    /// Timestamp that keeps the offset it was stored with; text-backed
    /// backends compare these by their written form, offset included
    DateTimeOffset(DateTime<FixedOffset>),
    NaiveDateTime(NaiveDateTime),
    Date(NaiveDate),
    Uuid(Uuid),
}

impl CursorValue {
    /// Bindable query value; `None` for `Null`, which is compared with `IS NULL`
    #[must_use]
    pub fn to_query_value(&self) -> Option<Value> {
        match self {
            Self::Null => None,
            Self::Bool(v) => Some((*v).into()),
            Self::Int(v) => Some((*v).into()),
            Self::Float(v) => Some((*v).into()),
            Self::Text(v) => Some(v.clone().into()),
            Self::DateTime(v) => Some((*v).into()),
            Self::DateTimeOffset(v) => Some((*v).into()),
            Self::NaiveDateTime(v) => Some((*v).into()),
            Self::Date(v) => Some((*v).into()),
            Self::Uuid(v) => Some((*v).into()),
        }
    }

    /// Convert a Sea-ORM value read from a model.
    ///
    /// Returns `None` for value types a cursor cannot carry (JSON, binary, ...);
    /// such keys are left out of the payload.
    #[must_use]
    pub fn from_query_value(value: Value) -> Option<Self> {
        fn present<T>(value: Option<T>, f: impl FnOnce(T) -> CursorValue) -> Option<CursorValue> {
            Some(value.map_or(CursorValue::Null, f))
        }

        match value {
            Value::Bool(v) => present(v, Self::Bool),
            Value::TinyInt(v) => present(v, |v| Self::Int(v.into())),
            Value::SmallInt(v) => present(v, |v| Self::Int(v.into())),
            Value::Int(v) => present(v, |v| Self::Int(v.into())),
            Value::BigInt(v) => present(v, Self::Int),
            Value::TinyUnsigned(v) => present(v, |v| Self::Int(v.into())),
            Value::SmallUnsigned(v) => present(v, |v| Self::Int(v.into())),
            Value::Unsigned(v) => present(v, |v| Self::Int(v.into())),
            Value::BigUnsigned(v) => match v {
                None => Some(Self::Null),
                Some(v) => i64::try_from(v).ok().map(Self::Int),
            },
            Value::Float(v) => present(v, |v| Self::Float(v.into())),
            Value::Double(v) => present(v, Self::Float),
            Value::String(v) => present(v, |v| Self::Text(v.to_string())),
            Value::Char(v) => present(v, |v| Self::Text(v.to_string())),
            Value::ChronoDate(v) => present(v, |v| {
                let date: &NaiveDate = &v;
                Self::Date(*date)
            }),
            Value::ChronoDateTime(v) => present(v, |v| {
                let datetime: &NaiveDateTime = &v;
                Self::NaiveDateTime(*datetime)
            }),
            Value::ChronoDateTimeUtc(v) => present(v, |v| {
                let datetime: &DateTime<Utc> = &v;
                Self::DateTime(*datetime)
            }),
            Value::ChronoDateTimeWithTimeZone(v) => present(v, |v| {
                let datetime: &DateTime<FixedOffset> = &v;
                Self::DateTimeOffset(*datetime)
            }),
            Value::ChronoDateTimeLocal(v) => present(v, |v| Self::DateTimeOffset(v.fixed_offset())),
            Value::Uuid(v) => present(v, |v| {
                let uuid: &Uuid = &v;
                Self::Uuid(*uuid)
            }),
            _ => None,
        }
    }
}

impl From<bool> for CursorValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for CursorValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<i64> for CursorValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for CursorValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for CursorValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CursorValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<DateTime<Utc>> for CursorValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

impl From<DateTime<FixedOffset>> for CursorValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self::DateTimeOffset(value)
    }
}

impl From<NaiveDateTime> for CursorValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::NaiveDateTime(value)
    }
}

impl From<NaiveDate> for CursorValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<Uuid> for CursorValue {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl<T: Into<CursorValue>> From<Option<T>> for CursorValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// How to read a raw result column back into a `CursorValue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    I16,
    I32,
    I64,
    F32,
    F64,
    Text,
    Date,
    DateTime,
    DateTimeUtc,
    DateTimeOffset,
    Uuid,
}

impl ValueKind {
    /// Reader for a declared column type; `None` for types a cursor cannot carry
    #[must_use]
    pub fn from_column_type(column_type: &ColumnType) -> Option<Self> {
        match column_type {
            ColumnType::Boolean => Some(Self::Bool),
            ColumnType::TinyInteger | ColumnType::SmallInteger => Some(Self::I16),
            ColumnType::Integer => Some(Self::I32),
            ColumnType::BigInteger
            | ColumnType::TinyUnsigned
            | ColumnType::SmallUnsigned
            | ColumnType::Unsigned
            | ColumnType::BigUnsigned => Some(Self::I64),
            ColumnType::Float => Some(Self::F32),
            ColumnType::Double => Some(Self::F64),
            ColumnType::Char(_) | ColumnType::String(_) | ColumnType::Text => Some(Self::Text),
            ColumnType::Date => Some(Self::Date),
            ColumnType::DateTime | ColumnType::Timestamp => Some(Self::DateTime),
            ColumnType::TimestampWithTimeZone => Some(Self::DateTimeOffset),
            ColumnType::Uuid => Some(Self::Uuid),
            _ => None,
        }
    }

    /// Read `column` from a raw row. A decode failure yields `None` (unknown).
    #[must_use]
    pub fn read(self, row: &QueryResult, column: &str) -> Option<CursorValue> {
        match self {
            Self::Bool => read_as::<bool>(row, column),
            Self::I16 => read_as::<i16>(row, column),
            Self::I32 => read_as::<i32>(row, column),
            Self::I64 => read_as::<i64>(row, column),
            Self::F32 => read_as::<f32>(row, column),
            Self::F64 => read_as::<f64>(row, column),
            Self::Text => read_as::<String>(row, column),
            Self::Date => read_as::<NaiveDate>(row, column),
            Self::DateTime => read_as::<NaiveDateTime>(row, column),
            Self::DateTimeUtc => read_as::<DateTime<Utc>>(row, column),
            Self::DateTimeOffset => read_as::<DateTime<FixedOffset>>(row, column),
            Self::Uuid => read_as::<Uuid>(row, column),
        }
    }
}

fn read_as<T>(row: &QueryResult, column: &str) -> Option<CursorValue>
where
    T: TryGetable + Into<Value>,
{
    match row.try_get::<Option<T>>("", column) {
        Ok(None) => Some(CursorValue::Null),
        Ok(Some(value)) => CursorValue::from_query_value(value.into()),
        Err(err) => {
            tracing::debug!(column, error = ?err, "Could not read cursor column");
            None
        }
    }
}
