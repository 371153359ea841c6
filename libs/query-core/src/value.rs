//! Declared attribute types and coercion of raw request text into them.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Comparable type of a basic attribute, as declared by the record schema.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AttrType {
    String,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Decimal,
    Bool,
    Uuid,
    Date,
    Time,
    DateTime,
    DateTimeUtc,
    /// Enumeration stored by variant name.
    Enum(Vec<String>),
}

impl AttrType {
    pub fn name(&self) -> &'static str {
        match self {
            AttrType::String => "string",
            AttrType::TinyInt => "tinyint",
            AttrType::SmallInt => "smallint",
            AttrType::Int => "int",
            AttrType::BigInt => "bigint",
            AttrType::Float => "float",
            AttrType::Double => "double",
            AttrType::Decimal => "decimal",
            AttrType::Bool => "bool",
            AttrType::Uuid => "uuid",
            AttrType::Date => "date",
            AttrType::Time => "time",
            AttrType::DateTime => "datetime",
            AttrType::DateTimeUtc => "datetime_utc",
            AttrType::Enum(_) => "enum",
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, AttrType::String)
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A raw value after coercion into its attribute's declared type.
#[derive(Clone, Debug, PartialEq)]
pub enum TypedValue {
    String(String),
    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
    Bool(bool),
    Uuid(Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    DateTimeUtc(DateTime<Utc>),
    /// Canonical variant name.
    Enum(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot coerce {raw:?} into {target}: {reason}")]
pub struct ValueCoercionError {
    pub target: &'static str,
    pub raw: String,
    pub reason: String,
}

impl ValueCoercionError {
    fn new(target: &AttrType, raw: &str, reason: impl fmt::Display) -> Self {
        Self {
            target: target.name(),
            raw: raw.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type CoercionResult<T> = Result<T, ValueCoercionError>;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];

/// Coerce one raw value into `target`.
///
/// Strings pass through untouched; every other type is parsed from the
/// trimmed text.
pub fn coerce(target: &AttrType, raw: &str) -> CoercionResult<TypedValue> {
    let s = raw.trim();
    let fail = |reason: &dyn fmt::Display| ValueCoercionError::new(target, raw, reason);

    Ok(match target {
        AttrType::String => TypedValue::String(raw.to_string()),
        AttrType::TinyInt => TypedValue::TinyInt(s.parse::<i8>().map_err(|e| fail(&e))?),
        AttrType::SmallInt => TypedValue::SmallInt(s.parse::<i16>().map_err(|e| fail(&e))?),
        AttrType::Int => TypedValue::Int(s.parse::<i32>().map_err(|e| fail(&e))?),
        AttrType::BigInt => TypedValue::BigInt(s.parse::<i64>().map_err(|e| fail(&e))?),
        AttrType::Float => {
            let f = s.parse::<f32>().map_err(|e| fail(&e))?;
            if !f.is_finite() {
                return Err(fail(&"not a finite number"));
            }
            TypedValue::Float(f)
        }
        AttrType::Double => {
            let f = s.parse::<f64>().map_err(|e| fail(&e))?;
            if !f.is_finite() {
                return Err(fail(&"not a finite number"));
            }
            TypedValue::Double(f)
        }
        AttrType::Decimal => {
            let d = Decimal::from_str_exact(s)
                .or_else(|_| s.parse::<Decimal>())
                .or_else(|_| Decimal::from_scientific(s))
                .map_err(|e| fail(&e))?;
            TypedValue::Decimal(d)
        }
        AttrType::Bool => TypedValue::Bool(parse_bool(s).ok_or_else(|| fail(&"not a boolean"))?),
        AttrType::Uuid => TypedValue::Uuid(Uuid::parse_str(s).map_err(|e| fail(&e))?),
        AttrType::Date => {
            TypedValue::Date(NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| fail(&e))?)
        }
        AttrType::Time => TypedValue::Time(parse_time(s).ok_or_else(|| fail(&"not a time"))?),
        AttrType::DateTime => {
            let dt = DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.naive_utc())
                .ok()
                .or_else(|| parse_naive_datetime(s))
                .ok_or_else(|| fail(&"not a datetime"))?;
            TypedValue::DateTime(dt)
        }
        AttrType::DateTimeUtc => {
            let dt = DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| parse_naive_datetime(s).map(|naive| Utc.from_utc_datetime(&naive)))
                .ok_or_else(|| fail(&"not a datetime"))?;
            TypedValue::DateTimeUtc(dt)
        }
        AttrType::Enum(variants) => {
            let variant = variants
                .iter()
                .find(|v| v.eq_ignore_ascii_case(s))
                .ok_or_else(|| fail(&"unknown variant"))?;
            TypedValue::Enum(variant.clone())
        }
    })
}

/// Coerce every raw value; the first failure aborts the whole list.
pub fn coerce_many<S: AsRef<str>>(target: &AttrType, raws: &[S]) -> CoercionResult<Vec<TypedValue>> {
    raws.iter().map(|raw| coerce(target, raw.as_ref())).collect()
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
}

fn parse_naive_datetime(s: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
