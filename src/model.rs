//! Tagged attribute values and the stored record type.

use std::collections::BTreeMap;
use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Scalar kind carried by every record attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    Str,
    Int,
    Float,
}

impl AttrKind {
    /// Zero value of this kind, used when seeding class defaults.
    pub fn default_value(self) -> AttrValue {
        match self {
            AttrKind::Str => AttrValue::Str(String::new()),
            AttrKind::Int => AttrValue::Int(0),
            AttrKind::Float => AttrValue::Float(0.0),
        }
    }

    fn type_name(self) -> &'static str {
        match self {
            AttrKind::Str => "string",
            AttrKind::Int => "integer",
            AttrKind::Float => "float",
        }
    }
}

/// One attribute value.
///
/// Serialized untagged so the storage file keeps plain JSON scalars.
/// Variant order matters: integers must be tried before floats when
/// deserializing, otherwise every whole number comes back as a float.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Str(String),
}

/// Failure to convert a value into the kind an existing attribute carries.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot convert `{raw}` into {target}")]
pub struct ConvertError {
    target: &'static str,
    raw: String,
}

impl AttrValue {
    pub fn kind(&self) -> AttrKind {
        match self {
            AttrValue::Str(_) => AttrKind::Str,
            AttrValue::Int(_) => AttrKind::Int,
            AttrValue::Float(_) => AttrKind::Float,
        }
    }

    /// Convert this value into `target` kind.
    ///
    /// Numeric conversions truncate floats toward zero; string sources are
    /// trimmed and parsed. Any value converts into a string.
    pub fn convert(self, target: AttrKind) -> Result<AttrValue, ConvertError> {
        match (self, target) {
            (v @ AttrValue::Int(_), AttrKind::Int) => Ok(v),
            (v @ AttrValue::Float(_), AttrKind::Float) => Ok(v),
            (AttrValue::Float(f), AttrKind::Int) => Ok(AttrValue::Int(f as i64)),
            (AttrValue::Int(i), AttrKind::Float) => Ok(AttrValue::Float(i as f64)),
            (AttrValue::Str(s), AttrKind::Int) => match s.trim().parse::<i64>() {
                Ok(i) => Ok(AttrValue::Int(i)),
                Err(_) => Err(ConvertError {
                    target: target.type_name(),
                    raw: s,
                }),
            },
            (AttrValue::Str(s), AttrKind::Float) => match s.trim().parse::<f64>() {
                Ok(f) => Ok(AttrValue::Float(f)),
                Err(_) => Err(ConvertError {
                    target: target.type_name(),
                    raw: s,
                }),
            },
            (v, AttrKind::Str) => Ok(AttrValue::Str(v.to_string())),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(s) => f.write_str(s),
            AttrValue::Int(i) => write!(f, "{}", i),
            // {:?} keeps the decimal point on whole floats (0.0, not 0)
            AttrValue::Float(x) => write!(f, "{:?}", x),
        }
    }
}

fn now_iso() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// One stored entity instance of a known class.
///
/// Every record carries `id`, `created_at` and `updated_at` attributes from
/// birth; class-specific defaults are seeded by the registry. The attribute
/// map is ordered so rendering and persistence stay deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "__class__")]
    class: String,
    #[serde(flatten)]
    attrs: BTreeMap<String, AttrValue>,
}

impl Record {
    /// Create a record of `class` with a fresh UUID and current timestamps.
    pub fn new(class: impl Into<String>) -> Self {
        let now = now_iso();
        let mut attrs = BTreeMap::new();
        attrs.insert(
            "id".to_string(),
            AttrValue::Str(Uuid::new_v4().to_string()),
        );
        attrs.insert("created_at".to_string(), AttrValue::Str(now.clone()));
        attrs.insert("updated_at".to_string(), AttrValue::Str(now));
        Self {
            class: class.into(),
            attrs,
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    /// The record's id attribute, or an empty string for a record that was
    /// deserialized without one.
    pub fn id(&self) -> &str {
        match self.attrs.get("id") {
            Some(AttrValue::Str(s)) => s,
            _ => "",
        }
    }

    /// Identity key under which the store holds this record.
    pub fn key(&self) -> String {
        format!("{}.{}", self.class, self.id())
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// Insert or replace an attribute without any kind check.
    pub fn set(&mut self, name: impl Into<String>, value: AttrValue) {
        self.attrs.insert(name.into(), value);
    }

    /// Apply an update to one attribute.
    ///
    /// When the attribute already exists the incoming value is converted to
    /// the existing kind; a conversion failure leaves the record untouched.
    /// Unknown attributes are created with the incoming value as-is.
    pub fn update_attr(&mut self, name: &str, value: AttrValue) -> Result<(), ConvertError> {
        let coerced = match self.attrs.get(name) {
            Some(existing) => value.convert(existing.kind())?,
            None => value,
        };
        self.attrs.insert(name.to_string(), coerced);
        Ok(())
    }

    /// Refresh `updated_at`. Called after every successful mutation.
    pub fn touch(&mut self) {
        self.attrs
            .insert("updated_at".to_string(), AttrValue::Str(now_iso()));
    }
}

impl fmt::Display for Record {
    /// Renders as `[Class] (id) {'attr': value, ...}` with string values
    /// quoted and numbers bare.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ({}) {{", self.class, self.id())?;
        for (i, (name, value)) in self.attrs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match value {
                AttrValue::Str(s) => write!(f, "'{}': '{}'", name, s)?,
                other => write!(f, "'{}': {}", name, other)?,
            }
        }
        write!(f, "}}")
    }
}
