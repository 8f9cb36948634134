//! Raw wire-document shapes.
//!
//! These serde structs mirror the JSON:API document layout exactly as it
//! appears on the wire and are deliberately separate from the domain
//! model; the serializer turns them into [`Resource`](crate::Resource)
//! graphs. `type` and `id` are parsed as optionals so structural
//! validation can produce precise errors instead of opaque serde
//! messages.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A full response document.
#[derive(Debug, Deserialize)]
pub(crate) struct RawDocument {
    #[serde(default)]
    pub data: Option<RawPrimaryData>,
    #[serde(default)]
    pub included: Option<Vec<RawRecord>>,
    #[serde(default)]
    pub links: Option<RawLinks>,
}

/// The primary data member: a single record or an array of records.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawPrimaryData {
    Many(Vec<RawRecord>),
    One(Box<RawRecord>),
}

/// One resource record.
#[derive(Debug, Deserialize)]
pub(crate) struct RawRecord {
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    pub id: Option<String>,
    #[serde(default)]
    pub attributes: Option<Map<String, Value>>,
    #[serde(default)]
    pub relationships: Option<HashMap<String, RawRelationship>>,
}

/// One relationship entry of a record.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawRelationship {
    #[serde(default)]
    pub data: MaybeLinkage,
}

/// The `data` member of a relationship entry.
///
/// JSON:API distinguishes an absent `data` member (linkage not provided)
/// from `"data": null` (an empty to-one); the serde default covers the
/// absent case.
#[derive(Debug, Default)]
pub(crate) enum MaybeLinkage {
    /// The relationship entry carried no `data` member.
    #[default]
    Absent,
    /// `"data": null`, an explicitly empty to-one.
    Null,
    /// A single `{type, id}` linkage.
    One(RawLinkage),
    /// An array of `{type, id}` linkages.
    Many(Vec<RawLinkage>),
}

impl<'de> Deserialize<'de> for MaybeLinkage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::Null => Ok(Self::Null),
            Value::Object(_) => serde_json::from_value(value)
                .map(Self::One)
                .map_err(serde::de::Error::custom),
            Value::Array(_) => serde_json::from_value(value)
                .map(Self::Many)
                .map_err(serde::de::Error::custom),
            other => Err(serde::de::Error::custom(format!(
                "relationship data must be null, an object, or an array, got {other}"
            ))),
        }
    }
}

/// A single `{type, id}` reference.
#[derive(Debug, Deserialize)]
pub(crate) struct RawLinkage {
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    pub id: Option<String>,
}

/// The top-level `links` member; only pagination links are consumed.
#[derive(Debug, Deserialize)]
pub(crate) struct RawLinks {
    #[serde(default)]
    pub next: Option<Value>,
    #[serde(default)]
    pub prev: Option<Value>,
}

/// Extracts the URL from a link value, which may be a string or an object
/// with an `href` member.
pub(crate) fn link_url(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("href")
            .and_then(Value::as_str)
            .map(ToString::to_string),
        _ => None,
    }
}
