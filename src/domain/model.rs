// src/domain/model.rs

//! Device model and attribute value types.
//!
//! A device model names the attributes a virtual device exposes, the kind of
//! value each attribute holds, and an optional inclusive range for numeric
//! attributes. Models are identified by URN and are supplied by the
//! device-management endpoint; this module only describes them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// The kind of value an attribute holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    Integer,
    Number,
    Boolean,
    String,
}

impl AttributeKind {
    /// Lowercase name used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeKind::Integer => "integer",
            AttributeKind::Number => "number",
            AttributeKind::Boolean => "boolean",
            AttributeKind::String => "string",
        }
    }
}

/// A single attribute declared by a [`DeviceModel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSpec {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: AttributeKind,

    /// Inclusive `[min, max]` for numeric attributes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<(f64, f64)>,
}

/// A device model, keyed by URN.
///
/// # Example
///
/// ```
/// use sensor_agent::DeviceModel;
///
/// let model = DeviceModel::from_json(r#"{
///     "urn": "urn:example:thermometer",
///     "name": "Thermometer",
///     "attributes": [
///         { "name": "temperature", "type": "integer", "range": [-20.0, 80.0] }
///     ]
/// }"#).unwrap();
///
/// assert!(model.attribute("temperature").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceModel {
    pub urn: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub attributes: Vec<AttributeSpec>,
}

impl DeviceModel {
    // ---

    /// Parse a model from its JSON document.
    pub fn from_json(document: &str) -> Result<Self> {
        Ok(serde_json::from_str(document)?)
    }

    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    /// Check every value of `update` against the model.
    ///
    /// Only the shape is checked here: the attribute must exist and the
    /// value kind must match. Range limits are a server-side concern and are
    /// reported asynchronously, see [`DeviceModel::out_of_range`].
    pub fn validate(&self, update: &AttributeUpdate) -> Result<()> {
        // ---
        for (name, value) in update.iter() {
            let Some(spec) = self.attribute(name) else {
                return Err(Error::UnknownAttribute {
                    attribute: name.to_string(),
                    model_urn: self.urn.clone(),
                });
            };

            if !value.fits(spec.kind) {
                return Err(Error::TypeMismatch {
                    attribute: name.to_string(),
                    expected: spec.kind.as_str(),
                });
            }
        }
        Ok(())
    }

    /// Names of the attributes in `update` whose values fall outside the
    /// model's declared range.
    pub fn out_of_range<'a>(&self, update: &'a AttributeUpdate) -> Vec<(&'a str, &'a AttributeValue)> {
        // ---
        update
            .iter()
            .filter(|(name, value)| {
                let range = self.attribute(name).and_then(|spec| spec.range);
                match (range, value.as_f64()) {
                    (Some((min, max)), Some(v)) => v < min || v > max,
                    _ => false,
                }
            })
            .collect()
    }
}

/// A value submitted for one virtual-device attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Integer(i64),
    Number(f64),
    Boolean(bool),
    Text(String),
}

impl AttributeValue {
    // ---

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Integer(v) => Some(*v as f64),
            AttributeValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Integers are accepted where the model declares a number.
    fn fits(&self, kind: AttributeKind) -> bool {
        matches!(
            (self, kind),
            (AttributeValue::Integer(_), AttributeKind::Integer)
                | (AttributeValue::Integer(_), AttributeKind::Number)
                | (AttributeValue::Number(_), AttributeKind::Number)
                | (AttributeValue::Boolean(_), AttributeKind::Boolean)
                | (AttributeValue::Text(_), AttributeKind::String)
        )
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Integer(v) => write!(f, "{v}"),
            AttributeValue::Number(v) => write!(f, "{v}"),
            AttributeValue::Boolean(v) => write!(f, "{v}"),
            AttributeValue::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Integer(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::Integer(value.into())
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Boolean(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

/// A batch of attribute values submitted in one synchronous call.
///
/// Order is preserved. Setting the same attribute twice keeps the last value
/// in the position of the first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeUpdate {
    values: Vec<(String, AttributeValue)>,
}

impl AttributeUpdate {
    // ---

    pub fn new() -> Self {
        Self::default()
    }

    /// An update carrying exactly one attribute.
    pub fn single(name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        let mut update = Self::new();
        update.insert(name, value);
        update
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        // ---
        let name = name.into();
        let value = value.into();

        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One reading taken from a sensor: a named attribute and its value.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub attribute: String,
    pub value: AttributeValue,
}

impl SensorReading {
    pub fn new(attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// The reading as a one-attribute update.
    pub fn to_update(&self) -> AttributeUpdate {
        AttributeUpdate::single(self.attribute.clone(), self.value.clone())
    }
}
