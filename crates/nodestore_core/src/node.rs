//! Node data model and the record serializer boundary.

use crate::error::{NodeStoreError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Property holding a node's externally visible identity.
pub const UUID_PROPERTY: &str = "jcr:uuid";

/// Property holding a node's primary type name.
pub const PRIMARY_TYPE_PROPERTY: &str = "jcr:primaryType";

/// Declared type tag of a property.
///
/// Only `Reference` and `WeakReference` carry meaning for this layer; the
/// other tags are stored and returned untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PropertyType {
    /// Free text.
    String,
    /// Namespace-qualified name.
    Name,
    /// Strong reference to another node's `jcr:uuid`.
    Reference,
    /// Weak reference to another node's `jcr:uuid`.
    WeakReference,
    /// 64-bit integer.
    Long,
    /// Floating point number.
    Double,
    /// Boolean flag.
    Boolean,
    /// ISO-8601 timestamp.
    Date,
    /// Binary payload.
    Binary,
    /// Repository path.
    Path,
    /// Any tag not known to this layer, kept verbatim.
    Other(String),
}

impl PropertyType {
    /// Tag name as persisted.
    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "String",
            Self::Name => "Name",
            Self::Reference => "Reference",
            Self::WeakReference => "WeakReference",
            Self::Long => "Long",
            Self::Double => "Double",
            Self::Boolean => "Boolean",
            Self::Date => "Date",
            Self::Binary => "Binary",
            Self::Path => "Path",
            Self::Other(tag) => tag,
        }
    }

    /// Returns true for the exact reference tag of the requested strength.
    pub fn is_reference(&self, weak: bool) -> bool {
        if weak {
            *self == Self::WeakReference
        } else {
            *self == Self::Reference
        }
    }
}

impl From<String> for PropertyType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "String" => Self::String,
            "Name" => Self::Name,
            "Reference" => Self::Reference,
            "WeakReference" => Self::WeakReference,
            "Long" => Self::Long,
            "Double" => Self::Double,
            "Boolean" => Self::Boolean,
            "Date" => Self::Date,
            "Binary" => Self::Binary,
            "Path" => Self::Path,
            _ => Self::Other(tag),
        }
    }
}

impl From<PropertyType> for String {
    fn from(ty: PropertyType) -> Self {
        match ty {
            PropertyType::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for PropertyType {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node's properties and their declared types.
///
/// `types` runs parallel to `properties`: a property without a type entry
/// is treated as untyped and never indexed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Property values by name.
    pub properties: BTreeMap<String, Value>,
    /// Declared type tags by property name.
    pub types: BTreeMap<String, PropertyType>,
}

impl Node {
    /// Creates a node with no properties.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Node::set_property`].
    pub fn with_property(
        mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
        ty: PropertyType,
    ) -> Self {
        self.set_property(name, value, ty);
        self
    }

    /// Sets a property value together with its type tag.
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<Value>, ty: PropertyType) {
        let name = name.into();
        self.properties.insert(name.clone(), value.into());
        self.types.insert(name, ty);
    }

    /// Removes a property and its type tag.
    pub fn remove_property(&mut self, name: &str) -> Option<Value> {
        self.types.remove(name);
        self.properties.remove(name)
    }

    /// Value of a property.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Declared type of a property.
    pub fn property_type(&self, name: &str) -> Option<&PropertyType> {
        self.types.get(name)
    }

    /// The node's `jcr:uuid`, if present as a string.
    pub fn uuid(&self) -> Option<&str> {
        self.properties.get(UUID_PROPERTY).and_then(Value::as_str)
    }

    /// Every (property name, target UUID) pair of the given reference
    /// strength.
    ///
    /// Multi-valued references yield one pair per string element; values
    /// that aren't strings are ignored.
    pub fn references(&self, weak: bool) -> Vec<(&str, &str)> {
        let mut out = Vec::new();
        for (name, ty) in &self.types {
            if !ty.is_reference(weak) {
                continue;
            }
            match self.properties.get(name) {
                Some(Value::String(target)) => out.push((name.as_str(), target.as_str())),
                Some(Value::Array(values)) => {
                    out.extend(values.iter().filter_map(Value::as_str).map(|t| (name.as_str(), t)))
                }
                _ => {}
            }
        }
        out
    }
}

/// The persisted form of a node: its content plus the storage-local
/// internal UUID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Storage-local identity, never handed to callers of the node store.
    pub internal_uuid: String,
    /// Node content.
    pub node: Node,
}

/// Converts node records to and from bytes.
///
/// Implementations must round-trip exactly: `decode(encode(r)) == r`.
pub trait NodeSerializer: Send + Sync {
    /// Encodes a record.
    fn encode(&self, record: &NodeRecord) -> Result<Vec<u8>>;

    /// Decodes a record, returning the failure reason on malformed input.
    ///
    /// A decoded record is guaranteed to carry a string `jcr:uuid`.
    fn decode(&self, data: &[u8]) -> std::result::Result<NodeRecord, String>;
}

/// Pretty-printed JSON records.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonNodeSerializer;

impl NodeSerializer for JsonNodeSerializer {
    fn encode(&self, record: &NodeRecord) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(record).map_err(|e| NodeStoreError::Serialization(e.to_string()))
    }

    fn decode(&self, data: &[u8]) -> std::result::Result<NodeRecord, String> {
        let record: NodeRecord = serde_json::from_slice(data).map_err(|e| e.to_string())?;
        if record.node.uuid().is_none() {
            return Err(format!("missing string property {}", UUID_PROPERTY));
        }
        Ok(record)
    }
}
