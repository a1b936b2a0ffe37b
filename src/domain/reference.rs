use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

/// Opaque identifier of an external identity (user, object, list, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceId(pub String);

impl ReferenceId {
    pub fn new(id: impl Into<String>) -> Self {
        ReferenceId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interpret a loosely-typed trace value as a reference.
    ///
    /// Strings and legacy numeric ids are accepted; null, empty strings and
    /// anything else yield `None`.
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(ReferenceId(s.clone())),
            Value::Number(n) => Some(ReferenceId(n.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ReferenceId {
    fn from(id: &str) -> Self {
        ReferenceId::new(id)
    }
}

fn references_in(values: &[Value]) -> Vec<ReferenceId> {
    values.iter().filter_map(ReferenceId::from_value).collect()
}

/// Target of an applied action.
///
/// Recorded traces store this as null, a single id, or a list of ids.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Target {
    #[default]
    None,
    Single(ReferenceId),
    Multi(Vec<ReferenceId>),
}

impl Target {
    /// Iterate the flattened set of referenced ids.
    pub fn ids(&self) -> impl Iterator<Item = &ReferenceId> {
        let ids: &[ReferenceId] = match self {
            Target::None => &[],
            Target::Single(id) => std::slice::from_ref(id),
            Target::Multi(ids) => ids,
        };
        ids.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.ids().next().is_none()
    }

    /// Returns true if any targeted id is in `set`.
    pub fn intersects<S: std::hash::BuildHasher>(&self, set: &HashSet<ReferenceId, S>) -> bool {
        self.ids().any(|id| set.contains(id))
    }
}

impl Serialize for Target {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Target::None => serializer.serialize_none(),
            Target::Single(id) => id.serialize(serializer),
            Target::Multi(ids) => ids.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Target {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Array(items) => Target::Multi(references_in(&items)),
            other => ReferenceId::from_value(&other)
                .map(Target::Single)
                .unwrap_or_default(),
        })
    }
}

/// Value a condition was tested against.
///
/// Only list values are treated as identity references; scalars are
/// display strings, numbers or flags.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TestValue {
    #[default]
    Null,
    Scalar(Value),
    List(Vec<ReferenceId>),
}

impl TestValue {
    /// Referenced ids, empty unless this is a list.
    pub fn reference_ids(&self) -> &[ReferenceId] {
        match self {
            TestValue::List(ids) => ids,
            TestValue::Null | TestValue::Scalar(_) => &[],
        }
    }
}

impl Serialize for TestValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TestValue::Null => serializer.serialize_none(),
            TestValue::Scalar(value) => value.serialize(serializer),
            TestValue::List(ids) => ids.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for TestValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Null => TestValue::Null,
            Value::Array(items) => TestValue::List(references_in(&items)),
            // Maps have no defined meaning here; keep them out of the reference path.
            Value::Object(_) => TestValue::Null,
            scalar => TestValue::Scalar(scalar),
        })
    }
}
