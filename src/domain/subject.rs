use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::reference::ReferenceId;

/// Object the rules were evaluated against, as captured at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    /// Reference to the evaluated object
    pub identifier: ReferenceId,

    /// Display name of the object
    #[serde(default)]
    pub name: String,

    /// Object type (e.g., "commit", "differential")
    #[serde(rename = "type", default)]
    pub object_type: String,

    /// Field values the rules could test against
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl Subject {
    pub fn new(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Subject {
            identifier: ReferenceId::new(identifier),
            name: name.into(),
            object_type: String::new(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style setter for the object type.
    pub fn with_type(mut self, object_type: impl Into<String>) -> Self {
        self.object_type = object_type.into();
        self
    }

    /// Builder-style setter for a single field value.
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }
}
