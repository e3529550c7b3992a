//! Middleware descriptors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Descriptive fields attached to a middleware unit.
///
/// A descriptor never influences execution. It feeds the per-step tracing
/// output and the tree returned by [`hierarchy`](crate::hierarchy). Absence
/// is valid: an unannotated unit still executes and still appears in the
/// tree, just without identifying info.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    fields: BTreeMap<String, String>,
}

impl Meta {
    /// A descriptor with a display name.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), fields: BTreeMap::new() }
    }

    /// Adds an open key/value field. Returns `self` for chaining.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// The display name, if one was set.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Looks up an open field.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_name_and_fields() {
        let meta = Meta::named("auth").field("kind", "gate").field("team", "platform");
        assert_eq!(meta.name(), Some("auth"));
        assert_eq!(meta.get("kind"), Some("gate"));
        assert_eq!(meta.get("missing"), None);
    }

    #[test]
    fn empty_fields_are_not_serialized() {
        let json = serde_json::to_value(Meta::named("auth")).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "auth" }));
    }
}
