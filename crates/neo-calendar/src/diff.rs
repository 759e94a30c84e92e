//! Field-level diff between version snapshots.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::version::EventVersion;

/// Old and new value of one field. A side missing from its snapshot is `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub old: Value,
    pub new: Value,
}

/// Differences between two versions of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDiff {
    pub version1: u32,
    pub version2: u32,
    pub changes: BTreeMap<String, FieldChange>,
}

impl EventDiff {
    /// Compare `from` to `to`. Reversing the arguments reverses the changes.
    pub fn between(from: &EventVersion, to: &EventVersion) -> Self {
        Self {
            version1: from.version_number,
            version2: to.version_number,
            changes: diff_data(&from.data, &to.data),
        }
    }

    /// Check if the versions are identical in every tracked field.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Shallow diff of two JSON objects over the union of their keys.
///
/// Non-object values are treated as empty objects.
pub fn diff_data(old: &Value, new: &Value) -> BTreeMap<String, FieldChange> {
    let empty = serde_json::Map::new();
    let old = old.as_object().unwrap_or(&empty);
    let new = new.as_object().unwrap_or(&empty);

    let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();

    keys.into_iter()
        .filter_map(|key| {
            let before = old.get(key).unwrap_or(&Value::Null);
            let after = new.get(key).unwrap_or(&Value::Null);
            (before != after).then(|| {
                (
                    key.clone(),
                    FieldChange {
                        old: before.clone(),
                        new: after.clone(),
                    },
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_diff_changed_fields() {
        let old = json!({"title": "A", "location": "X", "is_recurring": false});
        let new = json!({"title": "B", "location": "X", "is_recurring": false});

        let changes = diff_data(&old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes["title"].old, json!("A"));
        assert_eq!(changes["title"].new, json!("B"));
    }

    #[test]
    fn test_diff_missing_keys() {
        let old = json!({"title": "A"});
        let new = json!({"title": "A", "location": "Room"});

        let changes = diff_data(&old, &new);
        assert_eq!(
            serde_json::to_value(&changes).unwrap(),
            json!({"location": {"old": null, "new": "Room"}})
        );

        let reverse = diff_data(&new, &old);
        assert_eq!(reverse["location"].old, json!("Room"));
        assert_eq!(reverse["location"].new, Value::Null);
    }

    #[test]
    fn test_diff_nested_values_compared_whole() {
        let old = json!({"recurrence_pattern": {"frequency": "daily", "interval": 1}});
        let new = json!({"recurrence_pattern": {"frequency": "daily", "interval": 2}});

        let changes = diff_data(&old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes["recurrence_pattern"].new["interval"], 2);
    }

    #[test]
    fn test_keys_sorted() {
        let old = json!({"z": 1, "a": 1, "m": 1});
        let new = json!({"z": 2, "a": 2, "m": 2});
        let changes = diff_data(&old, &new);
        let keys: Vec<&str> = changes.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "m", "z"]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_object() -> impl Strategy<Value = Value> {
            let leaf = prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::from),
                any::<i64>().prop_map(Value::from),
                "[a-z]{0,4}".prop_map(Value::from),
            ];
            proptest::collection::btree_map("[a-e]", leaf, 0..5)
                .prop_map(|m| Value::Object(m.into_iter().collect()))
        }

        proptest! {
            #[test]
            fn diff_with_self_is_empty(a in arb_object()) {
                prop_assert!(diff_data(&a, &a).is_empty());
            }

            #[test]
            fn diff_reverses(a in arb_object(), b in arb_object()) {
                let forward = diff_data(&a, &b);
                let backward = diff_data(&b, &a);
                prop_assert_eq!(forward.len(), backward.len());
                for (key, change) in &forward {
                    prop_assert_eq!(&backward[key].old, &change.new);
                    prop_assert_eq!(&backward[key].new, &change.old);
                }
            }
        }
    }
}
