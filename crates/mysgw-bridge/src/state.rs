//! Host item state.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::info;

use crate::value::Value;

/// Where inbound values go and where `req` answers come from.
pub trait StateStore: Send + Sync {
    /// Current value of `item`, if it has one.
    fn current(&self, item: &str) -> Option<Value>;

    /// Record a new value for `item`.
    fn post_update(&self, item: &str, value: Value);
}

/// A state store that keeps the latest value of each item in memory.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryStateStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `item` with `value` without logging an update.
    pub fn insert(&self, item: &str, value: Value) {
        self.values.write().insert(item.to_string(), value);
    }

    /// All values, sorted by item name.
    pub fn snapshot(&self) -> Vec<(String, Value)> {
        let mut entries: Vec<(String, Value)> =
            self.values.read().iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

impl StateStore for MemoryStateStore {
    fn current(&self, item: &str) -> Option<Value> {
        self.values.read().get(item).cloned()
    }

    fn post_update(&self, item: &str, value: Value) {
        info!(item, value = %value, "state update");
        self.values.write().insert(item.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::OnOff;

    #[test]
    fn test_post_and_read_back() {
        let store = MemoryStateStore::new();
        assert_eq!(store.current("Lamp"), None);

        store.post_update("Lamp", Value::OnOff(OnOff::On));
        store.post_update("Temp", Value::Decimal(21.5));
        store.post_update("Lamp", Value::OnOff(OnOff::Off));

        assert_eq!(store.current("Lamp"), Some(Value::OnOff(OnOff::Off)));
        assert_eq!(
            store.snapshot(),
            vec![("Lamp".to_string(), Value::OnOff(OnOff::Off)), ("Temp".to_string(), Value::Decimal(21.5))]
        );
    }

    #[test]
    fn test_insert_seeds_value() {
        let store = MemoryStateStore::new();
        store.insert("Text", Value::Text("hello".into()));
        assert_eq!(store.current("Text"), Some(Value::Text("hello".into())));
    }
}
