//! Dynamically-shaped object instances.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use serde_json::Value;

use crate::{Error, Result, SlotValue};

/// Named construction arguments, stored on an instance by a factory and read
/// by constructor hooks.
pub type Params = serde_json::Map<String, Value>;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Diagnostics-only identity for an instance. Monotonically increasing
/// within the process; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An open bag of named slots.
///
/// Instances have no fixed shape: capabilities install and remove slots
/// through the composition engine, and a single instance may host members
/// from many capabilities at once. Slot order is insertion order, which
/// keeps composition behavior deterministic.
#[derive(Debug)]
pub struct Instance {
    id: InstanceId,
    slots: IndexMap<String, SlotValue>,
    construction_parameters: Option<Params>,
}

impl Instance {
    /// Allocate a fresh empty instance.
    pub fn new() -> Self {
        Self {
            id: InstanceId(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
            slots: IndexMap::new(),
            construction_parameters: None,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Whether a slot with this name exists, regardless of its kind.
    pub fn has_slot(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn slot(&self, name: &str) -> Option<&SlotValue> {
        self.slots.get(name)
    }

    /// Install a slot, replacing any existing value under the same name.
    ///
    /// This is the raw primitive; the composition engine performs its
    /// collision check before calling it.
    pub fn set_slot(&mut self, name: impl Into<String>, value: SlotValue) {
        self.slots.insert(name.into(), value);
    }

    /// Delete a slot by name. Absent names are a no-op.
    pub fn remove_slot(&mut self, name: &str) -> Option<SlotValue> {
        self.slots.shift_remove(name)
    }

    /// Snapshot of the instance's own slot names.
    pub fn own_keys(&self) -> BTreeSet<String> {
        self.slots.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The plain value under `name`, if that slot holds one.
    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.slots.get(name) {
            Some(SlotValue::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// Invoke the method slot `name` with this instance as the receiver.
    pub fn invoke(&mut self, name: &str, args: &[Value]) -> Result<Value> {
        let method = match self.slots.get(name) {
            Some(SlotValue::Method(method)) => method.clone(),
            Some(_) => {
                return Err(Error::NotCallable {
                    object: self.id,
                    name: name.to_string(),
                });
            }
            None => {
                return Err(Error::MissingMember {
                    object: self.id,
                    name: name.to_string(),
                });
            }
        };
        method(self, args)
    }

    /// Borrow the typed state under `name`.
    pub fn state<T: 'static>(&self, name: &str) -> Result<Rc<RefCell<T>>> {
        match self.slots.get(name) {
            Some(SlotValue::State(state)) => {
                state.clone().downcast::<RefCell<T>>().map_err(|_| Error::WrongStateType {
                    object: self.id,
                    name: name.to_string(),
                })
            }
            Some(_) => Err(Error::WrongStateType {
                object: self.id,
                name: name.to_string(),
            }),
            None => Err(Error::MissingMember {
                object: self.id,
                name: name.to_string(),
            }),
        }
    }

    /// Named arguments recorded by the factory that built this instance.
    pub fn construction_parameters(&self) -> Option<&Params> {
        self.construction_parameters.as_ref()
    }

    pub fn set_construction_parameters(&mut self, params: Params) {
        self.construction_parameters = Some(params);
    }

    /// A single named construction argument.
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.construction_parameters.as_ref().and_then(|p| p.get(key))
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Member;

    #[test]
    fn instance_ids_are_unique_and_increasing() {
        let a = Instance::new();
        let b = Instance::new();
        assert!(b.id() > a.id());
    }

    #[test]
    fn invoke_passes_the_receiver() {
        let mut obj = Instance::new();
        obj.set_slot("count", SlotValue::Value(Value::from(1)));
        obj.set_slot(
            "bump",
            Member::method(|obj, _args| {
                let next = obj.value("count").and_then(Value::as_i64).unwrap_or(0) + 1;
                obj.set_slot("count", SlotValue::Value(Value::from(next)));
                Ok(Value::from(next))
            })
            .instantiate(),
        );

        assert_eq!(obj.invoke("bump", &[]).unwrap(), Value::from(2));
        assert_eq!(obj.value("count"), Some(&Value::from(2)));
    }

    #[test]
    fn invoke_on_missing_member_errors() {
        let mut obj = Instance::new();
        assert!(matches!(
            obj.invoke("absent", &[]),
            Err(Error::MissingMember { .. })
        ));
    }

    #[test]
    fn invoke_on_plain_value_is_not_callable() {
        let mut obj = Instance::new();
        obj.set_slot("label", SlotValue::Value(Value::from("x")));
        assert!(matches!(
            obj.invoke("label", &[]),
            Err(Error::NotCallable { .. })
        ));
    }

    #[test]
    fn state_downcast_checks_the_type() {
        let mut obj = Instance::new();
        obj.set_slot("counter", Member::state(|| 0u32).instantiate());

        assert!(obj.state::<u32>("counter").is_ok());
        assert!(matches!(
            obj.state::<String>("counter"),
            Err(Error::WrongStateType { .. })
        ));
    }

    #[test]
    fn own_keys_snapshots_slot_names() {
        let mut obj = Instance::new();
        obj.set_slot("a", SlotValue::Value(Value::Null));
        obj.set_slot("b", SlotValue::Value(Value::Null));
        let keys: Vec<_> = obj.own_keys().into_iter().collect();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }
}
