//! Member descriptors and the slot values they install.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::{Instance, Result};

/// A callable member. The receiving instance is passed explicitly on every
/// invocation, so a method copied onto an instance always resolves `self`
/// to that instance, independent of later composition changes.
pub type Method = Rc<dyn Fn(&mut Instance, &[Value]) -> Result<Value>>;

/// Builds a fresh per-instance state value. Called once per attach so
/// instances never share state through the member table.
pub type StateInit = Rc<dyn Fn() -> Rc<dyn Any>>;

/// A member as declared in a capability's member table.
///
/// Attaching a capability converts each member into a [`SlotValue`] on the
/// target instance: plain values are cloned, methods are shared, and state
/// members produce a fresh value per instance.
#[derive(Clone)]
pub enum Member {
    /// A plain value, cloned onto the instance.
    Value(Value),
    /// A shared callable, invoked through the instance.
    Method(Method),
    /// Per-instance state, built fresh on every attach.
    State(StateInit),
}

impl Member {
    /// A plain-value member.
    pub fn value(value: impl Into<Value>) -> Self {
        Member::Value(value.into())
    }

    /// A method member.
    pub fn method<F>(body: F) -> Self
    where
        F: Fn(&mut Instance, &[Value]) -> Result<Value> + 'static,
    {
        Member::Method(Rc::new(body))
    }

    /// A state member. `init` runs once per attach; the installed slot holds
    /// an `Rc<RefCell<T>>` retrievable through [`Instance::state`].
    pub fn state<T, F>(init: F) -> Self
    where
        T: 'static,
        F: Fn() -> T + 'static,
    {
        Member::State(Rc::new(move || Rc::new(RefCell::new(init())) as Rc<dyn Any>))
    }

    /// Produce the slot value this member installs on an instance.
    pub fn instantiate(&self) -> SlotValue {
        match self {
            Member::Value(value) => SlotValue::Value(value.clone()),
            Member::Method(method) => SlotValue::Method(method.clone()),
            Member::State(init) => SlotValue::State(init()),
        }
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Member::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Member::Method(_) => f.write_str("Method(..)"),
            Member::State(_) => f.write_str("State(..)"),
        }
    }
}

/// A value held in an instance slot.
#[derive(Clone)]
pub enum SlotValue {
    Value(Value),
    Method(Method),
    State(Rc<dyn Any>),
}

impl fmt::Debug for SlotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotValue::Value(value) => f.debug_tuple("Value").field(value).finish(),
            SlotValue::Method(_) => f.write_str("Method(..)"),
            SlotValue::State(_) => f.write_str("State(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_member_builds_fresh_state_per_instantiate() {
        let member = Member::state(Vec::<Value>::new);

        let a = match member.instantiate() {
            SlotValue::State(state) => state,
            other => panic!("expected state slot, got {other:?}"),
        };
        let b = match member.instantiate() {
            SlotValue::State(state) => state,
            other => panic!("expected state slot, got {other:?}"),
        };

        let a = a.downcast::<RefCell<Vec<Value>>>().unwrap();
        let b = b.downcast::<RefCell<Vec<Value>>>().unwrap();
        a.borrow_mut().push(Value::from(1));
        assert!(b.borrow().is_empty());
    }

    #[test]
    fn value_member_clones_on_instantiate() {
        let member = Member::value("north");
        match member.instantiate() {
            SlotValue::Value(value) => assert_eq!(value, Value::from("north")),
            other => panic!("expected value slot, got {other:?}"),
        }
    }
}
