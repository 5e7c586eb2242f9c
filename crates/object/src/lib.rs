//! Dynamic object model for the composition engine.
//!
//! This crate defines the two halves of the engine's data model:
//!
//! - [`Instance`] — an open bag of named slots with no fixed shape. Slots
//!   hold plain values, methods, or typed per-instance state.
//! - [`Member`] — a member as declared in a capability's member table,
//!   converted into a [`SlotValue`] when a capability is attached.
//!
//! Methods receive their instance explicitly on every call, so a method
//! installed on an instance always resolves `self` to that instance even
//! as the instance's composed capabilities change afterwards.
//!
//! Plain values are [`serde_json::Value`], which keeps slots and
//! construction parameters ([`Params`]) serializable and dynamically typed.

mod error;
mod instance;
mod member;

pub use error::{Error, Result};
pub use instance::{Instance, InstanceId, Params};
pub use member::{Member, Method, SlotValue, StateInit};
