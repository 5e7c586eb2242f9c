//! Runtime capability-composition engine.
//!
//! A [`Capability`] is a named bundle of members (values, methods, or
//! per-instance state) plus four hook lists. The engine grants and revokes
//! capabilities on dynamically-shaped [`object::Instance`]s at runtime:
//!
//! - **No clobber** — attach never overwrites an existing slot; the first
//!   conflicting member name raises [`Error::Collision`].
//! - **Lifecycle pipeline** — `add` runs before-add hooks, member attach,
//!   then after-add hooks; `remove` mirrors it around detach. Hooks run in
//!   registration order.
//! - **Dependencies** — [`Capability::requires`] rejects composition when a
//!   prerequisite is missing; [`Capability::brings`] recursively composes
//!   missing companions through their own pipelines.
//! - **Presence tracking** — the [`rtti`] tracker gives opted-in
//!   capabilities an O(1) per-instance presence index.
//! - **Factories** — a [`Factory`] builds instances pre-composed with a
//!   capability, optionally chaining a base factory and recording named
//!   construction parameters for constructor hooks.
//!
//! Failed pipelines are not rolled back: hooks and member installs that ran
//! before a `Collision` or `MissingDependency` stay in effect, and the error
//! surfaces to the caller of `add()`.
//!
//! The engine is fully single-threaded and synchronous. Composition calls
//! against the same instance must be serialized by the caller; composition
//! of different instances is independent.
//!
//! # Example
//!
//! ```
//! use engine::Capability;
//! use object::Member;
//!
//! let swimmer = Capability::with_members("swimmer", [
//!     ("swim", Member::method(|_obj, _args| Ok("splash".into()))),
//! ]);
//! let diver = Capability::with_members("diver", [
//!     ("dive", Member::method(|_obj, _args| Ok("down".into()))),
//! ]);
//! diver.requires(std::slice::from_ref(&swimmer));
//!
//! let mut obj = swimmer.create()?;
//! diver.add(&mut obj)?;
//! assert_eq!(obj.invoke("dive", &[])?, "down");
//! # Ok::<(), engine::Error>(())
//! ```

mod capability;
mod error;
mod factory;
pub mod rtti;

pub use capability::{Capability, CapabilityId, Hook};
pub use error::{Error, Result};
pub use factory::Factory;
pub use rtti::{INDEX_SLOT, PresenceIndex, is_present, presence_index, track, tracker};
