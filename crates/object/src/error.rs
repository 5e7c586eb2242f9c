//! Object model error types.

use crate::InstanceId;
use thiserror::Error;

/// Object model errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A slot lookup failed because the name is not defined on the instance.
    #[error("no member named `{name}` on instance #{object}")]
    MissingMember { object: InstanceId, name: String },

    /// An invocation targeted a slot that does not hold a method.
    #[error("member `{name}` on instance #{object} is not callable")]
    NotCallable { object: InstanceId, name: String },

    /// A state slot holds a value of a different type than requested.
    #[error("state slot `{name}` on instance #{object} holds a different type")]
    WrongStateType { object: InstanceId, name: String },

    /// A method or hook body failed.
    #[error("invocation failed: {0}")]
    Invocation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
