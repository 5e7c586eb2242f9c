//! Composition engine error types.

use object::InstanceId;
use thiserror::Error;

/// Composition errors.
///
/// `Collision` and `MissingDependency` are never caught inside the engine;
/// they surface to the caller of `add()` with whatever hooks and member
/// installs already ran left in effect. There is no automatic rollback.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A member name already exists on the target instance.
    #[error("member `{conflicting_name}` already exists on instance #{object} while adding `{capability}`")]
    Collision {
        object: InstanceId,
        capability: String,
        conflicting_name: String,
    },

    /// A declared prerequisite capability is not implemented on the target.
    #[error("capability `{capability}` requires `{missing}`, which is not implemented on instance #{object}")]
    MissingDependency {
        object: InstanceId,
        capability: String,
        missing: String,
    },

    /// A member name was declared twice on the same capability.
    #[error("capability `{capability}` already defines member `{name}`")]
    DuplicateMember { capability: String, name: String },

    /// An object-level failure (method invocation, state access).
    #[error(transparent)]
    Object(#[from] object::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
