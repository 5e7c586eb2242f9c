//! Computation combinators built on the composition engine.
//!
//! Three computation families share one bind/return contract:
//!
//! - [`Sequence`] — ordered-collection semantics; `bind` maps every element
//!   and concatenates the results (one level of flattening).
//! - [`Optional`] — present-or-absent; `bind` short-circuits on absence.
//! - [`Fallible`] — success-or-failure; `bind` short-circuits on failure and
//!   captures continuation faults into failed instances.
//!
//! Each family is an ordinary client of the engine: a capability that brings
//! the presence tracker, seeds its per-instance payload from named
//! construction parameters in its constructor hook, and exposes part of its
//! surface as method members on the composed instance. The typed wrappers
//! hold the composed instance behind an `Rc`, so "returns the same instance
//! unchanged" is literal identity on short-circuit paths.
//!
//! The "return" half of the contract is [`Computation::pure`]. Generic code
//! re-wraps bare values through it, which stands in for handing every
//! continuation a pre-bound return.

mod fallible;
mod fault;
mod optional;
mod sequence;

pub use fallible::Fallible;
pub use fault::ComputationFault;
pub use optional::Optional;
pub use sequence::Sequence;

pub mod capabilities {
    //! The capability behind each computation family.

    pub use crate::fallible::capability as fallible;
    pub use crate::optional::capability as optional;
    pub use crate::sequence::capability as sequence;
}

use serde_json::Value;

/// The shared bind/return contract.
///
/// `pure` wraps a bare value as a minimal computation instance of the
/// implementing family. `bind` is defined per family because the families
/// differ in short-circuiting and fault handling.
pub trait Computation: Clone + Sized {
    /// Wrap a bare value ("return").
    fn pure(value: Value) -> engine::Result<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // A continuation written once against the contract, reused across
    // families by re-wrapping through `pure`.
    fn relabel<C: Computation>(value: &Value) -> engine::Result<C> {
        C::pure(json!(format!("tagged:{value}")))
    }

    #[test]
    fn pure_is_generic_across_families() {
        let seq = Sequence::pure(json!(1)).unwrap();
        let bound = seq.bind(|v| relabel::<Sequence>(v)).unwrap();
        assert_eq!(bound.items(), vec![json!("tagged:1")]);

        let opt = Optional::pure(json!(1)).unwrap();
        let bound = opt.bind(|v| relabel::<Optional>(v)).unwrap();
        assert_eq!(bound.extract(), Some(json!("tagged:1")));

        let ok = Fallible::pure(json!(1)).unwrap();
        let bound = ok.bind(|v| Ok(relabel::<Fallible>(v)?)).unwrap();
        assert_eq!(bound.extract(), Some(json!("tagged:1")));
    }

    #[test]
    fn families_compose_distinct_capabilities() {
        let ids = [
            capabilities::sequence().id(),
            capabilities::optional().id(),
            capabilities::fallible().id(),
        ];
        assert!(ids[0] != ids[1] && ids[1] != ids[2] && ids[0] != ids[2]);
    }
}
