//! Constructor factories that compose a capability onto new instances.

use std::rc::Rc;

use object::{Instance, Params};
use tracing::debug;

use crate::{Capability, Result};

/// A constructor for instances pre-composed with a capability.
///
/// Calling [`Factory::construct`] obtains a starting instance from the base
/// factory (default: bare allocation), records the arguments bag as the
/// instance's construction parameters, then composes the associated
/// capability through its full add pipeline. Constructor hooks read named
/// arguments through [`Instance::construction_parameters`].
pub struct Factory {
    base: Option<Rc<Factory>>,
    capability: Capability,
}

impl Factory {
    /// A factory over bare allocation.
    pub fn new(capability: Capability) -> Self {
        Self {
            base: None,
            capability,
        }
    }

    /// A factory chained onto a base factory. The base runs first with the
    /// same arguments bag.
    pub fn derive(base: Rc<Factory>, capability: Capability) -> Self {
        Self {
            base: Some(base),
            capability,
        }
    }

    /// The capability this factory composes.
    pub fn capability(&self) -> &Capability {
        &self.capability
    }

    /// Build a finished instance from a bag of named arguments.
    pub fn construct(&self, params: Params) -> Result<Instance> {
        let mut obj = match &self.base {
            Some(base) => base.construct(params.clone())?,
            None => Instance::new(),
        };
        debug!(capability = %self.capability.name(), object = %obj.id(), "construct");
        obj.set_construction_parameters(params);
        self.capability.create_on(obj)
    }
}
