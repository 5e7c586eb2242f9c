//! Success-or-failure computations with a fault boundary.

use std::cell::RefCell;
use std::rc::Rc;

use engine::{Capability, Factory};
use object::{Instance, Member, Params};
use serde_json::Value;
use tracing::debug;

use crate::{Computation, ComputationFault};

const STATE_SLOT: &str = "fallible_outcome";

type Outcome = std::result::Result<Value, ComputationFault>;

fn uninitialized() -> Outcome {
    Err(ComputationFault::Aborted {
        reason: "constructed without value or fault".into(),
    })
}

thread_local! {
    static FAMILY: Factory = Factory::new(build_capability());
}

fn build_capability() -> Capability {
    let cap = Capability::with_members(
        "fallible",
        [
            (STATE_SLOT, Member::state(uninitialized)),
            (
                "extract",
                Member::method(|obj, _args| {
                    let state = obj.state::<Outcome>(STATE_SLOT)?;
                    let value = match &*state.borrow() {
                        Ok(value) => value.clone(),
                        Err(_) => Value::Null,
                    };
                    Ok(value)
                }),
            ),
            (
                "get_error",
                Member::method(|obj, _args| {
                    let state = obj.state::<Outcome>(STATE_SLOT)?;
                    let fault = match &*state.borrow() {
                        Ok(_) => return Ok(Value::Null),
                        Err(fault) => fault.clone(),
                    };
                    serde_json::to_value(&fault)
                        .map_err(|e| object::Error::Invocation(format!("fault payload: {e}")))
                }),
            ),
        ],
    );
    // A `value` parameter constructs a success, a `fault` parameter a
    // failure; `value` wins when both are given.
    cap.add_constructor(|obj, _cap| {
        let outcome = if let Some(value) = obj.param("value") {
            Ok(value.clone())
        } else if let Some(raw) = obj.param("fault") {
            let fault = serde_json::from_value(raw.clone())
                .map_err(|e| object::Error::Invocation(format!("fault payload: {e}")))?;
            Err(fault)
        } else {
            uninitialized()
        };
        *obj.state::<Outcome>(STATE_SLOT)?.borrow_mut() = outcome;
        Ok(())
    });
    engine::track(&cap);
    cap
}

/// The fallible capability composed onto every [`Fallible`] instance.
pub fn capability() -> Capability {
    FAMILY.with(|factory| factory.capability().clone())
}

/// A success-or-failure computation.
///
/// `bind` short-circuits on a failed instance, returning it unchanged. On a
/// success it invokes the continuation inside a fault boundary: a
/// [`ComputationFault`] raised by the continuation is captured into a new
/// failed instance instead of propagating.
#[derive(Clone)]
pub struct Fallible {
    obj: Rc<RefCell<Instance>>,
}

impl Fallible {
    /// A success instance.
    pub fn success(value: Value) -> engine::Result<Self> {
        let mut params = Params::new();
        params.insert("value".into(), value);
        Self::construct(params)
    }

    /// A failure instance carrying `fault`.
    pub fn failure(fault: ComputationFault) -> engine::Result<Self> {
        let payload = serde_json::to_value(&fault)
            .map_err(|e| object::Error::Invocation(format!("fault payload: {e}")))?;
        let mut params = Params::new();
        params.insert("fault".into(), payload);
        Self::construct(params)
    }

    fn construct(params: Params) -> engine::Result<Self> {
        let obj = FAMILY.with(|factory| factory.construct(params))?;
        Ok(Self {
            obj: Rc::new(RefCell::new(obj)),
        })
    }

    fn outcome(&self) -> Outcome {
        self.obj
            .borrow()
            .state::<Outcome>(STATE_SLOT)
            .map(|state| state.borrow().clone())
            .unwrap_or_else(|_| uninitialized())
    }

    /// The success value, or `None` for a failed instance.
    pub fn extract(&self) -> Option<Value> {
        self.outcome().ok()
    }

    /// The carried fault, or `None` for a success instance.
    pub fn get_error(&self) -> Option<ComputationFault> {
        self.outcome().err()
    }

    /// Invoke `f` with the success value inside the fault boundary, or
    /// return this failed instance unchanged without invoking `f`.
    ///
    /// The continuation's error channel is [`ComputationFault`]; engine
    /// failures while it builds the next computation convert into
    /// `ComputationFault::Internal` through `?`.
    pub fn bind<F>(&self, f: F) -> engine::Result<Fallible>
    where
        F: FnOnce(&Value) -> std::result::Result<Fallible, ComputationFault>,
    {
        let value = match self.outcome() {
            Err(_) => return Ok(self.clone()),
            Ok(value) => value,
        };
        match f(&value) {
            Ok(next) => Ok(next),
            Err(fault) => {
                debug!(fault = %fault, "continuation fault captured");
                Fallible::failure(fault)
            }
        }
    }

    /// The underlying composed instance.
    pub fn instance(&self) -> Rc<RefCell<Instance>> {
        self.obj.clone()
    }
}

impl Computation for Fallible {
    fn pure(value: Value) -> engine::Result<Self> {
        Self::success(value)
    }
}
