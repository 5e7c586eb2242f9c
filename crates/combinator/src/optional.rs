//! Present-or-absent computations.

use std::cell::RefCell;
use std::rc::Rc;

use engine::{Capability, Factory};
use object::{Instance, Member, Params};
use serde_json::Value;

use crate::Computation;

const STATE_SLOT: &str = "optional_value";

thread_local! {
    static FAMILY: Factory = Factory::new(build_capability());
}

fn build_capability() -> Capability {
    let cap = Capability::with_members(
        "optional",
        [
            (STATE_SLOT, Member::state(|| None::<Value>)),
            (
                "is_nothing",
                Member::method(|obj, _args| {
                    let state = obj.state::<Option<Value>>(STATE_SLOT)?;
                    let absent = state.borrow().is_none();
                    Ok(Value::Bool(absent))
                }),
            ),
            (
                "extract",
                Member::method(|obj, _args| {
                    let state = obj.state::<Option<Value>>(STATE_SLOT)?;
                    let value = state.borrow().clone().unwrap_or(Value::Null);
                    Ok(value)
                }),
            ),
        ],
    );
    // Absent is the default; a `value` construction parameter makes the
    // instance present. Null is a present value, unlike a missing key.
    cap.add_constructor(|obj, _cap| {
        let value = obj.param("value").cloned();
        *obj.state::<Option<Value>>(STATE_SLOT)?.borrow_mut() = value;
        Ok(())
    });
    engine::track(&cap);
    cap
}

/// The optional capability composed onto every [`Optional`] instance.
pub fn capability() -> Capability {
    FAMILY.with(|factory| factory.capability().clone())
}

/// A present-or-absent computation.
///
/// `bind` on an absent instance returns that same instance without invoking
/// the continuation. On a present instance the continuation is invoked with
/// the value and its result is returned as-is; re-wrapping is the
/// continuation's responsibility.
#[derive(Clone)]
pub struct Optional {
    obj: Rc<RefCell<Instance>>,
}

impl Optional {
    /// A present instance.
    pub fn just(value: Value) -> engine::Result<Self> {
        let mut params = Params::new();
        params.insert("value".into(), value);
        Self::construct(params)
    }

    /// An absent instance.
    pub fn nothing() -> engine::Result<Self> {
        Self::construct(Params::new())
    }

    fn construct(params: Params) -> engine::Result<Self> {
        let obj = FAMILY.with(|factory| factory.construct(params))?;
        Ok(Self {
            obj: Rc::new(RefCell::new(obj)),
        })
    }

    /// The underlying value, or `None` for an absent instance.
    pub fn extract(&self) -> Option<Value> {
        self.obj
            .borrow()
            .state::<Option<Value>>(STATE_SLOT)
            .ok()
            .and_then(|state| state.borrow().clone())
    }

    /// True only for absent instances; a present null is not nothing.
    pub fn is_nothing(&self) -> bool {
        self.obj
            .borrow()
            .state::<Option<Value>>(STATE_SLOT)
            .map(|state| state.borrow().is_none())
            .unwrap_or(true)
    }

    /// Invoke `f` with the present value, or return this absent instance
    /// unchanged without invoking `f`.
    pub fn bind<F>(&self, f: F) -> engine::Result<Optional>
    where
        F: FnOnce(&Value) -> engine::Result<Optional>,
    {
        if self.is_nothing() {
            return Ok(self.clone());
        }
        let value = self.extract().unwrap_or(Value::Null);
        f(&value)
    }

    /// The underlying composed instance.
    pub fn instance(&self) -> Rc<RefCell<Instance>> {
        self.obj.clone()
    }
}

impl Computation for Optional {
    fn pure(value: Value) -> engine::Result<Self> {
        Self::just(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn just_is_present_and_extracts() {
        let opt = Optional::just(json!(5)).unwrap();
        assert!(!opt.is_nothing());
        assert_eq!(opt.extract(), Some(json!(5)));
    }

    #[test]
    fn null_is_a_present_value() {
        let opt = Optional::just(Value::Null).unwrap();
        // extract() cannot distinguish null from absent; the instance method
        // reports presence from the state itself.
        let obj = opt.instance();
        let absent = obj.borrow_mut().invoke("is_nothing", &[]).unwrap();
        assert_eq!(absent, json!(false));
    }

    #[test]
    fn nothing_short_circuits_bind() {
        let none = Optional::nothing().unwrap();
        let bound = none.bind(|_| panic!("continuation must not run")).unwrap();
        assert!(bound.is_nothing());
        assert!(Rc::ptr_eq(&none.instance(), &bound.instance()));
    }

    #[test]
    fn bind_returns_the_continuation_result_unrewrapped() {
        let opt = Optional::just(json!(2)).unwrap();

        let doubled = opt
            .bind(|v| Optional::just(json!(v.as_i64().unwrap() * 2)))
            .unwrap();
        assert_eq!(doubled.extract(), Some(json!(4)));

        let dropped = opt.bind(|_| Optional::nothing()).unwrap();
        assert!(dropped.is_nothing());
    }

    #[test]
    fn is_nothing_is_true_only_for_absent_instances() {
        assert!(Optional::nothing().unwrap().is_nothing());
        assert!(!Optional::just(json!(0)).unwrap().is_nothing());
        assert!(!Optional::just(json!(false)).unwrap().is_nothing());
    }

    #[test]
    fn optional_instances_are_presence_tracked() {
        let opt = Optional::nothing().unwrap();
        let obj = opt.instance();
        assert!(engine::is_present(&obj.borrow(), &capability()));
    }
}
