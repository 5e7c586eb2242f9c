//! Ordered-collection computations.

use std::cell::RefCell;
use std::rc::Rc;

use engine::{Capability, Factory};
use object::{Instance, Member, Params};
use serde_json::Value;

use crate::Computation;

const STATE_SLOT: &str = "sequence_items";

thread_local! {
    static FAMILY: Factory = Factory::new(build_capability());
}

fn build_capability() -> Capability {
    let cap = Capability::with_members(
        "sequence",
        [
            (STATE_SLOT, Member::state(Vec::<Value>::new)),
            (
                "items",
                Member::method(|obj, _args| {
                    let items = obj.state::<Vec<Value>>(STATE_SLOT)?;
                    let items = items.borrow().clone();
                    Ok(Value::Array(items))
                }),
            ),
        ],
    );
    cap.add_constructor(|obj, _cap| {
        let items = match obj.param("items") {
            Some(Value::Array(items)) => items.clone(),
            Some(value) => vec![value.clone()],
            None => Vec::new(),
        };
        *obj.state::<Vec<Value>>(STATE_SLOT)?.borrow_mut() = items;
        Ok(())
    });
    engine::track(&cap);
    cap
}

/// The sequence capability composed onto every [`Sequence`] instance.
pub fn capability() -> Capability {
    FAMILY.with(|factory| factory.capability().clone())
}

/// An ordered-collection computation.
///
/// `bind` applies its continuation to every element in order and
/// concatenates the resulting sequences (one level of flattening). It is
/// not short-circuiting: every element is visited.
#[derive(Clone)]
pub struct Sequence {
    obj: Rc<RefCell<Instance>>,
}

impl Sequence {
    /// Wrap a collection of values.
    pub fn from_values(items: Vec<Value>) -> engine::Result<Self> {
        let mut params = Params::new();
        params.insert("items".into(), Value::Array(items));
        let obj = FAMILY.with(|factory| factory.construct(params))?;
        Ok(Self {
            obj: Rc::new(RefCell::new(obj)),
        })
    }

    /// The wrapped elements, in order. Empty if the sequence capability has
    /// been removed from the underlying instance.
    pub fn items(&self) -> Vec<Value> {
        self.obj
            .borrow()
            .state::<Vec<Value>>(STATE_SLOT)
            .map(|state| state.borrow().clone())
            .unwrap_or_default()
    }

    /// Apply `f` to every element, concatenating the resulting sequences in
    /// element order.
    pub fn bind<F>(&self, mut f: F) -> engine::Result<Sequence>
    where
        F: FnMut(&Value) -> engine::Result<Sequence>,
    {
        let mut out = Vec::new();
        for item in self.items() {
            out.extend(f(&item)?.items());
        }
        Sequence::from_values(out)
    }

    /// The underlying composed instance.
    pub fn instance(&self) -> Rc<RefCell<Instance>> {
        self.obj.clone()
    }
}

impl Computation for Sequence {
    fn pure(value: Value) -> engine::Result<Self> {
        Self::from_values(vec![value])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pure_wraps_a_single_element() {
        let seq = Sequence::pure(json!(7)).unwrap();
        assert_eq!(seq.items(), vec![json!(7)]);
    }

    #[test]
    fn bind_flattens_one_level_in_element_order() {
        let seq = Sequence::from_values(vec![json!(1), json!(2), json!(3)]).unwrap();
        let bound = seq
            .bind(|x| {
                let n = x.as_i64().unwrap();
                Sequence::from_values(vec![json!(n), json!(n * 10)])
            })
            .unwrap();
        assert_eq!(
            bound.items(),
            vec![json!(1), json!(10), json!(2), json!(20), json!(3), json!(30)]
        );
    }

    #[test]
    fn bind_visits_every_element() {
        let seq = Sequence::from_values(vec![json!("a"), json!("b")]).unwrap();
        let mut visited = Vec::new();
        seq.bind(|x| {
            visited.push(x.clone());
            Sequence::from_values(Vec::new())
        })
        .unwrap();
        assert_eq!(visited, vec![json!("a"), json!("b")]);
    }

    #[test]
    fn empty_sequence_binds_to_empty() {
        let seq = Sequence::from_values(Vec::new()).unwrap();
        let bound = seq.bind(|_| panic!("continuation must not run")).unwrap();
        assert!(bound.items().is_empty());
    }

    #[test]
    fn items_method_is_exposed_on_the_instance() {
        let seq = Sequence::from_values(vec![json!(4)]).unwrap();
        let obj = seq.instance();
        let result = obj.borrow_mut().invoke("items", &[]).unwrap();
        assert_eq!(result, json!([4]));
    }

    #[test]
    fn sequence_instances_are_presence_tracked() {
        let seq = Sequence::pure(json!(0)).unwrap();
        let obj = seq.instance();
        assert!(engine::is_present(&obj.borrow(), &capability()));
    }
}
