//! O(1) capability-presence tracking.
//!
//! `collides_with`/`implemented_on` scan member names, so their cost grows
//! with member count and repeats for every transitive dependency check. The
//! tracker amortizes this: a capability that opts in records every add and
//! remove in a per-instance index keyed on capability id, making presence a
//! constant-time lookup. The index is also the only way to observe presence
//! of a capability with an empty member set.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use object::{Instance, Member};

use crate::{Capability, CapabilityId, Result};

/// Slot name under which the tracker installs its per-instance index.
pub const INDEX_SLOT: &str = "capability_index";

/// Per-instance presence index. Owned by exactly one instance, keyed on
/// capability id.
#[derive(Debug, Default)]
pub struct PresenceIndex {
    present: HashMap<CapabilityId, Capability>,
}

impl PresenceIndex {
    /// Record that a capability was added to the owning instance.
    pub fn added(&mut self, capability: &Capability) {
        self.present.insert(capability.id(), capability.clone());
    }

    /// Record that a capability was removed from the owning instance.
    pub fn removed(&mut self, capability: &Capability) {
        self.present.remove(&capability.id());
    }

    /// Whether the most recent recorded operation for this capability on
    /// the owning instance was an add.
    pub fn is_present(&self, capability: &Capability) -> bool {
        self.present.contains_key(&capability.id())
    }

    /// The tracked capabilities currently present.
    pub fn capabilities(&self) -> impl Iterator<Item = &Capability> {
        self.present.values()
    }

    pub fn len(&self) -> usize {
        self.present.len()
    }

    pub fn is_empty(&self) -> bool {
        self.present.is_empty()
    }
}

thread_local! {
    static TRACKER: Capability = build_tracker();
}

fn build_tracker() -> Capability {
    Capability::with_members("tracker", [(INDEX_SLOT, Member::state(PresenceIndex::default))])
}

/// The tracker capability. One per thread; the engine is single-threaded by
/// contract, so this is the process-wide tracker. Each instance it is
/// composed onto receives its own fresh [`PresenceIndex`].
pub fn tracker() -> Capability {
    TRACKER.with(Clone::clone)
}

/// The presence index on an instance, if the tracker is composed onto it.
pub fn presence_index(obj: &Instance) -> Option<Rc<RefCell<PresenceIndex>>> {
    obj.state::<PresenceIndex>(INDEX_SLOT).ok()
}

/// Constant-time presence query. False when the instance has no tracker.
pub fn is_present(obj: &Instance, capability: &Capability) -> bool {
    presence_index(obj).is_some_and(|index| index.borrow().is_present(capability))
}

/// Opt a capability into presence tracking: it brings the tracker and wires
/// its constructor/destructor to record adds and removes, so the index
/// always reflects the most recent add/remove call on the pair.
pub fn track(capability: &Capability) {
    capability.brings(&[tracker()]);
    capability.add_constructor(record(PresenceIndex::added));
    capability.add_destructor(record(PresenceIndex::removed));
}

fn record(
    op: fn(&mut PresenceIndex, &Capability),
) -> impl Fn(&mut Instance, &Capability) -> Result<()> {
    move |obj, cap| {
        if let Some(index) = presence_index(obj) {
            op(&mut index.borrow_mut(), cap);
        }
        Ok(())
    }
}
