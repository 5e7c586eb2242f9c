//! Capability records and the add/remove composition pipeline.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use object::{Instance, Member};
use tracing::{debug, trace};

use crate::{Error, Result};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Globally unique capability identity, assigned exactly once at creation.
/// Monotonically increasing within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CapabilityId(u64);

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A lifecycle callback. Hooks receive the instance being composed and the
/// capability whose pipeline is running.
pub type Hook = Rc<dyn Fn(&mut Instance, &Capability) -> Result<()>>;

struct Inner {
    id: CapabilityId,
    name: String,
    members: IndexMap<String, Member>,
    before_add: Vec<Hook>,
    after_add: Vec<Hook>,
    before_remove: Vec<Hook>,
    after_remove: Vec<Hook>,
}

/// A named bundle of members installable on and removable from instances.
///
/// Capabilities are cheap-clone handles; a capability is created once and
/// reused across many objects. Mutating the member table or registering
/// hooks affects future `add`/`remove` calls only.
///
/// The engine is single-threaded by contract: composition calls against the
/// same instance must be serialized by the caller, and nothing here is
/// `Send` or `Sync`.
#[derive(Clone)]
pub struct Capability {
    inner: Rc<RefCell<Inner>>,
}

impl Capability {
    /// Create a fresh capability with no members or hooks.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                id: CapabilityId(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
                name: name.into(),
                members: IndexMap::new(),
                before_add: Vec::new(),
                after_add: Vec::new(),
                before_remove: Vec::new(),
                after_remove: Vec::new(),
            })),
        }
    }

    /// Create a capability from a literal member table. Later entries
    /// replace earlier ones under the same name.
    pub fn with_members<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = (S, Member)>,
        S: Into<String>,
    {
        let cap = Self::new(name);
        {
            let mut inner = cap.inner.borrow_mut();
            for (name, member) in members {
                inner.members.insert(name.into(), member);
            }
        }
        cap
    }

    pub fn id(&self) -> CapabilityId {
        self.inner.borrow().id
    }

    pub fn name(&self) -> String {
        self.inner.borrow().name.clone()
    }

    /// Declare a member. Errors if this capability already defines the name;
    /// uniqueness across capabilities is checked at attach time instead.
    pub fn add_member(&self, name: impl Into<String>, member: Member) -> Result<()> {
        let name = name.into();
        let mut inner = self.inner.borrow_mut();
        if inner.members.contains_key(&name) {
            return Err(Error::DuplicateMember {
                capability: inner.name.clone(),
                name,
            });
        }
        inner.members.insert(name, member);
        Ok(())
    }

    /// Drop a member from the table. Affects future attach calls only;
    /// instances already composed keep their slot.
    pub fn remove_member(&self, name: &str) -> Option<Member> {
        self.inner.borrow_mut().members.shift_remove(name)
    }

    /// The declared member names, in declaration order.
    pub fn member_names(&self) -> Vec<String> {
        self.inner.borrow().members.keys().cloned().collect()
    }

    /// Copy each member onto the instance's own slots, in declaration order.
    ///
    /// This is the raw primitive: no hooks run. The first member name that
    /// already exists on the target raises [`Error::Collision`] and aborts
    /// the remaining members of this capability; members installed before
    /// the collision stay in place.
    pub fn attach(&self, obj: &mut Instance) -> Result<()> {
        let members: Vec<(String, Member)> = {
            let inner = self.inner.borrow();
            inner
                .members
                .iter()
                .map(|(name, member)| (name.clone(), member.clone()))
                .collect()
        };

        for (name, member) in members {
            if obj.has_slot(&name) {
                debug!(
                    capability = %self.name(),
                    object = %obj.id(),
                    member = %name,
                    "member collision"
                );
                return Err(Error::Collision {
                    object: obj.id(),
                    capability: self.name(),
                    conflicting_name: name,
                });
            }
            obj.set_slot(name, member.instantiate());
        }
        Ok(())
    }

    /// Delete exactly the slot names this capability declares. Names absent
    /// on the instance are skipped.
    pub fn detach(&self, obj: &mut Instance) {
        for name in self.member_names() {
            obj.remove_slot(&name);
        }
    }

    /// Run the full add pipeline on one instance: before-add hooks in
    /// registration order, then [`Capability::attach`], then after-add hooks
    /// in registration order.
    pub fn add(&self, obj: &mut Instance) -> Result<()> {
        let (before, after) = {
            let inner = self.inner.borrow();
            (inner.before_add.clone(), inner.after_add.clone())
        };

        debug!(capability = %self.name(), object = %obj.id(), "add");
        for hook in &before {
            hook(obj, self)?;
        }
        self.attach(obj)?;
        for hook in &after {
            hook(obj, self)?;
        }
        Ok(())
    }

    /// Run the full remove pipeline: before-remove hooks, then
    /// [`Capability::detach`], then after-remove hooks.
    pub fn remove(&self, obj: &mut Instance) -> Result<()> {
        let (before, after) = {
            let inner = self.inner.borrow();
            (inner.before_remove.clone(), inner.after_remove.clone())
        };

        debug!(capability = %self.name(), object = %obj.id(), "remove");
        for hook in &before {
            hook(obj, self)?;
        }
        self.detach(obj);
        for hook in &after {
            hook(obj, self)?;
        }
        Ok(())
    }

    /// Run the add pipeline on each instance in turn, stopping at the first
    /// failure.
    pub fn add_to_each(&self, objs: &mut [Instance]) -> Result<()> {
        for obj in objs {
            self.add(obj)?;
        }
        Ok(())
    }

    /// Run the remove pipeline on each instance in turn.
    pub fn remove_from_each(&self, objs: &mut [Instance]) -> Result<()> {
        for obj in objs {
            self.remove(obj)?;
        }
        Ok(())
    }

    /// Whether any member name of this capability already exists on the
    /// instance. Cost is proportional to the member count.
    pub fn collides_with(&self, obj: &Instance) -> bool {
        self.inner
            .borrow()
            .members
            .keys()
            .any(|name| obj.has_slot(name))
    }

    /// Whether every member name of this capability exists on the instance.
    ///
    /// A capability with an empty member set is never implemented: its
    /// presence cannot be observed by member scan. Callers needing presence
    /// for such capabilities use the tracker index (see [`crate::rtti`]),
    /// which is the authoritative presence source.
    pub fn implemented_on(&self, obj: &Instance) -> bool {
        let inner = self.inner.borrow();
        !inner.members.is_empty() && inner.members.keys().all(|name| obj.has_slot(name))
    }

    /// Declare prerequisites: registers a before-add hook that raises
    /// [`Error::MissingDependency`] for the first listed capability not
    /// implemented on the target.
    pub fn requires(&self, deps: &[Capability]) {
        let deps = deps.to_vec();
        self.before_add(move |obj, cap| {
            for dep in &deps {
                if !dep.implemented_on(obj) {
                    return Err(Error::MissingDependency {
                        object: obj.id(),
                        capability: cap.name(),
                        missing: dep.name(),
                    });
                }
            }
            Ok(())
        });
    }

    /// Declare companions: registers a before-add hook that composes any
    /// listed capability not yet implemented on the target, through its own
    /// full add pipeline. Nested dependencies resolve before the outer add
    /// proceeds.
    pub fn brings(&self, deps: &[Capability]) {
        let deps = deps.to_vec();
        self.before_add(move |obj, cap| {
            for dep in &deps {
                if !dep.implemented_on(obj) {
                    trace!(
                        capability = %cap.name(),
                        dependency = %dep.name(),
                        object = %obj.id(),
                        "bringing missing dependency"
                    );
                    dep.add(obj)?;
                }
            }
            Ok(())
        });
    }

    /// Register a hook to run before member attach.
    pub fn before_add<F>(&self, hook: F)
    where
        F: Fn(&mut Instance, &Capability) -> Result<()> + 'static,
    {
        self.inner.borrow_mut().before_add.push(Rc::new(hook));
    }

    /// Register a hook to run after member attach.
    pub fn after_add<F>(&self, hook: F)
    where
        F: Fn(&mut Instance, &Capability) -> Result<()> + 'static,
    {
        self.inner.borrow_mut().after_add.push(Rc::new(hook));
    }

    /// Register a hook to run before member detach.
    pub fn before_remove<F>(&self, hook: F)
    where
        F: Fn(&mut Instance, &Capability) -> Result<()> + 'static,
    {
        self.inner.borrow_mut().before_remove.push(Rc::new(hook));
    }

    /// Register a hook to run after member detach.
    pub fn after_remove<F>(&self, hook: F)
    where
        F: Fn(&mut Instance, &Capability) -> Result<()> + 'static,
    {
        self.inner.borrow_mut().after_remove.push(Rc::new(hook));
    }

    /// Register a constructor: an after-add hook that runs once the members
    /// are installed, with construction parameters available on the instance.
    pub fn add_constructor<F>(&self, body: F)
    where
        F: Fn(&mut Instance, &Capability) -> Result<()> + 'static,
    {
        self.after_add(body);
    }

    /// Register a destructor: a before-remove hook that runs while the
    /// members are still installed.
    pub fn add_destructor<F>(&self, body: F)
    where
        F: Fn(&mut Instance, &Capability) -> Result<()> + 'static,
    {
        self.before_remove(body);
    }

    /// Allocate a fresh instance and compose this capability onto it.
    pub fn create(&self) -> Result<Instance> {
        self.create_on(Instance::new())
    }

    /// Compose this capability onto an existing instance and hand it back.
    pub fn create_on(&self, mut obj: Instance) -> Result<Instance> {
        self.add(&mut obj)?;
        Ok(obj)
    }
}

impl PartialEq for Capability {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Capability {}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Capability")
            .field("id", &inner.id)
            .field("name", &inner.name)
            .field("members", &inner.members.keys().collect::<Vec<_>>())
            .finish()
    }
}
