//! Handle-indexed, reference-counted resource registry
//!
//! Every window, texture and font a backend creates lives in a [`Registry`].
//! Callers only ever hold a [`Handle`]; resolving it checks the generation and the
//! expected [`ResourceKind`] before handing out a typed reference.

use std::any::Any;

use slotmap::SlotMap;

use crate::error::{GfxError, Result};
use crate::handle::Handle;

slotmap::new_key_type! {
    /// Arena key backing a [`Handle`]
    pub struct ResourceKey;
}

/// Type tag checked on every resolve
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Window,
    Texture,
    Font,
}

/// A registry-owned object with a virtual destroy routine
pub trait Resource: Any {
    fn kind(&self) -> ResourceKind;

    /// Release native storage. Called exactly once, when the last reference goes away.
    fn destroy(&mut self) -> Result<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A resource type with a statically known kind
pub trait TypedResource: Resource + Sized {
    const KIND: ResourceKind;
}

struct Slot {
    handle: Handle,
    kind: ResourceKind,
    ref_count: u32,
    object: Box<dyn Resource>,
}

/// Generational arena of reference-counted resources
pub struct Registry {
    slots: SlotMap<ResourceKey, Slot>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: SlotMap::with_capacity_and_key(capacity),
        }
    }

    /// Register an object with a reference count of one
    pub fn register(&mut self, object: Box<dyn Resource>) -> Result<Handle> {
        let kind = object.kind();
        if self.slots.len() >= u32::MAX as usize - 1 {
            return Err(GfxError::Overflow("registry is full".into()));
        }
        let key = self.slots.insert_with_key(|key| Slot {
            handle: Handle::from_key(key),
            kind,
            ref_count: 1,
            object,
        });
        let handle = Handle::from_key(key);
        tracing::trace!(%handle, ?kind, "registered resource");
        Ok(handle)
    }

    fn slot(&self, handle: Handle) -> Result<&Slot> {
        handle.validate()?;
        match self.slots.get(handle.to_key()) {
            Some(slot) if slot.handle == handle => Ok(slot),
            _ => Err(GfxError::NotFound(format!("handle {handle}"))),
        }
    }

    fn slot_mut(&mut self, handle: Handle) -> Result<&mut Slot> {
        handle.validate()?;
        match self.slots.get_mut(handle.to_key()) {
            Some(slot) if slot.handle == handle => Ok(slot),
            _ => Err(GfxError::NotFound(format!("handle {handle}"))),
        }
    }

    pub fn kind(&self, handle: Handle) -> Result<ResourceKind> {
        self.slot(handle).map(|slot| slot.kind)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.slot(handle).is_ok()
    }

    /// Resolve a handle to a typed reference, checking its kind
    pub fn resolve<T: TypedResource>(&self, handle: Handle) -> Result<&T> {
        let slot = self.slot(handle)?;
        if slot.kind != T::KIND {
            return Err(kind_mismatch(handle, T::KIND, slot.kind));
        }
        slot.object
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| kind_mismatch(handle, T::KIND, slot.kind))
    }

    pub fn resolve_mut<T: TypedResource>(&mut self, handle: Handle) -> Result<&mut T> {
        let slot = self.slot_mut(handle)?;
        if slot.kind != T::KIND {
            return Err(kind_mismatch(handle, T::KIND, slot.kind));
        }
        let kind = slot.kind;
        slot.object
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or_else(|| kind_mismatch(handle, T::KIND, kind))
    }

    pub fn ref_count(&self, handle: Handle) -> Result<u32> {
        self.slot(handle).map(|slot| slot.ref_count)
    }

    /// Add a reference; fails with `Overflow` at `u32::MAX`
    pub fn retain(&mut self, handle: Handle) -> Result<u32> {
        let slot = self.slot_mut(handle)?;
        slot.ref_count = slot
            .ref_count
            .checked_add(1)
            .ok_or_else(|| GfxError::Overflow(format!("reference count of {handle}")))?;
        Ok(slot.ref_count)
    }

    /// Drop a reference; at zero the slot is unregistered and destroyed.
    ///
    /// Returns `true` when the object was destroyed. The generation of the slot is
    /// bumped on unregister, so the handle is stale even if destroy fails.
    pub fn release(&mut self, handle: Handle) -> Result<bool> {
        let slot = self.slot_mut(handle)?;
        if slot.ref_count == 0 {
            return Err(GfxError::State(format!("{handle} already released")));
        }
        slot.ref_count -= 1;
        if slot.ref_count > 0 {
            return Ok(false);
        }
        let Some(mut slot) = self.slots.remove(handle.to_key()) else {
            return Err(GfxError::NotFound(format!("handle {handle}")));
        };
        tracing::trace!(%handle, kind = ?slot.kind, "destroying resource");
        slot.object.destroy()?;
        Ok(true)
    }

    pub fn handles(&self, kind: ResourceKind) -> Vec<Handle> {
        self.slots
            .values()
            .filter(|slot| slot.kind == kind)
            .map(|slot| slot.handle)
            .collect()
    }

    /// Destroy every registered object regardless of reference counts.
    ///
    /// Keeps going after a failing destroy and reports the first failure.
    pub fn destroy_all(&mut self) -> Result<()> {
        let mut first = Ok(());
        for (_, mut slot) in self.slots.drain() {
            if let Err(err) = slot.object.destroy() {
                tracing::warn!(handle = %slot.handle, kind = ?slot.kind, "destroy failed: {err}");
                if first.is_ok() {
                    first = Err(err);
                }
            }
        }
        first
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

fn kind_mismatch(handle: Handle, expected: ResourceKind, found: ResourceKind) -> GfxError {
    GfxError::InvalidArgument(format!(
        "handle {handle} is a {found:?}, expected {expected:?}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Probe {
        destroyed: Rc<Cell<u32>>,
        fail: bool,
    }

    impl Resource for Probe {
        fn kind(&self) -> ResourceKind {
            ResourceKind::Texture
        }

        fn destroy(&mut self) -> Result<()> {
            self.destroyed.set(self.destroyed.get() + 1);
            if self.fail {
                return Err(GfxError::Unknown("probe".into()));
            }
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    impl TypedResource for Probe {
        const KIND: ResourceKind = ResourceKind::Texture;
    }

    struct Other;

    impl Resource for Other {
        fn kind(&self) -> ResourceKind {
            ResourceKind::Font
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    impl TypedResource for Other {
        const KIND: ResourceKind = ResourceKind::Font;
    }

    fn probe(counter: &Rc<Cell<u32>>, fail: bool) -> Box<dyn Resource> {
        Box::new(Probe {
            destroyed: counter.clone(),
            fail,
        })
    }

    #[test]
    fn test_register_and_resolve() {
        let counter = Rc::new(Cell::new(0));
        let mut registry = Registry::new();
        let handle = registry.register(probe(&counter, false)).unwrap();

        assert!(!handle.is_null());
        assert!(registry.resolve::<Probe>(handle).is_ok());
        assert_eq!(registry.kind(handle).unwrap(), ResourceKind::Texture);
    }

    #[test]
    fn test_kind_mismatch_is_invalid_argument() {
        let mut registry = Registry::new();
        let font = registry.register(Box::new(Other)).unwrap();

        let err = registry.resolve::<Probe>(font).err().unwrap();
        assert!(matches!(err, GfxError::InvalidArgument(_)));
    }

    #[test]
    fn test_release_destroys_at_zero() {
        let counter = Rc::new(Cell::new(0));
        let mut registry = Registry::new();
        let handle = registry.register(probe(&counter, false)).unwrap();

        assert_eq!(registry.retain(handle).unwrap(), 2);
        assert!(!registry.release(handle).unwrap());
        assert_eq!(counter.get(), 0);
        assert!(registry.release(handle).unwrap());
        assert_eq!(counter.get(), 1);

        let err = registry.resolve::<Probe>(handle).err().unwrap();
        assert!(matches!(err, GfxError::NotFound(_)));
    }

    #[test]
    fn test_stale_generation_not_found() {
        let counter = Rc::new(Cell::new(0));
        let mut registry = Registry::new();
        let first = registry.register(probe(&counter, false)).unwrap();
        registry.release(first).unwrap();
        let second = registry.register(probe(&counter, false)).unwrap();

        assert_eq!(first.id, second.id);
        assert_ne!(first.generation, second.generation);
        assert!(matches!(
            registry.resolve::<Probe>(first),
            Err(GfxError::NotFound(_))
        ));

        let forged = Handle::new(second.id, second.generation + 1);
        assert!(matches!(
            registry.resolve::<Probe>(forged),
            Err(GfxError::NotFound(_))
        ));
    }

    #[test]
    fn test_null_handle_invalid_argument() {
        let registry = Registry::new();
        assert!(matches!(
            registry.resolve::<Probe>(Handle::NULL),
            Err(GfxError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_destroy_all_records_first_error() {
        let counter = Rc::new(Cell::new(0));
        let mut registry = Registry::new();
        registry.register(probe(&counter, true)).unwrap();
        registry.register(probe(&counter, false)).unwrap();
        registry.register(probe(&counter, true)).unwrap();

        let result = registry.destroy_all();
        assert_eq!(result, Err(GfxError::Unknown("probe".into())));
        assert_eq!(counter.get(), 3);
        assert!(registry.is_empty());
    }
}
