//! Opaque `{id, generation}` resource handles

use slotmap::{Key, KeyData};

use crate::error::{GfxError, Result};
use crate::registry::ResourceKey;

/// Opaque reference to a registry-owned resource.
///
/// A handle is resolved through a [`Registry`](crate::Registry), never dereferenced.
/// Id `0` and generation `0` are never issued; a handle whose generation no longer
/// matches its slot resolves as not-found.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Handle {
    pub id: u32,
    pub generation: u32,
}

impl Handle {
    /// The null handle
    pub const NULL: Handle = Handle { id: 0, generation: 0 };

    pub const fn new(id: u32, generation: u32) -> Self {
        Self { id, generation }
    }

    pub fn is_null(&self) -> bool {
        self.id == 0 || self.generation == 0
    }

    /// Reject handles that could never have been issued
    pub fn validate(&self) -> Result<()> {
        if self.is_null() {
            return Err(GfxError::InvalidArgument(format!(
                "null handle {}:{}",
                self.id, self.generation
            )));
        }
        Ok(())
    }

    pub(crate) fn from_key(key: ResourceKey) -> Self {
        let ffi = key.data().as_ffi();
        Self {
            id: (ffi & 0xffff_ffff) as u32,
            generation: (ffi >> 32) as u32,
        }
    }

    pub(crate) fn to_key(self) -> ResourceKey {
        let ffi = (u64::from(self.generation) << 32) | u64::from(self.id);
        KeyData::from_ffi(ffi).into()
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}v{}", self.id, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_handle_rejected() {
        assert!(Handle::NULL.validate().is_err());
        assert!(Handle::new(0, 1).validate().is_err());
        assert!(Handle::new(1, 0).validate().is_err());
        assert!(Handle::new(3, 1).validate().is_ok());
    }

    #[test]
    fn test_key_roundtrip() {
        let mut map: slotmap::SlotMap<ResourceKey, ()> = slotmap::SlotMap::with_key();
        let key = map.insert(());
        let handle = Handle::from_key(key);
        assert!(!handle.is_null());
        assert_eq!(handle.to_key(), key);
    }
}
