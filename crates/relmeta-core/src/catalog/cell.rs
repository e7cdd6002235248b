//! One-time registry initialization for multi-threaded hosts.

use super::registry::SchemaRegistry;
use crate::error::{Error, Result};
use parking_lot::{const_mutex, Mutex};
use std::sync::Arc;

/// Holds a registry that is declared and finalized exactly once.
///
/// Can live in a `static`. The first caller of
/// [`RegistryCell::get_or_declare`] runs the declaration while holding the
/// lock; every later caller receives the same finalized registry.
pub struct RegistryCell {
    inner: Mutex<Option<Arc<SchemaRegistry>>>,
}

impl RegistryCell {
    /// Create an empty cell.
    pub const fn new() -> Self {
        Self {
            inner: const_mutex(None),
        }
    }

    /// Return the registry, declaring and finalizing it on first use.
    ///
    /// If declaration fails the cell stays empty and the error is returned.
    pub fn get_or_declare(
        &self,
        declare: impl FnOnce() -> Result<SchemaRegistry>,
    ) -> Result<Arc<SchemaRegistry>> {
        let mut guard = self.inner.lock();
        if let Some(registry) = guard.as_ref() {
            return Ok(Arc::clone(registry));
        }
        let mut registry = declare()?;
        registry.finalize()?;
        let registry = Arc::new(registry);
        *guard = Some(Arc::clone(&registry));
        Ok(registry)
    }

    /// Return the registry if it has been initialized.
    pub fn get(&self) -> Result<Arc<SchemaRegistry>> {
        self.inner.lock().clone().ok_or(Error::NotFinalized)
    }
}

impl Default for RegistryCell {
    fn default() -> Self {
        Self::new()
    }
}
