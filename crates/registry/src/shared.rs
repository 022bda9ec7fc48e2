//! Lock-protected registry handle shared between the parser and registrants.

use std::borrow::Cow;
use std::sync::{Arc, PoisonError, RwLock};

use crate::{DerivedDefinition, Operation, OperationTable, Registry, RegistryError};

/// Cloneable handle to a live [`OperationTable`].
///
/// Every clone sees the same table. [`Registry::snapshot`] copies it under a
/// single read lock, so a parse call works against one consistent state. A
/// poisoned lock is recovered rather than propagated: the table is plain data
/// and stays valid even if a registrant panicked.
#[derive(Debug, Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<RwLock<OperationTable>>,
}

impl SharedRegistry {
    /// Wrap an existing table.
    pub fn new(table: OperationTable) -> Self {
        Self {
            inner: Arc::new(RwLock::new(table)),
        }
    }

    /// Register a new operation.
    pub fn register_operation(&self, operation: Operation) -> Result<(), RegistryError> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register_operation(operation)
    }

    /// Register a compositor definition; its value name becomes a valid
    /// path specification for subsequent option parses.
    pub fn register_definition(&self, definition: DerivedDefinition) -> Result<(), RegistryError> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register_definition(definition)
    }
}

impl Registry for SharedRegistry {
    /// Copy of the table, taken under one read lock.
    fn snapshot(&self) -> Cow<'_, OperationTable> {
        let table = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Cow::Owned(table.clone())
    }
}
