//! The compiled-schema contract this crate consumes. Compiling namespace
//! configs down to [`CompiledNamespace`] trees is out of scope here; this
//! crate only interprets the output.

use std::collections::BTreeMap;

use rebac_model::CompiledNamespace;

use crate::error::{EngineError, Result};

pub trait SchemaIndex: Send + Sync {
    fn namespace(&self, name: &str) -> Result<&CompiledNamespace>;
}

/// A schema index over namespaces held entirely in memory, for tests and for
/// deployments small enough to keep the whole compiled schema resident.
#[derive(Debug, Default)]
pub struct InMemorySchemaIndex {
    namespaces: BTreeMap<String, CompiledNamespace>,
}

impl InMemorySchemaIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: CompiledNamespace) -> Self {
        self.namespaces.insert(namespace.namespace.clone(), namespace);
        self
    }
}

impl SchemaIndex for InMemorySchemaIndex {
    fn namespace(&self, name: &str) -> Result<&CompiledNamespace> {
        self.namespaces
            .get(name)
            .ok_or_else(|| EngineError::UnknownNamespace(name.to_string()))
    }
}
