//! Rewrite tree evaluator and local resolvers (C2 + C3): the single-node
//! logic that interprets a compiled schema against locally-held tuples.
//! Everything that needs to reach beyond one resource's own tuples recurses
//! through the injected [`dispatch_trait::Dispatch`] trait, which
//! `rebac-dispatch` implements with the depth budget, cache, and ring
//! routing this crate deliberately knows nothing about.

pub mod dispatch_trait;
pub mod error;
pub mod evaluator;
pub mod resolvers;
pub mod schema;
pub mod types;

pub use dispatch_trait::Dispatch;
pub use error::{EngineError, Result};
pub use schema::{InMemorySchemaIndex, SchemaIndex};
