//! Index definitions, key projections and the per-entity registry.

pub mod definition;
pub mod extractor;
pub mod registry;

pub use definition::{IndexBuilder, IndexDefinition, KeyBuilder};
pub use extractor::{ConstantProjection, FunctionProjection, IdentityProjection, KeyProjection};
pub use registry::IndexRegistry;
