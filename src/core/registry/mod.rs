mod client;
mod model;

pub use client::{ModRegistry, RegistryClient, DEFAULT_REGISTRY_TIMEOUT, MODRINTH_API_BASE};
pub use model::{
    short_count, DependencyRef, DependencyType, ModRequirement, ModSummary, ResolvedVersion,
};
