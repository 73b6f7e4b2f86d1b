pub mod identity;

pub use identity::{LoaderType, VersionIdentity};
