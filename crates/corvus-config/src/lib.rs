//! Domain-configuration snapshot store and environment-driven process
//! settings.

mod queries;
mod settings;
mod store;

pub use settings::Settings;
pub use store::{DomainConfigStore, PathOverrides, ResolvedOverride};
