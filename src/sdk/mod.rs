/// Software Development Kit (SDK) for Kairos Store.
///
/// This module assembles the storage stack into a [`Workspace`] and exposes the
/// unlock step and the day-to-day workflows built on the repositories.
pub mod config;
/// Environment-driven workspace initialization.
pub mod discovery;
pub mod workspace;

pub use config::{Config, SaltMode};
pub use discovery::open;
pub use workspace::{Analytics, Workspace};
