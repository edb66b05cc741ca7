pub mod dynamic;
pub mod store;

pub use dynamic::DiscoveryReport;
pub use store::{CommandRegistry, RegistryStats};
