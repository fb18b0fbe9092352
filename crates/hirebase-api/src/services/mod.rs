pub mod provisioning;

pub use provisioning::{ProvisioningOrchestrator, ProvisioningSettings, ProvisioningState};
