pub mod credentials;
pub mod datacenter;

pub use credentials::{CredentialField, Credentials, SensitivityPolicy};
pub use datacenter::{Datacenter, DatacenterInput};
