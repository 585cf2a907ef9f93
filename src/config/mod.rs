pub mod carrier_config;
pub mod toml_config;

pub use carrier_config::{EmailNotification, EndiciaConfig, FedExConfig, RestPostageConfig};
pub use toml_config::CarrierSettings;
