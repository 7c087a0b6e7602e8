pub mod env;
pub mod hub;

pub use env::EnvConfig;
pub use hub::HubConfig;
