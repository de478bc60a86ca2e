pub mod config;
pub mod constants;
pub mod mappers;
pub mod services;

pub use config::CoreConfig;
pub use services::CoreServices;
