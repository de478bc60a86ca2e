pub mod domain;
pub mod error;
pub mod observer;
pub mod service;

pub use error::{BankingError, BankingResult};
