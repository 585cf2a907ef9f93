pub mod error;
pub mod http;
pub mod logger;
pub mod validation;
pub mod xml;
