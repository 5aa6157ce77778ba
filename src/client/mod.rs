//! REST client for the HR management API.

mod hr;
mod rest;
pub mod types;

pub use hr::HrClient;
pub use rest::RestClient;
