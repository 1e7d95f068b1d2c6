//! Sample models the CLI and tests bind.

pub mod account;
pub mod json_model;

pub use account::{Account, SAMPLE_FORM};
pub use json_model::JsonModel;
