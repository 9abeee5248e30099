//! Invariant checks on an assembled [`crate::output::ImageBuild`]

pub mod rules;
pub mod validator;

pub use rules::ValidationRule;
pub use validator::Validator;
