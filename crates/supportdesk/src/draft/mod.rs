//! Reply drafting through an external text-generation API.

pub mod error;
pub mod generator;

pub use error::DraftError;
pub use generator::{build_prompt, DraftGenerator, DRAFT_FAILURE};
