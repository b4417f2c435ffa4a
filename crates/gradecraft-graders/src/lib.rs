//! gradecraft-graders — semantic grading service backends.
//!
//! Implements the `SemanticGrader` trait for OpenAI and Anthropic, plus a
//! deterministic mock for tests, decoupling the grading engine from the
//! transport of any particular service.

pub mod anthropic;
pub mod config;
pub mod mock;
pub mod openai;

pub use config::{create_grader, load_config, load_config_from, BackendConfig, GradersConfig};
