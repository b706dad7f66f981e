//! # Wayline Engine
//!
//! Executes negotiated plans step by step and reduces the outputs to one
//! answer. [`Navigator::navigate`] ties planning, execution and synthesis
//! together.

pub mod config;
pub mod executor;
pub mod navigator;
pub mod synthesizer;

pub use config::EngineConfig;
pub use executor::StepExecutor;
pub use navigator::Navigator;
pub use synthesizer::{clean_output, ResultSynthesizer, SynthesizerConfig, DEFAULT_FALLBACK_MESSAGE};
