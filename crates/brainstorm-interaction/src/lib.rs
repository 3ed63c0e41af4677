//! Adapters between the Brainstorm core and the outside world: the HTTP
//! generator, its role profiles, and configuration loading.

pub mod config;
pub mod ollama_generator;
pub mod profiles;

pub use config::{load_config, load_config_from};
pub use ollama_generator::OllamaGenerator;
pub use profiles::ProfileTable;
