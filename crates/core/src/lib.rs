pub mod candidate;
pub mod config;
pub mod config_loader;

pub use candidate::CandidateItem;
pub use config::{AppConfig, DatabaseConfig, OpenAiConfig, ServerConfig};
pub use config_loader::ConfigLoader;
