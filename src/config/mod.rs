pub mod loader;
pub mod onboard;
pub mod schema;

pub use loader::{ConfigError, get_config_path, load_config, save_config};
pub use onboard::run_onboarding;
pub use schema::{Config, GenerationConfig, SafeConfigSummary, StoreSettings};
