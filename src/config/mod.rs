pub mod defaults;
pub mod settings;

pub use defaults::DefaultConfig;
pub use settings::{expand_home, Settings, API_KEY_ENV};
