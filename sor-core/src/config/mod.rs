pub mod settings;

pub use settings::{ServerSettings, Settings};
