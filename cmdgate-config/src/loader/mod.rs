pub mod layers;

mod config;
mod manager;
mod merge;

#[cfg(test)]
mod tests;

pub use config::GateConfig;
pub use manager::ConfigManager;
pub use merge::merge_toml_values;
