//! Configuration for the cmdgate command gate.
//!
//! Settings are read from layered `cmdgate.toml` files (user, workspace
//! directory, workspace root) and merged into a single [`GateConfig`].

pub mod audit;
pub mod constants;
pub mod debug;
pub mod loader;
pub mod parser;
pub mod policy;

pub use audit::AuditConfig;
pub use debug::{DebugConfig, TraceLevel};
pub use loader::layers::{ConfigLayerEntry, ConfigLayerSource, ConfigLayerStack};
pub use loader::{ConfigManager, GateConfig, merge_toml_values};
pub use parser::{ParserBackendPreference, ParserConfig};
pub use policy::{CustomProfileConfig, PolicyAction, PolicyConfig, normalize_group_id};
