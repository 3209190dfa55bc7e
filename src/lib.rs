// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod keys;
pub mod layer;
pub mod layout;
pub mod lesson;
pub mod metrics;
pub mod presenter;
pub mod quotes;
pub mod runtime;
pub mod session;
pub mod stats;
pub mod store;
pub mod tutor;
pub mod typing_policy;
