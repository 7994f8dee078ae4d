#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod assets;
pub mod bridge;
pub mod config;
pub mod error;
pub mod host;
pub mod native;
pub mod runtime;
pub mod security;
pub mod update;

pub use bridge::{BridgedRequest, BridgedResponse, RequestBridge};
pub use config::HostConfig;
pub use error::{HearthError, Result};
pub use host::HearthHost;
pub use runtime::ScriptRuntime;
pub use update::UpdateOutcome;
