//! The embedded script runtime seam.
//!
//! The crate never links an interpreter; hosts hand in a [`ScriptRuntime`]
//! and the bridge serializes every call to it through one dedicated worker.

pub mod env;

pub use env::RuntimeEnv;

use std::collections::BTreeMap;
use std::path::PathBuf;

/// One runtime call: method, full path+query, optional body, entry script,
/// plus the per-call environment of key/value strings.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub method: String,
    pub uri: String,
    pub body: Option<String>,
    pub script: PathBuf,
    pub env: BTreeMap<String, String>,
}

/// The embedded interpreter executing the bundled application per request.
///
/// Implementations are not assumed re-entrant: the worker owns the instance
/// exclusively and runs one invocation at a time. The returned bytes are the
/// runtime's single concatenated output buffer (optional status line,
/// optional headers, blank-line separator, body), decoded by the bridge.
pub trait ScriptRuntime: Send {
    fn invoke(&mut self, call: &Invocation) -> anyhow::Result<Vec<u8>>;
}
