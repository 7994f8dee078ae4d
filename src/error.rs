use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `hearth`.
///
/// Each subsystem defines its own error variant. Host applications can match
/// on these to decide recovery strategy; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum HearthError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Request bridge ──────────────────────────────────────────────────
    #[error("bridge: {0}")]
    Bridge(#[from] BridgeError),

    // ── Update manager ──────────────────────────────────────────────────
    #[error("update: {0}")]
    Update(#[from] UpdateError),

    // ── Version manifest ────────────────────────────────────────────────
    #[error("manifest: {0}")]
    Manifest(#[from] ManifestError),

    // ── Native actions ──────────────────────────────────────────────────
    #[error("native: {0}")]
    Native(#[from] NativeError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Request bridge errors ──────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("runtime invocation failed: {0}")]
    Invocation(String),

    #[error("runtime worker is gone")]
    WorkerGone,
}

// ─── Update manager errors ──────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("update check failed: {0}")]
    Check(String),

    #[error("download failed: {0}")]
    Download(String),

    #[error("archive extraction failed: {0}")]
    Extract(String),

    #[error("archive entry escapes extraction root: {0}")]
    UnsafeEntry(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Version manifest errors ────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("bundled archive unreadable: {0}")]
    BundleUnreadable(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Native action errors ───────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum NativeError {
    #[error("action {action} not supported on this platform")]
    Unsupported { action: String },

    #[error("action {action} failed: {message}")]
    Failed { action: String, message: String },

    #[error("permission denied for {action}")]
    PermissionDenied { action: String },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, HearthError>;
