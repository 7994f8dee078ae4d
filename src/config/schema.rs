use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory under the data root holding the live application tree.
pub const APP_TREE_DIR: &str = "laravel";

/// Directory under the data root that survives update swaps.
pub const PERSISTED_DIR: &str = "persisted_data";

/// Version string that disables update checking (local development builds).
pub const DEV_VERSION_SENTINEL: &str = "DEBUG";

/// Update-channel behaviour: remote endpoint and network bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// Base URL of the update service (default: the hosted channel service)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Connect/read timeout for the metadata check, seconds (default: 10)
    #[serde(default = "default_check_timeout")]
    pub check_timeout_secs: u64,
    /// Connect/read timeout for the archive stream, seconds (default: 30)
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
    /// Relative paths under the live tree that survive a swap
    #[serde(default = "default_preserve_paths")]
    pub preserve_paths: Vec<String>,
}

fn default_endpoint() -> String {
    "https://updates.hearth.dev/api".into()
}

fn default_check_timeout() -> u64 {
    10
}

fn default_download_timeout() -> u64 {
    30
}

fn default_preserve_paths() -> Vec<String> {
    [
        "storage/app",
        "storage/logs",
        "storage/framework/cache",
        "storage/framework/sessions",
        "storage/framework/views",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            check_timeout_secs: default_check_timeout(),
            download_timeout_secs: default_download_timeout(),
            preserve_paths: default_preserve_paths(),
        }
    }
}

/// Top-level host configuration.
///
/// Loaded from `hearth.toml` in the application-data root when present,
/// otherwise constructed from defaults. The data root itself is supplied by
/// the embedder at startup and never read from the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Fixed local origin the web surface addresses (default: http://127.0.0.1)
    #[serde(default = "default_origin")]
    pub origin: String,
    /// Entry script handed to the runtime, relative to the live tree
    #[serde(default = "default_entry_script")]
    pub entry_script: String,
    /// Path to the bundled application archive; relative paths resolve
    /// against the data root
    #[serde(default = "default_bundle")]
    pub bundle: PathBuf,
    #[serde(default)]
    pub update: UpdateConfig,

    /// Application-data root; injected by the embedder, not persisted.
    #[serde(skip)]
    pub data_root: PathBuf,
}

fn default_origin() -> String {
    "http://127.0.0.1".into()
}

fn default_entry_script() -> String {
    "bootstrap/native.php".into()
}

fn default_bundle() -> PathBuf {
    PathBuf::from("bundle.zip")
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            entry_script: default_entry_script(),
            bundle: default_bundle(),
            update: UpdateConfig::default(),
            data_root: PathBuf::new(),
        }
    }
}

impl HostConfig {
    // ── Persisted state layout ───────────────────────────────────────────

    /// Live application tree, replaced wholesale by update swaps.
    pub fn live_dir(&self) -> PathBuf {
        self.data_root.join(APP_TREE_DIR)
    }

    /// User data that survives update swaps.
    pub fn persisted_dir(&self) -> PathBuf {
        self.data_root.join(PERSISTED_DIR)
    }

    pub fn public_dir(&self) -> PathBuf {
        self.live_dir().join("public")
    }

    pub fn env_file(&self) -> PathBuf {
        self.live_dir().join(".env")
    }

    /// Applied-update marker; present only after a downloaded archive has
    /// been fully extracted.
    pub fn marker_file(&self) -> PathBuf {
        self.live_dir().join(".ota_applied")
    }

    pub fn database_file(&self) -> PathBuf {
        self.persisted_dir().join("database/database.sqlite")
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.persisted_dir().join("storage")
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.storage_dir().join("framework/sessions")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.storage_dir().join("framework/cache")
    }

    pub fn views_dir(&self) -> PathBuf {
        self.storage_dir().join("framework/views")
    }

    pub fn app_key_file(&self) -> PathBuf {
        self.persisted_dir().join("appkey.txt")
    }

    pub fn cookies_file(&self) -> PathBuf {
        self.data_root.join("cookies.json")
    }

    /// Scratch area for in-flight archive downloads.
    pub fn scratch_dir(&self) -> PathBuf {
        self.data_root.join("cache")
    }

    pub fn entry_script_path(&self) -> PathBuf {
        self.live_dir().join(&self.entry_script)
    }

    pub fn bundle_path(&self) -> PathBuf {
        if self.bundle.is_absolute() {
            self.bundle.clone()
        } else {
            self.data_root.join(&self.bundle)
        }
    }

    /// Host portion of the configured origin, for same-origin checks.
    pub fn origin_host(&self) -> Option<String> {
        url::Url::parse(&self.origin)
            .ok()
            .and_then(|u| u.host_str().map(str::to_owned))
    }

    pub fn with_data_root(mut self, data_root: impl AsRef<Path>) -> Self {
        self.data_root = data_root.as_ref().to_path_buf();
        self
    }
}
