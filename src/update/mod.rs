//! Update Manager.
//!
//! Runs exactly once per process lifetime, early, before the bridge accepts
//! traffic. Decides between three end states: stay on the current tree,
//! extract the shipped bundle, or download and apply a channel update. Every
//! network or extraction failure degrades to "stay on current version";
//! startup never fails because an update did.

pub mod archive;
pub mod manifest;
pub mod remote;

pub use manifest::VersionManifest;
pub use remote::{UpdateCheck, UpdateClient};

use crate::config::{DEV_VERSION_SENTINEL, HostConfig};
use crate::error::UpdateError;
use anyhow::{Context, Result};
use std::fs;

/// What one update run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Development sentinel: no network call, no extraction.
    DevBuild,
    /// Channel update downloaded and applied.
    Applied { version: String },
    /// Shipped bundle extracted into the live tree.
    BundledExtracted { version: Option<String> },
    /// Nothing to do; the live tree stays as it is.
    UpToDate,
}

pub struct UpdateManager {
    config: HostConfig,
    client: UpdateClient,
}

impl UpdateManager {
    pub fn new(config: &HostConfig) -> Self {
        Self {
            config: config.clone(),
            client: UpdateClient::new(&config.update),
        }
    }

    /// Run the full check/apply cycle.
    ///
    /// Only data-root scaffolding errors propagate; those mean the host gave
    /// us an unusable storage location and nothing downstream can work.
    pub async fn run(&self) -> Result<UpdateOutcome> {
        self.scaffold().context("Failed to prepare data root")?;

        let bundled = match manifest::read_bundled(&self.config.bundle_path()) {
            Ok(manifest) => manifest,
            Err(error) => {
                tracing::warn!(%error, "bundled manifest unreadable");
                VersionManifest::default()
            }
        };

        // The installed override takes precedence once written; first boot
        // falls back to the copy inside the shipped archive.
        let override_version = self.installed_override();
        let installed = override_version
            .clone()
            .or_else(|| bundled.version.clone())
            .unwrap_or_else(|| "0.0.0".to_owned());

        if installed == DEV_VERSION_SENTINEL {
            tracing::info!("development build, update checking disabled");
            return Ok(UpdateOutcome::DevBuild);
        }

        if let Some(channel) = bundled.channel.as_deref() {
            match self.try_channel_update(channel, &installed).await {
                Ok(Some(version)) => {
                    tracing::info!(%version, "✅ channel update applied");
                    return Ok(UpdateOutcome::Applied { version });
                }
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!(%error, "update check failed, staying on current version");
                }
            }
        } else {
            tracing::debug!("no update channel configured");
        }

        self.ensure_bundled_extracted(override_version.as_deref(), &bundled)
    }

    // ── Channel path ─────────────────────────────────────────────────────

    /// Query the channel; download and apply when behind. `Ok(None)` means
    /// up to date or nothing actionable.
    async fn try_channel_update(
        &self,
        channel: &str,
        installed: &str,
    ) -> Result<Option<String>, UpdateError> {
        let check = self.client.check(channel, installed).await?;
        if check.up_to_date {
            tracing::info!("app is up to date");
            return Ok(None);
        }
        if check.download_url.is_empty() || check.current_version == installed {
            return Ok(None);
        }

        tracing::info!("📥 update available: {installed} → {}", check.current_version);

        let scratch_dir = self.config.scratch_dir();
        fs::create_dir_all(&scratch_dir)?;
        let scratch = scratch_dir.join(format!("ota_update_{}.zip", check.current_version));

        let applied = self.apply(&scratch, &check).await;
        if applied.is_err() {
            // Best-effort cleanup; a partially applied tree is accepted and
            // retried on next launch since the marker was never written.
            let _ = fs::remove_file(&scratch);
        }
        applied.map(|()| Some(check.current_version))
    }

    async fn apply(
        &self,
        scratch: &std::path::Path,
        check: &UpdateCheck,
    ) -> Result<(), UpdateError> {
        self.client.download_to(&check.download_url, scratch).await?;

        let live = self.config.live_dir();
        if live.exists() {
            archive::clean_tree_except(&live, &self.config.update.preserve_paths)?;
        } else {
            fs::create_dir_all(&live)?;
        }

        tracing::info!("📦 extracting update archive");
        archive::extract(scratch, &live)?;

        manifest::rewrite_version(&self.config.env_file(), &check.current_version)
            .map_err(|e| UpdateError::Extract(e.to_string()))?;
        manifest::write_marker(&self.config.marker_file(), &check.current_version)
            .map_err(|e| UpdateError::Extract(e.to_string()))?;

        let _ = fs::remove_file(scratch);
        Ok(())
    }

    // ── Bundled path ─────────────────────────────────────────────────────

    /// Extract the shipped archive unless an applied update or a matching
    /// installed version says the live tree is already right.
    fn ensure_bundled_extracted(
        &self,
        installed_override: Option<&str>,
        bundled: &VersionManifest,
    ) -> Result<UpdateOutcome> {
        if let Some(applied) = manifest::read_marker(&self.config.marker_file()) {
            tracing::debug!(version = %applied, "applied update active, skipping bundle");
            return Ok(UpdateOutcome::UpToDate);
        }

        let Some(bundled_version) = bundled.version.as_deref() else {
            tracing::warn!("cannot read bundled version, leaving live tree untouched");
            return Ok(UpdateOutcome::UpToDate);
        };

        if installed_override == Some(bundled_version) {
            tracing::debug!(version = bundled_version, "live tree matches shipped bundle");
            return Ok(UpdateOutcome::UpToDate);
        }

        tracing::info!(version = bundled_version, "📦 extracting shipped bundle");
        let live = self.config.live_dir();
        if live.exists() {
            archive::clean_tree_except(&live, &self.config.update.preserve_paths)
                .context("Failed to clean live tree")?;
        } else {
            fs::create_dir_all(&live).context("Failed to create live tree")?;
        }
        archive::extract(&self.config.bundle_path(), &live)
            .context("Failed to extract shipped bundle")?;

        // Back on the shipped version; a stale marker must not suppress
        // future extractions.
        manifest::clear_marker(&self.config.marker_file());

        Ok(UpdateOutcome::BundledExtracted {
            version: Some(bundled_version.to_owned()),
        })
    }

    // ── First-boot scaffolding ───────────────────────────────────────────

    /// Version recorded in the live tree's environment file, if any.
    fn installed_override(&self) -> Option<String> {
        let env_file = self.config.env_file();
        if !env_file.exists() {
            return None;
        }
        match manifest::read_env_file(&env_file) {
            Ok(manifest) => manifest.version,
            Err(error) => {
                tracing::warn!(%error, "installed environment file unreadable");
                None
            }
        }
    }

    /// Create the persisted directories and the database file so the
    /// runtime finds its world in place on first request.
    fn scaffold(&self) -> Result<(), UpdateError> {
        for dir in [
            self.config.storage_dir().join("app"),
            self.config.storage_dir().join("logs"),
            self.config.cache_dir(),
            self.config.sessions_dir(),
            self.config.views_dir(),
        ] {
            fs::create_dir_all(dir)?;
        }

        let database = self.config.database_file();
        if let Some(parent) = database.parent() {
            fs::create_dir_all(parent)?;
        }
        if !database.exists() {
            fs::File::create(&database)?;
            tracing::debug!(path = %database.display(), "created empty database file");
        }

        Ok(())
    }
}
