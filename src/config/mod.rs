pub mod schema;

pub use schema::{APP_TREE_DIR, DEV_VERSION_SENTINEL, HostConfig, PERSISTED_DIR, UpdateConfig};

use crate::error::ConfigError;
use std::fs;
use std::path::Path;

impl HostConfig {
    /// Load `hearth.toml` from the data root, or fall back to defaults.
    ///
    /// The data root is created if missing so first boot can proceed straight
    /// to bundle extraction.
    pub fn load_or_init(data_root: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data_root = data_root.as_ref();
        if !data_root.exists() {
            fs::create_dir_all(data_root)?;
        }

        let config_path = data_root.join("hearth.toml");
        let config = if config_path.exists() {
            let contents = fs::read_to_string(&config_path)?;
            toml::from_str::<Self>(&contents)
                .map_err(|e| ConfigError::Load(format!("{}: {e}", config_path.display())))?
        } else {
            Self::default()
        };

        let config = config.with_data_root(data_root);
        if config.origin_host().is_none() {
            return Err(ConfigError::Validation(format!(
                "origin is not a valid URL: {}",
                config.origin
            )));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = HostConfig::load_or_init(dir.path()).unwrap();
        assert_eq!(config.origin, "http://127.0.0.1");
        assert_eq!(config.data_root, dir.path());
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("hearth.toml"),
            "origin = \"http://localhost\"\n\n[update]\ncheck_timeout_secs = 3\n",
        )
        .unwrap();

        let config = HostConfig::load_or_init(dir.path()).unwrap();
        assert_eq!(config.origin, "http://localhost");
        assert_eq!(config.update.check_timeout_secs, 3);
        // Unlisted fields keep their defaults.
        assert_eq!(config.update.download_timeout_secs, 30);
    }

    #[test]
    fn bad_origin_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hearth.toml"), "origin = \"not a url\"\n").unwrap();

        let err = HostConfig::load_or_init(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn unparseable_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hearth.toml"), "origin = [not toml").unwrap();

        let err = HostConfig::load_or_init(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }
}
