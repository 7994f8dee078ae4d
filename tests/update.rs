//! Update Manager end states: channel apply, bundled extraction, sentinel,
//! and degradation on network failure.

use hearth::config::HostConfig;
use hearth::update::{UpdateManager, UpdateOutcome};
use std::fs;
use std::io::Write;
use std::path::Path;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_zip(dest: &Path, entries: &[(&str, &str)]) {
    let file = fs::File::create(dest).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();
    for (name, content) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

/// Data root with a shipped bundle at version 1.0.0 on channel `chan-1`.
fn seeded_root(endpoint: &str) -> (tempfile::TempDir, HostConfig) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = HostConfig::default().with_data_root(dir.path());
    config.update.endpoint = endpoint.to_owned();

    write_zip(
        &config.bundle_path(),
        &[
            (".env", "APP_VERSION=1.0.0\nCHANNEL_ID=chan-1\n"),
            ("public/index.php", "<?php echo 'v1';"),
        ],
    );
    (dir, config)
}

/// Live tree already extracted at the given version, with one preserved
/// user file and one file an update should sweep away.
fn installed_tree(config: &HostConfig, version: &str) {
    let live = config.live_dir();
    fs::create_dir_all(live.join("storage/app")).unwrap();
    fs::create_dir_all(live.join("vendor")).unwrap();
    fs::write(
        config.env_file(),
        format!("APP_VERSION={version}\nCHANNEL_ID=chan-1\n"),
    )
    .unwrap();
    fs::write(live.join("storage/app/user.txt"), "precious user bytes").unwrap();
    fs::write(live.join("vendor/old.php"), "stale code").unwrap();
}

#[tokio::test]
async fn channel_update_is_downloaded_and_applied() {
    let server = MockServer::start().await;
    let (dir, config) = seeded_root(&server.uri());
    installed_tree(&config, "1.0.0");

    let update_zip = dir.path().join("staged-update.zip");
    write_zip(
        &update_zip,
        &[
            (".env", "APP_VERSION=1.1.0\nCHANNEL_ID=chan-1\n"),
            ("public/index.php", "<?php echo 'v2';"),
        ],
    );

    Mock::given(method("GET"))
        .and(path("/apps/chan-1/ota"))
        .and(query_param("installed", "1.0.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "upToDate": false,
            "current_version": "1.1.0",
            "download_url": format!("{}/archives/1.1.0.zip", server.uri()),
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/archives/1.1.0.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(fs::read(&update_zip).unwrap()))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = UpdateManager::new(&config).run().await.unwrap();
    assert_eq!(
        outcome,
        UpdateOutcome::Applied {
            version: "1.1.0".into()
        }
    );

    // Version rewritten, marker recorded.
    let env = fs::read_to_string(config.env_file()).unwrap();
    assert!(env.contains("APP_VERSION=1.1.0"));
    assert_eq!(
        fs::read_to_string(config.marker_file()).unwrap().trim(),
        "1.1.0"
    );

    // New tree in place, preserved bytes untouched, stale code gone.
    assert_eq!(
        fs::read_to_string(config.live_dir().join("public/index.php")).unwrap(),
        "<?php echo 'v2';"
    );
    assert_eq!(
        fs::read_to_string(config.live_dir().join("storage/app/user.txt")).unwrap(),
        "precious user bytes"
    );
    assert!(!config.live_dir().join("vendor/old.php").exists());

    // Scratch download cleaned up.
    let leftovers: Vec<_> = fs::read_dir(config.scratch_dir())
        .map(|it| it.filter_map(|e| e.ok()).collect())
        .unwrap_or_default();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn development_sentinel_skips_network_and_extraction() {
    let server = MockServer::start().await;
    let (_dir, config) = seeded_root(&server.uri());
    installed_tree(&config, "DEBUG");

    // Any request to the update service would fail the test.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = UpdateManager::new(&config).run().await.unwrap();
    assert_eq!(outcome, UpdateOutcome::DevBuild);

    // Live tree untouched: no bundle content, stale file still present.
    assert!(config.live_dir().join("vendor/old.php").exists());
    assert!(!config.live_dir().join("public/index.php").exists());
}

#[tokio::test]
async fn up_to_date_channel_leaves_tree_alone() {
    let server = MockServer::start().await;
    let (_dir, config) = seeded_root(&server.uri());
    installed_tree(&config, "1.0.0");

    Mock::given(method("GET"))
        .and(path("/apps/chan-1/ota"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"upToDate": true})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let outcome = UpdateManager::new(&config).run().await.unwrap();
    assert_eq!(outcome, UpdateOutcome::UpToDate);
    assert!(config.live_dir().join("vendor/old.php").exists());
}

#[tokio::test]
async fn check_failure_degrades_to_current_version() {
    let server = MockServer::start().await;
    let (_dir, config) = seeded_root(&server.uri());
    installed_tree(&config, "1.0.0");

    Mock::given(method("GET"))
        .and(path("/apps/chan-1/ota"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let outcome = UpdateManager::new(&config).run().await.unwrap();

    // Installed matches the bundle, so nothing is re-extracted either.
    assert_eq!(outcome, UpdateOutcome::UpToDate);
    assert!(config.live_dir().join("vendor/old.php").exists());
}

#[tokio::test]
async fn first_boot_extracts_the_shipped_bundle() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = HostConfig::default().with_data_root(dir.path());
    config.update.endpoint = server.uri();

    // No channel in this bundle: straight to extraction.
    write_zip(
        &config.bundle_path(),
        &[
            (".env", "APP_VERSION=1.0.0\n"),
            ("public/index.php", "<?php echo 'v1';"),
        ],
    );

    let outcome = UpdateManager::new(&config).run().await.unwrap();
    assert_eq!(
        outcome,
        UpdateOutcome::BundledExtracted {
            version: Some("1.0.0".into())
        }
    );
    assert_eq!(
        fs::read_to_string(config.live_dir().join("public/index.php")).unwrap(),
        "<?php echo 'v1';"
    );
    // Persisted scaffolding came up alongside.
    assert!(config.sessions_dir().is_dir());
    assert!(config.database_file().is_file());
}

#[tokio::test]
async fn applied_marker_suppresses_bundle_re_extraction() {
    let server = MockServer::start().await;
    let (_dir, config) = seeded_root(&server.uri());
    installed_tree(&config, "1.1.0");
    fs::write(config.marker_file(), "1.1.0").unwrap();

    Mock::given(method("GET"))
        .and(path("/apps/chan-1/ota"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"upToDate": true})),
        )
        .mount(&server)
        .await;

    let outcome = UpdateManager::new(&config).run().await.unwrap();
    assert_eq!(outcome, UpdateOutcome::UpToDate);

    // The downloaded version stays live; the shipped bundle is not restored.
    assert!(!config.live_dir().join("public/index.php").exists());
    assert!(config.live_dir().join("vendor/old.php").exists());
}
