//! Top-level composition root.
//!
//! Owns every shared service explicitly (cookie jar, CSRF holder, runtime
//! worker) and wires them together; there are no ambient globals. Boot
//! order follows startup: update manager first, then the bridge, so the
//! surface can gate its loading state on [`HearthHost::update_outcome`].

use crate::assets::AssetResolver;
use crate::bridge::{BridgedRequest, BridgedResponse, RequestBridge, RuntimeWorker};
use crate::config::HostConfig;
use crate::error::Result;
use crate::runtime::{RuntimeEnv, ScriptRuntime};
use crate::security::{CookieJar, CookieMirror, CsrfGuard};
use crate::update::{UpdateManager, UpdateOutcome};
use std::sync::Arc;

pub struct HearthHost {
    config: HostConfig,
    bridge: RequestBridge,
    assets: AssetResolver,
    jar: Arc<CookieJar>,
    csrf: Arc<CsrfGuard>,
    update: UpdateOutcome,
}

impl HearthHost {
    /// Bring the host up: apply pending updates, restore session state,
    /// start the runtime worker. No traffic is accepted until this returns.
    pub async fn boot(
        config: HostConfig,
        runtime: Box<dyn ScriptRuntime>,
        mirror: Arc<dyn CookieMirror>,
    ) -> Result<Self> {
        let update = UpdateManager::new(&config).run().await?;
        tracing::info!(outcome = ?update, "update manager finished");

        let jar = Arc::new(CookieJar::load(config.cookies_file()));
        let csrf = Arc::new(CsrfGuard::new());

        let env = RuntimeEnv::new(&config)?;
        let worker = RuntimeWorker::spawn(runtime)?;
        let bridge = RequestBridge::new(&config, worker, env, jar.clone(), csrf.clone(), mirror);
        let assets = AssetResolver::new(config.public_dir());

        Ok(Self {
            config,
            bridge,
            assets,
            jar,
            csrf,
            update,
        })
    }

    /// One intercepted surface request: static asset when the resolver has
    /// it on disk, the bridge otherwise.
    pub async fn handle(&self, request: BridgedRequest) -> BridgedResponse {
        if request.method == "GET" {
            if let Some(asset) = self.assets.resolve(&request.path) {
                match tokio::fs::read(&asset.path).await {
                    Ok(body) => {
                        return BridgedResponse::new(200, asset.response_headers(), body);
                    }
                    Err(error) => {
                        tracing::warn!(%error, path = %asset.path.display(),
                            "resolved asset unreadable, falling through to runtime");
                    }
                }
            }
        }
        self.bridge.handle(request).await
    }

    /// What the update manager did this launch; the surface keeps its
    /// splash up until this is available.
    pub fn update_outcome(&self) -> &UpdateOutcome {
        &self.update
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn cookie_jar(&self) -> &Arc<CookieJar> {
        &self.jar
    }

    pub fn csrf(&self) -> &Arc<CsrfGuard> {
        &self.csrf
    }

    /// Explicit session reset: jar and token both cleared.
    pub fn reset_session(&self) {
        self.jar.clear();
        self.csrf.clear();
    }
}
