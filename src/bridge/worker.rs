//! Dedicated runtime worker.
//!
//! The embedded runtime is not safely re-entrant, so every invocation in the
//! process funnels through one OS thread that owns the instance. Callers
//! submit over an unbounded queue and await a oneshot reply; only the
//! calling task blocks, never the UI-facing thread pool.

use crate::error::BridgeError;
use crate::runtime::{Invocation, ScriptRuntime};
use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};

struct Job {
    call: Invocation,
    reply: oneshot::Sender<anyhow::Result<Vec<u8>>>,
}

/// Handle to the worker thread; cheap to clone.
#[derive(Clone)]
pub struct RuntimeWorker {
    tx: mpsc::UnboundedSender<Job>,
}

impl RuntimeWorker {
    /// Move the runtime onto its dedicated thread and start draining jobs.
    /// The thread exits when the last handle is dropped.
    pub fn spawn(mut runtime: Box<dyn ScriptRuntime>) -> Result<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

        std::thread::Builder::new()
            .name("runtime-worker".into())
            .spawn(move || {
                while let Some(job) = rx.blocking_recv() {
                    let result = runtime.invoke(&job.call);
                    // Receiver gone means the caller gave up; nothing to do.
                    let _ = job.reply.send(result);
                }
                tracing::debug!("runtime worker shutting down");
            })
            .context("Failed to spawn runtime worker thread")?;

        Ok(Self { tx })
    }

    /// Submit one invocation and await its raw output. Blocking from the
    /// runtime's point of view, asynchronous from the caller's.
    pub async fn invoke(&self, call: Invocation) -> std::result::Result<Vec<u8>, BridgeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Job {
                call,
                reply: reply_tx,
            })
            .map_err(|_| BridgeError::WorkerGone)?;

        match reply_rx.await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(error)) => Err(BridgeError::Invocation(format!("{error:#}"))),
            Err(_) => Err(BridgeError::WorkerGone),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    struct EchoRuntime;

    impl ScriptRuntime for EchoRuntime {
        fn invoke(&mut self, call: &Invocation) -> anyhow::Result<Vec<u8>> {
            Ok(format!("{} {}", call.method, call.uri).into_bytes())
        }
    }

    struct FailingRuntime;

    impl ScriptRuntime for FailingRuntime {
        fn invoke(&mut self, _call: &Invocation) -> anyhow::Result<Vec<u8>> {
            anyhow::bail!("interpreter exploded")
        }
    }

    fn call(uri: &str) -> Invocation {
        Invocation {
            method: "GET".into(),
            uri: uri.into(),
            body: None,
            script: PathBuf::from("bootstrap/native.php"),
            env: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn invocations_round_trip_through_the_worker() {
        let worker = RuntimeWorker::spawn(Box::new(EchoRuntime)).unwrap();
        let output = worker.invoke(call("/home")).await.unwrap();
        assert_eq!(output, b"GET /home");
    }

    #[tokio::test]
    async fn runtime_errors_surface_as_invocation_failures() {
        let worker = RuntimeWorker::spawn(Box::new(FailingRuntime)).unwrap();
        let err = worker.invoke(call("/boom")).await.unwrap_err();
        assert!(matches!(err, BridgeError::Invocation(_)));
        assert!(err.to_string().contains("interpreter exploded"));
    }

    #[tokio::test]
    async fn worker_serializes_calls_in_submission_order() {
        struct Recorder(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

        impl ScriptRuntime for Recorder {
            fn invoke(&mut self, call: &Invocation) -> anyhow::Result<Vec<u8>> {
                self.0.lock().unwrap().push(call.uri.clone());
                Ok(Vec::new())
            }
        }

        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let worker = RuntimeWorker::spawn(Box::new(Recorder(seen.clone()))).unwrap();

        for i in 0..8 {
            worker.invoke(call(&format!("/{i}"))).await.unwrap();
        }

        let order: Vec<String> = seen.lock().unwrap().clone();
        let expected: Vec<String> = (0..8).map(|i| format!("/{i}")).collect();
        assert_eq!(order, expected);
    }
}
