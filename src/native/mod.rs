//! Device-feature invocations behind one uniform contract.
//!
//! Platform callback objects are modelled as a small polymorphic action
//! interface: the host supplies a [`NativeInvoker`] owning its permission
//! flows, and the coordinator forwards every produced event to the surface.

pub mod event;

pub use event::{EVENT_ENDPOINT, EventSink, NativeEvent, injection_script};

use crate::error::NativeError;
use std::sync::Arc;

/// The device features the application can ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeAction {
    Vibrate,
    Toast { message: String },
    Alert { title: String, message: String },
    Share { title: String, message: String },
    Flashlight,
    Camera,
    Biometric,
    PushToken,
}

impl NativeAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Vibrate => "vibrate",
            Self::Toast { .. } => "toast",
            Self::Alert { .. } => "alert",
            Self::Share { .. } => "share",
            Self::Flashlight => "flashlight",
            Self::Camera => "camera",
            Self::Biometric => "biometric",
            Self::PushToken => "push-token",
        }
    }
}

/// Platform implementation of the actions, including permission prompts.
///
/// Fire-and-forget actions return `Ok(None)`; actions with a result (photo
/// captured, biometric verdict, push token) return the event to publish.
pub trait NativeInvoker: Send + Sync {
    fn invoke(&self, action: &NativeAction) -> Result<Option<NativeEvent>, NativeError>;
}

/// Owns the platform invoker and the event path back into the surface.
pub struct ActionCoordinator {
    invoker: Box<dyn NativeInvoker>,
    sink: Arc<dyn EventSink>,
}

impl ActionCoordinator {
    pub fn new(invoker: Box<dyn NativeInvoker>, sink: Arc<dyn EventSink>) -> Self {
        Self { invoker, sink }
    }

    /// Run one action; any produced event is dispatched to the surface
    /// before being handed back.
    pub fn invoke(&self, action: &NativeAction) -> Result<Option<NativeEvent>, NativeError> {
        match self.invoker.invoke(action) {
            Ok(Some(event)) => {
                self.dispatch(&event);
                Ok(Some(event))
            }
            Ok(None) => Ok(None),
            Err(error) => {
                tracing::warn!(action = action.name(), %error, "native action failed");
                Err(error)
            }
        }
    }

    /// Publish an event to the page: custom UI event plus the in-app POST.
    pub fn dispatch(&self, event: &NativeEvent) {
        tracing::debug!(event = %event.event, "📢 dispatching native event");
        self.sink.evaluate_script(&injection_script(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    struct RecordingSink(Mutex<Vec<String>>);

    impl EventSink for RecordingSink {
        fn evaluate_script(&self, script: &str) {
            self.0.lock().unwrap().push(script.to_owned());
        }
    }

    struct FakeInvoker;

    impl NativeInvoker for FakeInvoker {
        fn invoke(&self, action: &NativeAction) -> Result<Option<NativeEvent>, NativeError> {
            match action {
                NativeAction::Camera => Ok(Some(NativeEvent::new(
                    "camera.photo-taken",
                    json!({"path": "/tmp/captured.jpg"}),
                ))),
                NativeAction::Vibrate => Ok(None),
                NativeAction::Biometric => Err(NativeError::Unsupported {
                    action: "biometric".into(),
                }),
                _ => Ok(None),
            }
        }
    }

    fn coordinator() -> (Arc<RecordingSink>, ActionCoordinator) {
        let sink = Arc::new(RecordingSink(Mutex::new(Vec::new())));
        let coordinator = ActionCoordinator::new(Box::new(FakeInvoker), sink.clone());
        (sink, coordinator)
    }

    #[test]
    fn resulting_event_reaches_the_sink() {
        let (sink, coordinator) = coordinator();
        let event = coordinator.invoke(&NativeAction::Camera).unwrap().unwrap();

        assert_eq!(event.event, "camera.photo-taken");
        let scripts = sink.0.lock().unwrap();
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].contains("camera.photo-taken"));
    }

    #[test]
    fn fire_and_forget_actions_produce_no_event() {
        let (sink, coordinator) = coordinator();
        assert!(coordinator.invoke(&NativeAction::Vibrate).unwrap().is_none());
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[test]
    fn invoker_errors_pass_through() {
        let (_sink, coordinator) = coordinator();
        let err = coordinator.invoke(&NativeAction::Biometric).unwrap_err();
        assert!(matches!(err, NativeError::Unsupported { .. }));
    }
}
