//! Native-feature results published to the web surface.

use serde_json::Value;

/// Fixed in-app endpoint the event payload is POSTed to, so the runtime can
/// observe device events server-side as well.
pub const EVENT_ENDPOINT: &str = "/_native/api/events";

/// Seam to the web surface's script evaluator.
pub trait EventSink: Send + Sync {
    fn evaluate_script(&self, script: &str);
}

/// One named device event with a JSON payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeEvent {
    pub event: String,
    pub payload: Value,
}

impl NativeEvent {
    pub fn new(event: impl Into<String>, payload: Value) -> Self {
        Self {
            event: event.into(),
            payload,
        }
    }
}

/// Script delivering an event into the page: raises the custom UI-level
/// event and POSTs the same payload to the in-app endpoint.
pub fn injection_script(event: &NativeEvent) -> String {
    // Both values go through JSON encoding; nothing from the payload can
    // break out of the script.
    let name = serde_json::to_string(&event.event).unwrap_or_else(|_| "\"\"".into());
    let payload = event.payload.to_string();

    format!(
        r#"(function () {{
    const payload = {payload};
    const detail = {{ event: {name}, payload }};
    document.dispatchEvent(new CustomEvent("native-event", {{ detail }}));
    fetch("{EVENT_ENDPOINT}", {{
        method: "POST",
        headers: {{
            "Content-Type": "application/json",
            "X-Requested-With": "XMLHttpRequest"
        }},
        body: JSON.stringify({{ event: {name}, payload: payload }})
    }}).catch(error => console.error("native event dispatch failed:", error));
}})();"#
    )
}
