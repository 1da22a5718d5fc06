//! JSON export of computed diagnostics.

use eqwatch_types::format_timestamp;
use serde_json::{json, Value};

use super::diagnostics::{DiagnosticsData, EventData};
use super::duration::format_duration;

fn event_json(event: &EventData, top: usize) -> Value {
    json!({
        "index": event.index,
        "start": format_timestamp(&event.range.start),
        "end": format_timestamp(&event.range.end),
        "duration": format_duration(event.duration()),
        "labeled": event.labeled,
        "top_sensors": event.sensors.iter().take(top).map(|s| json!({"sensor": s.sensor, "value": s.value})).collect::<Vec<_>>(),
        "components": event.components.components.iter().map(|c| json!({"component": c.component, "value": c.value})).collect::<Vec<_>>(),
        "unresolved": event.components.unresolved.iter().map(|s| json!({"sensor": s.sensor, "value": s.value})).collect::<Vec<_>>(),
    })
}

/// Build the export document, keeping `top` sensors per list.
pub fn to_json(data: &DiagnosticsData, top: usize) -> Value {
    let normalized = data.components.normalized();

    json!({
        "model": data.model_name,
        "status": data.status,
        "window": data.window.map(|w| json!({
            "start": format_timestamp(&w.start),
            "end": format_timestamp(&w.end),
        })),
        "policy": data.policy,
        "summary": {
            "labeled_events": data.summary.matches.len(),
            "detected_events": data.summary.detected_count(),
            "unknown_events": data.unknown_count(),
            "predicted_ranges": data.events.len(),
            "recall": data.summary.recall(),
        },
        "sensors": data.sensors.iter().take(top).map(|s| json!({"sensor": s.sensor, "value": s.value})).collect::<Vec<_>>(),
        "components": data.components.components.iter().zip(&normalized.components).map(|(raw, norm)| json!({
            "component": raw.component,
            "value": raw.value,
            "share": norm.value,
        })).collect::<Vec<_>>(),
        "unresolved": data.components.unresolved.iter().zip(&normalized.unresolved).map(|(raw, norm)| json!({
            "sensor": raw.sensor,
            "value": raw.value,
            "share": norm.value,
        })).collect::<Vec<_>>(),
        "events": data.events.iter().map(|e| event_json(e, top)).collect::<Vec<_>>(),
    })
}
