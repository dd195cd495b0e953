//! Bus subscriber that mirrors every application event into the log.

use conviz_events::{ALL_EVENT_TYPES, AppEvent, EventBus, EventData, Subscription};
use tracing::{debug, info, warn};

/// Subscribe a logging handler to every event type.
pub fn attach(bus: &EventBus) -> Subscription {
    bus.subscribe_to_many(&ALL_EVENT_TYPES, |event| {
        log_event(event);
        Ok(())
    })
}

fn log_event(event: &AppEvent) {
    let event_type = event.event_type();
    match &event.data {
        EventData::Error(e) => {
            warn!(%event_type, event_id = %event.id, code = %e.code, message = %e.message, "application error");
        }
        EventData::VisualizationReady(r) => {
            info!(%event_type, event_id = %event.id, visualization_id = %r.visualization_id, "visualization ready");
        }
        EventData::SystemStatus(s) => {
            debug!(%event_type, event_id = %event.id, status = ?s.status, message = ?s.message, "system status");
        }
        _ => debug!(%event_type, event_id = %event.id, "event"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conviz_core::logging::capture_logs;
    use conviz_events::{EventType, Status};
    use tracing::Level;

    #[test]
    fn covers_every_event_type() {
        let bus = EventBus::new();
        let sub = attach(&bus);
        for t in ALL_EVENT_TYPES {
            assert_eq!(bus.handler_count(t), 1, "{t}");
        }
        sub.unsubscribe();
        assert_eq!(bus.handler_count(EventType::Error), 0);
    }

    #[test]
    fn errors_are_logged_as_warnings() {
        let (logs, _guard) = capture_logs();
        let bus = EventBus::new();
        let _sub = attach(&bus);

        bus.publish(AppEvent::error("STORE_ERROR", "disk full", None));
        bus.publish(AppEvent::system_status(Status::Ready, None));

        assert!(logs.has_event(Level::WARN, "application error"));
        let warning = logs
            .events()
            .into_iter()
            .find(|e| e.level == Level::WARN)
            .unwrap();
        assert_eq!(warning.field("code"), Some("STORE_ERROR"));
        assert!(logs.has_event(Level::DEBUG, "system status"));
    }
}
