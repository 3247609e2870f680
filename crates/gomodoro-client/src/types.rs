//! Value types mirroring the gomodoro GraphQL schema.
//!
//! All of these are read-mostly copies of server-owned state. The server is
//! the sole timing authority; nothing here advances a clock locally.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a timer session, as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PomodoroState {
    Active,
    Paused,
    Finished,
}

/// Phase within a timer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PomodoroPhase {
    Work,
    ShortBreak,
    LongBreak,
}

/// One timer session snapshot.
///
/// Invariant (server-enforced, relied on for display only):
/// `remaining_time_sec <= phase_duration_sec`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pomodoro {
    pub id: String,
    pub state: PomodoroState,
    /// Empty string when the server reports no associated task (absent or
    /// null on the wire). This is the only place the default is applied.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub task_id: String,
    pub phase: PomodoroPhase,
    pub phase_count: u32,
    pub phase_duration_sec: u32,
    pub remaining_time_sec: u32,
    pub elapsed_time_sec: u32,
}

/// Input for the `startPomodoro` mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartPomodoroInput {
    pub work_duration_sec: u32,
    pub break_duration_sec: u32,
    pub long_break_duration_sec: u32,
    pub task_id: String,
}

/// A task the timer can be associated with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Category filter for the `eventReceived` subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventCategory {
    Pomodoro,
    Task,
}

/// Event discriminator carried alongside the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    PomodoroStarted,
    PomodoroPaused,
    PomodoroResumed,
    PomodoroStopped,
    PomodoroCompleted,
    PomodoroTick,
    TaskCreated,
    TaskUpdated,
    TaskDeleted,
}

/// Tagged union payload of a push event.
///
/// The server discriminates via `__typename`; matching is exhaustive so a
/// schema addition fails loudly at deserialization instead of being sniffed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "__typename")]
pub enum EventPayload {
    #[serde(rename = "EventPomodoroPayload")]
    Pomodoro(Pomodoro),
    #[serde(rename = "EventTaskPayload")]
    Task(Task),
}

/// Envelope of one `eventReceived` push message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub event_category: EventCategory,
    pub event_type: EventType,
    pub payload: Option<EventPayload>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pomodoro_wire_roundtrip() {
        let wire = json!({
            "id": "p1",
            "state": "ACTIVE",
            "taskId": "t1",
            "phase": "WORK",
            "phaseCount": 1,
            "phaseDurationSec": 1500,
            "remainingTimeSec": 1500,
            "elapsedTimeSec": 0,
        });
        let p: Pomodoro = serde_json::from_value(wire).unwrap();
        assert_eq!(p.state, PomodoroState::Active);
        assert_eq!(p.phase, PomodoroPhase::Work);
        assert_eq!(p.phase_duration_sec, 1500);
        assert_eq!(p.remaining_time_sec, 1500);

        let back = serde_json::to_value(&p).unwrap();
        assert_eq!(back["taskId"], "t1");
        assert_eq!(back["state"], "ACTIVE");
    }

    #[test]
    fn test_missing_task_id_defaults_empty() {
        let wire = json!({
            "id": "p1",
            "state": "PAUSED",
            "phase": "SHORT_BREAK",
            "phaseCount": 2,
            "phaseDurationSec": 300,
            "remainingTimeSec": 120,
            "elapsedTimeSec": 180,
        });
        let p: Pomodoro = serde_json::from_value(wire).unwrap();
        assert_eq!(p.task_id, "");
    }

    #[test]
    fn test_null_task_id_defaults_empty() {
        let wire = json!({
            "id": "p1",
            "state": "ACTIVE",
            "taskId": null,
            "phase": "WORK",
            "phaseCount": 1,
            "phaseDurationSec": 1500,
            "remainingTimeSec": 900,
            "elapsedTimeSec": 600,
        });
        let p: Pomodoro = serde_json::from_value(wire).unwrap();
        assert_eq!(p.task_id, "");
    }

    #[test]
    fn test_event_payload_discriminated_by_typename() {
        let wire = json!({
            "eventCategory": "POMODORO",
            "eventType": "POMODORO_TICK",
            "payload": {
                "__typename": "EventPomodoroPayload",
                "id": "p1",
                "state": "ACTIVE",
                "taskId": "t1",
                "phase": "WORK",
                "phaseCount": 1,
                "phaseDurationSec": 1500,
                "remainingTimeSec": 1499,
                "elapsedTimeSec": 1,
            },
        });
        let env: EventEnvelope = serde_json::from_value(wire).unwrap();
        assert_eq!(env.event_type, EventType::PomodoroTick);
        match env.payload {
            Some(EventPayload::Pomodoro(p)) => assert_eq!(p.remaining_time_sec, 1499),
            other => panic!("expected pomodoro payload, got {other:?}"),
        }
    }

    #[test]
    fn test_task_payload_variant() {
        let wire = json!({
            "eventCategory": "TASK",
            "eventType": "TASK_CREATED",
            "payload": {
                "__typename": "EventTaskPayload",
                "id": "t9",
                "title": "write report",
                "createdAt": "2024-05-01T09:30:00Z",
            },
        });
        let env: EventEnvelope = serde_json::from_value(wire).unwrap();
        assert!(matches!(env.payload, Some(EventPayload::Task(_))));
    }
}
