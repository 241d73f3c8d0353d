// SPDX-License-Identifier: MIT

use super::*;
use crate::mail::MailBuilder;
use crate::session::SessionBuilder;
use crate::task::TaskBuilder;

#[test]
fn every_broadcast_topic_is_unique() {
    let mut seen = std::collections::HashSet::new();
    for topic in BROADCAST_TOPICS {
        assert!(seen.insert(topic.as_str()), "duplicate topic {topic}");
    }
}

#[test]
fn entity_events_flatten_the_entity() {
    let event = MaestroEvent::TaskCreated { task: TaskBuilder::default().title("t1").build() };
    let payload = event.payload_json();
    assert_eq!(payload["title"], "t1");
    assert_eq!(payload["projectId"], "proj_test");
    assert!(payload.get("task").is_none());
}

#[test]
fn mail_event_keeps_the_mail_type_key() {
    let mail = MailBuilder::default().mail_type("status-report").build();
    let event = MaestroEvent::MailReceived { mail };
    let payload = event.payload_json();
    assert_eq!(payload["type"], "status-report");
    assert_eq!(event.topic().as_str(), "mail:received");
}

#[test]
fn plain_session_created_has_no_spawn_marker() {
    let event = MaestroEvent::SessionCreated {
        session: SessionBuilder::default().build(),
        spawn: None,
    };
    let payload = event.payload_json();
    assert!(payload.get("_isSpawnCreated").is_none());
    assert!(payload.get("command").is_none());
}

#[test]
fn spawn_session_created_carries_the_marker_and_material() {
    let spawn = SpawnPayload {
        command: "claude".into(),
        cwd: "/work".into(),
        env_vars: HashMap::from([("MAESTRO_SESSION_ID".into(), "sess_test".into())]),
        manifest: serde_json::json!({"manifestVersion": 1}),
        project_id: ProjectId::from_string("proj_test"),
        task_ids: vec![TaskId::from_string("task_1")],
        is_spawn_created: true,
    };
    let event = MaestroEvent::SessionCreated {
        session: SessionBuilder::default().build(),
        spawn: Some(spawn),
    };
    let payload = event.payload_json();
    assert_eq!(payload["_isSpawnCreated"], true);
    assert_eq!(payload["command"], "claude");
    assert_eq!(payload["envVars"]["MAESTRO_SESSION_ID"], "sess_test");
    assert_eq!(payload["manifest"]["manifestVersion"], 1);
}

#[test]
fn topic_strings_match_wire_convention() {
    let event = MaestroEvent::SessionPromptSend {
        session_id: SessionId::from_string("sess_1"),
        content: "hello".into(),
        mode: PromptMode::Send,
        sender_session_id: None,
    };
    assert_eq!(event.topic().as_str(), "session:prompt_send");
    let payload = event.payload_json();
    assert_eq!(payload["mode"], "send");
    assert!(payload.get("senderSessionId").is_none());
}

#[test]
fn id_only_events_serialize_the_id() {
    let event = MaestroEvent::TaskDeleted { id: TaskId::from_string("task_x") };
    assert_eq!(event.payload_json(), serde_json::json!({"id": "task_x"}));
}

#[test]
fn link_events_use_camel_case_fields() {
    let event = MaestroEvent::TaskSessionAdded {
        task_id: TaskId::from_string("task_1"),
        session_id: SessionId::from_string("sess_1"),
    };
    assert_eq!(
        event.payload_json(),
        serde_json::json!({"taskId": "task_1", "sessionId": "sess_1"})
    );
}
