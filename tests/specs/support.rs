// SPDX-License-Identifier: MIT

//! Shared stack construction for the scenario tests.

use maestro_core::{FakeClock, IdGen, MaestroEvent, ProjectId, TaskId, BROADCAST_TOPICS};
use maestro_engine::services::{CreateProject, CreateTask, ServiceCtx, Services};
use maestro_engine::EventBus;
use maestro_storage::Storage;
use std::sync::{Arc, Mutex};

pub struct Stack {
    pub _dir: tempfile::TempDir,
    pub services: Services<FakeClock>,
    pub clock: FakeClock,
    pub bus: EventBus,
    events: Arc<Mutex<Vec<MaestroEvent>>>,
}

pub fn stack() -> Stack {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = Arc::new(Storage::open(dir.path()).expect("storage"));
    let bus = EventBus::new();
    let clock = FakeClock::new();
    let ctx = ServiceCtx::new(storage, bus.clone(), Arc::new(IdGen::new()), clock.clone());
    let services = Services::new(ctx);

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    bus.on_topics(BROADCAST_TOPICS, move |event| {
        sink.lock().expect("event sink").push(event.clone());
        Ok(())
    });

    Stack { _dir: dir, services, clock, bus, events }
}

impl Stack {
    pub fn events_for(&self, topic: &str) -> Vec<MaestroEvent> {
        self.events
            .lock()
            .expect("event sink")
            .iter()
            .filter(|e| e.topic().as_str() == topic)
            .cloned()
            .collect()
    }

    pub fn clear_events(&self) {
        self.events.lock().expect("event sink").clear();
    }

    pub async fn project(&self) -> ProjectId {
        self.services
            .projects
            .create_project(CreateProject {
                name: "spec-project".into(),
                working_dir: "/tmp/spec".into(),
                description: None,
                is_master: false,
            })
            .await
            .expect("project")
            .id
    }

    pub async fn task(&self, project_id: ProjectId, title: &str) -> TaskId {
        self.services
            .tasks
            .create_task(CreateTask {
                project_id,
                title: title.into(),
                ..Default::default()
            })
            .await
            .expect("task")
            .id
    }

    pub async fn child_task(
        &self,
        project_id: ProjectId,
        parent: TaskId,
        title: &str,
    ) -> TaskId {
        self.services
            .tasks
            .create_task(CreateTask {
                project_id,
                title: title.into(),
                parent_id: Some(parent),
                ..Default::default()
            })
            .await
            .expect("child task")
            .id
    }
}
