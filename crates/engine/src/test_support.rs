// SPDX-License-Identifier: MIT

//! Shared fixtures for service tests.

use crate::bus::EventBus;
use crate::services::{ServiceCtx, Services};
use maestro_core::{FakeClock, IdGen, MaestroEvent, BROADCAST_TOPICS};
use maestro_storage::Storage;
use parking_lot::Mutex;
use std::sync::Arc;

/// A full service stack over a temp dir, with an event recorder attached.
pub(crate) struct Harness {
    // Held so the state dir outlives the services.
    pub _dir: tempfile::TempDir,
    pub services: Services<FakeClock>,
    pub ctx: ServiceCtx<FakeClock>,
    pub clock: FakeClock,
    pub bus: EventBus,
    events: Arc<Mutex<Vec<MaestroEvent>>>,
}

impl Harness {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = Arc::new(Storage::open(dir.path()).expect("storage"));
        let bus = EventBus::new();
        let clock = FakeClock::new();
        let ctx = ServiceCtx::new(storage, bus.clone(), Arc::new(IdGen::new()), clock.clone());
        let services = Services::new(ctx.clone());

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        bus.on_topics(BROADCAST_TOPICS, move |event| {
            sink.lock().push(event.clone());
            Ok(())
        });

        Self { _dir: dir, services, ctx, clock, bus, events }
    }

    /// Topic names of everything emitted so far, in order.
    pub fn topics(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(|e| e.topic().as_str()).collect()
    }

    /// Emitted events matching a topic name, in order.
    pub fn events_for(&self, topic: &str) -> Vec<MaestroEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.topic().as_str() == topic)
            .cloned()
            .collect()
    }

    pub fn clear_events(&self) {
        self.events.lock().clear();
    }
}
