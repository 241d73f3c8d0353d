// SPDX-License-Identifier: MIT

use super::*;
use maestro_core::{SessionId, TaskId};
use std::sync::Mutex as StdMutex;

fn deleted(id: &str) -> MaestroEvent {
    MaestroEvent::TaskDeleted { id: TaskId::from_string(id) }
}

#[test]
fn emit_delivers_before_returning() {
    let bus = EventBus::new();
    let seen = Arc::new(StdMutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    bus.on(Topic::TaskDeleted, move |event| {
        if let MaestroEvent::TaskDeleted { id } = event {
            sink.lock().unwrap().push(id.to_string());
        }
        Ok(())
    });

    bus.emit(deleted("task_1"));

    assert_eq!(seen.lock().unwrap().as_slice(), ["task_1"]);
}

#[test]
fn handlers_run_in_subscription_order() {
    let bus = EventBus::new();
    let order = Arc::new(StdMutex::new(Vec::new()));
    for label in ["first", "second", "third"] {
        let sink = Arc::clone(&order);
        bus.on(Topic::TaskDeleted, move |_| {
            sink.lock().unwrap().push(label);
            Ok(())
        });
    }

    bus.emit(deleted("task_1"));

    assert_eq!(order.lock().unwrap().as_slice(), ["first", "second", "third"]);
}

#[test]
fn failing_handler_does_not_stop_fanout() {
    let bus = EventBus::new();
    bus.on(Topic::TaskDeleted, |_| Err(DomainError::validation("boom")));
    let seen = Arc::new(StdMutex::new(0));
    let sink = Arc::clone(&seen);
    bus.on(Topic::TaskDeleted, move |_| {
        *sink.lock().unwrap() += 1;
        Ok(())
    });

    bus.emit(deleted("task_1"));

    assert_eq!(*seen.lock().unwrap(), 1);
}

#[test]
fn off_removes_only_that_subscription() {
    let bus = EventBus::new();
    let seen = Arc::new(StdMutex::new(Vec::new()));
    let sink_a = Arc::clone(&seen);
    let a = bus.on(Topic::TaskDeleted, move |_| {
        sink_a.lock().unwrap().push("a");
        Ok(())
    });
    let sink_b = Arc::clone(&seen);
    bus.on(Topic::TaskDeleted, move |_| {
        sink_b.lock().unwrap().push("b");
        Ok(())
    });

    assert!(bus.off(a));
    assert!(!bus.off(a));
    bus.emit(deleted("task_1"));

    assert_eq!(seen.lock().unwrap().as_slice(), ["b"]);
}

#[test]
fn topics_are_isolated() {
    let bus = EventBus::new();
    let seen = Arc::new(StdMutex::new(0));
    let sink = Arc::clone(&seen);
    bus.on(Topic::SessionDeleted, move |_| {
        *sink.lock().unwrap() += 1;
        Ok(())
    });

    bus.emit(deleted("task_1"));
    assert_eq!(*seen.lock().unwrap(), 0);

    bus.emit(MaestroEvent::SessionDeleted { id: SessionId::from_string("sess_1") });
    assert_eq!(*seen.lock().unwrap(), 1);
}

#[test]
fn on_topics_registers_everywhere() {
    let bus = EventBus::new();
    let ids = bus.on_topics(&[Topic::TaskDeleted, Topic::SessionDeleted], |_| Ok(()));
    assert_eq!(ids.len(), 2);
    assert_eq!(bus.subscriber_count(Topic::TaskDeleted), 1);
    assert_eq!(bus.subscriber_count(Topic::SessionDeleted), 1);
}

#[test]
fn guard_unsubscribes_on_drop() {
    let bus = EventBus::new();
    let id = bus.on(Topic::TaskDeleted, |_| Ok(()));
    {
        let _guard = bus.guard(id);
        assert_eq!(bus.subscriber_count(Topic::TaskDeleted), 1);
    }
    assert_eq!(bus.subscriber_count(Topic::TaskDeleted), 0);
}

#[test]
fn handler_may_unsubscribe_during_emit() {
    // A waiter that resolves on first match unsubscribes from inside the
    // handler; emit iterates a snapshot so this must not deadlock.
    let bus = EventBus::new();
    let bus_inner = bus.clone();
    let slot: Arc<StdMutex<Option<SubscriptionId>>> = Arc::new(StdMutex::new(None));
    let slot_inner = Arc::clone(&slot);
    let id = bus.on(Topic::TaskDeleted, move |_| {
        if let Some(id) = slot_inner.lock().unwrap().take() {
            bus_inner.off(id);
        }
        Ok(())
    });
    *slot.lock().unwrap() = Some(id);

    bus.emit(deleted("task_1"));
    assert_eq!(bus.subscriber_count(Topic::TaskDeleted), 0);
}
