// SPDX-License-Identifier: MIT

use super::*;
use std::collections::HashMap;

#[test]
fn generated_ids_carry_prefix() {
    let ids = IdGen::new();
    let id = TaskId::generate(&ids);
    assert!(id.as_str().starts_with("task_"));
    assert_eq!(id.suffix().len(), 13);
}

#[test]
fn generated_ids_are_unique_and_monotonic() {
    let ids = IdGen::new();
    let mut prev = SessionId::generate(&ids);
    for _ in 0..1000 {
        let next = SessionId::generate(&ids);
        assert!(next.as_str() > prev.as_str(), "{next} !> {prev}");
        prev = next;
    }
}

#[test]
fn generator_is_monotonic_across_threads() {
    let ids = std::sync::Arc::new(IdGen::new());
    let mut handles = Vec::new();
    for _ in 0..4 {
        let ids = std::sync::Arc::clone(&ids);
        handles.push(std::thread::spawn(move || {
            (0..250).map(|_| ids.next("task_")).collect::<Vec<_>>()
        }));
    }
    let mut all: Vec<String> = Vec::new();
    for handle in handles {
        all.extend(handle.join().unwrap());
    }
    let unique: std::collections::HashSet<_> = all.iter().collect();
    assert_eq!(unique.len(), all.len());
}

#[test]
fn id_hash_map_lookup_by_str() {
    let mut map = HashMap::new();
    map.insert(TaskId::from_string("task_k"), 42);
    assert_eq!(map.get("task_k"), Some(&42));
}

#[test]
fn suffix_strips_prefix() {
    let id = ProjectId::from_string("proj_abc");
    assert_eq!(id.suffix(), "abc");
}

#[test]
fn suffix_passes_through_foreign_ids() {
    let id = ProjectId::from_string("external-id");
    assert_eq!(id.suffix(), "external-id");
}

#[test]
fn idbuf_roundtrips_serde() {
    let id = MailId::from_string("mail_0001");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"mail_0001\"");
    let back: MailId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}

#[test]
fn idbuf_deserializes_as_map_key() {
    let json = r#"{"sess_a": "working"}"#;
    let map: HashMap<SessionId, String> = serde_json::from_str(json).unwrap();
    assert_eq!(map.get("sess_a").map(String::as_str), Some("working"));
}

#[test]
fn idbuf_rejects_oversized_input() {
    let long = "x".repeat(ID_MAX_LEN + 1);
    let json = format!("\"{long}\"");
    assert!(serde_json::from_str::<TaskId>(&json).is_err());
}

#[test]
fn empty_idbuf_is_empty() {
    assert!(IdBuf::empty().is_empty());
    assert!(!TaskId::from_string("task_x").is_empty());
}

mod props {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn base36_order_matches_numeric(a in 0u64..u64::MAX / 2, b in 0u64..u64::MAX / 2) {
            let (sa, sb) = (super::super::base36_fixed(a), super::super::base36_fixed(b));
            prop_assert_eq!(a.cmp(&b), sa.cmp(&sb));
        }
    }
}
