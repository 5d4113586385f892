// Copyright (c) 2026 The Kudu Tablet Core Authors. Licensed under the Apache License, Version 2.0.

use kudu_anchor::LogAnchorRegistry;

/// Scenario 6 (spec §8): registering anchors at indices {50, 30, 90}
/// then unregistering 30 leaves `GetEarliestRegisteredLogIndex() == 50`.
#[test]
fn scenario_anchor_minimum() {
    let registry = LogAnchorRegistry::new();
    let a50 = registry.new_anchor();
    let a30 = registry.new_anchor();
    let a90 = registry.new_anchor();

    registry.register(50, "owner-a", a50).unwrap();
    registry.register(30, "owner-b", a30).unwrap();
    registry.register(90, "owner-c", a90).unwrap();

    registry.unregister(a30).unwrap();

    assert_eq!(registry.earliest_registered_log_index().unwrap(), 50);

    // Clean up so the registry's Drop assertion is satisfied.
    registry.unregister(a50).unwrap();
    registry.unregister(a90).unwrap();
}

/// Round-trip law (spec §8): `Register(i, o, a); Unregister(a)` leaves
/// the registry empty.
#[test]
fn register_unregister_round_trip_leaves_registry_empty() {
    let registry = LogAnchorRegistry::new();
    for i in 0..20u64 {
        let anchor = registry.new_anchor();
        registry.register(i * 7, "owner", anchor).unwrap();
        registry.unregister(anchor).unwrap();
    }
    assert!(registry.is_empty());
    assert_eq!(registry.len(), 0);
}

#[test]
fn concurrent_registrations_converge_on_the_true_minimum() {
    use std::sync::Arc;
    use std::thread;

    let registry = Arc::new(LogAnchorRegistry::new());
    let mut handles = Vec::new();
    let anchors: Vec<_> = (0..64).map(|_| registry.new_anchor()).collect();

    for (i, anchor) in anchors.iter().copied().enumerate() {
        let registry = Arc::clone(&registry);
        handles.push(thread::spawn(move || {
            registry.register(1000 - i as u64, format!("owner-{i}"), anchor).unwrap();
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(registry.earliest_registered_log_index().unwrap(), 1000 - 63);

    for anchor in anchors {
        registry.unregister(anchor).unwrap();
    }
    assert!(registry.is_empty());
}
