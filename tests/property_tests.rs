//! Property-based tests for flowtrack.
//!
//! Uses proptest to drive random operation sequences against a simple model and verify the
//! tables agree with it after every step.

use std::collections::HashMap;

use flowtrack::prelude::*;
use proptest::prelude::*;

/// Hashes with distinct (page, discriminator) pairs on a 4-bit directory: two pages, two
/// chains per page
const HASHES: [u32; 4] = [0x0000_0011, 0x0000_0022, 0x1000_0011, 0x1000_0022];

const FLOW_CAPACITY: u32 = 24;

fn flow(port: u16) -> FiveTuple {
    FiveTuple::new(0x0a00_0001, 0x0a00_0002, 1000 + port, 80, 6)
}

#[derive(Debug, Clone)]
enum FlowOp {
    Insert { hash: usize, port: u16 },
    Delete { hash: usize, port: u16 },
}

/// Strategy for generating flow table operations over a small key space
fn flow_op() -> impl Strategy<Value = FlowOp> {
    prop_oneof![
        3 => (0..HASHES.len(), 0u16..12).prop_map(|(hash, port)| FlowOp::Insert { hash, port }),
        2 => (0..HASHES.len(), 0u16..12).prop_map(|(hash, port)| FlowOp::Delete { hash, port }),
    ]
}

#[derive(Debug, Clone)]
enum AgingOp {
    Emplace(u8),
    Lookup(u8),
    Erase(u8),
    Advance(u64),
    Sweep,
}

fn aging_op() -> impl Strategy<Value = AgingOp> {
    prop_oneof![
        4 => (0u8..16).prop_map(AgingOp::Emplace),
        1 => (0u8..16).prop_map(AgingOp::Lookup),
        1 => (0u8..16).prop_map(AgingOp::Erase),
        2 => (1u64..3).prop_map(AgingOp::Advance),
        2 => Just(AgingOp::Sweep),
    ]
}

proptest! {
    /// Every flow the model holds is reachable from both directions, chains hold exactly
    /// the model's flows, and deleted handles never resolve again
    #[test]
    fn flow_table_matches_model(ops in prop::collection::vec(flow_op(), 1..200)) {
        let config = FlowTableConfig {
            directory_bits: 4,
            ..FlowTableConfig::with_capacity(FLOW_CAPACITY)
        };
        let mut table = FlowTable::with_clock(config, ManualClock::default()).unwrap();
        let mut model: HashMap<(usize, u16), DescriptorHandle> = HashMap::new();
        let mut retired: Vec<DescriptorHandle> = Vec::new();

        for op in ops {
            match op {
                FlowOp::Insert { hash, port } => {
                    let result = table.try_insert(HASHES[hash], &flow(port), port);
                    match model.get(&(hash, port)).copied() {
                        Some(existing) => prop_assert_eq!(result.ok(), Some(existing)),
                        None if model.len() < FLOW_CAPACITY as usize => {
                            let handle = result.unwrap();
                            model.insert((hash, port), handle);
                        }
                        None => {
                            let exhausted =
                                matches!(result, Err(TrackError::AllocationExhausted { .. }));
                            prop_assert!(exhausted);
                        }
                    }
                }
                FlowOp::Delete { hash, port } => {
                    let handle = table.lookup(HASHES[hash], &flow(port));
                    prop_assert_eq!(handle, model.get(&(hash, port)).copied());
                    let deleted = table.delete(HASHES[hash], handle);
                    prop_assert_eq!(deleted, model.remove(&(hash, port)).is_some());
                    retired.extend(handle);
                }
            }

            prop_assert_eq!(table.len(), model.len());
            for (&(hash, port), &handle) in &model {
                prop_assert_eq!(table.lookup(HASHES[hash], &flow(port)), Some(handle));
                prop_assert_eq!(table.lookup(HASHES[hash], &flow(port).reversed()), Some(handle));
            }
            for page in [0x0000_0000u32, 0x1000_0000] {
                let expected = model
                    .keys()
                    .filter(|(hash, _)| HASHES[*hash] >> 28 == page >> 28)
                    .count();
                prop_assert_eq!(table.chain_len(page), expected);
            }
            for handle in &retired {
                prop_assert!(table.descriptor(*handle).is_none());
            }
        }

        let stats = table.stats();
        prop_assert_eq!(stats.buckets.in_use, model.len());
        prop_assert_eq!(stats.descriptors.in_use, model.len());
    }

    /// Size, membership and remaining TTL track a model of absolute deadlines
    #[test]
    fn aging_map_bookkeeping(ops in prop::collection::vec(aging_op(), 1..200)) {
        const TTL: u64 = 3;
        const CAPACITY: usize = 8;

        let clock = ManualClock::default();
        let mut map = AgingMapBuilder::<u8, u32>::new("prop")
            .ttl_ticks(TTL)
            .capacity(CAPACITY as u32)
            .build(clock.clone())
            .unwrap();
        let mut model: HashMap<u8, u64> = HashMap::new();
        let mut now = 0u64;

        for op in ops {
            match op {
                AgingOp::Emplace(key) => {
                    let created = map.try_emplace(key, || u32::from(key)).is_some();
                    if model.contains_key(&key) || model.len() < CAPACITY {
                        prop_assert!(created);
                        model.insert(key, now + TTL);
                    } else {
                        prop_assert!(!created);
                    }
                }
                AgingOp::Lookup(key) => {
                    let found = map.lookup(&key, true).copied();
                    prop_assert_eq!(found, model.get(&key).map(|_| u32::from(key)));
                    if let Some(deadline) = model.get_mut(&key) {
                        *deadline = now + TTL;
                    }
                }
                AgingOp::Erase(key) => {
                    prop_assert_eq!(map.erase(&key), model.remove(&key).is_some());
                }
                AgingOp::Advance(ticks) => {
                    clock.advance(ticks);
                    now += ticks;
                }
                AgingOp::Sweep => {
                    let before = model.len();
                    model.retain(|_, deadline| *deadline > now);
                    let report = map.manage_timers();
                    prop_assert_eq!(report.evicted, before - model.len());
                    prop_assert_eq!(report.kept, 0);
                }
            }

            prop_assert_eq!(map.size(), model.len());
            for (key, deadline) in &model {
                prop_assert!(map.contains_key(key));
                prop_assert_eq!(map.remaining_ttl(key), Some(deadline.saturating_sub(now)));
            }
        }
    }
}
