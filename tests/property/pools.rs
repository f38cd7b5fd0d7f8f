// Property tests for the pool allocator: conservation, uniqueness, and
// growth behavior under arbitrary alloc/free interleavings.

use proptest::prelude::*;
use quill::{MemConfig, NodeRef, PoolId, PoolSpec, Pools};

#[derive(Debug, Clone)]
enum Op {
    Alloc,
    Free(prop::sample::Index),
}

fn ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            3 => Just(Op::Alloc),
            2 => any::<prop::sample::Index>().prop_map(Op::Free),
        ],
        0..200,
    )
}

fn tiny_pools(units: usize) -> Pools {
    Pools::new(MemConfig {
        specs: vec![PoolSpec::new(16, units)],
        ballast: usize::MAX, // keep segment sizing constant
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    // After any interleaving: free units + units held by the caller ==
    // total units, and no two live handles share an address.
    #[test]
    fn conservation_and_uniqueness(ops in ops()) {
        let mut pools = tiny_pools(4);
        let id = PoolId(0);
        let mut live: Vec<NodeRef> = Vec::new();

        for op in ops {
            match op {
                Op::Alloc => live.push(pools.alloc(id)),
                Op::Free(index) => {
                    if !live.is_empty() {
                        let node = live.swap_remove(index.index(live.len()));
                        pools.free(node);
                    }
                }
            }

            prop_assert_eq!(
                pools.units_free(id) + live.len(),
                pools.units_total(id),
                "conservation broken"
            );

            let mut addrs: Vec<usize> =
                live.iter().map(|n| pools.unit_addr(*n)).collect();
            addrs.sort_unstable();
            addrs.dedup();
            prop_assert_eq!(addrs.len(), live.len(), "live addresses collide");
        }
    }

    // Growth: exactly one new segment per exhaustion, all units 8-aligned,
    // and issued addresses stable across later growth.
    #[test]
    fn growth_is_stepwise_and_stable(extra in 1usize..40) {
        let units = 4;
        let mut pools = tiny_pools(units);
        let id = PoolId(0);

        let mut nodes = Vec::new();
        let mut addrs = Vec::new();
        for i in 0..(units + extra) {
            let node = pools.alloc(id);
            prop_assert_eq!(pools.unit_addr(node) % 8, 0);
            nodes.push(node);
            addrs.push(pools.unit_addr(node));
            let expected_segments = i / units + 1;
            prop_assert_eq!(pools.segment_count(id), expected_segments);
        }

        // Every address issued before the growths still resolves
        // identically: segments never move.
        for (node, addr) in nodes.iter().zip(&addrs) {
            prop_assert_eq!(pools.unit_addr(*node), *addr);
        }
    }

    // A free always makes the freed unit the coldest: it does not come
    // back until every other free unit has been handed out.
    #[test]
    fn freed_units_recycle_last(warmup in 1usize..8) {
        let mut pools = tiny_pools(4);
        let id = PoolId(0);

        let mut held = Vec::new();
        for _ in 0..warmup {
            held.push(pools.alloc(id));
        }
        let victim = held.pop().unwrap();
        let victim_addr = pools.unit_addr(victim);
        pools.free(victim);

        let free_count = pools.units_free(id);
        for i in 0..free_count {
            let node = pools.alloc(id);
            let is_last = i == free_count - 1;
            prop_assert_eq!(
                pools.unit_addr(node) == victim_addr,
                is_last,
                "freed unit recycled at position {} of {}",
                i,
                free_count
            );
        }
    }
}
