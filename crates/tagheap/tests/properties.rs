//! Property tests over random allocate/free scripts.

use proptest::prelude::*;
use tagheap::prelude::*;
use tagheap_test_utils::fixtures::{apply, assert_disjoint, free_all, run_ops, Op, Outcome};
use tagheap_test_utils::{assert_heap_valid, initial_layout, layout};

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0usize..48).prop_map(Op::Allocate),
        1 => (48usize..400).prop_map(Op::Allocate),
        3 => any::<usize>().prop_map(Op::Free),
    ]
}

fn arb_script() -> impl Strategy<Value = Vec<Op>> {
    proptest::collection::vec(arb_op(), 1..120)
}

fn arb_capacity() -> impl Strategy<Value = usize> {
    prop_oneof![Just(11usize), 12usize..256, 256usize..2048]
}

proptest! {
    #[test]
    fn invariants_hold_after_every_op(capacity in arb_capacity(), ops in arb_script()) {
        let mut heap = Heap::with_capacity(capacity).unwrap();
        let mut outcome = Outcome::default();
        for op in ops {
            apply(&mut heap, &mut outcome, op).unwrap();
            prop_assert_eq!(heap.check(), Ok(()));
        }
        assert_disjoint(&outcome.live);
        for a in &outcome.live {
            prop_assert!(heap.usable_size(a.payload).unwrap() >= a.requested.max(1));
        }
    }

    #[test]
    fn freeing_everything_restores_one_chunk(capacity in arb_capacity(), ops in arb_script()) {
        let mut heap = Heap::with_capacity(capacity).unwrap();
        let mut outcome = run_ops(&mut heap, &ops).unwrap();
        free_all(&mut heap, &mut outcome).unwrap();
        prop_assert_eq!(layout(&heap), initial_layout(capacity));
        prop_assert_eq!(heap.free_chunks().count(), 1);
    }

    #[test]
    fn second_free_is_double_free_and_harmless(ops in arb_script(), pick in any::<usize>()) {
        let mut heap = Heap::with_capacity(1024).unwrap();
        let mut outcome = run_ops(&mut heap, &ops).unwrap();
        prop_assume!(!outcome.live.is_empty());

        let victim = outcome.live.swap_remove(pick % outcome.live.len());
        heap.free(victim.payload).unwrap();
        let before = heap.arena().as_bytes().to_vec();

        prop_assert_eq!(
            heap.free(victim.payload),
            Err(HeapError::DoubleFree { payload: victim.payload })
        );
        prop_assert_eq!(heap.arena().as_bytes(), &before[..]);
        assert_heap_valid(&heap);
    }

    #[test]
    fn payload_contents_survive_other_operations(
        ops in arb_script(),
        more in arb_script(),
    ) {
        let mut heap = Heap::with_capacity(2048).unwrap();
        let mut outcome = run_ops(&mut heap, &ops).unwrap();

        // Tag each live payload with a byte derived from its offset.
        for a in &outcome.live {
            let tag = a.payload.get() as u8;
            heap.payload_mut(a.payload).unwrap()[..a.requested].fill(tag);
        }
        let kept: Vec<_> = outcome.live.clone();

        // Only allocate from here on, so every tagged payload stays live.
        for op in more {
            if let Op::Allocate(size) = op {
                apply(&mut heap, &mut outcome, Op::Allocate(size)).unwrap();
            }
        }
        for a in &kept {
            let tag = a.payload.get() as u8;
            let bytes = heap.payload(a.payload).unwrap();
            prop_assert!(bytes[..a.requested].iter().all(|&b| b == tag));
        }
    }

    #[test]
    fn first_fit_takes_list_head_when_it_fits(ops in arb_script(), size in 0usize..32) {
        let mut heap = Heap::with_capacity(1024).unwrap();
        run_ops(&mut heap, &ops).unwrap();
        let Some(head) = heap.free_chunks().next() else {
            return Ok(());
        };
        prop_assume!(head.header.payload_len() >= size.max(1));
        let p = heap.allocate(size).unwrap();
        prop_assert_eq!(Some(p), head.payload());
    }
}
