use flow_engines::heap::{BinaryHeap, MinHeap, PairingHeap};
use rstest::rstest;

fn drain<H: MinHeap<usize, i64>>(heap: &mut H) -> Vec<(usize, i64)> {
    let mut popped = Vec::new();
    while let Some(entry) = heap.pop() {
        popped.push(entry);
    }
    popped
}

fn pops_in_order<H: MinHeap<usize, i64>>() {
    let mut heap = H::default();
    assert!(heap.is_empty());
    assert_eq!(heap.min(), None);
    for (key, value) in [(0, 5), (1, 3), (2, 8), (3, 1), (4, 7), (5, 2), (6, 6), (7, 4)] {
        assert!(heap.insert(key, value, false));
    }
    assert_eq!(heap.len(), 8);
    assert_eq!(heap.min(), Some((3, 1)));
    assert_eq!(heap.get(&2), Some(8));
    assert_eq!(heap.get(&9), None);
    assert_eq!(drain(&mut heap), vec![(3, 1), (5, 2), (1, 3), (7, 4), (0, 5), (6, 6), (4, 7), (2, 8)]);
    assert!(heap.is_empty());
}

fn decrease_key<H: MinHeap<usize, i64>>() {
    let mut heap = H::default();
    for key in 0..6 {
        heap.insert(key, 10 * key as i64, false);
    }
    assert_eq!(heap.pop(), Some((0, 0)));

    assert!(heap.insert(4, 5, false));
    assert!(!heap.insert(4, 5, false));
    assert!(!heap.insert(2, 30, false));
    assert_eq!(heap.get(&2), Some(20));
    assert!(heap.insert(5, 1, false));
    assert_eq!(heap.len(), 5);
    assert_eq!(drain(&mut heap), vec![(5, 1), (4, 5), (1, 10), (2, 20), (3, 30)]);
}

fn allow_increase<H: MinHeap<usize, i64>>() {
    let mut heap = H::default();
    for key in 0..5 {
        heap.insert(key, key as i64, false);
    }
    assert!(!heap.insert(0, 100, true));
    assert!(!heap.insert(2, 50, true));
    assert_eq!(heap.get(&0), Some(100));
    assert_eq!(heap.min(), Some((1, 1)));
    assert_eq!(heap.len(), 5);
    assert_eq!(drain(&mut heap), vec![(1, 1), (3, 3), (4, 4), (2, 50), (0, 100)]);
}

// popped keys can come back
fn reinsert<H: MinHeap<usize, i64>>() {
    let mut heap = H::default();
    heap.insert(1, 4, false);
    heap.insert(2, 2, false);
    assert_eq!(heap.pop(), Some((2, 2)));
    assert!(heap.insert(2, 9, false));
    assert!(heap.insert(3, 3, false));
    assert_eq!(drain(&mut heap), vec![(3, 3), (1, 4), (2, 9)]);
}

#[rstest]
#[case::binary_pops_in_order(pops_in_order::<BinaryHeap<usize, i64>>)]
#[case::pairing_pops_in_order(pops_in_order::<PairingHeap<usize, i64>>)]
#[case::binary_decrease_key(decrease_key::<BinaryHeap<usize, i64>>)]
#[case::pairing_decrease_key(decrease_key::<PairingHeap<usize, i64>>)]
#[case::binary_allow_increase(allow_increase::<BinaryHeap<usize, i64>>)]
#[case::pairing_allow_increase(allow_increase::<PairingHeap<usize, i64>>)]
#[case::binary_reinsert(reinsert::<BinaryHeap<usize, i64>>)]
#[case::pairing_reinsert(reinsert::<PairingHeap<usize, i64>>)]
fn heap_behaviour(#[case] check: fn()) {
    check();
}

#[rstest]
fn heaps_agree_on_a_mixed_workload() {
    let mut binary = BinaryHeap::<usize, i64>::default();
    let mut pairing = PairingHeap::<usize, i64>::default();
    let mut state: u64 = 7;
    for step in 0..500 {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let key = ((state >> 33) % 40) as usize;
        // distinct values keep the pop order unique
        let value = ((state >> 40) % 1000) as i64 * 1000 + step;
        if step % 7 == 0 {
            assert_eq!(binary.pop(), pairing.pop());
        } else {
            let allow_increase = step % 3 == 0;
            assert_eq!(binary.insert(key, value, allow_increase), pairing.insert(key, value, allow_increase));
        }
        assert_eq!(binary.len(), pairing.len());
        assert_eq!(binary.min(), pairing.min());
    }
    assert_eq!(drain(&mut binary), drain(&mut pairing));
}
