//! Shuffle algorithms for the play order
//!
//! Shuffling permutes slot handles only; the songs never move in the arena.

use crate::types::{ShufflePolicy, Slot};
use rand::Rng;

/// Uniform in-place permutation (Fisher-Yates)
///
/// Walks from the last index down to 1, swapping each element with a
/// uniformly chosen index at or before it.
pub fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// Shuffle a play order according to `policy`
///
/// `current` is the slot playing (or paused-at) before the shuffle. Returns
/// the new head position, which keeps pointing at `current`.
pub fn shuffle_order<R: Rng + ?Sized>(
    order: &mut [Slot],
    current: Option<Slot>,
    policy: ShufflePolicy,
    rng: &mut R,
) -> usize {
    let current_position = current.and_then(|slot| order.iter().position(|s| *s == slot));

    match (policy, current_position) {
        (ShufflePolicy::CurrentToFront, Some(position)) => {
            order[..=position].rotate_right(1);
            fisher_yates(&mut order[1..], rng);
            0
        }
        _ => {
            fisher_yates(order, rng);
            current
                .and_then(|slot| order.iter().position(|s| *s == slot))
                .unwrap_or(0)
        }
    }
}

/// Restore insertion order (ascending slot handles)
///
/// Returns the new head position for `current`.
pub fn unshuffle_order(order: &mut [Slot], current: Option<Slot>) -> usize {
    order.sort_unstable();
    current
        .and_then(|slot| order.binary_search(&slot).ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn fisher_yates_keeps_membership() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut order: Vec<Slot> = (0..50).collect();
        fisher_yates(&mut order, &mut rng);

        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
        assert_ne!(order, sorted, "50 elements should not stay in order");
    }

    #[test]
    fn fisher_yates_handles_tiny_inputs() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut empty: Vec<Slot> = vec![];
        fisher_yates(&mut empty, &mut rng);
        assert!(empty.is_empty());

        let mut one = vec![4];
        fisher_yates(&mut one, &mut rng);
        assert_eq!(one, vec![4]);
    }

    #[test]
    fn in_place_head_follows_current() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut order: Vec<Slot> = (0..10).collect();
        let head = shuffle_order(&mut order, Some(6), ShufflePolicy::InPlace, &mut rng);
        assert_eq!(order[head], 6);
    }

    #[test]
    fn current_to_front_puts_current_first() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut order: Vec<Slot> = (0..10).collect();
        let head = shuffle_order(&mut order, Some(6), ShufflePolicy::CurrentToFront, &mut rng);
        assert_eq!(head, 0);
        assert_eq!(order[0], 6);
        assert_eq!(order.len(), 10);
    }

    #[test]
    fn unshuffle_restores_ascending_order() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut order: Vec<Slot> = vec![0, 2, 3, 5, 8];
        shuffle_order(&mut order, Some(3), ShufflePolicy::InPlace, &mut rng);
        let head = unshuffle_order(&mut order, Some(3));
        assert_eq!(order, vec![0, 2, 3, 5, 8]);
        assert_eq!(head, 2);
    }
}
