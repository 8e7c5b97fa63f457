//! # Invariant Testing for the Scapegoat Array Tree
//!
//! This module contains tests specifically designed to validate tree
//! invariants around the boundaries where the structure changes shape:
//!
//! - Buffer growth at exact capacity edges
//! - Scapegoat rebuilds triggered by spine chains
//! - Whole-tree re-embedding after heavy erasure
//! - Randomized operations with invariant validation after every step

use goatwillow::{Alpha, Config, NaturalOrder, Tree};
use rand::prelude::*;

// ===========================================================================
// Growth Boundary Tests
// ===========================================================================

/// Fill the starting buffer to the last slot, then force the first growth.
#[test]
fn growth_at_exact_capacity() {
	let mut tree: Tree<i32, i32> = Tree::new();

	// A balanced insertion order packs all seven starting slots.
	for k in [3, 1, 5, 0, 2, 4, 6] {
		tree.insert(k, k);
	}
	assert_eq!(tree.capacity(), 7);
	assert_eq!(tree.len(), 7);

	// The eighth key cannot fit anywhere in a full buffer.
	tree.insert(7, 7);
	tree.assert_invariants();

	assert!(tree.capacity() > 7, "a full buffer must grow");
	for k in 0..=7 {
		assert_eq!(tree.get(&k), Some(&k), "key {} lost across growth", k);
	}
}

/// Growth relocates every pair; verify across several doublings.
#[test]
fn repeated_growth_preserves_entries() {
	let config = Config { initial_height: 0, ..Config::default() };
	let mut tree = Tree::with_config(NaturalOrder, config);

	let mut rng = StdRng::seed_from_u64(11);
	let mut inserted = vec![];
	for _ in 0..500 {
		let k: u16 = rng.random();
		tree.insert(k, k);
		inserted.push(k);
	}
	tree.assert_invariants();

	for k in inserted {
		assert_eq!(tree.get(&k), Some(&k));
	}
}

// ===========================================================================
// Rebuild Boundary Tests
// ===========================================================================

/// An ascending run chains down the rightmost spine; the chain must be
/// folded back by rebuilds instead of growing the buffer once per key.
#[test]
fn spine_chains_are_folded_by_rebuilds() {
	let mut tree: Tree<i32, i32> = Tree::new();

	for i in 0..256 {
		tree.insert(i, i);
		tree.assert_invariants();
	}

	// A naive BST would need a height-256 buffer for this run.
	assert!(tree.height() <= 12, "height {} after ascending run", tree.height());
}

/// Same shape from the other side: a descending run chains left.
#[test]
fn left_spine_chains_are_folded_by_rebuilds() {
	let mut tree: Tree<i32, i32> = Tree::new();

	for i in (0..256).rev() {
		tree.insert(i, i);
		tree.assert_invariants();
	}

	assert!(tree.height() <= 14, "height {} after descending run", tree.height());
}

/// Alternating far-apart keys exercise rebuilds at varying subtree depths.
#[test]
fn zigzag_insertions_keep_balance() {
	let mut tree: Tree<i32, i32> = Tree::new();

	for i in 0..128 {
		tree.insert(i, i);
		tree.insert(10_000 - i, i);
		tree.assert_invariants();
	}

	assert_eq!(tree.len(), 256);
}

/// Inserting a present key over and over must never trigger structural
/// changes or leak length.
#[test]
fn repeated_overwrites_are_structurally_inert() {
	let mut tree: Tree<i32, i32> = Tree::new();
	for i in 0..50 {
		tree.insert(i, i);
	}
	let capacity = tree.capacity();

	for round in 0..100 {
		tree.insert(25, round);
	}

	tree.assert_invariants();
	assert_eq!(tree.len(), 50);
	assert_eq!(tree.capacity(), capacity);
	assert_eq!(tree.get(&25), Some(&99));
}

// ===========================================================================
// Erasure Boundary Tests
// ===========================================================================

/// Erasing most of a large tree must re-embed the survivors shallowly
/// enough to satisfy the depth bound for the *current* size.
#[test]
fn heavy_erasure_restores_the_depth_bound() {
	let mut tree: Tree<i32, i32> = Tree::new();

	for i in 0..1000 {
		tree.insert(i, i);
	}

	for i in 0..950 {
		tree.remove(&i);
		tree.assert_invariants();
	}

	assert_eq!(tree.len(), 50);
	for i in 950..1000 {
		assert_eq!(tree.get(&i), Some(&i));
	}
}

/// Erase down to empty, then rebuild the tree from scratch.
#[test]
fn erase_to_empty_and_refill() {
	let mut tree: Tree<i32, i32> = Tree::new();

	for round in 0..3 {
		for i in 0..200 {
			tree.insert(i, i + round);
		}
		for i in 0..200 {
			assert_eq!(tree.remove(&i), Some(i + round));
		}
		tree.assert_invariants();
		assert!(tree.is_empty());
	}
}

/// Erasing interior slots splices neighbours up through the subtree; the
/// hole must never orphan a descendant.
#[test]
fn interior_erasure_keeps_descendants_reachable() {
	let mut tree: Tree<i32, i32> = Tree::new();
	let mut rng = StdRng::seed_from_u64(23);

	for i in 0..500 {
		tree.insert(i, i);
	}

	let mut alive: Vec<i32> = (0..500).collect();
	while alive.len() > 100 {
		let pick = rng.random_range(0..alive.len());
		let key = alive.swap_remove(pick);
		assert_eq!(tree.remove(&key), Some(key));
		tree.assert_invariants();
	}

	alive.sort_unstable();
	let remaining: Vec<i32> = tree.keys().copied().collect();
	assert_eq!(remaining, alive);
}

// ===========================================================================
// Configuration Sweeps
// ===========================================================================

/// The balance machinery must hold for any admissible α, not just 3/4.
#[test]
fn random_workload_across_alphas() {
	for (num, den) in [(9, 16), (5, 8), (3, 4), (7, 8), (15, 16)] {
		let config = Config { alpha: Alpha::new(num, den), initial_height: 3 };
		let mut tree = Tree::with_config(NaturalOrder, config);
		let mut rng = StdRng::seed_from_u64(u64::from(num * 100 + den));

		for _ in 0..2000 {
			let key: i32 = rng.random_range(0..300);
			if rng.random_bool(0.3) {
				tree.remove(&key);
			} else {
				tree.insert(key, key);
			}
			tree.assert_invariants();
		}
	}
}

/// Tiny starting buffers go through the growth path immediately.
#[test]
fn small_initial_heights() {
	for height in 0..4 {
		let config = Config { initial_height: height, ..Config::default() };
		let mut tree = Tree::with_config(NaturalOrder, config);

		for i in 0..64 {
			tree.insert(i, i);
			tree.assert_invariants();
		}
		assert_eq!(tree.len(), 64);
	}
}
