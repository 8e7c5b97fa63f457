//! # Test Utilities for the Scapegoat Array Tree
//!
//! This module provides utilities for loading trees from JSON fixtures.
//! It is only compiled in test builds (`#[cfg(test)]`).
//!
//! ## Purpose
//!
//! The physical layout a sequence of insertions produces depends on the
//! rebuild history, which makes it awkward to put a *specific* embedding in
//! front of a test — say, a vacant slot in the middle of a spine, or a root
//! whose children differ in weight by exactly one. A fixture pins the exact
//! slot assignment instead.
//!
//! ## JSON Format
//!
//! The fixture mirrors the buffer directly: a capacity and the occupied
//! slots, each naming its index and pair. Unlisted indices are vacant.
//!
//! ```json
//! {
//!   "capacity": 7,
//!   "slots": [
//!     { "index": 0, "key": 4, "value": 40 },
//!     { "index": 1, "key": 2, "value": 20 },
//!     { "index": 3, "key": 1, "value": 10 }
//!   ]
//! }
//! ```
//!
//! The layout must satisfy the tree's invariants — heap-shaped capacity,
//! reachable slots, keys in BST order. [`sample_tree`] checks them after
//! translation, so a bad fixture fails loudly at load time rather than
//! obscurely mid-test.
//!
//! ## Limitations
//!
//! - Keys are always `i64`, values always `u64`
//! - Trees are built with the default α of 3/4 and natural key order

use crate::{Entry, NaturalOrder, Tree};
use serde::Deserialize;

/// One occupied slot in a fixture: its buffer index and its pair.
#[derive(Deserialize, Debug)]
struct FixtureSlot {
	index: usize,
	key: i64,
	value: u64,
}

/// Top-level structure of a JSON fixture file.
#[derive(Deserialize, Debug)]
struct FixtureTree {
	capacity: usize,
	slots: Vec<FixtureSlot>,
}

/// Loads a tree from a JSON fixture file.
///
/// # Panics
///
/// Panics if the file cannot be read or parsed, if a slot index repeats or
/// falls outside the declared capacity, or if the resulting layout violates
/// a tree invariant.
pub fn sample_tree<P: AsRef<std::path::Path>>(path: P) -> Tree<i64, u64> {
	let file = std::fs::File::open(path).expect("failed to find fixture file");
	let fixture: FixtureTree = serde_json::from_reader(file).expect("failed to parse fixture");

	let mut slots: Vec<Option<Entry<i64, u64>>> = Vec::new();
	slots.resize_with(fixture.capacity, || None);

	let len = fixture.slots.len();
	for slot in fixture.slots {
		assert!(slot.index < fixture.capacity, "fixture slot {} out of bounds", slot.index);
		let previous =
			slots[slot.index].replace(Entry { key: slot.key, value: slot.value });
		assert!(previous.is_none(), "fixture slot {} listed twice", slot.index);
	}

	let tree = Tree {
		slots,
		len,
		max_len: len,
		alpha: crate::Alpha::new(3, 4),
		cmp: NaturalOrder,
	};
	tree.assert_invariants();
	tree
}
