//! An ordered map stored as a scapegoat tree flattened into a single array.
//!
//! Nodes live at their heap positions — the children of slot `i` are slots
//! `2i + 1` and `2i + 2` — so the tree keeps no parent or child pointers and
//! every traversal is index arithmetic over one contiguous allocation.
//! Balance is restored the scapegoat way: when an insertion lands too deep,
//! the lowest α-weight-unbalanced ancestor's subtree is rebuilt in place
//! into a perfectly balanced embedding, relocating its pairs by swaps alone.
//!
//! ```
//! use goatwillow::Tree;
//!
//! let mut tree = Tree::new();
//!
//! tree.insert("some", "data");
//! ```

use smallvec::SmallVec;

use std::cmp::Ordering;
use std::fmt;
use std::ops;

pub mod alloc;
pub mod error;
pub mod iter;
mod nav;
#[cfg(test)]
pub mod util;

use error::{ConfigError, MAX_HEIGHT};
use nav::{depth_of, left_of, parent_of, right_of, sibling_of};

/// A total order over keys, injected into the tree at construction.
///
/// The order must be strict and consistent: `compare` may be called any
/// number of times for the same pair and must not observe or mutate the
/// tree it orders.
pub trait Compare<K> {
	fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// The default comparator: the key type's own [`Ord`] instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NaturalOrder;

impl<K: Ord> Compare<K> for NaturalOrder {
	#[inline]
	fn compare(&self, a: &K, b: &K) -> Ordering {
		a.cmp(b)
	}
}

/// Adapter turning any ordering closure into a comparator.
///
/// ```
/// use goatwillow::{OrderBy, Tree};
///
/// let mut tree = Tree::with_comparator(OrderBy(|a: &i32, b: &i32| b.cmp(a)));
/// tree.insert(1, "one");
/// tree.insert(2, "two");
/// assert_eq!(tree.first_key_value(), Some((&2, &"two")));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderBy<F>(pub F);

impl<K, F: Fn(&K, &K) -> Ordering> Compare<K> for OrderBy<F> {
	#[inline]
	fn compare(&self, a: &K, b: &K) -> Ordering {
		(self.0)(a, b)
	}
}

/// The weight-balance factor α, a rational in `(1/2, 1]`.
///
/// A subtree of weight `w` is α-balanced when both of its children weigh at
/// most `α·w`. Smaller values keep the tree shallower at the cost of more
/// frequent rebuilding; `α = 1` never flags a scapegoat, degrading insertion
/// to a naive BST that relies on buffer growth alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alpha {
	num: u32,
	den: u32,
}

impl Alpha {
	/// Builds the ratio `num/den`, validating `1/2 < num/den <= 1`.
	pub fn try_new(num: u32, den: u32) -> Result<Alpha, ConfigError> {
		if den == 0 {
			return Err(ConfigError::AlphaZeroDenominator);
		}
		if 2 * num as u64 <= den as u64 || num > den {
			return Err(ConfigError::AlphaOutOfRange { num, den });
		}
		Ok(Alpha { num, den })
	}

	/// Builds the ratio `num/den`.
	///
	/// # Panics
	///
	/// Panics unless `1/2 < num/den <= 1`.
	pub fn new(num: u32, den: u32) -> Alpha {
		match Alpha::try_new(num, den) {
			Ok(alpha) => alpha,
			Err(err) => panic!("{err}"),
		}
	}

	fn is_one(&self) -> bool {
		self.num == self.den
	}

	/// Whether `part > α · whole`, in exact integer arithmetic.
	fn exceeds(&self, part: usize, whole: usize) -> bool {
		self.den as u128 * part as u128 > self.num as u128 * whole as u128
	}

	/// Whether `part < α · whole`, in exact integer arithmetic.
	fn undershoots(&self, part: usize, whole: usize) -> bool {
		(self.den as u128 * part as u128) < self.num as u128 * whole as u128
	}

	/// Whether a pair at `depth` sits below the amortized bound
	/// `log_{1/α}(len) + 2` that triggers rebalancing on insertion.
	fn depth_exceeded(&self, depth: u32, len: usize) -> bool {
		if self.is_one() || len == 0 {
			return false;
		}
		let limit = (len as f64).ln() / (self.den as f64 / self.num as f64).ln();
		depth as f64 > limit + 2.0
	}

	/// The depth every occupied slot is guaranteed to respect:
	/// `ceil(log_{1/α}(max(len, 1))) + 2`.
	fn depth_limit(&self, len: usize) -> u32 {
		let limit = (len.max(1) as f64).ln() / (self.den as f64 / self.num as f64).ln();
		limit.ceil() as u32 + 2
	}
}

/// Construction-time parameters of a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
	/// The weight-balance factor.
	pub alpha: Alpha,
	/// Starting buffer height `h`, giving `2^h - 1` slots. Height 0 defers
	/// the first allocation to the first insertion.
	pub initial_height: u32,
}

impl Config {
	/// Builds a config, validating that the height is addressable.
	pub fn try_new(alpha: Alpha, initial_height: u32) -> Result<Config, ConfigError> {
		if initial_height > MAX_HEIGHT {
			return Err(ConfigError::HeightTooLarge(initial_height));
		}
		Ok(Config { alpha, initial_height })
	}

	fn initial_capacity(&self) -> usize {
		(1usize << self.initial_height) - 1
	}
}

impl Default for Config {
	/// α = 3/4 with a seven-slot starting buffer.
	fn default() -> Config {
		Config { alpha: Alpha::new(3, 4), initial_height: 3 }
	}
}

/// One occupied slot's pair.
#[derive(Debug, Clone)]
pub(crate) struct Entry<K, V> {
	pub key: K,
	pub value: V,
}

/// An ordered map from keys to values, backed by a scapegoat tree embedded
/// flat in a single buffer.
///
/// Keys are unique under the tree's comparator; inserting a present key
/// replaces its value. All operations are amortized `O(log n)`; lookups
/// never allocate.
#[derive(Clone)]
pub struct Tree<K, V, C = NaturalOrder> {
	slots: Vec<Option<Entry<K, V>>>,
	len: usize,
	/// Largest `len` since the live set was last re-embedded from the root.
	/// Erasure rebuilds once `len` falls below `α · max_len`, which keeps
	/// the depth bound tied to the current size rather than a historic one.
	max_len: usize,
	alpha: Alpha,
	cmp: C,
}

/// Where a key's descent from the root ended.
enum Search {
	/// The key occupies this slot.
	Found(usize),
	/// The key is absent; it would occupy `target`, which may lie beyond
	/// the buffer.
	Miss { target: usize },
}

impl<K: Ord, V> Tree<K, V> {
	/// Makes a new, empty `Tree` ordered by the key type's `Ord` instance,
	/// with the default α of 3/4 and a seven-slot starting buffer.
	pub fn new() -> Self {
		Tree::with_config(NaturalOrder, Config::default())
	}
}

impl<K, V, C: Compare<K>> Tree<K, V, C> {
	/// Makes a new, empty `Tree` ordered by `cmp`, with the default config.
	pub fn with_comparator(cmp: C) -> Self {
		Tree::with_config(cmp, Config::default())
	}

	/// Makes a new, empty `Tree` ordered by `cmp`.
	///
	/// # Panics
	///
	/// Panics when `config.initial_height` exceeds [`error::MAX_HEIGHT`];
	/// [`Config::try_new`] reports the same condition as an error.
	pub fn with_config(cmp: C, config: Config) -> Self {
		assert!(
			config.initial_height <= MAX_HEIGHT,
			"{}",
			ConfigError::HeightTooLarge(config.initial_height)
		);
		let mut slots = Vec::new();
		slots.resize_with(config.initial_capacity(), || None);
		Tree { slots, len: 0, max_len: 0, alpha: config.alpha, cmp }
	}
}

impl<K, V, C> Tree<K, V, C> {
	/// Returns the number of pairs in the tree.
	pub fn len(&self) -> usize {
		self.len
	}

	/// Returns `true` if the tree contains no pairs.
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Returns the number of slots in the buffer, always `2^h - 1`.
	pub fn capacity(&self) -> usize {
		self.slots.len()
	}

	/// Returns the height of the buffer: `log2(capacity + 1)`. No occupied
	/// slot sits at or below this depth.
	pub fn height(&self) -> u32 {
		(self.slots.len() + 1).ilog2()
	}

	/// Vacates every slot, keeping the buffer.
	pub fn clear(&mut self) {
		for slot in &mut self.slots {
			*slot = None;
		}
		self.len = 0;
		self.max_len = 0;
	}

	/// Gets an iterator over the pairs of the tree, sorted by key.
	pub fn iter(&self) -> iter::Iter<'_, K, V> {
		iter::Iter::new(&self.slots, self.len)
	}

	/// Gets an iterator over the keys of the tree, in sorted order.
	pub fn keys(&self) -> iter::Keys<'_, K, V> {
		iter::Keys::new(self.iter())
	}

	/// Gets an iterator over the values of the tree, in key order.
	pub fn values(&self) -> iter::Values<'_, K, V> {
		iter::Values::new(self.iter())
	}

	/// Returns the pair with the smallest key, or `None` when empty.
	pub fn first_key_value(&self) -> Option<(&K, &V)> {
		nav::smallest(&self.live(), 0)
			.and_then(|i| self.slots[i].as_ref())
			.map(|entry| (&entry.key, &entry.value))
	}

	/// Returns the pair with the largest key, or `None` when empty.
	pub fn last_key_value(&self) -> Option<(&K, &V)> {
		nav::largest(&self.live(), 0)
			.and_then(|i| self.slots[i].as_ref())
			.map(|entry| (&entry.key, &entry.value))
	}

	fn live(&self) -> nav::Live<'_, K, V> {
		nav::Live::new(&self.slots)
	}

	fn is_occupied(&self, i: usize) -> bool {
		self.slots.get(i).is_some_and(|slot| slot.is_some())
	}
}

impl<K, V, C: Compare<K>> Tree<K, V, C> {
	/// Returns a reference to the value mapped to `key`.
	pub fn get(&self, key: &K) -> Option<&V> {
		match self.locate(key) {
			Search::Found(i) => self.slots[i].as_ref().map(|entry| &entry.value),
			Search::Miss { .. } => None,
		}
	}

	/// Returns a mutable reference to the value mapped to `key`.
	pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
		match self.locate(key) {
			Search::Found(i) => self.slots[i].as_mut().map(|entry| &mut entry.value),
			Search::Miss { .. } => None,
		}
	}

	/// Returns the stored key and value for `key`.
	pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
		match self.locate(key) {
			Search::Found(i) => self.slots[i].as_ref().map(|entry| (&entry.key, &entry.value)),
			Search::Miss { .. } => None,
		}
	}

	/// Returns `true` if `key` is present in the tree.
	pub fn contains_key(&self, key: &K) -> bool {
		matches!(self.locate(key), Search::Found(_))
	}

	/// Inserts a key-value pair into the tree.
	///
	/// If the tree did not have this key present, `None` is returned.
	///
	/// If the tree did have this key present, the value is updated, and the
	/// old value is returned.
	pub fn insert(&mut self, key: K, value: V) -> Option<V> {
		match self.locate(&key) {
			Search::Found(i) => {
				let entry = self.slots[i].as_mut().expect("found slot is occupied");
				Some(std::mem::replace(&mut entry.value, value))
			}
			Search::Miss { target } => {
				self.insert_new(target, key, value);
				None
			}
		}
	}

	/// Returns a mutable reference to the value mapped to `key`, inserting
	/// the default value first when the key is absent.
	///
	/// The reference is valid until the next mutating call.
	pub fn get_or_default(&mut self, key: K) -> &mut V
	where
		V: Default,
	{
		let i = match self.locate(&key) {
			Search::Found(i) => i,
			Search::Miss { target } => self.insert_new(target, key, V::default()),
		};
		&mut self.slots[i].as_mut().expect("slot was just filled").value
	}

	/// Removes a key from the tree, returning the value at the key if the
	/// key was previously in the tree.
	pub fn remove(&mut self, key: &K) -> Option<V> {
		self.remove_entry(key).map(|(_, value)| value)
	}

	/// Removes a key from the tree, returning the stored key and value if
	/// the key was previously in the tree.
	pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
		let index = match self.locate(key) {
			Search::Found(i) => i,
			Search::Miss { .. } => return None,
		};
		let entry = self.splice_out(index);
		self.len -= 1;
		// Splicing never deepens a slot, but enough erasures can leave the
		// survivors deeper than the depth bound for the shrunken size
		// allows. Re-embed once the live set decays below α of its peak.
		if !self.alpha.is_one() && self.alpha.undershoots(self.len, self.max_len) {
			self.rebuild(0, self.len, None);
			self.max_len = self.len;
		}
		Some((entry.key, entry.value))
	}

	/// Walks the comparator's descent path for `key`.
	fn locate(&self, key: &K) -> Search {
		let mut i = 0;
		while let Some(entry) = self.slots.get(i).and_then(|slot| slot.as_ref()) {
			match self.cmp.compare(key, &entry.key) {
				Ordering::Less => i = left_of(i),
				Ordering::Greater => i = right_of(i),
				Ordering::Equal => return Search::Found(i),
			}
		}
		Search::Miss { target: i }
	}

	/// Places a new pair whose descent ended at `target`, rebalancing or
	/// growing the buffer first when the placement demands it. Returns the
	/// slot the pair ended up in.
	fn insert_new(&mut self, mut target: usize, key: K, value: V) -> usize {
		loop {
			let in_bounds = target < self.slots.len();
			if in_bounds && !self.alpha.depth_exceeded(depth_of(target), self.len) {
				self.slots[target] = Some(Entry { key, value });
				self.len += 1;
				self.max_len = self.max_len.max(self.len);
				return target;
			}

			if let Some((goat, weight)) = self.find_scapegoat(target) {
				let slot = self
					.rebuild(goat, weight, Some(&key))
					.expect("a rebuild with a pending key reserves a slot for it");
				self.slots[slot] = Some(Entry { key, value });
				self.len += 1;
				self.max_len = self.max_len.max(self.len);
				return slot;
			}

			// No ancestor is heavy enough to rebuild: the whole tree is
			// α-balanced yet the pair does not fit, so the buffer grows.
			self.grow();
			target = match self.locate(&key) {
				Search::Found(_) => unreachable!("growth does not add keys"),
				Search::Miss { target } => target,
			};
		}
	}

	/// Walks upward from the vacant position a new pair descended to,
	/// accumulating subtree weights, and returns the lowest ancestor whose
	/// child violates α-balance together with that ancestor's weight. The
	/// weight counts the pending pair.
	fn find_scapegoat(&self, ghost: usize) -> Option<(usize, usize)> {
		let mut i = ghost;
		let mut weight = 1usize;
		while let Some(parent) = parent_of(i) {
			let sibling = self.weigh(sibling_of(i));
			let combined = weight + sibling + 1;
			if self.alpha.exceeds(weight, combined) || self.alpha.exceeds(sibling, combined) {
				return Some((parent, combined));
			}
			i = parent;
			weight = combined;
		}
		None
	}

	/// Counts the occupied slots of the subtree rooted at `root`.
	fn weigh(&self, root: usize) -> usize {
		let mut stack: SmallVec<[usize; 32]> = SmallVec::new();
		let mut weight = 0;
		if self.is_occupied(root) {
			stack.push(root);
		}
		while let Some(i) = stack.pop() {
			weight += 1;
			let left = left_of(i);
			if self.is_occupied(left) {
				stack.push(left);
			}
			let right = right_of(i);
			if self.is_occupied(right) {
				stack.push(right);
			}
		}
		weight
	}

	/// Re-embeds the subtree rooted at `goat` as a perfectly balanced tree
	/// of `weight` pairs, in place, by swaps alone.
	///
	/// When `pending` is given it is counted in `weight`, and the embedding
	/// position at its sorted rank is left vacant and returned; the caller
	/// writes the pair there. The relocation runs in two in-order passes:
	///
	/// 1. *Compaction* — working backwards, every live pair is swapped into
	///    the last `weight - 1` in-order slots of the subtree, producing a
	///    sorted, contiguous run. The destination walk never overtakes the
	///    source walk, so no swap disturbs a pair that is still to come.
	/// 2. *Distribution* — working forwards, the run is swapped into the
	///    first `weight` in-order positions of the perfect embedding, whose
	///    walk visits the slots of a balanced tree in sorted order.
	fn rebuild(&mut self, goat: usize, weight: usize, pending: Option<&K>) -> Option<usize> {
		if weight == 0 {
			return None;
		}
		let live_count = weight - pending.map_or(0, |_| 1);
		let raw = nav::Raw { capacity: self.slots.len() };

		let mut source = nav::largest(&self.live(), goat);
		let mut tail = nav::largest(&raw, goat);
		let mut block = None;
		for _ in 0..live_count {
			let s = source.expect("subtree holds the advertised number of pairs");
			let d = tail.expect("a subtree's slot range is never smaller than its weight");
			if d != s {
				self.slots.swap(d, s);
			}
			block = Some(d);
			source = nav::pred(&self.live(), s);
			tail = nav::pred(&raw, d);
		}

		let perfect = nav::Perfect { weight };
		let mut dest = nav::smallest(&perfect, nav::Perfect::root(goat));
		let mut source = block;
		let mut remaining = live_count;
		let mut reserved = None;

		if let Some(key) = pending {
			while remaining > 0 {
				let s = source.expect("compacted run holds the remaining pairs");
				let entry = self.slots[s].as_ref().expect("compacted slots are occupied");
				if self.cmp.compare(&entry.key, key) != Ordering::Less {
					break;
				}
				let d = dest.expect("the embedding has a position for every pair");
				self.slots.swap(d.index, s);
				dest = nav::succ(&perfect, d);
				source = nav::succ(&raw, s);
				remaining -= 1;
			}
			let d = dest.expect("the embedding has a position for the pending pair");
			reserved = Some(d.index);
			dest = nav::succ(&perfect, d);
		}

		while remaining > 0 {
			let s = source.expect("compacted run holds the remaining pairs");
			let d = dest.expect("the embedding has a position for every pair");
			self.slots.swap(d.index, s);
			dest = nav::succ(&perfect, d);
			source = nav::succ(&raw, s);
			remaining -= 1;
		}

		reserved
	}

	/// Doubles the buffer to the next `2^h - 1` capacity and re-embeds the
	/// live set from the root.
	fn grow(&mut self) {
		let grown = 2 * self.slots.len() + 1;
		self.slots.resize_with(grown, || None);
		self.rebuild(0, self.len, None);
		self.max_len = self.len;
	}

	/// Vacates `index` and closes the hole by pulling in-order neighbours
	/// up through the subtree until the hole reaches a leaf.
	fn splice_out(&mut self, index: usize) -> Entry<K, V> {
		let removed = self.slots[index].take().expect("erase target is occupied");
		let mut hole = index;
		loop {
			let filler = if let Some(s) = nav::smallest(&self.live(), right_of(hole)) {
				s
			} else if let Some(p) = nav::largest(&self.live(), left_of(hole)) {
				p
			} else {
				break;
			};
			let entry = self.slots[filler].take().expect("navigator landed on an occupied slot");
			self.slots[hole] = Some(entry);
			hole = filler;
		}
		removed
	}

	/// Checks every structural invariant of the tree, panicking on the
	/// first violation. Intended for tests, which call it after batches of
	/// mutations; it walks the whole buffer.
	pub fn assert_invariants(&self) {
		let capacity = self.slots.len();
		assert!((capacity + 1).is_power_of_two(), "capacity {capacity} is not 2^h - 1");

		let mut occupied = 0;
		for i in 0..capacity {
			if self.slots[i].is_none() {
				continue;
			}
			occupied += 1;
			if let Some(parent) = parent_of(i) {
				assert!(self.slots[parent].is_some(), "occupied slot {i} has a vacant parent");
			}
			if !self.alpha.is_one() {
				let limit = self.alpha.depth_limit(self.len);
				assert!(
					depth_of(i) <= limit,
					"slot {i} sits at depth {} past the bound {limit} for {} pairs",
					depth_of(i),
					self.len
				);
			}
		}
		assert_eq!(occupied, self.len, "len does not match the occupied slot count");

		let mut prev: Option<&K> = None;
		for (key, _) in self.iter() {
			if let Some(prev) = prev {
				assert!(
					self.cmp.compare(prev, key) == Ordering::Less,
					"in-order walk yielded keys out of order"
				);
			}
			prev = Some(key);
		}
	}
}

impl<K: Ord, V> Default for Tree<K, V> {
	fn default() -> Self {
		Tree::new()
	}
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for Tree<K, V, C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_map().entries(self.iter()).finish()
	}
}

impl<K, V, C: Compare<K>> ops::Index<&K> for Tree<K, V, C> {
	type Output = V;

	/// Returns a reference to the value mapped to `key`.
	///
	/// # Panics
	///
	/// Panics if the key is not present in the tree.
	fn index(&self, key: &K) -> &V {
		self.get(key).expect("no entry found for key")
	}
}

impl<K, V, C: Compare<K>> Extend<(K, V)> for Tree<K, V, C> {
	fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
		for (key, value) in iter {
			self.insert(key, value);
		}
	}
}

impl<K: Ord, V> FromIterator<(K, V)> for Tree<K, V> {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut tree = Tree::new();
		tree.extend(iter);
		tree
	}
}
