//! # Error Types for the Scapegoat Array Tree
//!
//! This module defines the error type returned when a tree is configured
//! with parameters outside their valid ranges.
//!
//! ## Error Handling Strategy
//!
//! The container distinguishes three failure classes, and only one of them
//! is represented as an error value:
//!
//! - *Configuration errors* — an `Alpha` or `Config` built from invalid
//!   parameters. These are reported through [`ConfigError`] by the `try_`
//!   constructors, or turned into panics by the plain constructors.
//! - *Logical absence* — looking up or removing a key that is not present.
//!   This is ordinary control flow and is reported as `None`, never as an
//!   error.
//! - *Allocation failure* — the only runtime failure mode, possible solely
//!   while the slot buffer grows. The buffer is a plain `Vec`, so exhaustion
//!   follows the global allocator's abort path. No operation ever leaves the
//!   tree partially mutated: growth re-embeds the live set only after the
//!   buffer extension has succeeded.
//!
//! ## Validation Flow
//!
//! ```text
//! Alpha::try_new(num, den)
//!      │
//!      ├── den == 0 ──────────────► Err(AlphaZeroDenominator)
//!      ├── num/den outside (1/2, 1] ► Err(AlphaOutOfRange)
//!      ▼
//! Config { alpha, initial_height }
//!      │
//!      ├── height >= usize::BITS ──► Err(HeightTooLarge)
//!      ▼
//! Tree::with_config(..)
//! ```

use thiserror::Error;

/// Largest representable initial height: a buffer of `2^h - 1` slots must
/// have `2^h` fit in a `usize`.
pub const MAX_HEIGHT: u32 = usize::BITS - 1;

/// Errors that can occur while validating tree configuration.
///
/// These are only produced at construction time; once a tree exists its
/// configuration is fixed and no operation can fail with a `ConfigError`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
	/// The balance factor does not satisfy `1/2 < num/den <= 1`.
	///
	/// Values at or below one half would demand a stricter balance than a
	/// binary tree can maintain; values above one never flag a scapegoat.
	#[error("alpha must satisfy 1/2 < num/den <= 1, got {num}/{den}")]
	AlphaOutOfRange {
		/// Numerator of the rejected ratio.
		num: u32,
		/// Denominator of the rejected ratio.
		den: u32,
	},

	/// The balance factor was given a zero denominator.
	#[error("alpha denominator must be non-zero")]
	AlphaZeroDenominator,

	/// The requested initial height cannot be addressed by a `usize` buffer.
	#[error("initial height {0} exceeds the addressable maximum of {MAX_HEIGHT}")]
	HeightTooLarge(u32),
}
