//! # gourgs-enum: Bijective enumeration of expression trees
//!
//! **`gourgs-enum`** maps natural numbers to expression trees over a user-supplied vocabulary of
//! operators and terminals, so that program search can be driven exhaustively or by seeded
//! uniform sampling instead of by genetic mutation.
//!
//! ## How it works
//!
//! Every expression is addressed by a triple `(i, r, s)`:
//!
//! - `i` is the **complexity index** of the tree topology. It depends only on the set of operator
//!   arities, and every topology built from those arities has exactly one index.
//! - `r` is the **operator rank**: which operator of the matching arity sits at each internal node.
//!   There are `R(i)` choices.
//! - `s` is the **terminal rank**: which terminal sits at each leaf. There are `S(i)` choices.
//!
//! Distinct triples decode to distinct strings, and every expression over the vocabulary is hit
//! by some triple.
//!
//! ## Basic Usage
//!
//! ```rust
//! use gourgs_enum::{Enumerator, PrimitiveSet};
//! use num_bigint::BigUint;
//!
//! let mut pset = PrimitiveSet::new();
//! pset.add_operator("add", 2)?;
//! pset.add_operator("neg", 1)?;
//! pset.add_variable("x")?;
//! pset.add_variable("y")?;
//!
//! let enumerator = Enumerator::new(pset);
//!
//! // Topologies only depend on the arities {1, 2}.
//! assert_eq!(enumerator.ith_n_ary_tree(0)?, "..");
//! assert_eq!(enumerator.ith_n_ary_tree(2)?, "[..,..]");
//!
//! // Operators and terminals are chosen by the ranks.
//! let solution = enumerator.generate_specified_solution(2, &BigUint::from(0u32), &BigUint::from(2u32), 2)?;
//! assert_eq!(solution, "add(x,y)");
//!
//! // Walk the whole space up to a complexity bound.
//! let first: Vec<String> = enumerator
//!     .exhaustive_global_search(1)?
//!     .collect::<Result<_, _>>()?;
//! assert_eq!(first, ["x", "y", "neg(x)", "neg(y)"]);
//! # Ok::<(), gourgs_enum::EnumerationError>(())
//! ```
//!
//! ## Core Components
//!
//! - **[`primitives`]**: The vocabulary, [`PrimitiveSet`], with operators grouped by arity.
//! - **[`codec`]**: Base-`m` conversions and the digit interleaving behind topology indices.
//! - **[`shape`]**: Topologies ([`Shape`]) and their indices.
//! - **[`counter`]**: The combinatorial counts `l`, `a`, `G`, `R`, `S` and flat ranks.
//! - **[`decode`]**: Turning `(i, r, s)` into an [`Expression`] and back.
//! - **[`search`]**: Exhaustive and random search drivers.
//! - **[`enumerator`]**: The [`Enumerator`] tying it together, with its configuration and cache.

pub mod cache;
pub mod codec;
pub mod counter;
pub mod decode;
pub mod enumerator;
pub mod error;
pub mod expr;
pub mod primitives;
pub mod search;
pub mod shape;

pub use crate::cache::CacheStats;
pub use crate::counter::{SpaceSize, StructureCounts};
pub use crate::enumerator::{
    Configuration, CountingMode, Enumerator, EnumeratorConfig, EnumeratorSnapshot,
};
pub use crate::error::{EnumerationError, Result};
pub use crate::expr::{ExprNode, Expression};
pub use crate::primitives::{PrimitiveSet, PrimitiveSetSnapshot, Terminal, TerminalKind};
pub use crate::search::{create_seeds, ExhaustiveSearch, RandomSearch};
pub use crate::shape::Shape;
