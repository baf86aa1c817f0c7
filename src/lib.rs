//! # adl-optimizer: encoded expression optimizer for audience definitions
//!
//! **`adl-optimizer`** simplifies boolean expressions over comparison leaves
//! (`a = 1`, `b < @c`, `d IS UNKNOWN`, ...) as they appear in audience definitions.
//!
//! ## How it works
//!
//! Every leaf is encoded into a single `u32` [`Node`][crate::node::Node] over a
//! [`Dictionary`][crate::dictionary::Dictionary] of argument names and values.
//! AND/OR nodes refer to sorted, deduplicated *member arrays* kept in a
//! [`MemberArrayRegistry`][crate::registry::MemberArrayRegistry], so structurally
//! equal sub-expressions are represented by the same node (hash consing).
//!
//! Negation is **strict**: `STRICT NOT a = 1` only holds for records where `a` is known.
//! Thus `a = 1 OR STRICT NOT a = 1` is not a tautology, it is `a IS NOT UNKNOWN`.
//!
//! ## Key Features
//!
//! - **Canonical combined nodes**: flattening, sorting, absorbing/neutral elements and
//!   simple contradictions are handled on construction, see
//!   [`EncodedExpressionTree::create_combined_node`][crate::tree::EncodedExpressionTree::create_combined_node].
//! - **Implication reasoning**: [`LogicHelper`][crate::logic::LogicHelper] decides implication and
//!   contradiction between nodes, [`ImplicationResolver`][crate::resolver::ImplicationResolver]
//!   uses it to drop redundant members.
//! - **Normal forms**: [`OrOfAndNormalizer`][crate::normalizer::OrOfAndNormalizer] multiplies out,
//!   [`OverlapRegrouper`][crate::regrouper::OverlapRegrouper] factors common members back out.
//! - **Time budget**: every pass checks a [`TimeOut`][crate::timeout::TimeOut]; an aborted
//!   optimization leaves the tree untouched.
//!
//! ## Basic Usage
//!
//! ```rust
//! use adl_optimizer::expr::CoreExpression;
//! use adl_optimizer::optimizer::Optimizer;
//!
//! let a1 = CoreExpression::equals("a", "1");
//!
//! // a = 1 AND (STRICT NOT a = 1 OR b = 2)
//! let e = a1.clone() & (a1.clone().strict_not() | CoreExpression::equals("b", "2"));
//!
//! let optimized = Optimizer::default().process_expression(&e).unwrap();
//! assert_eq!(optimized.to_string(), "(a = 1 AND b = 2)");
//! ```
//!
//! ## Core Components
//!
//! - **[`tree`]**: The [`EncodedExpressionTree`][crate::tree::EncodedExpressionTree], owner of codec, registry and roots.
//! - **[`codec`]**: Leaf encoding and decoding.
//! - **[`optimizer`]**: The full pipeline.
//! - **[`debug`]**: Human readable dumps of encoded trees.

pub mod cache;
pub mod codec;
pub mod debug;
pub mod dictionary;
pub mod error;
pub mod expr;
pub mod logic;
pub mod node;
pub mod normalizer;
pub mod optimizer;
pub mod registry;
pub mod regrouper;
pub mod resolver;
pub mod timeout;
pub mod tree;
pub mod types;
pub mod utils;
