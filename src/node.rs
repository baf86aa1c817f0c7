//! Encoded nodes: 32-bit tagged handles for leaves, sentinels and combined nodes.
//!
//! ```text
//! leaf:      0 | value/ref-arg (14) | arg (12) | ref (1) | op (3) | neg (1)
//! combined:  1 | or (1) | id (30)
//! ALL = 0, NONE = 1, INVALID = 0xFFFF_FFFF
//! ```
//!
//! Operator tag 0 is reserved for the special sets, so `ALL`/`NONE` can never
//! collide with a leaf code, and the top bit separates leaves from combined
//! references. Negating a leaf flips bit 0; `ALL` and `NONE` differ in bit 0
//! as well, which makes them a self-negating pair.

use std::fmt::{Display, Formatter};

use crate::types::{CombinedType, MatchOperator};

const NEGATION_BIT: u32 = 1;
const OPERATOR_SHIFT: u32 = 1;
const OPERATOR_MASK: u32 = 0b111;
const REFERENCE_BIT: u32 = 1 << 4;
const ARG_SHIFT: u32 = 5;
const ARG_BITS: u32 = 12;
const VALUE_SHIFT: u32 = ARG_SHIFT + ARG_BITS;
const VALUE_BITS: u32 = 14;

const COMBINED_BIT: u32 = 1 << 31;
const OR_BIT: u32 = 1 << 30;
const ID_MASK: u32 = OR_BIT - 1;

/// Maximum number of distinct argument names a dictionary can hold.
pub const MAX_NAMES: usize = 1 << ARG_BITS;
/// Maximum number of distinct values a dictionary can hold.
pub const MAX_VALUES: usize = 1 << VALUE_BITS;
/// Largest registry id that can be encoded (keeps `INVALID` out of reach).
pub const MAX_COMBINED_ID: u32 = ID_MASK - 1;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Node(u32);

impl Node {
    /// Always true.
    pub const ALL: Self = Self(0);
    /// Always false.
    pub const NONE: Self = Self(1);
    /// Placeholder, never part of a member array.
    pub const INVALID: Self = Self(0xFFFF_FFFF);

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Return the internal representation of the node.
    pub const fn raw(self) -> u32 {
        self.0
    }

    pub(crate) const fn leaf(
        negated: bool,
        operator: MatchOperator,
        reference: bool,
        arg: u32,
        value: u32,
    ) -> Self {
        debug_assert!(arg < MAX_NAMES as u32);
        debug_assert!(value < MAX_VALUES as u32);
        let mut raw = (value << VALUE_SHIFT) | (arg << ARG_SHIFT) | (operator.tag() << OPERATOR_SHIFT);
        if reference {
            raw |= REFERENCE_BIT;
        }
        if negated {
            raw |= NEGATION_BIT;
        }
        Self(raw)
    }

    /// `arg IS UNKNOWN` for the given argument index.
    pub(crate) const fn is_unknown_of(arg: u32) -> Self {
        Self::leaf(false, MatchOperator::IsUnknown, false, arg, 0)
    }

    pub(crate) const fn combined(id: u32, ty: CombinedType) -> Self {
        debug_assert!(id <= MAX_COMBINED_ID);
        match ty {
            CombinedType::And => Self(COMBINED_BIT | id),
            CombinedType::Or => Self(COMBINED_BIT | OR_BIT | id),
        }
    }

    pub const fn is_invalid(self) -> bool {
        self.0 == Self::INVALID.0
    }

    /// `ALL` or `NONE`.
    pub const fn is_special_set(self) -> bool {
        self.0 <= Self::NONE.0
    }

    /// Reference to a registered member array.
    pub const fn is_combined(self) -> bool {
        (self.0 & COMBINED_BIT) != 0 && !self.is_invalid()
    }

    pub const fn is_and(self) -> bool {
        self.is_combined() && (self.0 & OR_BIT) == 0
    }

    pub const fn is_or(self) -> bool {
        self.is_combined() && (self.0 & OR_BIT) != 0
    }

    /// A comparison or its negation (neither a sentinel nor a combined reference).
    pub const fn is_leaf(self) -> bool {
        (self.0 & COMBINED_BIT) == 0 && !self.is_special_set()
    }

    pub(crate) const fn combined_type(self) -> Option<CombinedType> {
        if !self.is_combined() {
            None
        } else if (self.0 & OR_BIT) != 0 {
            Some(CombinedType::Or)
        } else {
            Some(CombinedType::And)
        }
    }

    pub(crate) const fn combined_id(self) -> u32 {
        self.0 & ID_MASK
    }

    /// Flip the negation bit. Only meaningful for leaves and sentinels.
    pub(crate) const fn flip(self) -> Self {
        Self(self.0 ^ NEGATION_BIT)
    }

    pub(crate) const fn negation_bit(self) -> bool {
        (self.0 & NEGATION_BIT) != 0
    }

    pub(crate) const fn operator_tag(self) -> u32 {
        (self.0 >> OPERATOR_SHIFT) & OPERATOR_MASK
    }

    pub(crate) const fn operator(self) -> Option<MatchOperator> {
        if self.is_leaf() {
            MatchOperator::from_tag(self.operator_tag())
        } else {
            None
        }
    }

    pub(crate) const fn reference_bit(self) -> bool {
        (self.0 & REFERENCE_BIT) != 0
    }

    pub(crate) const fn arg_idx(self) -> u32 {
        (self.0 >> ARG_SHIFT) & ((1 << ARG_BITS) - 1)
    }

    pub(crate) const fn value_idx(self) -> u32 {
        (self.0 >> VALUE_SHIFT) & ((1 << VALUE_BITS) - 1)
    }

    /// `arg IS UNKNOWN` or `arg IS NOT UNKNOWN`.
    pub(crate) const fn is_unknown_check(self) -> bool {
        self.is_leaf() && self.operator_tag() == MatchOperator::IsUnknown.tag()
    }

    /// `arg IS UNKNOWN` (not negated).
    pub(crate) const fn is_positive_unknown_check(self) -> bool {
        self.is_unknown_check() && !self.negation_bit()
    }

    /// Leaf with an argument reference as operand.
    pub(crate) const fn is_reference_leaf(self) -> bool {
        self.is_leaf() && self.reference_bit()
    }

    /// True if this leaf can only be true while argument `arg` has a value.
    pub(crate) const fn requires_known(self, arg: u32) -> bool {
        if !self.is_leaf() || self.is_positive_unknown_check() {
            return false;
        }
        self.arg_idx() == arg || (self.reference_bit() && self.value_idx() == arg)
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::INVALID
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_invalid() {
            return write!(f, "<INVALID>");
        }
        if *self == Node::ALL {
            return write!(f, "<ALL>");
        }
        if *self == Node::NONE {
            return write!(f, "<NONE>");
        }
        if self.is_combined() {
            let sym = if self.is_or() { "|" } else { "&" };
            return write!(f, "{}{}", sym, self.combined_id());
        }
        let neg = if self.negation_bit() { "~" } else { "" };
        match self.operator() {
            Some(MatchOperator::IsUnknown) => write!(f, "{}#{}?", neg, self.arg_idx()),
            Some(op) => {
                let operand = if self.reference_bit() { "@#" } else { "$" };
                write!(f, "{}#{}{}{}{}", neg, self.arg_idx(), op.symbol(), operand, self.value_idx())
            }
            None => write!(f, "<?{:#x}>", self.0),
        }
    }
}
