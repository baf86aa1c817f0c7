//! Small enums shared by the codec, the tree and the passes.
//!
//! The operator tags are part of the node encoding, see [`crate::node`].
use std::fmt;

/// Comparison operator of a leaf expression.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum MatchOperator {
    LessThan,
    GreaterThan,
    Equals,
    Contains,
    IsUnknown,
}

impl MatchOperator {
    pub const ALL: [MatchOperator; 5] = [
        MatchOperator::LessThan,
        MatchOperator::GreaterThan,
        MatchOperator::Equals,
        MatchOperator::Contains,
        MatchOperator::IsUnknown,
    ];

    /// Tag stored in bits 1..=3 of a leaf node. Tag 0 is reserved for special sets.
    pub const fn tag(self) -> u32 {
        match self {
            MatchOperator::LessThan => 1,
            MatchOperator::GreaterThan => 2,
            MatchOperator::Equals => 3,
            MatchOperator::Contains => 4,
            MatchOperator::IsUnknown => 5,
        }
    }

    pub const fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            1 => Some(MatchOperator::LessThan),
            2 => Some(MatchOperator::GreaterThan),
            3 => Some(MatchOperator::Equals),
            4 => Some(MatchOperator::Contains),
            5 => Some(MatchOperator::IsUnknown),
            _ => None,
        }
    }

    /// Symbol used when printing a leaf.
    pub fn symbol(self) -> &'static str {
        match self {
            MatchOperator::LessThan => "<",
            MatchOperator::GreaterThan => ">",
            MatchOperator::Equals => "=",
            MatchOperator::Contains => "CONTAINS",
            MatchOperator::IsUnknown => "IS UNKNOWN",
        }
    }
}

impl fmt::Display for MatchOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Type of a combined (AND/OR) node.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum CombinedType {
    And,
    Or,
}

impl CombinedType {
    /// AND <-> OR (De Morgan).
    pub fn dual(self) -> Self {
        match self {
            CombinedType::And => CombinedType::Or,
            CombinedType::Or => CombinedType::And,
        }
    }
}

impl fmt::Display for CombinedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombinedType::And => write!(f, "AND"),
            CombinedType::Or => write!(f, "OR"),
        }
    }
}

/// Coarse classification of an encoded node.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum NodeType {
    /// A leaf or one of the special sets `ALL`/`NONE`.
    Leaf,
    And,
    Or,
}

impl From<CombinedType> for NodeType {
    fn from(ty: CombinedType) -> Self {
        match ty {
            CombinedType::And => NodeType::And,
            CombinedType::Or => NodeType::Or,
        }
    }
}

/// The two special sets.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SpecialSet {
    /// Always true.
    All,
    /// Always false.
    None,
}

impl SpecialSet {
    pub fn negate(self) -> Self {
        match self {
            SpecialSet::All => SpecialSet::None,
            SpecialSet::None => SpecialSet::All,
        }
    }
}

impl fmt::Display for SpecialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecialSet::All => write!(f, "<ALL>"),
            SpecialSet::None => write!(f, "<NONE>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_tags() {
        for op in MatchOperator::ALL {
            assert_ne!(op.tag(), 0);
            assert!(op.tag() < 8);
            assert_eq!(MatchOperator::from_tag(op.tag()), Some(op));
        }
        assert_eq!(MatchOperator::from_tag(0), None);
        assert_eq!(MatchOperator::from_tag(6), None);
    }

    #[test]
    fn test_combined_type_dual() {
        assert_eq!(CombinedType::And.dual(), CombinedType::Or);
        assert_eq!(CombinedType::Or.dual(), CombinedType::And);
        assert_eq!(NodeType::from(CombinedType::Or), NodeType::Or);
    }

    #[test]
    fn test_special_set_negate() {
        assert_eq!(SpecialSet::All.negate(), SpecialSet::None);
        assert_eq!(SpecialSet::None.negate(), SpecialSet::All);
        assert_eq!(SpecialSet::All.to_string(), "<ALL>");
    }
}
