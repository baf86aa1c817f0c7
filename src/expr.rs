//! Core expressions: the abstract tree exchanged with the parser layer.
//!
//! Leaves are attribute comparisons ([`MatchExpression`]) or their strict
//! negations; combined nodes are AND/OR of member expressions. Negation is
//! strict: `STRICT NOT a = 1` requires `a` to be known.

use std::fmt;
use std::ops::{BitAnd, BitOr};

use crate::types::{CombinedType, MatchOperator, SpecialSet};

/// Right-hand side of a comparison.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Operand {
    Value(String),
    /// Name of another argument (`a = @b`).
    Reference(String),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Value(v) => write!(f, "{}", v),
            Operand::Reference(r) => write!(f, "@{}", r),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MatchExpression {
    arg_name: String,
    operator: MatchOperator,
    operand: Option<Operand>,
}

impl MatchExpression {
    /// Builds a comparison. `IS UNKNOWN` takes no operand, every other operator needs one.
    pub fn new(arg_name: impl Into<String>, operator: MatchOperator, operand: Option<Operand>) -> Self {
        Self {
            arg_name: arg_name.into(),
            operator,
            operand,
        }
    }

    pub fn arg_name(&self) -> &str {
        &self.arg_name
    }

    pub fn operator(&self) -> MatchOperator {
        self.operator
    }

    pub fn operand(&self) -> Option<&Operand> {
        self.operand.as_ref()
    }

    /// Name of the referenced argument, if the operand is a reference.
    pub fn referenced_arg_name(&self) -> Option<&str> {
        match &self.operand {
            Some(Operand::Reference(r)) => Some(r),
            _ => None,
        }
    }

    /// True if the operator/operand combination is well-formed.
    pub fn is_well_formed(&self) -> bool {
        match self.operator {
            MatchOperator::IsUnknown => self.operand.is_none(),
            _ => self.operand.is_some(),
        }
    }
}

impl fmt::Display for MatchExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operand {
            None => write!(f, "{} {}", self.arg_name, self.operator),
            Some(operand) => write!(f, "{} {} {}", self.arg_name, self.operator, operand),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum CoreExpression {
    SpecialSet(SpecialSet),
    Match(MatchExpression),
    /// Strict negation of a comparison.
    Negation(MatchExpression),
    Combined(CombinedType, Vec<CoreExpression>),
}

impl CoreExpression {
    pub fn all() -> Self {
        CoreExpression::SpecialSet(SpecialSet::All)
    }

    pub fn none() -> Self {
        CoreExpression::SpecialSet(SpecialSet::None)
    }

    fn value_match(arg: &str, operator: MatchOperator, value: &str) -> Self {
        CoreExpression::Match(MatchExpression::new(
            arg,
            operator,
            Some(Operand::Value(value.to_string())),
        ))
    }

    fn reference_match(arg: &str, operator: MatchOperator, other: &str) -> Self {
        CoreExpression::Match(MatchExpression::new(
            arg,
            operator,
            Some(Operand::Reference(other.to_string())),
        ))
    }

    pub fn equals(arg: &str, value: &str) -> Self {
        Self::value_match(arg, MatchOperator::Equals, value)
    }

    pub fn less_than(arg: &str, value: &str) -> Self {
        Self::value_match(arg, MatchOperator::LessThan, value)
    }

    pub fn greater_than(arg: &str, value: &str) -> Self {
        Self::value_match(arg, MatchOperator::GreaterThan, value)
    }

    pub fn contains(arg: &str, value: &str) -> Self {
        Self::value_match(arg, MatchOperator::Contains, value)
    }

    pub fn equals_ref(arg: &str, other: &str) -> Self {
        Self::reference_match(arg, MatchOperator::Equals, other)
    }

    pub fn less_than_ref(arg: &str, other: &str) -> Self {
        Self::reference_match(arg, MatchOperator::LessThan, other)
    }

    pub fn greater_than_ref(arg: &str, other: &str) -> Self {
        Self::reference_match(arg, MatchOperator::GreaterThan, other)
    }

    pub fn is_unknown(arg: &str) -> Self {
        CoreExpression::Match(MatchExpression::new(arg, MatchOperator::IsUnknown, None))
    }

    pub fn is_not_unknown(arg: &str) -> Self {
        Self::is_unknown(arg).strict_not()
    }

    /// Strict negation of a leaf or special set.
    ///
    /// Combined expressions are returned unchanged: there is no strict
    /// negation of an AND/OR, use
    /// [`create_complement_of`][crate::tree::EncodedExpressionTree::create_complement_of]
    /// on an encoded tree instead.
    pub fn strict_not(self) -> Self {
        match self {
            CoreExpression::SpecialSet(s) => CoreExpression::SpecialSet(s.negate()),
            CoreExpression::Match(m) => CoreExpression::Negation(m),
            CoreExpression::Negation(m) => CoreExpression::Match(m),
            combined @ CoreExpression::Combined(..) => combined,
        }
    }

    /// AND of the given members; an empty list is `<ALL>`, a single member is returned as is.
    pub fn and(members: impl IntoIterator<Item = CoreExpression>) -> Self {
        Self::combined(CombinedType::And, members)
    }

    /// OR of the given members; an empty list is `<NONE>`, a single member is returned as is.
    pub fn or(members: impl IntoIterator<Item = CoreExpression>) -> Self {
        Self::combined(CombinedType::Or, members)
    }

    pub fn combined(ty: CombinedType, members: impl IntoIterator<Item = CoreExpression>) -> Self {
        let mut members: Vec<CoreExpression> = members.into_iter().collect();
        match members.len() {
            0 => match ty {
                CombinedType::And => Self::all(),
                CombinedType::Or => Self::none(),
            },
            1 => members.swap_remove(0),
            _ => CoreExpression::Combined(ty, members),
        }
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(self, CoreExpression::Combined(..))
    }

    /// Visit every leaf (including special sets) in depth-first order.
    pub fn for_each_leaf<F>(&self, f: &mut F)
    where
        F: FnMut(&CoreExpression),
    {
        match self {
            CoreExpression::Combined(_, members) => {
                for m in members {
                    m.for_each_leaf(f);
                }
            }
            leaf => f(leaf),
        }
    }

    /// Names of all arguments, including referenced ones.
    pub fn arg_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.for_each_leaf(&mut |leaf| {
            if let CoreExpression::Match(m) | CoreExpression::Negation(m) = leaf {
                names.push(m.arg_name().to_string());
                if let Some(r) = m.referenced_arg_name() {
                    names.push(r.to_string());
                }
            }
        });
        names.sort();
        names.dedup();
        names
    }

    /// All literal values used as operands.
    pub fn values(&self) -> Vec<String> {
        let mut values = Vec::new();
        self.for_each_leaf(&mut |leaf| {
            if let CoreExpression::Match(m) | CoreExpression::Negation(m) = leaf {
                if let Some(Operand::Value(v)) = m.operand() {
                    values.push(v.clone());
                }
            }
        });
        values.sort();
        values.dedup();
        values
    }

    /// 0 for a leaf, else 1 + max depth of the members.
    pub fn depth(&self) -> usize {
        match self {
            CoreExpression::Combined(_, members) => 1 + members.iter().map(|m| m.depth()).max().unwrap_or(0),
            _ => 0,
        }
    }
}

impl fmt::Display for CoreExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreExpression::SpecialSet(s) => write!(f, "{}", s),
            CoreExpression::Match(m) => write!(f, "{}", m),
            CoreExpression::Negation(m) => match m.operator() {
                MatchOperator::IsUnknown => write!(f, "{} IS NOT UNKNOWN", m.arg_name()),
                _ => write!(f, "STRICT NOT {}", m),
            },
            CoreExpression::Combined(ty, members) => {
                write!(f, "(")?;
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", ty)?;
                    }
                    write!(f, "{}", m)?;
                }
                write!(f, ")")
            }
        }
    }
}

// a & b
impl BitAnd for CoreExpression {
    type Output = CoreExpression;

    fn bitand(self, rhs: Self) -> Self::Output {
        CoreExpression::and([self, rhs])
    }
}

// a | b
impl BitOr for CoreExpression {
    type Output = CoreExpression;

    fn bitor(self, rhs: Self) -> Self::Output {
        CoreExpression::or([self, rhs])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_leaves() {
        assert_eq!(CoreExpression::equals("a", "1").to_string(), "a = 1");
        assert_eq!(CoreExpression::equals("a", "1").strict_not().to_string(), "STRICT NOT a = 1");
        assert_eq!(CoreExpression::is_unknown("a").to_string(), "a IS UNKNOWN");
        assert_eq!(CoreExpression::is_not_unknown("a").to_string(), "a IS NOT UNKNOWN");
        assert_eq!(CoreExpression::less_than_ref("b", "a").to_string(), "b < @a");
        assert_eq!(CoreExpression::contains("c", "x").to_string(), "c CONTAINS x");
        assert_eq!(CoreExpression::all().to_string(), "<ALL>");
    }

    #[test]
    fn test_display_combined() {
        let e = CoreExpression::equals("a", "1") & (CoreExpression::equals("b", "2") | CoreExpression::equals("c", "3"));
        assert_eq!(e.to_string(), "(a = 1 AND (b = 2 OR c = 3))");
        assert_eq!(e.depth(), 2);
    }

    #[test]
    fn test_combined_collapsing() {
        assert_eq!(CoreExpression::and([]), CoreExpression::all());
        assert_eq!(CoreExpression::or([]), CoreExpression::none());
        let a = CoreExpression::equals("a", "1");
        assert_eq!(CoreExpression::or([a.clone()]), a);
    }

    #[test]
    fn test_strict_not_involutive() {
        let a = CoreExpression::greater_than("a", "5");
        assert_eq!(a.clone().strict_not().strict_not(), a);
        assert_eq!(CoreExpression::none().strict_not(), CoreExpression::all());
    }

    #[test]
    fn test_names_and_values() {
        let e = CoreExpression::or([
            CoreExpression::equals("b", "2"),
            CoreExpression::equals_ref("a", "z"),
            CoreExpression::equals("a", "1").strict_not(),
            CoreExpression::is_unknown("c"),
        ]);
        assert_eq!(e.arg_names(), vec!["a", "b", "c", "z"]);
        assert_eq!(e.values(), vec!["1", "2"]);
    }

    #[test]
    fn test_well_formed() {
        assert!(MatchExpression::new("a", MatchOperator::IsUnknown, None).is_well_formed());
        assert!(!MatchExpression::new("a", MatchOperator::Equals, None).is_well_formed());
        assert!(!MatchExpression::new("a", MatchOperator::IsUnknown, Some(Operand::Value("1".into()))).is_well_formed());
    }
}
