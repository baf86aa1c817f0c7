//! Pairwise reasoning over encoded nodes: implication, contradiction and the
//! advice table used by the implication resolver.
//!
//! Everything here is *simple* reasoning. An implication is only found if it
//! holds element by element (one member on the left at a time), so e.g.
//! `(a = 1 OR b = 1) AND (a = 1 OR STRICT NOT b = 1)` is not recognized as
//! implying `a = 1`. Both answers are sound: `true` always means the relation
//! holds, `false` means it could not be shown.

use log::debug;

use crate::error::CodecResult;
use crate::node::Node;
use crate::tree::EncodedExpressionTree;
use crate::types::CombinedType;
use crate::utils::sorted_contains;

/// What to do with a pair of siblings under a given parent.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Advice {
    RetainBoth,
    RemoveLeft,
    RemoveRight,
    /// Both are equivalent, either one can go.
    RemoveEither,
    /// Both are neutral elements of the parent.
    RemoveBoth,
    /// `x OR STRICT NOT x` with `x` not an is-unknown check: replace the pair
    /// by the "all involved arguments are known" condition.
    ReplaceBothWithIsNotUnknown,
    /// The parent is always true.
    AlwaysTrue,
    /// The parent is never true.
    NeverTrue,
}

/// True if the sorted AND member list contains a leaf and its negation, or an
/// `x IS UNKNOWN` next to a leaf requiring `x` to be known.
pub fn has_simple_contradiction(members: &[Node]) -> bool {
    for &m in members.iter().filter(|m| m.is_leaf()) {
        if sorted_contains(members, &m.flip()) {
            return true;
        }
        if m.is_positive_unknown_check() {
            let arg = m.arg_idx();
            if members.iter().any(|n| n.requires_known(arg)) {
                return true;
            }
        }
    }
    false
}

/// True if the sorted OR member list contains both `x IS UNKNOWN` and `x IS NOT UNKNOWN`.
pub fn has_is_unknown_contradiction(members: &[Node]) -> bool {
    members
        .iter()
        .any(|m| m.is_positive_unknown_check() && sorted_contains(members, &m.flip()))
}

/// Leaf-level contradiction (no recursion).
fn leaves_contradict(a: Node, b: Node) -> bool {
    b == a.flip()
        || (a.is_positive_unknown_check() && b.requires_known(a.arg_idx()))
        || (b.is_positive_unknown_check() && a.requires_known(b.arg_idx()))
}

/// Structural weight for the equivalence tie-break: (has nested combined members, member count).
type Complexity = (bool, usize);

pub struct LogicHelper<'a> {
    tree: &'a EncodedExpressionTree,
}

impl<'a> LogicHelper<'a> {
    pub fn new(tree: &'a EncodedExpressionTree) -> Self {
        Self { tree }
    }

    /// True if `a` implies `b` (by simple reasoning).
    pub fn left_implies_right(&self, a: Node, b: Node) -> CodecResult<bool> {
        if a == b || b == Node::ALL || a == Node::NONE {
            return Ok(true);
        }
        if a == Node::ALL || b == Node::NONE {
            return Ok(false);
        }
        if b.is_and() {
            for &m in self.tree.member_array(b)?.iter() {
                if !self.left_implies_right(a, m)? {
                    return Ok(false);
                }
            }
            return Ok(true);
        }
        if a.is_or() {
            for &m in self.tree.member_array(a)?.iter() {
                if !self.left_implies_right(m, b)? {
                    return Ok(false);
                }
            }
            return Ok(true);
        }
        if a.is_and() {
            for &m in self.tree.member_array(a)?.iter() {
                if self.left_implies_right(m, b)? {
                    return Ok(true);
                }
            }
            return Ok(false);
        }
        if b.is_or() {
            for &m in self.tree.member_array(b)?.iter() {
                if self.left_implies_right(a, m)? {
                    return Ok(true);
                }
            }
            return Ok(false);
        }
        // Both leaves: any leaf requiring `x` implies `x IS NOT UNKNOWN`.
        Ok(b.is_unknown_check() && b.negation_bit() && a.requires_known(b.arg_idx()))
    }

    /// True if `a AND b` can never hold (by simple reasoning).
    pub fn left_contradicts_right(&self, a: Node, b: Node) -> CodecResult<bool> {
        if a == Node::NONE || b == Node::NONE {
            return Ok(true);
        }
        if a == Node::ALL || b == Node::ALL {
            return Ok(false);
        }
        if a.is_and() {
            for &m in self.tree.member_array(a)?.iter() {
                if self.left_contradicts_right(m, b)? {
                    return Ok(true);
                }
            }
            return Ok(false);
        }
        if b.is_and() {
            return self.left_contradicts_right(b, a);
        }
        if a.is_or() {
            for &m in self.tree.member_array(a)?.iter() {
                if !self.left_contradicts_right(m, b)? {
                    return Ok(false);
                }
            }
            return Ok(true);
        }
        if b.is_or() {
            return self.left_contradicts_right(b, a);
        }
        Ok(leaves_contradict(a, b))
    }

    pub fn have_any_simple_contradiction_in_and_parent(&self, members: &[Node]) -> bool {
        has_simple_contradiction(members)
    }

    pub fn have_any_is_unknown_contradiction_in_or_parent(&self, members: &[Node]) -> bool {
        has_is_unknown_contradiction(members)
    }

    fn complexity(&self, node: Node) -> CodecResult<Complexity> {
        if !node.is_combined() {
            return Ok((false, 0));
        }
        let members = self.tree.member_array(node)?;
        Ok((members.iter().any(|m| m.is_combined()), members.len()))
    }

    /// Advice for two siblings `left` and `right` of a parent of type `parent`.
    pub fn check_implications(&self, parent: CombinedType, left: Node, right: Node) -> CodecResult<Advice> {
        let advice = self.check_implications_(parent, left, right)?;
        if advice != Advice::RetainBoth {
            debug!("check_implications({}, {}, {}) -> {:?}", parent, left, right, advice);
        }
        Ok(advice)
    }

    fn check_implications_(&self, parent: CombinedType, left: Node, right: Node) -> CodecResult<Advice> {
        let is_and = parent == CombinedType::And;
        let (neutral, absorbing) = if is_and {
            (Node::ALL, Node::NONE)
        } else {
            (Node::NONE, Node::ALL)
        };

        if left == absorbing || right == absorbing {
            return Ok(if is_and { Advice::NeverTrue } else { Advice::AlwaysTrue });
        }
        if left == neutral && right == neutral {
            return Ok(Advice::RemoveBoth);
        }
        if left == neutral {
            return Ok(Advice::RemoveLeft);
        }
        if right == neutral {
            return Ok(Advice::RemoveRight);
        }

        if left == right {
            return Ok(Advice::RemoveEither);
        }

        if left.is_leaf() && right == left.flip() {
            if is_and {
                return Ok(Advice::NeverTrue);
            }
            return Ok(if left.is_unknown_check() {
                Advice::AlwaysTrue
            } else {
                Advice::ReplaceBothWithIsNotUnknown
            });
        }

        if is_and && self.left_contradicts_right(left, right)? {
            return Ok(Advice::NeverTrue);
        }

        let l2r = self.left_implies_right(left, right)?;
        let r2l = self.left_implies_right(right, left)?;
        match (l2r, r2l) {
            (true, true) => {
                let cl = self.complexity(left)?;
                let cr = self.complexity(right)?;
                Ok(match cl.cmp(&cr) {
                    std::cmp::Ordering::Less => Advice::RemoveLeft,
                    std::cmp::Ordering::Greater => Advice::RemoveRight,
                    std::cmp::Ordering::Equal => Advice::RemoveEither,
                })
            }
            // In an AND the weaker (implied) side is redundant, in an OR the stronger one.
            (true, false) => Ok(if is_and { Advice::RemoveRight } else { Advice::RemoveLeft }),
            (false, true) => Ok(if is_and { Advice::RemoveLeft } else { Advice::RemoveRight }),
            (false, false) => Ok(Advice::RetainBoth),
        }
    }
}

impl EncodedExpressionTree {
    pub fn logic(&self) -> LogicHelper<'_> {
        LogicHelper::new(self)
    }

    /// The exact (non-strict) complement of a node.
    ///
    /// `NOT (a = 1)` holds when `a` is unknown as well, so a plain leaf becomes
    /// `STRICT NOT a = 1 OR a IS UNKNOWN` (plus the referenced argument for a
    /// reference match). Combined nodes follow De Morgan.
    pub fn create_complement_of(&mut self, node: Node) -> CodecResult<Node> {
        if node.is_special_set() || node.is_unknown_check() {
            return self.codec().negate(node);
        }
        if let Some(ty) = node.combined_type() {
            let members = self.member_array(node)?;
            let mut complements = Vec::with_capacity(members.len());
            for &m in members.iter() {
                complements.push(self.create_complement_of(m)?);
            }
            return self.create_combined_node(ty.dual(), &complements);
        }
        let mut members = vec![self.codec().negate(node)?, self.codec().create_is_unknown_for_arg_name(node)?];
        if node.is_reference_leaf() {
            members.push(self.codec().create_is_unknown_for_referenced_arg_name(node)?);
        }
        self.create_combined_node(CombinedType::Or, &members)
    }

    /// `x IS NOT UNKNOWN` for the argument(s) of a leaf: what `leaf OR STRICT NOT leaf` reduces to.
    pub fn create_known_check_for(&mut self, leaf: Node) -> CodecResult<Node> {
        let arg_known = self.codec().negate(self.codec().create_is_unknown_for_arg_name(leaf)?)?;
        if !leaf.is_reference_leaf() {
            return Ok(arg_known);
        }
        let ref_known = self
            .codec()
            .negate(self.codec().create_is_unknown_for_referenced_arg_name(leaf)?)?;
        self.create_combined_node(CombinedType::And, &[arg_known, ref_known])
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::codec::Codec;
    use crate::dictionary::Dictionary;
    use crate::expr::CoreExpression;

    struct Fixture {
        tree: EncodedExpressionTree,
    }

    impl Fixture {
        fn new() -> Self {
            let dict = Dictionary::new(["a", "b", "c"], ["1", "2", "3"]).unwrap();
            Self {
                tree: EncodedExpressionTree::new(Codec::new(dict)),
            }
        }

        fn node(&mut self, e: &CoreExpression) -> Node {
            self.tree.create_node(e).unwrap()
        }
    }

    fn eq(arg: &str, v: &str) -> CoreExpression {
        CoreExpression::equals(arg, v)
    }

    #[test]
    fn test_implies_basics() {
        let mut f = Fixture::new();
        let a1 = f.node(&eq("a", "1"));
        let a_known = f.node(&CoreExpression::is_not_unknown("a"));
        let a_unknown = f.node(&CoreExpression::is_unknown("a"));
        let not_a1 = f.node(&eq("a", "1").strict_not());
        let logic = f.tree.logic();

        assert!(logic.left_implies_right(a1, a1).unwrap());
        assert!(logic.left_implies_right(a1, Node::ALL).unwrap());
        assert!(logic.left_implies_right(Node::NONE, a1).unwrap());
        assert!(!logic.left_implies_right(Node::ALL, a1).unwrap());
        assert!(!logic.left_implies_right(a1, Node::NONE).unwrap());
        assert!(logic.left_implies_right(a1, a_known).unwrap());
        assert!(logic.left_implies_right(not_a1, a_known).unwrap());
        assert!(!logic.left_implies_right(a_known, a1).unwrap());
        assert!(!logic.left_implies_right(a_unknown, a_known).unwrap());
    }

    #[test]
    fn test_implies_reference() {
        let mut f = Fixture::new();
        let r = f.node(&CoreExpression::less_than_ref("a", "b"));
        let a_known = f.node(&CoreExpression::is_not_unknown("a"));
        let b_known = f.node(&CoreExpression::is_not_unknown("b"));
        let c_known = f.node(&CoreExpression::is_not_unknown("c"));
        let logic = f.tree.logic();
        assert!(logic.left_implies_right(r, a_known).unwrap());
        assert!(logic.left_implies_right(r, b_known).unwrap());
        assert!(!logic.left_implies_right(r, c_known).unwrap());
    }

    #[test]
    fn test_implies_combined() {
        let mut f = Fixture::new();
        let a1 = f.node(&eq("a", "1"));
        let b2 = f.node(&eq("b", "2"));
        let and = f.node(&(eq("a", "1") & eq("b", "2")));
        let or = f.node(&(eq("a", "1") | eq("b", "2")));
        let b_known = f.node(&CoreExpression::is_not_unknown("b"));
        let logic = f.tree.logic();

        assert!(logic.left_implies_right(and, a1).unwrap());
        assert!(logic.left_implies_right(a1, or).unwrap());
        assert!(logic.left_implies_right(and, or).unwrap());
        assert!(!logic.left_implies_right(or, a1).unwrap());
        assert!(!logic.left_implies_right(a1, and).unwrap());
        assert!(logic.left_implies_right(and, b_known).unwrap());
        assert!(!logic.left_implies_right(or, b_known).unwrap());
        assert!(logic.left_implies_right(b2, or).unwrap());
    }

    #[test]
    fn test_contradicts() {
        let mut f = Fixture::new();
        let a1 = f.node(&eq("a", "1"));
        let not_a1 = f.node(&eq("a", "1").strict_not());
        let a2 = f.node(&eq("a", "2"));
        let a_unknown = f.node(&CoreExpression::is_unknown("a"));
        let and = f.node(&(eq("a", "1") & eq("b", "2")));
        let or = f.node(&(eq("a", "1") | eq("b", "2")));
        let logic = f.tree.logic();

        assert!(logic.left_contradicts_right(a1, not_a1).unwrap());
        assert!(logic.left_contradicts_right(a_unknown, a1).unwrap());
        assert!(logic.left_contradicts_right(not_a1, a_unknown).unwrap());
        assert!(logic.left_contradicts_right(Node::NONE, a1).unwrap());
        assert!(!logic.left_contradicts_right(Node::ALL, a1).unwrap());
        // different values are not a simple contradiction
        assert!(!logic.left_contradicts_right(a1, a2).unwrap());
        assert!(logic.left_contradicts_right(and, not_a1).unwrap());
        assert!(logic.left_contradicts_right(not_a1, and).unwrap());
        assert!(!logic.left_contradicts_right(or, not_a1).unwrap());
        assert!(!logic.left_contradicts_right(or, a_unknown).unwrap());
    }

    #[test]
    fn test_simple_contradiction_lists() {
        let mut f = Fixture::new();
        let a1 = f.node(&eq("a", "1"));
        let b2 = f.node(&eq("b", "2"));
        let not_a1 = f.node(&eq("a", "1").strict_not());
        let unk = f.node(&CoreExpression::is_unknown("b"));
        let known = f.node(&CoreExpression::is_not_unknown("b"));

        let mut list = vec![a1, b2, not_a1];
        list.sort();
        assert!(has_simple_contradiction(&list));
        let mut list = vec![a1, unk];
        list.sort();
        assert!(!has_simple_contradiction(&list));
        let mut list = vec![b2, unk];
        list.sort();
        assert!(has_simple_contradiction(&list));

        let mut list = vec![unk, a1, known];
        list.sort();
        assert!(has_is_unknown_contradiction(&list));
        let mut list = vec![a1, not_a1];
        list.sort();
        assert!(!has_is_unknown_contradiction(&list));

        let logic = f.tree.logic();
        assert!(logic.have_any_simple_contradiction_in_and_parent(&list));
        assert!(!logic.have_any_is_unknown_contradiction_in_or_parent(&list));
    }

    #[test]
    fn test_advice_special_sets() {
        let mut f = Fixture::new();
        let a1 = f.node(&eq("a", "1"));
        let logic = f.tree.logic();
        let and = CombinedType::And;
        let or = CombinedType::Or;
        assert_eq!(logic.check_implications(and, a1, Node::NONE).unwrap(), Advice::NeverTrue);
        assert_eq!(logic.check_implications(and, Node::ALL, Node::ALL).unwrap(), Advice::RemoveBoth);
        assert_eq!(logic.check_implications(and, Node::ALL, a1).unwrap(), Advice::RemoveLeft);
        assert_eq!(logic.check_implications(or, a1, Node::ALL).unwrap(), Advice::AlwaysTrue);
        assert_eq!(logic.check_implications(or, Node::NONE, Node::NONE).unwrap(), Advice::RemoveBoth);
        assert_eq!(logic.check_implications(or, a1, Node::NONE).unwrap(), Advice::RemoveRight);
        assert_eq!(logic.check_implications(or, a1, a1).unwrap(), Advice::RemoveEither);
    }

    #[test]
    fn test_advice_negation_pairs() {
        let mut f = Fixture::new();
        let a1 = f.node(&eq("a", "1"));
        let not_a1 = f.node(&eq("a", "1").strict_not());
        let unk = f.node(&CoreExpression::is_unknown("a"));
        let known = f.node(&CoreExpression::is_not_unknown("a"));
        let logic = f.tree.logic();
        let and = CombinedType::And;
        let or = CombinedType::Or;
        assert_eq!(logic.check_implications(and, a1, not_a1).unwrap(), Advice::NeverTrue);
        assert_eq!(
            logic.check_implications(or, a1, not_a1).unwrap(),
            Advice::ReplaceBothWithIsNotUnknown
        );
        assert_eq!(logic.check_implications(or, unk, known).unwrap(), Advice::AlwaysTrue);
        assert_eq!(logic.check_implications(and, unk, a1).unwrap(), Advice::NeverTrue);
    }

    #[test]
    fn test_advice_implications() {
        let mut f = Fixture::new();
        let a1 = f.node(&eq("a", "1"));
        let b2 = f.node(&eq("b", "2"));
        let known = f.node(&CoreExpression::is_not_unknown("a"));
        let a1_or_b2 = f.node(&(eq("a", "1") | eq("b", "2")));
        let logic = f.tree.logic();
        let and = CombinedType::And;
        let or = CombinedType::Or;

        // AND keeps the stronger side
        assert_eq!(logic.check_implications(and, a1, known).unwrap(), Advice::RemoveRight);
        assert_eq!(logic.check_implications(and, known, a1).unwrap(), Advice::RemoveLeft);
        assert_eq!(logic.check_implications(and, a1, a1_or_b2).unwrap(), Advice::RemoveRight);
        // OR keeps the weaker side
        assert_eq!(logic.check_implications(or, a1, known).unwrap(), Advice::RemoveLeft);
        assert_eq!(logic.check_implications(or, known, a1).unwrap(), Advice::RemoveRight);
        assert_eq!(logic.check_implications(or, a1, b2).unwrap(), Advice::RetainBoth);
    }

    #[test]
    fn test_advice_equivalence_tie_break() {
        let mut f = Fixture::new();
        let a1 = f.node(&eq("a", "1"));
        let known = f.node(&CoreExpression::is_not_unknown("a"));
        // a = 1 and (a = 1 AND a IS NOT UNKNOWN) imply each other; this AND is
        // only constructible directly through the registry
        let id = {
            let mut members = vec![a1, known];
            members.sort();
            f.tree.registry_mut().register_member_array(&members).unwrap()
        };
        let and_node = f.tree.codec().encode_combined_expression_id(id, CombinedType::And).unwrap();
        let logic = f.tree.logic();
        assert_eq!(
            logic.check_implications(CombinedType::Or, a1, and_node).unwrap(),
            Advice::RemoveLeft
        );
        assert_eq!(
            logic.check_implications(CombinedType::Or, and_node, a1).unwrap(),
            Advice::RemoveRight
        );
    }

    #[test]
    fn test_complement() {
        let mut f = Fixture::new();
        let a1 = f.node(&eq("a", "1"));
        let c = f.tree.create_complement_of(a1).unwrap();
        let expected = f.node(&(eq("a", "1").strict_not() | CoreExpression::is_unknown("a")));
        assert_eq!(c, expected);

        let unk = f.node(&CoreExpression::is_unknown("b"));
        assert_eq!(f.tree.create_complement_of(unk).unwrap(), unk.flip());
        assert_eq!(f.tree.create_complement_of(Node::ALL).unwrap(), Node::NONE);

        let r = f.node(&CoreExpression::equals_ref("a", "c"));
        let rc = f.tree.create_complement_of(r).unwrap();
        assert_eq!(f.tree.member_array(rc).unwrap().len(), 3);

        // De Morgan: NOT (a = 1 AND b IS UNKNOWN) = (STRICT NOT a = 1 OR a IS UNKNOWN OR b IS NOT UNKNOWN)
        let and = f.node(&(eq("a", "1") & CoreExpression::is_unknown("b")));
        let ac = f.tree.create_complement_of(and).unwrap();
        let expected = f.node(&CoreExpression::or([
            eq("a", "1").strict_not(),
            CoreExpression::is_unknown("a"),
            CoreExpression::is_not_unknown("b"),
        ]));
        assert_eq!(ac, expected);
    }

    #[test]
    fn test_known_check() {
        let mut f = Fixture::new();
        let a1 = f.node(&eq("a", "1"));
        let known = f.node(&CoreExpression::is_not_unknown("a"));
        assert_eq!(f.tree.create_known_check_for(a1).unwrap(), known);
        let r = f.node(&CoreExpression::equals_ref("b", "c"));
        let both = f.node(&(CoreExpression::is_not_unknown("b") & CoreExpression::is_not_unknown("c")));
        assert_eq!(f.tree.create_known_check_for(r).unwrap(), both);
    }
}
