//! Implication resolver: removes members that are implied by, or contradict,
//! what is already known at their position in the tree.
//!
//! Knowledge flows downwards as a list of *assumptions*:
//!
//! - inside an AND, every member may assume all of its siblings,
//! - inside an OR, a member may assume the complement of every leaf sibling
//!   (`OR(x, m)` equals `OR(x, m')` whenever `m` and `m'` agree on records
//!   where `x` does not hold). The complement of `a = 1` is
//!   `STRICT NOT a = 1 OR a IS UNKNOWN`, see
//!   [`create_complement_of`][EncodedExpressionTree::create_complement_of].
//!
//! After the members are resolved, pairwise [`Advice`] is applied until no
//! pair can be simplified. The whole step is repeated until the node stops
//! changing.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::error::{CodecResult, OptimizerResult};
use crate::logic::Advice;
use crate::node::Node;
use crate::timeout::TimeOut;
use crate::tree::EncodedExpressionTree;
use crate::types::CombinedType;

pub struct ImplicationResolver<'a> {
    timeout: &'a dyn TimeOut,
}

impl<'a> ImplicationResolver<'a> {
    pub fn new(timeout: &'a dyn TimeOut) -> Self {
        Self { timeout }
    }

    /// Resolve every root. Roots are only replaced if all of them succeed.
    pub fn process(&self, tree: &mut EncodedExpressionTree) -> OptimizerResult<()> {
        let roots = tree.roots().to_vec();
        let mut resolved = Vec::with_capacity(roots.len());
        for root in roots {
            match self.resolve(tree, root) {
                Ok(node) => resolved.push(node),
                Err(e) => {
                    warn!("Implication resolver aborted: {}", e);
                    return Err(e);
                }
            }
        }
        tree.set_roots(resolved);
        Ok(())
    }

    /// Equivalent, simplified node.
    pub fn resolve(&self, tree: &mut EncodedExpressionTree, node: Node) -> OptimizerResult<Node> {
        debug!("resolve(node = {})", node);
        let res = self.resolve_under(tree, node, &[])?;
        debug!("resolve: {} -> {}", node, res);
        Ok(res)
    }

    /// `ALL` if the assumptions imply `node`, `NONE` if they contradict it.
    fn check_assumptions(
        &self,
        tree: &EncodedExpressionTree,
        node: Node,
        assumptions: &[Node],
    ) -> CodecResult<Option<Node>> {
        let logic = tree.logic();
        for &a in assumptions {
            if logic.left_implies_right(a, node)? {
                return Ok(Some(Node::ALL));
            }
            if logic.left_contradicts_right(a, node)? {
                return Ok(Some(Node::NONE));
            }
        }
        Ok(None)
    }

    fn resolve_under(
        &self,
        tree: &mut EncodedExpressionTree,
        node: Node,
        assumptions: &[Node],
    ) -> OptimizerResult<Node> {
        self.timeout.assert_have_time()?;

        if node.is_special_set() {
            return Ok(node);
        }
        if let Some(res) = self.check_assumptions(tree, node, assumptions)? {
            return Ok(res);
        }

        let mut current = node;
        let mut seen = HashSet::new();
        seen.insert(current);
        while let Some(ty) = current.combined_type() {
            self.timeout.assert_have_time()?;
            let next = match ty {
                CombinedType::And => self.resolve_and(tree, current, assumptions)?,
                CombinedType::Or => self.resolve_or(tree, current, assumptions)?,
            };
            current = next;
            if !seen.insert(next) {
                break;
            }
        }

        if current != node && !current.is_special_set() {
            if let Some(res) = self.check_assumptions(tree, current, assumptions)? {
                return Ok(res);
            }
        }
        Ok(current)
    }

    fn resolve_and(
        &self,
        tree: &mut EncodedExpressionTree,
        node: Node,
        assumptions: &[Node],
    ) -> OptimizerResult<Node> {
        let mut members = tree.member_array(node)?.to_vec();

        for i in 0..members.len() {
            self.timeout.assert_have_time()?;
            let mut context = assumptions.to_vec();
            context.extend(
                members
                    .iter()
                    .enumerate()
                    .filter(|&(j, &m)| j != i && m != Node::ALL)
                    .map(|(_, &m)| m),
            );
            let m = self.resolve_under(tree, members[i], &context)?;
            if m == Node::NONE {
                debug!("resolve_and: member {} of {} is never true", members[i], node);
                return Ok(Node::NONE);
            }
            members[i] = m;
        }

        let res = tree.create_combined_node(CombinedType::And, &members)?;
        self.apply_advice(tree, CombinedType::And, res)
    }

    fn resolve_or(
        &self,
        tree: &mut EncodedExpressionTree,
        node: Node,
        assumptions: &[Node],
    ) -> OptimizerResult<Node> {
        let mut members = Vec::new();
        {
            let logic = tree.logic();
            for &m in tree.member_array(node)?.iter() {
                let mut dropped = false;
                for &a in assumptions {
                    if logic.left_implies_right(a, m)? {
                        debug!("resolve_or: assumption {} implies member {} of {}", a, m, node);
                        return Ok(Node::ALL);
                    }
                    if logic.left_contradicts_right(a, m)? {
                        dropped = true;
                        break;
                    }
                }
                if !dropped {
                    members.push(m);
                }
            }
        }

        let mut complements: HashMap<Node, Node> = HashMap::new();
        for i in 0..members.len() {
            self.timeout.assert_have_time()?;
            let mut context = assumptions.to_vec();
            for (j, &sibling) in members.iter().enumerate() {
                if j == i || sibling.is_combined() || sibling.is_special_set() {
                    continue;
                }
                let complement = match complements.get(&sibling) {
                    Some(&c) => c,
                    None => {
                        let c = tree.create_complement_of(sibling)?;
                        complements.insert(sibling, c);
                        c
                    }
                };
                context.push(complement);
            }
            let m = self.resolve_under(tree, members[i], &context)?;
            if m == Node::ALL {
                debug!("resolve_or: member {} of {} is always true", members[i], node);
                return Ok(Node::ALL);
            }
            members[i] = m;
        }

        let res = tree.create_combined_node(CombinedType::Or, &members)?;
        self.apply_advice(tree, CombinedType::Or, res)
    }

    /// Apply pairwise advice until every pair is retained.
    fn apply_advice(&self, tree: &mut EncodedExpressionTree, ty: CombinedType, node: Node) -> OptimizerResult<Node> {
        let mut node = node;
        'restart: while node.combined_type() == Some(ty) {
            let members = tree.member_array(node)?;
            for i in 0..members.len() {
                for j in (i + 1)..members.len() {
                    self.timeout.assert_have_time()?;
                    let (l, r) = (members[i], members[j]);
                    let advice = tree.logic().check_implications(ty, l, r)?;
                    let keep = match advice {
                        Advice::RetainBoth => continue,
                        Advice::AlwaysTrue => return Ok(Node::ALL),
                        Advice::NeverTrue => return Ok(Node::NONE),
                        Advice::RemoveLeft => Some(r),
                        Advice::RemoveRight | Advice::RemoveEither => Some(l),
                        Advice::RemoveBoth => None,
                        Advice::ReplaceBothWithIsNotUnknown => Some(tree.create_known_check_for(l)?),
                    };
                    let mut rest: Vec<Node> = members
                        .iter()
                        .enumerate()
                        .filter(|&(k, _)| k != i && k != j)
                        .map(|(_, &m)| m)
                        .collect();
                    rest.extend(keep);
                    node = tree.create_combined_node(ty, &rest)?;
                    continue 'restart;
                }
            }
            break;
        }
        Ok(node)
    }
}
