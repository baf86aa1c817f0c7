//! Factoring of common AND members out of ORs.
//!
//! `(a AND b) OR (a AND c) OR d` becomes `(a AND (b OR c)) OR d`. The member
//! set to factor out is the *overlap* (intersection) of two AND members that
//! is contained in the most other pairwise overlaps; ties prefer larger
//! overlaps, then the smallest array.

use log::{debug, warn};

use crate::error::OptimizerResult;
use crate::node::Node;
use crate::resolver::ImplicationResolver;
use crate::timeout::TimeOut;
use crate::tree::EncodedExpressionTree;
use crate::types::CombinedType;
use crate::utils::{intersect_sorted, is_sorted_subset, merge_sorted, remove_sorted};

pub struct OverlapRegrouper<'a> {
    timeout: &'a dyn TimeOut,
}

impl<'a> OverlapRegrouper<'a> {
    pub fn new(timeout: &'a dyn TimeOut) -> Self {
        Self { timeout }
    }

    /// Regroup every root. Roots are only replaced if all of them succeed.
    pub fn process(&self, tree: &mut EncodedExpressionTree) -> OptimizerResult<()> {
        let roots = tree.roots().to_vec();
        let mut regrouped = Vec::with_capacity(roots.len());
        for root in roots {
            match self.regroup(tree, root) {
                Ok(node) => regrouped.push(node),
                Err(e) => {
                    warn!("Overlap regrouper aborted: {}", e);
                    return Err(e);
                }
            }
        }
        tree.set_roots(regrouped);
        Ok(())
    }

    pub fn regroup(&self, tree: &mut EncodedExpressionTree, node: Node) -> OptimizerResult<Node> {
        debug!("regroup(node = {})", node);
        let res = self.regroup_(tree, node)?;
        debug!("regroup: {} -> {}", node, res);
        Ok(res)
    }

    fn regroup_(&self, tree: &mut EncodedExpressionTree, node: Node) -> OptimizerResult<Node> {
        self.timeout.assert_have_time()?;

        let Some(ty) = node.combined_type() else {
            return Ok(node);
        };

        let members = tree.member_array(node)?;
        let mut regrouped = Vec::with_capacity(members.len());
        for &m in members.iter() {
            regrouped.push(self.regroup_(tree, m)?);
        }
        let mut current = tree.create_combined_node(ty, &regrouped)?;
        if ty == CombinedType::And {
            return Ok(current);
        }

        while current.is_or() {
            self.timeout.assert_have_time()?;
            let members = tree.member_array(current)?;
            let Some(overlap) = self.best_overlap(tree, &members)? else {
                break;
            };
            current = self.factor_out(tree, &members, &overlap)?;
        }

        Ok(ImplicationResolver::new(self.timeout).resolve(tree, current)?)
    }

    /// Overlap to factor out, if any two AND members share a member.
    fn best_overlap(&self, tree: &EncodedExpressionTree, members: &[Node]) -> OptimizerResult<Option<Vec<Node>>> {
        let mut arrays = Vec::new();
        for &m in members.iter().filter(|m| m.is_and()) {
            arrays.push(tree.member_array(m)?);
        }

        let mut overlaps: Vec<Vec<Node>> = Vec::new();
        for i in 0..arrays.len() {
            for j in (i + 1)..arrays.len() {
                self.timeout.assert_have_time()?;
                let overlap = intersect_sorted(&arrays[i][..], &arrays[j][..]);
                if !overlap.is_empty() {
                    overlaps.push(overlap);
                }
            }
        }
        if overlaps.is_empty() {
            return Ok(None);
        }

        let mut candidates = overlaps.clone();
        candidates.sort();
        candidates.dedup();

        let mut best: Option<(usize, Vec<Node>)> = None;
        for candidate in candidates {
            self.timeout.assert_have_time()?;
            let votes = overlaps.iter().filter(|o| is_sorted_subset(&candidate, o.as_slice())).count();
            let better = match &best {
                None => true,
                Some((best_votes, best_overlap)) => {
                    (votes, candidate.len()) > (*best_votes, best_overlap.len())
                }
            };
            // candidates are sorted, so on a tie the smallest array stays
            if better {
                best = Some((votes, candidate));
            }
        }

        if let Some((votes, overlap)) = &best {
            debug!("best overlap: {:?} with {} votes", overlap, votes);
        }
        Ok(best.map(|(_, overlap)| overlap))
    }

    /// Replace every AND member containing `overlap` by one `overlap AND (rest1 OR rest2 ...)`.
    fn factor_out(&self, tree: &mut EncodedExpressionTree, members: &[Node], overlap: &[Node]) -> OptimizerResult<Node> {
        let mut rests = Vec::new();
        let mut others = Vec::new();
        for &m in members {
            if m.is_and() {
                let array = tree.member_array(m)?;
                if is_sorted_subset(overlap, &array[..]) {
                    let rest = remove_sorted(&array[..], overlap);
                    rests.push(tree.create_combined_node(CombinedType::And, &rest)?);
                    continue;
                }
            }
            others.push(m);
        }
        debug_assert!(rests.len() >= 2);

        let inner = tree.create_combined_node(CombinedType::Or, &rests)?;
        let inner = self.regroup_(tree, inner)?;
        let factored = tree.create_combined_node(CombinedType::And, &merge_sorted(overlap, &[inner]))?;
        others.push(factored);
        Ok(tree.create_combined_node(CombinedType::Or, &others)?)
    }
}
