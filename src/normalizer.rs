//! Conversion to OR-of-AND form.
//!
//! An AND with OR members is multiplied out: `a AND (b OR c)` becomes
//! `(a AND b) OR (a AND c)`. Each new term is checked against the logic
//! helper before it is built, so implied members are not duplicated and
//! contradicting terms are dropped right away. Since the number of terms
//! can grow exponentially, the terms are consolidated through the
//! [`ImplicationResolver`] whenever their count exceeds a threshold.

use log::{debug, warn};

use crate::error::OptimizerResult;
use crate::node::Node;
use crate::resolver::ImplicationResolver;
use crate::timeout::TimeOut;
use crate::tree::EncodedExpressionTree;
use crate::types::CombinedType;

/// Default term count above which accumulated terms are cleaned up.
pub const DEFAULT_CLEANUP_THRESHOLD: usize = 500;

pub struct OrOfAndNormalizer<'a> {
    timeout: &'a dyn TimeOut,
    cleanup_threshold: usize,
}

impl<'a> OrOfAndNormalizer<'a> {
    pub fn new(timeout: &'a dyn TimeOut) -> Self {
        Self {
            timeout,
            cleanup_threshold: DEFAULT_CLEANUP_THRESHOLD,
        }
    }

    pub fn with_cleanup_threshold(mut self, threshold: usize) -> Self {
        self.cleanup_threshold = threshold;
        self
    }

    /// Normalize every root. Roots are only replaced if all of them succeed.
    pub fn process(&self, tree: &mut EncodedExpressionTree) -> OptimizerResult<()> {
        let roots = tree.roots().to_vec();
        let mut normalized = Vec::with_capacity(roots.len());
        for root in roots {
            match self.normalize(tree, root) {
                Ok(node) => normalized.push(node),
                Err(e) => {
                    warn!("OR-of-AND normalizer aborted: {}", e);
                    return Err(e);
                }
            }
        }
        tree.set_roots(normalized);
        Ok(())
    }

    pub fn normalize(&self, tree: &mut EncodedExpressionTree, node: Node) -> OptimizerResult<Node> {
        debug!("normalize(node = {})", node);
        let res = self.normalize_(tree, node)?;
        debug!("normalize: {} -> {}", node, res);
        Ok(res)
    }

    fn normalize_(&self, tree: &mut EncodedExpressionTree, node: Node) -> OptimizerResult<Node> {
        self.timeout.assert_have_time()?;

        let Some(ty) = node.combined_type() else {
            return Ok(node);
        };

        let members = tree.member_array(node)?;
        let mut normalized = Vec::with_capacity(members.len());
        for &m in members.iter() {
            normalized.push(self.normalize_(tree, m)?);
        }

        if ty == CombinedType::Or {
            return Ok(tree.create_combined_node(CombinedType::Or, &normalized)?);
        }

        let (ors, others): (Vec<Node>, Vec<Node>) = normalized.into_iter().partition(|m| m.is_or());
        let base = tree.create_combined_node(CombinedType::And, &others)?;
        if ors.is_empty() || base == Node::NONE {
            return Ok(base);
        }

        let mut terms = vec![base];
        for or in ors {
            let alternatives = tree.member_array(or)?;
            let mut next = Vec::with_capacity(terms.len() * alternatives.len());
            for &t in &terms {
                for &alt in alternatives.iter() {
                    self.timeout.assert_have_time()?;
                    if let Some(term) = self.combine(tree, t, alt)? {
                        next.push(term);
                    }
                }
            }
            next.sort_unstable();
            next.dedup();
            terms = next;

            if terms.len() > self.cleanup_threshold {
                terms = self.cleanup(tree, &terms)?;
            }
            if terms.is_empty() {
                break;
            }
        }

        Ok(tree.create_combined_node(CombinedType::Or, &terms)?)
    }

    /// `term AND alt`, or `None` if that can never hold.
    fn combine(&self, tree: &mut EncodedExpressionTree, term: Node, alt: Node) -> OptimizerResult<Option<Node>> {
        if term == Node::ALL {
            return Ok(Some(alt));
        }
        if alt == Node::ALL {
            return Ok(Some(term));
        }
        {
            let logic = tree.logic();
            if logic.left_implies_right(term, alt)? {
                return Ok(Some(term));
            }
            if logic.left_implies_right(alt, term)? {
                return Ok(Some(alt));
            }
            if logic.left_contradicts_right(term, alt)? {
                return Ok(None);
            }
        }
        let res = tree.create_combined_node(CombinedType::And, &[term, alt])?;
        Ok(if res == Node::NONE { None } else { Some(res) })
    }

    /// Run the accumulated terms through the resolver.
    fn cleanup(&self, tree: &mut EncodedExpressionTree, terms: &[Node]) -> OptimizerResult<Vec<Node>> {
        let before = terms.len();
        let or = tree.create_combined_node(CombinedType::Or, terms)?;
        let resolved = ImplicationResolver::new(self.timeout).resolve(tree, or)?;
        let res = if resolved.is_or() {
            tree.member_array(resolved)?.to_vec()
        } else if resolved == Node::NONE {
            Vec::new()
        } else {
            vec![resolved]
        };
        debug!("normalize: cleanup {} -> {} terms", before, res.len());
        Ok(res)
    }
}
