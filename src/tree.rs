//! The encoded expression tree: one codec, one member-array registry and a
//! list of roots.
//!
//! All node construction goes through [`EncodedExpressionTree::create_combined_node`],
//! which keeps every registered array consolidated:
//!
//! - members of the same type are flattened into the parent,
//! - arrays are sorted and duplicate-free,
//! - `ALL`/`NONE` are absorbed (or absorb the whole node),
//! - an AND with a simple contradiction collapses to `NONE`, an OR with an
//!   is-unknown contradiction collapses to `ALL`,
//! - single-member nodes collapse to their member.
//!
//! Since equal arrays share one id, two structurally equal nodes built in the
//! same tree are equal as [`Node`]s.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::codec::Codec;
use crate::dictionary::Dictionary;
use crate::error::{CodecError, CodecResult};
use crate::expr::CoreExpression;
use crate::logic::{has_is_unknown_contradiction, has_simple_contradiction};
use crate::node::Node;
use crate::registry::MemberArrayRegistry;
use crate::types::CombinedType;

#[derive(Debug, Clone)]
pub struct EncodedExpressionTree {
    codec: Codec,
    registry: MemberArrayRegistry,
    roots: Vec<Node>,
}

/// Counters for logging.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TreeStats {
    pub roots: usize,
    pub live_arrays: usize,
    pub issued_arrays: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
}

impl fmt::Display for TreeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "roots={} arrays={}/{} codec cache hits={} misses={}",
            self.roots, self.live_arrays, self.issued_arrays, self.cache_hits, self.cache_misses
        )
    }
}

impl EncodedExpressionTree {
    /// Empty tree (no roots) over the given codec.
    pub fn new(codec: Codec) -> Self {
        Self {
            codec,
            registry: MemberArrayRegistry::default(),
            roots: Vec::new(),
        }
    }

    /// Single-root tree over a dictionary built from the expression itself.
    pub fn from_expression(expr: &CoreExpression) -> CodecResult<Self> {
        let codec = Codec::new(Dictionary::from_expression(expr)?);
        let mut tree = Self::new(codec);
        let root = tree.create_node(expr)?;
        tree.set_root(root);
        Ok(tree)
    }

    /// Multi-root tree, one root per expression, in the given order.
    pub fn from_expressions(exprs: &[CoreExpression]) -> CodecResult<Self> {
        let codec = Codec::new(Dictionary::from_expressions(exprs)?);
        let mut tree = Self::new(codec);
        for expr in exprs {
            let root = tree.create_node(expr)?;
            tree.roots.push(root);
        }
        Ok(tree)
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    pub fn registry(&self) -> &MemberArrayRegistry {
        &self.registry
    }

    #[cfg(test)]
    pub(crate) fn registry_mut(&mut self) -> &mut MemberArrayRegistry {
        &mut self.registry
    }

    pub fn set_housekeeping_threshold(&mut self, threshold: usize) {
        self.registry.set_housekeeping_threshold(threshold);
    }

    pub fn stats(&self) -> TreeStats {
        let (cache_hits, cache_misses) = self.codec.cache_stats();
        TreeStats {
            roots: self.roots.len(),
            live_arrays: self.registry.len(),
            issued_arrays: self.registry.size(),
            cache_hits,
            cache_misses,
        }
    }

    /// First root.
    pub fn root(&self) -> CodecResult<Node> {
        self.roots.first().copied().ok_or(CodecError::NoRoot)
    }

    pub fn roots(&self) -> &[Node] {
        &self.roots
    }

    pub fn set_root(&mut self, root: Node) {
        self.roots = vec![root];
    }

    pub fn set_roots(&mut self, roots: Vec<Node>) {
        self.roots = roots;
    }

    pub fn add_root(&mut self, root: Node) {
        self.roots.push(root);
    }

    /// Encode an expression, registering all of its combined sub-expressions.
    pub fn create_node(&mut self, expr: &CoreExpression) -> CodecResult<Node> {
        match expr {
            CoreExpression::Combined(ty, members) => {
                let nodes = members
                    .iter()
                    .map(|m| self.create_node(m))
                    .collect::<CodecResult<Vec<_>>>()?;
                self.create_combined_node(*ty, &nodes)
            }
            leaf => self.codec.encode(leaf),
        }
    }

    /// Consolidate the members and return the resulting node.
    ///
    /// The result is not necessarily of type `ty`: it may be a sentinel or
    /// the only remaining member.
    pub fn create_combined_node(&mut self, ty: CombinedType, members: &[Node]) -> CodecResult<Node> {
        if members.contains(&Node::INVALID) {
            return Err(CodecError::InvalidMember);
        }

        let (neutral, absorbing) = match ty {
            CombinedType::And => (Node::ALL, Node::NONE),
            CombinedType::Or => (Node::NONE, Node::ALL),
        };

        let mut flat = Vec::with_capacity(members.len());
        for &m in members {
            if m.combined_type() == Some(ty) {
                flat.extend_from_slice(&self.member_array(m)?);
            } else {
                flat.push(m);
            }
        }
        flat.sort_unstable();
        flat.dedup();

        if flat.contains(&absorbing) {
            return Ok(absorbing);
        }
        flat.retain(|&m| m != neutral);

        match ty {
            CombinedType::And if has_simple_contradiction(&flat) => {
                debug!("create_combined_node: contradiction in AND {:?}", flat);
                return Ok(Node::NONE);
            }
            CombinedType::Or if has_is_unknown_contradiction(&flat) => {
                debug!("create_combined_node: tautology in OR {:?}", flat);
                return Ok(Node::ALL);
            }
            _ => {}
        }

        match flat.len() {
            0 => Ok(neutral),
            1 => Ok(flat[0]),
            _ => {
                let id = self.registry.register_member_array(&flat)?;
                let node = self.codec.encode_combined_expression_id(id, ty)?;
                debug!("create_combined_node: {} -> {}", ty, node);
                Ok(node)
            }
        }
    }

    /// Members of a combined node.
    pub fn member_array(&self, node: Node) -> CodecResult<Rc<[Node]>> {
        let id = self.codec.decode_combined_expression_id(node)?;
        self.registry.lookup_member_array(id)
    }

    /// Decode the first root.
    pub fn to_core_expression(&self) -> CodecResult<CoreExpression> {
        self.create_core_expression(self.root()?)
    }

    /// Decode every root, in order.
    pub fn to_core_expressions(&self) -> CodecResult<Vec<CoreExpression>> {
        self.roots.iter().map(|&r| self.create_core_expression(r)).collect()
    }

    pub fn create_core_expression(&self, node: Node) -> CodecResult<CoreExpression> {
        match node.combined_type() {
            Some(ty) => {
                let members = self
                    .member_array(node)?
                    .iter()
                    .map(|&m| self.create_core_expression(m))
                    .collect::<CodecResult<Vec<_>>>()?;
                Ok(CoreExpression::combined(ty, members))
            }
            None => self.codec.decode(node),
        }
    }

    /// New tree over the union of both dictionaries.
    ///
    /// Roots of `self` come first and keep their codes, then the recoded
    /// roots of `other`.
    pub fn merge(&self, other: &EncodedExpressionTree) -> CodecResult<EncodedExpressionTree> {
        let mut merged = EncodedExpressionTree {
            codec: self.codec.merge(&other.codec)?,
            registry: self.registry.copy(),
            roots: self.roots.clone(),
        };
        let mut cache = HashMap::new();
        for &root in &other.roots {
            let node = merged.recode_with(other, root, &mut cache)?;
            merged.roots.push(node);
        }
        debug!("merge: {}", merged.stats());
        Ok(merged)
    }

    /// Rebuild a node of `other` in this tree.
    pub fn recode(&mut self, other: &EncodedExpressionTree, node: Node) -> CodecResult<Node> {
        self.recode_with(other, node, &mut HashMap::new())
    }

    fn recode_with(
        &mut self,
        other: &EncodedExpressionTree,
        node: Node,
        cache: &mut HashMap<Node, Node>,
    ) -> CodecResult<Node> {
        if node.is_special_set() {
            return Ok(node);
        }
        if let Some(&res) = cache.get(&node) {
            return Ok(res);
        }
        let res = match node.combined_type() {
            Some(ty) => {
                let members = other.member_array(node)?;
                let mut recoded = Vec::with_capacity(members.len());
                for &m in members.iter() {
                    recoded.push(self.recode_with(other, m, cache)?);
                }
                self.create_combined_node(ty, &recoded)?
            }
            None => {
                if self.codec.dictionary().is_compatible_with(other.codec.dictionary()) {
                    node
                } else {
                    self.codec.encode(&other.codec.decode(node)?)?
                }
            }
        };
        cache.insert(node, res);
        Ok(res)
    }

    /// All distinct leaves (and sentinels) below `node`, sorted.
    pub fn collect_leaves(&self, node: Node) -> CodecResult<Vec<Node>> {
        let mut leaves = Vec::new();
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            if n.is_combined() {
                stack.extend_from_slice(&self.member_array(n)?);
            } else if n.is_invalid() {
                return Err(CodecError::InvalidNode);
            } else {
                leaves.push(n);
            }
        }
        leaves.sort_unstable();
        leaves.dedup();
        Ok(leaves)
    }

    /// 0 for leaves and sentinels, else 1 + the deepest member.
    pub fn nesting_depth_of(&self, node: Node) -> CodecResult<usize> {
        if !node.is_combined() {
            return Ok(0);
        }
        let mut depth = 0;
        for &m in self.member_array(node)?.iter() {
            depth = depth.max(self.nesting_depth_of(m)?);
        }
        Ok(depth + 1)
    }

    /// Independent copy sharing the immutable member arrays.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Registry housekeeping from the current roots, if above the threshold.
    pub fn trigger_housekeeping(&mut self) -> bool {
        self.registry.trigger_housekeeping(&self.roots)
    }

    /// Registry housekeeping from the current roots, if more than `threshold` arrays are live.
    ///
    /// The registry's own threshold is left as is.
    pub fn trigger_housekeeping_above(&mut self, threshold: usize) -> bool {
        self.registry.trigger_housekeeping_above(&self.roots, threshold)
    }

    /// Unconditional housekeeping from the current roots.
    pub fn housekeep(&mut self) -> usize {
        self.registry.housekeep(&self.roots)
    }
}
