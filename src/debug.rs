//! Debug utilities for inspecting encoded trees.
//!
//! These are primarily useful in tests, in demos and when reading `debug!` traces.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use crate::error::CodecResult;
use crate::node::Node;
use crate::tree::EncodedExpressionTree;
use crate::types::NodeType;

/// Detailed information about a single encoded node.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub node: Node,
    pub node_type: NodeType,
    /// Decoded leaf, or the member list of a combined node.
    pub text: String,
    /// Members of a combined node, empty for leaves.
    pub members: Vec<Node>,
    pub depth: usize,
}

impl fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node_type {
            NodeType::Leaf => write!(f, "{} := {}", self.node, self.text),
            _ => write!(f, "{} := {} (depth={})", self.node, self.text, self.depth),
        }
    }
}

/// All nodes reachable from a root, in BFS order.
#[derive(Debug, Clone)]
pub struct TreeDump {
    pub root: Node,
    pub nodes: Vec<NodeInfo>,
}

impl fmt::Display for TreeDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tree (root = {}, nodes = {}):", self.root, self.nodes.len())?;
        for info in &self.nodes {
            writeln!(f, "  {}", info)?;
        }
        Ok(())
    }
}

impl EncodedExpressionTree {
    /// Human readable rendering of one node, without descending into members.
    ///
    /// Leaves are decoded (`a = 1`), combined nodes list their member codes
    /// (`AND(#0=$0, |3)`). Nodes that cannot be resolved are shown with the error.
    pub fn format_node(&self, node: Node) -> String {
        if node.is_invalid() || node.is_special_set() {
            return node.to_string();
        }
        match node.combined_type() {
            Some(ty) => match self.member_array(node) {
                Ok(members) => {
                    let members: Vec<String> = members.iter().map(|m| m.to_string()).collect();
                    format!("{}({})", ty, members.join(", "))
                }
                Err(e) => format!("<{}: {}>", node, e),
            },
            None => match self.codec().decode(node) {
                Ok(expr) => expr.to_string(),
                Err(e) => format!("<{}: {}>", node, e),
            },
        }
    }

    pub fn node_info(&self, node: Node) -> CodecResult<NodeInfo> {
        let node_type = self.codec().get_node_type(node)?;
        let members = if node.is_combined() {
            self.member_array(node)?.to_vec()
        } else {
            Vec::new()
        };
        Ok(NodeInfo {
            node,
            node_type,
            text: self.format_node(node),
            members,
            depth: self.nesting_depth_of(node)?,
        })
    }

    pub fn debug_tree(&self, root: Node) -> CodecResult<TreeDump> {
        let mut nodes = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([root]);

        while let Some(node) = queue.pop_front() {
            if !visited.insert(node) {
                continue;
            }
            let info = self.node_info(node)?;
            queue.extend(info.members.iter().copied());
            nodes.push(info);
        }

        Ok(TreeDump { root, nodes })
    }

    /// Dump of every root.
    pub fn debug_string(&self) -> CodecResult<String> {
        let mut result = format!("{}\n", self.stats());
        for &root in self.roots() {
            result.push_str(&self.debug_tree(root)?.to_string());
        }
        Ok(result)
    }
}
