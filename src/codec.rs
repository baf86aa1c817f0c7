//! Translation between leaf expressions and encoded [`Node`]s.
//!
//! A [`Codec`] owns an immutable [`Dictionary`] and two leaf caches. Leaf codes
//! are pure bit arithmetic on top of dictionary indices, see [`crate::node`]
//! for the layout.

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::cache::LeafCache;
use crate::dictionary::Dictionary;
use crate::error::{CodecError, CodecResult};
use crate::expr::{CoreExpression, MatchExpression, Operand};
use crate::node::{Node, MAX_COMBINED_ID};
use crate::types::{CombinedType, MatchOperator, NodeType, SpecialSet};

#[derive(Debug, Clone)]
pub struct Codec {
    dictionary: Rc<Dictionary>,
    encode_cache: RefCell<LeafCache<CoreExpression, Node>>,
    decode_cache: RefCell<LeafCache<Node, CoreExpression>>,
}

impl Codec {
    pub fn new(dictionary: Dictionary) -> Self {
        Self {
            dictionary: Rc::new(dictionary),
            encode_cache: RefCell::new(LeafCache::default()),
            decode_cache: RefCell::new(LeafCache::default()),
        }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Number of (hits, misses) of the encode and decode caches together.
    pub fn cache_stats(&self) -> (usize, usize) {
        let enc = self.encode_cache.borrow();
        let dec = self.decode_cache.borrow();
        (enc.hits() + dec.hits(), enc.misses() + dec.misses())
    }

    /// Encode a leaf, a negated leaf or a special set.
    pub fn encode(&self, expr: &CoreExpression) -> CodecResult<Node> {
        match expr {
            CoreExpression::SpecialSet(SpecialSet::All) => Ok(Node::ALL),
            CoreExpression::SpecialSet(SpecialSet::None) => Ok(Node::NONE),
            CoreExpression::Combined(..) => Err(CodecError::NotALeafExpression),
            CoreExpression::Match(m) | CoreExpression::Negation(m) => {
                if let Some(node) = self.encode_cache.borrow_mut().get(expr) {
                    return Ok(node);
                }
                let negated = matches!(expr, CoreExpression::Negation(_));
                let node = self.encode_match(m, negated)?;
                self.encode_cache.borrow_mut().insert(expr.clone(), node);
                self.decode_cache.borrow_mut().insert(node, expr.clone());
                Ok(node)
            }
        }
    }

    fn encode_match(&self, m: &MatchExpression, negated: bool) -> CodecResult<Node> {
        if !m.is_well_formed() {
            let reason = match m.operator() {
                MatchOperator::IsUnknown => "IS UNKNOWN takes no operand",
                _ => "operand missing",
            };
            return Err(CodecError::MalformedLeaf {
                arg_name: m.arg_name().to_string(),
                reason: reason.to_string(),
            });
        }
        let arg = self.name_index(m.arg_name())?;
        let (reference, value) = match m.operand() {
            None => (false, 0),
            Some(Operand::Value(v)) => {
                let index = self
                    .dictionary
                    .value_index(v)
                    .ok_or_else(|| CodecError::UnknownValue { value: v.clone() })?;
                (false, index)
            }
            Some(Operand::Reference(r)) => (true, self.name_index(r)?),
        };
        Ok(Node::leaf(negated, m.operator(), reference, arg, value))
    }

    fn name_index(&self, name: &str) -> CodecResult<u32> {
        self.dictionary
            .name_index(name)
            .ok_or_else(|| CodecError::UnknownArgName { name: name.to_string() })
    }

    /// Decode a leaf or special set back into an expression.
    pub fn decode(&self, node: Node) -> CodecResult<CoreExpression> {
        if node == Node::ALL {
            return Ok(CoreExpression::all());
        }
        if node == Node::NONE {
            return Ok(CoreExpression::none());
        }
        let operator = self.check_leaf(node)?;
        if let Some(expr) = self.decode_cache.borrow_mut().get(&node) {
            return Ok(expr);
        }
        let arg_name = self.arg_name_of(node.arg_idx())?.to_string();
        let operand = self.operand_of(node, operator)?;
        let m = MatchExpression::new(arg_name, operator, operand);
        let expr = if node.negation_bit() {
            CoreExpression::Negation(m)
        } else {
            CoreExpression::Match(m)
        };
        self.decode_cache.borrow_mut().insert(node, expr.clone());
        self.encode_cache.borrow_mut().insert(expr.clone(), node);
        Ok(expr)
    }

    /// Fails unless `node` is a proper leaf; returns its operator.
    fn check_leaf(&self, node: Node) -> CodecResult<MatchOperator> {
        if node.is_invalid() {
            return Err(CodecError::InvalidNode);
        }
        if node.is_combined() {
            return Err(CodecError::CombinedNotAllowed { node });
        }
        if node.is_special_set() {
            return Err(CodecError::SpecialSetNotAllowed { node });
        }
        node.operator().ok_or(CodecError::UnknownOperatorTag { node })
    }

    fn arg_name_of(&self, index: u32) -> CodecResult<&str> {
        self.dictionary
            .name(index)
            .ok_or(CodecError::UnknownNameIndex { index })
    }

    fn operand_of(&self, node: Node, operator: MatchOperator) -> CodecResult<Option<Operand>> {
        if operator == MatchOperator::IsUnknown {
            return Ok(None);
        }
        let index = node.value_idx();
        if node.reference_bit() {
            Ok(Some(Operand::Reference(self.arg_name_of(index)?.to_string())))
        } else {
            let value = self
                .dictionary
                .value(index)
                .ok_or(CodecError::UnknownValueIndex { index })?;
            Ok(Some(Operand::Value(value.to_string())))
        }
    }

    /// Negation of a leaf or sentinel (`ALL` <-> `NONE`).
    pub fn negate(&self, node: Node) -> CodecResult<Node> {
        if node.is_invalid() {
            return Err(CodecError::InvalidNode);
        }
        if node.is_combined() {
            return Err(CodecError::CombinedNotAllowed { node });
        }
        Ok(node.flip())
    }

    /// True for a negated leaf.
    pub fn is_negation(&self, node: Node) -> bool {
        node.is_leaf() && node.negation_bit()
    }

    pub fn is_combined_expression_id(&self, node: Node) -> bool {
        node.is_combined()
    }

    pub fn is_special_set(&self, node: Node) -> bool {
        node.is_special_set()
    }

    pub fn is_reference_match(&self, node: Node) -> bool {
        node.is_reference_leaf()
    }

    pub fn get_node_type(&self, node: Node) -> CodecResult<NodeType> {
        if node.is_invalid() {
            return Err(CodecError::InvalidNode);
        }
        Ok(match node.combined_type() {
            Some(ty) => ty.into(),
            None => NodeType::Leaf,
        })
    }

    pub fn get_arg_name(&self, node: Node) -> CodecResult<&str> {
        self.check_leaf(node)?;
        self.arg_name_of(node.arg_idx())
    }

    pub fn get_operator(&self, node: Node) -> CodecResult<MatchOperator> {
        self.check_leaf(node)
    }

    /// The literal value, `None` for `IS UNKNOWN` and for reference matches.
    pub fn get_value(&self, node: Node) -> CodecResult<Option<&str>> {
        let operator = self.check_leaf(node)?;
        if operator == MatchOperator::IsUnknown || node.reference_bit() {
            return Ok(None);
        }
        let index = node.value_idx();
        self.dictionary
            .value(index)
            .map(Some)
            .ok_or(CodecError::UnknownValueIndex { index })
    }

    pub fn get_operand(&self, node: Node) -> CodecResult<Option<Operand>> {
        let operator = self.check_leaf(node)?;
        self.operand_of(node, operator)
    }

    /// `arg IS UNKNOWN` for the argument of the given leaf.
    pub fn create_is_unknown_for_arg_name(&self, node: Node) -> CodecResult<Node> {
        self.check_leaf(node)?;
        Ok(Node::is_unknown_of(node.arg_idx()))
    }

    /// `ref IS UNKNOWN` for the referenced argument of the given reference match.
    pub fn create_is_unknown_for_referenced_arg_name(&self, node: Node) -> CodecResult<Node> {
        let operator = self.check_leaf(node)?;
        if operator == MatchOperator::IsUnknown || !node.reference_bit() {
            return Err(CodecError::NotAReference { node });
        }
        Ok(Node::is_unknown_of(node.value_idx()))
    }

    pub fn encode_combined_expression_id(&self, id: u32, ty: CombinedType) -> CodecResult<Node> {
        if id > MAX_COMBINED_ID {
            return Err(CodecError::IdOutOfRange {
                id,
                max: MAX_COMBINED_ID,
            });
        }
        Ok(Node::combined(id, ty))
    }

    pub fn decode_combined_expression_id(&self, node: Node) -> CodecResult<u32> {
        if node.is_invalid() {
            return Err(CodecError::InvalidNode);
        }
        if !node.is_combined() {
            return Err(CodecError::NotCombined { node });
        }
        Ok(node.combined_id())
    }

    /// Codec over the union of both dictionaries.
    ///
    /// Nodes encoded by `self` keep their meaning under the merged codec;
    /// nodes encoded by `other` must be re-encoded.
    pub fn merge(&self, other: &Codec) -> CodecResult<Codec> {
        if self.dictionary.is_compatible_with(&other.dictionary) {
            return Ok(self.clone());
        }
        let merged = self.dictionary.merge(&other.dictionary)?;
        debug!(
            "merge codec: {} names, {} values",
            merged.num_names(),
            merged.num_values()
        );
        Ok(Self {
            dictionary: Rc::new(merged),
            encode_cache: self.encode_cache.clone(),
            decode_cache: self.decode_cache.clone(),
        })
    }
}
