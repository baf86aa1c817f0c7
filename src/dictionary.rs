//! Bidirectional name/value dictionary backing the node encoding.

use std::collections::HashMap;

use log::debug;

use crate::error::{CodecError, CodecResult};
use crate::expr::CoreExpression;
use crate::node::{MAX_NAMES, MAX_VALUES};

/// Immutable mapping between argument names / values and dense indices.
///
/// Codes are assigned in insertion order. Merging keeps every existing code
/// and appends the names and values only known to the other dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary {
    names: Vec<String>,
    name_index: HashMap<String, u32>,
    values: Vec<String>,
    value_index: HashMap<String, u32>,
}

impl Dictionary {
    pub fn new<N, V>(names: N, values: V) -> CodecResult<Self>
    where
        N: IntoIterator,
        N::Item: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        let mut dict = Dictionary::default();
        for name in names {
            dict.add_name(name.into())?;
        }
        for value in values {
            dict.add_value(value.into())?;
        }
        Ok(dict)
    }

    /// Dictionary covering every name and value of the given expression.
    pub fn from_expression(expr: &CoreExpression) -> CodecResult<Self> {
        Self::new(expr.arg_names(), expr.values())
    }

    /// Dictionary covering every name and value of all given expressions.
    pub fn from_expressions<'a>(exprs: impl IntoIterator<Item = &'a CoreExpression>) -> CodecResult<Self> {
        let mut dict = Dictionary::default();
        for expr in exprs {
            for name in expr.arg_names() {
                dict.add_name(name)?;
            }
            for value in expr.values() {
                dict.add_value(value)?;
            }
        }
        Ok(dict)
    }

    fn add_name(&mut self, name: String) -> CodecResult<()> {
        if self.name_index.contains_key(&name) {
            return Ok(());
        }
        if self.names.len() >= MAX_NAMES {
            return Err(CodecError::DictionaryCapacityExceeded {
                kind: "names",
                max: MAX_NAMES,
            });
        }
        self.name_index.insert(name.clone(), self.names.len() as u32);
        self.names.push(name);
        Ok(())
    }

    fn add_value(&mut self, value: String) -> CodecResult<()> {
        if self.value_index.contains_key(&value) {
            return Ok(());
        }
        if self.values.len() >= MAX_VALUES {
            return Err(CodecError::DictionaryCapacityExceeded {
                kind: "values",
                max: MAX_VALUES,
            });
        }
        self.value_index.insert(value.clone(), self.values.len() as u32);
        self.values.push(value);
        Ok(())
    }

    pub fn num_names(&self) -> usize {
        self.names.len()
    }

    pub fn num_values(&self) -> usize {
        self.values.len()
    }

    pub fn name_index(&self, name: &str) -> Option<u32> {
        self.name_index.get(name).copied()
    }

    pub fn value_index(&self, value: &str) -> Option<u32> {
        self.value_index.get(value).copied()
    }

    pub fn name(&self, index: u32) -> Option<&str> {
        self.names.get(index as usize).map(String::as_str)
    }

    pub fn value(&self, index: u32) -> Option<&str> {
        self.values.get(index as usize).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// True if every code of `other` means the same in `self`.
    pub fn is_compatible_with(&self, other: &Dictionary) -> bool {
        other.names.len() <= self.names.len()
            && other.values.len() <= self.values.len()
            && other.names.iter().zip(&self.names).all(|(a, b)| a == b)
            && other.values.iter().zip(&self.values).all(|(a, b)| a == b)
    }

    /// Union of both dictionaries, compatible with `self`.
    pub fn merge(&self, other: &Dictionary) -> CodecResult<Dictionary> {
        if self.is_compatible_with(other) {
            return Ok(self.clone());
        }
        let mut merged = self.clone();
        for name in &other.names {
            merged.add_name(name.clone())?;
        }
        for value in &other.values {
            merged.add_value(value.clone())?;
        }
        debug!(
            "merged dictionaries: names {} + {} -> {}, values {} + {} -> {}",
            self.num_names(),
            other.num_names(),
            merged.num_names(),
            self.num_values(),
            other.num_values(),
            merged.num_values()
        );
        Ok(merged)
    }
}
