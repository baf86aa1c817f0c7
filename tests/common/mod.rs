//! Record-based evaluation of core expressions.
//!
//! A record assigns every argument either nothing (unknown) or a string value.
//! Enumerating all records over the values of an expression (plus one value
//! that occurs nowhere) is enough to tell two expressions apart.

#![allow(dead_code)]

use std::collections::BTreeMap;

use adl_optimizer::expr::{CoreExpression, MatchExpression, Operand};
use adl_optimizer::types::{CombinedType, MatchOperator, SpecialSet};

pub type Record = BTreeMap<String, Option<String>>;

/// Value that is not used by any expression in the tests.
pub const OTHER_VALUE: &str = "zz";

fn compare(op: MatchOperator, left: &str, right: &str) -> bool {
    match op {
        MatchOperator::LessThan => left < right,
        MatchOperator::GreaterThan => left > right,
        MatchOperator::Equals => left == right,
        MatchOperator::Contains => left.contains(right),
        MatchOperator::IsUnknown => unreachable!(),
    }
}

fn lookup<'a>(record: &'a Record, arg: &str) -> Option<&'a str> {
    record.get(arg).and_then(|v| v.as_deref())
}

/// `Some(result)` if all involved arguments are known, `None` otherwise.
fn eval_match(m: &MatchExpression, record: &Record) -> Option<bool> {
    let left = lookup(record, m.arg_name())?;
    let right = match m.operand()? {
        Operand::Value(v) => v.as_str(),
        Operand::Reference(r) => lookup(record, r)?,
    };
    Some(compare(m.operator(), left, right))
}

pub fn eval(expr: &CoreExpression, record: &Record) -> bool {
    match expr {
        CoreExpression::SpecialSet(SpecialSet::All) => true,
        CoreExpression::SpecialSet(SpecialSet::None) => false,
        CoreExpression::Match(m) if m.operator() == MatchOperator::IsUnknown => lookup(record, m.arg_name()).is_none(),
        CoreExpression::Negation(m) if m.operator() == MatchOperator::IsUnknown => {
            lookup(record, m.arg_name()).is_some()
        }
        CoreExpression::Match(m) => eval_match(m, record) == Some(true),
        CoreExpression::Negation(m) => eval_match(m, record) == Some(false),
        CoreExpression::Combined(CombinedType::And, members) => members.iter().all(|m| eval(m, record)),
        CoreExpression::Combined(CombinedType::Or, members) => members.iter().any(|m| eval(m, record)),
    }
}

/// Every assignment of `None`, a used value or [`OTHER_VALUE`] to every argument.
pub fn records(exprs: &[&CoreExpression]) -> Vec<Record> {
    let mut names: Vec<String> = exprs.iter().flat_map(|e| e.arg_names()).collect();
    names.sort();
    names.dedup();

    let mut choices: Vec<Option<String>> = vec![None];
    let mut values: Vec<String> = exprs.iter().flat_map(|e| e.values()).collect();
    values.push(OTHER_VALUE.to_string());
    values.sort();
    values.dedup();
    choices.extend(values.into_iter().map(Some));

    let mut result = vec![Record::new()];
    for name in &names {
        let mut next = Vec::with_capacity(result.len() * choices.len());
        for record in &result {
            for choice in &choices {
                let mut r = record.clone();
                r.insert(name.clone(), choice.clone());
                next.push(r);
            }
        }
        result = next;
    }
    result
}

pub fn assert_equivalent(expected: &CoreExpression, actual: &CoreExpression) {
    for record in records(&[expected, actual]) {
        assert_eq!(
            eval(expected, &record),
            eval(actual, &record),
            "{} and {} differ on {:?}",
            expected,
            actual,
            record
        );
    }
}
