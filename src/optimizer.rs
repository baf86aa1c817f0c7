//! The optimization pipeline.
//!
//! For every root: registry housekeeping, implication resolution, OR-of-AND
//! normalization, overlap regrouping. The roots of the tree are only replaced
//! once every root went through every pass, so a failure (e.g. a time-out)
//! leaves the tree untouched.
//!
//! ```
//! use adl_optimizer::expr::CoreExpression;
//! use adl_optimizer::optimizer::Optimizer;
//!
//! let a1 = CoreExpression::equals("a", "1");
//! let e = (a1.clone() & CoreExpression::equals("b", "2")) | (a1 & CoreExpression::equals("b", "3"));
//!
//! let optimized = Optimizer::default().process_expression(&e).unwrap();
//! assert_eq!(optimized.to_string(), "(a = 1 AND (b = 2 OR b = 3))");
//! ```

use std::time::Duration;

use log::{debug, warn};

use crate::error::OptimizerResult;
use crate::expr::CoreExpression;
use crate::node::Node;
use crate::normalizer::{OrOfAndNormalizer, DEFAULT_CLEANUP_THRESHOLD};
use crate::registry::DEFAULT_HOUSEKEEPING_THRESHOLD;
use crate::regrouper::OverlapRegrouper;
use crate::resolver::ImplicationResolver;
use crate::timeout::{Deadline, TimeOut};
use crate::tree::EncodedExpressionTree;

#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Wall-clock budget of one `process` call.
    pub timeout: Duration,
    /// Term count above which the normalizer cleans up.
    pub cleanup_threshold: usize,
    /// Live array count above which the registry is swept before optimizing.
    pub housekeeping_threshold: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            cleanup_threshold: DEFAULT_CLEANUP_THRESHOLD,
            housekeeping_threshold: DEFAULT_HOUSEKEEPING_THRESHOLD,
        }
    }
}

impl OptimizerConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cleanup_threshold(mut self, threshold: usize) -> Self {
        self.cleanup_threshold = threshold;
        self
    }

    pub fn with_housekeeping_threshold(mut self, threshold: usize) -> Self {
        self.housekeeping_threshold = threshold;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Optimizer {
    config: OptimizerConfig,
}

impl Optimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Optimize every root of the tree within the configured time budget.
    pub fn process(&self, tree: &mut EncodedExpressionTree) -> OptimizerResult<()> {
        let deadline = Deadline::new(self.config.timeout);
        self.process_with_timeout(tree, &deadline)
    }

    /// Optimize every root of the tree with an explicit time budget.
    pub fn process_with_timeout(&self, tree: &mut EncodedExpressionTree, timeout: &dyn TimeOut) -> OptimizerResult<()> {
        debug!("process: {}", tree.stats());

        if tree.trigger_housekeeping_above(self.config.housekeeping_threshold) {
            debug!("process: after housekeeping {}", tree.stats());
        }

        let roots = tree.roots().to_vec();
        let mut optimized = Vec::with_capacity(roots.len());
        for root in roots {
            match self.optimize_node(tree, root, timeout) {
                Ok(node) => optimized.push(node),
                Err(e) => {
                    if e.is_time_out() {
                        warn!("Optimization aborted, keeping the original roots: {}", e);
                    }
                    return Err(e);
                }
            }
        }
        tree.set_roots(optimized);

        debug!("process: done, {}", tree.stats());
        Ok(())
    }

    fn optimize_node(&self, tree: &mut EncodedExpressionTree, node: Node, timeout: &dyn TimeOut) -> OptimizerResult<Node> {
        let node = ImplicationResolver::new(timeout).resolve(tree, node)?;
        let node = OrOfAndNormalizer::new(timeout)
            .with_cleanup_threshold(self.config.cleanup_threshold)
            .normalize(tree, node)?;
        let node = OverlapRegrouper::new(timeout).regroup(tree, node)?;
        Ok(node)
    }

    /// Optimize a single expression.
    pub fn process_expression(&self, expr: &CoreExpression) -> OptimizerResult<CoreExpression> {
        let mut tree = EncodedExpressionTree::from_expression(expr)?;
        self.process(&mut tree)?;
        Ok(tree.to_core_expression()?)
    }

    /// Optimize several expressions in one multi-root tree over a merged dictionary.
    ///
    /// Results are returned in input order. The time budget covers the whole batch.
    pub fn process_batch(&self, exprs: &[CoreExpression]) -> OptimizerResult<Vec<CoreExpression>> {
        let mut tree: Option<EncodedExpressionTree> = None;
        for expr in exprs {
            let single = EncodedExpressionTree::from_expression(expr)?;
            tree = Some(match tree {
                None => single,
                Some(acc) => acc.merge(&single)?,
            });
        }
        let Some(mut tree) = tree else {
            return Ok(Vec::new());
        };
        debug!("process_batch: {} expressions, {}", exprs.len(), tree.stats());
        self.process(&mut tree)?;
        Ok(tree.to_core_expressions()?)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::timeout::StepBudget;

    fn eq(arg: &str, v: &str) -> CoreExpression {
        CoreExpression::equals(arg, v)
    }

    #[test]
    fn test_config_builder() {
        let config = OptimizerConfig::default()
            .with_timeout(Duration::from_millis(10))
            .with_cleanup_threshold(7)
            .with_housekeeping_threshold(3);
        assert_eq!(config.timeout, Duration::from_millis(10));
        assert_eq!(config.cleanup_threshold, 7);
        assert_eq!(config.housekeeping_threshold, 3);

        let default = OptimizerConfig::default();
        assert_eq!(default.timeout, Duration::from_secs(5));
        assert_eq!(default.cleanup_threshold, 500);
        assert_eq!(default.housekeeping_threshold, 10_000);
    }

    #[test]
    fn test_process_expression() {
        let optimizer = Optimizer::default();
        let e = eq("a", "1") & eq("a", "1").strict_not();
        assert_eq!(optimizer.process_expression(&e).unwrap(), CoreExpression::none());

        let e = eq("a", "1") | eq("a", "1").strict_not();
        assert_eq!(optimizer.process_expression(&e).unwrap(), CoreExpression::is_not_unknown("a"));
    }

    #[test]
    fn test_process_batch() {
        let optimizer = Optimizer::default();
        let exprs = vec![
            eq("a", "1") & CoreExpression::is_not_unknown("a"),
            eq("b", "2") | CoreExpression::is_not_unknown("b"),
            CoreExpression::is_unknown("c") & eq("c", "3"),
        ];
        let res = optimizer.process_batch(&exprs).unwrap();
        assert_eq!(
            res,
            vec![eq("a", "1"), CoreExpression::is_not_unknown("b"), CoreExpression::none()]
        );
        assert!(optimizer.process_batch(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_time_out_keeps_tree() {
        let e = (eq("a", "1") & eq("b", "2")) | (eq("a", "1") & eq("b", "3"));
        let mut tree = EncodedExpressionTree::from_expression(&e).unwrap();
        let before = tree.roots().to_vec();
        let err = Optimizer::default()
            .process_with_timeout(&mut tree, &StepBudget::new(3))
            .unwrap_err();
        assert!(err.is_time_out());
        assert_eq!(tree.roots(), before.as_slice());
    }

    #[test]
    fn test_housekeeping_before_passes() {
        let e = (eq("a", "1") & eq("b", "2")) | eq("c", "3");
        let mut tree = EncodedExpressionTree::from_expression(&e).unwrap();
        let b = tree.create_node(&eq("b", "2")).unwrap();
        let c = tree.create_node(&eq("c", "3")).unwrap();
        tree.create_combined_node(crate::types::CombinedType::And, &[b, c]).unwrap();
        assert_eq!(tree.registry().len(), 3);

        let optimizer = Optimizer::new(OptimizerConfig::default().with_housekeeping_threshold(1));
        optimizer.process(&mut tree).unwrap();
        assert_eq!(tree.to_core_expression().unwrap().to_string(), "(c = 3 OR (a = 1 AND b = 2))");
    }

    #[test]
    fn test_tree_threshold_untouched() {
        let e = (eq("a", "1") & eq("b", "2")) | (eq("a", "1") & eq("b", "3"));
        let mut tree = EncodedExpressionTree::from_expression(&e).unwrap();
        tree.set_housekeeping_threshold(42);

        let optimizer = Optimizer::new(OptimizerConfig::default().with_housekeeping_threshold(1));
        let err = optimizer
            .process_with_timeout(&mut tree, &StepBudget::new(2))
            .unwrap_err();
        assert!(err.is_time_out());
        assert_eq!(tree.registry().housekeeping_threshold(), 42);

        optimizer.process(&mut tree).unwrap();
        assert_eq!(tree.registry().housekeeping_threshold(), 42);
    }
}
