//! Cooperative time budgets for the optimization passes.
//!
//! Passes call [`TimeOut::assert_have_time`] at every loop iteration and
//! recursive call and bail out with [`TimeOutError`] once the budget is spent.

use std::cell::Cell;
use std::time::{Duration, Instant};

use crate::error::TimeOutError;

pub trait TimeOut {
    fn has_remaining_time(&self) -> bool;

    fn assert_have_time(&self) -> Result<(), TimeOutError>;
}

/// Wall-clock budget, starting at construction.
#[derive(Debug, Clone)]
pub struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn new(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl TimeOut for Deadline {
    fn has_remaining_time(&self) -> bool {
        self.start.elapsed() < self.budget
    }

    fn assert_have_time(&self) -> Result<(), TimeOutError> {
        let elapsed = self.start.elapsed();
        if elapsed < self.budget {
            Ok(())
        } else {
            Err(TimeOutError::Elapsed {
                budget: self.budget,
                elapsed,
            })
        }
    }
}

/// Deterministic budget: allows a fixed number of `assert_have_time` calls.
#[derive(Debug)]
pub struct StepBudget {
    budget: usize,
    used: Cell<usize>,
}

impl StepBudget {
    pub fn new(budget: usize) -> Self {
        Self {
            budget,
            used: Cell::new(0),
        }
    }

    /// Number of checks performed so far.
    pub fn used(&self) -> usize {
        self.used.get()
    }
}

impl TimeOut for StepBudget {
    fn has_remaining_time(&self) -> bool {
        self.used.get() < self.budget
    }

    fn assert_have_time(&self) -> Result<(), TimeOutError> {
        let used = self.used.get();
        if used >= self.budget {
            return Err(TimeOutError::StepsExhausted { budget: self.budget });
        }
        self.used.set(used + 1);
        Ok(())
    }
}

/// Never runs out.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoTimeOut;

impl TimeOut for NoTimeOut {
    fn has_remaining_time(&self) -> bool {
        true
    }

    fn assert_have_time(&self) -> Result<(), TimeOutError> {
        Ok(())
    }
}
