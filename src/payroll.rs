//! Salary bonuses chosen per employee through a [`BonusPolicy`].
//!
use std::fmt::{Display, Formatter};

use thiserror::Error;
use tracing::debug;

/// How much bonus an employee earns relative to their salary.
pub trait BonusPolicy {
    fn name(&self) -> &'static str;

    /// Fraction of the salary paid as bonus.
    fn rate(&self) -> f64;

    fn bonus(&self, salary: f64) -> f64 {
        salary * self.rate()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct StandardPolicy;

impl BonusPolicy for StandardPolicy {
    fn name(&self) -> &'static str {
        "standard"
    }

    fn rate(&self) -> f64 {
        0.20
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ManagerPolicy;

impl BonusPolicy for ManagerPolicy {
    fn name(&self) -> &'static str {
        "manager"
    }

    fn rate(&self) -> f64 {
        0.35
    }
}

/// Selector for the built-in policies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum PolicyKind {
    #[default]
    Standard,
    Manager,
}

impl PolicyKind {
    pub fn policy(self) -> &'static dyn BonusPolicy {
        match self {
            PolicyKind::Standard => &StandardPolicy,
            PolicyKind::Manager => &ManagerPolicy,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PayrollError {
    #[error("raise percentage must not be negative (got {0})")]
    NegativeRaise(f64),
}

#[derive(Clone, Debug)]
pub struct Employee {
    pub name: String,
    salary: f64,
    pub policy: PolicyKind,
}

impl Employee {
    pub fn new(name: impl Into<String>, salary: f64, policy: PolicyKind) -> Self {
        Self {
            name: name.into(),
            salary,
            policy,
        }
    }

    pub fn salary(&self) -> f64 {
        self.salary
    }

    /// Raise the salary by `percent` percent.
    pub fn raise_salary(&mut self, percent: f64) -> Result<(), PayrollError> {
        if percent < 0.0 {
            return Err(PayrollError::NegativeRaise(percent));
        }
        self.salary *= 1.0 + percent / 100.0;
        debug!(employee = %self.name, percent, salary = self.salary, "salary raised");
        Ok(())
    }

    pub fn bonus(&self) -> f64 {
        self.policy.policy().bonus(self.salary)
    }
}

impl Display for Employee {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: salary {:.2}, {} bonus {:.2}",
            self.name,
            self.salary,
            self.policy.policy().name(),
            self.bonus()
        )
    }
}
