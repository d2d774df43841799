//! Schema migration
//!
//! Stores written by older builds are brought up to date by running the
//! applicable entries of [`MIGRATION_STEPS`] in ascending version order. The
//! [`gate`] decides whether a store has to be created, upgraded or left alone.

pub mod gate;
mod legacy;
pub mod ops;
mod steps;

#[cfg(test)]
pub(crate) mod fixtures;

use chrono::Utc;
use tracing::info;

use crate::database::core::StatementExecutor;
use crate::error::{Error, Result};

pub use gate::{GateAction, OpenOutcome};
pub use steps::MIGRATION_STEPS;

/// When a step participates in an upgrade from `old` to `new`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppliesWhen {
    /// `old < version <= new`
    Reaching,
    /// Only when upgrading from exactly this version
    UpgradingFrom(u32),
}

/// Values shared by every step of one upgrade run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationContext {
    /// Used to back-fill newly added `last_update` columns
    pub now_millis: i64,
}

impl MigrationContext {
    pub fn now() -> Self {
        Self::at(Utc::now().timestamp_millis())
    }

    pub fn at(now_millis: i64) -> Self {
        Self { now_millis }
    }
}

pub type StepAction = fn(&dyn StatementExecutor, &MigrationContext) -> Result<()>;

/// One versioned schema change.
#[derive(Clone, Copy)]
pub struct MigrationStep {
    pub version: u32,
    pub description: &'static str,
    pub applies_when: AppliesWhen,
    pub action: StepAction,
}

impl MigrationStep {
    pub fn applies_to(&self, old: u32, new: u32) -> bool {
        if new < self.version {
            return false;
        }
        match self.applies_when {
            AppliesWhen::Reaching => old < self.version,
            AppliesWhen::UpgradingFrom(from) => old == from,
        }
    }
}

impl std::fmt::Debug for MigrationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationStep")
            .field("version", &self.version)
            .field("description", &self.description)
            .field("applies_when", &self.applies_when)
            .finish()
    }
}

/// Steps from [`MIGRATION_STEPS`] that an upgrade from `old` to `new` runs.
pub fn planned_steps(old: u32, new: u32) -> Vec<&'static MigrationStep> {
    MIGRATION_STEPS
        .iter()
        .filter(|step| step.applies_to(old, new))
        .collect()
}

/// Run every applicable step of `steps` in order.
///
/// The first failure aborts the chain and is reported with the version of the
/// failing step. Returns the number of steps that ran.
pub fn run_steps(
    exec: &dyn StatementExecutor,
    steps: &[MigrationStep],
    old: u32,
    new: u32,
    ctx: &MigrationContext,
) -> Result<usize> {
    if let Some(pair) = steps.windows(2).find(|w| w[0].version > w[1].version) {
        return Err(Error::inconsistent(format!(
            "migration step v{} is listed after v{}",
            pair[1].version, pair[0].version
        )));
    }

    let mut applied = 0;
    for step in steps.iter().filter(|step| step.applies_to(old, new)) {
        info!("Applying migration v{}: {}", step.version, step.description);
        (step.action)(exec, ctx).map_err(|e| Error::MigrationStepFailed {
            version: step.version,
            source: Box::new(e),
        })?;
        applied += 1;
    }
    Ok(applied)
}

/// Run the full migration chain from `old` to `new`.
pub fn run_chain(
    exec: &dyn StatementExecutor,
    old: u32,
    new: u32,
    ctx: &MigrationContext,
) -> Result<usize> {
    run_steps(exec, MIGRATION_STEPS, old, new, ctx)
}
