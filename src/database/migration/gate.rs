//! Version gate
//!
//! Compares the version recorded in a store with the version this build
//! targets and creates, upgrades or leaves the store alone accordingly.

use serde::Serialize;
use tracing::debug;

use crate::database::core::{SchemaManager, StatementExecutor, CURRENT_SCHEMA_VERSION};
use crate::database::migration::{run_chain, MigrationContext};
use crate::error::{Error, Result};

/// What opening a store at a given version has to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GateAction {
    Create,
    Upgrade { from: u32, to: u32 },
    Nothing,
}

/// What opening a store actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OpenOutcome {
    Created { version: u32 },
    Upgraded { from: u32, to: u32, steps: usize },
    Unchanged { version: u32 },
}

impl OpenOutcome {
    pub fn version(&self) -> u32 {
        match self {
            OpenOutcome::Created { version } | OpenOutcome::Unchanged { version } => *version,
            OpenOutcome::Upgraded { to, .. } => *to,
        }
    }
}

/// Decide what to do with a store recorded at `stored` (`None` for a new
/// store) when this build targets `target`. Downgrades are refused, and so
/// are targets past the newest schema this build defines.
pub fn decide(stored: Option<u32>, target: u32) -> Result<GateAction> {
    if target > CURRENT_SCHEMA_VERSION {
        return Err(Error::UnsupportedTarget {
            target,
            supported: CURRENT_SCHEMA_VERSION,
        });
    }
    match stored {
        None => Ok(GateAction::Create),
        Some(v) if v == target => Ok(GateAction::Nothing),
        Some(v) if v < target => Ok(GateAction::Upgrade {
            from: v,
            to: target,
        }),
        Some(v) => Err(Error::UnsupportedDowngrade { stored: v, target }),
    }
}

/// The stored version as the gate sees it: 0 is a store nothing was written to.
pub fn stored_version(exec: &dyn StatementExecutor) -> Result<Option<u32>> {
    let version = exec.schema_version()?;
    Ok((version != 0).then_some(version))
}

/// Bring the store behind `exec` to `target`.
///
/// Creation or the upgrade chain run inside a single transaction whose last
/// statement records `target`, so a failure anywhere leaves the store exactly
/// as it was, version included. A store brought to the current version must
/// hold every registry table and view before the transaction commits.
pub fn apply(
    exec: &dyn StatementExecutor,
    target: u32,
    ctx: &MigrationContext,
) -> Result<OpenOutcome> {
    let action = decide(stored_version(exec)?, target)?;
    debug!("gate action for target v{}: {:?}", target, action);

    let outcome = match action {
        GateAction::Nothing => return Ok(OpenOutcome::Unchanged { version: target }),
        GateAction::Create => OpenOutcome::Created { version: target },
        GateAction::Upgrade { from, to } => OpenOutcome::Upgraded { from, to, steps: 0 },
    };

    let mut steps = 0;
    exec.transaction(&mut |tx| {
        let manager = SchemaManager::new(tx);
        match action {
            GateAction::Create => manager.initialize()?,
            GateAction::Upgrade { from, to } => steps = run_chain(tx, from, to, ctx)?,
            GateAction::Nothing => {}
        }

        let missing = if target == CURRENT_SCHEMA_VERSION {
            manager.missing_objects()?
        } else {
            Vec::new()
        };
        if !missing.is_empty() {
            return Err(Error::inconsistent(format!(
                "schema v{} is missing {}",
                target,
                missing.join(", ")
            )));
        }
        tx.set_schema_version(target)
    })?;

    Ok(match outcome {
        OpenOutcome::Upgraded { from, to, .. } => OpenOutcome::Upgraded { from, to, steps },
        other => other,
    })
}
