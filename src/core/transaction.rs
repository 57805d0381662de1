//! Nested transactions emulated over a flat transaction plus savepoints
//!
//! Most SQL engines expose exactly one open transaction per connection,
//! with savepoints as the only way to mark intermediate rollback points.
//! This module makes an arbitrary depth of begin/commit/rollback calls
//! behave like nested transactions on top of that: one savepoint is pushed
//! per `begin`, and the real backend commit/rollback happens only when the
//! stack drains back to depth zero.
//!
//! The asymmetry between the two finalize paths matters. Releasing a
//! savepoint keeps the writes made since it, so committing the last nested
//! level must still commit the root transaction before anything persists.
//! Rolling back to the first savepoint would undo the same writes a full
//! rollback does (it is created immediately after autocommit is disabled),
//! so the draining rollback issues a single backend rollback, which also
//! closes the root transaction.

use super::backend::{BackendConnection, SavepointToken};
use super::error::{DatabaseError, Result};

/// Ordered stack of savepoint tokens, most recent last
///
/// Invariant: a non-empty stack implies the backend connection is in
/// manual-commit mode. Tokens never outlive the connection that issued
/// them; the owner must [`clear`](Self::clear) the stack whenever the
/// connection goes away.
#[derive(Debug, Default)]
pub struct SavepointStack {
    tokens: Vec<SavepointToken>,
}

impl SavepointStack {
    /// Create an empty stack
    pub fn new() -> Self {
        Self { tokens: Vec::new() }
    }

    /// Current nesting depth
    pub fn depth(&self) -> usize {
        self.tokens.len()
    }

    /// True when no transaction level is open
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Drop all tokens without touching the backend
    pub fn clear(&mut self) {
        self.tokens.clear();
    }

    /// Open one more transaction level
    ///
    /// At depth zero this first switches the connection into manual-commit
    /// mode; a savepoint is created and pushed at every depth.
    pub fn begin(&mut self, conn: &mut dyn BackendConnection) -> Result<()> {
        if self.tokens.is_empty() {
            conn.set_autocommit(false).map_err(|e| {
                DatabaseError::transaction_with_source("failed to disable autocommit", e)
            })?;
        }
        let token = conn
            .create_savepoint()
            .map_err(|e| DatabaseError::transaction_with_source("failed to create savepoint", e))?;
        self.tokens.push(token);
        tracing::debug!(depth = self.tokens.len(), "transaction level opened");
        Ok(())
    }

    /// Finalize the innermost transaction level
    ///
    /// Releasing a savepoint merges the innermost level into its parent;
    /// when that was the last level, the root transaction is committed in
    /// the same call, since a savepoint release alone does not persist
    /// anything. With no level open at all, this commits whatever flat
    /// transaction the backend has in flight.
    ///
    /// A backend error mid-sequence leaves the stack and the autocommit
    /// flag in a possibly inconsistent state; callers should discard the
    /// connection rather than continue.
    pub fn commit(&mut self, conn: &mut dyn BackendConnection) -> Result<()> {
        if let Some(token) = self.tokens.pop() {
            conn.release_savepoint(&token).map_err(|e| {
                DatabaseError::transaction_with_source("failed to release savepoint", e)
            })?;
            if !self.tokens.is_empty() {
                tracing::debug!(depth = self.tokens.len(), "transaction level merged");
                return Ok(());
            }
        }
        conn.commit()
            .map_err(|e| DatabaseError::transaction_with_source("commit failed", e))?;
        conn.set_autocommit(true).map_err(|e| {
            DatabaseError::transaction_with_source("failed to restore autocommit", e)
        })?;
        tracing::debug!("root transaction committed");
        Ok(())
    }

    /// Undo the innermost transaction level
    ///
    /// Inner levels roll back to their savepoint, preserving writes from
    /// the levels below. The draining pop skips the savepoint rollback and
    /// issues one full backend rollback instead: the first savepoint marks
    /// the very start of the root transaction, so the undo set is the same
    /// and the root transaction has to be closed either way.
    ///
    /// Same failure caveat as [`commit`](Self::commit).
    pub fn rollback(&mut self, conn: &mut dyn BackendConnection) -> Result<()> {
        if let Some(token) = self.tokens.pop() {
            if !self.tokens.is_empty() {
                conn.rollback_to_savepoint(&token).map_err(|e| {
                    DatabaseError::transaction_with_source("failed to roll back to savepoint", e)
                })?;
                tracing::debug!(depth = self.tokens.len(), "transaction level undone");
                return Ok(());
            }
        }
        conn.rollback()
            .map_err(|e| DatabaseError::transaction_with_source("rollback failed", e))?;
        conn.set_autocommit(true).map_err(|e| {
            DatabaseError::transaction_with_source("failed to restore autocommit", e)
        })?;
        tracing::debug!("root transaction rolled back");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backend::recording::{
        new_fail_switch, new_log, CallLog, RecordingConnection,
    };

    fn harness() -> (SavepointStack, RecordingConnection, CallLog) {
        let log = new_log();
        let conn = RecordingConnection::new(log.clone(), new_fail_switch());
        (SavepointStack::new(), conn, log)
    }

    fn calls(log: &CallLog) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn test_first_begin_disables_autocommit() {
        let (mut stack, mut conn, log) = harness();
        stack.begin(&mut conn).unwrap();

        assert_eq!(calls(&log), vec!["autocommit:off", "savepoint:sp_1"]);
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_nested_begin_only_adds_a_savepoint() {
        let (mut stack, mut conn, log) = harness();
        stack.begin(&mut conn).unwrap();
        stack.begin(&mut conn).unwrap();

        assert_eq!(
            calls(&log),
            vec!["autocommit:off", "savepoint:sp_1", "savepoint:sp_2"]
        );
        assert_eq!(stack.depth(), 2);
    }

    #[test]
    fn test_commit_of_last_level_commits_the_root() {
        // a savepoint release does not persist anything on its own
        let (mut stack, mut conn, log) = harness();
        stack.begin(&mut conn).unwrap();
        stack.commit(&mut conn).unwrap();

        assert_eq!(
            calls(&log),
            vec![
                "autocommit:off",
                "savepoint:sp_1",
                "release:sp_1",
                "commit",
                "autocommit:on"
            ]
        );
        assert!(stack.is_empty());
    }

    #[test]
    fn test_inner_commit_only_releases_its_savepoint() {
        let (mut stack, mut conn, log) = harness();
        stack.begin(&mut conn).unwrap();
        stack.begin(&mut conn).unwrap();
        stack.commit(&mut conn).unwrap();

        assert_eq!(
            calls(&log),
            vec![
                "autocommit:off",
                "savepoint:sp_1",
                "savepoint:sp_2",
                "release:sp_2"
            ]
        );
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_full_nested_commit_sequence() {
        let (mut stack, mut conn, log) = harness();
        stack.begin(&mut conn).unwrap();
        stack.begin(&mut conn).unwrap();
        stack.commit(&mut conn).unwrap();
        stack.commit(&mut conn).unwrap();

        assert_eq!(
            calls(&log),
            vec![
                "autocommit:off",
                "savepoint:sp_1",
                "savepoint:sp_2",
                "release:sp_2",
                "release:sp_1",
                "commit",
                "autocommit:on"
            ]
        );
        assert!(stack.is_empty());
    }

    #[test]
    fn test_rollback_of_last_level_is_one_backend_rollback() {
        // the chosen draining semantics: no rollback-to-savepoint followed
        // by a second full rollback; one backend rollback undoes the same
        // writes and closes the root transaction
        let (mut stack, mut conn, log) = harness();
        stack.begin(&mut conn).unwrap();
        stack.rollback(&mut conn).unwrap();

        assert_eq!(
            calls(&log),
            vec![
                "autocommit:off",
                "savepoint:sp_1",
                "rollback",
                "autocommit:on"
            ]
        );
        assert!(stack.is_empty());
    }

    #[test]
    fn test_inner_rollback_targets_its_savepoint() {
        let (mut stack, mut conn, log) = harness();
        stack.begin(&mut conn).unwrap();
        stack.begin(&mut conn).unwrap();
        stack.rollback(&mut conn).unwrap();

        assert_eq!(
            calls(&log),
            vec![
                "autocommit:off",
                "savepoint:sp_1",
                "savepoint:sp_2",
                "rollback_to:sp_2"
            ]
        );
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_inner_commit_then_outer_rollback() {
        // committing the inner level merges it into the root; rolling the
        // root back then discards everything
        let (mut stack, mut conn, log) = harness();
        stack.begin(&mut conn).unwrap();
        stack.begin(&mut conn).unwrap();
        stack.commit(&mut conn).unwrap();
        stack.rollback(&mut conn).unwrap();

        assert_eq!(
            calls(&log),
            vec![
                "autocommit:off",
                "savepoint:sp_1",
                "savepoint:sp_2",
                "release:sp_2",
                "rollback",
                "autocommit:on"
            ]
        );
        assert!(stack.is_empty());
    }

    #[test]
    fn test_finalize_with_empty_stack_hits_the_backend_directly() {
        let (mut stack, mut conn, log) = harness();
        stack.commit(&mut conn).unwrap();
        stack.rollback(&mut conn).unwrap();

        assert_eq!(
            calls(&log),
            vec!["commit", "autocommit:on", "rollback", "autocommit:on"]
        );
    }

    #[test]
    fn test_depth_is_unbounded() {
        let (mut stack, mut conn, _log) = harness();
        for _ in 0..64 {
            stack.begin(&mut conn).unwrap();
        }
        assert_eq!(stack.depth(), 64);
        for _ in 0..64 {
            stack.rollback(&mut conn).unwrap();
        }
        assert!(stack.is_empty());
    }

    #[test]
    fn test_backend_failure_surfaces_as_transaction_error() {
        let log = new_log();
        let fail_on = new_fail_switch();
        let mut conn = RecordingConnection::new(log, fail_on.clone());
        let mut stack = SavepointStack::new();

        stack.begin(&mut conn).unwrap();
        *fail_on.lock().unwrap() = Some("release_savepoint".to_string());

        let err = stack.commit(&mut conn).unwrap_err();
        assert!(matches!(err, DatabaseError::Transaction { .. }));
        assert!(err.cause().is_some());
        // the popped token is gone; no automatic recovery is attempted
        assert!(stack.is_empty());
    }
}
