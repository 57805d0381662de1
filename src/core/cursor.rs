//! Result cursor over a forward-only row stream
//!
//! The cursor buffers a one-row lookahead so that checking for emptiness
//! and then iterating is safe on the same cursor instance: the emptiness
//! probe fetches the first row into the buffer instead of consuming it.

use super::backend::RowSource;
use super::error::{DatabaseError, Result};
use super::value::Row;

/// Sequential, forward-only view of a query result
///
/// Rows can be pulled one at a time with [`next_row`](Self::next_row) or
/// visited in bulk with [`for_each`](Self::for_each). Calling
/// [`is_empty`](Self::is_empty) first does not skip the first row.
pub struct ResultCursor {
    source: Box<dyn RowSource>,
    lookahead: Option<Row>,
    exhausted: bool,
}

impl ResultCursor {
    pub(crate) fn new(source: Box<dyn RowSource>) -> Self {
        Self {
            source,
            lookahead: None,
            exhausted: false,
        }
    }

    /// Fetch the next row, advancing the cursor
    ///
    /// Returns `Ok(None)` once the result set is exhausted. Backend
    /// failures surface as [`DatabaseError::Row`] with the driver cause
    /// attached.
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        if let Some(row) = self.lookahead.take() {
            return Ok(Some(row));
        }
        if self.exhausted {
            return Ok(None);
        }
        match self.source.next_row() {
            Ok(Some(row)) => Ok(Some(row)),
            Ok(None) => {
                self.exhausted = true;
                Ok(None)
            }
            Err(e) => Err(DatabaseError::row_with_source("row fetch failed", e)),
        }
    }

    /// Check whether the result set has any rows
    ///
    /// Fail-safe probe: a backend error during the check is reported as
    /// "empty" rather than surfaced. The probed row is buffered, so a
    /// subsequent [`for_each`](Self::for_each) still sees it.
    pub fn is_empty(&mut self) -> bool {
        if self.lookahead.is_some() {
            return false;
        }
        if self.exhausted {
            return true;
        }
        match self.source.next_row() {
            Ok(Some(row)) => {
                self.lookahead = Some(row);
                false
            }
            Ok(None) => {
                self.exhausted = true;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "emptiness probe failed, reporting empty");
                self.exhausted = true;
                true
            }
        }
    }

    /// Visit every remaining row in order
    pub fn for_each<F>(mut self, mut visitor: F) -> Result<()>
    where
        F: FnMut(&Row),
    {
        while let Some(row) = self.next_row()? {
            visitor(&row);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backend::{BackendResult, RowSource};
    use crate::core::value::Value;

    struct StubRows {
        rows: std::vec::IntoIter<Row>,
        fail_after: Option<usize>,
        served: usize,
    }

    impl StubRows {
        fn new(count: usize) -> Self {
            let rows: Vec<Row> = (0..count)
                .map(|i| {
                    let mut row = Row::new();
                    row.push("n", Value::Integer(i as i64));
                    row
                })
                .collect();
            Self {
                rows: rows.into_iter(),
                fail_after: None,
                served: 0,
            }
        }

        fn failing_after(count: usize, fail_after: usize) -> Self {
            let mut stub = Self::new(count);
            stub.fail_after = Some(fail_after);
            stub
        }
    }

    impl RowSource for StubRows {
        fn next_row(&mut self) -> BackendResult<Option<Row>> {
            if self.fail_after == Some(self.served) {
                return Err("stub row failure".into());
            }
            self.served += 1;
            Ok(self.rows.next())
        }
    }

    fn collect(cursor: ResultCursor) -> Vec<i64> {
        let mut seen = Vec::new();
        cursor
            .for_each(|row| {
                seen.push(row.get("n").and_then(Value::as_i64).unwrap());
            })
            .unwrap();
        seen
    }

    #[test]
    fn test_for_each_visits_all_rows() {
        let cursor = ResultCursor::new(Box::new(StubRows::new(3)));
        assert_eq!(collect(cursor), vec![0, 1, 2]);
    }

    #[test]
    fn test_is_empty_on_empty_result() {
        let mut cursor = ResultCursor::new(Box::new(StubRows::new(0)));
        assert!(cursor.is_empty());
        // repeated probes stay stable
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_is_empty_does_not_consume_first_row() {
        let mut cursor = ResultCursor::new(Box::new(StubRows::new(2)));
        assert!(!cursor.is_empty());
        assert!(!cursor.is_empty());
        assert_eq!(collect(cursor), vec![0, 1]);
    }

    #[test]
    fn test_next_row_drains_then_reports_exhausted() {
        let mut cursor = ResultCursor::new(Box::new(StubRows::new(1)));
        assert!(cursor.next_row().unwrap().is_some());
        assert!(cursor.next_row().unwrap().is_none());
        assert!(cursor.next_row().unwrap().is_none());
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_mid_iteration_failure_is_a_database_error() {
        // failure while consuming rows is classified like every other
        // backend failure, not a bare panic
        let mut cursor = ResultCursor::new(Box::new(StubRows::failing_after(3, 1)));
        assert!(cursor.next_row().unwrap().is_some());
        let err = cursor.next_row().unwrap_err();
        assert!(matches!(err, DatabaseError::Row { .. }));
        assert!(err.cause().is_some());
    }

    #[test]
    fn test_is_empty_swallows_probe_failure() {
        let mut cursor = ResultCursor::new(Box::new(StubRows::failing_after(3, 0)));
        assert!(cursor.is_empty());
    }
}
