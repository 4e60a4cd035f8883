use std::{convert::Infallible, error::Error as StdError};

use crate::AvalancheRow;

/// Destination for the records a run emits, one per input event.
///
/// Rows arrive in input order. Implemented for `Vec<AvalancheRow>`, which
/// collects rows in memory, and for
/// [`RecordWriter`](crate::RecordWriter), which streams them to a file.
pub trait RecordSink {
    type Error: StdError + Send + Sync + 'static;

    /// Accepts the next row.
    ///
    /// # Errors
    ///
    /// Returns an error if the row cannot be stored.
    fn write_row(&mut self, row: AvalancheRow) -> Result<(), Self::Error>;
}

impl RecordSink for Vec<AvalancheRow> {
    type Error = Infallible;

    fn write_row(&mut self, row: AvalancheRow) -> Result<(), Self::Error> {
        self.push(row);
        Ok(())
    }
}

impl<S: RecordSink + ?Sized> RecordSink for &mut S {
    type Error = S::Error;

    fn write_row(&mut self, row: AvalancheRow) -> Result<(), Self::Error> {
        (**self).write_row(row)
    }
}
