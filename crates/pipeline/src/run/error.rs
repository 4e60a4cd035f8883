use std::error::Error as StdError;

use crate::SchemaError;

/// Errors that can occur during a run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("event {event} is not a valid drift record")]
    Schema {
        event: usize,
        #[source]
        source: SchemaError,
    },

    #[error("failed to write record")]
    Sink(#[source] Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub(crate) fn sink<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Sink(Box::new(err))
    }
}
