use crate::data::Diagrams;
use crate::query::{QueryError, QueryResponse};

/// The result of one fetch, before it is collapsed for display.
///
/// A missing payload and a failed request look the same to the user (the
/// empty state), but the failure is kept so it can be logged.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The backend returned a diagrams payload.
    Data(Diagrams),
    /// The backend answered without a diagrams payload.
    Empty,
    /// Transport, status or parse failure.
    Failed(QueryError),
}

impl FetchOutcome {
    /// Whether the presentation layer should show the empty state.
    pub fn shows_empty(&self) -> bool {
        !matches!(self, FetchOutcome::Data(_))
    }
}

impl From<Result<QueryResponse, QueryError>> for FetchOutcome {
    fn from(result: Result<QueryResponse, QueryError>) -> Self {
        match result {
            Ok(QueryResponse {
                diagrams: Some(diagrams),
            }) => FetchOutcome::Data(diagrams),
            Ok(_) => FetchOutcome::Empty,
            Err(e) => FetchOutcome::Failed(e),
        }
    }
}
