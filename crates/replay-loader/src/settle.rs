//! Settle-all join.
//!
//! [`settle_all`] waits for every future and returns every outcome; it never
//! short-circuits on a failure. Call sites that want fail-fast behaviour use
//! `futures::future::try_join_all` instead, so the choice is visible where
//! the join happens.

use std::future::Future;

/// Outcome counts of a settled batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettleSummary {
    pub fulfilled: usize,
    pub rejected: usize,
}

impl SettleSummary {
    pub fn from_outcomes<T, E>(outcomes: &[Result<T, E>]) -> Self {
        let fulfilled = outcomes.iter().filter(|o| o.is_ok()).count();
        Self {
            fulfilled,
            rejected: outcomes.len() - fulfilled,
        }
    }

    pub fn total(&self) -> usize {
        self.fulfilled + self.rejected
    }
}

/// Drive all futures concurrently and wait until each has settled.
///
/// Outcomes are returned in input order, regardless of completion order.
pub async fn settle_all<I, F, T, E>(futures: I) -> Vec<Result<T, E>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    futures::future::join_all(futures).await
}
