//! Completion-order draining of a set of concurrent operations.
//!
//! [`SettledSet`] takes a collection of pending futures and yields their
//! outcomes in the order they actually complete, not the order they were
//! submitted. A slow or failed operation never blocks delivery of a faster
//! one, and a failed operation surfaces as a tagged [`Settled::Rejected`]
//! value instead of aborting the drain.
//!
//! # Architecture
//!
//! ```text
//! future A (30ms) ─┐
//!                  │                      next().await
//! future B (10ms) ─┼──► SettledSet ─────► B, C, A
//!                  │    (race all         (completion
//! future C (20ms) ─┘     pending)          order)
//! ```
//!
//! Each pull races every still-pending future and removes the winner, so no
//! future is ever polled again after it completes. The drain is finite and
//! consumed once: when the set is empty, [`SettledSet::next`] returns `None`
//! immediately. Between pulls the consumer's task yields, so other work (for
//! example a newer reconciliation pass) can run and be observed before the
//! next outcome is applied.

use std::future::Future;

use futures::stream::{FuturesUnordered, StreamExt};

/// Outcome of a single settled operation.
///
/// The equivalent of a `Result`, but delivered as a plain value so that a
/// rejection can be yielded from a drain without terminating it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled<T, E> {
    /// The operation completed with a value.
    Fulfilled(T),
    /// The operation failed with a reason.
    Rejected(E),
}

impl<T, E> Settled<T, E> {
    /// Returns true if the operation completed with a value.
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Settled::Fulfilled(_))
    }

    /// Returns true if the operation failed.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Settled::Rejected(_))
    }

    /// Extracts the fulfilled value, if any.
    pub fn fulfilled(self) -> Option<T> {
        match self {
            Settled::Fulfilled(value) => Some(value),
            Settled::Rejected(_) => None,
        }
    }
}

impl<T, E> From<Result<T, E>> for Settled<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Settled::Fulfilled(value),
            Err(reason) => Settled::Rejected(reason),
        }
    }
}

/// A set of pending operations drained in completion order.
///
/// Backed by [`FuturesUnordered`], which races all pending futures on each
/// poll and removes each one as it completes.
pub struct SettledSet<Fut> {
    pending: FuturesUnordered<Fut>,
}

impl<Fut, T, E> SettledSet<Fut>
where
    Fut: Future<Output = Result<T, E>>,
{
    /// Creates an empty set.
    pub fn new() -> Self {
        Self {
            pending: FuturesUnordered::new(),
        }
    }

    /// Adds a pending operation to the set.
    pub fn push(&mut self, future: Fut) {
        self.pending.push(future);
    }

    /// Returns the number of operations still pending.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if no operations are pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Waits for the next operation to settle and returns its tagged outcome.
    ///
    /// Returns `None` once every operation has been delivered. Outcomes
    /// arrive in completion order; each operation is delivered exactly once.
    pub async fn next(&mut self) -> Option<Settled<T, E>> {
        self.pending.next().await.map(Settled::from)
    }
}

impl<Fut, T, E> Default for SettledSet<Fut>
where
    Fut: Future<Output = Result<T, E>>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Fut, T, E> FromIterator<Fut> for SettledSet<Fut>
where
    Fut: Future<Output = Result<T, E>>,
{
    fn from_iter<I: IntoIterator<Item = Fut>>(iter: I) -> Self {
        Self {
            pending: iter.into_iter().collect(),
        }
    }
}
