//! Per-configuration resolution state.
//!
//! A configuration starts [`ResolutionState::Unresolved`] and moves exactly
//! once to `Resolved` or `Unresolvable`; both are terminal.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::error::ResolveError;
use crate::result::ResolutionResult;

pub type ResolutionOutcome = Result<Arc<ResolutionResult>, Arc<ResolveError>>;

#[derive(Debug, Clone)]
pub enum ResolutionState {
    Unresolved,
    Resolved(Arc<ResolutionResult>),
    Unresolvable(Arc<ResolveError>),
}

impl ResolutionState {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolutionState::Resolved(_))
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ResolutionState::Unresolved)
    }

    pub fn result(&self) -> Option<&Arc<ResolutionResult>> {
        match self {
            ResolutionState::Resolved(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Arc<ResolveError>> {
        match self {
            ResolutionState::Unresolvable(err) => Some(err),
            _ => None,
        }
    }
}

/// Holds the outcome of the single resolution of one configuration.
///
/// The first caller of [`ResolutionCell::get_or_resolve`] runs the resolution;
/// concurrent callers wait for it and all observe the same `Arc`. If the
/// running caller is cancelled, the next waiter takes over.
#[derive(Debug, Default)]
pub struct ResolutionCell {
    outcome: OnceCell<ResolutionOutcome>,
}

impl ResolutionCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ResolutionState {
        match self.outcome.get() {
            None => ResolutionState::Unresolved,
            Some(Ok(result)) => ResolutionState::Resolved(Arc::clone(result)),
            Some(Err(err)) => ResolutionState::Unresolvable(Arc::clone(err)),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.initialized()
    }

    pub async fn get_or_resolve<F, Fut>(&self, resolve: F) -> ResolutionOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ResolutionResult, ResolveError>>,
    {
        self.outcome
            .get_or_init(|| async move { resolve().await.map(Arc::new).map_err(Arc::new) })
            .await
            .clone()
    }
}
