//! Ordered fallback chains.
//!
//! Both the text-extraction strategies and the generation model list are
//! "try each candidate in order, keep the first usable result". This module
//! owns that loop so the two call sites only describe what a candidate does.

use std::fmt::Display;

/// Why a single candidate did not produce a result.
#[derive(Debug)]
pub enum AttemptFailure<E> {
    /// Ran fine but produced nothing usable.
    Empty,
    Failed(E),
}

/// First candidate that produced a result.
#[derive(Debug)]
pub struct ChainHit<T> {
    pub value: T,
    pub position: usize,
    pub label: String,
}

/// Every candidate was tried and none produced a result.
#[derive(Debug)]
pub struct ChainExhausted<E> {
    pub failures: Vec<(String, AttemptFailure<E>)>,
}

impl<E> ChainExhausted<E> {
    /// The earliest hard error, skipping candidates that were merely empty.
    pub fn first_error(&self) -> Option<&E> {
        self.failures.iter().find_map(|(_, failure)| match failure {
            AttemptFailure::Failed(e) => Some(e),
            AttemptFailure::Empty => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run `attempt` against each candidate in order, stopping at the first
/// `Ok(Some(_))`. `Ok(None)` and `Err(_)` both move on to the next one.
/// Later candidates never run once one succeeds.
pub fn run_chain<C, T, E, L, F>(
    chain: &str,
    candidates: impl IntoIterator<Item = C>,
    label: L,
    mut attempt: F,
) -> Result<ChainHit<T>, ChainExhausted<E>>
where
    E: Display,
    L: Fn(&C) -> String,
    F: FnMut(&C) -> Result<Option<T>, E>,
{
    let mut failures = Vec::new();

    for (position, candidate) in candidates.into_iter().enumerate() {
        let name = label(&candidate);
        tracing::debug!(chain, candidate = %name, position, "Trying fallback candidate");

        match attempt(&candidate) {
            Ok(Some(value)) => {
                if position > 0 {
                    tracing::info!(chain, candidate = %name, position, "Fallback candidate succeeded");
                }
                return Ok(ChainHit {
                    value,
                    position,
                    label: name,
                });
            }
            Ok(None) => {
                tracing::debug!(chain, candidate = %name, "Candidate produced nothing");
                failures.push((name, AttemptFailure::Empty));
            }
            Err(e) => {
                tracing::warn!(chain, candidate = %name, error = %e, "Candidate failed");
                failures.push((name, AttemptFailure::Failed(e)));
            }
        }
    }

    Err(ChainExhausted { failures })
}
