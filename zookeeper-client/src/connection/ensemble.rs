//! Ensemble member selection.

use rand::seq::SliceRandom;

/// Splits a comma-separated ensemble string into endpoints.
///
/// Whitespace around endpoints is trimmed and empty entries are dropped.
pub(crate) fn parse(ensemble: &str) -> Vec<String> {
    ensemble
        .split(',')
        .map(str::trim)
        .filter(|endpoint| !endpoint.is_empty())
        .map(str::to_string)
        .collect()
}

/// Returns the ensemble endpoints in a fresh uniformly shuffled order.
///
/// Each connection attempt shuffles into a local list so the configured
/// ensemble string is never mutated and no endpoint becomes a hotspot.
pub(crate) fn shuffled(ensemble: &str) -> Vec<String> {
    let mut endpoints = parse(ensemble);
    endpoints.shuffle(&mut rand::thread_rng());
    endpoints
}
