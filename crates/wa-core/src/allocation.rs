//! Time allocation policies.
//!
//! Splits a day's total seconds across N work items. Two policies:
//!
//! - [`even_distribution`]: deterministic floor-plus-remainder split
//! - [`fair_distribution`]: randomized chunk-based split that reads more
//!   like hand-entered time, exact by construction plus a correction pass
//!
//! Both are pure; the fair policy takes the random source as an argument
//! so callers (and tests) control determinism.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::WorkItem;

/// Chunk sizes the fair policy draws from, in seconds (5 to 30 minutes).
pub const CHUNK_MENU_SECONDS: [u64; 6] = [300, 600, 900, 1200, 1500, 1800];

/// Smallest chunk; the correction pass never moves more than this per step.
pub const MIN_CHUNK_SECONDS: u64 = 300;

/// Allocation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
    /// The caller asked to split time across zero work items.
    ///
    /// Upstream checks route empty fetches to a no-work outcome before
    /// allocation, so hitting this indicates a caller bug.
    #[error("cannot allocate time across zero work items")]
    NoWorkItems,
}

/// Splits `total` into `n` values of `floor(total/n)` or one more.
///
/// The remainder (`total % n`) goes to the first `remainder` entries in
/// index order, so the result is fully deterministic.
pub fn even_distribution(total: u64, n: usize) -> Result<Vec<u64>, AllocationError> {
    if n == 0 {
        return Err(AllocationError::NoWorkItems);
    }
    let base = total / n as u64;
    let remainder = (total % n as u64) as usize;
    Ok((0..n)
        .map(|i| if i < remainder { base + 1 } else { base })
        .collect())
}

/// Splits `total` into `n` uneven, human-looking values summing exactly
/// to `total`.
///
/// Chunks are drawn from [`CHUNK_MENU_SECONDS`] and assigned round-robin;
/// when the remaining total is smaller than the drawn chunk the remainder
/// is assigned in full and drawing stops. A correction pass then walks
/// the slots in steps of at most [`MIN_CHUNK_SECONDS`] until the sum is
/// exact. Terminates in bounded iterations: the draw loop strictly
/// decreases the remaining total and every full lap of the correction
/// pass moves the sum toward the target.
pub fn fair_distribution<R: Rng + ?Sized>(
    total: u64,
    n: usize,
    rng: &mut R,
) -> Result<Vec<u64>, AllocationError> {
    if n == 0 {
        return Err(AllocationError::NoWorkItems);
    }

    let mut allocations = vec![0u64; n];
    let mut remaining = total;
    let mut slot = 0usize;
    while remaining > 0 {
        let chunk = CHUNK_MENU_SECONDS[rng.gen_range(0..CHUNK_MENU_SECONDS.len())];
        if remaining < chunk {
            allocations[slot % n] += remaining;
            remaining = 0;
        } else {
            allocations[slot % n] += chunk;
            remaining -= chunk;
        }
        slot += 1;
    }

    // Chunk drawing can leave the sum off target; nudge slots round-robin
    // until it matches. Slots never go negative.
    let mut sum: u64 = allocations.iter().sum();
    let mut slot = 0usize;
    while sum != total {
        let i = slot % n;
        if sum > total {
            let step = MIN_CHUNK_SECONDS.min(sum - total).min(allocations[i]);
            allocations[i] -= step;
            sum -= step;
        } else {
            let step = MIN_CHUNK_SECONDS.min(total - sum);
            allocations[i] += step;
            sum += step;
        }
        slot += 1;
    }

    Ok(allocations)
}

/// An ordered mapping from work items to seconds to be logged.
///
/// Invariants, checked at construction:
/// - the values sum exactly to the requested total
/// - there is one value per work item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationPlan {
    entries: Vec<(WorkItem, u64)>,
}

impl AllocationPlan {
    /// Builds a plan with the fair (randomized) policy.
    pub fn fair<R: Rng + ?Sized>(
        items: Vec<WorkItem>,
        total_seconds: u64,
        rng: &mut R,
    ) -> Result<Self, AllocationError> {
        let seconds = fair_distribution(total_seconds, items.len(), rng)?;
        Ok(Self {
            entries: items.into_iter().zip(seconds).collect(),
        })
    }

    /// Builds a plan with the even (deterministic) policy.
    pub fn even(items: Vec<WorkItem>, total_seconds: u64) -> Result<Self, AllocationError> {
        let seconds = even_distribution(total_seconds, items.len())?;
        Ok(Self {
            entries: items.into_iter().zip(seconds).collect(),
        })
    }

    /// The (work item, seconds) pairs in allocation order.
    pub fn entries(&self) -> &[(WorkItem, u64)] {
        &self.entries
    }

    /// Sum of all allocated seconds.
    pub fn total_seconds(&self) -> u64 {
        self.entries.iter().map(|(_, seconds)| seconds).sum()
    }

    /// Number of work items in the plan.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the plan holds no items.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
