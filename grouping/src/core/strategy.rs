//! Partition strategies for the initial group layout.
//!
//! A strategy is a pure mapping from an ordered candidate list to a
//! group-to-members layout. It performs no I/O and never mutates the store;
//! callers abort on error before touching any state.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::core::error::EngineError;
use crate::core::types::PartitionMethod;

/// Compute the initial group layout for `candidates` using `method`.
///
/// Candidates must already be filtered to entrants not placed in any group.
pub fn plan_partition(
    candidates: &[String],
    method: PartitionMethod,
) -> Result<Vec<Vec<String>>, EngineError> {
    plan_partition_with(candidates, method, &mut rand::thread_rng())
}

/// Like [`plan_partition`], with an injectable RNG so `Random` layouts are
/// reproducible in tests.
pub fn plan_partition_with<R: Rng>(
    candidates: &[String],
    method: PartitionMethod,
    rng: &mut R,
) -> Result<Vec<Vec<String>>, EngineError> {
    if candidates.is_empty() {
        return Err(EngineError::NoCandidatesSelected);
    }
    match method {
        PartitionMethod::FixedCount(n) => fixed_count(candidates, n),
        PartitionMethod::MaxSize(m) => max_size(candidates, m),
        PartitionMethod::Random(k) => {
            let mut shuffled = candidates.to_vec();
            shuffled.shuffle(rng);
            fixed_count(&shuffled, k)
        }
    }
}

/// Round-robin into exactly `n` groups: candidate `i` lands in group `i % n`,
/// so early groups receive the surplus on an uneven split.
fn fixed_count(candidates: &[String], n: i64) -> Result<Vec<Vec<String>>, EngineError> {
    let n = positive(n)?;
    let mut groups = vec![Vec::new(); n];
    for (i, id) in candidates.iter().enumerate() {
        groups[i % n].push(id.clone());
    }
    Ok(groups)
}

/// Sequential fill: every group except possibly the last holds exactly `m`.
fn max_size(candidates: &[String], m: i64) -> Result<Vec<Vec<String>>, EngineError> {
    let m = positive(m)?;
    Ok(candidates.chunks(m).map(<[String]>::to_vec).collect())
}

fn positive(value: i64) -> Result<usize, EngineError> {
    if value <= 0 {
        return Err(EngineError::InvalidParameter(value));
    }
    Ok(value as usize)
}
