//! Kernel preconditions: checks that run before any hashing.

use crate::error::StakeCheckError;
use crate::params::NetworkParams;
use crate::types::{Amount, Timestamp};

/// Validate a candidate coin against a candidate time.
///
/// Checks, in order:
/// 1. Zero value (before anything else, regardless of timestamps)
/// 2. Candidate time not before the source block
/// 3. Minimum stake age
pub fn check_kernel_preconditions(
    params: &NetworkParams,
    value: Amount,
    block_from_time: Timestamp,
    time_tx: Timestamp,
) -> Result<(), StakeCheckError> {
    if value == 0 {
        return Err(StakeCheckError::ZeroValue);
    }

    if time_tx < block_from_time {
        return Err(StakeCheckError::TimeBeforeSource {
            block_from_time,
            time_tx,
        });
    }

    if u64::from(block_from_time) + u64::from(params.stake_min_age) > u64::from(time_tx) {
        return Err(StakeCheckError::MinAgeViolation {
            block_from_time,
            min_age: params.stake_min_age,
            time_tx,
        });
    }

    Ok(())
}

/// Whether a probe time is inside the permitted envelope.
pub fn is_time_eligible(params: &NetworkParams, block_from_time: Timestamp, time_tx: i64) -> bool {
    time_tx >= i64::from(block_from_time)
        && i64::from(block_from_time) + i64::from(params.stake_min_age) <= time_tx
        && time_tx <= i64::from(u32::MAX)
}

/// The coinstake must carry the block's own timestamp.
pub fn check_coinstake_timestamp(block_time: i64, tx_time: i64) -> Result<(), StakeCheckError> {
    if block_time == tx_time {
        Ok(())
    } else {
        Err(StakeCheckError::CoinstakeTimestampMismatch {
            block_time,
            tx_time,
        })
    }
}
