//! Block merge of several track files into one point sequence.
//!
//! Each file is treated as one contiguous, internally ordered block. A block
//! is placed in front of the accumulator when its first timestamp is strictly
//! earlier than the accumulator's first timestamp, otherwise behind it. Only
//! the two first timestamps are compared, so a file that overlaps the middle
//! of the accumulator ends up out of order. Callers that need a true
//! timestamp merge must sort afterwards.

use super::error::{TrackError, TrackResult};
use super::{TrackFile, TrackPoint};

/// Merge track files in upload order.
///
/// The first file seeds the result and every following file is folded in
/// with [`place_block`].
///
/// # Errors
/// * `TrackError::Validation` if `files` is empty or any file has no points.
pub fn merge_tracks(files: Vec<TrackFile>) -> TrackResult<Vec<TrackPoint>> {
    let mut files = files.into_iter();
    let seed = files
        .next()
        .ok_or_else(|| TrackError::validation("No track files supplied"))?;
    ensure_has_points(&seed)?;

    files.try_fold(seed.points, place_block)
}

/// Place one file's block before or after the accumulated points.
///
/// Returns a new sequence; neither input is reused after the call.
pub fn place_block(acc: Vec<TrackPoint>, next: TrackFile) -> TrackResult<Vec<TrackPoint>> {
    ensure_has_points(&next)?;

    let precedes = match (next.first_timestamp(), acc.first()) {
        (Some(next_start), Some(acc_start)) => next_start < acc_start.timestamp,
        _ => false,
    };

    let merged = if precedes {
        next.points.into_iter().chain(acc).collect()
    } else {
        acc.into_iter().chain(next.points).collect()
    };

    Ok(merged)
}

fn ensure_has_points(file: &TrackFile) -> TrackResult<()> {
    if file.is_empty() {
        return Err(TrackError::validation(format!(
            "Track file {} contains no timestamped points",
            file.name
        )));
    }
    Ok(())
}
