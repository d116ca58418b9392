//! Fixed-stride down-sampling of a merged track.

use super::TrackPoint;

/// Keep one point out of every `DECIMATION_STRIDE`.
///
/// Recorders produce roughly 50 points a minute; one in ten is plenty for
/// map rendering.
pub const DECIMATION_STRIDE: usize = 10;

/// Keep the points at indices `0, 10, 20, ...`.
///
/// The output has `ceil(n / 10)` points and `output[i] == input[10 * i]`.
pub fn decimate(points: Vec<TrackPoint>) -> Vec<TrackPoint> {
    points.into_iter().step_by(DECIMATION_STRIDE).collect()
}
