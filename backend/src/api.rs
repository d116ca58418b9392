//! Public API surface for the backend.
//!
//! Tracks travel between the backend and the web client as GeoJSON
//! `Feature`s holding a `LineString` of `[lon, lat, ele]` positions and a
//! parallel `coordTimes` property, the layout map libraries render directly.
//! All types derive Serialize/Deserialize for JSON serialization.

pub use crate::db::models::StoredCoord;
pub use crate::tracks::{JunctureId, MergedTrack, TrackPoint};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tracks::statements::format_coord_time;
use crate::tracks::{Coordinate, TrackError, TrackResult};

/// GeoJSON feature carrying one track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackFeature {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,
    pub properties: TrackProperties,
    pub geometry: LineString,
}

/// Feature properties; only the per-point timestamps are meaningful here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackProperties {
    #[serde(rename = "coordTimes", default)]
    pub coord_times: Vec<String>,
}

/// GeoJSON `LineString` geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineString {
    #[serde(rename = "type", default = "line_string_type")]
    pub kind: String,
    /// Positions as `[lon, lat]` or `[lon, lat, ele]`.
    pub coordinates: Vec<Vec<f64>>,
}

fn feature_type() -> String {
    "Feature".to_string()
}

fn line_string_type() -> String {
    "LineString".to_string()
}

impl TrackFeature {
    /// Build a feature from track points, keeping their order.
    pub fn from_points(points: &[TrackPoint]) -> Self {
        let coordinates = points
            .iter()
            .map(|p| match p.elevation {
                Some(ele) => vec![p.longitude, p.latitude, ele],
                None => vec![p.longitude, p.latitude],
            })
            .collect();
        let coord_times = points
            .iter()
            .map(|p| format_coord_time(&p.timestamp))
            .collect();

        Self {
            kind: feature_type(),
            properties: TrackProperties { coord_times },
            geometry: LineString {
                kind: line_string_type(),
                coordinates,
            },
        }
    }

    /// Convert a client-supplied feature back into a track for `juncture_id`.
    ///
    /// # Errors
    /// * `TrackError::Validation` if the position and time counts differ, a
    ///   position has fewer than two or more than three values, or a time is
    ///   not RFC 3339.
    pub fn into_track(self, juncture_id: JunctureId) -> TrackResult<MergedTrack> {
        let coordinates = self.geometry.coordinates;
        let times = self.properties.coord_times;
        if coordinates.len() != times.len() {
            return Err(TrackError::validation(format!(
                "Feature has {} coordinates but {} coordTimes",
                coordinates.len(),
                times.len()
            )));
        }

        let points = coordinates
            .into_iter()
            .zip(times)
            .enumerate()
            .map(|(i, (position, time))| {
                let coordinate = position_to_coordinate(i, &position)?;
                let timestamp = parse_coord_time(i, &time)?;
                Ok(TrackPoint::new(coordinate, timestamp))
            })
            .collect::<TrackResult<Vec<_>>>()?;

        Ok(MergedTrack::new(juncture_id, points))
    }
}

impl From<&MergedTrack> for TrackFeature {
    fn from(track: &MergedTrack) -> Self {
        TrackFeature::from_points(&track.points)
    }
}

fn position_to_coordinate(index: usize, position: &[f64]) -> TrackResult<Coordinate> {
    match *position {
        [longitude, latitude] => Ok(Coordinate {
            longitude,
            latitude,
            elevation: None,
        }),
        [longitude, latitude, elevation] => Ok(Coordinate {
            longitude,
            latitude,
            elevation: Some(elevation),
        }),
        _ => Err(TrackError::validation(format!(
            "Coordinate {} has {} values, expected 2 or 3",
            index,
            position.len()
        ))),
    }
}

fn parse_coord_time(index: usize, value: &str) -> TrackResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            TrackError::validation(format!("coordTimes[{}] '{}' is invalid: {}", index, value, e))
        })
}
