//! Rendering of a merged track into persistence statements.
//!
//! A batch always has the shape
//!
//! ```text
//! BEGIN; DELETE <juncture>; INSERT <point 0>; ... INSERT <point n-1>; COMMIT;
//! ```
//!
//! so that executing it replaces every stored point of the juncture in one
//! transaction. The batch is plain data; repositories decide how to run it.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::{JunctureId, MergedTrack};

/// Fully qualified table holding persisted track coordinates.
pub const COORDS_TABLE: &str = "pomb.coords";

/// One row to insert into the coordinates table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordInsert {
    pub juncture_id: JunctureId,
    pub lat: f64,
    pub lon: f64,
    pub elevation: Option<f64>,
    pub coord_time: DateTime<Utc>,
}

/// A single statement of a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Statement<'a> {
    Begin,
    DeleteJuncture(JunctureId),
    Insert(&'a CoordInsert),
    Commit,
}

impl fmt::Display for Statement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Begin => write!(f, "BEGIN;"),
            Statement::DeleteJuncture(juncture_id) => write!(
                f,
                "DELETE FROM {table} WHERE {table}.juncture_id = {id};",
                table = COORDS_TABLE,
                id = juncture_id
            ),
            Statement::Insert(row) => {
                let elevation = match row.elevation {
                    Some(e) => e.to_string(),
                    None => "NULL".to_string(),
                };
                write!(
                    f,
                    "INSERT INTO {}(juncture_id, lat, lon, elevation, coord_time) VALUES ({}, {}, {}, {}, '{}');",
                    COORDS_TABLE,
                    row.juncture_id,
                    row.lat,
                    row.lon,
                    elevation,
                    format_coord_time(&row.coord_time)
                )
            }
            Statement::Commit => write!(f, "COMMIT;"),
        }
    }
}

/// Transactional replace of one juncture's coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementBatch {
    juncture_id: JunctureId,
    inserts: Vec<CoordInsert>,
}

impl StatementBatch {
    pub fn juncture_id(&self) -> JunctureId {
        self.juncture_id
    }

    /// Rows inserted by the batch, in track order.
    pub fn inserts(&self) -> &[CoordInsert] {
        &self.inserts
    }

    /// Every statement in execution order, including `BEGIN` and `COMMIT`.
    pub fn statements(&self) -> impl Iterator<Item = Statement<'_>> + '_ {
        [Statement::Begin, Statement::DeleteJuncture(self.juncture_id)]
            .into_iter()
            .chain(self.inserts.iter().map(Statement::Insert))
            .chain(std::iter::once(Statement::Commit))
    }

    /// Number of statements, transaction markers included.
    pub fn statement_count(&self) -> usize {
        self.inserts.len() + 3
    }

    /// Render the batch as a single SQL script.
    pub fn to_sql(&self) -> String {
        self.statements()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Build the delete-then-insert batch for a merged track.
pub fn render_persistence_statements(track: &MergedTrack) -> StatementBatch {
    let inserts = track
        .points
        .iter()
        .map(|p| CoordInsert {
            juncture_id: track.juncture_id,
            lat: p.latitude,
            lon: p.longitude,
            elevation: p.elevation,
            coord_time: p.timestamp,
        })
        .collect();

    StatementBatch {
        juncture_id: track.juncture_id,
        inserts,
    }
}

pub(crate) fn format_coord_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracks::{Coordinate, TrackPoint};
    use chrono::TimeZone;

    fn track() -> MergedTrack {
        MergedTrack::new(
            JunctureId(7),
            vec![
                TrackPoint::new(
                    Coordinate {
                        longitude: 7.9,
                        latitude: 46.5,
                        elevation: Some(1200.5),
                    },
                    Utc.with_ymd_and_hms(2017, 8, 1, 8, 0, 0).unwrap(),
                ),
                TrackPoint::new(
                    Coordinate {
                        longitude: -122.25,
                        latitude: 37.75,
                        elevation: None,
                    },
                    Utc.with_ymd_and_hms(2017, 8, 1, 8, 10, 0).unwrap(),
                ),
            ],
        )
    }

    #[test]
    fn test_batch_shape() {
        let batch = render_persistence_statements(&track());
        let statements: Vec<_> = batch.statements().collect();

        assert_eq!(statements.len(), 5);
        assert_eq!(batch.statement_count(), 5);
        assert_eq!(statements[0], Statement::Begin);
        assert_eq!(statements[1], Statement::DeleteJuncture(JunctureId(7)));
        assert!(matches!(statements[2], Statement::Insert(_)));
        assert!(matches!(statements[3], Statement::Insert(_)));
        assert_eq!(statements[4], Statement::Commit);
    }

    #[test]
    fn test_insert_swaps_to_lat_lon_order() {
        let batch = render_persistence_statements(&track());
        let row = batch.inserts()[0];

        assert_eq!(row.juncture_id, JunctureId(7));
        assert_eq!(row.lat, 46.5);
        assert_eq!(row.lon, 7.9);
        assert_eq!(row.elevation, Some(1200.5));
    }

    #[test]
    fn test_sql_text() {
        let sql = render_persistence_statements(&track()).to_sql();

        assert_eq!(
            sql,
            "BEGIN; \
             DELETE FROM pomb.coords WHERE pomb.coords.juncture_id = 7; \
             INSERT INTO pomb.coords(juncture_id, lat, lon, elevation, coord_time) VALUES (7, 46.5, 7.9, 1200.5, '2017-08-01T08:00:00Z'); \
             INSERT INTO pomb.coords(juncture_id, lat, lon, elevation, coord_time) VALUES (7, 37.75, -122.25, NULL, '2017-08-01T08:10:00Z'); \
             COMMIT;"
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let t = track();
        let first = render_persistence_statements(&t);
        let second = render_persistence_statements(&t);

        assert_eq!(first, second);
        assert_eq!(first.to_sql().as_bytes(), second.to_sql().as_bytes());
    }

    #[test]
    fn test_empty_track_still_deletes() {
        let batch = render_persistence_statements(&MergedTrack::new(JunctureId(3), vec![]));
        assert_eq!(
            batch.to_sql(),
            "BEGIN; DELETE FROM pomb.coords WHERE pomb.coords.juncture_id = 3; COMMIT;"
        );
    }
}
