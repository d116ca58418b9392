use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::coords;
use crate::db::models::StoredCoord;
use crate::tracks::{CoordInsert, JunctureId};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = coords)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)] // coord_id only orders rows sharing a timestamp
pub struct CoordRow {
    pub coord_id: i64,
    pub juncture_id: i64,
    pub lat: f64,
    pub lon: f64,
    pub elevation: Option<f64>,
    pub coord_time: DateTime<Utc>,
}

impl From<CoordRow> for StoredCoord {
    fn from(row: CoordRow) -> Self {
        StoredCoord {
            juncture_id: JunctureId(row.juncture_id),
            lat: row.lat,
            lon: row.lon,
            elevation: row.elevation,
            coord_time: row.coord_time,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = coords)]
pub struct NewCoordRow {
    pub juncture_id: i64,
    pub lat: f64,
    pub lon: f64,
    pub elevation: Option<f64>,
    pub coord_time: DateTime<Utc>,
}

impl From<&CoordInsert> for NewCoordRow {
    fn from(row: &CoordInsert) -> Self {
        NewCoordRow {
            juncture_id: row.juncture_id.value(),
            lat: row.lat,
            lon: row.lon,
            elevation: row.elevation,
            coord_time: row.coord_time,
        }
    }
}
