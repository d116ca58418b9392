#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::{Duration, SecondsFormat, TimeZone, Utc};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Seconds offset from 2017-08-01T08:00:00Z as an RFC 3339 string.
pub fn time_at(offset_secs: i64) -> String {
    let base = Utc.with_ymd_and_hms(2017, 8, 1, 8, 0, 0).unwrap();
    (base + Duration::seconds(offset_secs)).to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Build a single-track GPX document from `(offset_secs, lat, lon)` points.
pub fn gpx_doc(points: &[(i64, f64, f64)]) -> String {
    let trkpts: String = points
        .iter()
        .map(|(t, lat, lon)| {
            format!(
                "      <trkpt lat=\"{}\" lon=\"{}\"><ele>100</ele><time>{}</time></trkpt>\n",
                lat,
                lon,
                time_at(*t)
            )
        })
        .collect();

    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<gpx version=\"1.1\" creator=\"pomb-tests\" xmlns=\"http://www.topografix.com/GPX/1/1\">\n",
            "  <trk>\n",
            "    <trkseg>\n",
            "{}",
            "    </trkseg>\n",
            "  </trk>\n",
            "</gpx>\n"
        ),
        trkpts
    )
}

/// A GPX document with `n` points one second apart starting at `start`.
pub fn gpx_run(start: i64, n: usize) -> String {
    let points: Vec<(i64, f64, f64)> = (0..n)
        .map(|i| (start + i as i64, 45.0 + i as f64 * 0.001, 7.0))
        .collect();
    gpx_doc(&points)
}

/// Build a multipart/form-data body with one part per `(file_name, content)`
/// under `field`.
pub fn multipart_body(boundary: &str, field: &str, files: &[(&str, &str)]) -> Vec<u8> {
    let mut body = String::new();
    for (name, content) in files {
        body.push_str(&format!("--{}\r\n", boundary));
        body.push_str(&format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, name
        ));
        body.push_str("Content-Type: application/gpx+xml\r\n\r\n");
        body.push_str(content);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{}--\r\n", boundary));
    body.into_bytes()
}

/// Number of regular files directly inside `dir`; a missing dir counts as 0.
pub fn file_count(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(Result::ok).count())
        .unwrap_or(0)
}
