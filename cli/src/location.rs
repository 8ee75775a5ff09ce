//! Distance ranking of libraries. Pure annotation helper: the closest
//! library's name may be prepended to a query, but no indexing or retrieval
//! happens here.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use studyspot_core::document::SpaceRecord;

const EARTH_RADIUS_MILES: f64 = 3958.8;

#[derive(Debug, Clone)]
pub struct Library {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// Load a library's name and coordinates from a space record file.
pub fn load_library(path: &Path) -> Result<Library> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let record: SpaceRecord = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parse {}", path.display()))?;
    let lat = record
        .space
        .location
        .lat
        .with_context(|| format!("{} has no latitude", path.display()))?;
    let lon = record
        .space
        .location
        .lon
        .with_context(|| format!("{} has no longitude", path.display()))?;
    Ok(Library { name: record.space.name, lat, lon })
}

/// Great-circle distance in miles between two (lat, lon) points.
pub fn haversine_miles(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lon1) = (a.0.to_radians(), a.1.to_radians());
    let (lat2, lon2) = (b.0.to_radians(), b.1.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MILES * h.sqrt().asin()
}

/// Libraries sorted closest first, each with its distance from `user` in
/// miles.
pub fn closest_libraries(user: (f64, f64), libraries: &[Library]) -> Vec<(String, f64)> {
    let mut ranked: Vec<(String, f64)> = libraries
        .iter()
        .map(|lib| (lib.name.clone(), haversine_miles(user, (lib.lat, lib.lon))))
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked
}
