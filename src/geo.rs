//! Geographic coordinates and spherical aggregation.
//!
//! Folders that lack an explicit location inherit the spherical mean of
//! their children's coordinates. The mean is computed on the unit sphere
//! (average of 3D unit vectors, converted back to latitude/longitude) so
//! that points straddling the antimeridian average correctly — a naive
//! arithmetic mean of longitudes 179° and -179° would land on the wrong
//! side of the planet.

use serde::{Deserialize, Serialize};

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Spherical mean of a set of points. `None` for an empty set.
pub fn centroid(points: &[Location]) -> Option<Location> {
    if points.is_empty() {
        return None;
    }

    let (mut x, mut y, mut z) = (0.0f64, 0.0f64, 0.0f64);
    for p in points {
        let lat = p.latitude.to_radians();
        let lon = p.longitude.to_radians();
        x += lat.cos() * lon.cos();
        y += lat.cos() * lon.sin();
        z += lat.sin();
    }

    let n = points.len() as f64;
    let (x, y, z) = (x / n, y / n, z / n);

    let hyp = (x * x + y * y).sqrt();
    Some(Location {
        latitude: z.atan2(hyp).to_degrees(),
        longitude: y.atan2(x).to_degrees(),
    })
}
