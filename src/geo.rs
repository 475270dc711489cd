//! Great-circle helpers shared by the graph model and the turn classifier

use std::f64::consts::TAU;

const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A WGS84 coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Coord {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Compute haversine distance between two points in meters
pub fn haversine_distance(a: Coord, b: Coord) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lon = (b.lon - a.lon).to_radians();

    let h =
        (delta_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Initial bearing from `from` to `to` in radians, normalized into [0, 2π)
///
/// 0 is north, π/2 is east.
pub fn bearing(from: Coord, to: Coord) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let delta_lon = (to.lon - from.lon).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();
    normalize_positive(y.atan2(x))
}

/// Wrap an angle into [0, 2π)
pub fn normalize_positive(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Wrap an angle difference into (-π, π]
pub fn normalize_signed(delta: f64) -> f64 {
    let wrapped = normalize_positive(delta);
    if wrapped > std::f64::consts::PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// Length of a polyline in meters
pub fn polyline_length(coords: &[Coord]) -> f64 {
    coords
        .windows(2)
        .map(|pair| haversine_distance(pair[0], pair[1]))
        .sum()
}
