//! Coordinates, camera bounds and great-circle distance.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used for distance ranking.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Build from a GeoJSON-style `[lng, lat]` pair.
    pub fn from_lng_lat(pair: [f64; 2]) -> Self {
        Self {
            lat: pair[1],
            lng: pair[0],
        }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Latitude within ±90 and longitude within ±180.
    pub fn in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Great-circle distance between two coordinates in kilometres.
pub fn haversine_km(a: LatLng, b: LatLng) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Accumulator of coordinate extrema used to fit the camera.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    extent: Option<Extent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Extent {
    south_west: LatLng,
    north_east: LatLng,
}

impl Bounds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: impl IntoIterator<Item = LatLng>) -> Self {
        let mut bounds = Self::new();
        for point in points {
            bounds.extend(point);
        }
        bounds
    }

    /// Grow the bounds to include `point`. Non-finite coordinates are ignored.
    pub fn extend(&mut self, point: LatLng) {
        if !point.is_finite() {
            return;
        }
        self.extent = Some(match self.extent {
            None => Extent {
                south_west: point,
                north_east: point,
            },
            Some(e) => Extent {
                south_west: LatLng::new(
                    e.south_west.lat.min(point.lat),
                    e.south_west.lng.min(point.lng),
                ),
                north_east: LatLng::new(
                    e.north_east.lat.max(point.lat),
                    e.north_east.lng.max(point.lng),
                ),
            },
        });
    }

    pub fn merge(&mut self, other: &Bounds) {
        if let Some(e) = other.extent {
            self.extend(e.south_west);
            self.extend(e.north_east);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.extent.is_none()
    }

    pub fn south_west(&self) -> Option<LatLng> {
        self.extent.map(|e| e.south_west)
    }

    pub fn north_east(&self) -> Option<LatLng> {
        self.extent.map(|e| e.north_east)
    }

    pub fn contains(&self, point: LatLng) -> bool {
        self.extent.is_some_and(|e| {
            point.lat >= e.south_west.lat
                && point.lat <= e.north_east.lat
                && point.lng >= e.south_west.lng
                && point.lng <= e.north_east.lng
        })
    }
}
