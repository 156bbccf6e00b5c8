//! Geographic primitives shared by every source and by the search core.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// A WGS84 position, longitude first to match the wire format of the external services.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    /// Longitude in decimal degrees
    pub lng: f64,
    /// Latitude in decimal degrees
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Build a position from a `[lng, lat, ..]` slice as found in GeoJSON geometries.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match values {
            [lng, lat, ..] => Some(Self::new(*lng, *lat)),
            _ => None,
        }
    }

    /// Finite and not the `(0, 0)` placeholder that upstream services emit for "unknown".
    pub fn is_usable(&self) -> bool {
        self.lng.is_finite()
            && self.lat.is_finite()
            && !(self.lng == 0.0 && self.lat == 0.0)
            && (-180.0..=180.0).contains(&self.lng)
            && (-90.0..=90.0).contains(&self.lat)
    }

    /// `Some(self)` when usable.
    pub fn usable(self) -> Option<Self> {
        self.is_usable().then_some(self)
    }

    /// True when both axes differ by at most `epsilon` degrees.
    pub fn within_degrees(&self, other: &Self, epsilon: f64) -> bool {
        (self.lng - other.lng).abs() <= epsilon && (self.lat - other.lat).abs() <= epsilon
    }

    pub fn distance_to(&self, other: &Self) -> f64 {
        haversine_meters(*self, *other)
    }

    /// Format as the `lng,lat` pair the upstream APIs accept as a proximity hint.
    pub fn to_query_value(&self) -> String {
        format!("{},{}", self.lng, self.lat)
    }
}

impl fmt::Display for LngLat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lng, self.lat)
    }
}

/// Great-circle distance in meters between two positions.
pub fn haversine_meters(a: LngLat, b: LngLat) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let d_lat = (b.lat - a.lat).abs().to_radians();
    let d_lng = (b.lng - a.lng).abs().to_radians();

    let h =
        (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

/// A geographic extent, `[min_lng, min_lat, max_lng, max_lat]` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub const fn new(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Self {
        Self {
            min_lng,
            min_lat,
            max_lng,
            max_lat,
        }
    }

    /// Parse a four element `[min_lng, min_lat, max_lng, max_lat]` array.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match values {
            [min_lng, min_lat, max_lng, max_lat] => {
                Some(Self::new(*min_lng, *min_lat, *max_lng, *max_lat))
            }
            _ => None,
        }
    }

    /// Smallest box containing every position; `None` for an empty input.
    pub fn around<I>(positions: I) -> Option<Self>
    where
        I: IntoIterator<Item = LngLat>,
    {
        positions.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => Self::new(p.lng, p.lat, p.lng, p.lat),
                Some(b) => Self::new(
                    b.min_lng.min(p.lng),
                    b.min_lat.min(p.lat),
                    b.max_lng.max(p.lng),
                    b.max_lat.max(p.lat),
                ),
            })
        })
    }

    pub fn centroid(&self) -> LngLat {
        LngLat::new(
            (self.min_lng + self.max_lng) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    pub fn contains(&self, p: &LngLat) -> bool {
        (self.min_lng..=self.max_lng).contains(&p.lng) && (self.min_lat..=self.max_lat).contains(&p.lat)
    }

    pub fn to_query_value(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lng, self.min_lat, self.max_lng, self.max_lat
        )
    }
}

/// The visible map area at query time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub bounds: BoundingBox,
    pub center: LngLat,
}

impl Viewport {
    pub const fn new(bounds: BoundingBox, center: LngLat) -> Self {
        Self { bounds, center }
    }

    /// Viewport whose center is the centroid of `bounds`.
    pub fn from_bounds(bounds: BoundingBox) -> Self {
        Self {
            bounds,
            center: bounds.centroid(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONDON: LngLat = LngLat::new(-0.1278, 51.5074);
    const PARIS: LngLat = LngLat::new(2.3522, 48.8566);

    #[test]
    fn test_haversine_known_distance() {
        let d = haversine_meters(LONDON, PARIS);
        // ~343.5 km
        assert!((d - 343_500.0).abs() < 1_500.0, "got {d}");
    }

    #[test]
    fn test_haversine_symmetry() {
        let pairs = [
            (LONDON, PARIS),
            (LngLat::new(179.9, 10.0), LngLat::new(-179.9, -10.0)),
            (LngLat::new(-74.006, 40.7128), LngLat::new(139.6503, 35.6762)),
        ];
        for (a, b) in pairs {
            assert_eq!(haversine_meters(a, b), haversine_meters(b, a));
        }
    }

    #[test]
    fn test_haversine_zero_for_same_point() {
        assert_eq!(haversine_meters(PARIS, PARIS), 0.0);
    }

    #[test]
    fn test_usable_coordinates() {
        assert!(LONDON.is_usable());
        assert!(!LngLat::new(0.0, 0.0).is_usable());
        assert!(!LngLat::new(f64::NAN, 1.0).is_usable());
        assert!(!LngLat::new(1.0, f64::INFINITY).is_usable());
        assert!(!LngLat::new(200.0, 10.0).is_usable());
        // One zero axis is a real place (equator / prime meridian)
        assert!(LngLat::new(0.0, 51.47).is_usable());
    }

    #[test]
    fn test_within_degrees() {
        let a = LngLat::new(10.0, 20.0);
        assert!(a.within_degrees(&LngLat::new(10.009, 19.991), 0.01));
        assert!(!a.within_degrees(&LngLat::new(10.02, 20.0), 0.01));
    }

    #[test]
    fn test_bounding_box_around_and_centroid() {
        let bbox = BoundingBox::around([LONDON, PARIS]).unwrap();
        assert_eq!(bbox.min_lng, LONDON.lng);
        assert_eq!(bbox.max_lng, PARIS.lng);
        assert_eq!(bbox.min_lat, PARIS.lat);
        assert_eq!(bbox.max_lat, LONDON.lat);
        assert!(bbox.contains(&bbox.centroid()));
        assert!(BoundingBox::around(std::iter::empty()).is_none());
    }

    #[test]
    fn test_query_values() {
        assert_eq!(LngLat::new(1.5, -2.0).to_query_value(), "1.5,-2");
        assert_eq!(
            BoundingBox::new(1.0, 2.0, 3.0, 4.0).to_query_value(),
            "1,2,3,4"
        );
    }
}
