//! Geodetic positions and WGS84 Cartesian conversion.
//!
//! Positions arrive as `(lon, lat, height)` in degrees and metres. The scene
//! works in Earth-centred, Earth-fixed (ECEF) metres so that tube geometry is
//! built in a single Cartesian frame.

/// WGS84 semi-major axis in metres.
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// WGS84 first eccentricity squared.
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

/// Geodetic position: longitude and latitude in degrees, height in metres
/// above the ellipsoid.
///
/// Serializes as a `[lon, lat, height]` array (see [`crate::ipc`]).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub lon: f64,
    pub lat: f64,
    pub height: f64,
}

impl Position {
    pub fn new(lon: f64, lat: f64, height: f64) -> Self {
        Self { lon, lat, height }
    }

    /// Returns `true` if all components are finite and lon/lat are in range.
    pub fn is_valid(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && self.height.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }

    /// Converts to ECEF Cartesian coordinates on the WGS84 ellipsoid.
    pub fn to_cartesian(&self) -> Cartesian3 {
        Cartesian3::from_degrees(self.lon, self.lat, self.height)
    }
}

/// ECEF point or vector in metres.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cartesian3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Cartesian3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    pub const UNIT_Z: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 1.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Geodetic degrees/metres to ECEF.
    pub fn from_degrees(lon_deg: f64, lat_deg: f64, height: f64) -> Self {
        let lon = lon_deg.to_radians();
        let lat = lat_deg.to_radians();
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_lon, cos_lon) = lon.sin_cos();
        let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        Self {
            x: (n + height) * cos_lat * cos_lon,
            y: (n + height) * cos_lat * sin_lon,
            z: (n * (1.0 - WGS84_E2) + height) * sin_lat,
        }
    }

    /// ECEF back to geodetic degrees/metres.
    ///
    /// Fixed-point iteration on latitude; converges to sub-millimetre height
    /// within a handful of steps for near-surface points.
    pub fn to_position(&self) -> Position {
        let p = (self.x * self.x + self.y * self.y).sqrt();
        let lon = self.y.atan2(self.x);
        let b = WGS84_A * (1.0 - WGS84_F);

        if p < 1e-9 {
            let lat = if self.z >= 0.0 { 90.0 } else { -90.0 };
            return Position::new(0.0, lat, self.z.abs() - b);
        }

        let mut lat = self.z.atan2(p * (1.0 - WGS84_E2));
        let mut height = 0.0;
        for _ in 0..8 {
            let sin_lat = lat.sin();
            let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
            height = p / lat.cos() - n;
            lat = self.z.atan2(p * (1.0 - WGS84_E2 * n / (n + height)));
        }

        Position::new(lon.to_degrees(), lat.to_degrees(), height)
    }

    pub fn add(self, o: Self) -> Self {
        Self::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }

    pub fn sub(self, o: Self) -> Self {
        Self::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }

    pub fn scale(self, k: f64) -> Self {
        Self::new(self.x * k, self.y * k, self.z * k)
    }

    pub fn dot(self, o: Self) -> f64 {
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    pub fn cross(self, o: Self) -> Self {
        Self::new(
            self.y * o.z - self.z * o.y,
            self.z * o.x - self.x * o.z,
            self.x * o.y - self.y * o.x,
        )
    }

    pub fn magnitude(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn distance(self, o: Self) -> f64 {
        self.sub(o).magnitude()
    }

    /// Unit vector in the same direction (returns zero if input is zero).
    pub fn normalize(self) -> Self {
        let m = self.magnitude();
        if m > 0.0 {
            self.scale(1.0 / m)
        } else {
            self
        }
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// Local east/north/up frame anchored at a geodetic origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnuFrame {
    pub origin: Cartesian3,
    pub east: Cartesian3,
    pub north: Cartesian3,
    pub up: Cartesian3,
}

impl EnuFrame {
    pub fn at(origin: Position) -> Self {
        let lon = origin.lon.to_radians();
        let lat = origin.lat.to_radians();
        let (sin_lat, cos_lat) = lat.sin_cos();
        let (sin_lon, cos_lon) = lon.sin_cos();
        Self {
            origin: origin.to_cartesian(),
            east: Cartesian3::new(-sin_lon, cos_lon, 0.0),
            north: Cartesian3::new(-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat),
            up: Cartesian3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat),
        }
    }

    /// Returns `[east, north, up]` offsets in metres from the frame origin.
    pub fn project(&self, p: Cartesian3) -> [f64; 3] {
        let d = p.sub(self.origin);
        [d.dot(self.east), d.dot(self.north), d.dot(self.up)]
    }
}

/// Sphere enclosing a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Cartesian3,
    pub radius: f64,
}

impl BoundingSphere {
    /// Sphere centred on the axis-aligned box of `points`. `None` when empty.
    pub fn from_points(points: &[Cartesian3]) -> Option<Self> {
        let first = *points.first()?;
        let (mut min, mut max) = (first, first);
        for p in &points[1..] {
            min = Cartesian3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z));
            max = Cartesian3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z));
        }
        let center = min.add(max).scale(0.5);
        let radius = points
            .iter()
            .map(|p| p.distance(center))
            .fold(0.0_f64, f64::max);
        Some(Self { center, radius })
    }
}
