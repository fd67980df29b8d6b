//! Orbit-free camera with timed flights between views.

use crate::geo::{BoundingSphere, Cartesian3, EnuFrame, Position};
use crate::scene::Entity;
use std::time::{Duration, Instant};

/// Vertical field of view used to frame entities, in degrees.
pub const DEFAULT_FOV_DEG: f64 = 60.0;
/// Closest a framing flight will put the camera, in metres.
pub const MIN_FRAMING_RANGE: f64 = 50.0;
/// Pitch used when framing an entity, in degrees (negative looks down).
pub const FRAMING_PITCH_DEG: f64 = -30.0;

/// Where the camera is and which way it looks. Angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub position: Position,
    pub heading: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl CameraView {
    pub fn new(position: Position, heading: f64, pitch: f64) -> Self {
        Self {
            position,
            heading,
            pitch,
            roll: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Flight {
    from: CameraView,
    to: CameraView,
    start: Instant,
    duration: Duration,
}

#[derive(Debug, Clone)]
pub struct Camera {
    view: CameraView,
    flight: Option<Flight>,
    fov_deg: f64,
}

impl Camera {
    pub fn new(view: CameraView) -> Self {
        Self {
            view,
            flight: None,
            fov_deg: DEFAULT_FOV_DEG,
        }
    }

    pub fn view(&self) -> CameraView {
        self.view
    }

    /// Final view of the current flight, or the current view.
    pub fn destination(&self) -> CameraView {
        self.flight.map(|f| f.to).unwrap_or(self.view)
    }

    pub fn is_flying(&self) -> bool {
        self.flight.is_some()
    }

    /// Jumps to `view`, cancelling any flight.
    pub fn set_view(&mut self, view: CameraView) {
        self.flight = None;
        self.view = view;
    }

    /// Starts a flight from the current view. A zero duration jumps.
    pub fn fly_to(&mut self, destination: CameraView, duration: Duration) {
        self.fly_to_at(destination, duration, Instant::now());
    }

    pub(crate) fn fly_to_at(&mut self, destination: CameraView, duration: Duration, now: Instant) {
        if duration.is_zero() {
            self.set_view(destination);
            return;
        }
        tracing::debug!(
            lon = destination.position.lon,
            lat = destination.position.lat,
            height = destination.position.height,
            ?duration,
            "camera flight started"
        );
        self.flight = Some(Flight {
            from: self.view,
            to: destination,
            start: now,
            duration,
        });
    }

    /// Frames a bounding sphere: looks north, pitched down, from far enough
    /// away that the sphere fits the field of view.
    pub fn fly_to_bounding_sphere(&mut self, sphere: BoundingSphere, duration: Duration) {
        self.fly_to(framing_view(sphere, self.fov_deg), duration);
    }

    /// Frames an entity. Returns `false` (and stays put) when the entity has
    /// nothing to frame.
    pub fn fly_to_entity(&mut self, entity: &Entity, duration: Duration) -> bool {
        match entity.bounding_sphere() {
            Some(sphere) => {
                self.fly_to_bounding_sphere(sphere, duration);
                true
            }
            None => false,
        }
    }

    /// Advances the flight. Returns `true` while still flying.
    pub fn update(&mut self, now: Instant) -> bool {
        let Some(flight) = self.flight else {
            return false;
        };
        let elapsed = now.saturating_duration_since(flight.start);
        let t = (elapsed.as_secs_f64() / flight.duration.as_secs_f64()).min(1.0);
        if t >= 1.0 {
            self.view = flight.to;
            self.flight = None;
            return false;
        }
        self.view = interpolate(flight.from, flight.to, t);
        true
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Interpolates an angle along the shorter arc.
fn lerp_angle(a: f64, b: f64, t: f64) -> f64 {
    let delta = (b - a + 540.0).rem_euclid(360.0) - 180.0;
    (a + delta * t).rem_euclid(360.0)
}

fn interpolate(from: CameraView, to: CameraView, t: f64) -> CameraView {
    CameraView {
        position: Position::new(
            lerp(from.position.lon, to.position.lon, t),
            lerp(from.position.lat, to.position.lat, t),
            lerp(from.position.height, to.position.height, t),
        ),
        heading: lerp_angle(from.heading, to.heading, t),
        pitch: lerp(from.pitch, to.pitch, t),
        roll: lerp(from.roll, to.roll, t),
    }
}

/// Distance from the sphere centre that fits it in `fov_deg`.
pub fn framing_range(radius: f64, fov_deg: f64) -> f64 {
    let half = (fov_deg / 2.0).to_radians();
    (radius / half.sin()).max(MIN_FRAMING_RANGE)
}

fn framing_view(sphere: BoundingSphere, fov_deg: f64) -> CameraView {
    let range = framing_range(sphere.radius, fov_deg);
    let target = sphere.center.to_position();
    let frame = EnuFrame::at(target);
    let pitch = FRAMING_PITCH_DEG.to_radians();
    // Heading 0 looks north, so the camera sits south of and above the target.
    let back = frame.north.scale(-range * pitch.cos());
    let up = frame.up.scale(range * -pitch.sin());
    let eye: Cartesian3 = sphere.center.add(back).add(up);
    CameraView::new(eye.to_position(), 0.0, FRAMING_PITCH_DEG)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start_view() -> CameraView {
        CameraView::new(Position::new(50.0, 25.0, 5000.0), 0.0, -30.0)
    }

    #[test]
    fn flight_interpolates_and_finishes() {
        let mut cam = Camera::new(start_view());
        let t0 = Instant::now();
        let dest = CameraView::new(Position::new(52.0, 27.0, 1000.0), 90.0, -60.0);
        cam.fly_to_at(dest, Duration::from_secs(2), t0);
        assert!(cam.is_flying());
        assert_eq!(cam.destination(), dest);

        assert!(cam.update(t0 + Duration::from_secs(1)));
        let mid = cam.view();
        assert!((mid.position.lon - 51.0).abs() < 1e-9);
        assert!((mid.position.height - 3000.0).abs() < 1e-9);
        assert!((mid.heading - 45.0).abs() < 1e-9);
        assert!((mid.pitch + 45.0).abs() < 1e-9);

        assert!(!cam.update(t0 + Duration::from_secs(3)));
        assert_eq!(cam.view(), dest);
        assert!(!cam.is_flying());
    }

    #[test]
    fn zero_duration_jumps() {
        let mut cam = Camera::new(start_view());
        let dest = CameraView::new(Position::new(1.0, 2.0, 3.0), 0.0, 0.0);
        cam.fly_to(dest, Duration::ZERO);
        assert!(!cam.is_flying());
        assert_eq!(cam.view(), dest);
    }

    #[test]
    fn set_view_cancels_flight() {
        let mut cam = Camera::new(start_view());
        cam.fly_to(CameraView::new(Position::new(0.0, 0.0, 0.0), 0.0, 0.0), Duration::from_secs(5));
        cam.set_view(start_view());
        assert!(!cam.is_flying());
        assert_eq!(cam.view(), start_view());
    }

    #[test]
    fn heading_takes_short_way_round() {
        assert!((lerp_angle(350.0, 10.0, 0.5) - 0.0).abs() < 1e-9);
        assert!((lerp_angle(10.0, 350.0, 0.25) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn framing_range_has_floor() {
        assert_eq!(framing_range(1.0, 60.0), MIN_FRAMING_RANGE);
        assert!((framing_range(100.0, 60.0) - 200.0).abs() < 1e-9);
    }

    #[test]
    fn framing_view_is_south_and_above_target() {
        let target = Position::new(50.0, 25.0, -500.0);
        let sphere = BoundingSphere {
            center: target.to_cartesian(),
            radius: 100.0,
        };
        let view = framing_view(sphere, 60.0);
        assert_eq!(view.heading, 0.0);
        assert_eq!(view.pitch, FRAMING_PITCH_DEG);
        assert!(view.position.lat < target.lat);
        // range 200 m at 30 degrees down puts the eye 100 m higher
        assert!((view.position.height - (target.height + 100.0)).abs() < 0.5);
        let dist = view.position.to_cartesian().distance(sphere.center);
        assert!((dist - 200.0).abs() < 1e-3);
    }

    #[test]
    fn fly_to_entity_needs_geometry() {
        let mut cam = Camera::new(start_view());
        assert!(!cam.fly_to_entity(&Entity::new("empty"), Duration::from_secs(1)));
        assert!(!cam.is_flying());

        let mut bit = Entity::new("bit");
        bit.position = Some(Position::new(50.0, 25.0, -100.0));
        assert!(cam.fly_to_entity(&bit, Duration::from_secs(1)));
        assert!(cam.is_flying());
        assert!(cam.destination().position.lat < 25.0);
    }
}
