//! Viewer state: the scene, the camera and the drill trajectory shown in it.
//!
//! The viewer is driven entirely by calls from its owner (the terminal app):
//! incoming `drill_state` payloads, connection status changes and user
//! controls. It never touches the network itself.

pub mod camera;

pub use camera::{Camera, CameraView};

use crate::client::ViewerEvent;
use crate::geo::Position;
use crate::ipc::{parse_server_message, DrillState, ServerMessage};
use crate::scene::{
    circle_shape, Color, Entity, EntityCollection, EntityId, LabelGraphics, LabelStyle,
    PointGraphics, PolylineVolumeGraphics, VerticalOrigin,
};
use chrono::{DateTime, Local};
use std::time::Duration;

pub const BIT_ENTITY_NAME: &str = "Drill bit";
pub const PIPE_ENTITY_NAME: &str = "Drill pipe";

/// Vertices in the pipe cross-section.
pub const PIPE_SEGMENTS: usize = 32;
/// Diameters below this are clamped up, in metres.
pub const MIN_PIPE_DIAMETER: f64 = 0.05;
pub const DEFAULT_PIPE_DIAMETER: f64 = 0.3;
pub const DEFAULT_PIPE_COLOR: &str = "#00ff66";
const PIPE_ALPHA: f32 = 0.95;
const PIPE_OUTLINE_ALPHA: f32 = 0.4;

const PIPE_FLIGHT: Duration = Duration::from_millis(1200);
const BIT_FLIGHT: Duration = Duration::from_millis(1500);

pub const STATUS_NOT_CONNECTED: &str = "Not connected";
pub const STATUS_CONNECTED: &str = "Connected";
pub const STATUS_DISCONNECTED: &str = "Disconnected";
pub const STATUS_CONNECTION_ERROR: &str = "Connection error";

/// Initial camera: above the field, looking north and down.
pub fn initial_view() -> CameraView {
    CameraView::new(Position::new(50.0, 25.0, 5000.0), 0.0, -30.0)
}

/// User-adjustable pipe appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct PipeSettings {
    /// Requested diameter in metres. Rendered as at least [`MIN_PIPE_DIAMETER`].
    pub diameter: f64,
    /// CSS colour string.
    pub color: String,
}

impl Default for PipeSettings {
    fn default() -> Self {
        Self {
            diameter: DEFAULT_PIPE_DIAMETER,
            color: DEFAULT_PIPE_COLOR.to_string(),
        }
    }
}

impl PipeSettings {
    pub fn effective_diameter(&self) -> f64 {
        self.diameter.max(MIN_PIPE_DIAMETER)
    }

    pub fn radius(&self) -> f64 {
        self.effective_diameter() / 2.0
    }
}

pub struct Viewer {
    entities: EntityCollection,
    camera: Camera,
    bit: Option<EntityId>,
    pipe: Option<EntityId>,
    path: Vec<Position>,
    md: Option<f64>,
    settings: PipeSettings,
    status: String,
    last_update: Option<DateTime<Local>>,
}

impl Viewer {
    pub fn new(settings: PipeSettings) -> Self {
        Self {
            entities: EntityCollection::new(),
            camera: Camera::new(initial_view()),
            bit: None,
            pipe: None,
            path: Vec::new(),
            md: None,
            settings,
            status: STATUS_NOT_CONNECTED.to_string(),
            last_update: None,
        }
    }

    pub fn entities(&self) -> &EntityCollection {
        &self.entities
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn bit_entity(&self) -> Option<&Entity> {
        self.bit.and_then(|id| self.entities.get(id))
    }

    pub fn pipe_entity(&self) -> Option<&Entity> {
        self.pipe.and_then(|id| self.entities.get(id))
    }

    pub fn bit_position(&self) -> Option<Position> {
        self.bit_entity().and_then(|e| e.position)
    }

    pub fn path(&self) -> &[Position] {
        &self.path
    }

    pub fn md(&self) -> Option<f64> {
        self.md
    }

    pub fn settings(&self) -> &PipeSettings {
        &self.settings
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn last_update(&self) -> Option<DateTime<Local>> {
        self.last_update
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        tracing::debug!(status = %self.status, "viewer status");
    }

    /// Applies a socket event from the subscription task.
    pub fn apply_event(&mut self, event: ViewerEvent) {
        match event {
            ViewerEvent::Connected => self.set_status(STATUS_CONNECTED),
            ViewerEvent::Message(line) => self.handle_message(&line),
            ViewerEvent::Disconnected => self.set_status(STATUS_DISCONNECTED),
            ViewerEvent::Error(reason) => {
                tracing::warn!(%reason, "connection error");
                self.set_status(STATUS_CONNECTION_ERROR);
            }
            ViewerEvent::ConnectFailed(reason) => {
                self.set_status(format!("Connection failed: {}", reason));
            }
        }
    }

    /// Parses one pushed line and applies it.
    ///
    /// Unknown message types are ignored. A line that fails to parse leaves
    /// the scene untouched and is reported through the status text.
    pub fn handle_message(&mut self, line: &str) {
        match parse_server_message(line) {
            Ok(ServerMessage::DrillState(payload)) => self.apply_drill_state(payload),
            Ok(ServerMessage::Other(kind)) => {
                tracing::trace!(%kind, "ignoring message");
            }
            Err(e) => {
                tracing::warn!(error = %e, "bad message");
                self.set_status(format!("Message error: {}", e));
            }
        }
    }

    /// Applies a `drill_state` payload.
    ///
    /// A non-empty path replaces the stored path and rebuilds the pipe; an
    /// empty or absent path keeps the previous one. The bit entity is created
    /// on first sight and moved afterwards.
    pub fn apply_drill_state(&mut self, payload: Option<DrillState>) {
        let Some(state) = payload else {
            return;
        };
        self.last_update = Some(Local::now());

        if let Some(path) = state.path.filter(|p| !p.is_empty()) {
            self.path = path;
            self.refresh_pipe();
        }

        if let Some(bit) = state.bit {
            self.place_bit(bit);
        }

        if let Some(md) = state.md {
            self.md = Some(md);
        }
    }

    fn place_bit(&mut self, position: Position) {
        if let Some(entity) = self.bit.and_then(|id| self.entities.get_mut(id)) {
            entity.position = Some(position);
            return;
        }
        let id = self.entities.add(bit_entity(position));
        self.bit = Some(id);
    }

    /// Rebuilds the pipe from the stored path and flies to it.
    ///
    /// The old pipe is always removed. Nothing is added for fewer than two
    /// points.
    pub fn refresh_pipe(&mut self) {
        if let Some(id) = self.pipe.take() {
            self.entities.remove(id);
        }
        if self.path.len() < 2 {
            return;
        }

        let material = match Color::from_css_color_string(&self.settings.color) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, "falling back to default pipe colour");
                Color::from_css_color_string(DEFAULT_PIPE_COLOR).unwrap_or(Color::WHITE)
            }
        };

        let mut entity = Entity::new(PIPE_ENTITY_NAME);
        entity.polyline_volume = Some(PolylineVolumeGraphics::new(
            self.path.clone(),
            circle_shape(self.settings.radius(), PIPE_SEGMENTS),
            material.with_alpha(PIPE_ALPHA),
            Color::BLACK.with_alpha(PIPE_OUTLINE_ALPHA),
        ));
        self.camera.fly_to_entity(&entity, PIPE_FLIGHT);
        self.pipe = Some(self.entities.add(entity));
        tracing::debug!(points = self.path.len(), "pipe rebuilt");
    }

    /// Removes the pipe and forgets the path. The bit stays.
    pub fn clear_trajectory(&mut self) {
        if let Some(id) = self.pipe.take() {
            self.entities.remove(id);
        }
        self.path.clear();
        tracing::debug!("trajectory cleared");
    }

    /// Flies to the bit, if there is one.
    pub fn fly_to_bit(&mut self) {
        if let Some(id) = self.bit {
            if let Some(entity) = self.entities.get(id) {
                self.camera.fly_to_entity(entity, BIT_FLIGHT);
            }
        }
    }

    /// Sets the pipe diameter in metres and rebuilds the pipe.
    pub fn set_pipe_diameter(&mut self, diameter: f64) {
        if !diameter.is_finite() {
            self.set_status(format!("Invalid diameter: {}", diameter));
            return;
        }
        self.settings.diameter = diameter;
        self.refresh_pipe();
    }

    /// Sets the pipe colour from a CSS string and rebuilds the pipe.
    ///
    /// An unparseable colour keeps the previous one.
    pub fn set_pipe_color(&mut self, css: &str) {
        if let Err(e) = Color::from_css_color_string(css) {
            self.set_status(format!("Invalid colour: {}", e.0));
            return;
        }
        self.settings.color = css.trim().to_string();
        self.refresh_pipe();
    }
}

fn bit_entity(position: Position) -> Entity {
    Entity {
        name: BIT_ENTITY_NAME.to_string(),
        position: Some(position),
        point: Some(PointGraphics {
            pixel_size: 12.0,
            color: Color::YELLOW,
            outline_color: Color::BLACK,
            outline_width: 1.0,
        }),
        label: Some(LabelGraphics {
            text: BIT_ENTITY_NAME.to_string(),
            font: "14px sans-serif".to_string(),
            style: LabelStyle::FillAndOutline,
            outline_width: 2.0,
            vertical_origin: VerticalOrigin::Bottom,
            pixel_offset: (0.0, -16.0),
        }),
        polyline_volume: None,
    }
}
