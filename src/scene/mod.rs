//! Scene model: a flat collection of named entities with optional point,
//! label and polyline-volume graphics.

pub mod color;
pub mod tube;

pub use color::{Color, ParseColorError};
pub use tube::{build_tube_mesh, circle_shape, TubeError, TubeMesh};

use crate::geo::{BoundingSphere, Cartesian3, Position};

/// Identifier handed out by [`EntityCollection::add`]. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Screen-space point marker.
#[derive(Debug, Clone, PartialEq)]
pub struct PointGraphics {
    pub pixel_size: f64,
    pub color: Color,
    pub outline_color: Color,
    pub outline_width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStyle {
    Fill,
    Outline,
    FillAndOutline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalOrigin {
    Center,
    Bottom,
    Top,
}

/// Text drawn next to an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelGraphics {
    pub text: String,
    pub font: String,
    pub style: LabelStyle,
    pub outline_width: f64,
    pub vertical_origin: VerticalOrigin,
    /// Offset in pixels, `y` grows downwards.
    pub pixel_offset: (f64, f64),
}

/// A 2D shape swept along a list of positions.
#[derive(Debug, Clone, PartialEq)]
pub struct PolylineVolumeGraphics {
    pub positions: Vec<Position>,
    pub shape: Vec<[f64; 2]>,
    pub material: Color,
    pub outline: bool,
    pub outline_color: Color,
    /// Mesh built from `positions` and `shape`. `None` when the path has
    /// fewer than two distinct points.
    pub mesh: Option<TubeMesh>,
}

impl PolylineVolumeGraphics {
    /// Builds the graphics and its mesh. A degenerate path still yields the
    /// graphics, with no mesh.
    pub fn new(
        positions: Vec<Position>,
        shape: Vec<[f64; 2]>,
        material: Color,
        outline_color: Color,
    ) -> Self {
        let mesh = match build_tube_mesh(&positions, &shape) {
            Ok(mesh) => Some(mesh),
            Err(e) => {
                tracing::debug!(error = %e, "tube mesh not built");
                None
            }
        };
        Self {
            positions,
            shape,
            material,
            outline: true,
            outline_color,
            mesh,
        }
    }
}

/// Something placed in the scene.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Entity {
    pub name: String,
    pub position: Option<Position>,
    pub point: Option<PointGraphics>,
    pub label: Option<LabelGraphics>,
    pub polyline_volume: Option<PolylineVolumeGraphics>,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sphere around everything the entity draws, used to frame the camera.
    pub fn bounding_sphere(&self) -> Option<BoundingSphere> {
        let mut points: Vec<Cartesian3> = Vec::new();
        if let Some(p) = self.position {
            points.push(p.to_cartesian());
        }
        if let Some(volume) = &self.polyline_volume {
            points.extend(volume.positions.iter().map(Position::to_cartesian));
        }
        BoundingSphere::from_points(&points)
    }
}

/// Entities in insertion order.
#[derive(Debug, Default)]
pub struct EntityCollection {
    entities: Vec<(EntityId, Entity)>,
    next_id: u64,
}

impl EntityCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entity: Entity) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        tracing::trace!(%id, name = %entity.name, "entity added");
        self.entities.push((id, entity));
        id
    }

    /// Removes the entity. Returns `false` if it was not present.
    pub fn remove(&mut self, id: EntityId) -> bool {
        let before = self.entities.len();
        self.entities.retain(|(eid, _)| *eid != id);
        let removed = self.entities.len() != before;
        if removed {
            tracing::trace!(%id, "entity removed");
        }
        removed
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|(eid, _)| *eid == id)
            .map(|(_, e)| e)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities
            .iter_mut()
            .find(|(eid, _)| *eid == id)
            .map(|(_, e)| e)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter().map(|(id, e)| (*id, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_never_reused() {
        let mut scene = EntityCollection::new();
        let a = scene.add(Entity::new("a"));
        assert!(scene.remove(a));
        let b = scene.add(Entity::new("b"));
        assert_ne!(a, b);
        assert!(scene.get(a).is_none());
        assert_eq!(scene.get(b).map(|e| e.name.as_str()), Some("b"));
    }

    #[test]
    fn remove_missing_returns_false() {
        let mut scene = EntityCollection::new();
        let a = scene.add(Entity::new("a"));
        assert!(scene.remove(a));
        assert!(!scene.remove(a));
        assert!(scene.is_empty());
    }

    #[test]
    fn iter_keeps_insertion_order() {
        let mut scene = EntityCollection::new();
        scene.add(Entity::new("first"));
        scene.add(Entity::new("second"));
        let names: Vec<_> = scene.iter().map(|(_, e)| e.name.clone()).collect();
        assert_eq!(names, ["first", "second"]);
    }

    #[test]
    fn get_mut_moves_entity() {
        let mut scene = EntityCollection::new();
        let id = scene.add(Entity::new("bit"));
        scene.get_mut(id).unwrap().position = Some(Position::new(1.0, 2.0, 3.0));
        assert_eq!(scene.get(id).unwrap().position, Some(Position::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn degenerate_volume_has_no_mesh() {
        let p = Position::new(50.0, 25.0, 0.0);
        let volume = PolylineVolumeGraphics::new(
            vec![p, p],
            circle_shape(0.5, 8),
            Color::WHITE,
            Color::BLACK,
        );
        assert!(volume.mesh.is_none());
        assert!(volume.outline);
    }

    #[test]
    fn bounding_sphere_covers_volume() {
        let mut e = Entity::new("pipe");
        assert!(e.bounding_sphere().is_none());
        e.polyline_volume = Some(PolylineVolumeGraphics::new(
            vec![Position::new(50.0, 25.0, 0.0), Position::new(50.0, 25.0, -200.0)],
            circle_shape(0.5, 8),
            Color::WHITE,
            Color::BLACK,
        ));
        let sphere = e.bounding_sphere().unwrap();
        assert!((sphere.radius - 100.0).abs() < 1.0);
    }
}
