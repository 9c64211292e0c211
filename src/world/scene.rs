// Transform hierarchy kept in a `hecs::World`.
// Entities are the stable keys; a child stores a `Parent` back-pointer that
// is only ever used for lookup, never for ownership.

use glam::{Affine3A, Quat, Vec3};
use hecs::{Entity, World};

/// Local placement of one scene node.
#[derive(Clone, Debug, PartialEq)]
pub struct Transform {
    pub name: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    pub fn at(name: impl Into<String>, position: Vec3) -> Self {
        Self {
            position,
            ..Self::named(name)
        }
    }

    #[inline]
    pub fn local_to_parent(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Back-pointer to the node this transform is expressed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Parent(pub Entity);

/// Perspective camera attached to a transform; looks down its local -Z.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// vertical field of view, radians
    pub fovy: f32,
    pub near: f32,
}

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error(transparent)]
    Component(#[from] hecs::ComponentError),

    #[error(transparent)]
    NoSuchEntity(#[from] hecs::NoSuchEntity),

    #[error("parent chain starting at {0:?} never reaches a root")]
    Cycle(Entity),
}

#[derive(Default)]
pub struct Scene {
    world: World,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, transform: Transform) -> Entity {
        self.world.spawn((transform,))
    }

    pub fn spawn_child(&mut self, transform: Transform, parent: Entity) -> Entity {
        self.world.spawn((transform, Parent(parent)))
    }

    pub fn attach_camera(&mut self, entity: Entity, camera: Camera) -> Result<(), SceneError> {
        self.world.insert_one(entity, camera)?;
        Ok(())
    }

    /// First transform carrying `name`.
    pub fn find(&self, name: &str) -> Option<Entity> {
        self.world
            .query::<&Transform>()
            .iter()
            .find(|(_, t)| t.name == name)
            .map(|(e, _)| e)
    }

    pub fn transform(&self, entity: Entity) -> Result<hecs::Ref<'_, Transform>, SceneError> {
        Ok(self.world.get::<&Transform>(entity)?)
    }

    pub fn transform_mut(
        &self,
        entity: Entity,
    ) -> Result<hecs::RefMut<'_, Transform>, SceneError> {
        Ok(self.world.get::<&mut Transform>(entity)?)
    }

    pub fn camera(&self, entity: Entity) -> Result<Camera, SceneError> {
        Ok(*self.world.get::<&Camera>(entity)?)
    }

    /// Compose local transforms up the parent chain.
    pub fn local_to_world(&self, entity: Entity) -> Result<Affine3A, SceneError> {
        let mut acc = self.transform(entity)?.local_to_parent();
        let mut current = entity;

        // a well-formed chain visits each node at most once
        for _ in 0..self.world.len() {
            let parent = match self.world.entity(current)?.get::<&Parent>() {
                Some(p) => p.0,
                None => return Ok(acc),
            };
            acc = self.transform(parent)?.local_to_parent() * acc;
            current = parent;
        }
        Err(SceneError::Cycle(entity))
    }

    pub fn world_to_local(&self, entity: Entity) -> Result<Affine3A, SceneError> {
        Ok(self.local_to_world(entity)?.inverse())
    }
}
