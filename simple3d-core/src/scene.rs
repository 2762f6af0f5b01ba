/// Pickable scene objects and ordered ray casting
use std::fmt;

use nalgebra::{Point3, Vector3};

use crate::error::{Error, Result};
use crate::shape::{Ray, Shape};
use crate::transform::Transform;

/// Stable identity key of a scene object. Ids are never reused within a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One ray intersection, in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub object: ObjectId,
    pub point: Point3<f32>,
    pub normal: Vector3<f32>,
    /// Distance from the ray origin
    pub distance: f32,
}

#[derive(Debug, Clone)]
pub struct SceneObject {
    pub id: ObjectId,
    pub name: String,
    pub shape: Shape,
    pub transform: Transform,
    pub visible: bool,
    pub pickable: bool,
}

impl SceneObject {
    /// Intersect a world-space ray with this object.
    ///
    /// The ray is carried into object space through the inverse model matrix,
    /// so rotation and non-uniform scale are both honoured.
    pub fn intersect(&self, ray: &Ray) -> Option<Hit> {
        let model = self.transform.model_matrix();
        let inverse = model.try_inverse()?;
        let local_origin = inverse.transform_point(&ray.origin);
        let local_direction = inverse.transform_vector(ray.direction.as_ref());

        let local = self.shape.intersect_local(&local_origin, &local_direction)?;
        let point = model.transform_point(&(local_origin + local_direction * local.t));
        // Normals go through the inverse transpose
        let normal = inverse.transpose().transform_vector(&local.normal);
        let normal = normal.try_normalize(f32::EPSILON).unwrap_or(local.normal);

        Some(Hit {
            object: self.id,
            point,
            normal,
            distance: (point - ray.origin).norm(),
        })
    }
}

/// Flat collection of pickable objects
#[derive(Debug, Default)]
pub struct Scene {
    objects: Vec<SceneObject>,
    next_id: u32,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object and return its identity key
    pub fn add(&mut self, name: impl Into<String>, shape: Shape, transform: Transform) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        let name = name.into();
        log::debug!("scene: added {name} as {id}");
        self.objects.push(SceneObject {
            id,
            name,
            shape,
            transform,
            visible: true,
            pickable: true,
        });
        id
    }

    /// Remove an object. Callers that registered event callbacks for it
    /// should also call `Dispatcher::unregister_all`.
    pub fn remove(&mut self, id: ObjectId) -> Option<SceneObject> {
        let index = self.objects.iter().position(|object| object.id == id)?;
        let removed = self.objects.remove(index);
        log::debug!("scene: removed {} ({id})", removed.name);
        Some(removed)
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|object| object.id == id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|object| object.id == id)
    }

    /// Like `get_mut`, but an unknown id is an error
    pub fn object_mut(&mut self, id: ObjectId) -> Result<&mut SceneObject> {
        self.get_mut(id).ok_or(Error::UnknownObject(id))
    }

    pub fn transform_mut(&mut self, id: ObjectId) -> Result<&mut Transform> {
        Ok(&mut self.object_mut(id)?.transform)
    }

    pub fn ids(&self) -> Vec<ObjectId> {
        self.objects.iter().map(|object| object.id).collect()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Every visible, pickable object the ray meets, nearest first
    pub fn cast_ray(&self, ray: &Ray) -> Vec<Hit> {
        let mut hits: Vec<Hit> = self
            .objects
            .iter()
            .filter(|object| object.visible && object.pickable)
            .filter_map(|object| object.intersect(ray))
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    /// Nearest visible object along the ray, regardless of pickability
    pub fn first_hit(&self, ray: &Ray) -> Option<Hit> {
        self.objects
            .iter()
            .filter(|object| object.visible)
            .filter_map(|object| object.intersect(ray))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}
