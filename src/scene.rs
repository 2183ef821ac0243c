//! # Scene
//!
//! The meshes on the plate and their transforms

use crate::{
    config::PlateConfig,
    geo::{get_bounds, BoundingBox, Transform, Triangle3d},
    normalize::{normalize, NormalizeConfig, Normalized},
    placement::{find_free_cell, PlacementConfig},
    stl::{decode, MeshError},
    store::MeshFile,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SceneError {
    #[error("No mesh instance {0}")]
    UnknownInstance(InstanceId),
}

/// Filename plus load counter, unique for the life of a scene
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(String);

impl InstanceId {
    fn new(name: &str, load: u64) -> InstanceId { InstanceId(format!("{}#{}", name, load)) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "{}", self.0) }
}

pub struct MeshInstance {
    pub id: InstanceId,
    pub file: Arc<MeshFile>,
    pub transform: Transform,
    /// world space bounds for the current transform
    pub bounds: Option<BoundingBox>,
    pub normalized: Normalized,
    triangles: Arc<Vec<Triangle3d>>,
    local_bounds: BoundingBox,
}

impl MeshInstance {
    pub fn name(&self) -> &str { &self.file.name }

    /// Parsed and normalized triangles, before the instance transform
    pub fn triangles(&self) -> &Arc<Vec<Triangle3d>> { &self.triangles }

    fn update_bounds(&mut self) { self.bounds = Some(self.local_bounds.transformed(&self.transform.to_affine())); }
}

#[derive(Default)]
pub struct PlacementScene {
    instances: Vec<MeshInstance>,
    loads: u64,
    plate: PlateConfig,
    normalize: NormalizeConfig,
    placement: PlacementConfig,
}

impl PlacementScene {
    pub fn new(plate: PlateConfig, normalize: NormalizeConfig, placement: PlacementConfig) -> PlacementScene {
        PlacementScene {
            instances: Vec::new(),
            loads: 0,
            plate,
            normalize,
            placement,
        }
    }

    /// Parse, normalize and place a mesh. A mesh loaded under the same file
    /// name replaces the old instance. On a decode error the scene is left
    /// untouched.
    pub fn add(&mut self, file: Arc<MeshFile>) -> Result<InstanceId, MeshError> {
        let mut triangles = decode(&file.bytes)?;
        let normalized = normalize(&mut triangles, &self.normalize, &self.plate)?;
        let local_bounds = get_bounds(&triangles).ok_or(MeshError::Empty)?;

        self.remove(&file.name);
        self.loads += 1;
        let mut instance = MeshInstance {
            id: InstanceId::new(&file.name, self.loads),
            file,
            transform: Transform::default(),
            bounds: None,
            normalized,
            triangles: Arc::new(triangles),
            local_bounds,
        };
        instance.update_bounds();

        let placed: Vec<BoundingBox> = self.instances.iter().filter_map(|i| i.bounds).collect();
        if let Some(bounds) = instance.bounds {
            let placement = find_free_cell(&bounds, &placed, &self.placement);
            instance.transform.position += placement.offset;
            instance.update_bounds();
        }
        info!(
            "loaded {} with {} triangles as {}",
            instance.name(),
            instance.triangles.len(),
            instance.id
        );
        let id = instance.id.clone();
        self.instances.push(instance);
        Ok(id)
    }

    /// Drop the instance loaded from `name` along with its bounds
    pub fn remove(&mut self, name: &str) -> Option<MeshInstance> {
        let index = self.instances.iter().position(|i| i.name() == name)?;
        Some(self.instances.remove(index))
    }

    pub fn set_transform(&mut self, id: &InstanceId, transform: Transform) -> Result<(), SceneError> {
        let instance = self
            .instances
            .iter_mut()
            .find(|i| &i.id == id)
            .ok_or_else(|| SceneError::UnknownInstance(id.clone()))?;
        instance.transform = transform;
        instance.update_bounds();
        Ok(())
    }

    pub fn get(&self, id: &InstanceId) -> Option<&MeshInstance> { self.instances.iter().find(|i| &i.id == id) }

    pub fn by_name(&self, name: &str) -> Option<&MeshInstance> { self.instances.iter().find(|i| i.name() == name) }

    pub fn instances(&self) -> &[MeshInstance] { &self.instances }

    pub fn len(&self) -> usize { self.instances.len() }

    pub fn is_empty(&self) -> bool { self.instances.is_empty() }

    pub fn plate(&self) -> &PlateConfig { &self.plate }

    pub fn placement(&self) -> &PlacementConfig { &self.placement }
}
