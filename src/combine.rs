//! # Combine
//!
//! Merges every mesh on the plate into one binary STL. Each instance keeps a
//! cached copy of its transformed triangles, only instances whose transform
//! changed since the last merge are transformed again.

use crate::{
    geo::{Transform, Triangle3d},
    scene::{InstanceId, PlacementScene},
    stl::encode,
    store::MeshFile,
};
use log::debug;
use rayon::prelude::*;
use std::{collections::HashMap, sync::Arc};

pub const COMBINED_NAME: &str = "combined.stl";

struct Cached {
    source: Arc<Vec<Triangle3d>>,
    transform: Transform,
    transformed: Vec<Triangle3d>,
}

#[derive(Default)]
pub struct Combiner {
    cache: HashMap<InstanceId, Cached>,
    rebuilt: usize,
}

/// Transform used for the merged output, the mesh keeps its plate position
/// in x and y but its vertical offset is dropped
pub fn output_transform(transform: &Transform) -> Transform {
    let mut transform = *transform;
    transform.position.z = 0.;
    transform
}

impl Combiner {
    pub fn new() -> Combiner { Combiner::default() }

    /// Merge the scene into a single STL, `None` when the scene is empty
    pub fn combine(&mut self, scene: &PlacementScene) -> Option<MeshFile> {
        self.cache.retain(|id, _| scene.get(id).is_some());
        self.rebuilt = 0;
        if scene.is_empty() {
            return None;
        }

        for instance in scene.instances() {
            let transform = output_transform(&instance.transform);
            let fresh = match self.cache.get(&instance.id) {
                Some(cached) => cached.transform == transform && Arc::ptr_eq(&cached.source, instance.triangles()),
                None => false,
            };
            if fresh {
                continue;
            }
            let affine = transform.to_affine();
            let transformed = instance
                .triangles()
                .par_iter()
                .map(|tri| tri.transformed(&affine))
                .collect();
            self.rebuilt += 1;
            self.cache.insert(
                instance.id.clone(),
                Cached {
                    source: instance.triangles().clone(),
                    transform,
                    transformed,
                },
            );
        }

        let mut merged = Vec::new();
        for instance in scene.instances() {
            if let Some(cached) = self.cache.get(&instance.id) {
                merged.extend_from_slice(&cached.transformed);
            }
        }
        debug!(
            "merged {} instances into {} triangles, {} transformed",
            scene.len(),
            merged.len(),
            self.rebuilt
        );
        Some(MeshFile::new(COMBINED_NAME, encode(&merged)))
    }

    /// Number of instances transformed by the last merge
    pub fn rebuilt(&self) -> usize { self.rebuilt }

    pub fn cached(&self) -> usize { self.cache.len() }
}
