//! # Workspace
//!
//! Owns every piece of state of a slicing session and wires the stages
//! together: intake, file store, placement scene, combiner, slicing client
//! and toolpath store.

use crate::{
    combine::{Combiner, COMBINED_NAME},
    config::{ParameterUpdate, PlateConfig, SlicingParameters},
    geo::Transform,
    intake::{accept_files, PreviewHandle, PreviewRegistry},
    normalize::NormalizeConfig,
    placement::PlacementConfig,
    scene::{InstanceId, PlacementScene},
    service::{slice_file_reporting, SlicingService},
    session::{SessionState, SlicingSession},
    stl::MeshError,
    store::{FileStore, MeshFile},
    toolpaths::{GcodeFile, ToolpathKey, ToolpathStore},
    viewer::Viewer,
    Error,
};
use log::{info, warn};
use std::{collections::HashMap, sync::Arc};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WorkspaceConfig {
    pub plate: PlateConfig,
    pub normalize: NormalizeConfig,
    pub placement: PlacementConfig,
}

/// Outcome of adding a batch of files
#[derive(Debug, Default)]
pub struct AddReport {
    pub added: Vec<InstanceId>,
    /// files that passed intake but couldn't be parsed
    pub rejected: Vec<(String, MeshError)>,
}

pub struct Workspace {
    files: FileStore,
    previews: PreviewRegistry,
    preview_handles: HashMap<String, PreviewHandle>,
    scene: PlacementScene,
    combiner: Combiner,
    parameters: SlicingParameters,
    session: SlicingSession,
    toolpaths: ToolpathStore,
}

impl Default for Workspace {
    fn default() -> Self { Workspace::new(WorkspaceConfig::default()) }
}

impl Workspace {
    pub fn new(config: WorkspaceConfig) -> Workspace {
        Workspace {
            files: FileStore::new(),
            previews: PreviewRegistry::new(),
            preview_handles: HashMap::new(),
            scene: PlacementScene::new(config.plate, config.normalize, config.placement),
            combiner: Combiner::new(),
            parameters: SlicingParameters::default(),
            session: SlicingSession::new(),
            toolpaths: ToolpathStore::new(),
        }
    }

    /// Take in a user selection. Non mesh files are dropped, when nothing is
    /// left the workspace is unchanged and an intake error is returned.
    pub fn add_files(&mut self, files: Vec<MeshFile>) -> Result<AddReport, Error> {
        let accepted = accept_files(files, &mut self.previews)?;
        let mut report = AddReport::default();
        for accepted in accepted {
            let file = Arc::new(accepted.file);
            match self.scene.add(file.clone()) {
                Ok(id) => {
                    if let Some(old) = self.preview_handles.insert(file.name.clone(), accepted.preview) {
                        self.previews.revoke(old);
                    }
                    self.files = self.files.with_shared(file);
                    report.added.push(id);
                },
                Err(e) => {
                    warn!("couldn't load {}: {}", file.name, e);
                    self.previews.revoke(accepted.preview);
                    report.rejected.push((file.name.clone(), e));
                },
            }
        }
        if !report.added.is_empty() {
            self.refresh_combined();
        }
        Ok(report)
    }

    /// Forget a file, its mesh instance and its preview
    pub fn remove_file(&mut self, name: &str) -> bool {
        if !self.files.contains(name) {
            return false;
        }
        self.files = self.files.without_file(name);
        self.scene.remove(name);
        if let Some(handle) = self.preview_handles.remove(name) {
            self.previews.revoke(handle);
        }
        // the merged plate changes too, its old toolpath can't be reused
        self.toolpaths.remove(name);
        self.toolpaths.remove(COMBINED_NAME);
        info!("removed {}", name);
        self.refresh_combined();
        true
    }

    pub fn set_transform(&mut self, id: &InstanceId, transform: Transform) -> Result<(), Error> {
        self.scene.set_transform(id, transform)?;
        self.refresh_combined();
        Ok(())
    }

    fn refresh_combined(&mut self) {
        let combined = self.combiner.combine(&self.scene).map(Arc::new);
        self.files = self.files.with_combined(combined);
    }

    pub fn update_parameters(&mut self, update: ParameterUpdate) -> Result<&SlicingParameters, Error> {
        self.parameters = self.parameters.update(update)?;
        Ok(&self.parameters)
    }

    /// Slice the merged plate
    pub fn slice<S: SlicingService + ?Sized>(&mut self, service: &S) -> Result<Arc<GcodeFile>, Error> {
        let file = self.files.combined().cloned().ok_or(Error::NothingToSlice)?;
        self.run_slice(service, &file)
    }

    /// Slice a single uploaded file on its own
    pub fn slice_single<S: SlicingService + ?Sized>(&mut self, service: &S, name: &str) -> Result<Arc<GcodeFile>, Error> {
        let file = self.files.get(name).cloned().ok_or(Error::NothingToSlice)?;
        self.run_slice(service, &file)
    }

    fn run_slice<S: SlicingService + ?Sized>(&mut self, service: &S, file: &MeshFile) -> Result<Arc<GcodeFile>, Error> {
        let key = ToolpathKey::new(&file.name, &file.bytes, &self.parameters);
        let ticket = self.session.begin();
        if let Some(cached) = self.toolpaths.cached(&key).cloned() {
            info!("reusing toolpath {} for {}", cached.name, file.name);
            self.toolpaths.set_current(Some(cached.clone()));
            self.session.complete(ticket, cached.clone());
            return Ok(cached);
        }
        let session = &mut self.session;
        let sliced = slice_file_reporting(service, file, &self.parameters, |progress| {
            session.progress(&ticket, progress);
        });
        match sliced {
            Ok(gcode) => {
                let gcode = Arc::new(gcode);
                if self.session.complete(ticket, gcode.clone()) {
                    self.toolpaths.insert(key, gcode.clone());
                }
                Ok(gcode)
            },
            Err(e) => {
                warn!("slicing {} failed: {}", file.name, e);
                self.session.fail(ticket, e.to_string());
                Err(e.into())
            },
        }
    }

    pub fn cancel_slice(&mut self) { self.session.cancel(); }

    pub fn reset_slice(&mut self) { self.session.reset(); }

    /// Viewer for the current toolpath
    pub fn viewer(&self, width: u32, height: u32) -> Option<Viewer> {
        self.toolpaths.current().map(|file| Viewer::from_file(file, width, height))
    }

    pub fn files(&self) -> &FileStore { &self.files }

    pub fn scene(&self) -> &PlacementScene { &self.scene }

    pub fn combined(&self) -> Option<&Arc<MeshFile>> { self.files.combined() }

    pub fn parameters(&self) -> &SlicingParameters { &self.parameters }

    pub fn session(&self) -> &SessionState { self.session.state() }

    pub fn toolpaths(&self) -> &ToolpathStore { &self.toolpaths }

    pub fn previews(&self) -> &PreviewRegistry { &self.previews }

    pub fn preview(&self, name: &str) -> Option<&PreviewHandle> { self.preview_handles.get(name) }
}
