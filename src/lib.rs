//! # printer_plate
//!
//! Prepares a build plate for 3d printing: STL files are loaded, placed on
//! the plate without overlapping, merged into a single mesh and sent to an
//! external slicing service. The G-code that comes back can be previewed
//! layer by layer.

pub mod combine;
pub mod config;
pub mod gcode;
pub mod geo;
pub mod intake;
pub mod normalize;
pub mod placement;
pub mod scene;
pub mod service;
pub mod session;
pub mod stl;
pub mod store;
pub mod toolpaths;
pub mod viewer;
pub mod workspace;

use thiserror::Error;

pub use workspace::{Workspace, WorkspaceConfig};

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Intake(#[from] intake::IntakeError),
    #[error(transparent)]
    Mesh(#[from] stl::MeshError),
    #[error(transparent)]
    Scene(#[from] scene::SceneError),
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Service(#[from] service::ServiceError),
    #[error("No mesh loaded to slice")]
    NothingToSlice,
    #[error("Couldn't read or write file")]
    IO(#[from] std::io::Error),
}
