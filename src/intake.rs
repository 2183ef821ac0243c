use crate::store::MeshFile;
use log::debug;
use std::collections::HashSet;
use thiserror::Error;

pub const MESH_EXTENSION: &str = ".stl";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum IntakeError {
    #[error("Please upload an STL file")]
    NoMeshFiles,
}

/// Check the file name ends in `.stl`, ignoring case
///
/// # Examples
///
/// ```
/// use printer_plate::intake::is_mesh_file;
/// assert!(is_mesh_file("Benchy.STL"));
/// assert!(!is_mesh_file("benchy.obj"));
/// assert!(!is_mesh_file("stl"));
/// ```
pub fn is_mesh_file(name: &str) -> bool {
    name.len() > MESH_EXTENSION.len()
        && name.is_char_boundary(name.len() - MESH_EXTENSION.len())
        && name[name.len() - MESH_EXTENSION.len()..].eq_ignore_ascii_case(MESH_EXTENSION)
}

/// Revocable reference to a file's contents, handed to viewers in place of
/// the bytes themselves
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct PreviewHandle {
    id: u64,
    url: String,
}

impl PreviewHandle {
    pub fn id(&self) -> u64 { self.id }

    pub fn url(&self) -> &str { &self.url }
}

/// Tracks which preview handles are still alive
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    next_id: u64,
    live: HashSet<u64>,
}

impl PreviewRegistry {
    pub fn new() -> PreviewRegistry { PreviewRegistry::default() }

    pub fn create(&mut self, file: &MeshFile) -> PreviewHandle {
        self.next_id += 1;
        self.live.insert(self.next_id);
        PreviewHandle {
            id: self.next_id,
            url: format!("preview:{}/{}", self.next_id, file.name),
        }
    }

    /// Release a handle, returns false if it was already released
    pub fn revoke(&mut self, handle: PreviewHandle) -> bool {
        debug!("revoking preview {}", handle.url);
        self.live.remove(&handle.id)
    }

    pub fn is_live(&self, handle: &PreviewHandle) -> bool { self.live.contains(&handle.id) }

    /// Number of handles not yet revoked
    pub fn live(&self) -> usize { self.live.len() }
}

/// A file that passed intake along with its preview
#[derive(Debug)]
pub struct Accepted {
    pub file: MeshFile,
    pub preview: PreviewHandle,
}

/// Keep the mesh files out of a selection and create a preview for each,
/// nothing is created when no mesh file is present
pub fn accept_files(files: Vec<MeshFile>, previews: &mut PreviewRegistry) -> Result<Vec<Accepted>, IntakeError> {
    let total = files.len();
    let accepted: Vec<MeshFile> = files.into_iter().filter(|f| is_mesh_file(&f.name)).collect();
    if accepted.is_empty() {
        return Err(IntakeError::NoMeshFiles);
    }
    if accepted.len() < total {
        debug!("ignored {} files without the {} extension", total - accepted.len(), MESH_EXTENSION);
    }
    Ok(accepted
        .into_iter()
        .map(|file| {
            let preview = previews.create(&file);
            Accepted { file, preview }
        })
        .collect())
}
