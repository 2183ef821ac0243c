use crate::config::{ParameterKey, SlicingParameters};
use log::debug;
use std::{borrow::Cow, collections::HashMap, sync::Arc};

/// G-code returned by the slicing service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcodeFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl GcodeFile {
    pub fn new<S: Into<String>>(name: S, bytes: Vec<u8>) -> GcodeFile {
        GcodeFile {
            name: name.into(),
            bytes,
        }
    }

    pub fn text(&self) -> Cow<str> { String::from_utf8_lossy(&self.bytes) }
}

/// Cache key, the same mesh sliced with the same parameters gives the same
/// toolpath
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToolpathKey {
    file: String,
    content: u64,
    parameters: ParameterKey,
}

impl ToolpathKey {
    pub fn new(file: &str, bytes: &[u8], parameters: &SlicingParameters) -> ToolpathKey {
        ToolpathKey {
            file: file.to_string(),
            content: fnv1a(bytes),
            parameters: parameters.key(),
        }
    }
}

// the combined mesh keeps its name as the plate changes, so the key has to
// look at the bytes too
fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(0x0100_0000_01b3)
    })
}

/// Latest toolpath per source file. Slicing a file again replaces its
/// entry, so at most one G-code buffer is kept for each name.
#[derive(Debug, Default)]
pub struct ToolpathStore {
    current: Option<Arc<GcodeFile>>,
    cache: HashMap<String, (ToolpathKey, Arc<GcodeFile>)>,
}

impl ToolpathStore {
    pub fn new() -> ToolpathStore { ToolpathStore::default() }

    pub fn current(&self) -> Option<&Arc<GcodeFile>> { self.current.as_ref() }

    pub fn set_current(&mut self, file: Option<Arc<GcodeFile>>) { self.current = file; }

    /// Toolpath for `key`, only when the file was last sliced with the same
    /// contents and parameters
    pub fn cached(&self, key: &ToolpathKey) -> Option<&Arc<GcodeFile>> {
        match self.cache.get(&key.file) {
            Some((cached, file)) if cached == key => Some(file),
            _ => None,
        }
    }

    /// Remember `file` for `key` and make it the current toolpath
    pub fn insert(&mut self, key: ToolpathKey, file: Arc<GcodeFile>) {
        if self.cache.contains_key(&key.file) {
            debug!("replacing toolpath of {}", key.file);
        }
        self.cache.insert(key.file.clone(), (key, file.clone()));
        self.current = Some(file);
    }

    /// Forget the toolpath sliced from `name`
    pub fn remove(&mut self, name: &str) -> bool { self.cache.remove(name).is_some() }

    pub fn len(&self) -> usize { self.cache.len() }

    pub fn is_empty(&self) -> bool { self.cache.is_empty() }
}
