//! Snapshot style file store. Every update returns a new store, so a
//! consumer holding an older snapshot never sees it change underneath it.

use std::sync::Arc;

/// An uploaded file, name plus contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl MeshFile {
    pub fn new<S: Into<String>>(name: S, bytes: Vec<u8>) -> MeshFile {
        MeshFile {
            name: name.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize { self.bytes.len() }

    pub fn is_empty(&self) -> bool { self.bytes.is_empty() }
}

#[derive(Debug, Clone, Default)]
pub struct FileStore {
    files: Vec<Arc<MeshFile>>,
    combined: Option<Arc<MeshFile>>,
}

impl FileStore {
    pub fn new() -> FileStore { FileStore::default() }

    /// Store with `file` added, a file with the same name is replaced in place
    ///
    /// # Examples
    ///
    /// ```
    /// use printer_plate::store::{FileStore, MeshFile};
    /// let store = FileStore::new()
    ///     .with_file(MeshFile::new("a.stl", vec![1]))
    ///     .with_file(MeshFile::new("b.stl", vec![2]));
    /// let replaced = store.with_file(MeshFile::new("a.stl", vec![3]));
    /// assert_eq!(replaced.names(), vec!["a.stl", "b.stl"]);
    /// assert_eq!(replaced.get("a.stl").unwrap().bytes, vec![3]);
    /// assert_eq!(store.get("a.stl").unwrap().bytes, vec![1]);
    /// ```
    pub fn with_file(&self, file: MeshFile) -> FileStore { self.with_shared(Arc::new(file)) }

    pub fn with_shared(&self, file: Arc<MeshFile>) -> FileStore {
        let mut files = self.files.clone();
        match files.iter().position(|f| f.name == file.name) {
            Some(index) => files[index] = file,
            None => files.push(file),
        }
        FileStore {
            files,
            combined: self.combined.clone(),
        }
    }

    pub fn without_file(&self, name: &str) -> FileStore {
        FileStore {
            files: self.files.iter().filter(|f| f.name != name).cloned().collect(),
            combined: self.combined.clone(),
        }
    }

    pub fn with_combined(&self, combined: Option<Arc<MeshFile>>) -> FileStore {
        FileStore {
            files: self.files.clone(),
            combined,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<MeshFile>> { self.files.iter().find(|f| f.name == name) }

    pub fn contains(&self, name: &str) -> bool { self.get(name).is_some() }

    pub fn names(&self) -> Vec<&str> { self.files.iter().map(|f| f.name.as_str()).collect() }

    pub fn files(&self) -> &[Arc<MeshFile>] { &self.files }

    pub fn combined(&self) -> Option<&Arc<MeshFile>> { self.combined.as_ref() }

    pub fn len(&self) -> usize { self.files.len() }

    pub fn is_empty(&self) -> bool { self.files.is_empty() }
}
