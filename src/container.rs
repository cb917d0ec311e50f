//! Containers are the files that stages read from and write to. A container is identified by
//! an integer id; its path is `<work_dir>/<prefix><id>`. The id `INPUT_ID` is reserved for the
//! original input.
//!
//! After every stage, `normalize()` renames the containers so their ids are `0..n`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{MRError, Result};
use crate::formats::lines::{self, LinesReader, LinesWriter};
use crate::parameters::MRParameters;
use crate::record_types::Record;

pub type ContainerId = i64;

/// Id of the input container; it is never renamed by `normalize()`.
pub const INPUT_ID: ContainerId = -1;

pub type ContainerReader = LinesReader<io::BufReader<fs::File>>;
pub type ContainerWriter = LinesWriter<io::BufWriter<fs::File>>;

/// Maps container ids to paths in one working directory.
#[derive(Clone, Debug)]
pub struct ContainerStore {
    dir: PathBuf,
    prefix: String,
}

impl ContainerStore {
    pub fn new<P: Into<PathBuf>>(dir: P, prefix: &str) -> ContainerStore {
        ContainerStore {
            dir: dir.into(),
            prefix: String::from(prefix),
        }
    }

    pub fn from_params(params: &MRParameters) -> ContainerStore {
        ContainerStore::new(params.work_dir.clone(), &params.container_prefix)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, id: ContainerId) -> PathBuf {
        self.dir.join(format!("{}{}", self.prefix, id))
    }

    pub fn input_path(&self) -> PathBuf {
        self.path(INPUT_ID)
    }

    /// Creates the working directory if it doesn't exist; with `clean`, removes every
    /// container in it except the input.
    pub fn create_or_clean(&self, clean: bool) -> Result<()> {
        let wd_err = |e| MRError::WorkDir {
            path: self.dir.clone(),
            source: e,
        };
        fs::create_dir_all(&self.dir).map_err(wd_err)?;
        if !clean {
            return Ok(());
        }
        for id in self.ids()? {
            self.delete(id)?;
        }
        Ok(())
    }

    /// Copies `src` into the input container slot.
    pub fn install_input<P: AsRef<Path>>(&self, src: P) -> Result<u64> {
        let src = src.as_ref();
        let n = fs::copy(src, self.input_path()).map_err(|e| MRError::io(src, e))?;
        info!("installed {:?} as input ({} bytes)", src, n);
        Ok(n)
    }

    pub fn exists(&self, id: ContainerId) -> bool {
        self.path(id).is_file()
    }

    pub fn open(&self, id: ContainerId) -> Result<ContainerReader> {
        let path = self.path(id);
        lines::new_from_file(&path).map_err(|e| MRError::io(path, e))
    }

    /// Creates (or truncates) a container for writing.
    pub fn create(&self, id: ContainerId) -> Result<ContainerWriter> {
        let path = self.path(id);
        LinesWriter::new_to_file(&path).map_err(|e| MRError::io(path, e))
    }

    /// Removes a container. Removing a container that doesn't exist is not an error.
    pub fn delete(&self, id: ContainerId) -> Result<()> {
        let path = self.path(id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MRError::io(path, e)),
        }
    }

    /// Loads all records of a container.
    pub fn read_all(&self, id: ContainerId) -> Result<Vec<Record>> {
        Ok(self.open(id)?.collect())
    }

    fn parse_id(&self, name: &str) -> Option<ContainerId> {
        if !name.starts_with(&self.prefix) {
            return None;
        }
        name[self.prefix.len()..].parse().ok()
    }

    /// Ids of all containers in the working directory except the input, in ascending order.
    /// Files not named like containers are ignored.
    pub fn ids(&self) -> Result<Vec<ContainerId>> {
        let dir = fs::read_dir(&self.dir).map_err(|e| MRError::io(&self.dir, e))?;
        let mut ids = Vec::new();

        for entry in dir {
            let entry = entry.map_err(|e| MRError::io(&self.dir, e))?;
            let name = entry.file_name();
            match self.parse_id(&name.to_string_lossy()) {
                Some(INPUT_ID) | None => continue,
                Some(id) => ids.push(id),
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn rename(&self, from: ContainerId, to: ContainerId) -> Result<()> {
        let (src, dst) = (self.path(from), self.path(to));
        fs::rename(&src, &dst).map_err(|e| MRError::io(src, e))
    }

    /// Renames containers so that their ids form the range `0..n`, keeping their relative
    /// order. Returns the number of renames performed; a directory that is already compact is
    /// left alone.
    ///
    /// Containers are first moved past the current maximum id, then compacted down, so that no
    /// rename ever overwrites another container.
    pub fn normalize(&self) -> Result<usize> {
        let ids = self.ids()?;
        let max_id = match ids.last() {
            None => return Ok(0),
            Some(&m) => m,
        };
        if ids[0] >= 0 && max_id == ids.len() as ContainerId - 1 {
            return Ok(0);
        }

        let base = max_id + 1;
        for (i, &id) in ids.iter().enumerate() {
            self.rename(id, base + i as ContainerId)?;
        }
        for i in 0..ids.len() {
            self.rename(base + i as ContainerId, i as ContainerId)?;
        }
        debug!("normalized {} containers in {:?}", ids.len(), self.dir);
        Ok(2 * ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(store: &ContainerStore, id: ContainerId, key: &str) {
        let mut w = store.create(id).unwrap();
        w.write_record(&Record::new(key, id)).unwrap();
    }

    fn store() -> (TempDir, ContainerStore) {
        let dir = TempDir::new().unwrap();
        let store = ContainerStore::new(dir.path(), "c");
        (dir, store)
    }

    #[test]
    fn test_paths() {
        let store = ContainerStore::new("/tmp/work", "c");
        assert_eq!(store.path(3), PathBuf::from("/tmp/work/c3"));
        assert_eq!(store.input_path(), PathBuf::from("/tmp/work/c-1"));
    }

    #[test]
    fn test_ids_skip_input_and_foreign_files() {
        let (_d, store) = store();
        touch(&store, INPUT_ID, "in");
        touch(&store, 4, "a");
        touch(&store, 2, "b");
        fs::write(store.dir().join("notes.txt"), "x").unwrap();
        fs::write(store.dir().join("cabc"), "x").unwrap();
        assert_eq!(store.ids().unwrap(), vec![2, 4]);
    }

    #[test]
    fn test_normalize_keeps_order() {
        let (_d, store) = store();
        touch(&store, INPUT_ID, "in");
        touch(&store, 3, "first");
        touch(&store, 4, "second");
        touch(&store, 10, "third");

        assert!(store.normalize().unwrap() > 0);
        assert_eq!(store.ids().unwrap(), vec![0, 1, 2]);
        assert_eq!(store.read_all(0).unwrap()[0].key, "first");
        assert_eq!(store.read_all(1).unwrap()[0].key, "second");
        assert_eq!(store.read_all(2).unwrap()[0].key, "third");
        assert_eq!(store.read_all(INPUT_ID).unwrap()[0].key, "in");
    }

    #[test]
    fn test_normalize_idempotent() {
        let (_d, store) = store();
        touch(&store, INPUT_ID, "in");
        touch(&store, 5, "a");
        touch(&store, 6, "b");

        assert_eq!(store.normalize().unwrap(), 4);
        assert_eq!(store.normalize().unwrap(), 0);
        assert_eq!(store.ids().unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_normalize_empty() {
        let (_d, store) = store();
        assert_eq!(store.normalize().unwrap(), 0);
    }

    #[test]
    fn test_create_or_clean_keeps_input() {
        let (d, _) = store();
        let store = ContainerStore::new(d.path().join("work"), "c");
        store.create_or_clean(true).unwrap();
        touch(&store, INPUT_ID, "in");
        touch(&store, 0, "a");
        touch(&store, 1, "b");

        store.create_or_clean(true).unwrap();
        assert!(store.ids().unwrap().is_empty());
        assert!(store.exists(INPUT_ID));
    }

    #[test]
    fn test_delete_missing() {
        let (_d, store) = store();
        assert!(store.delete(42).is_ok());
    }
}
