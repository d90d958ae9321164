use std::io::Write;
use std::path::{Path, PathBuf};

use aerial_types::TileId;
use bytes::Bytes;
use log::debug;
use tempfile::NamedTempFile;

use super::TileCache;
use crate::error::AerialError;
use crate::source::SourceKey;

/// Stores the cached tiles as a set of files in the specified folder.
///
/// Each tile is stored at `<root>/<source hash>/<zoom>/<x>/<y>.<ext>`, so several tile sources can
/// share the same root folder. There is no index: an entry exists if its file exists.
///
/// Entries are written to a temporary file first and then renamed into place, so a reader never
/// sees a partially written tile even if several writers race for the same file.
///
/// Currently, there is no eviction mechanism.
#[derive(Debug, Clone)]
pub struct FileTileCache {
    folder_path: PathBuf,
}

impl FileTileCache {
    /// Creates a new instance. If the `path` directory doesn't exist, it will be created.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, AerialError> {
        ensure_folder_exists(path.as_ref()).map_err(|err| {
            debug!(
                "Failed to initialize file cache folder {:?}: {err}",
                path.as_ref()
            );
            AerialError::Io(err)
        })?;

        Ok(Self {
            folder_path: path.as_ref().into(),
        })
    }

    /// Root folder of the cache.
    pub fn root(&self) -> &Path {
        &self.folder_path
    }

    /// Path of the file for the given tile.
    pub fn file_path(&self, id: &TileId, source: &SourceKey) -> PathBuf {
        self.folder_path
            .join(source.hash())
            .join(id.zoom().to_string())
            .join(id.x().to_string())
            .join(format!("{}.{}", id.y(), source.extension()))
    }
}

impl TileCache for FileTileCache {
    fn has(&self, id: &TileId, source: &SourceKey) -> bool {
        self.file_path(id, source).is_file()
    }

    fn load(&self, id: &TileId, source: &SourceKey) -> Result<Bytes, AerialError> {
        let file_path = self.file_path(id, source);
        match std::fs::read(&file_path) {
            Ok(bytes) => Ok(bytes.into()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(AerialError::NotFound),
            Err(err) => {
                debug!("Failed to read cache file {file_path:?}: {err}");
                Err(err.into())
            }
        }
    }

    fn store(&self, id: &TileId, source: &SourceKey, data: &Bytes) -> Result<(), AerialError> {
        let file_path = self.file_path(id, source);
        let Some(folder) = file_path.parent() else {
            debug!("Failed to add tile {id} to the cache {file_path:?} - no parent folder");
            return Err(AerialError::NotFound);
        };

        if let Err(err) = ensure_folder_exists(folder) {
            debug!(
                "Failed to add tile {id} to the cache {file_path:?} - failed to create folder: {err:?}"
            );
            return Err(err.into());
        }

        debug!("Saving tile {id} to the cache file {file_path:?}");
        let mut file = NamedTempFile::new_in(folder)?;
        file.write_all(data)?;
        file.persist(&file_path).map_err(|err| err.error)?;
        debug!("Tile {id} saved to cache file {file_path:?}");

        Ok(())
    }
}

fn ensure_folder_exists(folder_path: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(folder_path)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    use super::*;
    use crate::source::TileSource;

    fn source() -> TileSource {
        TileSource::new("https://tile.example.com/{z}/{x}/{y}.jpg").unwrap()
    }

    #[test]
    fn stores_and_loads_tiles() {
        let dir = TempDir::new().unwrap();
        let cache = FileTileCache::new(dir.path()).unwrap();
        let id = TileId::new(19, 274589, 183553).unwrap();
        let source = source();
        let data = Bytes::from_static(b"not really a jpeg");

        assert!(!cache.has(&id, source.key()));
        cache.store(&id, source.key(), &data).unwrap();
        assert!(cache.has(&id, source.key()));
        assert_eq!(cache.load(&id, source.key()).unwrap(), data);
    }

    #[test]
    fn missing_tile_is_not_found() {
        let dir = TempDir::new().unwrap();
        let cache = FileTileCache::new(dir.path()).unwrap();
        let id = TileId::new(3, 1, 1).unwrap();

        assert_matches!(cache.load(&id, source().key()), Err(AerialError::NotFound));
    }

    #[test]
    fn file_layout() {
        let dir = TempDir::new().unwrap();
        let cache = FileTileCache::new(dir.path()).unwrap();
        let id = TileId::new(16, 34323, 22944).unwrap();
        let source = source();

        let expected = dir
            .path()
            .join(source.key().hash())
            .join("16")
            .join("34323")
            .join("22944.jpg");
        assert_eq!(cache.file_path(&id, source.key()), expected);
    }

    #[test]
    fn sources_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let cache = FileTileCache::new(dir.path()).unwrap();
        let id = TileId::new(5, 3, 4).unwrap();
        let first = source();
        let second = TileSource::new("https://other.example.com/{z}/{x}/{y}.jpg").unwrap();

        cache
            .store(&id, first.key(), &Bytes::from_static(b"first"))
            .unwrap();
        cache
            .store(&id, second.key(), &Bytes::from_static(b"second"))
            .unwrap();

        assert_eq!(cache.load(&id, first.key()).unwrap(), &b"first"[..]);
        assert_eq!(cache.load(&id, second.key()).unwrap(), &b"second"[..]);
    }

    #[test]
    fn overwrite_replaces_entry() {
        let dir = TempDir::new().unwrap();
        let cache = FileTileCache::new(dir.path()).unwrap();
        let id = TileId::new(5, 3, 4).unwrap();
        let source = source();

        cache
            .store(&id, source.key(), &Bytes::from_static(b"old"))
            .unwrap();
        cache
            .store(&id, source.key(), &Bytes::from_static(b"new"))
            .unwrap();

        assert_eq!(cache.load(&id, source.key()).unwrap(), &b"new"[..]);
    }

    #[test]
    fn creates_root_folder() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("nested").join("cache");
        let cache = FileTileCache::new(&root).unwrap();

        assert!(root.is_dir());
        assert_eq!(cache.root(), root);
    }
}
