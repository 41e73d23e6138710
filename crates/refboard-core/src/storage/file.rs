//! File-based board storage.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::board::Board;
use std::fs;
use std::path::{Path, PathBuf};

/// Extension of board files.
pub const BOARD_EXTENSION: &str = "sref";

/// Read a board from an arbitrary path.
pub fn read_board_file(path: &Path) -> StorageResult<Board> {
    let json = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound(path.display().to_string())
        } else {
            StorageError::Io(format!("Failed to read {}: {}", path.display(), e))
        }
    })?;
    let board = Board::from_json(&json).map_err(|e| {
        StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
    })?;
    log::info!("Loaded {} images from {}", board.len(), path.display());
    Ok(board)
}

/// Write a board to an arbitrary path.
///
/// The document goes to a sibling temp file first and is renamed into place,
/// so an existing file is never left half-written.
pub fn write_board_file(path: &Path, board: &Board) -> StorageResult<()> {
    let json = board
        .to_json()
        .map_err(|e| StorageError::Serialization(e.to_string()))?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, json)
        .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", tmp.display(), e)))?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(StorageError::Io(format!(
            "Failed to write {}: {}",
            path.display(),
            e
        )));
    }
    log::info!("Saved {} images to {}", board.len(), path.display());
    Ok(())
}

/// Stores each board as a `.sref` file in a directory.
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new file storage with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the default location.
    ///
    /// On Linux: `~/.local/share/refboard/boards/`
    /// On Windows: `%LOCALAPPDATA%\refboard\boards\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;

        Self::new(base.join("refboard").join("boards"))
    }

    /// File path for a board ID.
    pub fn board_path(&self, id: &str) -> PathBuf {
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.{}", safe_id, BOARD_EXTENSION))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Storage for FileStorage {
    fn save(&self, id: &str, board: &Board) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.board_path(id);
        let result = write_board_file(&path, board);
        Box::pin(async move { result })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Board>> {
        let path = self.board_path(id);
        let id_owned = id.to_string();

        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(id_owned));
            }
            read_board_file(&path)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.board_path(id);

        Box::pin(async move {
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let base = self.base_path.clone();

        Box::pin(async move {
            if !base.exists() {
                return Ok(vec![]);
            }

            let entries = fs::read_dir(&base)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

            let mut ids: Vec<String> = entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|e| e == BOARD_EXTENSION))
                .filter_map(|path| path.file_stem()?.to_str().map(str::to_string))
                .collect();
            ids.sort();
            Ok(ids)
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.board_path(id);
        Box::pin(async move { Ok(path.exists()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::test_support::entity;
    use crate::storage::block_on;
    use tempfile::tempdir;

    fn sample_board() -> Board {
        let mut board = Board::new();
        board.add(entity(10.0, 20.0, 4, 4).with_scale(1.5));
        board.add(entity(-5.0, 0.0, 2, 3).with_rotation(45.0));
        board
    }

    #[test]
    fn test_file_storage_save_load() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        let board = sample_board();

        block_on(storage.save("moodboard", &board)).unwrap();
        assert!(dir.path().join("moodboard.sref").exists());

        let loaded = block_on(storage.load("moodboard")).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.entities()[0].scale, 1.5);
        assert_eq!(loaded.entities()[1].rotation, 45.0);
    }

    #[test]
    fn test_file_storage_not_found() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        let result = block_on(storage.load("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_file_storage_list_only_boards() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.save("b", &Board::new())).unwrap();
        block_on(storage.save("a", &Board::new())).unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        assert_eq!(block_on(storage.list()).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_file_storage_delete() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.save("test", &Board::new())).unwrap();
        assert!(block_on(storage.exists("test")).unwrap());

        block_on(storage.delete("test")).unwrap();
        assert!(!block_on(storage.exists("test")).unwrap());
    }

    #[test]
    fn test_file_storage_sanitizes_id() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();

        block_on(storage.save("refs/faces:v2*", &sample_board())).unwrap();
        assert_eq!(
            storage.board_path("refs/faces:v2*"),
            dir.path().join("refs_faces_v2_.sref")
        );
        let loaded = block_on(storage.load("refs/faces:v2*")).unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_read_write_arbitrary_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("board.sref");

        write_board_file(&path, &sample_board()).unwrap();
        assert!(!dir.path().join("board.sref.tmp").exists());
        assert_eq!(read_board_file(&path).unwrap().len(), 2);

        // Overwrite replaces the previous contents
        write_board_file(&path, &Board::new()).unwrap();
        assert!(read_board_file(&path).unwrap().is_empty());
    }

    #[test]
    fn test_read_errors() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            read_board_file(&dir.path().join("missing.sref")),
            Err(StorageError::NotFound(_))
        ));

        let bad = dir.path().join("bad.sref");
        fs::write(&bad, "{ truncated").unwrap();
        assert!(matches!(read_board_file(&bad), Err(StorageError::Serialization(_))));
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no").join("such").join("board.sref");
        assert!(matches!(
            write_board_file(&path, &sample_board()),
            Err(StorageError::Io(_))
        ));
    }
}
