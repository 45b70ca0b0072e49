use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A file move performed by an action, replayed backwards on undo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMove {
    pub from: PathBuf,
    pub to: PathBuf,
}

impl FileMove {
    pub fn reversed(&self) -> FileMove {
        FileMove {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }
}

/// Rename `from` to `to`, falling back to copy and delete across devices.
/// Never overwrites an existing file.
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if to.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", to.display()),
        ));
    }
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) => {
            log::debug!(
                "rename {} -> {} failed ({}), copying instead",
                from.display(),
                to.display(),
                e
            );
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
    }
}

/// Engine-owned directory that deleted files are parked in until their undo
/// entry is dropped.
#[derive(Debug, Clone)]
pub struct Trash {
    dir: PathBuf,
}

impl Trash {
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn discard(&self, path: &Path) -> io::Result<FileMove> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        let to = self
            .dir
            .join(format!("{}-{}", Uuid::new_v4().simple(), name));
        move_file(path, &to)?;
        Ok(FileMove {
            from: path.to_path_buf(),
            to,
        })
    }

    pub fn holds(&self, path: &Path) -> bool {
        path.starts_with(&self.dir)
    }

    /// Permanently remove trashed files referenced by `moves`.
    pub fn purge(&self, moves: &[FileMove]) {
        for m in moves.iter().filter(|m| self.holds(&m.to)) {
            match fs::remove_file(&m.to) {
                Ok(()) => log::debug!("Purged {}", m.to.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => log::warn!("Failed to purge {}: {}", m.to.display(), e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discard_and_restore() {
        let temp_dir = TempDir::new().unwrap();
        let trash = Trash::new(temp_dir.path().join("trash")).unwrap();
        let file = temp_dir.path().join("photo.jpg");
        fs::write(&file, b"pixels").unwrap();

        let moved = trash.discard(&file).unwrap();
        assert!(!file.exists());
        assert!(moved.to.exists());
        assert!(trash.holds(&moved.to));

        let back = moved.reversed();
        move_file(&back.from, &back.to).unwrap();
        assert_eq!(fs::read(&file).unwrap(), b"pixels");
    }

    #[test]
    fn test_move_refuses_to_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.png");
        let b = temp_dir.path().join("b.png");
        fs::write(&a, b"a").unwrap();
        fs::write(&b, b"b").unwrap();

        let err = move_file(&a, &b).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert!(a.exists());
    }

    #[test]
    fn test_purge_only_touches_trash() {
        let temp_dir = TempDir::new().unwrap();
        let trash = Trash::new(temp_dir.path().join("trash")).unwrap();
        let file = temp_dir.path().join("x.bmp");
        let outside = temp_dir.path().join("y.bmp");
        fs::write(&file, b"x").unwrap();
        fs::write(&outside, b"y").unwrap();

        let moved = trash.discard(&file).unwrap();
        trash.purge(&[
            moved.clone(),
            FileMove {
                from: file.clone(),
                to: outside.clone(),
            },
        ]);
        assert!(!moved.to.exists());
        assert!(outside.exists());
    }
}
