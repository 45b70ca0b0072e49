use crate::core::ResultRecord;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// A rejected pair (or a rejected defect when `second` is `None`), stored
/// with its paths in lexical order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MistakeKey {
    pub first: String,
    pub second: Option<String>,
}

impl MistakeKey {
    pub fn defect(path: &Path) -> Self {
        Self {
            first: path.to_string_lossy().into_owned(),
            second: None,
        }
    }

    pub fn pair(a: &Path, b: &Path) -> Self {
        let a = a.to_string_lossy().into_owned();
        let b = b.to_string_lossy().into_owned();
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self {
            first,
            second: Some(second),
        }
    }

    pub fn of(record: &ResultRecord) -> Self {
        match record {
            ResultRecord::Defect(d) => Self::defect(&d.image.path),
            ResultRecord::DuplPair(p) => Self::pair(&p.first.path, &p.second.path),
        }
    }
}

/// SQLite table of results the user marked as false positives.
pub struct MistakeStore {
    conn: Connection,
}

impl MistakeStore {
    pub fn open(path: &Path) -> rusqlite::Result<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> rusqlite::Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> rusqlite::Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS mistakes (
                first TEXT NOT NULL,
                second TEXT NOT NULL DEFAULT '',
                PRIMARY KEY (first, second)
            )",
            [],
        )?;
        Ok(Self { conn })
    }

    pub fn insert(&self, key: &MistakeKey) -> rusqlite::Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO mistakes (first, second) VALUES (?1, ?2)",
            params![key.first, key.second.as_deref().unwrap_or("")],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &MistakeKey) -> rusqlite::Result<()> {
        self.conn.execute(
            "DELETE FROM mistakes WHERE first = ?1 AND second = ?2",
            params![key.first, key.second.as_deref().unwrap_or("")],
        )?;
        Ok(())
    }

    pub fn contains(&self, key: &MistakeKey) -> rusqlite::Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM mistakes WHERE first = ?1 AND second = ?2",
                params![key.first, key.second.as_deref().unwrap_or("")],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn keys(&self) -> rusqlite::Result<HashSet<MistakeKey>> {
        let mut stmt = self.conn.prepare("SELECT first, second FROM mistakes")?;
        let rows = stmt.query_map([], |row| {
            let first: String = row.get(0)?;
            let second: String = row.get(1)?;
            Ok(MistakeKey {
                first,
                second: (!second.is_empty()).then_some(second),
            })
        })?;
        rows.collect()
    }

    pub fn len(&self) -> rusqlite::Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM mistakes", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn clear(&self) -> rusqlite::Result<()> {
        self.conn.execute("DELETE FROM mistakes", [])?;
        Ok(())
    }

    /// Write every key into a fresh database at `path`.
    pub fn save_to(&self, path: &Path) -> rusqlite::Result<()> {
        let keys = self.keys()?;
        let mut target = MistakeStore::open(path)?;
        let tx = target.conn.transaction()?;
        tx.execute("DELETE FROM mistakes", [])?;
        for key in &keys {
            tx.execute(
                "INSERT OR IGNORE INTO mistakes (first, second) VALUES (?1, ?2)",
                params![key.first, key.second.as_deref().unwrap_or("")],
            )?;
        }
        tx.commit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_pair_key_is_order_independent() {
        let a = MistakeKey::pair(Path::new("/b.png"), Path::new("/a.png"));
        let b = MistakeKey::pair(Path::new("/a.png"), Path::new("/b.png"));
        assert_eq!(a, b);
        assert_eq!(a.first, "/a.png");
    }

    #[test]
    fn test_insert_contains_remove() {
        let store = MistakeStore::in_memory().unwrap();
        let pair = MistakeKey::pair(Path::new("/x.jpg"), Path::new("/y.jpg"));
        let defect = MistakeKey::defect(Path::new("/z.jpg"));

        store.insert(&pair).unwrap();
        store.insert(&pair).unwrap();
        store.insert(&defect).unwrap();
        assert_eq!(store.len().unwrap(), 2);
        assert!(store.contains(&pair).unwrap());
        assert!(store.keys().unwrap().contains(&defect));

        store.remove(&pair).unwrap();
        assert!(!store.contains(&pair).unwrap());

        store.clear().unwrap();
        assert_eq!(store.len().unwrap(), 0);
    }

    #[test]
    fn test_save_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("mistakes.db");

        let store = MistakeStore::in_memory().unwrap();
        store
            .insert(&MistakeKey::pair(Path::new("/a"), Path::new("/b")))
            .unwrap();
        store.save_to(&path).unwrap();

        let reopened = MistakeStore::open(&path).unwrap();
        assert_eq!(reopened.len().unwrap(), 1);
    }
}
