//! Saved mind maps and the repositories that hold them.
//!
//! Every operation is scoped to an owner. A record that exists but belongs to
//! someone else is reported exactly like a missing one.

use crate::auth::UserId;
use crate::types::MindMapSnapshot;
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Identifier of a saved mind map.
pub type MindMapId = Uuid;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("mind map {0} not found")]
    NotFound(MindMapId),
    #[error("{0}")]
    Validation(String),
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage file is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

/// A mind map as stored in a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MindMap {
    pub id: MindMapId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Graph content
    pub data: MindMapSnapshot,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for [`MindMapRepository::create`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewMindMap {
    pub title: String,
    pub description: Option<String>,
    pub data: MindMapSnapshot,
}

/// Partial update. `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MindMapPatch {
    /// Blank titles are ignored
    pub title: Option<String>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    pub data: Option<MindMapSnapshot>,
}

/// Storage of saved mind maps, keyed by owner.
pub trait MindMapRepository: Send {
    /// All maps of `owner`, most recently updated first.
    fn list(&self, owner: UserId) -> Result<Vec<MindMap>>;

    fn get(&self, owner: UserId, id: MindMapId) -> Result<MindMap>;

    /// Stores a new map. Fails with `Validation` on a blank title.
    fn create(&mut self, owner: UserId, new: NewMindMap) -> Result<MindMap>;

    fn update(&mut self, owner: UserId, id: MindMapId, patch: MindMapPatch) -> Result<MindMap>;

    fn delete(&mut self, owner: UserId, id: MindMapId) -> Result<()>;
}

/// Repository kept entirely in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRepository {
    records: Vec<MindMap>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, owner: UserId, id: MindMapId) -> Result<usize> {
        self.records
            .iter()
            .position(|m| m.id == id && m.user_id == owner)
            .ok_or(PersistenceError::NotFound(id))
    }
}

impl MindMapRepository for InMemoryRepository {
    fn list(&self, owner: UserId) -> Result<Vec<MindMap>> {
        let mut maps: Vec<MindMap> = self
            .records
            .iter()
            .filter(|m| m.user_id == owner)
            .cloned()
            .collect();
        maps.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(maps)
    }

    fn get(&self, owner: UserId, id: MindMapId) -> Result<MindMap> {
        let index = self.position(owner, id)?;
        Ok(self.records[index].clone())
    }

    fn create(&mut self, owner: UserId, new: NewMindMap) -> Result<MindMap> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(PersistenceError::Validation("title is required".into()));
        }
        let now = Utc::now();
        let map = MindMap {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: new.description,
            data: new.data,
            user_id: owner,
            created_at: now,
            updated_at: now,
        };
        debug!("created mind map {} for {}", map.id, owner);
        self.records.push(map.clone());
        Ok(map)
    }

    fn update(&mut self, owner: UserId, id: MindMapId, patch: MindMapPatch) -> Result<MindMap> {
        let index = self.position(owner, id)?;
        let map = &mut self.records[index];

        if let Some(title) = patch.title.as_deref().map(str::trim) {
            if !title.is_empty() {
                map.title = title.to_string();
            }
        }
        if let Some(description) = patch.description {
            map.description = description;
        }
        if let Some(data) = patch.data {
            map.data = data;
        }
        // Keep updates strictly ordered even within one clock tick.
        map.updated_at = Utc::now().max(map.updated_at + chrono::Duration::microseconds(1));
        Ok(map.clone())
    }

    fn delete(&mut self, owner: UserId, id: MindMapId) -> Result<()> {
        let index = self.position(owner, id)?;
        self.records.remove(index);
        debug!("deleted mind map {id}");
        Ok(())
    }
}

/// Repository persisted as a single pretty JSON file.
///
/// The file is read once on open; every mutation rewrites it.
#[derive(Debug)]
pub struct JsonFileRepository {
    path: PathBuf,
    inner: InMemoryRepository,
}

impl JsonFileRepository {
    /// Opens `path`, treating a missing file as an empty library.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        info!("opened mind map library at {}", path.display());
        Ok(Self {
            path,
            inner: InMemoryRepository { records },
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies `change` to a copy of the records and writes that copy out.
    /// The in-memory records are replaced only once the file is written.
    fn commit<T>(
        &mut self,
        change: impl FnOnce(&mut InMemoryRepository) -> Result<T>,
    ) -> Result<T> {
        let mut staged = self.inner.clone();
        let value = change(&mut staged)?;
        self.write_records(&staged.records)?;
        self.inner = staged;
        Ok(value)
    }

    /// Writes to a sibling temp file and renames it over the library file,
    /// so an interrupted write leaves the previous file intact.
    fn write_records(&self, records: &[MindMap]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(records)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, json)?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

impl MindMapRepository for JsonFileRepository {
    fn list(&self, owner: UserId) -> Result<Vec<MindMap>> {
        self.inner.list(owner)
    }

    fn get(&self, owner: UserId, id: MindMapId) -> Result<MindMap> {
        self.inner.get(owner, id)
    }

    fn create(&mut self, owner: UserId, new: NewMindMap) -> Result<MindMap> {
        self.commit(|records| records.create(owner, new))
    }

    fn update(&mut self, owner: UserId, id: MindMapId, patch: MindMapPatch) -> Result<MindMap> {
        self.commit(|records| records.update(owner, id, patch))
    }

    fn delete(&mut self, owner: UserId, id: MindMapId) -> Result<()> {
        self.commit(|records| records.delete(owner, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NodeRecord, Position};

    fn sample(title: &str) -> NewMindMap {
        NewMindMap {
            title: title.into(),
            description: Some("notes".into()),
            data: MindMapSnapshot {
                nodes: vec![NodeRecord::new("n1".into(), "Root", Position::default())],
                ..Default::default()
            },
        }
    }

    #[test]
    fn create_requires_title() {
        let mut repo = InMemoryRepository::new();
        let err = repo.create(Uuid::new_v4(), sample("   ")).unwrap_err();
        assert!(matches!(err, PersistenceError::Validation(_)));
    }

    #[test]
    fn records_are_scoped_to_their_owner() {
        let mut repo = InMemoryRepository::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let map = repo.create(alice, sample("Plan")).unwrap();

        assert_eq!(repo.get(alice, map.id).unwrap().title, "Plan");
        assert!(matches!(repo.get(bob, map.id), Err(PersistenceError::NotFound(_))));
        assert!(repo.list(bob).unwrap().is_empty());
        assert!(matches!(
            repo.delete(bob, map.id),
            Err(PersistenceError::NotFound(_))
        ));
        assert_eq!(repo.list(alice).unwrap().len(), 1);
    }

    #[test]
    fn update_keeps_title_when_blank() {
        let mut repo = InMemoryRepository::new();
        let owner = Uuid::new_v4();
        let map = repo.create(owner, sample("Plan")).unwrap();

        let updated = repo
            .update(
                owner,
                map.id,
                MindMapPatch {
                    title: Some("  ".into()),
                    description: Some(None),
                    data: Some(MindMapSnapshot::default()),
                },
            )
            .unwrap();
        assert_eq!(updated.title, "Plan");
        assert_eq!(updated.description, None);
        assert!(updated.data.nodes.is_empty());
        assert!(updated.updated_at > map.updated_at);
        assert_eq!(updated.created_at, map.created_at);
    }

    #[test]
    fn list_is_most_recent_first() {
        let mut repo = InMemoryRepository::new();
        let owner = Uuid::new_v4();
        let first = repo.create(owner, sample("First")).unwrap();
        let _second = repo.create(owner, sample("Second")).unwrap();
        repo.update(
            owner,
            first.id,
            MindMapPatch {
                title: Some("First again".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let titles: Vec<_> = repo
            .list(owner)
            .unwrap()
            .into_iter()
            .map(|m| m.title)
            .collect();
        assert_eq!(titles, ["First again", "Second"]);
    }

    #[test]
    fn record_json_uses_camel_case() {
        let mut repo = InMemoryRepository::new();
        let map = repo.create(Uuid::new_v4(), sample("Plan")).unwrap();
        let value = serde_json::to_value(&map).unwrap();
        assert!(value.get("userId").is_some());
        assert!(value.get("updatedAt").is_some());
        assert_eq!(value["data"]["nodes"][0]["label"], "Root");
    }

    #[test]
    fn json_file_repository_survives_reopen() {
        let path = std::env::temp_dir()
            .join(format!("mindmap-editor-{}", Uuid::new_v4()))
            .join("library.json");
        let owner = Uuid::new_v4();

        let mut repo = JsonFileRepository::open(&path).unwrap();
        assert!(repo.list(owner).unwrap().is_empty());
        let kept = repo.create(owner, sample("Kept")).unwrap();
        let dropped = repo.create(owner, sample("Dropped")).unwrap();
        repo.delete(owner, dropped.id).unwrap();

        let reopened = JsonFileRepository::open(&path).unwrap();
        assert_eq!(reopened.list(owner).unwrap(), vec![kept]);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn failed_write_leaves_records_unchanged() {
        let dir = std::env::temp_dir().join(format!("mindmap-editor-{}", Uuid::new_v4()));
        let path = dir.join("blocker").join("library.json");
        let owner = Uuid::new_v4();

        let mut repo = JsonFileRepository::open(&path).unwrap();
        let kept = repo.create(owner, sample("Kept")).unwrap();

        // Replace the library directory with a plain file so writes fail.
        std::fs::remove_dir_all(dir.join("blocker")).unwrap();
        std::fs::write(dir.join("blocker"), "not a directory").unwrap();

        assert!(repo.create(owner, sample("Phantom")).is_err());
        assert!(repo.delete(owner, kept.id).is_err());
        let patch = MindMapPatch {
            title: Some("Renamed".into()),
            ..Default::default()
        };
        assert!(repo.update(owner, kept.id, patch).is_err());
        assert_eq!(repo.list(owner).unwrap(), vec![kept]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn writes_leave_no_temp_file_behind() {
        let dir = std::env::temp_dir().join(format!("mindmap-editor-{}", Uuid::new_v4()));
        let path = dir.join("library.json");
        let owner = Uuid::new_v4();

        let mut repo = JsonFileRepository::open(&path).unwrap();
        repo.create(owner, sample("First")).unwrap();
        repo.create(owner, sample("Second")).unwrap();

        let names: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("library.json")]);
        assert_eq!(JsonFileRepository::open(&path).unwrap().list(owner).unwrap().len(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
