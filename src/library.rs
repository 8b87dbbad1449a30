//! Saved-map library bound to an editing store.
//!
//! [`Library`] authenticates the caller, then moves snapshots between a
//! [`MindMapRepository`] and a live [`MindMapStore`]. A failed call never
//! touches the store.

use crate::auth::{AuthError, Authenticator, SessionStore, SessionToken, UserId};
use crate::persistence::{
    MindMap, MindMapId, MindMapPatch, MindMapRepository, NewMindMap, PersistenceError,
};
use crate::store::MindMapStore;
use log::info;

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

pub type Result<T> = std::result::Result<T, LibraryError>;

/// Title and description to save the current map under.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveRequest {
    /// Existing map to overwrite; `None` creates a new one
    pub id: Option<MindMapId>,
    pub title: String,
    pub description: Option<String>,
}

pub struct Library {
    repository: Box<dyn MindMapRepository>,
    sessions: SessionStore,
}

impl Library {
    pub fn new(repository: Box<dyn MindMapRepository>) -> Self {
        Self {
            repository,
            sessions: SessionStore::new(),
        }
    }

    /// Starts a session for `user` and returns its token.
    pub fn sign_in(&mut self, user: UserId) -> SessionToken {
        self.sessions.issue(user)
    }

    pub fn sign_out(&mut self, token: &SessionToken) -> bool {
        self.sessions.revoke(token)
    }

    /// The caller's maps, most recently updated first.
    pub fn list(&self, token: &SessionToken) -> Result<Vec<MindMap>> {
        let owner = self.sessions.authenticate(token)?;
        Ok(self.repository.list(owner)?)
    }

    /// Loads map `id` into `store`, replacing its content.
    pub fn open_into(
        &self,
        token: &SessionToken,
        id: MindMapId,
        store: &mut MindMapStore,
    ) -> Result<MindMap> {
        let owner = self.sessions.authenticate(token)?;
        let map = self.repository.get(owner, id)?;
        store.load_snapshot(map.data.clone());
        info!("opened mind map '{}' ({})", map.title, map.id);
        Ok(map)
    }

    /// Saves the store's current content, creating a new map when `request.id` is `None`.
    pub fn save_from(
        &mut self,
        token: &SessionToken,
        store: &MindMapStore,
        request: SaveRequest,
    ) -> Result<MindMap> {
        let owner = self.sessions.authenticate(token)?;
        let data = store.export_snapshot();
        let map = match request.id {
            None => self.repository.create(
                owner,
                NewMindMap {
                    title: request.title,
                    description: request.description,
                    data,
                },
            )?,
            Some(id) => self.repository.update(
                owner,
                id,
                MindMapPatch {
                    title: Some(request.title),
                    description: Some(request.description),
                    data: Some(data),
                },
            )?,
        };
        info!("saved mind map '{}' ({})", map.title, map.id);
        Ok(map)
    }

    pub fn delete(&mut self, token: &SessionToken, id: MindMapId) -> Result<()> {
        let owner = self.sessions.authenticate(token)?;
        Ok(self.repository.delete(owner, id)?)
    }
}
