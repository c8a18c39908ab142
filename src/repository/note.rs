use std::sync::Arc;

use crate::engine::EncryptedStore;
use crate::models::{Folder, Note};
use crate::Result;

/// Notes and the folders they are filed in.
///
/// Deleting a folder does not touch its notes; they keep the stale `folder_id`.
pub struct NoteRepository {
    store: Arc<EncryptedStore>,
}

impl NoteRepository {
    pub fn new(store: Arc<EncryptedStore>) -> Self {
        Self { store }
    }

    pub async fn save_note(&self, note: &Note) -> Result<()> {
        self.store.save(note).await
    }

    pub async fn get_note(&self, id: &str) -> Result<Option<Note>> {
        self.store.get(id).await
    }

    pub async fn get_all_notes(&self) -> Result<Vec<Note>> {
        self.store.get_all().await
    }

    pub async fn delete_note(&self, id: &str) -> Result<()> {
        self.store.delete::<Note>(id).await
    }

    /// Notes filed in `folder_id`, or unfiled notes for `None`.
    pub async fn notes_in_folder(&self, folder_id: Option<&str>) -> Result<Vec<Note>> {
        Ok(self
            .get_all_notes()
            .await?
            .into_iter()
            .filter(|n| n.folder_id.as_deref() == folder_id)
            .collect())
    }

    pub async fn save_folder(&self, folder: &Folder) -> Result<()> {
        self.store.save(folder).await
    }

    pub async fn get_all_folders(&self) -> Result<Vec<Folder>> {
        self.store.get_all().await
    }

    pub async fn delete_folder(&self, id: &str) -> Result<()> {
        self.store.delete::<Folder>(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::unlocked_store;

    #[tokio::test]
    async fn test_notes_and_folders() {
        let repo = NoteRepository::new(unlocked_store());
        let folder = Folder::new("Lectures");
        repo.save_folder(&folder).await.unwrap();

        let filed = Note::new("Week 1", "# Intro", Some(folder.id.clone()));
        let loose = Note::new("Scratch", "", None);
        repo.save_note(&filed).await.unwrap();
        repo.save_note(&loose).await.unwrap();

        assert_eq!(repo.get_note(&filed.id).await.unwrap(), Some(filed.clone()));
        assert_eq!(repo.notes_in_folder(Some(&folder.id)).await.unwrap(), vec![filed.clone()]);
        assert_eq!(repo.notes_in_folder(None).await.unwrap(), vec![loose.clone()]);

        repo.delete_folder(&folder.id).await.unwrap();
        assert!(repo.get_all_folders().await.unwrap().is_empty());
        assert_eq!(repo.get_all_notes().await.unwrap().len(), 2);

        repo.delete_note(&loose.id).await.unwrap();
        assert_eq!(repo.get_note(&loose.id).await.unwrap(), None);
    }
}
