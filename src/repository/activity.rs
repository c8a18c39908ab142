use std::sync::Arc;

use crate::engine::EncryptedStore;
use crate::models::ActivityLog;
use crate::{Error, Result};

/// Append-only access to the activity history. There is no update or delete.
pub struct ActivityRepository {
    store: Arc<EncryptedStore>,
}

impl ActivityRepository {
    pub fn new(store: Arc<EncryptedStore>) -> Self {
        Self { store }
    }

    /// Appends an entry. An entry with the same id is never replaced.
    pub async fn log_activity(&self, activity: &ActivityLog) -> Result<()> {
        if self.contains(&activity.id).await? {
            return Err(Error::AlreadyExists(format!("activity {}", activity.id)));
        }
        self.store.save(activity).await
    }

    pub async fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.store.get::<ActivityLog>(id).await?.is_some())
    }

    /// Every log entry, oldest first.
    pub async fn get_activities(&self) -> Result<Vec<ActivityLog>> {
        let mut logs: Vec<ActivityLog> = self.store.get_all().await?;
        logs.sort_by_key(|l| l.timestamp);
        Ok(logs)
    }

    /// Entries for one `YYYY-MM-DD` day.
    pub async fn activities_on(&self, date: &str) -> Result<Vec<ActivityLog>> {
        Ok(self
            .get_activities()
            .await?
            .into_iter()
            .filter(|l| l.date == date)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivityType;
    use crate::repository::test_support::unlocked_store;

    #[tokio::test]
    async fn test_log_and_list_in_time_order() {
        let repo = ActivityRepository::new(unlocked_store());
        let earlier = ActivityLog::new(ActivityType::TaskComplete, Some("task_1".into()), 15, None);
        let mut later = ActivityLog::new(ActivityType::NoteCreated, Some("note_1".into()), 1, None);
        later.timestamp = earlier.timestamp + 1_000;
        later.date = "2024-05-11".to_string();

        repo.log_activity(&later).await.unwrap();
        repo.log_activity(&earlier).await.unwrap();

        let logs = repo.get_activities().await.unwrap();
        assert_eq!(logs, vec![earlier.clone(), later.clone()]);
        assert_eq!(repo.activities_on("2024-05-11").await.unwrap(), vec![later]);
    }

    #[tokio::test]
    async fn test_existing_entry_is_not_replaced() {
        let repo = ActivityRepository::new(unlocked_store());
        let entry = ActivityLog::new(ActivityType::TaskComplete, Some("task_1".into()), 15, None);
        repo.log_activity(&entry).await.unwrap();

        let mut rewritten = entry.clone();
        rewritten.value = 999;
        assert!(matches!(repo.log_activity(&rewritten).await, Err(Error::AlreadyExists(_))));
        assert_eq!(repo.get_activities().await.unwrap(), vec![entry]);
    }
}
