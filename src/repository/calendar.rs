use std::sync::Arc;

use crate::engine::EncryptedStore;
use crate::models::CalendarEvent;
use crate::Result;

pub struct CalendarRepository {
    store: Arc<EncryptedStore>,
}

impl CalendarRepository {
    pub fn new(store: Arc<EncryptedStore>) -> Self {
        Self { store }
    }

    pub async fn save_event(&self, event: &CalendarEvent) -> Result<()> {
        self.store.save(event).await
    }

    pub async fn get_event(&self, id: &str) -> Result<Option<CalendarEvent>> {
        self.store.get(id).await
    }

    pub async fn get_all_events(&self) -> Result<Vec<CalendarEvent>> {
        self.store.get_all().await
    }

    pub async fn delete_event(&self, id: &str) -> Result<()> {
        self.store.delete::<CalendarEvent>(id).await
    }

    /// Events overlapping `[start, end)`, ordered by start time.
    pub async fn events_between(&self, start: i64, end: i64) -> Result<Vec<CalendarEvent>> {
        let mut events: Vec<CalendarEvent> = self
            .get_all_events()
            .await?
            .into_iter()
            .filter(|e| e.overlaps(start, end))
            .collect();
        events.sort_by_key(|e| e.start_time);
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::unlocked_store;

    #[tokio::test]
    async fn test_events_between() {
        let repo = CalendarRepository::new(unlocked_store());
        let late = CalendarEvent::new("Lab", 5_000, 6_000);
        let early = CalendarEvent::new("Lecture", 1_000, 2_000);
        let outside = CalendarEvent::new("Exam", 10_000, 12_000);
        for e in [&late, &early, &outside] {
            repo.save_event(e).await.unwrap();
        }

        let found = repo.events_between(0, 7_000).await.unwrap();
        assert_eq!(found, vec![early.clone(), late.clone()]);
        // an event ending exactly where the window starts is not inside it
        assert!(repo.events_between(2_000, 5_000).await.unwrap().is_empty());

        repo.delete_event(&early.id).await.unwrap();
        assert_eq!(repo.get_event(&early.id).await.unwrap(), None);
        assert_eq!(repo.get_all_events().await.unwrap().len(), 2);
    }
}
