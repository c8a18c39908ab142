use std::sync::Arc;

use crate::engine::EncryptedStore;
use crate::models::{now_ms, Quadrant, Task};
use crate::{Error, Result};

pub struct TaskRepository {
    store: Arc<EncryptedStore>,
}

impl TaskRepository {
    pub fn new(store: Arc<EncryptedStore>) -> Self {
        Self { store }
    }

    pub async fn save_task(&self, task: &Task) -> Result<()> {
        self.store.save(task).await
    }

    pub async fn get_task(&self, id: &str) -> Result<Option<Task>> {
        self.store.get(id).await
    }

    pub async fn get_all_tasks(&self) -> Result<Vec<Task>> {
        self.store.get_all().await
    }

    pub async fn delete_task(&self, id: &str) -> Result<()> {
        self.store.delete::<Task>(id).await
    }

    /// Tasks in one quadrant, in display order. Tasks without a position sort first.
    pub async fn tasks_in_quadrant(&self, quadrant: Quadrant) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .get_all_tasks()
            .await?
            .into_iter()
            .filter(|t| t.quadrant == quadrant)
            .collect();
        tasks.sort_by_key(|t| (t.sort_order.unwrap_or(0), t.created_at));
        Ok(tasks)
    }

    /// Moves a task into `quadrant` at position `index` and renumbers that quadrant.
    ///
    /// Each renumbered task is written separately. A failure part way through
    /// leaves some positions stale, which only affects ordering.
    pub async fn move_task(&self, id: &str, quadrant: Quadrant, index: usize) -> Result<Vec<Task>> {
        let all = self.get_all_tasks().await?;
        let mut moved = all
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("task {}", id)))?;

        let mut column: Vec<Task> = all
            .into_iter()
            .filter(|t| t.quadrant == quadrant && t.id != id)
            .collect();
        column.sort_by_key(|t| (t.sort_order.unwrap_or(0), t.created_at));

        moved.quadrant = quadrant;
        moved.updated_at = now_ms();
        column.insert(index.min(column.len()), moved);

        for (position, task) in column.iter_mut().enumerate() {
            task.sort_order = Some(position as i64);
            self.save_task(task).await?;
        }
        Ok(column)
    }
}
