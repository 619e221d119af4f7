use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimal task record, enough for routing and activity tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub status: String,
    pub completed: bool,
    pub archived: bool,
    pub assignee_ids: Vec<Uuid>,
}

impl Task {
    pub fn is_assigned(&self, user_id: Uuid) -> bool {
        self.assignee_ids.contains(&user_id)
    }

    /// Activity is only recorded against tasks still in flight.
    pub fn accepts_activity(&self) -> bool {
        !self.completed && !self.archived
    }
}

/// Engagement timestamp for a (task, user) pair. Pure relationship plus
/// timestamp; neither side owns the other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAssignmentActivity {
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub last_activity_at: DateTime<Utc>,
}
