use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
    InProgress,
}

impl TaskStatus {
    /// Completion toggle from an embedded task row. `InProgress` counts as
    /// not completed, so it flips to `Completed`.
    pub fn toggled(self) -> Self {
        match self {
            TaskStatus::Completed => TaskStatus::Pending,
            TaskStatus::Pending | TaskStatus::InProgress => TaskStatus::Completed,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: String,
    pub title: String,
    pub is_completed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub readable_id: u32,
    pub title: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

impl Task {
    pub fn new(id: impl Into<String>, readable_id: u32, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            readable_id,
            title: title.into(),
            status: TaskStatus::Pending,
            subtasks: Vec::new(),
        }
    }
}

/// The task store owned by the surrounding application.
///
/// The editor only reads tasks and forwards row actions; it never mutates a
/// task directly. Implementations are assumed not to fail.
pub trait TaskStore {
    fn tasks(&self) -> &[Task];

    /// Allocates a task with a fresh unique id.
    fn create_task(&mut self) -> Task;

    fn update_task_status(&mut self, task_id: &str, status: TaskStatus);

    /// Opens the host's detail editor for the task.
    fn edit_task(&mut self, task: &Task);

    fn toggle_subtask(&mut self, task_id: &str, subtask_id: &str);

    /// Enters the host's focus-session mode for the task.
    fn focus_task(&mut self, task: &Task);

    fn find_task(&self, task_id: &str) -> Option<&Task> {
        self.tasks().iter().find(|task| task.id == task_id)
    }
}

pub const NEW_TASK_TITLE: &str = "New Task";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskRequest {
    Edit,
    Focus,
}

/// In-process task store used by the harness and tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryTaskStore {
    tasks: Vec<Task>,
    requests: Vec<(TaskRequest, String)>,
}

impl MemoryTaskStore {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            requests: Vec::new(),
        }
    }

    /// Edit/focus requests forwarded by the editor, oldest first.
    pub fn requests(&self) -> &[(TaskRequest, String)] {
        &self.requests
    }

    fn next_readable_id(&self) -> u32 {
        self.tasks
            .iter()
            .map(|task| task.readable_id)
            .max()
            .unwrap_or(0)
            + 1
    }
}

impl TaskStore for MemoryTaskStore {
    fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    fn create_task(&mut self) -> Task {
        let task = Task::new(
            Uuid::new_v4().to_string(),
            self.next_readable_id(),
            NEW_TASK_TITLE,
        );
        self.tasks.push(task.clone());
        task
    }

    fn update_task_status(&mut self, task_id: &str, status: TaskStatus) {
        if let Some(task) = self.tasks.iter_mut().find(|task| task.id == task_id) {
            task.status = status;
        }
    }

    fn edit_task(&mut self, task: &Task) {
        self.requests.push((TaskRequest::Edit, task.id.clone()));
    }

    fn toggle_subtask(&mut self, task_id: &str, subtask_id: &str) {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == task_id) else {
            return;
        };
        if let Some(subtask) = task
            .subtasks
            .iter_mut()
            .find(|subtask| subtask.id == subtask_id)
        {
            subtask.is_completed = !subtask.is_completed;
        }
    }

    fn focus_task(&mut self, task: &Task) {
        self.requests.push((TaskRequest::Focus, task.id.clone()));
    }
}
