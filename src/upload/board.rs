use super::UploadTask;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// The list of upload tasks a visitor sees.
///
/// Every change goes through one lock as a function of the previous task, so
/// uploads finishing at the same moment cannot overwrite each other.
#[derive(Clone, Default)]
pub struct TaskBoard {
    tasks: Arc<Mutex<Vec<UploadTask>>>,
}

impl TaskBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<UploadTask>> {
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert(&self, task: UploadTask) {
        self.lock().push(task);
    }

    /// Applies `f` to the task with `id`. Returns false if it is gone.
    pub fn update(&self, id: Uuid, f: impl FnOnce(&mut UploadTask)) -> bool {
        let mut tasks = self.lock();
        match tasks.iter_mut().find(|task| task.id == id) {
            Some(task) => {
                f(task);
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, id: Uuid) -> Option<UploadTask> {
        let mut tasks = self.lock();
        let index = tasks.iter().position(|task| task.id == id)?;
        Some(tasks.remove(index))
    }

    pub fn get(&self, id: Uuid) -> Option<UploadTask> {
        self.lock().iter().find(|task| task.id == id).cloned()
    }

    pub fn snapshot(&self) -> Vec<UploadTask> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
