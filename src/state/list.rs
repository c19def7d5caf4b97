//! Ordered, doubly-linked task collection
//!
//! Execution order is represented by explicit next/previous id fields inside
//! an id-keyed arena rather than a native ordered list: tasks are looked up
//! randomly by id during advancement while order must survive arbitrary
//! insertion. Links are identity lookups, never ownership.

use crate::models::task::{Task, TaskStatus, FOUNDATION_STORY};
use crate::parser::RawTask;
use crate::state::StateError;
use std::collections::BTreeMap;

/// The linked task arena built from a raw ordered sequence
#[derive(Debug, Clone)]
pub struct TaskList {
    tasks: BTreeMap<String, Task>,
    head: Option<String>,
}

impl TaskList {
    /// Build the linked ordering from raw parsed entries.
    ///
    /// Entries are linked in input order: each task's `previousTask` points
    /// at the prior entry and the prior entry's `nextTask` is back-filled.
    /// Fails with `MalformedInput` on an empty sequence, a duplicate id, or
    /// an entry with an empty id or description.
    pub fn build(raw_tasks: &[RawTask]) -> Result<Self, StateError> {
        if raw_tasks.is_empty() {
            return Err(StateError::MalformedInput(
                "task sequence is empty".to_string(),
            ));
        }

        let mut tasks: BTreeMap<String, Task> = BTreeMap::new();
        let mut previous: Option<String> = None;

        for raw in raw_tasks {
            if raw.id.is_empty() {
                return Err(StateError::MalformedInput(
                    "task entry has an empty id".to_string(),
                ));
            }
            if raw.description.trim().is_empty() {
                return Err(StateError::MalformedInput(format!(
                    "task '{}' has an empty description",
                    raw.id
                )));
            }
            if tasks.contains_key(&raw.id) {
                return Err(StateError::MalformedInput(format!(
                    "duplicate task id '{}'",
                    raw.id
                )));
            }

            let task = Task {
                id: raw.id.clone(),
                description: raw.description.trim().to_string(),
                status: TaskStatus::Pending,
                user_story: raw
                    .user_story
                    .clone()
                    .unwrap_or_else(|| FOUNDATION_STORY.to_string()),
                next_task: None,
                previous_task: previous.clone(),
                dependencies: Vec::new(),
                parallel: raw.parallel,
                tdd_phase: None,
                completed_at: None,
            };

            if let Some(prev_id) = &previous {
                if let Some(prev) = tasks.get_mut(prev_id) {
                    prev.next_task = Some(raw.id.clone());
                }
            }

            previous = Some(raw.id.clone());
            tasks.insert(raw.id.clone(), task);
        }

        Ok(Self {
            head: Some(raw_tasks[0].id.clone()),
            tasks,
        })
    }

    /// Look up a task by id
    pub fn get(&self, id: &str) -> Result<&Task, StateError> {
        self.tasks
            .get(id)
            .ok_or_else(|| StateError::NotFound(id.to_string()))
    }

    /// Id of the task following `id`, or none at the tail
    pub fn successor_of(&self, id: &str) -> Result<Option<&str>, StateError> {
        Ok(self.get(id)?.next_task.as_deref())
    }

    /// Id of the task preceding `id`, or none at the head
    pub fn predecessor_of(&self, id: &str) -> Result<Option<&str>, StateError> {
        Ok(self.get(id)?.previous_task.as_deref())
    }

    /// The first task in the chain
    pub fn head(&self) -> Option<&Task> {
        self.head.as_ref().and_then(|id| self.tasks.get(id))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Consume the list, yielding the arena for embedding in a state record
    pub fn into_tasks(self) -> BTreeMap<String, Task> {
        self.tasks
    }
}
