//! The project store.
//!
//! Owns every [`Project`] and applies update intents to them. Each change
//! writes the whole project document to storage under `project:<id>`.
//! Bad input (unknown project, step index out of range) is ignored rather
//! than reported, and persistence failures are only logged.

use uuid::Uuid;

use super::sample::{sample_projects, SAMPLE_IDS};
use super::storage::{get_json, set_json, SharedStorage};
use crate::core::SharedClock;
use crate::model::{
    create_initial_workflow, DashboardStats, NewProject, Priority, Project, ProjectPatch,
    StepPatch, StepRecord, TodoItem, WORKFLOW_LEN,
};

/// Storage key prefix for project documents.
pub const PROJECT_KEY_PREFIX: &str = "project:";

/// Storage key of a project document.
pub fn project_key(id: &str) -> String {
    format!("{PROJECT_KEY_PREFIX}{id}")
}

/// In-memory list of projects backed by a key-value store.
#[derive(Debug)]
pub struct ProjectStore {
    projects: Vec<Project>,
    storage: SharedStorage,
    clock: SharedClock,
    /// Millisecond stamp of the last synthesized id
    last_id_millis: i64,
}

impl ProjectStore {
    /// Create an empty store. Nothing is read from storage.
    pub fn new(storage: SharedStorage, clock: SharedClock) -> Self {
        Self { projects: Vec::new(), storage, clock, last_id_millis: 0 }
    }

    /// Load every project document from storage.
    ///
    /// When storage holds no project documents at all the two sample styles
    /// are seeded and persisted. Documents that fail to parse are skipped
    /// with a warning and left untouched on disk.
    pub fn load(storage: SharedStorage, clock: SharedClock) -> Self {
        let mut store = Self::new(storage, clock);

        let keys = match store.storage.keys(PROJECT_KEY_PREFIX) {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!(error = %e, "Could not list stored projects");
                Vec::new()
            }
        };

        let has_documents = !keys.is_empty();
        for key in keys {
            match get_json::<Project>(store.storage.as_ref(), &key) {
                Ok(Some(project)) if project.workflow.len() == WORKFLOW_LEN => {
                    store.projects.push(project);
                }
                Ok(Some(project)) => {
                    tracing::warn!(
                        id = %project.id,
                        steps = project.workflow.len(),
                        "Skipping project with malformed workflow"
                    );
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(key = %key, error = %e, "Skipping unreadable project"),
            }
        }

        if !has_documents {
            let now = store.clock.now();
            for project in sample_projects(now) {
                store.persist(&project);
                store.projects.push(project);
            }
            tracing::debug!("Seeded sample projects");
        } else {
            store.projects.sort_by_key(|p| list_rank(&p.id));
        }

        store
    }

    /// All projects, newest first.
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Look up a project by id.
    pub fn get(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Dashboard headline numbers as of the clock's today.
    pub fn stats(&self) -> DashboardStats {
        DashboardStats::collect(&self.projects, self.clock.today())
    }

    /// Merge `patch` into step `step_index` of a project and stamp `updated_at`.
    ///
    /// Any status is accepted. An unknown project or out-of-range index is a no-op.
    pub fn update_step(&mut self, project_id: &str, step_index: usize, patch: StepPatch) {
        let stamp = self.clock.now().to_rfc3339();
        let Some(project) = self.projects.iter_mut().find(|p| p.id == project_id) else {
            tracing::debug!(project_id, "update_step: unknown project");
            return;
        };
        let Some(step) = project.workflow.get_mut(step_index) else {
            tracing::debug!(project_id, step_index, "update_step: step index out of range");
            return;
        };

        patch.apply(step);
        step.updated_at = stamp;
        tracing::debug!(project_id, step_index, status = %step.status, "Step updated");

        let snapshot = project.clone();
        self.persist(&snapshot);
    }

    /// Shallow-merge `patch` into a project. Unknown projects are ignored.
    ///
    /// A `current_step_index` outside the workflow is dropped from the patch.
    pub fn update_project(&mut self, project_id: &str, mut patch: ProjectPatch) {
        let Some(project) = self.projects.iter_mut().find(|p| p.id == project_id) else {
            tracing::debug!(project_id, "update_project: unknown project");
            return;
        };

        if patch.current_step_index.is_some_and(|idx| idx >= WORKFLOW_LEN) {
            tracing::debug!(project_id, "update_project: ignoring out-of-range step index");
            patch.current_step_index = None;
        }

        patch.apply(project);
        let snapshot = project.clone();
        self.persist(&snapshot);
    }

    /// Create a project with a fresh workflow and put it at the front of the list.
    ///
    /// Returns the synthesized id (`p<unix-millis>`).
    pub fn add_project(&mut self, fields: NewProject) -> String {
        let now = self.clock.now();
        let millis = now.timestamp_millis().max(self.last_id_millis + 1);
        self.last_id_millis = millis;
        let id = format!("p{millis}");

        let NewProject {
            style_name,
            style_number,
            buyer_name,
            season,
            quantity,
            ship_date,
            product_image_url,
        } = fields;

        let project = Project {
            id: id.clone(),
            style_name,
            style_number,
            buyer_name,
            season,
            quantity,
            ship_date,
            current_step_index: 0,
            workflow: create_initial_workflow(now),
            product_image_url: product_image_url.filter(|url| !url.is_empty()),
            tech_pack_url: Some("#".to_string()),
            tech_pack_notes: None,
            is_urgent: false,
            todo_items: Vec::new(),
            merchandiser_notes: String::new(),
        };

        tracing::info!(id = %project.id, style = %project.style_name, "Project added");
        self.persist(&project);
        self.projects.insert(0, project);
        id
    }

    /// Append a note (and optional image URL) to a step's record log.
    ///
    /// Ignored when both note and image are empty.
    pub fn add_step_record(
        &mut self,
        project_id: &str,
        step_index: usize,
        note: &str,
        image_url: Option<String>,
    ) {
        let image_url = image_url.filter(|url| !url.is_empty());
        if note.is_empty() && image_url.is_none() {
            return;
        }
        let Some(step) = self.get(project_id).and_then(|p| p.workflow.get(step_index)) else {
            return;
        };

        let mut records = step.records.clone();
        records.push(StepRecord {
            id: Uuid::new_v4().to_string(),
            note: note.to_string(),
            image_url,
            timestamp: self.clock.now().format("%Y-%m-%d %H:%M:%S").to_string(),
        });
        self.update_step(project_id, step_index, StepPatch::records(records));
    }

    /// Add a medium-priority todo. Blank tasks are ignored.
    pub fn add_todo(&mut self, project_id: &str, task: &str) -> Option<String> {
        if task.trim().is_empty() {
            return None;
        }
        let mut items = self.get(project_id)?.todo_items.clone();
        let id = Uuid::new_v4().to_string();
        items.push(TodoItem {
            id: id.clone(),
            task: task.to_string(),
            completed: false,
            priority: Priority::Medium,
        });
        self.update_project(project_id, ProjectPatch::todos(items));
        Some(id)
    }

    /// Flip the completion flag of a todo.
    pub fn toggle_todo(&mut self, project_id: &str, todo_id: &str) {
        let Some(project) = self.get(project_id) else {
            return;
        };
        let items = project
            .todo_items
            .iter()
            .map(|item| {
                if item.id == todo_id {
                    TodoItem { completed: !item.completed, ..item.clone() }
                } else {
                    item.clone()
                }
            })
            .collect();
        self.update_project(project_id, ProjectPatch::todos(items));
    }

    /// Point the project at another stage. Out-of-range indices are ignored.
    pub fn set_current_step(&mut self, project_id: &str, index: usize) {
        self.update_project(
            project_id,
            ProjectPatch { current_step_index: Some(index), ..ProjectPatch::default() },
        );
    }

    /// Write the whole project document. Failures are logged and dropped.
    fn persist(&self, project: &Project) {
        if let Err(e) = set_json(self.storage.as_ref(), &project_key(&project.id), project) {
            tracing::warn!(id = %project.id, error = %e, "Failed to persist project");
        }
    }
}

/// Sort key for the project list.
///
/// Added projects (`p<millis>`) come first, newest first, then the sample
/// styles in seed order, then anything else.
fn list_rank(id: &str) -> (u8, i64) {
    if let Some(pos) = SAMPLE_IDS.iter().position(|s| *s == id) {
        return (1, pos as i64);
    }
    match id.strip_prefix('p').and_then(|n| n.parse::<i64>().ok()) {
        Some(stamp) => (0, stamp.saturating_neg()),
        None => (2, 0),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::core::ManualClock;
    use crate::model::{StepStatus, WorkflowStepId, WORKFLOW_STRUCTURE};
    use crate::store::storage::{KeyValueStore, MemoryStore, StorageError, StorageResult};

    fn clock() -> ManualClock {
        ManualClock::at_date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    fn store_with(storage: &MemoryStore, clock: &ManualClock) -> ProjectStore {
        ProjectStore::new(Arc::new(storage.clone()), Arc::new(clock.clone()))
    }

    fn chino() -> NewProject {
        NewProject {
            style_name: "Slim Fit Chino".to_string(),
            style_number: "CH-2024-001".to_string(),
            buyer_name: "Urban Outfitters".to_string(),
            season: "Autumn 24".to_string(),
            quantity: 5000,
            ship_date: "2024-12-01".to_string(),
            product_image_url: None,
        }
    }

    #[test]
    fn test_add_project_scenario() {
        let storage = MemoryStore::new();
        let mut store = store_with(&storage, &clock());

        let id = store.add_project(chino());
        let project = store.get(&id).unwrap();

        assert_eq!(project.current_step_index, 0);
        assert_eq!(project.workflow.len(), 16);
        assert_eq!(project.workflow[0].status, StepStatus::InProgress);
        assert!(project.workflow[1..].iter().all(|s| s.status == StepStatus::Pending));
        assert_eq!(project.quantity, 5000);
        assert_eq!(project.ship_date, "2024-12-01");
        assert_eq!(project.tech_pack_url.as_deref(), Some("#"));
        assert!(storage.get(&project_key(&id)).unwrap().is_some());
    }

    #[test]
    fn test_add_project_prepends_and_ids_are_unique() {
        let storage = MemoryStore::new();
        let mut store = store_with(&storage, &clock());

        let first = store.add_project(chino());
        let second = store.add_project(chino());

        assert_ne!(first, second);
        assert_eq!(store.projects()[0].id, second);
        assert_eq!(store.projects()[1].id, first);
    }

    #[test]
    fn test_update_step_touches_only_target() {
        let storage = MemoryStore::new();
        let clock = clock();
        let mut store = store_with(&storage, &clock);
        let id = store.add_project(chino());
        let before = store.get(&id).unwrap().clone();

        clock.advance(60_000);
        store.update_step(&id, 2, StepPatch::status(StepStatus::Approved));

        let after = store.get(&id).unwrap();
        for (idx, (old, new)) in before.workflow.iter().zip(&after.workflow).enumerate() {
            if idx == 2 {
                assert_eq!(new.status, StepStatus::Approved);
                assert_ne!(new.updated_at, old.updated_at);
                assert_eq!(new.due_date, old.due_date);
            } else {
                assert_eq!(new, old);
            }
        }
    }

    #[test]
    fn test_update_step_accepts_any_transition() {
        let storage = MemoryStore::new();
        let mut store = store_with(&storage, &clock());
        let id = store.add_project(chino());

        for status in [StepStatus::Completed, StepStatus::Pending, StepStatus::Rejected] {
            store.update_step(&id, 0, StepPatch::status(status));
            assert_eq!(store.get(&id).unwrap().workflow[0].status, status);
        }
    }

    #[test]
    fn test_update_step_out_of_range_is_noop() {
        let storage = MemoryStore::new();
        let mut store = store_with(&storage, &clock());
        let id = store.add_project(chino());
        let before = store.get(&id).unwrap().clone();

        store.update_step(&id, 16, StepPatch::status(StepStatus::Completed));
        store.update_step("missing", 0, StepPatch::status(StepStatus::Completed));

        assert_eq!(store.get(&id).unwrap(), &before);
    }

    #[test]
    fn test_workflow_order_survives_updates() {
        let storage = MemoryStore::new();
        let mut store = store_with(&storage, &clock());
        let id = store.add_project(chino());

        store.update_step(&id, 5, StepPatch::due_date("2024-07-01"));
        store.update_project(&id, ProjectPatch::urgent(true));
        store.set_current_step(&id, 42);

        let project = store.get(&id).unwrap();
        assert_eq!(project.current_step_index, 0);
        assert_eq!(project.workflow.len(), 16);
        let ids: Vec<WorkflowStepId> = project.workflow.iter().map(|s| s.id).collect();
        let expected: Vec<WorkflowStepId> = WORKFLOW_STRUCTURE.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_update_project_persists_document() {
        let storage = MemoryStore::new();
        let mut store = store_with(&storage, &clock());
        let id = store.add_project(chino());

        store.update_project(&id, ProjectPatch::notes("Check shrinkage"));

        let stored: Project = get_json(&storage, &project_key(&id)).unwrap().unwrap();
        assert_eq!(stored.merchandiser_notes, "Check shrinkage");
    }

    #[test]
    fn test_records_and_todos() {
        let storage = MemoryStore::new();
        let mut store = store_with(&storage, &clock());
        let id = store.add_project(chino());

        store.add_step_record(&id, 0, "", None);
        store.add_step_record(&id, 0, "Buyer sent tech pack", None);
        store.add_step_record(&id, 0, "", Some("https://img.example/1.png".to_string()));
        let records = &store.get(&id).unwrap().workflow[0].records;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].note, "Buyer sent tech pack");

        assert!(store.add_todo(&id, "   ").is_none());
        let todo = store.add_todo(&id, "Book lab dip").unwrap();
        store.toggle_todo(&id, &todo);
        let project = store.get(&id).unwrap();
        assert_eq!(project.todo_items.len(), 1);
        assert!(project.todo_items[0].completed);
        assert_eq!(project.todo_items[0].priority, Priority::Medium);
    }

    #[test]
    fn test_load_seeds_samples_then_reloads() {
        let storage = MemoryStore::new();
        let clock = clock();
        let store = ProjectStore::load(Arc::new(storage.clone()), Arc::new(clock.clone()));
        assert_eq!(store.projects().len(), 2);
        assert_eq!(store.get("p1").unwrap().current_step_index, 3);

        let mut store = ProjectStore::load(Arc::new(storage.clone()), Arc::new(clock.clone()));
        let id = store.add_project(chino());

        let reloaded = ProjectStore::load(Arc::new(storage), Arc::new(clock));
        assert_eq!(reloaded.projects().len(), 3);
        assert_eq!(reloaded.projects()[0].id, id);
    }

    #[test]
    fn test_load_never_overwrites_unreadable_documents() {
        let storage = MemoryStore::new();
        let user_doc = r#"{"id":"p1","styleName":"My Real Order","workflow":[]}"#;
        storage.set("project:p1", user_doc).unwrap();
        storage.set("project:p9", "{ not json").unwrap();

        let store = ProjectStore::load(Arc::new(storage.clone()), Arc::new(clock()));

        assert!(store.projects().is_empty());
        assert_eq!(storage.get("project:p1").unwrap().as_deref(), Some(user_doc));
        assert!(storage.get("project:p2").unwrap().is_none());
    }

    #[test]
    fn test_list_order_is_stable_across_reloads() {
        let storage = MemoryStore::new();
        let clock = clock();
        let load = || ProjectStore::load(Arc::new(storage.clone()), Arc::new(clock.clone()));
        let ids = |store: &ProjectStore| -> Vec<String> {
            store.projects().iter().map(|p| p.id.clone()).collect()
        };

        let first = load();
        assert_eq!(ids(&first), vec!["p1", "p2"]);
        assert_eq!(ids(&load()), ids(&first));

        let mut store = load();
        let older = store.add_project(chino());
        let newer = store.add_project(chino());
        assert_eq!(ids(&store), vec![newer.clone(), older.clone(), "p1".into(), "p2".into()]);
        assert_eq!(ids(&load()), ids(&store));
    }

    #[test]
    fn test_list_rank() {
        assert!(list_rank("p1717232400000") < list_rank("p1"));
        assert!(list_rank("p1717232400001") < list_rank("p1717232400000"));
        assert!(list_rank("p1") < list_rank("p2"));
        assert!(list_rank("p2") < list_rank("custom"));
    }

    #[derive(Debug)]
    struct FullDisk;

    impl KeyValueStore for FullDisk {
        fn get(&self, _key: &str) -> StorageResult<Option<String>> {
            Ok(None)
        }

        fn set(&self, key: &str, _value: &str) -> StorageResult<()> {
            Err(StorageError::Io {
                key: key.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "quota exceeded"),
            })
        }

        fn remove(&self, _key: &str) -> StorageResult<()> {
            Ok(())
        }

        fn keys(&self, _prefix: &str) -> StorageResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_persistence_failure_does_not_block_updates() {
        let mut store = ProjectStore::new(Arc::new(FullDisk), Arc::new(clock()));
        let id = store.add_project(chino());
        store.update_step(&id, 1, StepPatch::status(StepStatus::InProgress));
        assert_eq!(store.get(&id).unwrap().workflow[1].status, StepStatus::InProgress);
    }
}
