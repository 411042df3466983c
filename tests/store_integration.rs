//! Store Integration Tests
//!
//! Projects and profiles written through one store instance are read back
//! by a fresh one over the same directory.

use std::fs;
use std::sync::Arc;

use stitchflow::core::SharedClock;
use stitchflow::model::{NewProject, StepPatch, StepStatus};
use stitchflow::store::{FileStore, ProfileStore, ProjectStore, SharedStorage};
use stitchflow::ManualClock;
use tempfile::TempDir;

const NOW: i64 = 1_717_232_400_000; // 2024-06-01T09:00:00Z

fn open(dir: &TempDir) -> SharedStorage {
    Arc::new(FileStore::open(dir.path()).unwrap())
}

fn clock() -> SharedClock {
    Arc::new(ManualClock::new(NOW))
}

fn new_style(name: &str) -> NewProject {
    NewProject {
        style_name: name.to_string(),
        style_number: "TS-001".to_string(),
        buyer_name: "Uniqlo".to_string(),
        season: "Spring 25".to_string(),
        quantity: 8000,
        ship_date: "2025-02-01".to_string(),
        product_image_url: None,
    }
}

#[test]
fn test_first_load_seeds_and_persists_samples() {
    let temp = TempDir::new().unwrap();
    let store = ProjectStore::load(open(&temp), clock());
    let ids: Vec<&str> = store.projects().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["p1", "p2"]);

    assert!(temp.path().join("project.p1.json").exists());
    assert!(temp.path().join("project.p2.json").exists());
}

#[test]
fn test_changes_survive_reload() {
    let temp = TempDir::new().unwrap();
    let mut store = ProjectStore::load(open(&temp), clock());

    let id = store.add_project(new_style("Oxford Shirt"));
    store.update_step("p1", 3, StepPatch::status(StepStatus::Approved).with_comment("Signed"));
    store.add_step_record("p2", 10, "Inline inspection passed", None);
    let todo = store.add_todo("p2", "Chase trims").unwrap();
    store.toggle_todo("p2", &todo);

    let reloaded = ProjectStore::load(open(&temp), clock());
    assert_eq!(reloaded.projects().len(), 3);
    // Newest first
    assert_eq!(reloaded.projects()[0].id, id);
    assert_eq!(reloaded.projects()[0].style_name, "Oxford Shirt");
    assert_eq!(reloaded.projects()[0].current_step_index, 0);

    let p1 = reloaded.get("p1").unwrap();
    assert_eq!(p1.workflow[3].status, StepStatus::Approved);
    assert_eq!(p1.workflow[3].comment.as_deref(), Some("Signed"));

    let p2 = reloaded.get("p2").unwrap();
    assert_eq!(p2.workflow[10].records.len(), 1);
    assert_eq!(p2.workflow[10].records[0].note, "Inline inspection passed");
    assert!(p2.todo_items[0].completed);
}

#[test]
fn test_corrupt_documents_are_skipped() {
    let temp = TempDir::new().unwrap();
    {
        let mut store = ProjectStore::load(open(&temp), clock());
        store.add_project(new_style("Rib Tee"));
    }
    fs::write(temp.path().join("project.p2.json"), "{ not json").unwrap();

    let reloaded = ProjectStore::load(open(&temp), clock());
    assert_eq!(reloaded.projects().len(), 2);
    assert!(reloaded.get("p2").is_none());
    assert!(reloaded.get("p1").is_some());
}

#[test]
fn test_profile_round_trip_through_disk() {
    let temp = TempDir::new().unwrap();
    let profiles = ProfileStore::new(open(&temp));
    assert_eq!(profiles.load().name, "Senior Merchandiser");

    profiles
        .update(|p| {
            p.name = "Farhana Akter".to_string();
            p.color = Some("#10b981".to_string());
        })
        .unwrap();

    let reopened = ProfileStore::new(open(&temp)).load();
    assert_eq!(reopened.name, "Farhana Akter");
    assert_eq!(reopened.display_color(), "#10b981");
    assert_eq!(reopened.initials(), "FA");
}
