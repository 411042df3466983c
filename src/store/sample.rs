//! Sample styles seeded into an empty store.

use chrono::{DateTime, Utc};

use crate::model::{workflow_at_stage, Project};

/// Ids of the demo styles, in the order they are listed.
pub const SAMPLE_IDS: [&str; 2] = ["p1", "p2"];

/// The two demo styles shown on first launch.
pub fn sample_projects(now: DateTime<Utc>) -> Vec<Project> {
    vec![
        Project {
            id: "p1".to_string(),
            style_name: "Slim Fit Chino".to_string(),
            style_number: "CH-2024-001".to_string(),
            buyer_name: "Urban Outfitters".to_string(),
            season: "Autumn 24".to_string(),
            quantity: 5000,
            ship_date: "2024-10-15".to_string(),
            current_step_index: 3,
            workflow: workflow_at_stage(now, 3),
            product_image_url: Some(
                "https://images.unsplash.com/photo-1473963441512-7064619d77e4?q=80&w=800&auto=format&fit=crop"
                    .to_string(),
            ),
            tech_pack_url: Some("#".to_string()),
            tech_pack_notes: None,
            is_urgent: true,
            todo_items: Vec::new(),
            merchandiser_notes: String::new(),
        },
        Project {
            id: "p2".to_string(),
            style_name: "Heavyweight Hoodie".to_string(),
            style_number: "HD-99-BLU".to_string(),
            buyer_name: "H&M".to_string(),
            season: "Winter 24".to_string(),
            quantity: 12000,
            ship_date: "2024-11-20".to_string(),
            current_step_index: 10,
            workflow: workflow_at_stage(now, 10),
            product_image_url: Some(
                "https://images.unsplash.com/photo-1556821840-3a63f95609a7?q=80&w=800&auto=format&fit=crop"
                    .to_string(),
            ),
            tech_pack_url: Some("#".to_string()),
            tech_pack_notes: None,
            is_urgent: false,
            todo_items: Vec::new(),
            merchandiser_notes: String::new(),
        },
    ]
}
