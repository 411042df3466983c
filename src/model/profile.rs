//! The local user's profile.

use serde::{Deserialize, Serialize};

/// Colour assigned when a profile has none.
pub const DEFAULT_USER_COLOR: &str = "#6366f1";

/// Identity of the person using this session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub company_role: String,
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl UserProfile {
    /// Display colour, falling back to the default indigo.
    pub fn display_color(&self) -> &str {
        self.color.as_deref().filter(|c| !c.is_empty()).unwrap_or(DEFAULT_USER_COLOR)
    }

    /// Two-letter badge shown next to a collaborator.
    pub fn initials(&self) -> String {
        self.name.chars().take(2).collect::<String>().to_uppercase()
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            id: "user_1".to_string(),
            name: "Senior Merchandiser".to_string(),
            email: "merch@stitchflow.io".to_string(),
            phone: "+880 1700 000000".to_string(),
            photo_url: None,
            company_role: "Lead Merchandiser".to_string(),
            is_admin: true,
            color: Some(DEFAULT_USER_COLOR.to_string()),
        }
    }
}
