use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// A registered customer. Accounts are issued elsewhere; this service
/// only resolves them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    /// Allergens the user wants flagged, normalized and sorted
    #[serde(default)]
    pub allergies: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, name: String) -> Self {
        Self {
            id: format!(
                "U{}",
                Uuid::new_v4()
                    .simple()
                    .to_string()
                    .get(0..8)
                    .unwrap_or("00000000")
            ),
            email: email.trim().to_lowercase(),
            name,
            allergies: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// Replacement set of allergy preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAllergiesRequest {
    pub allergies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAllergiesResponse {
    pub user_id: String,
    pub allergies: Vec<String>,
}

/// Trim, lowercase, drop blanks and duplicates, sort
pub fn normalize_allergies<'a, I>(allergies: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    allergies
        .into_iter()
        .map(|allergy| allergy.trim().to_lowercase())
        .filter(|allergy| !allergy.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
