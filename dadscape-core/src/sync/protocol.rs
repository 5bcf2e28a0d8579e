//! JSON bodies exchanged with the diary service.
//!
//! Every response is wrapped in [`ApiResponse`]. Field names are camelCase
//! to match the service.

use serde::{Deserialize, Serialize};

use super::error::SyncError;
use crate::models::{Diary, Tier};

/// Response envelope used by every endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// The payload, or the server's reason when it reported failure or sent none.
    pub fn into_data(self) -> Result<T, SyncError> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(SyncError::Rejected(
                self.error
                    .or(self.message)
                    .unwrap_or_else(|| "no data in response".to_string()),
            )),
        }
    }
}

/// Body of `POST /api/diaries`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDiaryRequest<'a> {
    pub name: &'a str,
    pub category: &'a str,
    pub description: &'a str,
    pub created_by: &'a str,
    pub rsn: &'a str,
}

impl<'a> CreateDiaryRequest<'a> {
    pub fn new(diary: &'a Diary, rsn: &'a str) -> Self {
        Self {
            name: &diary.name,
            category: &diary.category,
            description: &diary.description,
            created_by: &diary.created_by,
            rsn,
        }
    }
}

/// Body of `PUT /api/diaries/{id}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDiaryRequest<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub category: &'a str,
    pub version: &'a str,
    pub tiers: &'a [Tier],
    pub active: bool,
    pub last_modified_by: &'a str,
    pub rsn: &'a str,
}

impl<'a> UpdateDiaryRequest<'a> {
    pub fn new(diary: &'a Diary, rsn: &'a str) -> Self {
        Self {
            name: &diary.name,
            description: &diary.description,
            category: &diary.category,
            version: &diary.version,
            tiers: &diary.tiers,
            active: diary.active,
            last_modified_by: &diary.last_modified_by,
            rsn,
        }
    }
}

/// Body of `POST /api/motd`.
#[derive(Debug, Clone, Serialize)]
pub struct MotdRequest<'a> {
    pub motd: &'a str,
    pub rsn: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task;

    #[test]
    fn test_envelope_success() {
        let response: ApiResponse<String> =
            serde_json::from_str(r#"{"success":true,"data":"Raid tonight"}"#).unwrap();
        assert_eq!(response.into_data().unwrap(), "Raid tonight");
    }

    #[test]
    fn test_envelope_failure_carries_reason() {
        let response: ApiResponse<String> =
            serde_json::from_str(r#"{"success":false,"error":"Forbidden"}"#).unwrap();
        match response.into_data() {
            Err(SyncError::Rejected(reason)) => assert_eq!(reason, "Forbidden"),
            other => panic!("unexpected {:?}", other),
        }

        let empty: ApiResponse<String> = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(empty.into_data().is_err());
    }

    #[test]
    fn test_update_body_shape() {
        let mut diary = Diary::new("Boss Diary", "PvM", "Bob");
        let mut tier = Tier::new("Easy");
        tier.add_task(Task::kill("Kill goblins", "Goblin", 5));
        diary.add_tier(tier);

        let value = serde_json::to_value(UpdateDiaryRequest::new(&diary, "Alice")).unwrap();
        assert_eq!(value["lastModifiedBy"], "Bob");
        assert_eq!(value["rsn"], "Alice");
        assert_eq!(value["version"], "1.0");
        assert_eq!(value["tiers"][0]["tierName"], "Easy");
        assert_eq!(value["tiers"][0]["tasks"][0]["requirements"]["npc"], "Goblin");
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_create_body_shape() {
        let diary = Diary::new("Boss Diary", "PvM", "Bob").with_description("Bosses");
        let value = serde_json::to_value(CreateDiaryRequest::new(&diary, "Bob")).unwrap();

        assert_eq!(value["name"], "Boss Diary");
        assert_eq!(value["createdBy"], "Bob");
        assert_eq!(value["description"], "Bosses");
    }
}
