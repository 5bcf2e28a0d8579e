use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::now;

/// A player's DadCred standing, the clan's own reputation score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DadCred {
    pub rsn: String,
    pub rank: String,
    pub cred_score: i64,
    pub rank_color: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_updated: DateTime<Utc>,
}

impl DadCred {
    pub fn unranked(rsn: impl Into<String>) -> Self {
        Self {
            rsn: rsn.into(),
            rank: "New Dad".to_string(),
            cred_score: 0,
            rank_color: "#AAAAAA".to_string(),
            last_updated: now(),
        }
    }

    pub fn set_score(&mut self, score: i64) {
        self.cred_score = score;
        self.last_updated = now();
    }

    pub fn display_string(&self) -> String {
        format!("{} ({} cred)", self.rank, self.cred_score)
    }
}
