pub mod demo;
pub mod scim;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::leaderboard::models::{ParticipantRecord, ParticipantSource};
use crate::provider::error::ProviderResult;

/// A workspace member as the identity directory reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryUser {
    pub id: String,
    pub user_name: String,
    pub display_name: String,
    pub email: String,
    pub active: bool,
}

/// Source of workspace members.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// All members, in the directory's sort order.
    async fn list_users(&self) -> ProviderResult<Vec<DirectoryUser>>;
}

/// Active users become participants, ranked 1.. in listing order, score 0.
pub fn participants_from_users(users: &[DirectoryUser]) -> Vec<ParticipantRecord> {
    let now = Utc::now();
    users
        .iter()
        .filter(|u| u.active)
        .enumerate()
        .map(|(i, u)| ParticipantRecord {
            participant_id: u.id.clone(),
            rank: (i + 1) as u32,
            display_name: u.display_name.clone(),
            email: u.email.clone(),
            username: u.user_name.clone(),
            is_active: u.active,
            source: ParticipantSource::Directory,
            score: 0,
            last_updated: now,
        })
        .collect()
}

/// Participants from the directory, or the demo set when the directory
/// fails or has no active members. The flag reports whether demo data was used.
pub async fn fetch_participants(directory: &dyn UserDirectory) -> (Vec<ParticipantRecord>, bool) {
    match directory.list_users().await {
        Ok(users) => {
            let participants = participants_from_users(&users);
            if participants.is_empty() {
                warn!("No active users found in workspace, using demo participants");
                (demo::demo_participants(), true)
            } else {
                (participants, false)
            }
        }
        Err(e) => {
            warn!(error = %e, "Directory listing failed, using demo participants");
            (demo::demo_participants(), true)
        }
    }
}
