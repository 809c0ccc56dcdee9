use chrono::Utc;

use crate::leaderboard::models::{ParticipantRecord, ParticipantSource};

const DEMO_USERS: [(&str, &str); 5] = [
    ("John Doe", "john.doe@company.com"),
    ("Jane Smith", "jane.smith@company.com"),
    ("Bob Johnson", "bob.johnson@company.com"),
    ("Digital Workshop Admin", "admin@company.com"),
    ("Charlie Davis", "charlie.davis@company.com"),
];

/// Stand-in participants for when the directory cannot be read.
pub fn demo_participants() -> Vec<ParticipantRecord> {
    let now = Utc::now();
    DEMO_USERS
        .iter()
        .enumerate()
        .map(|(i, (name, email))| ParticipantRecord {
            participant_id: format!("demo-user-{}", i + 1),
            rank: (i + 1) as u32,
            display_name: name.to_string(),
            email: email.to_string(),
            username: email.to_string(),
            is_active: true,
            source: ParticipantSource::Demo,
            score: 0,
            last_updated: now,
        })
        .collect()
}
