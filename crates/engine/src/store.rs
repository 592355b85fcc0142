//! Profile persistence: row <-> domain conversion.

use database::{student, Database, StudentRow};
use tracing::{info, warn};
use tutor_core::{HistoryEntry, Level, Mode, StudentProfile};

use crate::error::EngineError;

/// Load and save student profiles.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    db: Database,
}

impl ProfileStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Load a profile, creating a fresh one for an unseen JID.
    ///
    /// Stored fields that fail to parse are replaced with defaults rather
    /// than failing the turn.
    pub async fn load_or_create(
        &self,
        jid: &str,
        push_name: Option<&str>,
    ) -> Result<StudentProfile, EngineError> {
        match student::find_student(self.db.pool(), jid).await? {
            Some(row) => {
                let mut profile = profile_from_row(row);
                // Pick up a push name the transport learned later.
                if profile.display_name.is_none() {
                    profile.display_name = push_name.map(str::to_string);
                }
                Ok(profile)
            }
            None => {
                info!("New student: {}", push_name.unwrap_or(jid));
                let mut profile = StudentProfile::new(jid);
                profile.display_name = push_name.map(str::to_string);
                self.save(&profile).await?;
                Ok(profile)
            }
        }
    }

    /// Persist a profile.
    pub async fn save(&self, profile: &StudentProfile) -> Result<(), EngineError> {
        let row = row_from_profile(profile);
        student::save_student(self.db.pool(), &row).await?;
        Ok(())
    }
}

fn profile_from_row(row: StudentRow) -> StudentProfile {
    let level = row.level.parse::<Level>().unwrap_or_else(|e| {
        warn!("Resetting unknown level for {}: {}", row.jid, e);
        Level::default()
    });
    let mode = row.mode.parse::<Mode>().unwrap_or_else(|e| {
        warn!("Resetting unknown mode for {}: {}", row.jid, e);
        Mode::default()
    });
    let history: Vec<HistoryEntry> = serde_json::from_str(&row.history).unwrap_or_else(|e| {
        warn!("Discarding unparsable history for {}: {}", row.jid, e);
        Vec::new()
    });

    StudentProfile {
        jid: row.jid,
        display_name: row.display_name,
        level,
        xp: row.xp.max(0) as u32,
        mode,
        history,
    }
}

fn row_from_profile(profile: &StudentProfile) -> StudentRow {
    StudentRow {
        jid: profile.jid.clone(),
        display_name: profile.display_name.clone(),
        level: profile.level.as_str().to_string(),
        xp: i64::from(profile.xp),
        mode: profile.mode.as_str().to_string(),
        history: serde_json::to_string(&profile.history)
            .unwrap_or_else(|_| "[]".to_string()),
    }
}
