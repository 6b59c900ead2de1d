use super::socials::SocialLinks;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params, types::Type};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 32;

/// Public profile information
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileInfo {
    pub owner_id: String,
    pub username: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub view_count: i64,
    pub socials: SocialLinks,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileInfo {
    /// Avatar to show, falling back to a generated one seeded by the username
    pub fn avatar_or_default(&self) -> String {
        self.avatar_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| {
                format!(
                    "https://api.dicebear.com/9.x/dylan/svg?seed={}",
                    self.username
                )
            })
    }
}

/// Owner-editable profile fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub username: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub socials: SocialLinks,
}

/// Lowercase a username and check its shape (3-32 of `a-z 0-9 _ . -`)
pub fn normalize_username(username: &str) -> Option<String> {
    let username = username.trim().to_ascii_lowercase();
    let valid_len = (USERNAME_MIN..=USERNAME_MAX).contains(&username.len());
    let valid_chars = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    (valid_len && valid_chars).then_some(username)
}

/// Profile repository for database operations
#[derive(Clone)]
pub struct ProfileRepo {
    conn: Arc<Mutex<Connection>>,
}

impl ProfileRepo {
    /// Create a new ProfileRepo with the given connection
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // A panic mid-statement leaves nothing half-written in SQLite
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn map_profile(row: &Row<'_>) -> rusqlite::Result<ProfileInfo> {
        let socials: String = row.get(7)?;
        let socials = serde_json::from_str(&socials)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;
        Ok(ProfileInfo {
            owner_id: row.get(0)?,
            username: row.get(1)?,
            bio: row.get(2)?,
            avatar_url: row.get(3)?,
            view_count: row.get(4)?,
            socials,
            created_at: timestamp_to_datetime(row.get(5)?),
            updated_at: timestamp_to_datetime(row.get(6)?),
        })
    }

    /// Get a profile by owner ID
    pub fn get(&self, owner_id: &str) -> Result<Option<ProfileInfo>, rusqlite::Error> {
        let conn = self.lock();
        conn.query_row(
            "SELECT owner_id, username, bio, avatar_url, view_count, created_at, updated_at, socials
             FROM profiles WHERE owner_id = ?",
            [owner_id],
            Self::map_profile,
        )
        .optional()
    }

    /// Get a profile by its public username (case-insensitive)
    pub fn get_by_username(&self, username: &str) -> Result<Option<ProfileInfo>, rusqlite::Error> {
        let conn = self.lock();
        conn.query_row(
            "SELECT owner_id, username, bio, avatar_url, view_count, created_at, updated_at, socials
             FROM profiles WHERE username = ?",
            [username.trim().to_ascii_lowercase()],
            Self::map_profile,
        )
        .optional()
    }

    /// Check whether a username is held by another owner
    pub fn is_username_taken(&self, username: &str, owner_id: &str) -> Result<bool, rusqlite::Error> {
        let conn = self.lock();
        let holder: Option<String> = conn
            .query_row(
                "SELECT owner_id FROM profiles WHERE username = ?",
                [username],
                |row| row.get(0),
            )
            .optional()?;
        Ok(holder.is_some_and(|holder| holder != owner_id))
    }

    /// Create or update the owner's profile. `username` and `update.socials`
    /// must already be normalized.
    pub fn upsert(
        &self,
        owner_id: &str,
        username: &str,
        update: &ProfileUpdate,
    ) -> Result<ProfileInfo, rusqlite::Error> {
        let socials = serde_json::to_string(&update.socials)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        {
            let conn = self.lock();
            let now = Utc::now().timestamp();
            conn.execute(
                "INSERT INTO profiles (owner_id, username, bio, avatar_url, socials, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(owner_id) DO UPDATE SET
                    username = excluded.username,
                    bio = excluded.bio,
                    avatar_url = excluded.avatar_url,
                    socials = excluded.socials,
                    updated_at = excluded.updated_at",
                params![owner_id, username, update.bio, update.avatar_url, socials, now, now],
            )?;
        }

        self.get(owner_id)?
            .ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    /// Count one public page view
    pub fn increment_views(&self, username: &str) -> Result<bool, rusqlite::Error> {
        let conn = self.lock();
        let changed = conn.execute(
            "UPDATE profiles SET view_count = view_count + 1 WHERE username = ?",
            [username.trim().to_ascii_lowercase()],
        )?;
        Ok(changed > 0)
    }
}

fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{SocialPlatform, init_database};

    fn setup_test_db() -> ProfileRepo {
        let conn = Connection::open_in_memory().unwrap();
        init_database(&conn).unwrap();
        ProfileRepo::new(conn)
    }

    fn update(username: &str) -> ProfileUpdate {
        ProfileUpdate {
            username: username.to_string(),
            bio: Some("hello".to_string()),
            avatar_url: None,
            socials: SocialLinks::new(),
        }
    }

    #[test]
    fn test_normalize_username() {
        assert_eq!(normalize_username(" Alice_01 ").as_deref(), Some("alice_01"));
        assert_eq!(normalize_username("ab"), None);
        assert_eq!(normalize_username("has space"), None);
        assert_eq!(normalize_username("slash/es"), None);
        assert_eq!(normalize_username(&"x".repeat(33)), None);
    }

    #[test]
    fn test_profile_upsert_and_lookup() {
        let repo = setup_test_db();
        let created = repo.upsert("owner-1", "alice", &update("alice")).unwrap();
        assert_eq!(created.username, "alice");
        assert_eq!(created.view_count, 0);

        let found = repo.get_by_username("Alice").unwrap().unwrap();
        assert_eq!(found.owner_id, "owner-1");
        assert_eq!(
            found.avatar_or_default(),
            "https://api.dicebear.com/9.x/dylan/svg?seed=alice"
        );

        // Rename keeps the row
        let renamed = repo.upsert("owner-1", "alicia", &update("alicia")).unwrap();
        assert_eq!(renamed.created_at, created.created_at);
        assert!(repo.get_by_username("alice").unwrap().is_none());
    }

    #[test]
    fn test_socials_round_trip() {
        let repo = setup_test_db();
        let mut profile = update("alice");
        profile
            .socials
            .insert(SocialPlatform::Github, "https://github.com/alice".into());
        repo.upsert("owner-1", "alice", &profile).unwrap();

        let found = repo.get("owner-1").unwrap().unwrap();
        assert_eq!(
            found.socials.get(&SocialPlatform::Github).map(String::as_str),
            Some("https://github.com/alice")
        );

        // Saving without socials clears them
        repo.upsert("owner-1", "alice", &update("alice")).unwrap();
        assert!(repo.get("owner-1").unwrap().unwrap().socials.is_empty());
    }

    #[test]
    fn test_username_taken() {
        let repo = setup_test_db();
        repo.upsert("owner-1", "alice", &update("alice")).unwrap();
        assert!(repo.is_username_taken("alice", "owner-2").unwrap());
        assert!(!repo.is_username_taken("alice", "owner-1").unwrap());
        assert!(!repo.is_username_taken("bob", "owner-2").unwrap());
        assert!(repo.upsert("owner-2", "alice", &update("alice")).is_err());
    }

    #[test]
    fn test_increment_views() {
        let repo = setup_test_db();
        repo.upsert("owner-1", "alice", &update("alice")).unwrap();
        assert!(repo.increment_views("alice").unwrap());
        assert!(repo.increment_views("alice").unwrap());
        assert!(!repo.increment_views("nobody").unwrap());
        assert_eq!(repo.get("owner-1").unwrap().unwrap().view_count, 2);
    }
}
