use rusqlite::Connection;

/// SQL schema for profile tables. Blocks live in the core data store.
const SCHEMA: &str = r#"
-- Profiles (one per owner, addressed publicly by username)
CREATE TABLE IF NOT EXISTS profiles (
    owner_id TEXT PRIMARY KEY,
    username TEXT UNIQUE NOT NULL,
    bio TEXT,
    avatar_url TEXT,
    view_count INTEGER NOT NULL DEFAULT 0,
    -- JSON object of platform -> href
    socials TEXT NOT NULL DEFAULT '{}',
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_profiles_username ON profiles(username);
"#;

/// Initialize the database with the profile schema
pub fn init_database(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
