//! VibeLink Server
//!
//! Serves the owner dashboard API and public profile pages on top of
//! `vibelink_core`.
//!
//! ## Features
//!
//! - **Owner API**: create, edit, delete and reorder blocks (`/api/blocks`)
//! - **Public pages**: ordered render plans per profile (`/u/{username}`),
//!   with channel blocks resolved server-side
//! - **Gated links**: passphrases are checked server-side, the target is
//!   only sent after a match
//! - **Persistent storage**: SQLite for profiles and blocks
//!
//! ## Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 3040)
//! - `DATABASE_PATH`: Path to SQLite database (default: ./vibelink.db)
//! - `OWNER_HEADER`: Header carrying the signed-in owner id (default: x-vibelink-owner)
//! - `CHANNEL_CACHE_TTL_SECS`: Feed cache window (default: 3600)
//! - `RESOLVER_TIMEOUT_SECS`: Page/feed fetch timeout (default: 10)
//! - `RESOLVER_USER_AGENT`: User agent for outbound fetches
//! - `CORS_ORIGINS`: Comma-separated list of allowed origins

pub mod auth;
pub mod config;
pub mod db;
pub mod handlers;

#[cfg(test)]
mod test_support;

pub use config::Config;
