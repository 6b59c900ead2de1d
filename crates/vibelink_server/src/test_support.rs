//! Shared fixtures for handler tests.

use crate::auth::{AuthOwner, RequireOwner};
use crate::db::{ProfileRepo, ProfileUpdate, init_database};
use crate::handlers::{api::ApiState, profile::ProfileState};
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::Arc;
use vibelink_core::{
    channel::{ChannelResolver, FetchError, PageFetcher},
    config::ResolverConfig,
    future::BoxFuture,
    store::{BlockStore, MemoryDataStore},
};

/// Fetcher serving canned bodies; unknown URLs answer 404
#[derive(Default)]
pub struct StaticFetcher {
    pages: HashMap<String, String>,
}

impl StaticFetcher {
    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }
}

impl PageFetcher for StaticFetcher {
    fn fetch_text<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<String, FetchError>> {
        let result = self.pages.get(url).cloned().ok_or(FetchError::Status {
            url: url.to_string(),
            status: 404,
        });
        Box::pin(std::future::ready(result))
    }
}

pub fn owner(owner_id: &str) -> RequireOwner {
    RequireOwner(AuthOwner {
        owner_id: owner_id.to_string(),
        profile: None,
    })
}

/// Repo holding one profile, `alice` owned by `owner-1`
pub fn seeded_repo() -> Arc<ProfileRepo> {
    let conn = Connection::open_in_memory().unwrap();
    init_database(&conn).unwrap();
    let repo = ProfileRepo::new(conn);
    repo.upsert(
        "owner-1",
        "alice",
        &ProfileUpdate {
            username: "alice".into(),
            ..Default::default()
        },
    )
    .unwrap();
    Arc::new(repo)
}

fn resolver(fetcher: StaticFetcher) -> Arc<ChannelResolver> {
    Arc::new(ChannelResolver::new(
        Arc::new(fetcher),
        &ResolverConfig::default(),
    ))
}

pub fn profile_state(fetcher: StaticFetcher) -> ProfileState {
    ProfileState {
        repo: seeded_repo(),
        store: BlockStore::new(Arc::new(MemoryDataStore::new())),
        resolver: resolver(fetcher),
    }
}

pub fn api_state(fetcher: StaticFetcher) -> ApiState {
    ApiState {
        repo: seeded_repo(),
        resolver: resolver(fetcher),
    }
}
