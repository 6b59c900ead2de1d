//! VibeLink core: the profile block engine.
//!
//! A profile owner keeps an ordered list of heterogeneous [`block::Block`]s
//! (links, video and audio embeds, section headers, passphrase-gated links and
//! "latest video from channel" blocks). This crate owns:
//!
//! - the block model and its validation rules ([`block`])
//! - the block store and the data-store port it runs against ([`store`])
//! - render plan resolution per block type ([`render`], [`embed`])
//! - optimistic drag-to-reorder with ordered persistence ([`reorder`])
//! - the gated-content unlock machine ([`unlock`])
//! - the channel latest-content resolver with its feed cache ([`channel`])
//!
//! The crate is runtime-agnostic: every port returns a boxed future
//! ([`future::BoxFuture`]) so it can be driven by tokio on a server or by
//! `block_on` in tests.
#![warn(missing_docs)]

/// Block model, validation and field patches
pub mod block;

/// Channel latest-content resolution (direct id, page scrape, feed parse)
pub mod channel;

/// Configuration options
pub mod config;

/// Provider-specific embed extraction (video ids, audio embed rewriting)
pub mod embed;

/// Error (common error types)
pub mod error;

/// Boxed future alias shared by all async ports
pub mod future;

/// Render plans per block type
pub mod render;

/// Optimistic reordering and editor sessions
pub mod reorder;

/// Block store service and data-store backends
pub mod store;

/// Gated-content unlock state machine
pub mod unlock;

#[cfg(test)]
pub mod test_utils;
