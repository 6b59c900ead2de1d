//! Render plans.
//!
//! [`resolve`] is a total function over [`BlockKind`]: every block type maps to
//! exactly one plan variant, or to nothing when the block cannot be drawn
//! without breaking the page (drafts, embeds whose URL does not yield a
//! player source).
//!
//! Gated links always resolve to [`RenderPlan::Gated`], which carries no
//! target. The link plan is only reachable through
//! [`crate::unlock::GatedBlock`].

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::block::{Block, BlockKind, BlockStyle, is_allowed_target};
use crate::embed::{audio_embed_src, video_embed_src};

/// Icon drawn next to a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    /// Video platform logo
    Youtube,
    /// Note glyph
    Music,
    /// Instagram logo
    Instagram,
    /// GitHub logo
    Github,
    /// Twitter logo
    Twitter,
    /// Generic link (fallback)
    Link,
    /// Closed padlock, shown on locked gated links
    Locked,
    /// Open padlock, shown once a gated link is unlocked
    Unlocked,
}

impl Icon {
    /// Map an owner-chosen icon key. Unknown or missing keys fall back to [`Icon::Link`].
    pub fn from_key(key: Option<&str>) -> Self {
        let Some(key) = key else {
            return Icon::Link;
        };

        match key.trim().to_ascii_lowercase().as_str() {
            "youtube" => Icon::Youtube,
            "music" => Icon::Music,
            "instagram" => Icon::Instagram,
            "github" => Icon::Github,
            "twitter" => Icon::Twitter,
            _ => Icon::Link,
        }
    }
}

/// Which player an embed uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum EmbedKind {
    /// Video player (16:9)
    Video,
    /// Compact audio player
    Audio,
}

/// Type-specific instructions for drawing one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderPlan {
    /// Section header
    Header {
        /// Header text
        text: String,
    },
    /// Outbound link button
    Link {
        /// Button label
        label: String,
        /// Destination
        href: String,
        /// Leading icon
        icon: Icon,
        /// Visual variant
        style: BlockStyle,
    },
    /// Embedded player
    Embed {
        /// Player type
        kind: EmbedKind,
        /// Player iframe source
        embed_src: String,
        /// Caption / accessible title
        fallback_label: String,
    },
    /// Latest item of a channel; completed asynchronously by the channel resolver
    ChannelLatest {
        /// Channel page URL to resolve
        channel_url: String,
        /// Caption
        label: String,
    },
    /// Passphrase prompt; the destination stays hidden
    Gated {
        /// Caption
        label: String,
        /// Always [`Icon::Locked`]
        icon: Icon,
    },
}

impl RenderPlan {
    /// Whether rendering must wait on an external resolution
    pub fn is_async(&self) -> bool {
        matches!(self, RenderPlan::ChannelLatest { .. })
    }
}

/// Resolve how a block is drawn. `None` means "render nothing".
pub fn resolve(block: &Block) -> Option<RenderPlan> {
    if block.kind.is_draft() {
        return None;
    }

    match &block.kind {
        BlockKind::Header => Some(RenderPlan::Header {
            text: block.title.clone(),
        }),
        BlockKind::Link { target } if !is_allowed_target(target) => {
            log::warn!("Not rendering block {} with unsafe target", block.id);
            None
        }
        BlockKind::Link { target } => Some(RenderPlan::Link {
            label: block.title.clone(),
            href: target.clone(),
            icon: Icon::from_key(block.icon.as_deref()),
            style: block.style,
        }),
        BlockKind::Video { target } => Some(RenderPlan::Embed {
            kind: EmbedKind::Video,
            embed_src: video_embed_src(target)?,
            fallback_label: block.title.clone(),
        }),
        BlockKind::AudioEmbed { target } => Some(RenderPlan::Embed {
            kind: EmbedKind::Audio,
            embed_src: audio_embed_src(target)?,
            fallback_label: block.title.clone(),
        }),
        BlockKind::ChannelLatest { target } => Some(RenderPlan::ChannelLatest {
            channel_url: target.clone(),
            label: block.title.clone(),
        }),
        BlockKind::GatedLink { .. } => Some(RenderPlan::Gated {
            label: block.title.clone(),
            icon: Icon::Locked,
        }),
    }
}

/// The link plan a gated block reveals once unlocked.
pub(crate) fn unlocked_link_plan(block: &Block) -> Option<RenderPlan> {
    match &block.kind {
        BlockKind::GatedLink { target, .. } if is_allowed_target(target) => {
            Some(RenderPlan::Link {
                label: block.title.clone(),
                href: target.clone(),
                icon: Icon::Unlocked,
                style: block.style,
            })
        }
        _ => None,
    }
}

/// Public projection of a block: what a profile visitor is allowed to see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PublicBlock {
    /// Block id (used for click tracking and unlock requests)
    pub id: String,
    /// How to draw it
    pub plan: RenderPlan,
}

/// Resolve a whole ordered list for the public page.
///
/// Blocks without a plan are dropped; order is preserved. Secrets, gated
/// targets and interaction counts never appear in the output.
pub fn render_profile(blocks: &[Block]) -> Vec<PublicBlock> {
    blocks
        .iter()
        .filter_map(|block| {
            let plan = resolve(block);
            if plan.is_none() {
                log::debug!(
                    "Skipping block {} ({}): nothing renderable",
                    block.id,
                    block.kind.type_name()
                );
            }
            plan.map(|plan| PublicBlock {
                id: block.id.clone(),
                plan,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(title: &str, kind: BlockKind) -> Block {
        Block {
            id: format!("id-{title}"),
            owner_id: "owner".into(),
            title: title.into(),
            kind,
            position: 0,
            style: BlockStyle::Alternate,
            icon: Some("GitHub".into()),
            interaction_count: 9,
        }
    }

    #[test]
    fn test_header_plan() {
        let plan = resolve(&block("Music", BlockKind::Header)).unwrap();
        assert_eq!(
            plan,
            RenderPlan::Header {
                text: "Music".into()
            }
        );
    }

    #[test]
    fn test_script_targets_never_render() {
        // Rows written before scheme checks existed
        let link = block(
            "Click",
            BlockKind::Link {
                target: "javascript:alert(document.cookie)".into(),
            },
        );
        assert_eq!(resolve(&link), None);

        let gated = block(
            "VIP",
            BlockKind::GatedLink {
                target: "javascript:alert(1)".into(),
                secret: "open".into(),
            },
        );
        assert_eq!(unlocked_link_plan(&gated), None);
    }

    #[test]
    fn test_link_plan_uses_icon_and_style() {
        let plan = resolve(&block(
            "Code",
            BlockKind::Link {
                target: "https://github.com/me".into(),
            },
        ))
        .unwrap();
        assert_eq!(
            plan,
            RenderPlan::Link {
                label: "Code".into(),
                href: "https://github.com/me".into(),
                icon: Icon::Github,
                style: BlockStyle::Alternate,
            }
        );
    }

    #[test]
    fn test_unknown_icon_falls_back() {
        assert_eq!(Icon::from_key(Some("myspace")), Icon::Link);
        assert_eq!(Icon::from_key(None), Icon::Link);
        assert_eq!(Icon::from_key(Some(" Youtube ")), Icon::Youtube);
    }

    #[test]
    fn test_video_embed_plan() {
        let plan = resolve(&block(
            "Clip",
            BlockKind::Video {
                target: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".into(),
            },
        ))
        .unwrap();
        match plan {
            RenderPlan::Embed {
                kind, embed_src, ..
            } => {
                assert_eq!(kind, EmbedKind::Video);
                assert!(embed_src.ends_with("/embed/dQw4w9WgXcQ"));
            }
            other => panic!("unexpected plan {other:?}"),
        }
    }

    #[test]
    fn test_broken_embeds_render_nothing() {
        let video = block(
            "Clip",
            BlockKind::Video {
                target: "https://example.com/not-a-video".into(),
            },
        );
        assert_eq!(resolve(&video), None);

        let audio = block(
            "Song",
            BlockKind::AudioEmbed {
                target: "https://example.com/song".into(),
            },
        );
        assert_eq!(resolve(&audio), None);
    }

    #[test]
    fn test_drafts_render_nothing() {
        let draft = block(
            "Soon",
            BlockKind::Link {
                target: String::new(),
            },
        );
        assert_eq!(resolve(&draft), None);
    }

    #[test]
    fn test_channel_plan_is_async() {
        let plan = resolve(&block(
            "Latest",
            BlockKind::ChannelLatest {
                target: "https://www.youtube.com/@creator".into(),
            },
        ))
        .unwrap();
        assert!(plan.is_async());
    }

    #[test]
    fn test_gated_plan_hides_target() {
        let gated = block(
            "VIP",
            BlockKind::GatedLink {
                target: "https://example.com/hidden".into(),
                secret: "open".into(),
            },
        );
        let plan = resolve(&gated).unwrap();
        assert_eq!(
            plan,
            RenderPlan::Gated {
                label: "VIP".into(),
                icon: Icon::Locked
            }
        );

        let json = serde_json::to_string(&render_profile(&[gated])).unwrap();
        assert!(!json.contains("example.com/hidden"));
        assert!(!json.contains("open"));
    }

    #[test]
    fn test_render_profile_keeps_order_and_drops_unrenderable() {
        let mut a = block("A", BlockKind::Header);
        a.id = "a".into();
        let mut b = block(
            "B",
            BlockKind::Video {
                target: "bogus".into(),
            },
        );
        b.id = "b".into();
        let mut c = block(
            "C",
            BlockKind::Link {
                target: "https://c.example".into(),
            },
        );
        c.id = "c".into();

        let rendered = render_profile(&[a, b, c]);
        let ids: Vec<_> = rendered.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);

        let json = serde_json::to_string(&rendered).unwrap();
        assert!(!json.contains("interaction_count"));
    }
}
