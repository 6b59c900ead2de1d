//! The block model.
//!
//! A [`Block`] is one ordered unit of content on a profile. Its type is the
//! closed sum [`BlockKind`]: each variant carries only the fields it needs, so
//! a header can never have a target and only a gated link has a secret.
//!
//! Serialized blocks are flat objects tagged by `type`:
//!
//! ```json
//! { "id": "…", "owner_id": "…", "title": "Secret mixtape",
//!   "type": "gated_link", "target": "https://…", "secret": "open",
//!   "position": 2, "style": "alternate", "interaction_count": 17 }
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use url::Url;

use crate::error::ValidationError;

/// Visual variant of a block. Purely presentational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum BlockStyle {
    /// The default accent
    #[default]
    Primary,
    /// The secondary accent
    Alternate,
}

impl BlockStyle {
    /// Storage/wire name of the style
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockStyle::Primary => "primary",
            BlockStyle::Alternate => "alternate",
        }
    }

    /// Parse a stored style name
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value {
            "primary" => Ok(BlockStyle::Primary),
            "alternate" => Ok(BlockStyle::Alternate),
            other => Err(ValidationError::UnknownStyle(other.to_string())),
        }
    }

    /// The other style
    pub fn toggled(self) -> Self {
        match self {
            BlockStyle::Primary => BlockStyle::Alternate,
            BlockStyle::Alternate => BlockStyle::Primary,
        }
    }
}

/// The type of a block together with the fields that type needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    /// Plain outbound link
    Link {
        /// Destination URL
        target: String,
    },
    /// A single embedded video (watch-page URL)
    Video {
        /// Watch-page or short URL
        target: String,
    },
    /// Embeds whatever the channel published most recently
    ChannelLatest {
        /// Channel page URL
        target: String,
    },
    /// Embedded audio player (share URL rewritten into an embed)
    AudioEmbed {
        /// Share URL of a track, album or playlist
        target: String,
    },
    /// Section header; the block title is the header text
    Header,
    /// Link hidden behind a passphrase
    GatedLink {
        /// Destination URL, revealed after unlock
        target: String,
        /// Plaintext passphrase
        secret: String,
    },
}

impl BlockKind {
    /// All type names, in declaration order
    pub const TYPE_NAMES: [&'static str; 6] = [
        "link",
        "video",
        "channel_latest",
        "audio_embed",
        "header",
        "gated_link",
    ];

    /// Storage/wire name of the type
    pub fn type_name(&self) -> &'static str {
        match self {
            BlockKind::Link { .. } => "link",
            BlockKind::Video { .. } => "video",
            BlockKind::ChannelLatest { .. } => "channel_latest",
            BlockKind::AudioEmbed { .. } => "audio_embed",
            BlockKind::Header => "header",
            BlockKind::GatedLink { .. } => "gated_link",
        }
    }

    /// The target URL, for every type that has one
    pub fn target(&self) -> Option<&str> {
        match self {
            BlockKind::Link { target }
            | BlockKind::Video { target }
            | BlockKind::ChannelLatest { target }
            | BlockKind::AudioEmbed { target }
            | BlockKind::GatedLink { target, .. } => Some(target),
            BlockKind::Header => None,
        }
    }

    fn target_mut(&mut self) -> Option<&mut String> {
        match self {
            BlockKind::Link { target }
            | BlockKind::Video { target }
            | BlockKind::ChannelLatest { target }
            | BlockKind::AudioEmbed { target }
            | BlockKind::GatedLink { target, .. } => Some(target),
            BlockKind::Header => None,
        }
    }

    /// The passphrase of a gated link
    pub fn secret(&self) -> Option<&str> {
        match self {
            BlockKind::GatedLink { secret, .. } => Some(secret),
            _ => None,
        }
    }

    /// Rebuild a kind from its flat stored parts.
    ///
    /// A secret on anything but a gated link, or a missing secret on a gated
    /// link, is rejected so the "secret iff gated" rule holds for every row
    /// read back from the data store.
    pub fn from_parts(
        type_name: &str,
        target: Option<String>,
        secret: Option<String>,
    ) -> Result<Self, ValidationError> {
        let target = target.unwrap_or_default();

        if type_name != "gated_link" && secret.is_some() {
            return Err(ValidationError::FieldNotApplicable {
                field: "secret",
                kind: Self::static_name(type_name)?,
            });
        }

        let kind = match type_name {
            "link" => BlockKind::Link { target },
            "video" => BlockKind::Video { target },
            "channel_latest" => BlockKind::ChannelLatest { target },
            "audio_embed" => BlockKind::AudioEmbed { target },
            "header" => BlockKind::Header,
            "gated_link" => BlockKind::GatedLink {
                target,
                secret: secret.ok_or(ValidationError::EmptySecret)?,
            },
            other => return Err(ValidationError::UnknownKind(other.to_string())),
        };
        Ok(kind)
    }

    fn static_name(type_name: &str) -> Result<&'static str, ValidationError> {
        Self::TYPE_NAMES
            .iter()
            .copied()
            .find(|name| *name == type_name)
            .ok_or_else(|| ValidationError::UnknownKind(type_name.to_string()))
    }

    /// Whether the block has nothing to point at yet.
    ///
    /// Drafts are stored but never rendered publicly. Headers are never drafts.
    pub fn is_draft(&self) -> bool {
        self.target().is_some_and(|t| t.trim().is_empty())
    }
}

/// One ordered content unit on a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Stable unique identifier
    pub id: String,
    /// Profile owner; every query is scoped by it
    pub owner_id: String,
    /// Display label (section text for headers)
    pub title: String,
    /// Type and type-specific fields
    #[serde(flatten)]
    pub kind: BlockKind,
    /// Dense zero-based render rank within the owner
    pub position: u32,
    /// Visual variant
    #[serde(default)]
    pub style: BlockStyle,
    /// Icon key (`youtube`, `music`, …); unknown keys render the generic icon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Number of recorded clicks; owner-visible only
    #[serde(default)]
    pub interaction_count: u64,
}

impl Block {
    /// Apply a partial field edit. Never touches `position`.
    ///
    /// The block is left unchanged if the patch does not validate.
    pub fn apply_patch(&mut self, patch: &BlockPatch) -> Result<(), ValidationError> {
        let mut next = self.clone();

        if let Some(title) = &patch.title {
            next.title = title.clone();
        }

        if let Some(target) = &patch.target {
            match next.kind.target_mut() {
                Some(slot) => *slot = target.trim().to_string(),
                None => {
                    return Err(ValidationError::FieldNotApplicable {
                        field: "target",
                        kind: next.kind.type_name(),
                    });
                }
            }
        }

        if let Some(new_secret) = &patch.secret {
            match &mut next.kind {
                BlockKind::GatedLink { secret, .. } => *secret = new_secret.clone(),
                other => {
                    return Err(ValidationError::FieldNotApplicable {
                        field: "secret",
                        kind: other.type_name(),
                    });
                }
            }
        }

        if let Some(style) = patch.style {
            next.style = style;
        }

        if let Some(icon) = &patch.icon {
            next.icon = normalize_icon(icon);
        }

        validate_fields(&next.title, &next.kind)?;
        *self = next;
        Ok(())
    }
}

/// Fields supplied by the owner when creating a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBlock {
    /// Display label
    pub title: String,
    /// Type and type-specific fields
    #[serde(flatten)]
    pub kind: BlockKind,
    /// Visual variant
    #[serde(default)]
    pub style: BlockStyle,
    /// Icon key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl NewBlock {
    /// A primary-style block without icon
    pub fn new(title: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            title: title.into(),
            kind,
            style: BlockStyle::default(),
            icon: None,
        }
    }

    /// Builder: set the style
    pub fn with_style(mut self, style: BlockStyle) -> Self {
        self.style = style;
        self
    }

    /// Builder: set the icon key
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = normalize_icon(&icon.into());
        self
    }

    /// Check the creation rules without touching any store.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_fields(&self.title, &self.kind)
    }
}

/// A partial edit. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockPatch {
    /// New title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New target (not allowed on headers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// New passphrase (gated links only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    /// New style
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<BlockStyle>,
    /// New icon key; an empty string clears the icon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl BlockPatch {
    /// Whether the patch changes nothing
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.target.is_none()
            && self.secret.is_none()
            && self.style.is_none()
            && self.icon.is_none()
    }
}

fn normalize_icon(icon: &str) -> Option<String> {
    let icon = icon.trim();
    (!icon.is_empty()).then(|| icon.to_string())
}

/// Validate the owner-editable fields of a block.
///
/// - every type except `header` needs a non-blank title
/// - a gated link needs a non-empty secret
/// - a non-empty target must be an absolute `http`, `https` or `mailto` URL;
///   an empty target is tolerated so owners can save drafts
pub fn validate_fields(title: &str, kind: &BlockKind) -> Result<(), ValidationError> {
    if !matches!(kind, BlockKind::Header) && title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle(kind.type_name()));
    }

    if let Some(secret) = kind.secret()
        && secret.is_empty()
    {
        return Err(ValidationError::EmptySecret);
    }

    if let Some(target) = kind.target() {
        let target = target.trim();
        if !target.is_empty() && !is_allowed_target(target) {
            return Err(ValidationError::InvalidTarget(target.to_string()));
        }
    }

    Ok(())
}

/// Schemes a visitor may be sent to.
const ALLOWED_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

/// Whether `target` parses as a URL with a scheme visitors may follow.
pub fn is_allowed_target(target: &str) -> bool {
    Url::parse(target.trim()).is_ok_and(|url| ALLOWED_SCHEMES.contains(&url.scheme()))
}
