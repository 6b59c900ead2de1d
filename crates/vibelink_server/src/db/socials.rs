//! Social links shown as an icon bar under the profile header.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use vibelink_core::block::is_allowed_target;

/// Supported platforms, declared in the order the bar shows them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialPlatform {
    Email,
    Website,
    Instagram,
    Twitter,
    Youtube,
    Twitch,
    Github,
    Linkedin,
    Facebook,
}

/// Platform to link, as stored in the `profiles.socials` column
pub type SocialLinks = BTreeMap<SocialPlatform, String>;

/// One icon of the social bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SocialLink {
    pub platform: SocialPlatform,
    pub href: String,
}

/// A social link that is not a followable URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSocial {
    pub platform: SocialPlatform,
    pub value: String,
}

impl fmt::Display for InvalidSocial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {:?} link: {}", self.platform, self.value)
    }
}

impl std::error::Error for InvalidSocial {}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Turn what an owner typed into an href.
///
/// Blank input removes the link (`Ok(None)`). Email addresses get a `mailto:`
/// prefix and bare hosts get `https://`. The result must be a `mailto:` URL
/// for email and an `http(s)` URL for every other platform.
pub fn normalize_social(platform: SocialPlatform, raw: &str) -> Result<Option<String>, InvalidSocial> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let href = match platform {
        SocialPlatform::Email if starts_with_ignore_case(raw, "mailto:") => raw.to_string(),
        SocialPlatform::Email => format!("mailto:{raw}"),
        _ if starts_with_ignore_case(raw, "http") => raw.to_string(),
        _ => format!("https://{raw}"),
    };

    let scheme_fits = match platform {
        SocialPlatform::Email => starts_with_ignore_case(&href, "mailto:"),
        _ => !starts_with_ignore_case(&href, "mailto:"),
    };
    if !scheme_fits || !is_allowed_target(&href) {
        return Err(InvalidSocial {
            platform,
            value: raw.to_string(),
        });
    }
    Ok(Some(href))
}

/// Normalize every entry, dropping blank ones.
pub fn normalize_socials(links: &SocialLinks) -> Result<SocialLinks, InvalidSocial> {
    let mut normalized = SocialLinks::new();
    for (&platform, raw) in links {
        if let Some(href) = normalize_social(platform, raw)? {
            normalized.insert(platform, href);
        }
    }
    Ok(normalized)
}

/// Icons to draw, in bar order
pub fn social_bar(links: &SocialLinks) -> Vec<SocialLink> {
    links
        .iter()
        .filter(|(_, href)| is_allowed_target(href))
        .map(|(&platform, href)| SocialLink {
            platform,
            href: href.clone(),
        })
        .collect()
}
