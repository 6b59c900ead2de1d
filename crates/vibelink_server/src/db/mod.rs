mod repo;
mod schema;
mod socials;

pub use repo::{ProfileInfo, ProfileRepo, ProfileUpdate, normalize_username};
pub use schema::init_database;
pub use socials::{
    InvalidSocial, SocialLink, SocialLinks, SocialPlatform, normalize_socials, social_bar,
};
