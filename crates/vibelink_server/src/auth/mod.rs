mod middleware;

pub use middleware::{AuthOwner, OptionalOwner, OwnerExtractor, RequireOwner};
