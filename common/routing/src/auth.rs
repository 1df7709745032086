pub mod catalog_roles;
pub mod claims;
pub mod oauth;
pub mod roles;
pub mod token;
pub mod user;
