pub mod member_ref;
pub mod moderation;
pub mod profile_service;
