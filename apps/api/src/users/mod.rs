// Users: onboarding, profiles and course suggestions.

pub mod handlers;
pub mod skills;
