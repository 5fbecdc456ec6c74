pub mod auth;
pub mod flows;
pub mod notes;
pub mod notifications;
pub mod processes;
pub mod roles;
pub mod stages;
pub mod units;
pub mod users;
