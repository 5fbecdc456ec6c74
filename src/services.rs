pub mod auth;
pub mod digest_service;
pub mod flow_service;
pub mod mail;
pub mod process_service;
