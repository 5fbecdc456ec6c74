pub mod auth;
pub mod digest;
pub mod flow;
pub mod note;
pub mod process;
pub mod role;
pub mod stage;
pub mod unit;
