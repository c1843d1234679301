pub mod common;
pub mod user;
pub mod workout;
