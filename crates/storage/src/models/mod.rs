mod exercise;
mod user;
mod workout;

pub use exercise::Exercise;
pub use user::User;
pub use workout::{Workout, WorkoutSummary};
