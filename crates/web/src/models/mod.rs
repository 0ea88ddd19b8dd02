//! Domain models.
//!
//! Validated domain objects, separate from database row types and from the
//! billing gateway's wire shapes.

pub mod exercise;
pub mod routine;
pub mod session;
pub mod user;

pub use exercise::Exercise;
pub use routine::{Routine, RoutineWithExercises};
pub use session::CurrentUser;
pub use user::{Address, PaymentLink, Profile, User};
