//! Synchronization primitives for the dining table.
//!
//! - Utensils: bounded-wait exclusive locks with a visible waiting count
//! - Atomic flags and counters shared between the table and philosophers

pub mod atomic;
pub mod utensil;

pub use atomic::{MealCounter, StopFlag};
pub use utensil::{Utensil, UtensilGuard, UtensilStats};
