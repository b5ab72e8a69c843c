//! Database models split into separate files.
//! This module re-exports individual model modules so imports like
//! `use crate::db::models::*;` work.

pub mod event;
pub mod planning;
pub mod user;

pub use self::event::*;
pub use self::planning::*;
pub use self::user::*;
