//! Database models split into separate files.
//! This module re-exports individual model modules so imports like
//! `use crate::db::models::*;` keep working.

pub mod assignment;
pub mod day;
pub mod mic_group;
pub mod mic_type;
pub mod presenter_slot;
pub mod session;

pub use self::assignment::*;
pub use self::day::*;
pub use self::mic_group::*;
pub use self::mic_type::*;
pub use self::presenter_slot::*;
pub use self::session::*;
