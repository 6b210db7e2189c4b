//! Match rules.
//!
//! Pure functions over a [`Board`](crate::Board), kept apart from the
//! board storage so [`Match`](crate::Match) can compose them.

mod draw;
mod win;

pub use draw::is_full;
pub use win::{LINES, has_line};
