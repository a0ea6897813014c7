//! Filesystem helpers for vigil.

mod atomic;

pub use atomic::{atomic_write, atomic_write_file};
