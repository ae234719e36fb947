//! Internal data structures.
//!
//! This module provides a [`Slab`] used by each execution context to park
//! the settle handles of in-flight relays behind small, generation-checked
//! keys that can safely travel to worker threads.

mod slab;

pub(crate) use slab::{Key, Slab};
