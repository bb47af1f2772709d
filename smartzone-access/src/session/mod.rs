//! Session Resolution Module
//!
//! The background resolver, the flag stores feeding its bypass path,
//! the demo credential directory and in-memory backends for tests and
//! local development.

pub mod directory;
pub mod flags;
pub mod memory;
pub mod resolver;

pub use directory::{DemoDirectory, DemoUser};
pub use flags::{JsonFileFlagStore, MemoryFlagStore};
pub use memory::{MemoryProfileStore, MemorySessionService};
pub use resolver::{Resolution, SessionResolver};
