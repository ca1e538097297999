//! Process bootstrap and caller-side retry helpers.

pub mod bootstrap;
pub mod retry;
