use thiserror::Error;

/// Errors surfaced by the fallible (`try_*`) operations.
///
/// The only runtime failure in this crate is the allocation of a shared
/// owner-count cell, which happens when a second owner joins a group.
/// Everything else is either infallible or a fatal contract violation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum Error {
    #[error("out of memory: failed to allocate {size} bytes for a shared owner count")]
    OutOfMemory { size: usize },
}

pub type Result<T> = core::result::Result<T, Error>;
