//! single-thread-shared-ptr: a single-threaded shared-ownership pointer
//! that keeps its owner count inline until a second owner actually shows
//! up.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: behave exactly like a reference-counted pointer when aliasing
//!   occurs, while paying nothing beyond a `Box` in the common case of a
//!   single owner.
//! - Layers:
//!   - Counter: owner count with two representations. `Local(0 | 1)` lives
//!     inline; `Shared(cell)` points at a heap cell holding the true count
//!     and is used once two or more owners exist. The cell is counted by
//!     the Counters referencing it.
//!   - Pointee: a type-erased destroy handle captured when ownership is
//!     first acquired, copied to every member of the group.
//!   - SharedPtr<T>: public pointer pairing an exposed address with a
//!     Counter and the group's Pointee. Comparison and hashing live in
//!     `cmp`.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync`, no atomics.
//! - One allocation point: promoting a sole owner's count to a shared
//!   cell. It is fallible through the `try_*` methods and aborts through
//!   `handle_alloc_error` in the infallible ones, like `Rc`.
//! - Only SharedPtr destroys pointees; Counter only reports whether its
//!   holder is the last owner.
//!
//! Representation invariant
//! - A Counter is `Shared` iff its group has two or more owners when it is
//!   observed. When siblings drop down to a single member, the survivor
//!   reclaims the cell on its next query and returns to `Local(1)`.
//! - A Counter with count 0 is never the last owner of anything.
//!
//! Aliasing
//! - `project`, `alias` and `into_project` expose an address other than
//!   the owned one (a field, a trait-object view). Destruction always goes
//!   through the Pointee captured at adoption, so the original type's
//!   destructor runs regardless of what the last surviving alias exposes.
//!
//! Overflow semantics
//! - Owner-count overflow aborts the process, matching `Rc`.
//!
//! Notes and non-goals
//! - No weak pointers. Cycles of `SharedPtr` leak; break them with
//!   non-owning back-references.
//! - No custom deleters or allocators beyond `Box`.
//! - No thread hand-off; use an atomically counted pointer for that.

/// Emits a `tracing` trace-level event when the `trace` feature is on.
macro_rules! trace_event {
    ($($arg:tt)*) => {{
        #[cfg(feature = "trace")]
        ::tracing::trace!($($arg)*);
    }};
}
pub(crate) use trace_event;

mod cmp;
pub mod counter;
#[cfg(test)]
mod counter_proptest;
mod error;
mod pointee;
mod shared_ptr;

// Public surface
pub use cmp::NullPtr;
pub use counter::Counter;
pub use error::{Error, Result};
pub use shared_ptr::SharedPtr;
