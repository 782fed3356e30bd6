//! Counter: owner counting with an inline fast path and a shared heap cell.
//!
//! A group with zero or one owner keeps its count inline (`Local`). The
//! moment a second owner joins, the count is promoted to a heap cell that
//! every member references (`Shared`). The cell is reference-counted by the
//! very Counters that point at it, so its value is also the group size.

use crate::error::{Error, Result};
use core::cell::Cell;
use core::fmt;
use core::marker::PhantomData;
use core::ptr::NonNull;
use std::alloc::{alloc, dealloc, handle_alloc_error, Layout};

/// Heap cell backing a promoted group. Freed when `owners` reaches zero.
struct SharedCount {
    owners: Cell<usize>,
}

impl SharedCount {
    const LAYOUT: Layout = Layout::new::<SharedCount>();

    fn allocate(owners: usize) -> Result<NonNull<SharedCount>> {
        // Safety: SharedCount is not zero-sized.
        let raw = unsafe { alloc(Self::LAYOUT) } as *mut SharedCount;
        let cell = NonNull::new(raw).ok_or(Error::OutOfMemory {
            size: Self::LAYOUT.size(),
        })?;
        unsafe {
            cell.as_ptr().write(SharedCount {
                owners: Cell::new(owners),
            })
        };
        Ok(cell)
    }

    /// Safety: `cell` came from `allocate` and nothing references it anymore.
    unsafe fn free(cell: NonNull<SharedCount>) {
        dealloc(cell.as_ptr().cast(), Self::LAYOUT);
    }

    #[inline]
    fn increment(&self) -> usize {
        let n = self.owners.get().wrapping_add(1);
        if n == 0 {
            // Same policy as Rc: abort rather than continue with a wrapped count.
            std::process::abort();
        }
        self.owners.set(n);
        n
    }

    #[inline]
    fn decrement(&self) -> usize {
        let c = self.owners.get();
        debug_assert!(c > 0, "shared owner count underflow");
        let n = c - 1;
        self.owners.set(n);
        n
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Storage {
    /// Inline count; only ever 0 or 1.
    Local(usize),
    /// One reference to a shared cell, counted in the cell itself.
    Shared(NonNull<SharedCount>),
}

const EMPTY: Storage = Storage::Local(0);
const OWNING: Storage = Storage::Local(1);

/// Tracks how many owners share one object.
///
/// Counter never destroys the object it counts for; it only answers "how
/// many owners are there" and "am I the last one". Deleting the pointee is
/// the caller's job.
pub struct Counter {
    // Cell because copying a sole owner promotes the *source* as well.
    storage: Cell<Storage>,
    // !Send + !Sync: no atomics anywhere.
    _nosend: PhantomData<*mut ()>,
}

impl Counter {
    /// A counter for nothing: count 0, no allocation.
    pub const fn empty() -> Self {
        Self::from_storage(EMPTY)
    }

    /// A counter for a freshly adopted object: count 1, no allocation.
    pub const fn owning() -> Self {
        Self::from_storage(OWNING)
    }

    const fn from_storage(storage: Storage) -> Self {
        Self {
            storage: Cell::new(storage),
            _nosend: PhantomData,
        }
    }

    /// Reads the representation, reclaiming a shared cell that only this
    /// counter still references.
    fn settle(&self) -> Storage {
        let storage = self.storage.get();
        match storage {
            Storage::Local(n) => {
                debug_assert!(n <= 1, "local owner count above one");
                storage
            }
            Storage::Shared(cell) => {
                // Safety: this counter holds one reference to the cell.
                if unsafe { cell.as_ref() }.owners.get() == 1 {
                    unsafe { SharedCount::free(cell) };
                    self.storage.set(OWNING);
                    crate::trace_event!("owner group back to a single owner, shared count reclaimed");
                    OWNING
                } else {
                    storage
                }
            }
        }
    }

    /// Joins the owner group of `self`, returning the new member.
    ///
    /// Copying an empty counter yields an empty counter. Copying a sole
    /// owner allocates the shared cell (count 2) and switches both `self`
    /// and the result to it; this is the only allocation in the crate.
    /// On failure nothing changes.
    pub fn try_copy(&self) -> Result<Self> {
        match self.settle() {
            Storage::Local(0) => Ok(Self::empty()),
            Storage::Local(_) => {
                let cell = SharedCount::allocate(2)?;
                self.storage.set(Storage::Shared(cell));
                crate::trace_event!(owners = 2usize, "owner count promoted to shared cell");
                Ok(Self::from_storage(Storage::Shared(cell)))
            }
            Storage::Shared(cell) => {
                // Safety: the cell is alive while `self` references it.
                unsafe { cell.as_ref() }.increment();
                Ok(Self::from_storage(Storage::Shared(cell)))
            }
        }
    }

    /// Moves this counter's slot out, leaving `self` empty. The group size
    /// does not change.
    pub fn take(&mut self) -> Self {
        Self::from_storage(self.storage.replace(EMPTY))
    }

    /// Leaves the owner group. Frees the shared cell if this was its last
    /// reference. `self` is empty afterwards.
    pub fn release(&mut self) {
        if let Storage::Shared(cell) = self.storage.replace(EMPTY) {
            // Safety: our reference to the cell is being returned here.
            if unsafe { cell.as_ref() }.decrement() == 0 {
                unsafe { SharedCount::free(cell) };
                crate::trace_event!("shared owner count freed");
            }
        }
    }

    /// Number of owners in the group, O(1).
    pub fn count(&self) -> usize {
        match self.settle() {
            Storage::Local(n) => n,
            // Safety: the cell is alive while `self` references it.
            Storage::Shared(cell) => unsafe { cell.as_ref() }.owners.get(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// True when exactly one owner remains. An empty counter is never the
    /// last owner of anything.
    pub fn is_sole_owner(&self) -> bool {
        self.count() == 1
    }

    /// True while the count lives in a shared heap cell (two or more owners).
    pub fn is_shared(&self) -> bool {
        matches!(self.settle(), Storage::Shared(_))
    }

    /// Exchanges representations; no allocation, no count changes.
    pub fn swap(&mut self, other: &mut Self) {
        self.storage.swap(&other.storage);
    }

    /// Copy-assignment: joins `other`'s group and leaves the old one.
    ///
    /// The copy is taken before the old association is released so that a
    /// failed promotion leaves `self` untouched.
    pub fn try_assign(&mut self, other: &Counter) -> Result<()> {
        let mut copy = other.try_copy()?;
        self.release();
        self.swap(&mut copy);
        Ok(())
    }

    /// Move-assignment: leaves the old group, then takes `other`'s slot.
    pub fn assign_move(&mut self, other: &mut Counter) {
        self.release();
        let storage = other.storage.replace(EMPTY);
        self.storage.set(storage);
    }

    pub(crate) fn same_group(&self, other: &Counter) -> bool {
        match (self.storage.get(), other.storage.get()) {
            (Storage::Shared(a), Storage::Shared(b)) => a == b,
            _ => false,
        }
    }
}

impl Clone for Counter {
    fn clone(&self) -> Self {
        match self.try_copy() {
            Ok(c) => c,
            Err(Error::OutOfMemory { .. }) => handle_alloc_error(SharedCount::LAYOUT),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        if let Err(Error::OutOfMemory { .. }) = self.try_assign(source) {
            handle_alloc_error(SharedCount::LAYOUT)
        }
    }
}

impl Drop for Counter {
    fn drop(&mut self) {
        self.release();
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Counter")
            .field("count", &self.count())
            .field("shared", &self.is_shared())
            .finish()
    }
}
