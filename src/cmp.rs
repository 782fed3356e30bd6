//! Identity comparisons and hashing for `SharedPtr`.
//!
//! All of these look at the exposed address only, never at the pointee's
//! value. Pointers of different pointee types compare through their thin
//! addresses, and every empty pointer sits at null.

use crate::shared_ptr::SharedPtr;
use core::cmp::Ordering;
use core::hash::{Hash, Hasher};

/// The "no object" sentinel. `p == NullPtr` holds exactly when `p` exposes
/// nothing, and `NullPtr` orders before every real address.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NullPtr;

impl<T: ?Sized, U: ?Sized> PartialEq<SharedPtr<U>> for SharedPtr<T> {
    #[inline]
    fn eq(&self, other: &SharedPtr<U>) -> bool {
        self.addr() == other.addr()
    }
}

impl<T: ?Sized> Eq for SharedPtr<T> {}

impl<T: ?Sized, U: ?Sized> PartialOrd<SharedPtr<U>> for SharedPtr<T> {
    #[inline]
    fn partial_cmp(&self, other: &SharedPtr<U>) -> Option<Ordering> {
        Some(self.addr().cmp(&other.addr()))
    }
}

impl<T: ?Sized> Ord for SharedPtr<T> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.addr().cmp(&other.addr())
    }
}

/// Hashes the thin exposed address. For sized `T` this matches hashing
/// the raw pointer; for unsized `T` the metadata (slice length, vtable) is
/// left out, so it matches hashing the pointer cast to `*const ()`.
impl<T: ?Sized> Hash for SharedPtr<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl<T: ?Sized> PartialEq<NullPtr> for SharedPtr<T> {
    #[inline]
    fn eq(&self, _: &NullPtr) -> bool {
        self.is_null()
    }
}

impl<T: ?Sized> PartialEq<SharedPtr<T>> for NullPtr {
    #[inline]
    fn eq(&self, other: &SharedPtr<T>) -> bool {
        other.is_null()
    }
}

impl<T: ?Sized> PartialOrd<NullPtr> for SharedPtr<T> {
    #[inline]
    fn partial_cmp(&self, _: &NullPtr) -> Option<Ordering> {
        Some(self.addr().cmp(&core::ptr::null()))
    }
}

impl<T: ?Sized> PartialOrd<SharedPtr<T>> for NullPtr {
    #[inline]
    fn partial_cmp(&self, other: &SharedPtr<T>) -> Option<Ordering> {
        Some(core::ptr::null::<()>().cmp(&other.addr()))
    }
}
