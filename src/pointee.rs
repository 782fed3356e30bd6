//! Type-erased handle to the object an owner group destroys.
//!
//! Captured once, when ownership is first acquired, and copied to every
//! member of the group. Aliasing pointers expose other addresses (or other
//! types) but still carry this handle, so the last owner always destroys
//! the original allocation with the original type's destructor.

use core::ptr::NonNull;

#[derive(Copy, Clone, Debug)]
pub(crate) struct Pointee {
    addr: NonNull<()>,
    destroy: unsafe fn(NonNull<()>),
}

unsafe fn drop_boxed<T>(addr: NonNull<()>) {
    drop(Box::from_raw(addr.cast::<T>().as_ptr()));
}

impl Pointee {
    /// Safety: `ptr` must come from `Box::<T>::into_raw` and must not be
    /// owned by anything else.
    pub(crate) unsafe fn adopt<T>(ptr: NonNull<T>) -> Self {
        Self {
            addr: ptr.cast(),
            destroy: drop_boxed::<T>,
        }
    }

    #[cfg_attr(not(feature = "trace"), allow(dead_code))]
    pub(crate) fn addr(&self) -> *const () {
        self.addr.as_ptr()
    }

    /// Runs the captured destructor and frees the allocation.
    ///
    /// Safety: called at most once per adopted object, by its last owner.
    pub(crate) unsafe fn destroy(self) {
        (self.destroy)(self.addr)
    }
}
