//! SharedPtr: the owning pointer built on `Counter`.
//!
//! Every member of an owner group carries the exposed address (`ptr`), the
//! group's destroy handle (`pointee`) and one `Counter`. Only the pointer
//! destroys the pointee, and only when its counter reports the last owner.

use crate::counter::Counter;
use crate::error::Result;
use crate::pointee::Pointee;
use core::fmt;
use core::marker::PhantomData;
use core::mem::{self, ManuallyDrop};
use core::ops::Deref;
use core::ptr::{self, NonNull};

/// A single-threaded shared-ownership pointer.
///
/// Cloning joins the owner group; dropping the last member destroys the
/// object. While a group has one member no heap cell exists for the
/// count. The first clone allocates it.
///
/// A `SharedPtr` may be empty (owns nothing, `owner_count() == 0`), and
/// may expose an address other than the one its group owns (see
/// [`SharedPtr::project`] and [`SharedPtr::alias`]).
///
/// Not `Send`/`Sync`: none of the counting is atomic.
pub struct SharedPtr<T: ?Sized> {
    ptr: Option<NonNull<T>>,
    pointee: Option<Pointee>,
    counter: Counter,
    _owns: PhantomData<T>,
}

impl<T> SharedPtr<T> {
    /// Moves `value` to the heap and becomes its sole owner.
    pub fn new(value: T) -> Self {
        Self::from_box(Box::new(value))
    }

    /// Adopts a boxed value as sole owner.
    pub fn from_box(value: Box<T>) -> Self {
        let ptr = NonNull::from(Box::leak(value));
        Self {
            ptr: Some(ptr),
            // Safety: fresh from Box::leak, owned by nobody else.
            pointee: Some(unsafe { Pointee::adopt(ptr) }),
            counter: Counter::owning(),
            _owns: PhantomData,
        }
    }

    /// Adopts a raw pointer as sole owner. A null pointer is accepted: the
    /// result owns nothing but still counts one owner.
    ///
    /// # Safety
    /// A non-null `raw` must come from `Box::<T>::into_raw` and must not be
    /// owned by another `SharedPtr` group or anything else.
    pub unsafe fn from_raw(raw: *mut T) -> Self {
        let ptr = NonNull::new(raw);
        let pointee = match ptr {
            Some(p) => Some(Pointee::adopt(p)),
            None => None,
        };
        Self {
            ptr,
            pointee,
            counter: Counter::owning(),
            _owns: PhantomData,
        }
    }

    /// Raw address of the exposed object, null when there is none.
    pub fn as_raw(&self) -> *const T {
        self.ptr.map_or(ptr::null(), |p| p.as_ptr() as *const T)
    }

    /// Replaces the current association with sole ownership of `value`.
    pub fn reset_to(&mut self, value: T) {
        *self = Self::new(value);
    }

    /// Replaces the current association with sole ownership of `raw`.
    ///
    /// Panics if `raw` is the address this pointer already exposes: adopting
    /// it again would destroy the object being re-adopted.
    ///
    /// # Safety
    /// Same contract as [`SharedPtr::from_raw`].
    pub unsafe fn reset_raw(&mut self, raw: *mut T) {
        assert!(
            raw.is_null() || raw as *const T != self.as_raw(),
            "self-reset: SharedPtr already holds this address"
        );
        *self = Self::from_raw(raw);
    }
}

impl<T: ?Sized> SharedPtr<T> {
    /// A pointer that owns nothing. No allocation.
    pub const fn empty() -> Self {
        Self {
            ptr: None,
            pointee: None,
            counter: Counter::empty(),
            _owns: PhantomData,
        }
    }

    /// Joins this pointer's owner group. Fails only if promoting the count
    /// to a shared cell cannot allocate; `self` is unchanged in that case.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            ptr: self.ptr,
            pointee: self.pointee,
            counter: self.counter.try_copy()?,
            _owns: PhantomData,
        })
    }

    /// Moves the association out, leaving `self` empty.
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// Copy-assignment: leaves the current group (destroying the pointee if
    /// this was its last owner) and joins `other`'s.
    pub fn try_assign(&mut self, other: &SharedPtr<T>) -> Result<()> {
        let copy = other.try_clone()?;
        *self = copy;
        Ok(())
    }

    /// Joins `owner`'s group while exposing `ptr` instead of `owner`'s
    /// address. The group's original pointee is still what gets destroyed.
    ///
    /// `U: 'static` because the result no longer names `U`: the group's
    /// destructor may run after any borrow inside `U` has ended.
    ///
    /// Aliasing an empty `owner` joins no group. With a non-null `ptr` the
    /// result is a non-owning view: `is_null()` is false while
    /// `owner_count()` is 0, and dropping it destroys nothing.
    ///
    /// # Safety
    /// `ptr` must be null or stay valid for as long as this pointer or any
    /// clone of it is alive and can be dereferenced.
    pub unsafe fn try_alias<U: ?Sized + 'static>(
        owner: &SharedPtr<U>,
        ptr: *const T,
    ) -> Result<Self> {
        Ok(Self {
            ptr: NonNull::new(ptr as *mut T),
            pointee: owner.pointee,
            counter: owner.counter.try_copy()?,
            _owns: PhantomData,
        })
    }

    /// Infallible [`SharedPtr::try_alias`]; aborts on allocation failure.
    ///
    /// # Safety
    /// Same contract as [`SharedPtr::try_alias`].
    pub unsafe fn alias<U: ?Sized + 'static>(owner: &SharedPtr<U>, ptr: *const T) -> Self {
        Self {
            ptr: NonNull::new(ptr as *mut T),
            pointee: owner.pointee,
            counter: owner.counter.clone(),
            _owns: PhantomData,
        }
    }

    /// Joins `this`'s group while exposing a sub-object selected by `f`,
    /// such as a field or a trait object view. An empty `this` yields a
    /// pointer that exposes nothing.
    ///
    /// Requires `T: 'static`. The projection may be the last owner and run
    /// `T`'s destructor, but its type no longer carries `T`'s lifetimes, so
    /// a borrowing `T` is rejected:
    ///
    /// ```compile_fail
    /// use single_thread_shared_ptr::SharedPtr;
    ///
    /// struct Reader<'a> {
    ///     text: &'a str,
    ///     n: u32,
    /// }
    ///
    /// impl Drop for Reader<'_> {
    ///     fn drop(&mut self) {
    ///         println!("{}", self.text.len());
    ///     }
    /// }
    ///
    /// fn outlive() -> SharedPtr<u32> {
    ///     let local = String::from("gone");
    ///     let p = SharedPtr::new(Reader { text: &local, n: 7 });
    ///     SharedPtr::project(&p, |r| &r.n)
    /// }
    /// ```
    pub fn try_project<U: ?Sized>(
        this: &Self,
        f: impl FnOnce(&T) -> &U,
    ) -> Result<SharedPtr<U>>
    where
        T: 'static,
    {
        let ptr = this.get().map(|t| NonNull::from(f(t)));
        Ok(SharedPtr {
            ptr,
            pointee: this.pointee,
            counter: this.counter.try_copy()?,
            _owns: PhantomData,
        })
    }

    /// Infallible [`SharedPtr::try_project`]; aborts on allocation failure.
    ///
    /// ```compile_fail
    /// use single_thread_shared_ptr::SharedPtr;
    ///
    /// fn outlive() -> SharedPtr<u8> {
    ///     let local = vec![1u8, 2, 3];
    ///     let p = SharedPtr::new(local.as_slice());
    ///     SharedPtr::project(&p, |s| &s[0])
    /// }
    /// ```
    pub fn project<U: ?Sized>(this: &Self, f: impl FnOnce(&T) -> &U) -> SharedPtr<U>
    where
        T: 'static,
    {
        let ptr = this.get().map(|t| NonNull::from(f(t)));
        SharedPtr {
            ptr,
            pointee: this.pointee,
            counter: this.counter.clone(),
            _owns: PhantomData,
        }
    }

    /// Converts `this` into a view of a sub-object, keeping its slot in the
    /// group. The owner count does not change and nothing is allocated.
    /// Requires `T: 'static` for the same reason as [`SharedPtr::try_project`].
    ///
    /// ```compile_fail
    /// use single_thread_shared_ptr::SharedPtr;
    ///
    /// fn outlive() -> SharedPtr<u8> {
    ///     let local = vec![1u8, 2, 3];
    ///     let p = SharedPtr::new(local.as_slice());
    ///     SharedPtr::into_project(p, |s| &s[0])
    /// }
    /// ```
    pub fn into_project<U: ?Sized>(this: Self, f: impl FnOnce(&T) -> &U) -> SharedPtr<U>
    where
        T: 'static,
    {
        let ptr = this.get().map(|t| NonNull::from(f(t)));
        let mut this = ManuallyDrop::new(this);
        SharedPtr {
            ptr,
            pointee: this.pointee.take(),
            counter: this.counter.take(),
            _owns: PhantomData,
        }
    }

    /// Leaves the current group and becomes empty.
    pub fn reset(&mut self) {
        *self = Self::empty();
    }

    pub fn get(&self) -> Option<&T> {
        // Safety: the pointee outlives every member of its group.
        self.ptr.map(|p| unsafe { &*p.as_ptr() })
    }

    pub fn as_ptr(&self) -> Option<NonNull<T>> {
        self.ptr
    }

    /// Thin address of the exposed object, null when there is none. This is
    /// the value comparisons and hashing use.
    pub fn addr(&self) -> *const () {
        self.ptr.map_or(ptr::null(), |p| p.as_ptr() as *const ())
    }

    pub fn owner_count(&self) -> usize {
        self.counter.count()
    }

    /// True when this is the only member of its group.
    pub fn is_unique(&self) -> bool {
        self.counter.is_sole_owner()
    }

    /// True when no object is exposed.
    pub fn is_null(&self) -> bool {
        self.ptr.is_none()
    }

    /// True when both pointers belong to the same owner group, regardless
    /// of which addresses they expose.
    pub fn same_owner<U: ?Sized>(&self, other: &SharedPtr<U>) -> bool {
        let same_instance = ptr::eq(
            self as *const Self as *const (),
            other as *const SharedPtr<U> as *const (),
        );
        (same_instance && !self.counter.is_empty()) || self.counter.same_group(&other.counter)
    }

    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.ptr, &mut other.ptr);
        mem::swap(&mut self.pointee, &mut other.pointee);
        self.counter.swap(&mut other.counter);
    }
}

impl<T: ?Sized> Clone for SharedPtr<T> {
    fn clone(&self) -> Self {
        Self {
            ptr: self.ptr,
            pointee: self.pointee,
            counter: self.counter.clone(),
            _owns: PhantomData,
        }
    }
}

impl<T: ?Sized> Drop for SharedPtr<T> {
    fn drop(&mut self) {
        if self.counter.is_sole_owner() {
            if let Some(pointee) = self.pointee.take() {
                crate::trace_event!(addr = ?pointee.addr(), "last owner destroying pointee");
                // Safety: this is the last member of the group.
                unsafe { pointee.destroy() };
            }
        }
        // The counter releases its own state when dropped.
    }
}

impl<T: ?Sized> Deref for SharedPtr<T> {
    type Target = T;

    /// Panics on an empty pointer.
    #[inline]
    fn deref(&self) -> &T {
        match self.get() {
            Some(t) => t,
            None => panic!("dereferenced an empty SharedPtr"),
        }
    }
}

impl<T: ?Sized> Default for SharedPtr<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> From<T> for SharedPtr<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T> From<Box<T>> for SharedPtr<T> {
    fn from(value: Box<T>) -> Self {
        Self::from_box(value)
    }
}

impl<T: ?Sized> fmt::Debug for SharedPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedPtr")
            .field("ptr", &self.addr())
            .field("owner_count", &self.owner_count())
            .finish()
    }
}

impl<T: ?Sized> fmt::Pointer for SharedPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.addr(), f)
    }
}
