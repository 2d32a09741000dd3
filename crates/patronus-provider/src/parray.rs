// Length-tagged array carrying its own release capability.
//
// Every provider may use a different allocator, or a different runtime
// entirely, so the array says how to free itself: `release` is called once
// with the data pointer, the length and the opaque `context` the creator
// stored next to them. The receiver never looks at `context`.

use std::ffi::c_void;
use std::fmt;
use std::ptr;

/// Release function paired with a [`PArray`].
pub type ReleaseFn<T> = unsafe extern "C" fn(data: *mut T, len: usize, context: *mut c_void);

/// C-compatible owned array.
///
/// The struct itself is plain data and has no `Drop`: it is copied across the
/// boundary by value. Ownership of the storage behind `data` moves with it,
/// and exactly one call of [`PArray::release`] ends that ownership. The host
/// wraps received arrays in an RAII guard so the call happens on drop.
#[repr(C)]
pub struct PArray<T> {
    pub data: *mut T,
    pub len: usize,
    pub context: *mut c_void,
    /// `None` is never valid for an array handed to the host; it is only
    /// representable so that a missing function can be detected instead of
    /// jumping through a null pointer.
    pub release: Option<ReleaseFn<T>>,
}

unsafe extern "C" fn release_nothing<T>(_data: *mut T, _len: usize, _context: *mut c_void) {}

unsafe extern "C" fn release_boxed_slice<T>(data: *mut T, len: usize, _context: *mut c_void) {
    drop(unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(data, len)) });
}

impl<T> PArray<T> {
    /// An empty array whose release is a no-op.
    pub fn empty() -> Self {
        Self {
            data: ptr::null_mut(),
            len: 0,
            context: ptr::null_mut(),
            release: Some(release_nothing::<T>),
        }
    }

    /// Move a `Vec` across the boundary. Releasing drops the elements and
    /// the allocation with Rust's global allocator.
    pub fn from_vec(v: Vec<T>) -> Self {
        let boxed = v.into_boxed_slice();
        let len = boxed.len();
        let data = Box::into_raw(boxed) as *mut T;
        Self {
            data,
            len,
            context: ptr::null_mut(),
            release: Some(release_boxed_slice::<T>),
        }
    }

    /// Expose static data. Releasing does nothing.
    pub fn from_static(items: &'static [T]) -> Self {
        Self {
            data: items.as_ptr() as *mut T,
            len: items.len(),
            context: ptr::null_mut(),
            release: Some(release_nothing::<T>),
        }
    }

    /// Array over storage owned by an enclosing allocation.
    ///
    /// Used for suggestion arrays nested in an annotation: their storage goes
    /// away with the parent's release, so their own release is a no-op.
    pub fn borrowed_from_parent(data: *mut T, len: usize) -> Self {
        Self {
            data,
            len,
            context: ptr::null_mut(),
            release: Some(release_nothing::<T>),
        }
    }

    pub fn has_release(&self) -> bool {
        self.release.is_some()
    }

    /// View the elements.
    ///
    /// # Safety
    ///
    /// `data` must point to `len` initialized elements that stay alive and
    /// unaliased by writers for the returned lifetime, or `len` must be 0.
    pub unsafe fn as_slice(&self) -> &[T] {
        if self.data.is_null() || self.len == 0 {
            &[]
        } else {
            unsafe { std::slice::from_raw_parts(self.data, self.len) }
        }
    }

    /// Invoke the release capability.
    ///
    /// Returns `false` when there is no release function (the storage is
    /// then leaked, since nobody else knows how to free it).
    ///
    /// # Safety
    ///
    /// Must be called at most once per array produced by its creator.
    pub unsafe fn release(self) -> bool {
        match self.release {
            Some(release) => {
                unsafe { release(self.data, self.len, self.context) };
                true
            }
            None => false,
        }
    }
}

impl<T> fmt::Debug for PArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PArray")
            .field("data", &self.data)
            .field("len", &self.len)
            .field("context", &self.context)
            .field("release", &self.release.is_some())
            .finish()
    }
}
