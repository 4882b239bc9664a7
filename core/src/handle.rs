//! Ownership of one engine allocation.
//!
//! Every wrapped object is a [`Handle`] instantiated at a kind tag. A handle
//! is either live (it owns exactly one allocation) or disposed (it owns
//! nothing and rejects every operation but [`Handle::delete`]).

use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use backend::ffi::HRESULT;

use crate::error::{Error, Result};
use crate::native;

/// Kind tag of a wrapped engine object.
#[allow(clippy::missing_safety_doc)]
pub trait NativeKind: Sized + 'static {
    type Raw: 'static;
    const NAME: &'static str;
    /// Set for reference counted kinds, where two owned references may share
    /// one address.
    const COUNTED: bool = false;
    unsafe fn destroy(raw: *mut Self::Raw) -> HRESULT;
}

/// Reference counted kinds: several handles may alias one allocation.
#[allow(clippy::missing_safety_doc)]
pub trait SharedKind: NativeKind {
    unsafe fn retain(raw: *const Self::Raw) -> HRESULT;
}

/// Kinds the engine can duplicate.
#[allow(clippy::missing_safety_doc)]
pub trait CopyKind: NativeKind {
    unsafe fn copy(src: *const Self::Raw, out: *mut *mut Self::Raw) -> HRESULT;
    unsafe fn assign(dst: *mut Self::Raw, src: *const Self::Raw) -> HRESULT;
}

pub struct Handle<K: NativeKind> {
    ptr: Option<NonNull<K::Raw>>,
    _marker: PhantomData<K>,
}

// Engine objects carry no thread affinity. Shared mutation is not
// synchronized on this side, hence no `Sync`.
unsafe impl<K: NativeKind> Send for Handle<K> {}

impl<K: NativeKind> Handle<K> {
    /// Takes ownership of `raw`. A null pointer gives a disposed handle.
    ///
    /// # Safety
    /// `raw` must be null or a live allocation of kind `K` that nothing else
    /// releases.
    pub unsafe fn from_raw(raw: *mut K::Raw) -> Self {
        let ptr: Option<NonNull<K::Raw>> = NonNull::new(raw);
        if ptr.is_some() {
            log::trace!("{} {raw:p}: bound", K::NAME);
        }
        Self {
            ptr,
            _marker: PhantomData,
        }
    }

    /// A handle owning nothing.
    pub fn disposed() -> Self {
        Self {
            ptr: None,
            _marker: PhantomData,
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.ptr.is_none()
    }

    /// Releases the allocation. Deleting a disposed handle does nothing.
    pub fn delete(&mut self) {
        let Some(ptr) = self.ptr.take() else {
            return;
        };
        log::trace!("{} {:p}: released", K::NAME, ptr.as_ptr());
        if let Err(err) = native::check(unsafe { K::destroy(ptr.as_ptr()) }) {
            log::warn!("releasing {} {:p} failed: {err}", K::NAME, ptr.as_ptr());
        }
    }

    /// Releases the current allocation, if any, and binds to `raw` instead.
    ///
    /// Injecting the pointer already held keeps the handle live. For a
    /// reference counted kind the injected pointer is a reference of its own,
    /// so one reference is released and the handle keeps the other.
    ///
    /// # Safety
    /// Same contract as [`Handle::from_raw`]: the handle takes ownership of
    /// `raw`. For a kind that is not reference counted, the pointer already
    /// held is owned by this handle alone, so re-injecting it hands over
    /// nothing.
    pub unsafe fn inject(&mut self, raw: *mut K::Raw) {
        if self.ptr.map(NonNull::as_ptr) == Some(raw) {
            if K::COUNTED {
                log::trace!("{} {raw:p}: duplicate reference released", K::NAME);
                if let Err(err) = native::check(unsafe { K::destroy(raw) }) {
                    log::warn!("releasing {} {raw:p} failed: {err}", K::NAME);
                }
            }
            return;
        }
        self.delete();
        *self = unsafe { Self::from_raw(raw) };
    }

    /// Takes over the allocation of `src`, which is left disposed. Fails
    /// without touching either handle when `src` is disposed.
    pub fn move_from(&mut self, src: &mut Handle<K>) -> Result<()> {
        let Some(ptr) = src.ptr.take() else {
            return Err(Error::DisposedHandle(K::NAME));
        };
        self.delete();
        log::trace!("{} {:p}: moved", K::NAME, ptr.as_ptr());
        self.ptr = Some(ptr);
        Ok(())
    }

    /// Raw pointer for a call into the engine.
    pub fn as_ptr(&self) -> Result<*mut K::Raw> {
        self.ptr
            .map(NonNull::as_ptr)
            .ok_or(Error::DisposedHandle(K::NAME))
    }

    pub(crate) fn as_const(&self) -> Result<*const K::Raw> {
        self.as_ptr().map(<*mut K::Raw>::cast_const)
    }
}

impl<K: SharedKind> Handle<K> {
    /// Second handle over the same allocation; either may be deleted first.
    pub fn shallow_clone(&self) -> Result<Handle<K>> {
        let raw: *mut K::Raw = self.as_ptr()?;
        native::check(unsafe { K::retain(raw) })?;
        log::trace!("{} {raw:p}: aliased", K::NAME);
        Ok(Handle {
            ptr: self.ptr,
            _marker: PhantomData,
        })
    }
}

impl<K: CopyKind> Handle<K> {
    /// Independent allocation with the same content.
    pub fn deep_copy(&self) -> Result<Handle<K>> {
        let src: *const K::Raw = self.as_const()?;
        native::produce(|out| unsafe { K::copy(src, out) })
    }

    /// Overwrites this handle's content with that of `src`.
    pub fn copy_from(&mut self, src: &Handle<K>) -> Result<()> {
        let dst: *mut K::Raw = self.as_ptr()?;
        native::check(unsafe { K::assign(dst, src.as_const()?) })?;
        Ok(())
    }
}

impl<K: NativeKind> Drop for Handle<K> {
    fn drop(&mut self) {
        self.delete();
    }
}

impl<K: NativeKind> fmt::Debug for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ptr {
            Some(ptr) => write!(f, "{}({:p})", K::NAME, ptr.as_ptr()),
            None => write!(f, "{}(disposed)", K::NAME),
        }
    }
}
