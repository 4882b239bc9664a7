use backend::ffi;

use crate::error::Result;
use crate::handle::Handle;
use crate::kinds::MemoryPoolKind;
use crate::native;

/// Opaque token selecting the pool an object allocates from. Constructors
/// taking `Option<&MemoryPoolHandle>` fall back to the global pool.
pub type MemoryPoolHandle = Handle<MemoryPoolKind>;

impl MemoryPoolHandle {
    pub fn global() -> Result<MemoryPoolHandle> {
        native::construct(|out| unsafe { ffi::memory::seal_memory_pool_global(out) })
    }

    pub fn thread_local() -> Result<MemoryPoolHandle> {
        native::construct(|out| unsafe { ffi::memory::seal_memory_pool_thread_local(out) })
    }

    /// A fresh pool, shared with nothing.
    pub fn new(clear_on_destruction: bool) -> Result<MemoryPoolHandle> {
        native::construct(|out| unsafe { ffi::memory::seal_memory_pool_create(clear_on_destruction, out) })
    }

    pub fn alloc_byte_count(&self) -> Result<u64> {
        let this: *const ffi::memory_pool_t = self.as_const()?;
        native::read(|out| unsafe { ffi::memory::seal_memory_pool_alloc_byte_count(this, out) })
    }

    pub fn pool_count(&self) -> Result<u64> {
        let this: *const ffi::memory_pool_t = self.as_const()?;
        native::read(|out| unsafe { ffi::memory::seal_memory_pool_pool_count(this, out) })
    }

    /// Live references to the pool, including the ones held by the engine.
    pub fn use_count(&self) -> Result<u64> {
        let this: *const ffi::memory_pool_t = self.as_const()?;
        native::read(|out| unsafe { ffi::memory::seal_memory_pool_use_count(this, out) })
    }
}

/// Pool argument of an engine constructor; null selects the global pool.
pub(crate) fn pool_ptr(pool: Option<&MemoryPoolHandle>) -> Result<*const ffi::memory_pool_t> {
    pool.map_or(Ok(std::ptr::null()), MemoryPoolHandle::as_const)
}
