use std::mem::ManuallyDrop;
use std::sync::Arc;

use crate::engine::memory::MemoryPool;
use crate::ffi::{
    Failure, HRESULT, S_OK, ensure_ready, guard, memory_pool_t, obj, opt_shared, shared_into_raw, shared_kind,
    write_out,
};

/// Pool argument of a constructor; null selects the global pool.
pub(crate) unsafe fn pool_arg(pool: *const memory_pool_t) -> Result<Option<Arc<MemoryPool>>, Failure> {
    unsafe { opt_shared::<MemoryPool, _>(pool) }
}

unsafe fn write_pool(out: *mut *mut memory_pool_t, pool: Arc<MemoryPool>) -> Result<HRESULT, Failure> {
    unsafe { write_out(out, shared_into_raw::<MemoryPool, memory_pool_t>(pool))? };
    Ok(S_OK)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_memory_pool_global(out: *mut *mut memory_pool_t) -> HRESULT {
    guard(|| unsafe {
        ensure_ready()?;
        write_pool(out, MemoryPool::global())
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_memory_pool_thread_local(out: *mut *mut memory_pool_t) -> HRESULT {
    guard(|| unsafe {
        ensure_ready()?;
        write_pool(out, MemoryPool::thread_local())
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_memory_pool_create(clear_on_destruction: bool, out: *mut *mut memory_pool_t) -> HRESULT {
    guard(|| unsafe {
        ensure_ready()?;
        write_pool(out, Arc::new(MemoryPool::new(clear_on_destruction)))
    })
}

shared_kind!(MemoryPool, memory_pool_t, seal_memory_pool_retain, seal_memory_pool_destroy);

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_memory_pool_alloc_byte_count(this: *const memory_pool_t, out: *mut u64) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<MemoryPool, _>(this)?.alloc_byte_count())?;
        Ok(S_OK)
    })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_memory_pool_pool_count(this: *const memory_pool_t, out: *mut u64) -> HRESULT {
    guard(|| unsafe {
        write_out(out, obj::<MemoryPool, _>(this)?.pool_count())?;
        Ok(S_OK)
    })
}

/// Number of live references to the pool, engine-side ones included.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn seal_memory_pool_use_count(this: *const memory_pool_t, out: *mut u64) -> HRESULT {
    guard(|| unsafe {
        if this.is_null() {
            return Err(Failure::Null("memory pool"));
        }
        let pool: ManuallyDrop<Arc<MemoryPool>> = ManuallyDrop::new(Arc::from_raw(this.cast::<MemoryPool>()));
        write_out(out, Arc::strong_count(&pool) as u64)?;
        Ok(S_OK)
    })
}
