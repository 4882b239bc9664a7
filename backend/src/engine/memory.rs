use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Allocation accounting shared by the objects created against it.
#[derive(Debug, Default)]
pub struct MemoryPool {
    clear_on_destruction: bool,
    alloc_byte_count: AtomicU64,
    allocation_count: AtomicU64,
}

static GLOBAL: OnceLock<Arc<MemoryPool>> = OnceLock::new();

thread_local! {
    static LOCAL: Arc<MemoryPool> = Arc::new(MemoryPool::new(false));
}

impl MemoryPool {
    pub fn new(clear_on_destruction: bool) -> MemoryPool {
        MemoryPool {
            clear_on_destruction,
            ..Default::default()
        }
    }

    pub fn global() -> Arc<MemoryPool> {
        GLOBAL.get_or_init(|| Arc::new(MemoryPool::new(false))).clone()
    }

    pub fn thread_local() -> Arc<MemoryPool> {
        LOCAL.with(Arc::clone)
    }

    pub fn record(&self, bytes: usize) {
        self.alloc_byte_count.fetch_add(bytes as u64, Ordering::Relaxed);
        self.allocation_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn alloc_byte_count(&self) -> u64 {
        self.alloc_byte_count.load(Ordering::Relaxed)
    }

    pub fn pool_count(&self) -> u64 {
        self.allocation_count.load(Ordering::Relaxed)
    }

    pub fn clear_on_destruction(&self) -> bool {
        self.clear_on_destruction
    }
}

/// Records an allocation of `words` 64-bit words against `pool`, or the
/// global pool when none is given.
pub(crate) fn record_words(pool: Option<&Arc<MemoryPool>>, words: usize) {
    let bytes: usize = words * size_of::<u64>();
    match pool {
        Some(pool) => pool.record(bytes),
        None => MemoryPool::global().record(bytes),
    }
}
