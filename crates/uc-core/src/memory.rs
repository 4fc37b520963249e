//! Allocator injection.
//!
//! Allocation goes through a [`MemoryBackend`] handed to
//! [`GeneralAllocator::new`]; nothing is replaced process-wide. When the
//! binding disables default general allocation, requests fall back to the
//! system allocator unless the caller asks for the configured backend
//! explicitly.

use std::alloc::{GlobalAlloc, Layout, System};
use std::ptr::NonNull;
use std::sync::Arc;
use tracing::{debug, warn};
use uc_common::{Error, Result};
use uc_config::AllocBinding;

/// A source of raw memory.
pub trait MemoryBackend: Send + Sync {
    /// Backend name for diagnostics.
    fn name(&self) -> &str;

    /// Allocate memory for a non-zero-sized `layout`.
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// Release memory returned by [`MemoryBackend::allocate`].
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate` on this backend with the same `layout`,
    /// and must not be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

/// Raw malloc/free through the system allocator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBackend;

impl MemoryBackend for SystemBackend {
    fn name(&self) -> &str {
        "system"
    }

    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        if layout.size() == 0 {
            return None;
        }
        // SAFETY: layout has non-zero size.
        NonNull::new(unsafe { System.alloc(layout) })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        System.dealloc(ptr.as_ptr(), layout)
    }
}

/// Allocator for one allocation surface.
pub struct GeneralAllocator {
    backend: Arc<dyn MemoryBackend>,
    fallback: SystemBackend,
    default_enabled: bool,
    min_align: usize,
}

impl std::fmt::Debug for GeneralAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneralAllocator")
            .field("backend", &self.backend.name())
            .field("default_enabled", &self.default_enabled)
            .field("min_align", &self.min_align)
            .finish()
    }
}

impl GeneralAllocator {
    /// Allocator using `backend`, with the default-enable flag and minimum
    /// alignment taken from `binding`.
    pub fn new(backend: Arc<dyn MemoryBackend>, binding: &AllocBinding) -> Self {
        let min_align = binding.align.map(|a| a as usize).unwrap_or(1);
        debug!(
            backend = backend.name(),
            bound = %binding.backend,
            default_enabled = binding.default_enabled,
            min_align,
            "allocator constructed"
        );
        Self {
            backend,
            fallback: SystemBackend,
            default_enabled: binding.default_enabled,
            min_align,
        }
    }

    /// Allocator on the system backend.
    pub fn system(binding: &AllocBinding) -> Self {
        Self::new(Arc::new(SystemBackend), binding)
    }

    pub fn backend_name(&self) -> &str {
        self.default_backend().name()
    }

    pub fn min_align(&self) -> usize {
        self.min_align
    }

    fn default_backend(&self) -> &dyn MemoryBackend {
        if self.default_enabled {
            self.backend.as_ref()
        } else {
            &self.fallback
        }
    }

    fn layout(&self, size: usize, align: usize) -> Result<Layout> {
        if size == 0 {
            return Err(Error::InvalidLayout("zero-sized allocation".to_string()));
        }
        let align = align.max(self.min_align);
        Layout::from_size_align(size, align)
            .map_err(|e| Error::InvalidLayout(format!("size {size}, align {align}: {e}")))
    }

    /// Zero-initialized allocation through the default backend.
    pub fn allocate(&self, size: usize, align: usize) -> Result<Allocation<'_>> {
        self.allocate_in(self.default_backend(), size, align)
    }

    /// Zero-initialized allocation through the configured backend, even
    /// when default general allocation is disabled.
    pub fn allocate_configured(&self, size: usize, align: usize) -> Result<Allocation<'_>> {
        self.allocate_in(self.backend.as_ref(), size, align)
    }

    fn allocate_in<'a>(
        &'a self,
        backend: &'a dyn MemoryBackend,
        size: usize,
        align: usize,
    ) -> Result<Allocation<'a>> {
        let layout = self.layout(size, align)?;
        let Some(ptr) = backend.allocate(layout) else {
            warn!(backend = backend.name(), size, align = layout.align(), "allocation failed");
            return Err(Error::AllocationFailed {
                backend: backend.name().to_string(),
                size,
                align: layout.align(),
            });
        };
        // SAFETY: ptr is valid for layout.size() bytes.
        unsafe { std::ptr::write_bytes(ptr.as_ptr(), 0, layout.size()) };
        Ok(Allocation {
            ptr,
            layout,
            backend,
        })
    }
}

/// Owned block from a [`GeneralAllocator`]; freed on drop.
pub struct Allocation<'a> {
    ptr: NonNull<u8>,
    layout: Layout,
    backend: &'a dyn MemoryBackend,
}

impl Allocation<'_> {
    pub fn len(&self) -> usize {
        self.layout.size()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.size() == 0
    }

    pub fn align(&self) -> usize {
        self.layout.align()
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: the block is initialized and owned for our lifetime.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as above, and &mut self guarantees exclusive access.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size()) }
    }
}

impl Drop for Allocation<'_> {
    fn drop(&mut self) {
        // SAFETY: ptr came from backend.allocate with this layout.
        unsafe { self.backend.deallocate(self.ptr, self.layout) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uc_config::AllocType;

    #[derive(Default)]
    struct CountingBackend {
        live: AtomicUsize,
        total: AtomicUsize,
    }

    impl MemoryBackend for CountingBackend {
        fn name(&self) -> &str {
            "counting"
        }

        fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
            self.live.fetch_add(1, Ordering::SeqCst);
            self.total.fetch_add(1, Ordering::SeqCst);
            SystemBackend.allocate(layout)
        }

        unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
            self.live.fetch_sub(1, Ordering::SeqCst);
            SystemBackend.deallocate(ptr, layout)
        }
    }

    struct FailingBackend;

    impl MemoryBackend for FailingBackend {
        fn name(&self) -> &str {
            "failing"
        }

        fn allocate(&self, _layout: Layout) -> Option<NonNull<u8>> {
            None
        }

        unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {}
    }

    fn binding(default_enabled: bool, align: Option<u32>) -> AllocBinding {
        AllocBinding {
            backend: AllocType::PlatformHeap,
            default_enabled,
            include: "esp_heap_caps.h".into(),
            malloc_symbol: "heap_caps_aligned_alloc".into(),
            free_symbol: "heap_caps_free".into(),
            align,
            caps: None,
            caps_mask: None,
        }
    }

    #[test]
    fn injected_backend_serves_and_frees() {
        let backend = Arc::new(CountingBackend::default());
        let alloc = GeneralAllocator::new(backend.clone(), &binding(true, None));
        {
            let mut block = alloc.allocate(64, 8).unwrap();
            assert_eq!(block.backend_name(), "counting");
            assert!(block.as_slice().iter().all(|b| *b == 0));
            block.as_mut_slice()[0] = 0xAA;
            assert_eq!(backend.live.load(Ordering::SeqCst), 1);
        }
        assert_eq!(backend.live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn bound_alignment_is_a_minimum() {
        let alloc = GeneralAllocator::system(&binding(true, Some(64)));
        let block = alloc.allocate(10, 4).unwrap();
        assert_eq!(block.align(), 64);
        assert_eq!(block.as_ptr() as usize % 64, 0);
        let wider = alloc.allocate(10, 256).unwrap();
        assert_eq!(wider.align(), 256);
    }

    #[test]
    fn disabled_default_falls_back_to_system() {
        let backend = Arc::new(CountingBackend::default());
        let alloc = GeneralAllocator::new(backend.clone(), &binding(false, None));
        assert_eq!(alloc.backend_name(), "system");
        let block = alloc.allocate(16, 1).unwrap();
        assert_eq!(block.backend_name(), "system");
        assert_eq!(backend.total.load(Ordering::SeqCst), 0);

        let opted_in = alloc.allocate_configured(16, 1).unwrap();
        assert_eq!(opted_in.backend_name(), "counting");
        assert_eq!(backend.total.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failures_carry_backend_and_layout() {
        let alloc = GeneralAllocator::new(Arc::new(FailingBackend), &binding(true, Some(16)));
        let result = alloc.allocate(32, 1);
        match result {
            Err(Error::AllocationFailed {
                backend,
                size,
                align,
            }) => {
                assert_eq!(backend, "failing");
                assert_eq!(size, 32);
                assert_eq!(align, 16);
            }
            other => panic!("expected allocation failure, got {:?}", other.map(|a| a.len())),
        };
    }

    #[test]
    fn zero_size_and_bad_alignment_are_rejected() {
        let alloc = GeneralAllocator::system(&binding(true, None));
        assert!(matches!(alloc.allocate(0, 1), Err(Error::InvalidLayout(_))));
        assert!(matches!(alloc.allocate(8, 3), Err(Error::InvalidLayout(_))));
    }
}
