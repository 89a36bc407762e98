//! Strong/weak reference counting
//!
//! A counted block holds a payload, a finalizer and two counters:
//!
//! - `strong`: owning handles. When it drops to zero the finalizer consumes
//!   the payload.
//! - `weak`: holders that only need the block to stay readable. Every strong
//!   handle is also counted here, so the block outlives its payload until the
//!   last weak holder lets go.
//!
//! This split lets a structural back-link (child to parent) observe that
//! its target has been finalized and drop the link, without the link ever
//! keeping the payload alive.
//!
//! Handles are neither `Send` nor `Sync`; all counting is single-threaded.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

struct Block<T> {
    strong: Cell<u32>,
    weak: Cell<u32>,
    payload: RefCell<Option<T>>,
    finalizer: Cell<Option<Box<dyn FnOnce(T)>>>,
}

/// Owning reference to a counted block
pub struct Strong<T> {
    block: NonNull<Block<T>>,
    _owns: PhantomData<Block<T>>,
}

/// Non-owning reference that keeps only the block readable
pub struct WeakRef<T> {
    block: NonNull<Block<T>>,
    _owns: PhantomData<Block<T>>,
}

impl<T> Strong<T> {
    /// Allocate a block with strong = 1, weak = 1.
    ///
    /// `finalizer` runs exactly once, with the payload, when the strong
    /// count reaches zero.
    pub fn create<F>(payload: T, finalizer: F) -> Self
    where
        F: FnOnce(T) + 'static,
    {
        let block = Box::new(Block {
            strong: Cell::new(1),
            weak: Cell::new(1),
            payload: RefCell::new(Some(payload)),
            finalizer: Cell::new(Some(Box::new(finalizer))),
        });
        Self {
            block: NonNull::from(Box::leak(block)),
            _owns: PhantomData,
        }
    }

    fn block(&self) -> &Block<T> {
        // SAFETY: a strong handle accounts for one weak count, so the block
        // is not freed while `self` exists.
        unsafe { self.block.as_ref() }
    }

    /// Take another owning reference (strong + 1, weak + 1)
    pub fn inc_strong(&self) -> Self {
        let block = self.block();
        block.strong.set(block.strong.get() + 1);
        block.weak.set(block.weak.get() + 1);
        Self {
            block: self.block,
            _owns: PhantomData,
        }
    }

    /// Take a structural reference (weak + 1 only)
    pub fn downgrade(&self) -> WeakRef<T> {
        let block = self.block();
        block.weak.set(block.weak.get() + 1);
        WeakRef {
            block: self.block,
            _owns: PhantomData,
        }
    }

    /// Release this reference, returning the remaining strong count
    pub fn dec_strong(self) -> u32 {
        let remaining = self.block().strong.get() - 1;
        drop(self);
        remaining
    }

    pub fn strong_count(&self) -> u32 {
        self.block().strong.get()
    }

    pub fn weak_count(&self) -> u32 {
        self.block().weak.get()
    }

    /// Shared access to the payload
    ///
    /// # Panics
    /// If the payload is mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, T> {
        Ref::map(self.block().payload.borrow(), |payload| {
            payload.as_ref().expect("payload is live while a strong handle exists")
        })
    }

    /// Exclusive access to the payload
    ///
    /// # Panics
    /// If the payload is already borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        RefMut::map(self.block().payload.borrow_mut(), |payload| {
            payload.as_mut().expect("payload is live while a strong handle exists")
        })
    }

    /// Shared access unless the payload is mutably borrowed
    pub fn try_borrow(&self) -> Option<Ref<'_, T>> {
        let guard = self.block().payload.try_borrow().ok()?;
        Ref::filter_map(guard, Option::as_ref).ok()
    }

    /// Exclusive access unless the payload is currently borrowed
    pub fn try_borrow_mut(&self) -> Option<RefMut<'_, T>> {
        let guard = self.block().payload.try_borrow_mut().ok()?;
        RefMut::filter_map(guard, Option::as_mut).ok()
    }

    /// Do both handles point at the same block?
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.block == other.block
    }
}

impl<T> Clone for Strong<T> {
    fn clone(&self) -> Self {
        self.inc_strong()
    }
}

impl<T> Drop for Strong<T> {
    fn drop(&mut self) {
        let block = self.block();
        let strong = block.strong.get() - 1;
        block.strong.set(strong);
        if strong == 0 {
            let payload = block.payload.borrow_mut().take();
            let finalizer = block.finalizer.take();
            if let (Some(payload), Some(finalizer)) = (payload, finalizer) {
                finalizer(payload);
            }
        }
        // SAFETY: this handle still owns its implicit weak count.
        unsafe { release_weak(self.block) };
    }
}

impl<T> fmt::Debug for Strong<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strong")
            .field("strong", &self.strong_count())
            .field("weak", &self.weak_count())
            .finish()
    }
}

impl<T> WeakRef<T> {
    fn block(&self) -> &Block<T> {
        // SAFETY: the weak count held by `self` keeps the block allocated.
        unsafe { self.block.as_ref() }
    }

    /// Another structural reference to the same block (weak + 1)
    pub fn inc_weak(&self) -> Self {
        let block = self.block();
        block.weak.set(block.weak.get() + 1);
        Self {
            block: self.block,
            _owns: PhantomData,
        }
    }

    /// Owning reference, unless the payload has been finalized
    pub fn upgrade(&self) -> Option<Strong<T>> {
        let block = self.block();
        if block.strong.get() == 0 {
            return None;
        }
        block.strong.set(block.strong.get() + 1);
        block.weak.set(block.weak.get() + 1);
        Some(Strong {
            block: self.block,
            _owns: PhantomData,
        })
    }

    /// Has the payload been finalized? Never touches the payload.
    pub fn is_finalized(&self) -> bool {
        self.block().strong.get() == 0
    }

    /// Release this reference, returning the remaining weak count
    pub fn dec_weak(self) -> u32 {
        let remaining = self.block().weak.get() - 1;
        drop(self);
        remaining
    }

    pub fn strong_count(&self) -> u32 {
        self.block().strong.get()
    }

    pub fn weak_count(&self) -> u32 {
        self.block().weak.get()
    }

    /// Does this reference point at the block behind `strong`?
    pub fn points_to(&self, strong: &Strong<T>) -> bool {
        self.block == strong.block
    }
}

impl<T> Clone for WeakRef<T> {
    fn clone(&self) -> Self {
        self.inc_weak()
    }
}

impl<T> Drop for WeakRef<T> {
    fn drop(&mut self) {
        // SAFETY: this handle owns one weak count.
        unsafe { release_weak(self.block) };
    }
}

impl<T> fmt::Debug for WeakRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakRef")
            .field("strong", &self.strong_count())
            .field("weak", &self.weak_count())
            .finish()
    }
}

/// Drop one weak count, freeing the block when it was the last.
///
/// # Safety
/// The caller must own one weak count on `block` and not use it afterwards.
unsafe fn release_weak<T>(block: NonNull<Block<T>>) {
    // SAFETY: the caller's weak count keeps the block allocated until here.
    let weak = unsafe { block.as_ref() }.weak.get() - 1;
    unsafe { block.as_ref() }.weak.set(weak);
    if weak == 0 {
        // SAFETY: the block came from `Box::leak` and no handle remains.
        drop(unsafe { Box::from_raw(block.as_ptr()) });
    }
}
