use std::{
    alloc::Layout,
    cell::{Cell, UnsafeCell},
    fmt,
    hash::{self, Hasher},
    ptr::NonNull,
};

use log::trace;

use crate::ledger;

/// The counted record behind every `Shared` and `Weak`.
///
/// The payload slot is emptied the moment `strong` reaches zero, and the
/// allocation itself is released once both counts are zero.
pub(crate) struct RefBlock<T>
{
    payload: UnsafeCell<Option<T>>,
    strong: Cell<u32>,
    weak: Cell<u32>,
}

/// Underlying pointer type.
///
/// Copying a `BlockPtr` does not touch the counts; the handle types decide
/// when a copy counts as a reference.
#[repr(transparent)]
pub(crate) struct BlockPtr<T>(NonNull<RefBlock<T>>);

impl<T> Clone for BlockPtr<T>
{
    fn clone(&self) -> Self { *self }
}
impl<T> Copy for BlockPtr<T> {}

impl<T> PartialEq for BlockPtr<T>
{
    fn eq(&self, other: &Self) -> bool { self.0 == other.0 }
}
impl<T> Eq for BlockPtr<T> {}

impl<T> hash::Hash for BlockPtr<T>
{
    fn hash<H: Hasher>(&self, state: &mut H) { self.0.hash(state) }
}

impl<T> fmt::Debug for BlockPtr<T>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("BlockPtr")
            .field("addr", &self.0)
            .field("strong", &self.strong())
            .field("weak", &self.weak())
            .finish()
    }
}

#[allow(dead_code)]
impl<T> BlockPtr<T>
{
    /// Allocate a fresh block holding `value` with one strong reference.
    pub(crate) fn allocate(value: T) -> Self
    {
        let res = Self(NonNull::from(Box::leak(Box::new(RefBlock {
            payload: UnsafeCell::new(Some(value)),
            strong: Cell::new(1),
            weak: Cell::new(0),
        }))));
        ledger::record_allocation(BlockLayout::of::<T>());
        trace!("allocated {:?}", res.0);
        res
    }

    fn block(&self) -> &RefBlock<T>
    {
        // SAFETY: a `BlockPtr` is only reachable through a handle holding a
        // strong or weak count, and the block is not freed while either count
        // is nonzero.
        unsafe { self.0.as_ref() }
    }

    pub(crate) fn strong(&self) -> u32 { self.block().strong.get() }

    pub(crate) fn weak(&self) -> u32 { self.block().weak.get() }

    /// True while the payload can still be handed out.
    pub(crate) fn is_live(&self) -> bool { self.strong() > 0 && self.payload().is_some() }

    pub(crate) fn payload(&self) -> Option<&T>
    {
        // SAFETY: the slot is only written by `take_payload`, which requires
        // that no other strong handle can be holding a borrow into it.
        unsafe { (*self.block().payload.get()).as_ref() }
    }

    pub(crate) fn retain_strong(&self)
    {
        let strong = &self.block().strong;
        match strong.get().checked_add(1) {
            Some(n) => strong.set(n),
            None => panic!("strong count overflow on {:?}", self.0),
        }
    }

    pub(crate) fn retain_weak(&self)
    {
        let weak = &self.block().weak;
        match weak.get().checked_add(1) {
            Some(n) => weak.set(n),
            None => panic!("weak count overflow on {:?}", self.0),
        }
    }

    /// Move the payload out of the block, leaving the slot empty.
    ///
    /// # Safety
    ///
    /// The caller must be the only strong handle, so that no borrow obtained
    /// through `payload` can be alive.
    pub(crate) unsafe fn take_payload(&self) -> Option<T> { (*self.block().payload.get()).take() }

    /// Give up one strong reference.
    ///
    /// On the last one, the payload is dropped while a temporary weak
    /// reference pins the block, so a destructor that lets go of a `Weak` to
    /// this same block cannot free it underneath us.
    ///
    /// # Safety
    ///
    /// The caller must own one of the strong references and must not use
    /// `self` afterwards.
    pub(crate) unsafe fn release_strong(self)
    {
        let strong = &self.block().strong;
        match strong.get() {
            0 => panic!("strong count underflow on {:?}", self.0),
            1 => {
                strong.set(0);
                self.retain_weak();
                let payload = self.take_payload();
                ledger::record_payload_release(BlockLayout::of::<T>());
                trace!("released payload of {:?}", self.0);
                drop(payload);
                self.release_weak();
            }
            n => strong.set(n - 1),
        }
    }

    /// Give up one weak reference, freeing the block if it was the last
    /// reference of any kind.
    ///
    /// # Safety
    ///
    /// The caller must own one of the weak references and must not use `self`
    /// afterwards.
    pub(crate) unsafe fn release_weak(self)
    {
        let weak = &self.block().weak;
        match weak.get() {
            0 => panic!("weak count underflow on {:?}", self.0),
            n => weak.set(n - 1),
        }
        if weak.get() == 0 && self.strong() == 0 {
            self.free();
        }
    }

    unsafe fn free(self)
    {
        trace!("freeing {:?}", self.0);
        drop(Box::from_raw(self.0.as_ptr()));
        ledger::record_free(BlockLayout::of::<T>());
    }
}

/// Newtype wrapper to make `std::alloc::Layout` implement `Hash` for use in
/// the ledger.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout(Layout);

impl BlockLayout
{
    /// Produces the layout of the block that backs a `Shared<T>`.
    pub fn of<T>() -> Self { BlockLayout(Layout::new::<RefBlock<T>>()) }

    /// Delegates to underlying `Layout`
    pub fn size(&self) -> usize { self.0.size() }

    /// Delegates to underlying `Layout`
    pub fn align(&self) -> usize { self.0.align() }
}

impl hash::Hash for BlockLayout
{
    fn hash<H: Hasher>(&self, state: &mut H)
    {
        self.0.size().hash(state);
        self.0.align().hash(state);
    }
}

impl From<BlockLayout> for Layout
{
    fn from(it: BlockLayout) -> Self { it.0 }
}

impl fmt::Debug for BlockLayout
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("BlockLayout")
            .field("size()", &self.size())
            .field("align()", &self.align())
            .finish()
    }
}
