use std::{fmt, hash};

use crate::{block::BlockPtr, Error, Result};

/// Shared, reference-counted handle.
///
/// Every non-null `Shared` holds one strong reference to a block. Handles
/// made with `share`/`attach`/`Weak::lock` alias the same payload: this is
/// reference semantics, not copying. Mutation through an alias therefore
/// goes through interior mutability in `T` (`Cell`, `RefCell`).
///
/// When the last strong reference goes, the payload is dropped right away,
/// even if `Weak` observers remain; the block itself is freed once those are
/// gone too.
pub struct Shared<T>
{
    block: Option<BlockPtr<T>>,
}

impl<T> Shared<T>
{
    /// A handle to nothing.
    pub const fn new_null() -> Self { Shared { block: None } }

    /// Allocate a fresh block holding `value`, with one strong and no weak
    /// references.
    pub fn with(value: T) -> Self
    {
        Shared {
            block: Some(BlockPtr::allocate(value)),
        }
    }

    fn join(block: BlockPtr<T>) -> Self
    {
        block.retain_strong();
        Shared { block: Some(block) }
    }

    pub fn is_null(&self) -> bool { self.block.is_none() }

    pub fn has_value(&self) -> bool { self.get_or_none().is_some() }

    /// Borrow the payload.
    ///
    /// Fails with `Error::NullAccess` on a null handle.
    pub fn get(&self) -> Result<&T> { self.get_or_none().ok_or(Error::NullAccess) }

    /// Member access; same as `get`.
    pub fn arrow(&self) -> Result<&T> { self.get() }

    /// A copy of the payload, or `default` when null.
    pub fn get_or(&self, default: T) -> T
    where
        T: Clone,
    {
        self.get_or_none().cloned().unwrap_or(default)
    }

    pub fn get_or_none(&self) -> Option<&T> { self.block.as_ref().and_then(BlockPtr::payload) }

    /// Leave the current block and point at a fresh one holding `value`.
    pub fn set(&mut self, value: T)
    {
        self.clear();
        self.block = Some(BlockPtr::allocate(value));
    }

    /// Another strong handle to the same block.
    pub fn share(&self) -> Self
    {
        match self.block {
            Some(block) => Self::join(block),
            None => Self::new_null(),
        }
    }

    /// Make `self` another strong handle to `other`'s block.
    ///
    /// Does nothing if both already point at the same block, so the count is
    /// never bumped twice for one handle.
    pub fn attach(&mut self, other: &Shared<T>)
    {
        if self.block == other.block {
            return;
        }
        self.clear();
        if let Some(block) = other.block {
            block.retain_strong();
            self.block = Some(block);
        }
    }

    /// Give up this handle's strong reference and become null.
    pub fn clear(&mut self)
    {
        if let Some(block) = self.block.take() {
            // SAFETY: a non-null `Shared` owns exactly one strong reference,
            // and `take` guarantees it is released only once.
            unsafe { block.release_strong() }
        }
    }

    /// Return the payload by value and become null.
    ///
    /// The payload is moved out when this is the last strong handle, and
    /// cloned otherwise. Fails with `Error::NullAccess` on a null handle.
    pub fn detach(&mut self) -> Result<T>
    where
        T: Clone,
    {
        let block = self.block.ok_or(Error::NullAccess)?;
        let value = if block.strong() == 1 {
            // SAFETY: we hold the only strong reference and `&mut self` rules
            // out outstanding borrows through it.
            unsafe { block.take_payload() }
        } else {
            block.payload().cloned()
        };
        let value = value.ok_or(Error::NullAccess)?;
        self.clear();
        Ok(value)
    }

    /// Move the payload out if this is the only strong handle.
    ///
    /// Hands `self` back untouched otherwise, or if it is null. Outstanding
    /// `Weak`s expire on success.
    pub fn try_unwrap(mut self) -> std::result::Result<T, Self>
    {
        match self.block {
            Some(block) if block.strong() == 1 => {
                // SAFETY: sole strong reference, owned by value.
                let value = unsafe { block.take_payload() };
                self.clear();
                value.ok_or(self)
            }
            _ => Err(self),
        }
    }

    /// Reference identity: same block, or both null.
    pub fn ptr_eq(&self, other: &Shared<T>) -> bool { self.block == other.block }

    /// Payload equality: both null, or both holding equal payloads.
    pub fn value_eq(&self, other: &Shared<T>) -> bool
    where
        T: PartialEq,
    {
        match (self.get_or_none(), other.get_or_none()) {
            (None, None) => true,
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Strong references to the block, or 0 when null.
    pub fn ref_count(&self) -> u32 { self.block.map_or(0, |b| b.strong()) }

    /// Weak references to the block, or 0 when null.
    pub fn weak_count(&self) -> u32 { self.block.map_or(0, |b| b.weak()) }

    /// A weak observer of the same block.
    pub fn to_weak(&self) -> Weak<T> { Weak::from(self) }
}

impl<T> Clone for Shared<T>
{
    fn clone(&self) -> Self { self.share() }
}

impl<T> Drop for Shared<T>
{
    fn drop(&mut self) { self.clear() }
}

impl<T> Default for Shared<T>
{
    fn default() -> Self { Self::new_null() }
}

impl<T> From<T> for Shared<T>
{
    fn from(it: T) -> Self { Self::with(it) }
}

impl<T> PartialEq for Shared<T>
{
    fn eq(&self, other: &Self) -> bool { self.ptr_eq(other) }
}

impl<T> Eq for Shared<T> {}

impl<T> hash::Hash for Shared<T>
{
    fn hash<H: hash::Hasher>(&self, state: &mut H) { self.block.hash(state) }
}

impl<T: fmt::Debug> fmt::Debug for Shared<T>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Shared")
            .field("value", &self.get_or_none())
            .field("refs", &self.ref_count())
            .field("weak", &self.weak_count())
            .finish()
    }
}

impl<T: fmt::Display> fmt::Display for Shared<T>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self.get_or_none() {
            Some(it) => write!(f, "Shared({it}, refs: {})", self.ref_count()),
            None => f.write_str("Shared(null)"),
        }
    }
}

/// Weak observer of a `Shared` block.
///
/// A `Weak` keeps the block allocated but never the payload. Whether it has
/// expired is read off the block every time, so `lock` can never hand out a
/// payload that is already gone.
pub struct Weak<T>
{
    block: Option<BlockPtr<T>>,
}

impl<T> Weak<T>
{
    /// An observer of nothing; always expired.
    pub const fn new() -> Self { Weak { block: None } }

    /// Unbound, or the observed payload has been released.
    pub fn is_expired(&self) -> bool { !self.block.is_some_and(|b| b.is_live()) }

    /// Attempt to obtain a strong handle.
    ///
    /// Returns a null `Shared` when expired. The weak count is left alone
    /// either way.
    pub fn lock(&self) -> Shared<T>
    {
        match self.block {
            Some(block) if block.is_live() => Shared::join(block),
            _ => Shared::new_null(),
        }
    }

    /// Strong references to the observed block, or 0 when unbound.
    pub fn use_count(&self) -> u32 { self.block.map_or(0, |b| b.strong()) }

    /// Weak references to the observed block, or 0 when unbound.
    pub fn weak_count(&self) -> u32 { self.block.map_or(0, |b| b.weak()) }

    /// Stop observing, freeing the block if nothing else references it.
    pub fn clear(&mut self)
    {
        if let Some(block) = self.block.take() {
            // SAFETY: a bound `Weak` owns exactly one weak reference, and
            // `take` guarantees it is released only once.
            unsafe { block.release_weak() }
        }
    }

    /// Whether both observe the same block, or are both unbound.
    pub fn ptr_eq(&self, other: &Weak<T>) -> bool { self.block == other.block }
}

impl<T> From<&Shared<T>> for Weak<T>
{
    fn from(it: &Shared<T>) -> Self
    {
        if let Some(block) = it.block {
            block.retain_weak();
        }
        Weak { block: it.block }
    }
}

impl<T> Clone for Weak<T>
{
    fn clone(&self) -> Self
    {
        if let Some(block) = self.block {
            block.retain_weak();
        }
        Weak { block: self.block }
    }
}

impl<T> Drop for Weak<T>
{
    fn drop(&mut self) { self.clear() }
}

impl<T> Default for Weak<T>
{
    fn default() -> Self { Self::new() }
}

impl<T> fmt::Debug for Weak<T>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Weak")
            .field("expired", &self.is_expired())
            .field("refs", &self.use_count())
            .field("weak", &self.weak_count())
            .finish()
    }
}

impl<T> fmt::Display for Weak<T>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        if self.is_expired() {
            f.write_str("Weak(expired)")
        } else {
            write!(f, "Weak(refs: {})", self.use_count())
        }
    }
}
