use std::{fmt, mem};

use crate::{Error, Replicate, Result};

/// A uniquely owned, possibly empty slot.
///
/// `Unique` never hands out a second owner of its payload. The payload moves
/// in through `set`/`attach` and moves out through `detach`/`pick`, which
/// leave the slot empty. Dropping a `Unique` drops its payload.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Unique<T>
{
    slot: Option<T>,
}

impl<T> Unique<T>
{
    /// An empty slot.
    pub const fn new() -> Self { Unique { slot: None } }

    /// A slot holding `value`.
    pub const fn with(value: T) -> Self { Unique { slot: Some(value) } }

    pub const fn from_option(slot: Option<T>) -> Self { Unique { slot } }

    pub fn is_empty(&self) -> bool { self.slot.is_none() }

    pub fn has_value(&self) -> bool { self.slot.is_some() }

    /// Borrow the payload.
    ///
    /// Fails with `Error::EmptyAccess` if there is none.
    pub fn get(&self) -> Result<&T> { self.slot.as_ref().ok_or(Error::EmptyAccess) }

    /// Mutably borrow the payload.
    ///
    /// Fails with `Error::EmptyAccess` if there is none.
    pub fn get_mut(&mut self) -> Result<&mut T> { self.slot.as_mut().ok_or(Error::EmptyAccess) }

    /// A copy of the payload, or `default` when empty.
    pub fn get_or(&self, default: T) -> T
    where
        T: Clone,
    {
        self.slot.clone().unwrap_or(default)
    }

    pub fn get_or_none(&self) -> Option<&T> { self.slot.as_ref() }

    /// Replace the payload; the previous one, if any, is dropped.
    pub fn set(&mut self, value: T) { self.slot = Some(value); }

    /// Move `value` in. Never merges: the previous payload, if any, is
    /// dropped.
    pub fn attach(&mut self, value: T) { self.set(value) }

    /// Drop the payload. Clearing an empty slot does nothing.
    pub fn clear(&mut self) { self.slot = None; }

    /// Move the payload out, leaving the slot empty.
    ///
    /// Fails with `Error::EmptyAccess` if there is none, in which case
    /// nothing changes.
    pub fn detach(&mut self) -> Result<T> { self.slot.take().ok_or(Error::EmptyAccess) }

    /// Same as `detach`.
    pub fn pick(&mut self) -> Result<T> { self.detach() }

    /// Move the payload into a fresh `Unique`, leaving this one empty.
    pub fn pick_to_unique(&mut self) -> Result<Unique<T>> { self.detach().map(Unique::with) }

    /// Exchange payloads with `other`, whichever of the two are empty.
    pub fn swap(&mut self, other: &mut Unique<T>) { mem::swap(&mut self.slot, &mut other.slot) }

    /// A new `Unique` holding `f` of the payload. `f` is not called when
    /// empty.
    pub fn map<U>(&self, f: impl FnOnce(&T) -> U) -> Unique<U>
    {
        Unique {
            slot: self.slot.as_ref().map(f),
        }
    }

    /// Like `map`, for functions that may themselves produce an empty slot.
    pub fn flat_map<U>(&self, f: impl FnOnce(&T) -> Unique<U>) -> Unique<U>
    {
        match &self.slot {
            Some(it) => f(it),
            None => Unique::new(),
        }
    }

    /// Keep the payload only if `pred` holds for it.
    ///
    /// Consumes `self`, since the payload is moved rather than copied into
    /// the result. `pred` is not called when empty.
    pub fn filter(self, pred: impl FnOnce(&T) -> bool) -> Unique<T>
    {
        Unique {
            slot: self.slot.filter(pred),
        }
    }

    /// Call `f` with the payload, if there is one.
    pub fn if_present(&self, f: impl FnOnce(&T))
    {
        if let Some(it) = &self.slot {
            f(it)
        }
    }

    /// Duplicate through the payload's own `Replicate` implementation.
    ///
    /// Fails with `Error::CloneUnsupported` when the payload refuses; `self`
    /// is left untouched either way.
    pub fn try_clone(&self) -> Result<Self>
    where
        T: Replicate,
    {
        self.replicate()
    }

    pub fn into_option(self) -> Option<T> { self.slot }
}

/// Move the payload out of `it`, leaving it empty.
pub fn pick<T>(it: &mut Unique<T>) -> Result<T> { it.pick() }

impl<T: Replicate> Replicate for Unique<T>
{
    fn replicate(&self) -> Result<Self>
    {
        Ok(Unique {
            slot: self.slot.replicate()?,
        })
    }
}

impl<T> Default for Unique<T>
{
    fn default() -> Self { Self::new() }
}

impl<T> From<T> for Unique<T>
{
    fn from(it: T) -> Self { Self::with(it) }
}

impl<T: fmt::Debug> fmt::Debug for Unique<T>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Unique").field("slot", &self.slot).finish()
    }
}

impl<T: fmt::Display> fmt::Display for Unique<T>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match &self.slot {
            Some(it) => write!(f, "Unique({it})"),
            None => f.write_str("Unique(empty)"),
        }
    }
}
