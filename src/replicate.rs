use std::{
    any::{type_name, Any},
    cell::{Cell, RefCell},
    collections::{BTreeMap, HashMap, VecDeque},
    hash::{BuildHasher, Hash},
};

use crate::{Error, Result};

/// Deep-copy capability used by `Unique::try_clone`.
///
/// Types implement this to say how (or whether) a payload can be duplicated.
/// Plain values copy themselves structurally; containers replicate their
/// elements; type-erased payloads refuse with `Error::CloneUnsupported`.
pub trait Replicate: Sized
{
    fn replicate(&self) -> Result<Self>;
}

/// Shorthand error for `Replicate` implementations that refuse to copy.
pub fn clone_unsupported<T: ?Sized>() -> Error
{
    Error::CloneUnsupported {
        type_name: type_name::<T>(),
    }
}

macro_rules! replicate_by_clone {
    ($($ty:ty),* $(,)?) => {$(
        impl Replicate for $ty
        {
            fn replicate(&self) -> Result<Self> { Ok(self.clone()) }
        }
    )*};
}

replicate_by_clone!(
    (), bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64,
    String, &'static str,
);

impl<T: Replicate> Replicate for Option<T>
{
    fn replicate(&self) -> Result<Self>
    {
        match self {
            Some(it) => it.replicate().map(Some),
            None => Ok(None),
        }
    }
}

impl<T: Replicate> Replicate for Box<T>
{
    fn replicate(&self) -> Result<Self> { (**self).replicate().map(Box::new) }
}

impl<T: Replicate> Replicate for Vec<T>
{
    fn replicate(&self) -> Result<Self> { self.iter().map(Replicate::replicate).collect() }
}

impl<T: Replicate> Replicate for VecDeque<T>
{
    fn replicate(&self) -> Result<Self> { self.iter().map(Replicate::replicate).collect() }
}

impl<K, V, S> Replicate for HashMap<K, V, S>
where
    K: Replicate + Eq + Hash,
    V: Replicate,
    S: BuildHasher + Default,
{
    fn replicate(&self) -> Result<Self>
    {
        self.iter()
            .map(|(k, v)| -> Result<(K, V)> { Ok((k.replicate()?, v.replicate()?)) })
            .collect()
    }
}

impl<K: Replicate + Ord, V: Replicate> Replicate for BTreeMap<K, V>
{
    fn replicate(&self) -> Result<Self>
    {
        self.iter()
            .map(|(k, v)| -> Result<(K, V)> { Ok((k.replicate()?, v.replicate()?)) })
            .collect()
    }
}

impl<A: Replicate, B: Replicate> Replicate for (A, B)
{
    fn replicate(&self) -> Result<Self> { Ok((self.0.replicate()?, self.1.replicate()?)) }
}

impl<T: Copy> Replicate for Cell<T>
{
    fn replicate(&self) -> Result<Self> { Ok(Cell::new(self.get())) }
}

impl<T: Replicate> Replicate for RefCell<T>
{
    fn replicate(&self) -> Result<Self> { self.borrow().replicate().map(RefCell::new) }
}

impl Replicate for Box<dyn Any>
{
    fn replicate(&self) -> Result<Self> { Err(clone_unsupported::<dyn Any>()) }
}
