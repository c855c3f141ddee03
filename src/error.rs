use thiserror::Error;

/// Failures surfaced by handle accessors.
///
/// Every variant signals a contract violation by the caller (using a handle
/// known to be empty or null), so nothing in this crate retries or recovers.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error
{
    /// A `Unique` was read or moved out of while empty.
    #[error("Unique<T> is empty")]
    EmptyAccess,

    /// A `Shared` was read while null, or after its payload was released.
    #[error("Shared<T> is null")]
    NullAccess,

    /// The payload of a `Unique` refused to be replicated.
    #[error("payload of type {type_name} cannot be cloned")]
    CloneUnsupported { type_name: &'static str },
}

pub type Result<T> = std::result::Result<T, Error>;
