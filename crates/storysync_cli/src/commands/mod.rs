pub(crate) mod link;
pub(crate) mod meta;
pub(crate) mod shared;
pub(crate) mod sweep;

#[cfg(feature = "github")]
pub(crate) mod import;
