#[cfg(feature = "core")]
#[doc(inline)]
pub use genogrove_core as core;

#[cfg(feature = "structure")]
#[doc(inline)]
pub use genogrove_structure as structure;
