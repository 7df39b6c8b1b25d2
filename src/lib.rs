//! vbitx (workspace facade crate).
//!
//! This package keeps a single `vbitx::{core,encode,source,term,types}`
//! public API while the implementation lives in dedicated crates under
//! `crates/`.

pub use vbitx_core as core;
pub use vbitx_encode as encode;
pub use vbitx_source as source;
pub use vbitx_term as term;
pub use vbitx_types as types;
