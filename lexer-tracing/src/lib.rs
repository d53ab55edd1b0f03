////////////////////////////////////////////////////////////////////////////////
// Markup lexer tracing library
////////////////////////////////////////////////////////////////////////////////
// Copyright 2022 Skylor R. Schermer
// This code is dual licenced using the MIT or Apache 2 license.
// See licence-mit.md and licence-apache.md for details.
////////////////////////////////////////////////////////////////////////////////
//! Tracing interface facade.
//!
//! Re-exports the `tracing` crate's `event!`/`span!` macros and `Level`
//! type when the `trace` feature is enabled; otherwise exposes a stub
//! with the same call shape that compiles to nothing. This lets call
//! sites in `lexer-core` use `event!`/`span!` unconditionally without
//! sprinkling `#[cfg(feature = "trace")]` through the DFA.
////////////////////////////////////////////////////////////////////////////////

#[cfg(feature = "trace")]
mod live {
    pub use tracing::event;
    pub use tracing::span;
    pub use tracing::Level;
}

#[cfg(not(feature = "trace"))]
mod stub;

#[cfg(feature = "trace")]
pub use live::*;

#[cfg(not(feature = "trace"))]
pub use stub::*;
