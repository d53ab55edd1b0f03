////////////////////////////////////////////////////////////////////////////////
// Markup lexer core library
////////////////////////////////////////////////////////////////////////////////
// Copyright 2022 Skylor R. Schermer
// This code is dual licenced using the MIT or Apache 2 license.
// See licence-mit.md and licence-apache.md for details.
////////////////////////////////////////////////////////////////////////////////
//! The host bridge the lexer drives events through.
////////////////////////////////////////////////////////////////////////////////

// Internal library imports.
use crate::EventKind;

// External library imports.
use lexer_span::Pos;

// Standard library imports.
use std::error::Error;


////////////////////////////////////////////////////////////////////////////////
// Host
////////////////////////////////////////////////////////////////////////////////
/// The capability set the embedding environment must provide.
///
/// The lexer calls into a `Host` for every token it recognizes and to
/// query the handful of mode flags that make the DFA's HTML/XML and
/// `script`/`style` branches diverge.
pub trait Host {
    /// An opaque tag identifying the text encoding of the lexed buffer,
    /// passed back to the host verbatim with every ranged event.
    type Encoding: Copy;

    /// The error type a callback may fail with. Propagated to the
    /// caller of [`Lexer::advance`](crate::Lexer::advance) as
    /// [`LexerError::HostCallback`](lexer_error::LexerError::HostCallback).
    type Error: Error + Send + Sync + 'static;

    /// Emits a ranged event: `text` is the borrowed slice of bytes the
    /// event covers, and `start` is its absolute byte offset from the
    /// beginning of the logical input (stable across `advance` calls).
    fn emit(
        &mut self,
        kind: EventKind,
        text: &[u8],
        start: Pos,
        encoding: Self::Encoding,
    ) -> Result<(), Self::Error>;

    /// Emits a token-less event.
    fn emit_simple(&mut self, kind: EventKind) -> Result<(), Self::Error>;

    /// Flushes `n` newlines' worth of line accounting.
    fn advance_line(&mut self, n: i32);

    /// Returns true if the input is being lexed in HTML mode.
    fn html_p(&mut self) -> bool;

    /// Returns true if the currently open element is `script`.
    fn html_script_p(&mut self) -> bool;

    /// Returns true if the currently open element is `style`.
    fn html_style_p(&mut self) -> bool;
}
