////////////////////////////////////////////////////////////////////////////////
// Markup lexer error library
////////////////////////////////////////////////////////////////////////////////
// Copyright 2022 Skylor R. Schermer
// This code is dual licenced using the MIT or Apache 2 license.
// See licence-mit.md and licence-apache.md for details.
////////////////////////////////////////////////////////////////////////////////
//! The lexer's error surface.
////////////////////////////////////////////////////////////////////////////////

// External library imports.
use lexer_span::Pos;

// Standard library imports.
use std::error::Error;
use std::fmt::Display;


////////////////////////////////////////////////////////////////////////////////
// LexerError
////////////////////////////////////////////////////////////////////////////////
/// The error surface returned by `Lexer::advance`.
///
/// Unexpected EOF inside a sub-machine is *not* a variant here: leaving the
/// buffer mid-machine is the normal, resumable suspended state the lexer is
/// designed around, not a failure.
#[derive(Debug)]
pub enum LexerError {
    /// The current machine has no transition for the current byte. The
    /// lexer has entered its absorbing error state; no further events
    /// will be emitted until `reset` is called.
    DfaStuck {
        /// The name of the machine that got stuck.
        machine: &'static str,
        /// The byte offset at which the stuck byte was encountered.
        at: Pos,
    },
    /// A host bridge callback returned an error. The lexer state is left
    /// in a well-defined but possibly mid-token condition; `reset` is
    /// required before further use.
    HostCallback(Box<dyn Error + Send + Sync + 'static>),
}

impl Display for LexerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexerError::DfaStuck { machine, at } => {
                write!(f, "lexer stuck in `{machine}` at {at}")
            }
            LexerError::HostCallback(cause) => {
                write!(f, "host callback failed: {cause}")
            }
        }
    }
}

impl Error for LexerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LexerError::DfaStuck { .. } => None,
            LexerError::HostCallback(cause) => Some(cause.as_ref()),
        }
    }
}
