////////////////////////////////////////////////////////////////////////////////
// Markup lexer core library
////////////////////////////////////////////////////////////////////////////////
// Copyright 2022 Skylor R. Schermer
// This code is dual licenced using the MIT or Apache 2 license.
// See licence-mit.md and licence-apache.md for details.
////////////////////////////////////////////////////////////////////////////////
//! Caller-controlled policy knobs.
////////////////////////////////////////////////////////////////////////////////


////////////////////////////////////////////////////////////////////////////////
// LexerConfig
////////////////////////////////////////////////////////////////////////////////
/// Policy knobs resolving the lexer's Open Questions.
///
/// The default matches the byte-for-byte behavior of the literal Ragel
/// source this lexer is modeled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexerConfig {
    /// Whether `</script>` and `</style>` closers are matched
    /// case-sensitively (lowercase only, the literal source's behavior)
    /// or case-insensitively.
    pub raw_text_case_sensitive: bool,
    /// Whether an unrecognized `<!keyword` construct is recovered as a
    /// synthetic `on_text` event for the partial content (`true`), or
    /// left to drop into the absorbing error state (`false`, the
    /// literal source's behavior).
    pub malformed_bang_recovery: bool,
}

impl LexerConfig {
    /// The literal source's observed behavior: case-sensitive raw-text
    /// closers, no malformed-`<!` recovery.
    pub const STRICT: LexerConfig = LexerConfig {
        raw_text_case_sensitive: true,
        malformed_bang_recovery: false,
    };

    /// Case-insensitive raw-text closers and synthetic-text recovery on
    /// malformed `<!` constructs, useful for lexing arbitrary-case HTML
    /// fed straight from the network without prior normalization.
    pub const LENIENT: LexerConfig = LexerConfig {
        raw_text_case_sensitive: false,
        malformed_bang_recovery: true,
    };
}

impl Default for LexerConfig {
    fn default() -> Self {
        LexerConfig::STRICT
    }
}
