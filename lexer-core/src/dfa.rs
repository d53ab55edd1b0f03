////////////////////////////////////////////////////////////////////////////////
// Markup lexer core library
////////////////////////////////////////////////////////////////////////////////
// Copyright 2022 Skylor R. Schermer
// This code is dual licenced using the MIT or Apache 2 license.
// See licence-mit.md and licence-apache.md for details.
////////////////////////////////////////////////////////////////////////////////
//! The lexer proper: the persistent scan registers and the top-level
//! dispatch loop over `main`, `text`, and the comment/CDATA/processing
//! instruction/DOCTYPE machines. Element, attribute, and string scanning
//! live in [`crate::elements`]; this module calls into them but does not
//! duplicate their logic.
////////////////////////////////////////////////////////////////////////////////

// Internal library imports.
use crate::chars::is_name_start;
use crate::config::LexerConfig;
use crate::state::{Machine, MachineStack};
use crate::token::EventKind;
use crate::Host;

// External library imports.
use lexer_error::LexerError;
use lexer_span::Pos;
use lexer_tracing::{event, span, Level};

////////////////////////////////////////////////////////////////////////////////
// Pending
////////////////////////////////////////////////////////////////////////////////
/// The accumulation buffer used when a ranged token's span crosses an
/// `advance` call boundary.
///
/// The common case -- a token that starts and ends within a single
/// `advance` call -- never touches this: the event is emitted by borrowing
/// directly from that call's buffer. `Pending` only comes into existence
/// once a call ends before the token's closing delimiter has been seen.
#[derive(Debug, Clone)]
pub(crate) struct Pending {
    pub(crate) kind: EventKind,
    pub(crate) start: Pos,
    pub(crate) buf: Vec<u8>,
}

////////////////////////////////////////////////////////////////////////////////
// Probe
////////////////////////////////////////////////////////////////////////////////
/// A small fixed-capacity lookahead buffer used to disambiguate a `<!` or
/// `<?` construct when the deciding keyword itself is split across a call
/// boundary.
///
/// Eight bytes covers the longest keyword a caller must recognize here
/// (`DOCTYPE`, `[CDATA[`).
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Probe {
    buf: [u8; 8],
    len: u8,
}

impl Probe {
    fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }

    /// Appends as much of `extra` as fits, returning how many bytes were
    /// taken from it.
    fn push_all(&mut self, extra: &[u8]) -> usize {
        let room = self.buf.len() - self.len as usize;
        let take = extra.len().min(room);
        let at = self.len as usize;
        self.buf[at..at + take].copy_from_slice(&extra[..take]);
        self.len += take as u8;
        take
    }
}

////////////////////////////////////////////////////////////////////////////////
// MarkState
////////////////////////////////////////////////////////////////////////////////
/// Remembers that a `<` at the very end of a call's buffer has not yet been
/// classified as a tag opener or ordinary text, because the lookahead byte
/// needed to decide was not available.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MarkState {
    pub(crate) at: Pos,
}

////////////////////////////////////////////////////////////////////////////////
// Lexer
////////////////////////////////////////////////////////////////////////////////
/// A streaming, resumable XML/HTML tokenizer.
///
/// `Lexer` holds no borrow on any buffer between calls: every byte slice it
/// is given is fully consumed (or copied into [`Pending`]) before
/// `advance` returns, which is what lets a caller feed it a document one
/// network read at a time.
pub struct Lexer {
    pub(crate) config: LexerConfig,
    pub(crate) cs: Machine,
    pub(crate) stack: MachineStack,
    pub(crate) pending: Option<Pending>,
    pub(crate) mark: Option<MarkState>,
    pub(crate) bang_probe: Option<Probe>,
    pub(crate) question_probe: Option<Probe>,
    pub(crate) raw_text_probe: Option<crate::elements::RawTextProbe>,
    pub(crate) ns_emitted: bool,
    pub(crate) bang_start: Pos,
    pub(crate) question_start: Pos,
    pos: usize,
    lines: i32,
}

impl Lexer {
    /// Constructs a new lexer in its initial state.
    #[must_use]
    pub fn new(config: LexerConfig) -> Self {
        Lexer {
            config,
            cs: Machine::Main,
            stack: MachineStack::new(),
            pending: None,
            mark: None,
            bang_probe: None,
            question_probe: None,
            raw_text_probe: None,
            ns_emitted: false,
            bang_start: Pos(0),
            question_start: Pos(0),
            pos: 0,
            lines: 0,
        }
    }

    /// Returns the currently active machine.
    #[must_use]
    pub fn machine(&self) -> Machine {
        self.cs
    }

    /// Returns the absolute byte offset the next `advance` call's buffer
    /// will be considered to start at.
    #[must_use]
    pub fn position(&self) -> Pos {
        Pos(self.pos)
    }

    /// Resets the lexer to its initial state, discarding any in-progress
    /// token and lookahead.
    ///
    /// Required after `advance` returns an error: the lexer does not
    /// attempt to recover stuck or mid-token state on its own.
    pub fn reset(&mut self) {
        let _span = span!(Level::DEBUG, "lexer_reset").entered();
        self.cs = Machine::Main;
        self.stack.clear();
        self.pending = None;
        self.mark = None;
        self.bang_probe = None;
        self.question_probe = None;
        self.raw_text_probe = None;
        self.ns_emitted = false;
        self.bang_start = Pos(0);
        self.question_start = Pos(0);
        self.pos = 0;
        self.lines = 0;
    }

    /// Signals that no further bytes will be supplied for the current
    /// logical input.
    ///
    /// A `<` left unclassified at the tail of the last `advance` call (its
    /// mark recovery still pending a lookahead byte that will now never
    /// arrive) is flushed as the text run it was already carrying,
    /// exactly as `on_text` covering the prefix up to and including that
    /// `<`, with no open-tag event: see the lexer's "text then `<` then
    /// EOF" boundary case. A partially-scanned sub-machine (an
    /// unterminated comment, string, or similar) is left untouched and
    /// emits nothing, matching the unexpected-EOF propagation policy: the
    /// host may inspect [`Lexer::machine`] to tell the two cases apart.
    pub fn finish<H: Host>(
        &mut self,
        encoding: H::Encoding,
        host: &mut H,
    ) -> Result<(), LexerError> {
        if let Some(mark) = self.mark.take() {
            self.append_mark_byte(mark.at);
        }
        if let Some(pending) = self.pending.take() {
            if pending.kind == EventKind::Text {
                host.emit(pending.kind, &pending.buf, pending.start, encoding)
                    .map_err(Lexer::host_err)?;
            } else {
                self.pending = Some(pending);
            }
        }
        Ok(())
    }

    /// Feeds `bytes` to the lexer, driving `host` with every token event
    /// recognized.
    ///
    /// `bytes` need not align with token or even character boundaries; the
    /// lexer resumes exactly where the previous call left off. `encoding`
    /// is passed back to `host` verbatim with every ranged event emitted
    /// from this call.
    pub fn advance<H: Host>(
        &mut self,
        bytes: &[u8],
        encoding: H::Encoding,
        host: &mut H,
    ) -> Result<(), LexerError> {
        let _span = span!(Level::TRACE, "lexer_advance", len = bytes.len()).entered();
        let base = self.pos;
        let mut idx = 0;

        if let Some(mark) = self.mark.take() {
            idx = self.resume_mark(bytes, mark, base, encoding, host)?;
        }

        while idx < bytes.len() {
            event!(Level::TRACE, machine = self.cs.name(), idx, "dfa_step");
            idx = self.step(bytes, idx, base, encoding, host)?;
        }

        self.pos = base + bytes.len();
        self.lines += bytes.iter().filter(|&&b| b == b'\n').count() as i32;
        self.flush_lines(host);
        Ok(())
    }

    /// Flushes the accumulated newline count to `host`, per the line
    /// counter's safe-point discipline: a flush never re-reports a `\n`
    /// byte already handed to the host.
    fn flush_lines<H: Host>(&mut self, host: &mut H) {
        if self.lines != 0 {
            host.advance_line(self.lines);
            self.lines = 0;
        }
    }

    /// Dispatches one scan over the current machine, returning the index
    /// to resume from (always `bytes.len()` if the machine suspended
    /// waiting for more input).
    fn step<H: Host>(
        &mut self,
        bytes: &[u8],
        idx: usize,
        base: usize,
        encoding: H::Encoding,
        host: &mut H,
    ) -> Result<usize, LexerError> {
        match self.cs {
            Machine::Main | Machine::Text => self.scan_text(bytes, idx, base, encoding, host),
            Machine::BangOpen => self.scan_bang(bytes, idx, base, encoding, host),
            Machine::QuestionOpen => self.scan_question(bytes, idx, base, encoding, host),
            Machine::CommentBody => {
                self.scan_delimited(
                    bytes, idx, base, EventKind::CommentBody, b"-->", encoding, host,
                    |lexer, host| {
                        host.emit_simple(EventKind::CommentEnd)
                            .map_err(Lexer::host_err)?;
                        lexer.cs = Machine::Text;
                        Ok(())
                    },
                )
            }
            Machine::CdataBody => {
                self.scan_delimited(
                    bytes, idx, base, EventKind::CdataBody, b"]]>", encoding, host,
                    |lexer, host| {
                        host.emit_simple(EventKind::CdataEnd).map_err(Lexer::host_err)?;
                        lexer.cs = Machine::Text;
                        Ok(())
                    },
                )
            }
            Machine::ProcInsName => self.scan_proc_ins_name_cont(bytes, idx, base, encoding, host),
            Machine::ProcInsBody => {
                self.scan_delimited(
                    bytes, idx, base, EventKind::ProcInsBody, b"?>", encoding, host,
                    |lexer, host| {
                        host.emit_simple(EventKind::ProcInsEnd)
                            .map_err(Lexer::host_err)?;
                        lexer.cs = Machine::Text;
                        Ok(())
                    },
                )
            }
            Machine::DoctypeInline => {
                self.scan_delimited(
                    bytes, idx, base, EventKind::DoctypeInline, b"]", encoding, host,
                    |lexer, _host| {
                        lexer.cs = Machine::DoctypeHeader { name_emitted: true };
                        Ok(())
                    },
                )
            }
            Machine::DoctypeHeader { .. } => self.scan_doctype_header(bytes, idx, base, encoding, host),
            Machine::XmlDecl => self.scan_xml_decl(bytes, idx, base, encoding, host),
            Machine::ElementName
            | Machine::ElementClose
            | Machine::ElementCloseGt
            | Machine::ElementSelfCloseGt
            | Machine::ElementHead
            | Machine::HtmlElementHead
            | Machine::AttributeName
            | Machine::AttributePre
            | Machine::UnquotedAttributeValue
            | Machine::StringSquote
            | Machine::StringDquote => self.step_element(bytes, idx, base, encoding, host),
            Machine::HtmlScript => self.scan_raw_text(
                bytes, idx, base, b"script", encoding, host,
            ),
            Machine::HtmlStyle => self.scan_raw_text(
                bytes, idx, base, b"style", encoding, host,
            ),
            Machine::Error => Err(LexerError::DfaStuck {
                machine: Machine::Error.name(),
                at: Pos(base + idx),
            }),
        }
    }

    pub(crate) fn host_err<E>(e: E) -> LexerError
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        LexerError::HostCallback(Box::new(e))
    }

    /// Scans ordinary character data, up to `<` or end of buffer.
    fn scan_text<H: Host>(
        &mut self,
        buf: &[u8],
        idx: usize,
        base: usize,
        encoding: H::Encoding,
        host: &mut H,
    ) -> Result<usize, LexerError> {
        let mut search_from = idx;
        loop {
            match find_byte(&buf[search_from..], b'<') {
                Some(rel) => {
                    let lt = search_from + rel;
                    if lt + 1 < buf.len() {
                        let next = buf[lt + 1];
                        if is_tag_open_start(next) {
                            self.flush_ranged(
                                EventKind::Text, buf, idx, lt, base, encoding, host,
                            )?;
                            return self.dispatch_angle(buf, lt, base, encoding, host);
                        }
                        search_from = lt + 1;
                        continue;
                    } else {
                        self.carry(EventKind::Text, buf, idx, lt, base);
                        self.mark = Some(MarkState { at: Pos(base + lt) });
                        return Ok(buf.len());
                    }
                }
                None => {
                    self.carry(EventKind::Text, buf, idx, buf.len(), base);
                    return Ok(buf.len());
                }
            }
        }
    }

    /// Resolves a `<` left unclassified at the end of the previous call.
    ///
    /// The `<` itself is already sitting in `self.pending` (tagged as
    /// `Text`, carried there by [`Lexer::scan_text`]); only the
    /// lookahead byte needed to classify it was missing.
    fn resume_mark<H: Host>(
        &mut self,
        buf: &[u8],
        mark: MarkState,
        base: usize,
        encoding: H::Encoding,
        host: &mut H,
    ) -> Result<usize, LexerError> {
        if buf.is_empty() {
            self.mark = Some(mark);
            return Ok(0);
        }
        if is_tag_open_start(buf[0]) {
            self.flush_pending(EventKind::Text, encoding, host)?;
            self.begin_tag(buf[0], mark.at);
            if matches!(buf[0], b'/' | b'!' | b'?') {
                Ok(1)
            } else {
                Ok(0)
            }
        } else {
            // The '<' was not a tag opener after all; it stays part of
            // the carried text run, and scanning just continues.
            self.append_mark_byte(mark.at);
            self.scan_text(buf, 0, base, encoding, host)
        }
    }

    /// Appends the speculative `<` a resolved or still-pending mark was
    /// holding back onto the in-progress text carry, starting a fresh one
    /// if the preceding run was empty (so nothing was carried yet).
    fn append_mark_byte(&mut self, at: Pos) {
        match &mut self.pending {
            Some(p) if p.kind == EventKind::Text => p.buf.push(b'<'),
            _ => {
                self.pending = Some(Pending { kind: EventKind::Text, start: at, buf: vec![b'<'] });
            }
        }
    }

    /// Consumes a `<` found mid-buffer together with its dispatch byte.
    fn dispatch_angle<H: Host>(
        &mut self,
        buf: &[u8],
        lt: usize,
        base: usize,
        _encoding: H::Encoding,
        _host: &mut H,
    ) -> Result<usize, LexerError> {
        let next = buf[lt + 1];
        self.begin_tag(next, Pos(base + lt));
        if matches!(next, b'/' | b'!' | b'?') {
            Ok(lt + 2)
        } else {
            Ok(lt + 1)
        }
    }

    fn begin_tag(&mut self, next: u8, at: Pos) {
        if next == b'!' {
            self.bang_start = at;
        }
        if next == b'?' {
            self.question_start = at;
        }
        match next {
            b'/' => self.cs = Machine::ElementClose,
            b'!' => self.cs = Machine::BangOpen,
            b'?' => self.cs = Machine::QuestionOpen,
            _ => self.cs = Machine::ElementName,
        }
        self.ns_emitted = false;
    }

    /// Decides what `<!` introduces.
    fn scan_bang<H: Host>(
        &mut self,
        buf: &[u8],
        idx: usize,
        base: usize,
        encoding: H::Encoding,
        host: &mut H,
    ) -> Result<usize, LexerError> {
        let mut probe = self.bang_probe.take().unwrap_or_default();
        let prev_len = probe.as_slice().len();
        let taken = probe.push_all(&buf[idx..]);
        let window = probe.as_slice();

        let consumed_new = |matched: usize| matched.saturating_sub(prev_len).min(taken);

        if window.starts_with(b"--") {
            host.emit_simple(EventKind::CommentStart)
                .map_err(Lexer::host_err)?;
            self.cs = Machine::CommentBody;
            return Ok(idx + consumed_new(2));
        }
        if window.starts_with(b"[CDATA[") {
            host.emit_simple(EventKind::CdataStart)
                .map_err(Lexer::host_err)?;
            self.cs = Machine::CdataBody;
            return Ok(idx + consumed_new(7));
        }
        if window.len() >= 7 && window[..7].eq_ignore_ascii_case(b"DOCTYPE") {
            host.emit_simple(EventKind::DoctypeStart)
                .map_err(Lexer::host_err)?;
            self.cs = Machine::DoctypeHeader { name_emitted: false };
            return Ok(idx + consumed_new(7));
        }

        let candidates: &[&[u8]] = &[b"--", b"[CDATA[", b"DOCTYPE"];
        let still_possible = candidates
            .iter()
            .any(|c| c.starts_with(window) || window.starts_with(&c[..window.len().min(c.len())]));
        if still_possible && window.len() < 8 {
            self.bang_probe = Some(probe);
            return Ok(buf.len());
        }

        self.recover_malformed_bang(window, encoding, host)?;
        Ok(idx + taken)
    }

    fn recover_malformed_bang<H: Host>(
        &mut self,
        window: &[u8],
        encoding: H::Encoding,
        host: &mut H,
    ) -> Result<(), LexerError> {
        if self.config.malformed_bang_recovery {
            let mut recovered = Vec::with_capacity(window.len() + 2);
            recovered.extend_from_slice(b"<!");
            recovered.extend_from_slice(window);
            host.emit(EventKind::Text, &recovered, self.bang_start, encoding)
                .map_err(Lexer::host_err)?;
            self.cs = Machine::Text;
            Ok(())
        } else {
            self.cs = Machine::Error;
            Err(LexerError::DfaStuck {
                machine: "main",
                at: self.position(),
            })
        }
    }

    /// Decides what `<?` introduces: an XML declaration (`<?xml` followed
    /// by a non-name character) or a processing instruction.
    fn scan_question<H: Host>(
        &mut self,
        buf: &[u8],
        idx: usize,
        base: usize,
        encoding: H::Encoding,
        host: &mut H,
    ) -> Result<usize, LexerError> {
        let mut probe = self.question_probe.take().unwrap_or_default();
        let prev_len = probe.as_slice().len();
        let taken = probe.push_all(&buf[idx..]);
        let window = probe.as_slice();

        if window.len() >= 4 {
            if &window[..3] == b"xml" && !crate::chars::is_name_char(window[3]) {
                host.emit_simple(EventKind::XmlDeclStart)
                    .map_err(Lexer::host_err)?;
                self.cs = Machine::XmlDecl;
                // Only `xml` itself is consumed here: the 4th byte is a
                // lookahead peek, not necessarily throwaway whitespace --
                // `<?xml?>` needs `scan_xml_decl` to see the `?` itself
                // to recognize the immediate `?>` close.
                let consumed_new = 3usize.saturating_sub(prev_len).min(taken);
                return Ok(idx + consumed_new);
            }
            host.emit_simple(EventKind::ProcInsStart)
                .map_err(Lexer::host_err)?;
            return self.begin_proc_ins_name(buf, window, idx, prev_len, taken, base, encoding, host);
        }
        if b"xml".starts_with(window) {
            self.question_probe = Some(probe);
            return Ok(buf.len());
        }
        host.emit_simple(EventKind::ProcInsStart)
            .map_err(Lexer::host_err)?;
        self.begin_proc_ins_name(buf, window, idx, prev_len, taken, base, encoding, host)
    }

    /// Resolves the processing instruction's target name from the bytes
    /// captured while disambiguating `<?`. If the name's end falls
    /// within the probed window it is emitted directly and scanning
    /// resumes on the body; otherwise the whole window was name
    /// characters and scanning continues in `buf` (unbounded by the
    /// probe's fixed capacity), carrying across `advance` calls via
    /// [`Machine::ProcInsName`] if the name doesn't end within this
    /// call's buffer either.
    fn begin_proc_ins_name<H: Host>(
        &mut self,
        buf: &[u8],
        window: &[u8],
        idx: usize,
        prev_len: usize,
        taken: usize,
        base: usize,
        encoding: H::Encoding,
        host: &mut H,
    ) -> Result<usize, LexerError> {
        let name_start = self.question_start.shifted(2);
        match window.iter().position(|&b| !crate::chars::is_name_char(b)) {
            Some(name_end) => {
                if name_end > 0 {
                    host.emit(EventKind::ProcInsName, &window[..name_end], name_start, encoding)
                        .map_err(Lexer::host_err)?;
                }
                self.cs = Machine::ProcInsBody;
                let consumed_new = name_end.saturating_sub(prev_len).min(taken);
                Ok(idx + consumed_new)
            }
            None => {
                self.pending = Some(Pending {
                    kind: EventKind::ProcInsName,
                    start: name_start,
                    buf: window.to_vec(),
                });
                self.cs = Machine::ProcInsName;
                self.scan_proc_ins_name_cont(buf, idx + taken, base, encoding, host)
            }
        }
    }

    /// Continues scanning a processing instruction's target name across
    /// an `advance` call boundary, once the bytes probed while
    /// disambiguating `<?` turned out to be entirely name characters.
    fn scan_proc_ins_name_cont<H: Host>(
        &mut self,
        buf: &[u8],
        idx: usize,
        base: usize,
        encoding: H::Encoding,
        host: &mut H,
    ) -> Result<usize, LexerError> {
        let mut i = idx;
        while i < buf.len() && crate::chars::is_name_char(buf[i]) {
            i += 1;
        }
        if i >= buf.len() {
            self.carry(EventKind::ProcInsName, buf, idx, i, base);
            return Ok(buf.len());
        }
        self.flush_ranged(EventKind::ProcInsName, buf, idx, i, base, encoding, host)?;
        self.cs = Machine::ProcInsBody;
        Ok(i)
    }

    /// A generic "scan until a fixed byte-string terminator" helper shared
    /// by comment/CDATA/processing-instruction bodies and the DOCTYPE
    /// internal subset. `on_close` runs once the terminator has been
    /// found and its body flushed, and is responsible for any transition
    /// out of the terminating machine.
    #[allow(clippy::too_many_arguments)]
    fn scan_delimited<H: Host>(
        &mut self,
        buf: &[u8],
        idx: usize,
        base: usize,
        kind: EventKind,
        terminator: &[u8],
        encoding: H::Encoding,
        host: &mut H,
        on_close: impl FnOnce(&mut Lexer, &mut H) -> Result<(), LexerError>,
    ) -> Result<usize, LexerError> {
        if let Some(pos) = self.find_terminator_with_carry(buf, idx, kind, terminator) {
            match pos {
                TerminatorHit::InBuf(body_end) => {
                    self.flush_ranged(kind, buf, idx, body_end, base, encoding, host)?;
                    on_close(self, host)?;
                    Ok(body_end + terminator.len())
                }
                TerminatorHit::SpanningCarry { trim, new_consumed } => {
                    let mut pending = self.pending.take().expect("carry implies pending");
                    pending.buf.truncate(pending.buf.len() - trim);
                    self.emit_pending(pending, encoding, host)?;
                    on_close(self, host)?;
                    Ok(idx + new_consumed)
                }
            }
        } else {
            self.carry(kind, buf, idx, buf.len(), base);
            Ok(buf.len())
        }
    }

    /// Looks for `terminator`, accounting for the possibility that it
    /// began inside bytes already carried in `self.pending` from a
    /// previous call.
    fn find_terminator_with_carry(
        &self,
        buf: &[u8],
        idx: usize,
        kind: EventKind,
        terminator: &[u8],
    ) -> Option<TerminatorHit> {
        if let Some(p) = &self.pending {
            if p.kind == kind && !terminator.is_empty() {
                let overlap = (terminator.len() - 1).min(p.buf.len());
                if overlap > 0 {
                    let mut probe: Vec<u8> =
                        Vec::with_capacity(overlap + terminator.len().min(buf.len() - idx));
                    probe.extend_from_slice(&p.buf[p.buf.len() - overlap..]);
                    let take = terminator.len().min(buf.len() - idx);
                    probe.extend_from_slice(&buf[idx..idx + take]);
                    if let Some(pos) = find_subslice(&probe, terminator) {
                        if pos < overlap {
                            let trim = overlap - pos;
                            let new_consumed = terminator.len() - trim;
                            return Some(TerminatorHit::SpanningCarry { trim, new_consumed });
                        }
                    }
                }
            }
        }
        find_subslice(&buf[idx..], terminator).map(|rel| TerminatorHit::InBuf(idx + rel))
    }

    /// Emits a ranged event covering `buf[start..end]`, prepending any
    /// bytes already carried in `self.pending` for the same token.
    pub(crate) fn flush_ranged<H: Host>(
        &mut self,
        kind: EventKind,
        buf: &[u8],
        start: usize,
        end: usize,
        base: usize,
        encoding: H::Encoding,
        host: &mut H,
    ) -> Result<(), LexerError> {
        match self.pending.take() {
            Some(mut pending) if pending.kind == kind => {
                pending.buf.extend_from_slice(&buf[start..end]);
                self.emit_pending(pending, encoding, host)
            }
            Some(other) => {
                // A different token was pending; flush it as-is first.
                // This should not arise given the machine's own
                // discipline, but emitting it rather than discarding it
                // keeps the byte-range coverage invariant intact.
                self.emit_pending(other, encoding, host)?;
                if start < end || !buf[start..end].is_empty() {
                    host.emit(kind, &buf[start..end], Pos(base + start), encoding)
                        .map_err(Lexer::host_err)?;
                }
                Ok(())
            }
            None => {
                if start < end {
                    host.emit(kind, &buf[start..end], Pos(base + start), encoding)
                        .map_err(Lexer::host_err)?;
                }
                Ok(())
            }
        }
    }

    fn emit_pending<H: Host>(
        &mut self,
        pending: Pending,
        encoding: H::Encoding,
        host: &mut H,
    ) -> Result<(), LexerError> {
        host.emit(pending.kind, &pending.buf, pending.start, encoding)
            .map_err(Lexer::host_err)
    }

    /// Stashes `buf[start..end]` as the partial body of an in-progress
    /// ranged token, to be continued (or flushed) on the next call.
    pub(crate) fn carry(&mut self, kind: EventKind, buf: &[u8], start: usize, end: usize, base: usize) {
        if start >= end && self.pending.is_none() {
            return;
        }
        match &mut self.pending {
            Some(p) if p.kind == kind => p.buf.extend_from_slice(&buf[start..end]),
            Some(_) => {
                // Shouldn't happen in practice: a machine switch always
                // flushes its pending token first. Fall back to starting
                // a fresh carry rather than losing bytes.
                self.pending = Some(Pending {
                    kind,
                    start: Pos(base + start),
                    buf: buf[start..end].to_vec(),
                });
            }
            None => {
                self.pending = Some(Pending {
                    kind,
                    start: Pos(base + start),
                    buf: buf[start..end].to_vec(),
                });
            }
        }
    }

    /// Flushes whatever is in `self.pending` immediately, used when a
    /// deferred mark decision finally resolves to a tag opener and the
    /// accumulated text run must end exactly at the carried `<`.
    fn flush_pending<H: Host>(
        &mut self,
        kind: EventKind,
        encoding: H::Encoding,
        host: &mut H,
    ) -> Result<(), LexerError> {
        if let Some(pending) = self.pending.take() {
            debug_assert_eq!(pending.kind, kind);
            self.emit_pending(pending, encoding, host)?;
        }
        Ok(())
    }

    /// Scans a DOCTYPE header: optional whitespace, the root name, an
    /// optional `PUBLIC`/`SYSTEM` type keyword and its literal(s), an
    /// optional internal subset, and the closing `>`.
    fn scan_doctype_header<H: Host>(
        &mut self,
        buf: &[u8],
        idx: usize,
        base: usize,
        encoding: H::Encoding,
        host: &mut H,
    ) -> Result<usize, LexerError> {
        let name_emitted = matches!(self.cs, Machine::DoctypeHeader { name_emitted: true });
        let mut i = idx;
        while i < buf.len() && crate::chars::is_space(buf[i]) {
            i += 1;
        }
        if i >= buf.len() {
            return Ok(buf.len());
        }
        match buf[i] {
            b'>' => {
                host.emit_simple(EventKind::DoctypeEnd)
                    .map_err(Lexer::host_err)?;
                self.cs = Machine::Text;
                Ok(i + 1)
            }
            b'[' => {
                self.cs = Machine::DoctypeInline;
                Ok(i + 1)
            }
            b'\'' => {
                host.emit_simple(EventKind::StringSquote)
                    .map_err(Lexer::host_err)?;
                self.stack.push(Machine::DoctypeHeader { name_emitted: true });
                self.cs = Machine::StringSquote;
                Ok(i + 1)
            }
            b'"' => {
                host.emit_simple(EventKind::StringDquote)
                    .map_err(Lexer::host_err)?;
                self.stack.push(Machine::DoctypeHeader { name_emitted: true });
                self.cs = Machine::StringDquote;
                Ok(i + 1)
            }
            b if is_name_start(b) => {
                let name_start = i;
                while i < buf.len() && crate::chars::is_name_char(buf[i]) {
                    i += 1;
                }
                if i >= buf.len() {
                    self.carry(
                        if name_emitted { EventKind::DoctypeType } else { EventKind::DoctypeName },
                        buf,
                        name_start,
                        i,
                        base,
                    );
                    return Ok(buf.len());
                }
                let kind = if name_emitted { EventKind::DoctypeType } else { EventKind::DoctypeName };
                self.flush_ranged(kind, buf, name_start, i, base, encoding, host)?;
                self.cs = Machine::DoctypeHeader { name_emitted: true };
                Ok(i)
            }
            _ => {
                self.cs = Machine::Error;
                Err(LexerError::DfaStuck { machine: "doctype", at: Pos(base + i) })
            }
        }
    }

    /// Scans the pseudo-attribute list of `<?xml ... ?>`. Each
    /// pseudo-attribute is scanned by the same name/value machinery used
    /// for ordinary element attributes, returning here (via the machine
    /// stack) between one pseudo-attribute and the next.
    fn scan_xml_decl<H: Host>(
        &mut self,
        buf: &[u8],
        idx: usize,
        base: usize,
        _encoding: H::Encoding,
        host: &mut H,
    ) -> Result<usize, LexerError> {
        let mut i = idx;
        while i < buf.len() && crate::chars::is_space(buf[i]) {
            i += 1;
        }
        if i >= buf.len() {
            return Ok(buf.len());
        }
        if buf[i] == b'?' {
            if i + 1 >= buf.len() {
                return Ok(buf.len());
            }
            if buf[i + 1] == b'>' {
                host.emit_simple(EventKind::XmlDeclEnd)
                    .map_err(Lexer::host_err)?;
                self.cs = Machine::Text;
                return Ok(i + 2);
            }
            self.cs = Machine::Error;
            return Err(LexerError::DfaStuck { machine: "xml_decl", at: Pos(base + i) });
        }
        if is_name_start(buf[i]) {
            self.stack.push(Machine::XmlDecl);
            self.ns_emitted = false;
            self.cs = Machine::AttributeName;
            return Ok(i);
        }
        self.cs = Machine::Error;
        Err(LexerError::DfaStuck { machine: "xml_decl", at: Pos(base + i) })
    }
}

////////////////////////////////////////////////////////////////////////////////
// Free functions
////////////////////////////////////////////////////////////////////////////////
enum TerminatorHit {
    InBuf(usize),
    SpanningCarry { trim: usize, new_consumed: usize },
}

pub(crate) fn find_byte(haystack: &[u8], needle: u8) -> Option<usize> {
    haystack.iter().position(|&b| b == needle)
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Returns true if `b` following a `<` is enough to commit to a tag open:
/// a name-start byte, `/`, `!`, or `?`.
fn is_tag_open_start(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'/' | b'!' | b'?')
}
