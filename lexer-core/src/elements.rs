////////////////////////////////////////////////////////////////////////////////
// Markup lexer core library
////////////////////////////////////////////////////////////////////////////////
// Copyright 2022 Skylor R. Schermer
// This code is dual licenced using the MIT or Apache 2 license.
// See licence-mit.md and licence-apache.md for details.
////////////////////////////////////////////////////////////////////////////////
//! Element names, attribute lists, quoted/unquoted attribute values, and
//! HTML raw-text (`script`/`style`) closing-tag detection.
//!
//! The machine stack is used here as the return address for "what comes
//! after this attribute's value": entering an attribute name pushes the
//! owning head machine (`ElementHead`, `HtmlElementHead`, or `XmlDecl`);
//! the value scanner pops it back off once the value ends, regardless of
//! whether the value was quoted or (HTML only) bare.
////////////////////////////////////////////////////////////////////////////////

// Internal library imports.
use crate::chars::{is_name_start, is_space};
use crate::dfa::find_byte;
use crate::state::Machine;
use crate::token::EventKind;
use crate::Host;

// External library imports.
use lexer_error::LexerError;
use lexer_span::Pos;

use crate::dfa::Lexer;

////////////////////////////////////////////////////////////////////////////////
// RawTextProbe
////////////////////////////////////////////////////////////////////////////////
/// Carries a `<` found too close to the end of an `html_script`/
/// `html_style` buffer to tell whether it opens the raw text's closing
/// tag.
#[derive(Debug, Clone)]
pub(crate) struct RawTextProbe {
    pub(crate) start: Pos,
    pub(crate) buf: Vec<u8>,
}

/// Result of attempting to resolve a carried [`RawTextProbe`].
enum RawTextProbeOutcome {
    /// The closing tag matched; `cs` has already moved to `Text`.
    Closed,
    /// Not enough bytes were available; the candidate was stashed back
    /// onto `self.raw_text_probe`.
    NeedsMore,
    /// The candidate was fully resolved as ordinary text; normal
    /// scanning should resume from the index written back through
    /// `idx`.
    Continue,
}

impl Lexer {
    /// Dispatches the element/attribute/string family of machines.
    pub(crate) fn step_element<H: Host>(
        &mut self,
        buf: &[u8],
        idx: usize,
        base: usize,
        encoding: H::Encoding,
        host: &mut H,
    ) -> Result<usize, LexerError> {
        match self.cs {
            Machine::ElementName => {
                match self.scan_name(
                    buf, idx, base, EventKind::ElementNs, EventKind::ElementName, encoding, host,
                )? {
                    Some(next) => {
                        self.ns_emitted = false;
                        self.cs = if host.html_p() {
                            Machine::HtmlElementHead
                        } else {
                            Machine::ElementHead
                        };
                        Ok(next)
                    }
                    None => Ok(buf.len()),
                }
            }
            Machine::ElementClose => {
                match self.scan_name(
                    buf, idx, base, EventKind::ElementNs, EventKind::ElementEnd, encoding, host,
                )? {
                    Some(next) => {
                        self.ns_emitted = false;
                        self.cs = Machine::ElementCloseGt;
                        Ok(next)
                    }
                    None => Ok(buf.len()),
                }
            }
            Machine::ElementCloseGt => {
                let mut i = idx;
                while i < buf.len() && is_space(buf[i]) {
                    i += 1;
                }
                if i >= buf.len() {
                    return Ok(buf.len());
                }
                if buf[i] == b'>' {
                    self.cs = Machine::Text;
                    Ok(i + 1)
                } else {
                    self.cs = Machine::Error;
                    Err(LexerError::DfaStuck { machine: "element_close", at: Pos(base + i) })
                }
            }
            Machine::ElementSelfCloseGt => {
                let mut i = idx;
                while i < buf.len() && is_space(buf[i]) {
                    i += 1;
                }
                if i >= buf.len() {
                    return Ok(buf.len());
                }
                if buf[i] == b'>' {
                    host.emit_simple(EventKind::ElementEnd)
                        .map_err(Lexer::host_err)?;
                    host.emit_simple(EventKind::ElementOpenEnd)
                        .map_err(Lexer::host_err)?;
                    self.cs = Machine::Text;
                    Ok(i + 1)
                } else {
                    self.cs = Machine::Error;
                    Err(LexerError::DfaStuck { machine: "element_head", at: Pos(base + i) })
                }
            }
            Machine::ElementHead | Machine::HtmlElementHead => {
                self.scan_attribute_list(buf, idx, base, encoding, host)
            }
            Machine::AttributeName => {
                match self.scan_name(
                    buf, idx, base, EventKind::AttributeNs, EventKind::Attribute, encoding, host,
                )? {
                    Some(next) => {
                        self.cs = Machine::AttributePre;
                        Ok(next)
                    }
                    None => Ok(buf.len()),
                }
            }
            Machine::AttributePre => self.scan_attribute_pre(buf, idx, base, encoding, host),
            Machine::UnquotedAttributeValue => {
                self.scan_unquoted_value(buf, idx, base, encoding, host)
            }
            Machine::StringSquote => {
                self.scan_string(buf, idx, base, b'\'', EventKind::StringSquote, encoding, host)
            }
            Machine::StringDquote => {
                self.scan_string(buf, idx, base, b'"', EventKind::StringDquote, encoding, host)
            }
            other => unreachable!("step_element called with {:?}", other),
        }
    }

    /// Scans an XML `Name` production, splitting at the first `:` into a
    /// namespace prefix (`ns_kind`) and local name (`name_kind`).
    ///
    /// Returns `Ok(Some(idx))` once the name has ended (a non-name byte
    /// was found), or `Ok(None)` if the buffer ran out first and the
    /// partial name has been carried for the next call.
    pub(crate) fn scan_name<H: Host>(
        &mut self,
        buf: &[u8],
        idx: usize,
        base: usize,
        ns_kind: EventKind,
        name_kind: EventKind,
        encoding: H::Encoding,
        host: &mut H,
    ) -> Result<Option<usize>, LexerError> {
        let mut i = idx;
        while i < buf.len() {
            let b = buf[i];
            if crate::chars::is_name_char(b) {
                i += 1;
                continue;
            }
            if b == b':' && !self.ns_emitted {
                self.split_name_at_colon(buf, idx, i, base, ns_kind, encoding, host)?;
                self.ns_emitted = true;
                return self.scan_name(buf, i + 1, base, ns_kind, name_kind, encoding, host);
            }
            self.flush_ranged(name_kind, buf, idx, i, base, encoding, host)?;
            return Ok(Some(i));
        }
        self.carry(name_kind, buf, idx, i, base);
        Ok(None)
    }

    /// Flushes the namespace-prefix portion of a name once its `:` has
    /// been found. If the prefix was already partly carried from a
    /// previous call (tagged provisionally as `name_kind` since the `:`
    /// hadn't been seen yet), it is re-tagged as `ns_kind` here.
    fn split_name_at_colon<H: Host>(
        &mut self,
        buf: &[u8],
        idx: usize,
        colon: usize,
        base: usize,
        ns_kind: EventKind,
        encoding: H::Encoding,
        host: &mut H,
    ) -> Result<(), LexerError> {
        match self.pending.take() {
            Some(mut pending) => {
                pending.kind = ns_kind;
                pending.buf.extend_from_slice(&buf[idx..colon]);
                host.emit(pending.kind, &pending.buf, pending.start, encoding)
                    .map_err(Lexer::host_err)
            }
            None => {
                if idx < colon {
                    host.emit(ns_kind, &buf[idx..colon], Pos(base + idx), encoding)
                        .map_err(Lexer::host_err)
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Scans an opening tag's attribute list: whitespace, the next
    /// attribute name, or the tag's close (`>` or `/>`).
    fn scan_attribute_list<H: Host>(
        &mut self,
        buf: &[u8],
        idx: usize,
        base: usize,
        encoding: H::Encoding,
        host: &mut H,
    ) -> Result<usize, LexerError> {
        let head = self.cs;
        let mut i = idx;
        while i < buf.len() && is_space(buf[i]) {
            i += 1;
        }
        if i >= buf.len() {
            return Ok(buf.len());
        }
        match buf[i] {
            b'>' => {
                host.emit_simple(EventKind::ElementOpenEnd)
                    .map_err(Lexer::host_err)?;
                self.cs = if host.html_script_p() {
                    Machine::HtmlScript
                } else if host.html_style_p() {
                    Machine::HtmlStyle
                } else {
                    Machine::Text
                };
                Ok(i + 1)
            }
            b'/' => {
                if i + 1 < buf.len() {
                    if buf[i + 1] == b'>' {
                        host.emit_simple(EventKind::ElementEnd)
                            .map_err(Lexer::host_err)?;
                        host.emit_simple(EventKind::ElementOpenEnd)
                            .map_err(Lexer::host_err)?;
                        self.cs = Machine::Text;
                        Ok(i + 2)
                    } else {
                        self.cs = Machine::Error;
                        Err(LexerError::DfaStuck { machine: head.name(), at: Pos(base + i) })
                    }
                } else {
                    self.cs = Machine::ElementSelfCloseGt;
                    Ok(i + 1)
                }
            }
            b if is_name_start(b) => {
                self.stack.push(head);
                self.ns_emitted = false;
                self.cs = Machine::AttributeName;
                Ok(i)
            }
            _ => {
                self.cs = Machine::Error;
                Err(LexerError::DfaStuck { machine: head.name(), at: Pos(base + i) })
            }
        }
    }

    /// Scans the whitespace/`=`/whitespace/quote run between an
    /// attribute's name and its value.
    fn scan_attribute_pre<H: Host>(
        &mut self,
        buf: &[u8],
        idx: usize,
        base: usize,
        _encoding: H::Encoding,
        host: &mut H,
    ) -> Result<usize, LexerError> {
        let mut i = idx;
        while i < buf.len() && is_space(buf[i]) {
            i += 1;
        }
        if i >= buf.len() {
            return Ok(buf.len());
        }
        if buf[i] != b'=' {
            self.cs = self.stack.pop().unwrap_or(Machine::Text);
            return Ok(i);
        }
        i += 1;
        while i < buf.len() && is_space(buf[i]) {
            i += 1;
        }
        if i >= buf.len() {
            return Ok(buf.len());
        }
        match buf[i] {
            b'\'' => {
                host.emit_simple(EventKind::StringSquote)
                    .map_err(Lexer::host_err)?;
                self.cs = Machine::StringSquote;
                Ok(i + 1)
            }
            b'"' => {
                host.emit_simple(EventKind::StringDquote)
                    .map_err(Lexer::host_err)?;
                self.cs = Machine::StringDquote;
                Ok(i + 1)
            }
            _ if matches!(self.stack.top(), Some(Machine::HtmlElementHead)) => {
                self.cs = Machine::UnquotedAttributeValue;
                Ok(i)
            }
            _ => {
                self.cs = Machine::Error;
                Err(LexerError::DfaStuck { machine: "attribute_pre", at: Pos(base + i) })
            }
        }
    }

    /// Scans an HTML unquoted attribute value, up to whitespace, `>`, or
    /// `/`.
    fn scan_unquoted_value<H: Host>(
        &mut self,
        buf: &[u8],
        idx: usize,
        base: usize,
        encoding: H::Encoding,
        host: &mut H,
    ) -> Result<usize, LexerError> {
        let mut i = idx;
        while i < buf.len() && !is_space(buf[i]) && buf[i] != b'>' && buf[i] != b'/' {
            i += 1;
        }
        if i >= buf.len() {
            self.carry(EventKind::StringBody, buf, idx, i, base);
            return Ok(buf.len());
        }
        self.flush_ranged(EventKind::StringBody, buf, idx, i, base, encoding, host)?;
        self.cs = self.stack.pop().unwrap_or(Machine::Text);
        Ok(i)
    }

    /// Scans a quoted string body (shared by attribute values, XML
    /// declaration pseudo-attribute values, and DOCTYPE literals), up to
    /// its closing quote.
    fn scan_string<H: Host>(
        &mut self,
        buf: &[u8],
        idx: usize,
        base: usize,
        quote: u8,
        kind: EventKind,
        encoding: H::Encoding,
        host: &mut H,
    ) -> Result<usize, LexerError> {
        match find_byte(&buf[idx..], quote) {
            Some(rel) => {
                let end = idx + rel;
                self.flush_ranged(EventKind::StringBody, buf, idx, end, base, encoding, host)?;
                host.emit_simple(kind).map_err(Lexer::host_err)?;
                self.cs = self.stack.pop().unwrap_or(Machine::Text);
                Ok(end + 1)
            }
            None => {
                self.carry(EventKind::StringBody, buf, idx, buf.len(), base);
                Ok(buf.len())
            }
        }
    }

    /// Scans HTML raw text (`<script>`/`<style>` content) up to its
    /// case-sensitivity-configurable closing tag.
    ///
    /// The literal closer (`</script>` or `</style>`) is matched whole,
    /// including the final `>`: unlike an ordinary closing tag, no
    /// whitespace is tolerated before it (the source's raw-text machines
    /// only ever look for the exact byte sequence). Once matched, the
    /// tag name is emitted as an ordinary ranged `ElementEnd` event so a
    /// raw-text close looks the same to a host as any other closing tag.
    pub(crate) fn scan_raw_text<H: Host>(
        &mut self,
        buf: &[u8],
        idx: usize,
        base: usize,
        tag: &[u8],
        encoding: H::Encoding,
        host: &mut H,
    ) -> Result<usize, LexerError> {
        let needed = tag.len() + 3;
        let mut idx = idx;

        if let Some(probe) = self.raw_text_probe.take() {
            match self.extend_raw_text_probe(probe, buf, &mut idx, needed, tag, encoding, host)? {
                RawTextProbeOutcome::Closed => return Ok(idx),
                RawTextProbeOutcome::NeedsMore => return Ok(buf.len()),
                RawTextProbeOutcome::Continue => {}
            }
        }

        let mut search_from = idx;
        loop {
            match find_byte(&buf[search_from..], b'<') {
                Some(rel) => {
                    let lt = search_from + rel;
                    let remaining = buf.len() - lt;
                    if remaining >= needed {
                        let window = &buf[lt..lt + needed];
                        if Self::raw_text_closer_matches(window, tag, self.config.raw_text_case_sensitive) {
                            self.flush_ranged(EventKind::Text, buf, idx, lt, base, encoding, host)?;
                            host.emit(EventKind::ElementEnd, tag, Pos(base + lt + 2), encoding)
                                .map_err(Lexer::host_err)?;
                            self.cs = Machine::Text;
                            return Ok(lt + needed);
                        }
                        search_from = lt + 1;
                        continue;
                    } else {
                        self.carry(EventKind::Text, buf, idx, lt, base);
                        self.raw_text_probe = Some(RawTextProbe {
                            start: Pos(base + lt),
                            buf: buf[lt..].to_vec(),
                        });
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

    /// Resolves (or keeps extending) a closer candidate carried from a
    /// previous call, or from backtracking within this one.
    ///
    /// On a mismatch the candidate's leading `<` is not a closer after
    /// all, so it becomes ordinary text and the search for the next `<`
    /// resumes one byte later rather than past the whole failed window --
    /// a genuine closer can begin anywhere inside a failed candidate.
    fn extend_raw_text_probe<H: Host>(
        &mut self,
        mut probe: RawTextProbe,
        buf: &[u8],
        idx: &mut usize,
        needed: usize,
        tag: &[u8],
        encoding: H::Encoding,
        host: &mut H,
    ) -> Result<RawTextProbeOutcome, LexerError> {
        loop {
            if probe.buf.len() < needed {
                let take = (needed - probe.buf.len()).min(buf.len() - *idx);
                probe.buf.extend_from_slice(&buf[*idx..*idx + take]);
                *idx += take;
                if probe.buf.len() < needed {
                    self.raw_text_probe = Some(probe);
                    return Ok(RawTextProbeOutcome::NeedsMore);
                }
            }
            if Self::raw_text_closer_matches(&probe.buf, tag, self.config.raw_text_case_sensitive) {
                if let Some(pending) = self.pending.take() {
                    host.emit(pending.kind, &pending.buf, pending.start, encoding)
                        .map_err(Lexer::host_err)?;
                }
                host.emit(EventKind::ElementEnd, tag, probe.start.shifted(2), encoding)
                    .map_err(Lexer::host_err)?;
                self.cs = Machine::Text;
                return Ok(RawTextProbeOutcome::Closed);
            }
            match find_byte(&probe.buf[1..], b'<') {
                Some(rel) => {
                    let next_lt = 1 + rel;
                    self.carry_raw(EventKind::Text, &probe.buf[..next_lt], probe.start);
                    probe = RawTextProbe {
                        start: probe.start.shifted(next_lt),
                        buf: probe.buf[next_lt..].to_vec(),
                    };
                }
                None => {
                    self.carry_raw(EventKind::Text, &probe.buf, probe.start);
                    return Ok(RawTextProbeOutcome::Continue);
                }
            }
        }
    }

    /// Checks whether `window` is the literal `</tag>` closer: `tag.len()
    /// + 3` bytes, starting with `</`, ending with `>`, with the name
    /// between matched per `case_sensitive`.
    fn raw_text_closer_matches(window: &[u8], tag: &[u8], case_sensitive: bool) -> bool {
        let needed = tag.len() + 3;
        if window.len() < needed || window[0] != b'<' || window[1] != b'/' || window[needed - 1] != b'>' {
            return false;
        }
        let candidate = &window[2..2 + tag.len()];
        if case_sensitive {
            candidate == tag
        } else {
            candidate.eq_ignore_ascii_case(tag)
        }
    }

    /// Carries an already-assembled byte run (the failed raw-text closer
    /// probe) as the partial body of an in-progress `Text` token.
    fn carry_raw(&mut self, kind: EventKind, raw: &[u8], start: Pos) {
        match &mut self.pending {
            Some(p) if p.kind == kind => p.buf.extend_from_slice(raw),
            _ => {
                self.pending = Some(crate::dfa::Pending { kind, start, buf: raw.to_vec() });
            }
        }
    }
}
