////////////////////////////////////////////////////////////////////////////////
// Markup lexer core library
////////////////////////////////////////////////////////////////////////////////
// Copyright 2022 Skylor R. Schermer
// This code is dual licenced using the MIT or Apache 2 license.
// See licence-mit.md and licence-apache.md for details.
////////////////////////////////////////////////////////////////////////////////
//! Token event kinds.
////////////////////////////////////////////////////////////////////////////////


////////////////////////////////////////////////////////////////////////////////
// EventKind
////////////////////////////////////////////////////////////////////////////////
/// The kind of a token event emitted by the lexer.
///
/// Ranged kinds are emitted through [`Host::emit`](crate::Host::emit) with
/// the byte slice they cover; simple kinds carry no data and are emitted
/// through [`Host::emit_simple`](crate::Host::emit_simple).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A run of character data.
    Text,
    /// The `<!--` opener.
    CommentStart,
    /// The content between `<!--` and `-->`.
    CommentBody,
    /// The `-->` closer.
    CommentEnd,
    /// The `<![CDATA[` opener.
    CdataStart,
    /// The content between `<![CDATA[` and `]]>`.
    CdataBody,
    /// The `]]>` closer.
    CdataEnd,
    /// The `<?` opener of a processing instruction.
    ProcInsStart,
    /// The target name of a processing instruction.
    ProcInsName,
    /// The content between the processing instruction name and `?>`.
    ProcInsBody,
    /// The `?>` closer of a processing instruction.
    ProcInsEnd,
    /// The `<!DOCTYPE` opener.
    DoctypeStart,
    /// The root element name in a DOCTYPE header.
    DoctypeName,
    /// The `PUBLIC`/`SYSTEM` keyword in a DOCTYPE header.
    DoctypeType,
    /// The content of a DOCTYPE internal subset (`[ ... ]`).
    DoctypeInline,
    /// The `>` closing a DOCTYPE header.
    DoctypeEnd,
    /// The `<?xml` opener of an XML declaration.
    XmlDeclStart,
    /// The `?>` closer of an XML declaration.
    XmlDeclEnd,
    /// An element or attribute namespace prefix (before the `:`).
    ElementNs,
    /// An element's local name.
    ElementName,
    /// The closing of an element, carrying its name.
    ElementEnd,
    /// The `>` ending an opening tag's attribute list.
    ElementOpenEnd,
    /// An attribute's namespace prefix (before the `:`).
    AttributeNs,
    /// An attribute's local name.
    Attribute,
    /// A `'` opening or closing a single-quoted string.
    StringSquote,
    /// A `"` opening or closing a double-quoted string.
    StringDquote,
    /// The content of a quoted (or HTML unquoted) attribute/declaration
    /// value.
    StringBody,
}

impl EventKind {
    /// Returns true if this event kind is always emitted through
    /// [`Host::emit_simple`](crate::Host::emit_simple) rather than
    /// [`Host::emit`](crate::Host::emit).
    ///
    /// `ElementEnd` is the one exception: a `</name>` close carries the
    /// name as a ranged event, but a self-closing `/>` has no name to
    /// carry and is emitted simple. Callers that special-case `ElementEnd`
    /// should not rely on this method for it.
    #[must_use]
    pub fn is_simple(self) -> bool {
        matches!(self,
            EventKind::CommentStart
            | EventKind::CommentEnd
            | EventKind::CdataStart
            | EventKind::CdataEnd
            | EventKind::ProcInsStart
            | EventKind::ProcInsEnd
            | EventKind::DoctypeStart
            | EventKind::DoctypeEnd
            | EventKind::XmlDeclStart
            | EventKind::XmlDeclEnd
            | EventKind::ElementOpenEnd
            | EventKind::StringSquote
            | EventKind::StringDquote)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EventKind::Text           => "text",
            EventKind::CommentStart   => "comment_start",
            EventKind::CommentBody    => "comment_body",
            EventKind::CommentEnd     => "comment_end",
            EventKind::CdataStart     => "cdata_start",
            EventKind::CdataBody      => "cdata_body",
            EventKind::CdataEnd       => "cdata_end",
            EventKind::ProcInsStart   => "proc_ins_start",
            EventKind::ProcInsName    => "proc_ins_name",
            EventKind::ProcInsBody    => "proc_ins_body",
            EventKind::ProcInsEnd     => "proc_ins_end",
            EventKind::DoctypeStart   => "doctype_start",
            EventKind::DoctypeName    => "doctype_name",
            EventKind::DoctypeType    => "doctype_type",
            EventKind::DoctypeInline  => "doctype_inline",
            EventKind::DoctypeEnd     => "doctype_end",
            EventKind::XmlDeclStart   => "xml_decl_start",
            EventKind::XmlDeclEnd     => "xml_decl_end",
            EventKind::ElementNs      => "element_ns",
            EventKind::ElementName    => "element_name",
            EventKind::ElementEnd     => "element_end",
            EventKind::ElementOpenEnd => "element_open_end",
            EventKind::AttributeNs    => "attribute_ns",
            EventKind::Attribute      => "attribute",
            EventKind::StringSquote   => "string_squote",
            EventKind::StringDquote   => "string_dquote",
            EventKind::StringBody     => "string_body",
        };
        f.write_str(name)
    }
}
