////////////////////////////////////////////////////////////////////////////////
// Markup lexer core library
////////////////////////////////////////////////////////////////////////////////
// Copyright 2022 Skylor R. Schermer
// This code is dual licenced using the MIT or Apache 2 license.
// See licence-mit.md and licence-apache.md for details.
////////////////////////////////////////////////////////////////////////////////
//! The machine identifiers (`cs`) and the return-address stack.
////////////////////////////////////////////////////////////////////////////////

////////////////////////////////////////////////////////////////////////////////
// Machine
////////////////////////////////////////////////////////////////////////////////
/// Identifies which sub-machine of the pushdown DFA is currently active.
///
/// This is the Rust rendition of the generated scanner's `cs` register.
/// `Main` and `Text` share a single stepping function (ordinary content
/// is what `main` scans before it sees a `<`, and what `text` resumes
/// scanning after a `<` turns out not to start a tag); they are kept as
/// distinct variants only so a freshly reset lexer reports `Main` rather
/// than the slightly-misleading `Text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Machine {
    /// Top-level content scanning, before any text run has been opened.
    Main,
    /// Character data between tags.
    Text,
    /// Deciding what `<!` introduces (comment, CDATA, DOCTYPE, or an
    /// unrecognized construct).
    BangOpen,
    /// Deciding what `<?` introduces (an XML declaration or a plain
    /// processing instruction).
    QuestionOpen,
    /// The body of `<!-- ... -->`.
    CommentBody,
    /// The body of `<![CDATA[ ... ]]>`.
    CdataBody,
    /// A processing instruction's target name, once it has been
    /// determined not to be an XML declaration. Distinct from
    /// [`ProcInsBody`](Machine::ProcInsBody) because the name itself may
    /// need to carry across an `advance` call boundary.
    ProcInsName,
    /// The body of a processing instruction, up to `?>`.
    ProcInsBody,
    /// The attribute region of `<?xml ... ?>`.
    XmlDecl,
    /// A DOCTYPE header, tracking whether the root name has already
    /// been emitted (so the next bare identifier is read as a
    /// `PUBLIC`/`SYSTEM` type keyword instead).
    DoctypeHeader { name_emitted: bool },
    /// The `[ ... ]` internal subset of a DOCTYPE header.
    DoctypeInline,
    /// An opening tag's element name, up to the first `:` or the end
    /// of the name.
    ElementName,
    /// A closing tag's element name.
    ElementClose,
    /// The optional whitespace before a closing tag's `>`.
    ElementCloseGt,
    /// The optional whitespace before a self-closing opening tag's final
    /// `>`, after its `/` has already been seen.
    ElementSelfCloseGt,
    /// An opening tag's attribute list, in XML mode.
    ElementHead,
    /// An opening tag's attribute list, in HTML mode.
    HtmlElementHead,
    /// An attribute's name, up to the first `:` or the end of the name.
    AttributeName,
    /// Whitespace and quote detection between an attribute's `=` and
    /// its value.
    AttributePre,
    /// An HTML unquoted attribute value.
    UnquotedAttributeValue,
    /// A single-quoted string body.
    StringSquote,
    /// A double-quoted string body.
    StringDquote,
    /// HTML `<script>` raw text.
    HtmlScript,
    /// HTML `<style>` raw text.
    HtmlStyle,
    /// The DFA's absorbing error state.
    Error,
}

impl Machine {
    /// Returns the stable name used in diagnostics, matching the
    /// machine names used throughout the lexer's design notes.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Machine::Main                      => "main",
            Machine::Text                      => "text",
            Machine::BangOpen                  => "main",
            Machine::QuestionOpen              => "main",
            Machine::CommentBody               => "comment_body",
            Machine::CdataBody                 => "cdata_body",
            Machine::ProcInsName               => "proc_ins_body",
            Machine::ProcInsBody               => "proc_ins_body",
            Machine::XmlDecl                   => "xml_decl",
            Machine::DoctypeHeader { .. }       => "doctype",
            Machine::DoctypeInline             => "doctype_inline",
            Machine::ElementName               => "element_name",
            Machine::ElementClose              => "element_close",
            Machine::ElementCloseGt            => "element_close",
            Machine::ElementSelfCloseGt        => "element_head",
            Machine::ElementHead               => "element_head",
            Machine::HtmlElementHead           => "html_element_head",
            Machine::AttributeName             => "attribute_pre",
            Machine::AttributePre              => "attribute_pre",
            Machine::UnquotedAttributeValue    => "unquoted_attribute_value",
            Machine::StringSquote              => "string_squote",
            Machine::StringDquote              => "string_dquote",
            Machine::HtmlScript                => "html_script",
            Machine::HtmlStyle                 => "html_style",
            Machine::Error                     => "error",
        }
    }
}


////////////////////////////////////////////////////////////////////////////////
// MachineStack
////////////////////////////////////////////////////////////////////////////////
/// The fixed-capacity return-address stack used when a sub-machine (a
/// quoted string) is entered from more than one caller machine.
///
/// A depth of 8 comfortably covers every nesting path in the grammar:
/// strings never nest, so in practice at most one frame is ever live,
/// but the extra headroom costs nothing and avoids a surprise panic if
/// the grammar grows a second level of nesting later.
#[derive(Debug, Clone, Copy)]
pub struct MachineStack {
    frames: [Machine; Self::CAPACITY],
    top: usize,
}

impl MachineStack {
    /// The maximum supported nesting depth.
    pub const CAPACITY: usize = 8;

    /// Constructs an empty stack.
    #[must_use]
    pub fn new() -> Self {
        MachineStack {
            frames: [Machine::Main; Self::CAPACITY],
            top: 0,
        }
    }

    /// Returns the number of frames currently pushed.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.top
    }

    /// Returns true if no frames are pushed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.top == 0
    }

    /// Returns the most recently pushed return target without removing it.
    #[must_use]
    pub fn top(&self) -> Option<Machine> {
        if self.top == 0 {
            None
        } else {
            Some(self.frames[self.top - 1])
        }
    }

    /// Pushes a return target.
    ///
    /// # Panics
    ///
    /// Panics if the stack is already at capacity; no path through the
    /// grammar this lexer implements nests this deep.
    pub fn push(&mut self, machine: Machine) {
        assert!(self.top < Self::CAPACITY, "machine stack overflow");
        self.frames[self.top] = machine;
        self.top += 1;
    }

    /// Pops the most recently pushed return target.
    pub fn pop(&mut self) -> Option<Machine> {
        if self.top == 0 {
            None
        } else {
            self.top -= 1;
            Some(self.frames[self.top])
        }
    }

    /// Clears the stack without returning the popped frames.
    pub fn clear(&mut self) {
        self.top = 0;
    }
}

impl Default for MachineStack {
    fn default() -> Self {
        Self::new()
    }
}
