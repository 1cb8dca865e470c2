//! Minimal HTML tokenizer for author-supplied statement markup.
//!
//! Author HTML comes either from the rich editor (well formed) or from the
//! plain-HTML textarea (anything goes), so the tokenizer never fails: input it
//! cannot make sense of is passed through as text. Every token keeps the raw
//! slice it was read from, so concatenating `raw` over all tokens reproduces
//! the input exactly.

use std::borrow::Cow;

use smol_str::SmolStr;

/// Elements whose content is not markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Elements that never have an end tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// A single attribute on a start tag. Values are entity-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: SmolStr,
    pub value: Option<String>,
}

impl Attribute {
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: SmolStr::new(name),
            value: Some(value.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    /// Lowercased tag name.
    pub name: SmolStr,
    pub attrs: Vec<Attribute>,
    pub self_closing: bool,
}

impl StartTag {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
            .and_then(|attr| attr.value.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    StartTag(StartTag),
    /// Lowercased tag name.
    EndTag(SmolStr),
    /// Character data, entities not yet decoded (see [`decode_entities`]).
    Text,
    Comment,
    Doctype,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub raw: &'a str,
}

/// Iterator over the tokens of an HTML fragment.
pub struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
    /// Set while inside a raw text element such as `<script>`.
    raw_text_end: Option<&'static str>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            raw_text_end: None,
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn emit(&mut self, kind: TokenKind, end: usize) -> Token<'a> {
        let raw = &self.src[self.pos..end];
        self.pos = end;
        Token { kind, raw }
    }

    fn read_raw_text(&mut self, end_tag: &'static str) -> Option<Token<'a>> {
        let rest = self.rest();
        let close = find_ascii_case_insensitive(rest, &format!("</{end_tag}"));
        self.raw_text_end = None;
        match close {
            Some(0) => None,
            Some(offset) => Some(self.emit(TokenKind::Text, self.pos + offset)),
            None => Some(self.emit(TokenKind::Text, self.src.len())),
        }
    }

    fn read_text(&mut self) -> Token<'a> {
        let bytes = self.src.as_bytes();
        let mut end = self.pos + 1;
        while end < bytes.len() {
            if bytes[end] == b'<' && starts_markup(&bytes[end..]) {
                break;
            }
            end += 1;
        }
        self.emit(TokenKind::Text, end)
    }

    fn read_comment(&mut self) -> Token<'a> {
        let end = match self.rest()[4..].find("-->") {
            Some(offset) => self.pos + 4 + offset + 3,
            None => self.src.len(),
        };
        self.emit(TokenKind::Comment, end)
    }

    fn read_doctype(&mut self) -> Token<'a> {
        let end = match self.rest().find('>') {
            Some(offset) => self.pos + offset + 1,
            None => self.src.len(),
        };
        self.emit(TokenKind::Doctype, end)
    }

    fn read_end_tag(&mut self) -> Token<'a> {
        let bytes = self.src.as_bytes();
        let name_start = self.pos + 2;
        let name_end = scan_while(bytes, name_start, is_name_byte);
        let name = SmolStr::new(self.src[name_start..name_end].to_ascii_lowercase());
        let end = match self.src[name_end..].find('>') {
            Some(offset) => name_end + offset + 1,
            None => self.src.len(),
        };
        self.emit(TokenKind::EndTag(name), end)
    }

    fn read_start_tag(&mut self) -> Token<'a> {
        let bytes = self.src.as_bytes();
        let name_start = self.pos + 1;
        let name_end = scan_while(bytes, name_start, is_name_byte);
        let name = SmolStr::new(self.src[name_start..name_end].to_ascii_lowercase());

        let mut attrs = Vec::new();
        let mut self_closing = false;
        let mut i = name_end;
        loop {
            i = scan_while(bytes, i, |b| b.is_ascii_whitespace());
            if i >= bytes.len() {
                break;
            }
            match bytes[i] {
                b'>' => {
                    i += 1;
                    break;
                }
                b'/' => {
                    if bytes.get(i + 1) == Some(&b'>') {
                        self_closing = true;
                        i += 2;
                        break;
                    }
                    i += 1;
                    continue;
                }
                _ => {}
            }

            let attr_start = i;
            let attr_end = scan_while(bytes, i, |b| {
                !(b.is_ascii_whitespace() || b == b'=' || b == b'>' || b == b'/')
            });
            // A stray `=` with no name still has to make progress.
            let attr_end = attr_end.max(attr_start + 1);
            let attr_name = SmolStr::new(self.src[attr_start..attr_end].to_ascii_lowercase());
            i = scan_while(bytes, attr_end, |b| b.is_ascii_whitespace());

            let mut value = None;
            if bytes.get(i) == Some(&b'=') {
                i = scan_while(bytes, i + 1, |b| b.is_ascii_whitespace());
                match bytes.get(i) {
                    Some(&quote) if quote == b'"' || quote == b'\'' => {
                        let value_start = i + 1;
                        let value_end = scan_while(bytes, value_start, |b| b != quote);
                        value = Some(decode_entities(&self.src[value_start..value_end]).into_owned());
                        i = (value_end + 1).min(bytes.len());
                    }
                    Some(_) => {
                        let value_end =
                            scan_while(bytes, i, |b| !(b.is_ascii_whitespace() || b == b'>'));
                        value = Some(decode_entities(&self.src[i..value_end]).into_owned());
                        i = value_end;
                    }
                    None => {}
                }
            }
            attrs.push(Attribute {
                name: attr_name,
                value,
            });
        }

        if !self_closing {
            self.raw_text_end = RAW_TEXT_ELEMENTS
                .iter()
                .copied()
                .find(|element| *element == name.as_str());
        }

        self.emit(
            TokenKind::StartTag(StartTag {
                name,
                attrs,
                self_closing,
            }),
            i,
        )
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(end_tag) = self.raw_text_end {
            if let Some(token) = self.read_raw_text(end_tag) {
                return Some(token);
            }
        }

        let rest = self.rest();
        if rest.is_empty() {
            return None;
        }

        let bytes = rest.as_bytes();
        if bytes[0] != b'<' || !starts_markup(bytes) {
            return Some(self.read_text());
        }
        if rest.starts_with("<!--") {
            return Some(self.read_comment());
        }
        if rest.starts_with("<!") {
            return Some(self.read_doctype());
        }
        if rest.starts_with("</") {
            return Some(self.read_end_tag());
        }
        Some(self.read_start_tag())
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b':' || b == b'_'
}

/// Does `bytes` (starting with `<`) open a tag, end tag, comment or doctype?
fn starts_markup(bytes: &[u8]) -> bool {
    match bytes.get(1) {
        Some(b) if b.is_ascii_alphabetic() || *b == b'!' => true,
        Some(b'/') => bytes.get(2).is_some_and(|b| b.is_ascii_alphabetic()),
        _ => false,
    }
}

fn scan_while(bytes: &[u8], mut i: usize, pred: impl Fn(u8) -> bool) -> usize {
    while i < bytes.len() && pred(bytes[i]) {
        i += 1;
    }
    i
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - needle.len()).find(|&i| hay[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

/// Decode the character references authors actually write.
///
/// Unknown or malformed references are left untouched.
pub fn decode_entities(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_reference(&rest[1..semi]).map(|ch| (ch, semi)));
        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}

/// Plain text of an HTML fragment, block boundaries turned into spaces and
/// whitespace collapsed.
pub fn text_content(html: &str) -> String {
    let mut raw = String::new();
    let mut skip_depth = 0usize;
    for token in Tokenizer::new(html) {
        match &token.kind {
            TokenKind::Text if skip_depth == 0 => raw.push_str(&decode_entities(token.raw)),
            TokenKind::StartTag(tag) => {
                if matches!(tag.name.as_str(), "script" | "style") && !tag.self_closing {
                    skip_depth += 1;
                }
                if tag.name == "br" {
                    raw.push(' ');
                }
            }
            TokenKind::EndTag(name) => match name.as_str() {
                "script" | "style" => skip_depth = skip_depth.saturating_sub(1),
                "p" | "div" | "li" | "pre" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
                | "blockquote" => raw.push(' '),
                _ => {}
            },
            _ => {}
        }
    }
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
