//! In-process rich text surface over a block tree.
//!
//! The document is a list of blocks (paragraph, heading, code block), each
//! optionally a list item, made of text runs. A run carries inline marks and
//! an optional link; line breaks are `'\n'` inside a run. Offsets count chars,
//! with one virtual separator between consecutive blocks:
//!
//! ```text
//! <p>ab</p><h2>cd</h2>   ->   a b | c d
//!                             0 1 2 3 4   (2 is the separator)
//! ```
//!
//! Markup the model cannot hold (images, spans, tables, scripts) is kept as
//! an atom: its source is stored verbatim, occupies one char
//! ([`ATOM_CHAR`]) in offsets and is written back unchanged. Generic
//! containers (`div`, `section`, `article`) are read as paragraphs.
//! Serialization is canonical, so HTML produced here parses back to the same
//! tree.

use std::ops::Range as StdRange;

use kata_renderer::{
    Attribute, StartTag, Token, TokenKind, Tokenizer, apply_safe_link_attrs, decode_entities,
    is_void_element, write_start_tag,
};
use pulldown_cmark_escape::{FmtWriter, StrWrite, escape_html_body_text};
use smol_str::SmolStr;

use crate::actions::Range;
use crate::surface::{BlockFormat, InlineMark, LinkInfo, ListKind, Marks, RichTextSurface};
use crate::types::Selection;

/// Stand-in character for an atom in the document text.
pub const ATOM_CHAR: char = '\u{FFFC}';

/// Unmodelled elements that stand as a block of their own.
const BLOCK_ATOMS: &[&str] = &[
    "address", "aside", "audio", "blockquote", "canvas", "details", "dl", "fieldset", "figure",
    "footer", "form", "header", "hr", "iframe", "math", "nav", "object", "svg", "table", "video",
];

/// Unmodelled elements that stand as a block only between blocks.
const HIDDEN_ATOMS: &[&str] = &["noscript", "script", "style", "template"];

/// Anchor attributes, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Link {
    attrs: Vec<Attribute>,
}

impl Link {
    fn new(url: &str) -> Self {
        let mut attrs = vec![Attribute::new("href", url)];
        apply_safe_link_attrs(&mut attrs);
        Self { attrs }
    }

    fn href(&self) -> &str {
        self.attrs
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case("href"))
            .and_then(|attr| attr.value.as_deref())
            .unwrap_or("")
    }

    /// Set href in place. Returns true if it changed.
    fn set_href(&mut self, url: &str) -> bool {
        match self
            .attrs
            .iter_mut()
            .find(|attr| attr.name.eq_ignore_ascii_case("href"))
        {
            Some(attr) if attr.value.as_deref() == Some(url) => false,
            Some(attr) => {
                attr.value = Some(url.to_string());
                true
            }
            None => {
                self.attrs.insert(0, Attribute::new("href", url));
                true
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Run {
    text: String,
    marks: Marks,
    link: Option<Link>,
    /// Verbatim source of an unmodelled element; `text` is then [`ATOM_CHAR`].
    atom: Option<String>,
}

impl Run {
    fn text(text: impl Into<String>, marks: Marks, link: Option<Link>) -> Self {
        Self {
            text: text.into(),
            marks,
            link,
            atom: None,
        }
    }

    fn atom(raw: &str, marks: Marks, link: Option<Link>) -> Self {
        Self {
            text: ATOM_CHAR.to_string(),
            marks,
            link,
            atom: Some(raw.to_string()),
        }
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    fn can_merge(&self, other: &Run) -> bool {
        self.atom.is_none()
            && other.atom.is_none()
            && self.marks == other.marks
            && self.link == other.link
    }
}

fn char_to_byte(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(byte, _)| byte)
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Block {
    format: BlockFormat,
    list: Option<ListKind>,
    runs: Vec<Run>,
    /// Holds a block-level atom; written without a block wrapper.
    raw: bool,
}

impl Block {
    fn new(format: BlockFormat, list: Option<ListKind>) -> Self {
        Self {
            format,
            list,
            runs: Vec::new(),
            raw: false,
        }
    }

    fn len(&self) -> usize {
        self.runs.iter().map(Run::len).sum()
    }

    fn is_empty(&self) -> bool {
        self.runs.iter().all(|run| run.text.is_empty())
    }

    fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    /// Ensure a run boundary at `at`; returns the index of the first run
    /// starting there.
    fn split_at(&mut self, at: usize) -> usize {
        let mut pos = 0;
        for index in 0..self.runs.len() {
            if at == pos {
                return index;
            }
            let len = self.runs[index].len();
            if at < pos + len {
                let byte = char_to_byte(&self.runs[index].text, at - pos);
                let tail = self.runs[index].text.split_off(byte);
                let mut rest = self.runs[index].clone();
                rest.text = tail;
                self.runs.insert(index + 1, rest);
                return index + 1;
            }
            pos += len;
        }
        self.runs.len()
    }

    fn split_off(&mut self, at: usize) -> Vec<Run> {
        let index = self.split_at(at);
        self.runs.split_off(index)
    }

    fn remove_chars(&mut self, start: usize, end: usize) {
        let first = self.split_at(start);
        let last = self.split_at(end);
        self.runs.drain(first..last);
    }

    fn insert_run(&mut self, at: usize, run: Run) {
        let index = self.split_at(at);
        self.runs.insert(index, run);
    }

    /// Drop empty runs and merge neighbours with identical style.
    fn normalize(&mut self) {
        let mut merged: Vec<Run> = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            if run.text.is_empty() {
                continue;
            }
            match merged.last_mut() {
                Some(last) if last.can_merge(&run) => last.text.push_str(&run.text),
                _ => merged.push(run),
            }
        }
        self.runs = merged;
    }

    /// Run covering char `index`, with its start offset.
    fn run_at(&self, index: usize) -> Option<(usize, usize)> {
        let mut pos = 0;
        for (run_index, run) in self.runs.iter().enumerate() {
            let len = run.len();
            if index < pos + len {
                return Some((run_index, pos));
            }
            pos += len;
        }
        None
    }

    fn run_spans(&self) -> Vec<StdRange<usize>> {
        let mut pos = 0;
        self.runs
            .iter()
            .map(|run| {
                let span = pos..pos + run.len();
                pos = span.end;
                span
            })
            .collect()
    }
}

/// A [`RichTextSurface`] backed by an in-memory block tree.
#[derive(Debug, Clone)]
pub struct BlockSurface {
    blocks: Vec<Block>,
    selection: Selection,
    pending: Option<Marks>,
}

impl Default for BlockSurface {
    fn default() -> Self {
        Self {
            blocks: vec![Block::default()],
            selection: Selection::default(),
            pending: None,
        }
    }
}

impl BlockSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_html(html: &str) -> Self {
        let mut surface = Self::default();
        surface.load_html(html);
        surface
    }

    /// Document text with `'\n'` between blocks.
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn block_start(&self, index: usize) -> usize {
        self.blocks[..index]
            .iter()
            .map(|block| block.len() + 1)
            .sum()
    }

    /// Block index and in-block offset for a document offset. Clamps to the end.
    fn locate(&self, offset: usize) -> (usize, usize) {
        let mut start = 0;
        for (index, block) in self.blocks.iter().enumerate() {
            let len = block.len();
            if offset <= start + len {
                return (index, offset - start);
            }
            start += len + 1;
        }
        let last = self.blocks.len() - 1;
        (last, self.blocks[last].len())
    }

    fn touched_blocks(&self, range: Range) -> StdRange<usize> {
        let range = range.normalize();
        let (first, _) = self.locate(range.start);
        let (last, _) = self.locate(range.end);
        first..last + 1
    }

    /// Split runs at the range boundaries; returns the run span covered in
    /// each touched block.
    fn split_range(&mut self, start: usize, end: usize) -> Vec<(usize, StdRange<usize>)> {
        let (first_block, first_offset) = self.locate(start);
        let (last_block, last_offset) = self.locate(end);
        let mut spans = Vec::new();
        for index in first_block..=last_block {
            let block = &mut self.blocks[index];
            let from = if index == first_block { first_offset } else { 0 };
            let to = if index == last_block {
                last_offset
            } else {
                block.len()
            };
            let first_run = block.split_at(from);
            let end_run = block.split_at(to);
            spans.push((index, first_run..end_run));
        }
        spans
    }

    fn normalize_blocks(&mut self, blocks: StdRange<usize>) {
        for block in &mut self.blocks[blocks] {
            block.normalize();
        }
    }

    fn delete_range(&mut self, start: usize, end: usize) -> bool {
        if start >= end {
            return false;
        }
        let (first, first_offset) = self.locate(start);
        let (last, last_offset) = self.locate(end);
        if first == last {
            self.blocks[first].remove_chars(first_offset, last_offset);
        } else {
            let tail = self.blocks[last].split_off(last_offset);
            let head = &mut self.blocks[first];
            head.split_off(first_offset);
            head.runs.extend(tail);
            self.blocks.drain(first + 1..=last);
        }
        self.blocks[first].normalize();
        true
    }

    /// Marks and link new text at `offset` inherits.
    ///
    /// Plain marks follow the character before the caret. Variable spans and
    /// links are only extended when the caret sits strictly inside them.
    fn style_at(&self, offset: usize) -> (Marks, Option<Link>) {
        let (index, at) = self.locate(offset);
        let block = &self.blocks[index];
        let before = at
            .checked_sub(1)
            .and_then(|prev| block.run_at(prev))
            .map(|(run, _)| &block.runs[run]);
        let after = block.run_at(at).map(|(run, _)| &block.runs[run]);

        let mut marks = before.or(after).map_or(Marks::NONE, |run| run.marks);
        marks.variable = matches!((before, after), (Some(a), Some(b)) if a.marks.variable && b.marks.variable);
        let link = match (before, after) {
            (Some(a), Some(b)) if a.link.is_some() && a.link == b.link => a.link.clone(),
            _ => None,
        };
        (marks, link)
    }

    fn insert_at(&mut self, offset: usize, text: &str, marks: Marks, link: Option<Link>) -> usize {
        let (index, at) = self.locate(offset);
        let block = &mut self.blocks[index];
        block.insert_run(at, Run::text(text, marks, link));
        block.normalize();
        offset + text.chars().count()
    }

    fn delete_selection(&mut self) -> usize {
        let selection = self.selection;
        self.delete_range(selection.start(), selection.end());
        selection.start()
    }

    fn text_between(&self, start: usize, end: usize) -> String {
        self.text()
            .chars()
            .skip(start)
            .take(end.saturating_sub(start))
            .collect()
    }

    fn write_html<W: StrWrite>(&self, mut writer: W) -> Result<(), W::Error> {
        let mut open_list: Option<ListKind> = None;
        for block in &self.blocks {
            if block.list != open_list {
                if let Some(kind) = open_list {
                    writer.write_str("</")?;
                    writer.write_str(kind.tag())?;
                    writer.write_str(">")?;
                }
                if let Some(kind) = block.list {
                    writer.write_str("<")?;
                    writer.write_str(kind.tag())?;
                    writer.write_str(">")?;
                }
                open_list = block.list;
            }

            let listed = block.list.is_some();
            if block.raw {
                if listed {
                    writer.write_str("<li>")?;
                }
                write_raw_block(&mut writer, &block.runs)?;
                if listed {
                    writer.write_str("</li>")?;
                }
                continue;
            }
            let wrap = !(listed && block.format == BlockFormat::Paragraph);
            if listed {
                writer.write_str("<li>")?;
            }
            if wrap {
                match block.format {
                    BlockFormat::CodeBlock => writer.write_str("<pre><code>")?,
                    format => {
                        writer.write_str("<")?;
                        writer.write_str(format.tag())?;
                        writer.write_str(">")?;
                    }
                }
            }

            write_runs(&mut writer, &block.runs, block.format == BlockFormat::CodeBlock)?;

            if wrap {
                match block.format {
                    BlockFormat::CodeBlock => writer.write_str("</code></pre>")?,
                    format => {
                        writer.write_str("</")?;
                        writer.write_str(format.tag())?;
                        writer.write_str(">")?;
                    }
                }
            }
            if listed {
                writer.write_str("</li>")?;
            }
        }
        if let Some(kind) = open_list {
            writer.write_str("</")?;
            writer.write_str(kind.tag())?;
            writer.write_str(">")?;
        }
        Ok(())
    }
}

const MARK_TAGS: [(InlineMark, &str); 4] = [
    (InlineMark::Bold, "b"),
    (InlineMark::Italic, "i"),
    (InlineMark::Underline, "u"),
    (InlineMark::Variable, "code"),
];

fn write_runs<W: StrWrite>(mut writer: W, runs: &[Run], code_block: bool) -> Result<(), W::Error> {
    let mut index = 0;
    while index < runs.len() {
        let link = &runs[index].link;
        let end = runs[index..]
            .iter()
            .position(|run| run.link != *link)
            .map_or(runs.len(), |offset| index + offset);

        if let Some(link) = link {
            write_start_tag(&mut writer, "a", &link.attrs, false)?;
        }
        for run in &runs[index..end] {
            write_run(&mut writer, run, code_block)?;
        }
        if link.is_some() {
            writer.write_str("</a>")?;
        }
        index = end;
    }
    Ok(())
}

/// Atoms as-is; text typed next to them goes into its own paragraph.
fn write_raw_block<W: StrWrite>(mut writer: W, runs: &[Run]) -> Result<(), W::Error> {
    let mut index = 0;
    while index < runs.len() {
        let atom = runs[index].atom.is_some();
        let end = runs[index..]
            .iter()
            .position(|run| run.atom.is_some() != atom)
            .map_or(runs.len(), |offset| index + offset);
        if atom {
            write_runs(&mut writer, &runs[index..end], false)?;
        } else {
            writer.write_str("<p>")?;
            write_runs(&mut writer, &runs[index..end], false)?;
            writer.write_str("</p>")?;
        }
        index = end;
    }
    Ok(())
}

fn write_run<W: StrWrite>(mut writer: W, run: &Run, code_block: bool) -> Result<(), W::Error> {
    let tags: Vec<&str> = MARK_TAGS
        .iter()
        .filter(|(mark, _)| run.marks.has(*mark))
        .filter(|(mark, _)| !(code_block && *mark == InlineMark::Variable))
        .map(|(_, tag)| *tag)
        .collect();

    for tag in &tags {
        writer.write_str("<")?;
        writer.write_str(tag)?;
        writer.write_str(">")?;
    }
    if let Some(raw) = &run.atom {
        writer.write_str(raw)?;
    } else if code_block {
        escape_html_body_text(&mut writer, &run.text)?;
    } else {
        for (index, line) in run.text.split('\n').enumerate() {
            if index > 0 {
                writer.write_str("<br>")?;
            }
            escape_html_body_text(&mut writer, line)?;
        }
    }
    for tag in tags.iter().rev() {
        writer.write_str("</")?;
        writer.write_str(tag)?;
        writer.write_str(">")?;
    }
    Ok(())
}

/// An open inline element while parsing.
struct InlineFrame {
    name: SmolStr,
    mark: Option<InlineMark>,
    link: Option<Link>,
}

/// Source of an unmodelled element, collected up to its matching end tag.
struct Capture {
    name: SmolStr,
    depth: usize,
    raw: String,
    block: bool,
}

#[derive(Default)]
struct Parser {
    blocks: Vec<Block>,
    current: Option<Block>,
    /// Set while `current` was opened by `<li>` and has no content yet.
    fresh_item: bool,
    inline: Vec<InlineFrame>,
    lists: Vec<ListKind>,
    in_item: bool,
    capture: Option<Capture>,
    /// The current block's text so far ends in a collapsed space.
    last_space: bool,
}

impl Parser {
    fn parse(html: &str) -> Vec<Block> {
        let mut parser = Parser::default();
        for token in Tokenizer::new(html) {
            if parser.capture.is_some() {
                parser.capture_token(&token);
                continue;
            }
            match token.kind {
                TokenKind::StartTag(tag) => parser.start_tag(tag, token.raw),
                TokenKind::EndTag(name) => parser.end_tag(&name),
                TokenKind::Text => parser.text(&decode_entities(token.raw)),
                TokenKind::Comment if parser.current.is_some() => parser.atom(token.raw, false),
                _ => {}
            }
        }
        // Unterminated element: keep what was read.
        if let Some(capture) = parser.capture.take() {
            parser.atom(&capture.raw, capture.block);
        }
        parser.flush();
        if parser.blocks.is_empty() {
            parser.blocks.push(Block::default());
        }
        parser.blocks
    }

    fn item_list(&self) -> Option<ListKind> {
        self.in_item
            .then(|| self.lists.last().copied().unwrap_or(ListKind::Bulleted))
    }

    fn in_code_block(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|block| block.format == BlockFormat::CodeBlock)
    }

    fn current_block(&mut self) -> &mut Block {
        let list = self.item_list();
        self.current
            .get_or_insert_with(|| Block::new(BlockFormat::Paragraph, list))
    }

    fn inline_style(&self) -> (Marks, Option<Link>) {
        let mut marks = Marks::NONE;
        for frame in &self.inline {
            if let Some(mark) = frame.mark {
                marks.set(mark, true);
            }
        }
        let link = self.inline.iter().rev().find_map(|frame| frame.link.clone());
        (marks, link)
    }

    fn flush(&mut self) {
        if let Some(mut block) = self.current.take() {
            block.normalize();
            self.blocks.push(block);
        }
        self.fresh_item = false;
        self.last_space = false;
    }

    fn open_block(&mut self, format: BlockFormat) {
        if self.fresh_item {
            if let Some(block) = self.current.as_mut() {
                block.format = format;
                self.fresh_item = false;
                return;
            }
        }
        self.flush();
        self.current = Some(Block::new(format, self.item_list()));
    }

    fn is_block_atom(&self, name: &str) -> bool {
        BLOCK_ATOMS.contains(&name) || (self.current.is_none() && HIDDEN_ATOMS.contains(&name))
    }

    fn start_tag(&mut self, tag: StartTag, raw: &str) {
        let tag_name = tag.name.clone();
        let name = tag_name.as_str();
        match name {
            "p" | "div" | "section" | "article" => self.open_block(BlockFormat::Paragraph),
            "h1" => self.open_block(BlockFormat::Heading1),
            "h2" => self.open_block(BlockFormat::Heading2),
            "h3" | "h4" | "h5" | "h6" => self.open_block(BlockFormat::Heading3),
            "pre" => self.open_block(BlockFormat::CodeBlock),
            "ul" | "ol" => {
                self.flush();
                self.lists.push(if name == "ol" {
                    ListKind::Numbered
                } else {
                    ListKind::Bulleted
                });
            }
            "li" => {
                self.flush();
                self.in_item = true;
                self.current = Some(Block::new(BlockFormat::Paragraph, self.item_list()));
                self.fresh_item = true;
            }
            "br" => self.push_text("\n"),
            _ if tag.self_closing || is_void_element(name) => {
                let block = self.is_block_atom(name);
                self.atom(raw, block);
            }
            "b" | "strong" | "i" | "em" | "u" | "code" | "var" | "a" => {
                let mark = match name {
                    "b" | "strong" => Some(InlineMark::Bold),
                    "i" | "em" => Some(InlineMark::Italic),
                    "u" => Some(InlineMark::Underline),
                    "code" | "var" if !self.in_code_block() => Some(InlineMark::Variable),
                    _ => None,
                };
                let link = (name == "a").then(|| Link { attrs: tag.attrs });
                self.inline.push(InlineFrame {
                    name: tag.name,
                    mark,
                    link,
                });
            }
            _ => {
                let block = self.is_block_atom(name);
                self.capture = Some(Capture {
                    name: tag.name,
                    depth: 1,
                    raw: raw.to_string(),
                    block,
                });
            }
        }
    }

    fn capture_token(&mut self, token: &Token<'_>) {
        let Some(capture) = self.capture.as_mut() else {
            return;
        };
        capture.raw.push_str(token.raw);
        match &token.kind {
            TokenKind::StartTag(tag) if tag.name == capture.name && !tag.self_closing => {
                capture.depth += 1
            }
            TokenKind::EndTag(name) if *name == capture.name => capture.depth -= 1,
            _ => {}
        }
        if capture.depth == 0 {
            if let Some(capture) = self.capture.take() {
                self.atom(&capture.raw, capture.block);
            }
        }
    }

    /// Keep `raw` verbatim, as a block of its own or inline in the current one.
    fn atom(&mut self, raw: &str, block: bool) {
        if block && !self.fresh_item {
            self.flush();
            let mut atom_block = Block::new(BlockFormat::Paragraph, self.item_list());
            atom_block.raw = true;
            atom_block.runs.push(Run::atom(raw, Marks::NONE, None));
            self.blocks.push(atom_block);
            return;
        }
        let (marks, link) = self.inline_style();
        self.fresh_item = false;
        self.last_space = false;
        self.current_block().runs.push(Run::atom(raw, marks, link));
    }

    fn end_tag(&mut self, name: &str) {
        match name {
            "p" | "div" | "section" | "article" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
            | "pre" => self.flush(),
            "li" => {
                self.flush();
                self.in_item = false;
            }
            "ul" | "ol" => {
                self.flush();
                self.lists.pop();
            }
            _ => {
                if let Some(index) = self.inline.iter().rposition(|frame| frame.name == name) {
                    self.inline.truncate(index);
                }
            }
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_code_block() {
            self.push_text(text);
            return;
        }
        // Whitespace-only text spanning lines is source formatting.
        if text.trim().is_empty() && (text.contains('\n') || self.current.is_none()) {
            return;
        }
        // Collapse runs of whitespace, also across element boundaries.
        let mut collapsed = String::with_capacity(text.len());
        let mut last_space = self.last_space;
        for ch in text.chars() {
            if ch.is_ascii_whitespace() {
                if !last_space {
                    collapsed.push(' ');
                }
                last_space = true;
            } else {
                collapsed.push(ch);
                last_space = false;
            }
        }
        if !collapsed.is_empty() {
            self.push_text(&collapsed);
        }
    }

    fn push_text(&mut self, text: &str) {
        let (marks, link) = self.inline_style();
        self.fresh_item = false;
        self.last_space = text.ends_with(' ');
        self.current_block().runs.push(Run::text(text, marks, link));
    }
}

impl RichTextSurface for BlockSurface {
    fn load_html(&mut self, html: &str) {
        self.blocks = Parser::parse(html);
        self.selection = Selection::collapsed(self.text_len());
        self.pending = None;
        tracing::trace!(blocks = self.blocks.len(), "surface loaded");
    }

    fn to_html(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_html(FmtWriter(&mut out));
        out
    }

    fn text_len(&self) -> usize {
        self.blocks.iter().map(Block::len).sum::<usize>() + self.blocks.len() - 1
    }

    fn selection(&self) -> Selection {
        self.selection
    }

    fn set_selection(&mut self, selection: Selection) {
        self.selection = selection.clamp(self.text_len());
        self.pending = None;
    }

    fn selected_text(&self) -> String {
        self.text_between(self.selection.start(), self.selection.end())
    }

    fn pending_marks(&self) -> Option<Marks> {
        self.pending
    }

    fn clear_pending_marks(&mut self) {
        self.pending = None;
    }

    fn apply_inline_format(&mut self, mark: InlineMark) -> bool {
        let selection = self.selection;
        if selection.is_collapsed() {
            let base = self
                .pending
                .unwrap_or_else(|| self.style_at(selection.head).0);
            self.pending = Some(base.with(mark, !base.has(mark)));
            return false;
        }

        let spans = self.split_range(selection.start(), selection.end());
        let all_marked = spans.iter().all(|(block, runs)| {
            self.blocks[*block].runs[runs.clone()]
                .iter()
                .all(|run| run.marks.has(mark))
        });
        let mut changed = false;
        for (block, runs) in &spans {
            for run in &mut self.blocks[*block].runs[runs.clone()] {
                if run.marks.has(mark) == all_marked {
                    run.marks.set(mark, !all_marked);
                    changed = true;
                }
            }
        }
        self.normalize_blocks(self.touched_blocks(selection.to_range()));
        changed
    }

    fn apply_block_format(&mut self, format: BlockFormat) -> bool {
        let touched = self.touched_blocks(self.selection.to_range());
        let target = if self.blocks[touched.clone()]
            .iter()
            .all(|block| block.format == format)
        {
            BlockFormat::Paragraph
        } else {
            format
        };
        let mut changed = false;
        for block in &mut self.blocks[touched] {
            if block.format != target {
                block.format = target;
                changed = true;
            }
        }
        changed
    }

    fn toggle_list(&mut self, kind: ListKind) -> bool {
        let touched = self.touched_blocks(self.selection.to_range());
        let target = if self.blocks[touched.clone()]
            .iter()
            .all(|block| block.list == Some(kind))
        {
            None
        } else {
            Some(kind)
        };
        let mut changed = false;
        for block in &mut self.blocks[touched] {
            if block.list != target {
                block.list = target;
                changed = true;
            }
        }
        changed
    }

    fn insert_inline_token(&mut self, mark: InlineMark, placeholder: &str) -> bool {
        self.pending = None;
        let selection = self.selection;
        if !selection.is_collapsed() {
            let spans = self.split_range(selection.start(), selection.end());
            let mut changed = false;
            for (block, runs) in &spans {
                for run in &mut self.blocks[*block].runs[runs.clone()] {
                    if !run.marks.has(mark) {
                        run.marks.set(mark, true);
                        changed = true;
                    }
                }
            }
            self.normalize_blocks(self.touched_blocks(selection.to_range()));
            self.selection = Selection::collapsed(selection.end());
            return changed;
        }

        if placeholder.is_empty() {
            return false;
        }
        let (marks, link) = self.style_at(selection.head);
        let caret = self.insert_at(selection.head, placeholder, marks.with(mark, true), link);
        self.selection = Selection::collapsed(caret);
        true
    }

    fn insert_text(&mut self, text: &str) -> bool {
        let pending = self.pending.take();
        if text.is_empty() && self.selection.is_collapsed() {
            return false;
        }
        let offset = self.delete_selection();
        let (inherited, link) = self.style_at(offset);
        let caret = self.insert_at(offset, text, pending.unwrap_or(inherited), link);
        self.selection = Selection::collapsed(caret);
        true
    }

    fn insert_paragraph(&mut self) -> bool {
        self.pending = None;
        let offset = self.delete_selection();
        let (index, at) = self.locate(offset);
        let block = &mut self.blocks[index];

        if block.list.is_some() && block.is_empty() {
            block.list = None;
            self.selection = Selection::collapsed(offset);
            return true;
        }

        let list = block.list;
        if at == 0 && !block.is_empty() {
            self.blocks
                .insert(index, Block::new(BlockFormat::Paragraph, list));
        } else {
            let mut next = Block::new(BlockFormat::Paragraph, list);
            next.runs = block.split_off(at);
            block.normalize();
            next.normalize();
            self.blocks.insert(index + 1, next);
        }
        self.selection = Selection::collapsed(offset + 1);
        true
    }

    fn insert_line_break(&mut self) -> bool {
        self.insert_text("\n")
    }

    fn delete_backward(&mut self) -> bool {
        self.pending = None;
        let selection = self.selection;
        if !selection.is_collapsed() {
            let offset = self.delete_selection();
            self.selection = Selection::collapsed(offset);
            return true;
        }

        let offset = selection.head;
        let (index, at) = self.locate(offset);
        if at == 0 {
            let block = &mut self.blocks[index];
            if block.list.is_some() {
                block.list = None;
                return true;
            }
            if index == 0 {
                if block.format != BlockFormat::Paragraph {
                    block.format = BlockFormat::Paragraph;
                    return true;
                }
                return false;
            }
        }
        self.delete_range(offset - 1, offset);
        self.selection = Selection::collapsed(offset - 1);
        true
    }

    fn delete_forward(&mut self) -> bool {
        self.pending = None;
        let selection = self.selection;
        if !selection.is_collapsed() {
            let offset = self.delete_selection();
            self.selection = Selection::collapsed(offset);
            return true;
        }
        let offset = selection.head;
        if offset >= self.text_len() {
            return false;
        }
        self.delete_range(offset, offset + 1)
    }

    fn anchor_at(&self, range: Range) -> Option<LinkInfo> {
        let range = range.normalize();
        let (index, start) = self.locate(range.start);
        let (end_index, end) = self.locate(range.end);
        if end_index != index {
            return None;
        }
        let block = &self.blocks[index];
        let spans = block.run_spans();

        // Prefer the run after the caret, then the one before it.
        let hit = block
            .run_at(start)
            .filter(|(run, _)| block.runs[*run].link.is_some())
            .or_else(|| {
                start
                    .checked_sub(1)
                    .and_then(|prev| block.run_at(prev))
                    .filter(|(run, _)| block.runs[*run].link.is_some())
            })?;
        let (run, _) = hit;
        let link = block.runs[run].link.as_ref()?;

        let mut first = run;
        while first > 0 && block.runs[first - 1].link.as_ref() == Some(link) {
            first -= 1;
        }
        let mut last = run;
        while last + 1 < block.runs.len() && block.runs[last + 1].link.as_ref() == Some(link) {
            last += 1;
        }
        let local = spans[first].start..spans[last].end;
        if start < local.start || end > local.end {
            return None;
        }

        let base = self.block_start(index);
        Some(LinkInfo {
            range: Range::new(base + local.start, base + local.end),
            href: link.href().to_string(),
            text: block.runs[first..=last]
                .iter()
                .map(|run| run.text.as_str())
                .collect(),
        })
    }

    fn insert_or_update_link(&mut self, range: Range, text: &str, url: &str) -> bool {
        self.pending = None;
        let range = range.normalize();

        if let Some(existing) = self.anchor_at(range) {
            let (index, _) = self.locate(existing.range.start);
            let base = self.block_start(index);
            let block = &mut self.blocks[index];
            let first = block.split_at(existing.range.start - base);
            let end = block.split_at(existing.range.end - base);

            let mut changed = false;
            let caret = if text != existing.text {
                let marks = block.runs[first].marks;
                let mut link = block.runs[first]
                    .link
                    .clone()
                    .unwrap_or_else(|| Link::new(url));
                link.set_href(url);
                apply_safe_link_attrs(&mut link.attrs);
                block.runs.splice(
                    first..end,
                    [Run::text(text, marks, Some(link))],
                );
                changed = true;
                existing.range.start + text.chars().count()
            } else {
                for run in &mut block.runs[first..end] {
                    if let Some(link) = run.link.as_mut() {
                        changed |= link.set_href(url);
                        changed |= apply_safe_link_attrs(&mut link.attrs);
                    }
                }
                existing.range.end
            };
            block.normalize();
            self.selection = Selection::collapsed(caret);
            return changed;
        }

        let (first_block, _) = self.locate(range.start);
        let (last_block, _) = self.locate(range.end);
        let caret = if !range.is_caret()
            && first_block == last_block
            && self.text_between(range.start, range.end) == text
        {
            // Wrap the selected runs, keeping their marks.
            for (block, runs) in self.split_range(range.start, range.end) {
                for run in &mut self.blocks[block].runs[runs] {
                    run.link = Some(Link::new(url));
                }
            }
            self.blocks[first_block].normalize();
            range.end
        } else {
            self.delete_range(range.start, range.end);
            let (marks, _) = self.style_at(range.start);
            self.insert_at(
                range.start,
                text,
                marks.with(InlineMark::Variable, false),
                Some(Link::new(url)),
            )
        };
        self.selection = Selection::collapsed(caret);
        true
    }

    fn remove_link(&mut self, range: Range) -> bool {
        self.pending = None;
        let range = range.normalize();
        let target = match self.anchor_at(range) {
            Some(existing) => existing.range,
            None if !range.is_caret() => range,
            None => return false,
        };
        let mut changed = false;
        for (block, runs) in self.split_range(target.start, target.end) {
            for run in &mut self.blocks[block].runs[runs] {
                if run.link.take().is_some() {
                    changed = true;
                }
            }
        }
        self.normalize_blocks(self.touched_blocks(target));
        changed
    }
}
