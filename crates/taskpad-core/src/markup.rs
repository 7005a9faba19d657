//! Inline rich text stored in `Block::content`.
//!
//! Content is a flat HTML fragment limited to `b`/`strong`, `i`/`em`, `u`,
//! `a href`, highlight spans (`background-color`) and `br`. Parsing is
//! lenient: unknown tags are dropped but their text is kept.

use std::ops::Range;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub link: Option<String>,
    pub highlight: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: InlineStyle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InlineMark {
    Bold,
    Italic,
    Underline,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineText {
    spans: Vec<Span>,
}

impl InlineText {
    pub fn parse(markup: &str) -> Self {
        let mut parser = Parser::default();
        let mut cursor = 0;
        while cursor < markup.len() {
            let rest = &markup[cursor..];
            if rest.starts_with('<') {
                if let Some(end) = rest.find('>') {
                    parser.tag(&rest[1..end]);
                    cursor += end + 1;
                    continue;
                }
            }
            let next = rest
                .char_indices()
                .skip(1)
                .find(|&(_, ch)| ch == '<')
                .map(|(ix, _)| ix)
                .unwrap_or(rest.len());
            parser.text(&decode_entities(&rest[..next]));
            cursor += next;
        }
        let mut text = Self { spans: parser.spans };
        text.normalize();
        text
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }

    pub fn char_len(&self) -> usize {
        self.spans.iter().map(|span| span.text.chars().count()).sum()
    }

    pub fn to_markup(&self) -> String {
        let mut output = String::new();
        for span in &self.spans {
            write_span(&mut output, span);
        }
        output
    }

    /// Style of the character at `offset` (or the last one before it when
    /// `offset` is at the end).
    pub fn style_at(&self, offset: usize) -> Option<&InlineStyle> {
        let mut start = 0;
        let mut last = None;
        for span in &self.spans {
            let len = span.text.chars().count();
            if offset < start + len {
                return Some(&span.style);
            }
            start += len;
            last = Some(&span.style);
        }
        if offset == start {
            last
        } else {
            None
        }
    }

    pub fn link_at(&self, offset: usize) -> Option<&str> {
        self.style_at(offset)
            .and_then(|style| style.link.as_deref())
    }

    pub fn mark_covers(&self, range: Range<usize>, mark: InlineMark) -> bool {
        if range.is_empty() {
            return self
                .style_at(range.start.saturating_sub(1))
                .is_some_and(|style| mark_value(style, mark));
        }
        let mut start = 0;
        let mut covered = true;
        for span in &self.spans {
            let len = span.text.chars().count();
            let end = start + len;
            if end > range.start && start < range.end {
                covered &= mark_value(&span.style, mark);
            }
            start = end;
        }
        covered
    }

    /// Toggles a mark the way `execCommand` does: if the whole range already
    /// carries it, it is removed, otherwise it is applied to all of it.
    pub fn toggle_mark(&mut self, range: Range<usize>, mark: InlineMark) -> bool {
        if range.is_empty() {
            return false;
        }
        let value = !self.mark_covers(range.clone(), mark);
        self.restyle(range, |style| set_mark(style, mark, value))
    }

    pub fn set_link(&mut self, range: Range<usize>, href: Option<&str>) -> bool {
        let href = href.map(str::to_string);
        self.restyle(range, |style| style.link = href.clone())
    }

    pub fn set_highlight(&mut self, range: Range<usize>, color: Option<&str>) -> bool {
        let color = color.map(str::to_string);
        self.restyle(range, |style| style.highlight = color.clone())
    }

    fn restyle(&mut self, range: Range<usize>, apply: impl Fn(&mut InlineStyle)) -> bool {
        let range = range.start.min(self.char_len())..range.end.min(self.char_len());
        if range.is_empty() {
            return false;
        }
        self.split_at(range.start);
        self.split_at(range.end);
        let mut start = 0;
        let mut changed = false;
        for span in &mut self.spans {
            let len = span.text.chars().count();
            if start >= range.start && start + len <= range.end {
                let before = span.style.clone();
                apply(&mut span.style);
                changed |= before != span.style;
            }
            start += len;
        }
        self.normalize();
        changed
    }

    fn split_at(&mut self, offset: usize) {
        let mut start = 0;
        for ix in 0..self.spans.len() {
            let len = self.spans[ix].text.chars().count();
            if offset > start && offset < start + len {
                let byte_ix = self.spans[ix]
                    .text
                    .char_indices()
                    .nth(offset - start)
                    .map(|(byte_ix, _)| byte_ix)
                    .unwrap_or(self.spans[ix].text.len());
                let tail = self.spans[ix].text.split_off(byte_ix);
                let style = self.spans[ix].style.clone();
                self.spans.insert(ix + 1, Span { text: tail, style });
                return;
            }
            start += len;
        }
    }

    fn normalize(&mut self) {
        let mut merged: Vec<Span> = Vec::with_capacity(self.spans.len());
        for span in self.spans.drain(..) {
            if span.text.is_empty() {
                continue;
            }
            match merged.last_mut() {
                Some(last) if last.style == span.style => last.text.push_str(&span.text),
                _ => merged.push(span),
            }
        }
        self.spans = merged;
    }
}

/// Text content of a markup fragment with tags removed and entities decoded.
pub fn plain_text(markup: &str) -> String {
    InlineText::parse(markup).plain_text()
}

/// True when the visible text ends with `trigger`. Trailing line breaks,
/// which editable surfaces like to append, are not visible text.
pub fn ends_with_trigger(markup: &str, trigger: char) -> bool {
    plain_text(markup).trim_end_matches('\n').ends_with(trigger)
}

pub fn is_visibly_empty(markup: &str) -> bool {
    plain_text(markup).chars().all(|ch| ch == '\n')
}

fn mark_value(style: &InlineStyle, mark: InlineMark) -> bool {
    match mark {
        InlineMark::Bold => style.bold,
        InlineMark::Italic => style.italic,
        InlineMark::Underline => style.underline,
    }
}

fn set_mark(style: &mut InlineStyle, mark: InlineMark, value: bool) {
    match mark {
        InlineMark::Bold => style.bold = value,
        InlineMark::Italic => style.italic = value,
        InlineMark::Underline => style.underline = value,
    }
}

#[derive(Default)]
struct Parser {
    stack: Vec<(String, InlineStyle)>,
    spans: Vec<Span>,
}

impl Parser {
    fn current(&self) -> InlineStyle {
        self.stack
            .last()
            .map(|(_, style)| style.clone())
            .unwrap_or_default()
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.spans.push(Span {
            text: text.to_string(),
            style: self.current(),
        });
    }

    fn tag(&mut self, raw: &str) {
        let raw = raw.trim();
        if let Some(name) = raw.strip_prefix('/') {
            let name = name.trim().to_ascii_lowercase();
            if let Some(pos) = self.stack.iter().rposition(|(open, _)| *open == name) {
                self.stack.truncate(pos);
            }
            return;
        }
        let self_closing = raw.ends_with('/');
        let raw = raw.trim_end_matches('/');
        let (name, attrs) = match raw.find(char::is_whitespace) {
            Some(ix) => (&raw[..ix], &raw[ix..]),
            None => (raw, ""),
        };
        let name = name.to_ascii_lowercase();
        if name == "br" {
            self.text("\n");
            return;
        }
        if self_closing || name.starts_with('!') {
            return;
        }
        let mut style = self.current();
        match name.as_str() {
            "b" | "strong" => style.bold = true,
            "i" | "em" => style.italic = true,
            "u" => style.underline = true,
            "a" => {
                if let Some(href) = attribute(attrs, "href") {
                    style.link = Some(href);
                }
            }
            "span" | "font" => {
                if let Some(color) = attribute(attrs, "style")
                    .and_then(|css| css_property(&css, "background-color"))
                {
                    style.highlight = highlight_value(&color);
                }
            }
            _ => {}
        }
        self.stack.push((name, style));
    }
}

fn highlight_value(color: &str) -> Option<String> {
    let color = color.trim();
    let lowered = color.to_ascii_lowercase();
    if lowered.is_empty() || lowered == "transparent" || lowered == "initial" {
        None
    } else {
        Some(color.to_string())
    }
}

fn attribute(attrs: &str, name: &str) -> Option<String> {
    let lowered = attrs.to_ascii_lowercase();
    let mut search = 0;
    while let Some(rel) = lowered[search..].find(name) {
        let start = search + rel;
        let boundary_ok = start == 0
            || lowered[..start]
                .chars()
                .last()
                .is_some_and(char::is_whitespace);
        let rest = attrs[start + name.len()..].trim_start();
        if boundary_ok {
            if let Some(value) = rest.strip_prefix('=') {
                let value = value.trim_start();
                let parsed = match value.chars().next() {
                    Some(quote @ ('"' | '\'')) => value[1..]
                        .find(quote)
                        .map(|end| value[1..1 + end].to_string()),
                    Some(_) => Some(
                        value
                            .split(char::is_whitespace)
                            .next()
                            .unwrap_or_default()
                            .to_string(),
                    ),
                    None => None,
                };
                return parsed.map(|value| decode_entities(&value));
            }
        }
        search = start + name.len();
    }
    None
}

fn css_property(css: &str, property: &str) -> Option<String> {
    css.split(';').find_map(|decl| {
        let (key, value) = decl.split_once(':')?;
        if key.trim().eq_ignore_ascii_case(property) {
            Some(value.trim().to_string())
        } else {
            None
        }
    })
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut output = String::with_capacity(text.len());
    let mut cursor = 0;
    while let Some(rel) = text[cursor..].find('&') {
        let start = cursor + rel;
        output.push_str(&text[cursor..start]);
        let rest = &text[start..];
        let decoded = rest.find(';').and_then(|end| {
            let ch = match &rest[1..end] {
                "amp" => '&',
                "lt" => '<',
                "gt" => '>',
                "quot" => '"',
                "#39" | "apos" => '\'',
                "nbsp" => '\u{a0}',
                _ => return None,
            };
            Some((ch, end + 1))
        });
        match decoded {
            Some((ch, consumed)) => {
                output.push(ch);
                cursor = start + consumed;
            }
            None => {
                output.push('&');
                cursor = start + 1;
            }
        }
    }
    output.push_str(&text[cursor..]);
    output
}

fn escape_text(text: &str, output: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '\u{a0}' => output.push_str("&nbsp;"),
            '\n' => output.push_str("<br>"),
            _ => output.push(ch),
        }
    }
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

fn write_span(output: &mut String, span: &Span) {
    let style = &span.style;
    let mut closers: Vec<&str> = Vec::new();
    if let Some(href) = &style.link {
        output.push_str(&format!("<a href=\"{}\">", escape_attribute(href)));
        closers.push("</a>");
    }
    if let Some(color) = &style.highlight {
        output.push_str(&format!(
            "<span style=\"background-color: {};\">",
            escape_attribute(color)
        ));
        closers.push("</span>");
    }
    if style.bold {
        output.push_str("<b>");
        closers.push("</b>");
    }
    if style.italic {
        output.push_str("<i>");
        closers.push("</i>");
    }
    if style.underline {
        output.push_str("<u>");
        closers.push("</u>");
    }
    escape_text(&span.text, output);
    for closer in closers.into_iter().rev() {
        output.push_str(closer);
    }
}

#[cfg(test)]
mod tests {
    use super::{ends_with_trigger, is_visibly_empty, plain_text, InlineMark, InlineText};

    #[test]
    fn plain_text_strips_tags_and_decodes_entities() {
        let text = plain_text("Use <b>bold</b> &amp; <a href=\"https://x.io\">links</a>");
        assert_eq!(text, "Use bold & links");
    }

    #[test]
    fn trigger_detection_ignores_markup_and_trailing_breaks() {
        assert!(ends_with_trigger("Plan <b>next/</b>", '/'));
        assert!(ends_with_trigger("/<br>", '/'));
        assert!(!ends_with_trigger("a/b", '/'));
        assert!(!ends_with_trigger("", '/'));
    }

    #[test]
    fn empty_detection_treats_bare_breaks_as_empty() {
        assert!(is_visibly_empty(""));
        assert!(is_visibly_empty("<br>"));
        assert!(!is_visibly_empty("<i>x</i>"));
    }

    #[test]
    fn parse_reads_highlight_and_nested_marks() {
        let text = InlineText::parse(
            "<span style=\"background-color: rgb(254, 240, 138);\"><b>hot</b> take</span>",
        );
        let spans = text.spans();
        assert_eq!(spans.len(), 2);
        assert!(spans[0].style.bold);
        assert_eq!(
            spans[0].style.highlight.as_deref(),
            Some("rgb(254, 240, 138)")
        );
        assert!(!spans[1].style.bold);
        assert_eq!(spans[1].text, " take");
    }

    #[test]
    fn transparent_background_is_no_highlight() {
        let text = InlineText::parse("<span style=\"background-color: transparent;\">x</span>");
        assert_eq!(text.spans()[0].style.highlight, None);
    }

    #[test]
    fn toggle_mark_applies_then_removes() {
        let mut text = InlineText::parse("hello world");
        assert!(text.toggle_mark(0..5, InlineMark::Bold));
        assert_eq!(text.to_markup(), "<b>hello</b> world");
        assert!(text.toggle_mark(0..5, InlineMark::Bold));
        assert_eq!(text.to_markup(), "hello world");
    }

    #[test]
    fn toggle_mark_on_partially_marked_range_marks_everything() {
        let mut text = InlineText::parse("<i>ab</i>cd");
        assert!(text.toggle_mark(0..4, InlineMark::Italic));
        assert_eq!(text.to_markup(), "<i>abcd</i>");
    }

    #[test]
    fn set_link_wraps_range_and_link_at_reads_it() {
        let mut text = InlineText::parse("see docs here");
        assert!(text.set_link(4..8, Some("https://docs.rs")));
        assert_eq!(
            text.to_markup(),
            "see <a href=\"https://docs.rs\">docs</a> here"
        );
        assert_eq!(text.link_at(5), Some("https://docs.rs"));
        assert_eq!(text.link_at(1), None);
    }

    #[test]
    fn restyle_handles_multibyte_text() {
        let mut text = InlineText::parse("día 🚀 go");
        assert!(text.set_highlight(4..5, Some("#fef08a")));
        let spans = text.spans();
        assert_eq!(spans[1].text, "🚀");
        assert_eq!(spans[1].style.highlight.as_deref(), Some("#fef08a"));
        assert_eq!(text.plain_text(), "día 🚀 go");
    }

    #[test]
    fn markup_survives_reparse() {
        let source = "<a href=\"https://a.b/?x=1&amp;y=2\"><b>x</b></a> &lt;tag&gt;<br>next";
        let text = InlineText::parse(source);
        assert_eq!(text.link_at(0), Some("https://a.b/?x=1&y=2"));
        assert_eq!(InlineText::parse(&text.to_markup()), text);
    }
}
