use crate::config::NO_HIGHLIGHT;
use crate::geometry::Rect;
use crate::markup::{InlineMark, InlineText};
use std::ops::Range;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatCommand {
    Bold,
    Italic,
    Underline,
    CreateLink,
    HiliteColor,
}

/// One node on the path from the selection anchor up to the root. Nodes that
/// belong to a block carry its id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionNode {
    pub block_id: Option<String>,
}

impl SelectionNode {
    pub fn block(id: impl Into<String>) -> Self {
        Self {
            block_id: Some(id.into()),
        }
    }

    pub fn plain() -> Self {
        Self::default()
    }
}

/// Walks from the anchor node outward and returns the first block id found.
pub fn owning_block_id(path: &[SelectionNode]) -> Option<&str> {
    path.iter().find_map(|node| node.block_id.as_deref())
}

/// Native text-selection capability of the rendering host.
pub trait SelectionHost {
    /// Opaque copy of the live range, used to restore it after a blocking
    /// prompt.
    type Range: Clone;

    /// Bounding rectangle of the live selection; `None` without a live range.
    fn selection_rect(&self) -> Option<Rect>;

    fn is_collapsed(&self) -> bool;

    /// Anchor node first, then its ancestors.
    fn anchor_path(&self) -> Vec<SelectionNode>;

    fn apply_inline_format(&mut self, command: FormatCommand, value: Option<&str>) -> bool;

    fn query_inline_format_value(&self, command: FormatCommand) -> Option<String>;

    fn capture_range(&self) -> Option<Self::Range>;

    fn restore_range(&mut self, range: Self::Range);
}

/// Decides whether the highlight currently under the selection equals the
/// requested one.
pub trait ColorComparator {
    fn same_color(&self, current: Option<&str>, target: &str) -> bool;
}

/// Compares colors as RGB triples after parsing `#rgb`, `#rrggbb`,
/// `rgb(..)` and `rgba(..)`. Transparent values mean "no highlight".
#[derive(Clone, Copy, Debug, Default)]
pub struct NormalizedColorComparator;

impl ColorComparator for NormalizedColorComparator {
    fn same_color(&self, current: Option<&str>, target: &str) -> bool {
        match (normalize_color(current.unwrap_or("")), normalize_color(target)) {
            (NormalizedColor::None, NormalizedColor::None) => true,
            (NormalizedColor::Rgb(a), NormalizedColor::Rgb(b)) => a == b,
            (NormalizedColor::Other(a), NormalizedColor::Other(b)) => a == b,
            _ => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum NormalizedColor {
    None,
    Rgb([u8; 3]),
    Other(String),
}

fn normalize_color(raw: &str) -> NormalizedColor {
    let value = raw.trim().to_ascii_lowercase();
    if value.is_empty() || value == NO_HIGHLIGHT {
        return NormalizedColor::None;
    }
    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex)
            .map(NormalizedColor::Rgb)
            .unwrap_or(NormalizedColor::Other(value));
    }
    let functional = value
        .strip_prefix("rgba(")
        .or_else(|| value.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'));
    if let Some(args) = functional {
        let parts: Vec<&str> = args
            .split(|ch: char| ch == ',' || ch == '/' || ch.is_whitespace())
            .filter(|part| !part.is_empty())
            .collect();
        if parts.len() == 4 && parts[3].parse::<f32>().is_ok_and(|alpha| alpha == 0.0) {
            return NormalizedColor::None;
        }
        if parts.len() >= 3 {
            let channels: Option<Vec<u8>> = parts[..3]
                .iter()
                .map(|part| part.parse::<f32>().ok().map(|v| v.round().clamp(0.0, 255.0) as u8))
                .collect();
            if let Some(channels) = channels {
                return NormalizedColor::Rgb([channels[0], channels[1], channels[2]]);
            }
        }
    }
    NormalizedColor::Other(value)
}

fn parse_hex(hex: &str) -> Option<[u8; 3]> {
    if !hex.is_ascii() {
        return None;
    }
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|ch| [ch, ch]).collect(),
        6 => hex.to_string(),
        _ => return None,
    };
    let channel = |ix: usize| u8::from_str_radix(&expanded[ix..ix + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// Selection host backed by a block's stored markup, addressed in character
/// offsets of its plain text.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkupSelection {
    block_id: String,
    text: InlineText,
    range: Option<Range<usize>>,
    rect: Option<Rect>,
}

impl MarkupSelection {
    pub fn new(block_id: impl Into<String>, markup: &str) -> Self {
        Self {
            block_id: block_id.into(),
            text: InlineText::parse(markup),
            range: None,
            rect: None,
        }
    }

    pub fn block_id(&self) -> &str {
        &self.block_id
    }

    pub fn select(&mut self, range: Range<usize>, rect: Rect) {
        let len = self.text.char_len();
        let start = range.start.min(range.end).min(len);
        let end = range.end.max(range.start).min(len);
        self.range = Some(start..end);
        self.rect = Some(rect);
    }

    pub fn clear(&mut self) {
        self.range = None;
        self.rect = None;
    }

    pub fn range(&self) -> Option<Range<usize>> {
        self.range.clone()
    }

    pub fn to_markup(&self) -> String {
        self.text.to_markup()
    }
}

impl SelectionHost for MarkupSelection {
    type Range = Range<usize>;

    fn selection_rect(&self) -> Option<Rect> {
        self.range.as_ref().and(self.rect)
    }

    fn is_collapsed(&self) -> bool {
        self.range.as_ref().map_or(true, |range| range.is_empty())
    }

    fn anchor_path(&self) -> Vec<SelectionNode> {
        if self.range.is_none() {
            return Vec::new();
        }
        vec![SelectionNode::plain(), SelectionNode::block(self.block_id.clone())]
    }

    fn apply_inline_format(&mut self, command: FormatCommand, value: Option<&str>) -> bool {
        let Some(range) = self.range.clone() else {
            return false;
        };
        match command {
            FormatCommand::Bold => self.text.toggle_mark(range, InlineMark::Bold),
            FormatCommand::Italic => self.text.toggle_mark(range, InlineMark::Italic),
            FormatCommand::Underline => self.text.toggle_mark(range, InlineMark::Underline),
            FormatCommand::CreateLink => match value {
                Some(href) if !href.is_empty() => self.text.set_link(range, Some(href)),
                _ => false,
            },
            FormatCommand::HiliteColor => {
                let color = value.filter(|color| !color.eq_ignore_ascii_case(NO_HIGHLIGHT));
                self.text.set_highlight(range, color)
            }
        }
    }

    fn query_inline_format_value(&self, command: FormatCommand) -> Option<String> {
        let range = self.range.clone()?;
        match command {
            FormatCommand::Bold => Some(self.text.mark_covers(range, InlineMark::Bold).to_string()),
            FormatCommand::Italic => {
                Some(self.text.mark_covers(range, InlineMark::Italic).to_string())
            }
            FormatCommand::Underline => {
                Some(self.text.mark_covers(range, InlineMark::Underline).to_string())
            }
            FormatCommand::CreateLink => self.text.link_at(range.start).map(str::to_string),
            FormatCommand::HiliteColor => self
                .text
                .style_at(range.start)
                .and_then(|style| style.highlight.clone()),
        }
    }

    fn capture_range(&self) -> Option<Self::Range> {
        self.range.clone()
    }

    fn restore_range(&mut self, range: Self::Range) {
        self.range = Some(range);
    }
}
