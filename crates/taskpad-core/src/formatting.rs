//! Toolbar commands applied to the host's live selection.

use crate::config::NO_HIGHLIGHT;
use crate::selection::{ColorComparator, FormatCommand, SelectionHost};
use tracing::debug;

/// Bold, italic or underline. Other commands need a value and go through
/// [`toggle_highlight`] or [`create_link`].
pub fn apply_format<H: SelectionHost>(host: &mut H, command: FormatCommand) -> bool {
    match command {
        FormatCommand::Bold | FormatCommand::Italic | FormatCommand::Underline => {
            host.apply_inline_format(command, None)
        }
        FormatCommand::CreateLink | FormatCommand::HiliteColor => false,
    }
}

/// Applies `color`, or clears the highlight when the selection already
/// carries it. Passing [`NO_HIGHLIGHT`] always clears.
pub fn toggle_highlight<H: SelectionHost>(
    host: &mut H,
    color: &str,
    comparator: &dyn ColorComparator,
) -> bool {
    let current = host.query_inline_format_value(FormatCommand::HiliteColor);
    let clear = color == NO_HIGHLIGHT || comparator.same_color(current.as_deref(), color);
    let value = if clear { NO_HIGHLIGHT } else { color };
    debug!(?current, value, "highlight toggled");
    host.apply_inline_format(FormatCommand::HiliteColor, Some(value))
}

/// Links the selection to a URL obtained from `prompt`. The range is
/// captured before prompting and restored afterwards, since a blocking
/// prompt may steal the selection.
pub fn create_link<H, F>(host: &mut H, prompt: F) -> bool
where
    H: SelectionHost,
    F: FnOnce() -> Option<String>,
{
    let saved = host.capture_range();
    let Some(url) = prompt().filter(|url| !url.trim().is_empty()) else {
        return false;
    };
    if let Some(range) = saved {
        host.restore_range(range);
    }
    host.apply_inline_format(FormatCommand::CreateLink, Some(&url))
}
