//! Row-type virtualization.
//!
//! A list position maps to a content row, the synthetic trailing More row,
//! or the synthetic bottom-padding spacer. The mapping is a pure function of
//! the current counts — no cached state, no history. The bottom-padding row,
//! when present, is always the final row; the More row sits immediately
//! after the last content row.

/// The kind of row at a list position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowKind {
    /// A row backed by a stored item; carries the index into the store.
    Content(usize),
    /// The trailing "load more" row, doubling as the retry affordance after
    /// a failed fetch.
    More,
    /// The trailing spacer reserved for layout purposes.
    BottomPadding,
}

/// Resolves the row kind at `position`.
///
/// Returns `None` when `position` is past the virtual row count implied by
/// the arguments.
pub fn resolve_row_kind(
    position: usize,
    content_count: usize,
    shows_more: bool,
    shows_bottom_padding: bool,
) -> Option<RowKind> {
    let total = content_count + usize::from(shows_more) + usize::from(shows_bottom_padding);
    if position >= total {
        return None;
    }
    if shows_bottom_padding && position == total - 1 {
        return Some(RowKind::BottomPadding);
    }
    if position < content_count {
        return Some(RowKind::Content(position));
    }
    Some(RowKind::More)
}
