//! Shared record interface.
//!
//! Most of these formats carry no "record length" field: a record's extent
//! is known only once its last child is parsed, and the next sibling starts
//! exactly there. [`parse_sequence`] is that depth-first walk.

use crate::util::Result;
use crate::view::ByteView;

/// A parsed record occupying a known extent of its parent's buffer.
pub trait Record<'a> {
    /// Bytes this record spans, derived from its parsed contents.
    fn size(&self) -> usize;

    /// The record's window, truncated to [`Record::size`].
    fn view(&self) -> ByteView<'a>;
}

/// Parse `count` back-to-back records starting at `offset`.
///
/// Each element is handed the rest of the window; its derived size moves
/// the cursor. Returns the records and the offset one past the last one.
pub fn parse_sequence<'a, R, F>(
    view: ByteView<'a>,
    offset: usize,
    count: usize,
    mut parse: F,
) -> Result<(Vec<R>, usize)>
where
    R: Record<'a>,
    F: FnMut(ByteView<'a>) -> Result<R>,
{
    // Counts come straight from the file; don't let one drive a huge allocation.
    let mut records = Vec::with_capacity(count.min(view.size()));
    let mut cursor = offset;
    for _ in 0..count {
        let record = parse(view.tail(cursor)?)?;
        cursor += record.size();
        records.push(record);
    }
    Ok((records, cursor))
}
