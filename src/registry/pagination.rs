//! Cursor-based pagination over registry collections.
//!
//! A cursor is the key of the last entry of the previous page. Iteration
//! skips up to and including that entry, then yields at most `page_size`
//! entries. `next_cursor` is set only when the page is full, so a collection
//! whose size is a multiple of the page size ends with one empty page.

use serde::Serialize;

use crate::error::McpError;

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Entries on this page.
    pub items: Vec<T>,
    /// Cursor for the next page, present only when this page is full.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Maps every entry, keeping the cursor.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}

/// Returns the page following `cursor` from an ordered sequence of keyed entries.
///
/// # Errors
///
/// Returns an invalid-cursor error if `cursor` matches no entry key.
pub fn paginate<'a, T: 'a>(
    entries: impl IntoIterator<Item = (&'a String, &'a T)>,
    cursor: Option<&str>,
    page_size: usize,
) -> Result<Page<&'a T>, McpError> {
    let page_size = page_size.max(1);
    let mut entries = entries.into_iter();

    if let Some(cursor) = cursor {
        entries
            .by_ref()
            .find(|(key, _)| key.as_str() == cursor)
            .ok_or_else(|| McpError::InvalidCursor(cursor.to_string()))?;
    }

    let page: Vec<(&String, &T)> = entries.take(page_size).collect();
    let next_cursor = if page.len() == page_size {
        page.last().map(|(key, _)| (*key).clone())
    } else {
        None
    };

    Ok(Page {
        items: page.into_iter().map(|(_, entry)| entry).collect(),
        next_cursor,
    })
}
