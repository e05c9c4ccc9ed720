//! The delimited block this crate owns inside the hosts file.
//!
//! ```text
//!
//!
//! #########################
//! # hosts-override START
//! #########################
//!
//! 192.168.1.50 db
//! 93.184.216.34 api  # IP resolved from example.org
//!
//!
//! #########################
//! # hosts-override FINISH
//! #########################
//!
//! ```
//!
//! The markers include their surrounding blank lines, so appending a block
//! and stripping it again restores the original bytes exactly.

use crate::entry::OverrideSet;

/// Opening marker, matched literally.
pub const START_MARKER: &str =
    "\n\n#########################\n# hosts-override START\n#########################\n\n";

/// Closing marker, matched literally.
pub const FINISH_MARKER: &str =
    "\n\n#########################\n# hosts-override FINISH\n#########################\n\n";

/// Renders `entries` as a complete block, markers included.
#[must_use]
pub fn render(entries: &OverrideSet) -> String {
    let mut out = String::from(START_MARKER);
    out.push_str(&render_entries(entries));
    out.push_str(FINISH_MARKER);
    out
}

/// Renders the entry lines alone, one per line.
#[must_use]
pub fn render_entries(entries: &OverrideSet) -> String {
    entries.iter().map(|e| format!("{e}\n")).collect()
}

/// Removes every complete `START ... FINISH` region from `content`.
///
/// Works on raw bytes, so hosts files that are not valid UTF-8 are handled
/// like any other. Only the markers are matched; whatever lies between them
/// is removed unexamined. Content outside the regions is returned
/// byte-for-byte. A start marker without a following finish marker is left
/// alone, so input without a complete pair comes back unchanged.
#[must_use]
pub fn strip(content: impl AsRef<[u8]>) -> Vec<u8> {
    let mut current = strip_pass(content.as_ref());
    // Removing a block can join the bytes around it into a new marker.
    loop {
        let next = strip_pass(&current);
        if next.len() == current.len() {
            return current;
        }
        current = next;
    }
}

fn strip_pass(content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len());
    let mut rest = content;

    while let Some((start, end)) = find_block(rest) {
        out.extend_from_slice(&rest[..start]);
        rest = &rest[end..];
    }
    out.extend_from_slice(rest);
    out
}

/// Counts complete blocks in `content`.
#[must_use]
pub fn count_blocks(content: impl AsRef<[u8]>) -> usize {
    let mut count = 0;
    let mut rest = content.as_ref();
    while let Some((_, end)) = find_block(rest) {
        count += 1;
        rest = &rest[end..];
    }
    count
}

/// Byte range of the first complete block, markers included.
fn find_block(content: &[u8]) -> Option<(usize, usize)> {
    let start = find(content, START_MARKER.as_bytes())?;
    let body = start + START_MARKER.len();
    let finish = find(&content[body..], FINISH_MARKER.as_bytes())?;
    Some((start, body + finish + FINISH_MARKER.len()))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
