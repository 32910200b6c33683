//! Outbound chat text shaping.
//!
//! Game chat accepts a single line of at most [`MAX_CHAT_CHARS`] characters.

/// Character budget of one chat message.
pub const MAX_CHAT_CHARS: usize = 140;

/// Appended to any message that had to be shortened.
pub const ELLIPSIS: char = '…';

/// Cutting back to a word boundary only happens when the boundary is at least
/// this far into the message.
const MIN_WORD_BREAK: usize = 30;

/// Make `text` safe to post: collapse whitespace runs (newlines included) to
/// single spaces, then shorten to at most `limit` characters, preferring a word
/// boundary and ending with [`ELLIPSIS`] when shortened.
pub fn sanitize_reply(text: &str, limit: usize) -> String {
    let clean = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if clean.chars().count() <= limit {
        return clean;
    }
    if limit == 0 {
        return String::new();
    }

    let mut cut: String = clean.chars().take(limit - 1).collect();
    if let Some(last_space) = cut.rfind(' ') {
        if cut[..last_space].chars().count() >= MIN_WORD_BREAK {
            cut.truncate(last_space);
        }
    }

    let mut out = cut.trim_end().to_string();
    out.push(ELLIPSIS);
    out
}
