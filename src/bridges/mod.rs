// Mimic — Chat bridges
//
// Thin host bindings that feed inbound lines into `MimicEngine::handle` and
// deliver engine output back to the chat:
//   irc      — any IRC server, plain TCP or TLS
//   console  — stdin/stdout, for local play and demos
//
// Shared helpers live here.

pub mod console;
pub mod irc;

/// Split text into chunks of at most `max_len` bytes, preferring newline then
/// space boundaries and never cutting through a UTF-8 character.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }
    let mut chunks = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }
        let mut limit = max_len.max(1);
        while !remaining.is_char_boundary(limit) {
            limit -= 1;
        }
        if limit == 0 {
            limit = remaining.chars().next().map(char::len_utf8).unwrap_or(remaining.len());
        }
        let window = &remaining[..limit];
        let split_at = window
            .rfind('\n')
            .or_else(|| window.rfind(' '))
            .filter(|&i| i > 0)
            .unwrap_or(limit);
        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }
    chunks
}
