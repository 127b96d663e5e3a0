//! SOS Max message encoding.
//!
//! An SOS server reads NUL-terminated, XML-like commands from a raw TCP
//! socket. Only the two display commands are produced here:
//!
//! ```text
//! !SOS<showMessage key="INFO">app.Main started</showMessage>\0
//! !SOS<showFoldMessage key="ERROR">
//! <title>app.Main first line</title>
//! <message>remaining lines</message>
//! </showFoldMessage>\0
//! ```

use std::borrow::Cow;

/// Host an SOS server listens on unless configured otherwise.
pub const DEFAULT_HOST: &str = "localhost";
/// Port an SOS server listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 4444;
/// Key used when the level is not included.
pub const DEFAULT_KEY: &str = "DEBUG";

/// Escapes the characters the server would treat as markup.
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>']) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Builds the command for `text`, folding multi-line text under its first line.
///
/// `prefix` is prepended to the single line, or to the title of a folded
/// message.
pub fn format_message(key: &str, prefix: &str, text: &str) -> String {
    match text.split_once('\n') {
        None => format!(
            "!SOS<showMessage key=\"{}\">{}{}</showMessage>",
            escape(key),
            escape(prefix),
            escape(text)
        ),
        Some((title, rest)) => format!(
            "!SOS<showFoldMessage key=\"{}\">\n<title>{}{}</title>\n<message>{}</message>\n</showFoldMessage>",
            escape(key),
            escape(prefix),
            escape(title),
            escape(rest)
        ),
    }
}

/// UTF-8 bytes of the command followed by the terminating NUL.
pub fn serialize(command: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(command.len() + 1);
    bytes.extend_from_slice(command.as_bytes());
    bytes.push(0);
    bytes
}

/// `format_message` then `serialize`.
pub fn encode(key: &str, prefix: &str, text: &str) -> Vec<u8> {
    serialize(&format_message(key, prefix, text))
}
