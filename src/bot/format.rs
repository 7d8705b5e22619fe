//! Message texts and Telegram-sized splitting.

use crate::events::Event;

pub const START_TEXT: &str = "👋 Welcome to Campus Bot!\n\n\
I can help you with information about the campus, events, and more.\n\n\
Here are some commands you can use:\n\
/events - List upcoming campus events\n\
/help - Show this help message\n\n\
Or just type your question and I'll do my best to help!";

pub const HELP_TEXT: &str = "🤖 *Campus Bot Help*\n\n\
*Commands:*\n\
/start - Start the bot and see welcome message\n\
/events - List upcoming campus events\n\
/help - Show this help message\n\n\
You can also ask me questions about the campus, and I'll try to help!";

pub const NO_EVENTS_TEXT: &str = "No upcoming events found.";
pub const EVENTS_ERROR_TEXT: &str = "Sorry, I couldn't fetch the events right now. Please try again later.";
pub const TIMEOUT_TEXT: &str = "I'm taking too long to respond. Please try again in a moment.";
pub const CHAT_ERROR_TEXT: &str =
    "Sorry, I encountered an error processing your message. Please try again later.";
pub const NON_TEXT_REPLY: &str = "Please send a text message.";
pub const EMPTY_ANSWER_TEXT: &str = "I'm not sure how to respond to that.";

/// Escape characters that legacy Telegram Markdown would treat as markup.
fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Render events as a Markdown list.
pub fn format_events(events: &[Event]) -> String {
    if events.is_empty() {
        return NO_EVENTS_TEXT.to_string();
    }

    let mut text = String::from("📅 *Upcoming Events*\n\n");
    for event in events {
        text.push_str(&format!(
            "*{}*\n📅 {}\n📍 {}\nℹ️ {}\n\n",
            escape_markdown(&event.name),
            escape_markdown(&event.date),
            escape_markdown(&event.location),
            escape_markdown(&event.details),
        ));
    }
    text.trim_end().to_string()
}

/// Split `text` into messages of at most `limit` characters.
///
/// Paragraphs (`"\n\n"`-separated) are kept together where possible; a
/// paragraph longer than `limit` is cut at character boundaries.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if text.chars().count() <= limit {
        return vec![text.to_string()];
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        let len = paragraph.chars().count();

        if len > limit {
            if !current.is_empty() {
                parts.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = paragraph.chars().collect();
            for piece in chars.chunks(limit) {
                parts.push(piece.iter().collect());
            }
            continue;
        }

        let joined_len = if current.is_empty() { len } else { current_len + 2 + len };
        if joined_len > limit {
            parts.push(std::mem::take(&mut current));
            current.push_str(paragraph);
            current_len = len;
        } else {
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(paragraph);
            current_len = joined_len;
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }
    parts
}
