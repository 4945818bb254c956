//! Telegram HTML rendering of request events.

use crate::domain::{RequestEvent, RequestEventKind, RequesterIdentity};

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render `event` as an HTML message for administrators.
pub fn render_event(event: &RequestEvent) -> String {
    let headline = match event.kind {
        RequestEventKind::Created => "🆕 <b>New travel request</b>",
        RequestEventKind::StatusChanged => "🔄 <b>Travel request updated</b>",
    };

    let mut lines = vec![
        headline.to_string(),
        String::new(),
        format!("Request: #{}", event.request_id),
        format!("Tour: {}", escape_html(&event.tour_title)),
        format!("Status: <b>{}</b>", event.status),
        format!("Date: {}", event.occurred_at.format("%d.%m.%Y %H:%M UTC")),
        String::new(),
    ];

    match &event.requester {
        RequesterIdentity::User { username, .. } => {
            lines.push(format!("User: {}", escape_html(username)));
        }
        RequesterIdentity::Guest(contact) => {
            lines.push(format!("Guest: {}", escape_html(&contact.name)));
            lines.push(format!("Email: {}", escape_html(&contact.email)));
            lines.push(format!("Phone: {}", escape_html(&contact.phone)));
        }
    }

    if let Some(comment) = event.comment.as_deref().filter(|c| !c.trim().is_empty()) {
        lines.push(String::new());
        lines.push(format!("Comment: {}", escape_html(comment)));
    }

    lines.join("\n")
}
