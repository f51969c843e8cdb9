//! Builders for raw RFC 822 messages and already-parsed fetch results.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};

use supportdesk::email::FetchedMessage;

/// Builder for raw message bytes as an IMAP server would return them.
pub struct RawMessageBuilder {
    headers: Vec<(String, String)>,
    body: MessageBody,
}

enum MessageBody {
    Plain(String),
    Html(String),
    Alternative { plain: String, html: String },
    Empty,
}

impl RawMessageBuilder {
    pub fn new() -> Self {
        Self {
            headers: vec![("From".to_string(), "customer@example.com".to_string())],
            body: MessageBody::Empty,
        }
    }

    fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn message_id(self, id: &str) -> Self {
        self.header("Message-ID", &format!("<{}>", id))
    }

    pub fn from(self, from: &str) -> Self {
        self.header("From", from)
    }

    pub fn subject(self, subject: &str) -> Self {
        self.header("Subject", subject)
    }

    pub fn date(self, date: DateTime<Utc>) -> Self {
        self.header("Date", &date.to_rfc2822())
    }

    pub fn plain(mut self, text: &str) -> Self {
        self.body = MessageBody::Plain(text.to_string());
        self
    }

    pub fn html(mut self, html: &str) -> Self {
        self.body = MessageBody::Html(html.to_string());
        self
    }

    pub fn alternative(mut self, plain: &str, html: &str) -> Self {
        self.body = MessageBody::Alternative {
            plain: plain.to_string(),
            html: html.to_string(),
        };
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = String::new();
        for (name, value) in &self.headers {
            out.push_str(&format!("{}: {}\r\n", name, value));
        }
        out.push_str("MIME-Version: 1.0\r\n");
        match self.body {
            MessageBody::Plain(text) => {
                out.push_str("Content-Type: text/plain; charset=utf-8\r\n\r\n");
                out.push_str(&text);
                out.push_str("\r\n");
            }
            MessageBody::Html(html) => {
                out.push_str("Content-Type: text/html; charset=utf-8\r\n\r\n");
                out.push_str(&html);
                out.push_str("\r\n");
            }
            MessageBody::Alternative { plain, html } => {
                out.push_str("Content-Type: multipart/alternative; boundary=\"sep\"\r\n\r\n");
                out.push_str("--sep\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n");
                out.push_str(&plain);
                out.push_str("\r\n--sep\r\nContent-Type: text/html; charset=utf-8\r\n\r\n");
                out.push_str(&html);
                out.push_str("\r\n--sep--\r\n");
            }
            MessageBody::Empty => out.push_str("\r\n"),
        }
        out.into_bytes()
    }
}

/// A parsed message with a fixed receipt time `hours_ago` before `base`.
pub fn fetched(
    identifier: Option<&str>,
    subject: &str,
    base: DateTime<Utc>,
    hours_ago: i64,
) -> FetchedMessage {
    FetchedMessage {
        identifier: identifier.map(str::to_string),
        sender: Some("customer@example.com".to_string()),
        subject: Some(subject.to_string()),
        body: format!("Body of '{}'", subject),
        received_at: base - chrono::Duration::hours(hours_ago),
    }
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
}
