//! Turns raw RFC 822 bytes into the normalized record the ingestion gate
//! consumes.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use mail_parser::{Message, MessageParser, MessagePart, MimeHeaders, PartType};

/// Line width handed to the HTML renderer. Wide enough that words are never
/// split; lines are joined again afterwards anyway.
const RENDER_WIDTH: usize = 10_000;

/// A fetched message reduced to the fields support staff care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMessage {
    /// The `Message-ID` header, if the message has one.
    pub identifier: Option<String>,
    pub sender: Option<String>,
    pub subject: Option<String>,
    pub body: String,
    pub received_at: DateTime<Utc>,
}

/// Body content of a message part, by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Plain(String),
    Html(String),
    Multipart(Vec<MessageContent>),
    /// Attachments, binaries, embedded messages.
    Other,
}

impl MessageContent {
    /// Builds the content tree starting at the message's root part.
    pub fn from_message(message: &Message<'_>) -> Self {
        message
            .parts
            .first()
            .map_or(MessageContent::Other, |root| Self::from_part(message, root))
    }

    fn from_part(message: &Message<'_>, part: &MessagePart<'_>) -> Self {
        if is_attachment(part) {
            return MessageContent::Other;
        }

        match &part.body {
            PartType::Text(text) if is_plain(part) => MessageContent::Plain(text.to_string()),
            PartType::Html(html) => MessageContent::Html(html.to_string()),
            PartType::Multipart(ids) => MessageContent::Multipart(
                ids.iter()
                    .filter_map(|id| message.parts.get(*id as usize))
                    .map(|child| Self::from_part(message, child))
                    .collect(),
            ),
            _ => MessageContent::Other,
        }
    }

    /// Extracts the plain-text body: plain text verbatim, HTML stripped,
    /// multiparts preferring the first plain part over the first HTML part.
    pub fn extract_body(&self) -> String {
        match self {
            MessageContent::Plain(text) => text.clone(),
            MessageContent::Html(html) => html_to_text(html),
            MessageContent::Multipart(_) => {
                if let Some(text) = self.first_plain() {
                    text.to_string()
                } else if let Some(html) = self.first_html() {
                    html_to_text(html)
                } else {
                    String::new()
                }
            }
            MessageContent::Other => String::new(),
        }
    }

    fn first_plain(&self) -> Option<&str> {
        match self {
            MessageContent::Plain(text) => Some(text),
            MessageContent::Multipart(children) => children.iter().find_map(Self::first_plain),
            _ => None,
        }
    }

    fn first_html(&self) -> Option<&str> {
        match self {
            MessageContent::Html(html) => Some(html),
            MessageContent::Multipart(children) => children.iter().find_map(Self::first_html),
            _ => None,
        }
    }
}

fn is_attachment(part: &MessagePart<'_>) -> bool {
    part.content_disposition()
        .is_some_and(|d| d.ctype().eq_ignore_ascii_case("attachment"))
}

/// Untyped parts default to text/plain.
fn is_plain(part: &MessagePart<'_>) -> bool {
    match part.content_type() {
        None => true,
        Some(ct) => {
            ct.ctype().eq_ignore_ascii_case("text")
                && ct.subtype().is_none_or(|s| s.eq_ignore_ascii_case("plain"))
        }
    }
}

/// Parses raw message bytes. Never fails: unparseable input yields a
/// record with no identifier and an empty body.
///
/// `received_at` is the server's internal date when known, then the `Date`
/// header, then `fetched_at`.
pub fn parse_message(
    raw: &[u8],
    internal_date: Option<DateTime<Utc>>,
    fetched_at: DateTime<Utc>,
) -> FetchedMessage {
    let Some(message) = MessageParser::default().parse(raw) else {
        debug!("Unparseable message ({} bytes), storing empty body", raw.len());
        return FetchedMessage {
            identifier: None,
            sender: None,
            subject: None,
            body: String::new(),
            received_at: internal_date.unwrap_or(fetched_at),
        };
    };

    let header_date = message
        .date()
        .and_then(|d| DateTime::from_timestamp(d.to_timestamp(), 0));

    FetchedMessage {
        identifier: message
            .message_id()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        sender: message
            .from()
            .and_then(|addr| addr.first().map(format_address))
            .filter(|s| !s.is_empty()),
        subject: message.subject().map(|s| s.to_string()),
        body: MessageContent::from_message(&message).extract_body(),
        received_at: internal_date.or(header_date).unwrap_or(fetched_at),
    }
}

/// Formats an email address for display.
/// If the address has a display name, formats as "Name <email@example.com>".
/// Otherwise, returns just the email address.
fn format_address(addr: &mail_parser::Addr) -> String {
    if let Some(name) = addr.name() {
        format!("{} <{}>", name, addr.address().unwrap_or_default())
    } else {
        addr.address().unwrap_or_default().to_string()
    }
}

/// Strips markup and returns the visible text with whitespace collapsed.
/// Markup the renderer cannot handle yields empty text.
pub fn html_to_text(html: &str) -> String {
    match html2text::config::plain_no_decorate().string_from_read(html.as_bytes(), RENDER_WIDTH) {
        Ok(text) => text.split_whitespace().collect::<Vec<_>>().join(" "),
        Err(e) => {
            warn!("Failed to render HTML body: {}", e);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fetched_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 9, 30, 0).unwrap()
    }

    fn parse(raw: &str) -> FetchedMessage {
        parse_message(raw.as_bytes(), None, fetched_at())
    }

    fn content(raw: &str) -> MessageContent {
        let message = MessageParser::default().parse(raw.as_bytes()).unwrap();
        MessageContent::from_message(&message)
    }

    #[test]
    fn test_plain_message() {
        let msg = parse(
            "Message-ID: <abc@example.com>\r\n\
             From: Jane Doe <jane@example.com>\r\n\
             Subject: Cannot log in\r\n\
             Date: Tue, 28 Apr 2026 10:00:00 +0000\r\n\
             Content-Type: text/plain; charset=utf-8\r\n\
             \r\n\
             Hello, I cannot log in.\r\n",
        );
        assert_eq!(msg.identifier.as_deref(), Some("abc@example.com"));
        assert_eq!(msg.sender.as_deref(), Some("Jane Doe <jane@example.com>"));
        assert_eq!(msg.subject.as_deref(), Some("Cannot log in"));
        assert_eq!(msg.body.trim_end(), "Hello, I cannot log in.");
        assert_eq!(
            msg.received_at,
            Utc.with_ymd_and_hms(2026, 4, 28, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_sender_without_display_name() {
        let msg = parse("From: bob@example.com\r\nSubject: hi\r\n\r\nbody\r\n");
        assert_eq!(msg.sender.as_deref(), Some("bob@example.com"));
    }

    #[test]
    fn test_missing_message_id() {
        let msg = parse("From: a@example.com\r\nSubject: no id\r\n\r\nbody\r\n");
        assert_eq!(msg.identifier, None);
    }

    #[test]
    fn test_received_at_prefers_internal_date() {
        let internal = Utc.with_ymd_and_hms(2026, 4, 30, 8, 0, 0).unwrap();
        let msg = parse_message(
            b"Date: Tue, 28 Apr 2026 10:00:00 +0000\r\nSubject: x\r\n\r\nbody\r\n",
            Some(internal),
            fetched_at(),
        );
        assert_eq!(msg.received_at, internal);
    }

    #[test]
    fn test_received_at_falls_back_to_fetch_time() {
        let msg = parse("Subject: undated\r\n\r\nbody\r\n");
        assert_eq!(msg.received_at, fetched_at());
    }

    #[test]
    fn test_html_only_message_is_stripped() {
        let msg = parse(
            "Subject: html\r\n\
             Content-Type: text/html; charset=utf-8\r\n\
             \r\n\
             <html><head><style>p { color: red; }</style></head>\
             <body><p>Hello&nbsp;<b>there</b> &amp; welcome</p></body></html>\r\n",
        );
        assert_eq!(msg.body, "Hello there & welcome");
    }

    #[test]
    fn test_multipart_alternative_prefers_plain() {
        let raw = "Subject: alt\r\n\
                   MIME-Version: 1.0\r\n\
                   Content-Type: multipart/alternative; boundary=\"b1\"\r\n\
                   \r\n\
                   --b1\r\n\
                   Content-Type: text/html; charset=utf-8\r\n\
                   \r\n\
                   <p>HTML version</p>\r\n\
                   --b1\r\n\
                   Content-Type: text/plain; charset=utf-8\r\n\
                   \r\n\
                   Plain version\r\n\
                   --b1--\r\n";
        assert_eq!(parse(raw).body.trim_end(), "Plain version");
    }

    #[test]
    fn test_multipart_falls_back_to_html() {
        let raw = "Subject: html only\r\n\
                   MIME-Version: 1.0\r\n\
                   Content-Type: multipart/mixed; boundary=\"b1\"\r\n\
                   \r\n\
                   --b1\r\n\
                   Content-Type: text/html; charset=utf-8\r\n\
                   \r\n\
                   <div>Only <i>HTML</i></div>\r\n\
                   --b1\r\n\
                   Content-Type: application/pdf\r\n\
                   Content-Disposition: attachment; filename=\"invoice.pdf\"\r\n\
                   Content-Transfer-Encoding: base64\r\n\
                   \r\n\
                   JVBERi0xLjQK\r\n\
                   --b1--\r\n";
        assert_eq!(parse(raw).body, "Only HTML");
    }

    #[test]
    fn test_nested_multipart_searched_depth_first() {
        let raw = "Subject: nested\r\n\
                   MIME-Version: 1.0\r\n\
                   Content-Type: multipart/mixed; boundary=\"outer\"\r\n\
                   \r\n\
                   --outer\r\n\
                   Content-Type: multipart/alternative; boundary=\"inner\"\r\n\
                   \r\n\
                   --inner\r\n\
                   Content-Type: text/plain; charset=utf-8\r\n\
                   \r\n\
                   Inner plain\r\n\
                   --inner\r\n\
                   Content-Type: text/html; charset=utf-8\r\n\
                   \r\n\
                   <p>Inner html</p>\r\n\
                   --inner--\r\n\
                   --outer\r\n\
                   Content-Type: image/png\r\n\
                   Content-Disposition: attachment; filename=\"a.png\"\r\n\
                   \r\n\
                   xx\r\n\
                   --outer--\r\n";
        assert_eq!(parse(raw).body.trim_end(), "Inner plain");
    }

    #[test]
    fn test_multipart_without_text_is_empty() {
        let raw = "Subject: only attachment\r\n\
                   MIME-Version: 1.0\r\n\
                   Content-Type: multipart/mixed; boundary=\"b1\"\r\n\
                   \r\n\
                   --b1\r\n\
                   Content-Type: text/plain\r\n\
                   Content-Disposition: attachment; filename=\"notes.txt\"\r\n\
                   \r\n\
                   attached notes\r\n\
                   --b1--\r\n";
        assert_eq!(parse(raw).body, "");
    }

    #[test]
    fn test_non_text_body_is_empty() {
        let raw = "Subject: binary\r\n\
                   Content-Type: application/octet-stream\r\n\
                   \r\n\
                   \x01\x02\r\n";
        assert_eq!(parse(raw).body, "");
        assert_eq!(content(raw), MessageContent::Other);
    }

    #[test]
    fn test_content_tree_shape() {
        let raw = "Subject: alt\r\n\
                   MIME-Version: 1.0\r\n\
                   Content-Type: multipart/alternative; boundary=\"b1\"\r\n\
                   \r\n\
                   --b1\r\n\
                   Content-Type: text/plain\r\n\
                   \r\n\
                   a\r\n\
                   --b1\r\n\
                   Content-Type: text/html\r\n\
                   \r\n\
                   <b>b</b>\r\n\
                   --b1--\r\n";
        match content(raw) {
            MessageContent::Multipart(children) => {
                assert_eq!(children.len(), 2);
                assert!(matches!(children[0], MessageContent::Plain(_)));
                assert!(matches!(children[1], MessageContent::Html(_)));
            }
            other => panic!("expected multipart, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_body_by_kind() {
        assert_eq!(MessageContent::Plain("  keep  as is ".into()).extract_body(), "  keep  as is ");
        assert_eq!(MessageContent::Html("<p>a</p><p>b</p>".into()).extract_body(), "a b");
        assert_eq!(MessageContent::Other.extract_body(), "");
        assert_eq!(MessageContent::Multipart(vec![]).extract_body(), "");
        assert_eq!(
            MessageContent::Multipart(vec![
                MessageContent::Other,
                MessageContent::Html("<i>html</i>".into()),
                MessageContent::Multipart(vec![MessageContent::Plain("deep".into())]),
            ])
            .extract_body(),
            "deep"
        );
    }

    #[test]
    fn test_html_to_text() {
        assert_eq!(
            html_to_text("<script>alert('x')</script><p>Error&#32;403 &lt;forbidden&gt;</p>"),
            "Error 403 <forbidden>"
        );
        assert_eq!(html_to_text("a&#x41;&amp;lt;"), "aA&lt;");
        assert_eq!(html_to_text("line one<br/>\n\n   line two"), "line one line two");
        assert_eq!(html_to_text(""), "");
    }

    #[test]
    fn test_html_to_text_keeps_bare_angle_brackets() {
        assert_eq!(
            html_to_text("<p>If 5 < 6 and 7 > 3 the check passes</p>"),
            "If 5 < 6 and 7 > 3 the check passes"
        );
    }

    #[test]
    fn test_html_to_text_decodes_named_entities() {
        assert_eq!(
            html_to_text("<p>Caf&eacute; &mdash; we&rsquo;re open &copy; 2026</p>"),
            "Caf\u{e9} \u{2014} we\u{2019}re open \u{a9} 2026"
        );
    }

    #[test]
    fn test_html_to_text_drops_inline_decoration() {
        assert_eq!(
            html_to_text("<p><b>Order</b> <i>#42</i> <em>shipped</em> <strong>today</strong></p>"),
            "Order #42 shipped today"
        );
    }

    #[test]
    fn test_empty_input_never_panics() {
        let msg = parse_message(b"", None, fetched_at());
        assert_eq!(msg.body, "");
        assert_eq!(msg.identifier, None);
        assert_eq!(msg.received_at, fetched_at());
    }
}
