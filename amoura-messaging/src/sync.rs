//! Derived conversation view state: partner resolution, block flags, the
//! send guard, message rendering dispatch, and list ordering. Everything
//! here is pure so the handler layer stays thin.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Message payload kinds on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    Image,
    Voice,
    Video,
}

impl MessageKind {
    /// Unrecognized type strings yield `None`; such messages render nothing.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Text" => Some(Self::Text),
            "Image" => Some(Self::Image),
            "Voice" => Some(Self::Voice),
            "Video" => Some(Self::Video),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Image => "Image",
            Self::Voice => "Voice",
            Self::Video => "Video",
        }
    }

    /// Kind for an uploaded attachment, from its MIME type.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        if content_type.starts_with("image/") {
            Some(Self::Image)
        } else if content_type.starts_with("audio/") {
            Some(Self::Voice)
        } else if content_type.starts_with("video/") {
            Some(Self::Video)
        } else {
            None
        }
    }
}

/// Content to display for a message: the text for `Text`, the stored media
/// URL for `Image`, and fixed captions for `Voice` and `Video`.
pub fn render_content(
    message_type: &str,
    text: Option<&str>,
    media_url: Option<&str>,
) -> Option<String> {
    match MessageKind::parse(message_type)? {
        MessageKind::Text => text.map(|t| t.to_string()),
        MessageKind::Image => media_url.map(|u| u.to_string()),
        MessageKind::Voice => Some("Voice Message".to_string()),
        MessageKind::Video => Some("Video".to_string()),
    }
}

/// The other participant of a two-party conversation.
pub fn partner_of<'a>(participant_a: &'a str, participant_b: &'a str, viewer: &str) -> Option<&'a str> {
    if participant_a == viewer {
        Some(participant_b)
    } else if participant_b == viewer {
        Some(participant_a)
    } else {
        None
    }
}

/// Canonical unordered-pair encoding: one conversation row per pair,
/// whichever side opened it first.
pub fn canonical_pair<'a>(x: &'a str, y: &'a str) -> (&'a str, &'a str) {
    if x <= y {
        (x, y)
    } else {
        (y, x)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ConversationFlags {
    pub partner_blocked_viewer: bool,
    pub viewer_blocked_partner: bool,
    pub partner_account_deleted: bool,
}

impl ConversationFlags {
    pub fn can_send_message(&self) -> bool {
        !self.partner_account_deleted && !self.viewer_blocked_partner && !self.partner_blocked_viewer
    }

    /// Why the composer is disabled, if it is. A deleted partner account
    /// takes precedence over block state.
    pub fn disabled_reason(&self) -> Option<&'static str> {
        if self.partner_account_deleted {
            Some("This account no longer exists")
        } else if self.viewer_blocked_partner {
            Some("You have blocked this member")
        } else if self.partner_blocked_viewer {
            Some("You cannot reply to this conversation")
        } else {
            None
        }
    }
}

/// Sort instant for the conversation list: most recent message first,
/// conversations that never had one sorting as if sent at the epoch.
pub fn list_sort_instant(last_message_sent_at: Option<DateTime<Utc>>) -> DateTime<Utc> {
    last_message_sent_at.unwrap_or(DateTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn partner_is_the_other_side() {
        assert_eq!(partner_of("YBE00000001", "YBE00000002", "YBE00000001"), Some("YBE00000002"));
        assert_eq!(partner_of("YBE00000001", "YBE00000002", "YBE00000002"), Some("YBE00000001"));
        assert_eq!(partner_of("YBE00000001", "YBE00000002", "YBE00000003"), None);
    }

    #[test]
    fn canonical_pair_is_order_free() {
        assert_eq!(
            canonical_pair("YBE00000009", "YBE00000002"),
            canonical_pair("YBE00000002", "YBE00000009")
        );
    }

    #[test]
    fn render_dispatch_by_type() {
        assert_eq!(
            render_content("Text", Some("hello"), None),
            Some("hello".to_string())
        );
        assert_eq!(
            render_content("Image", None, Some("https://cdn/x.jpg")),
            Some("https://cdn/x.jpg".to_string())
        );
        assert_eq!(render_content("Voice", None, Some("u")), Some("Voice Message".to_string()));
        assert_eq!(render_content("Video", None, Some("u")), Some("Video".to_string()));
    }

    #[test]
    fn unknown_type_renders_nothing() {
        assert_eq!(render_content("Sticker", Some("x"), Some("y")), None);
        assert_eq!(render_content("", None, None), None);
    }

    #[test]
    fn attachment_kind_from_mime() {
        assert_eq!(MessageKind::from_content_type("image/png"), Some(MessageKind::Image));
        assert_eq!(MessageKind::from_content_type("audio/ogg"), Some(MessageKind::Voice));
        assert_eq!(MessageKind::from_content_type("video/mp4"), Some(MessageKind::Video));
        assert_eq!(MessageKind::from_content_type("application/pdf"), None);
    }

    #[test]
    fn send_guard_requires_all_clear() {
        let clear = ConversationFlags::default();
        assert!(clear.can_send_message());
        assert_eq!(clear.disabled_reason(), None);

        for flags in [
            ConversationFlags { partner_blocked_viewer: true, ..Default::default() },
            ConversationFlags { viewer_blocked_partner: true, ..Default::default() },
            ConversationFlags { partner_account_deleted: true, ..Default::default() },
        ] {
            assert!(!flags.can_send_message());
            assert!(flags.disabled_reason().is_some());
        }
    }

    #[test]
    fn deleted_account_reason_wins_over_blocks() {
        let flags = ConversationFlags {
            partner_blocked_viewer: true,
            viewer_blocked_partner: true,
            partner_account_deleted: true,
        };
        assert_eq!(flags.disabled_reason(), Some("This account no longer exists"));
    }

    #[test]
    fn missing_last_message_sorts_as_epoch() {
        let newer = list_sort_instant(Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap()));
        let never = list_sort_instant(None);
        assert!(newer > never);
        assert_eq!(never.timestamp(), 0);
    }
}
