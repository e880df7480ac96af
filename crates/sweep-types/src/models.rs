use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

// -- Credentials --

/// Kind of token handed to the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TokenKind {
    Bot,
    Bearer,
    #[default]
    User,
}

impl FromStr for TokenKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bot" => Ok(Self::Bot),
            "bearer" => Ok(Self::Bearer),
            "user" => Ok(Self::User),
            _ => Err(ConfigError::UnknownTokenKind(s.to_string())),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bot => f.write_str("Bot"),
            Self::Bearer => f.write_str("Bearer"),
            Self::User => f.write_str("User"),
        }
    }
}

/// Token plus its kind. Fixed for the lifetime of a run.
#[derive(Clone)]
pub struct Credential {
    token: String,
    kind: TokenKind,
}

impl Credential {
    pub fn new(token: impl Into<String>, kind: TokenKind) -> Self {
        Self {
            token: token.into(),
            kind,
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Value for the `Authorization` header. User tokens are sent bare.
    pub fn authorization(&self) -> String {
        match self.kind {
            TokenKind::User => self.token.clone(),
            kind => format!("{} {}", kind, self.token),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("kind", &self.kind)
            .finish()
    }
}

// -- Rooms --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomKind {
    Channel,
    Guild,
}

impl RoomKind {
    /// URL path segment for this kind of room.
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Channel => "channels",
            Self::Guild => "guilds",
        }
    }
}

impl FromStr for RoomKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "channel" => Ok(Self::Channel),
            "guild" => Ok(Self::Guild),
            _ => Err(ConfigError::UnknownRoomKind(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRef {
    pub kind: RoomKind,
    pub id: u64,
}

impl RoomRef {
    pub fn new(kind: RoomKind, id: u64) -> Self {
        Self { kind, id }
    }

    pub fn search_path(&self) -> String {
        format!("/{}/{}/messages/search", self.kind.path_segment(), self.id)
    }
}

// -- Messages --

/// A message snapshot as returned by search. Larger IDs are later in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(with = "snowflake")]
    pub id: u64,
    #[serde(with = "snowflake")]
    pub channel_id: u64,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub content: String,
}

/// Position reached in the sweep: a message ID and its server timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMark {
    pub id: u64,
    pub timestamp: String,
}

impl From<&Message> for MessageMark {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            timestamp: message.timestamp.clone(),
        }
    }
}

// -- Summary --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_results_size: u64,
    pub failed_count: u64,
    pub replaced_count: u64,
    pub deleted_count: u64,
    /// First message seen, i.e. the newest one touched.
    pub newest: Option<MessageMark>,
    /// Last message seen, i.e. the oldest one touched.
    pub oldest: Option<MessageMark>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunSummary {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            total_results_size: 0,
            failed_count: 0,
            replaced_count: 0,
            deleted_count: 0,
            newest: None,
            oldest: None,
            started_at,
            finished_at: None,
        }
    }

    /// Track the ID/timestamp range touched so far.
    pub fn observe(&mut self, message: &Message) {
        if self.newest.is_none() {
            self.newest = Some(MessageMark::from(message));
        }
        self.oldest = Some(MessageMark::from(message));
    }

    pub fn succeeded(&self) -> u64 {
        self.total_results_size.saturating_sub(self.failed_count)
    }

    pub fn finish(&mut self, at: DateTime<Utc>) {
        self.finished_at = Some(at);
    }

    pub fn elapsed(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }
}

/// Snowflake IDs come over the wire as strings; numbers are accepted too.
mod snowflake {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Str(String),
    }

    pub fn serialize<S: Serializer>(id: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&id.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Num(id) => Ok(id),
            Raw::Str(s) => s
                .parse()
                .map_err(|e| D::Error::custom(format!("invalid snowflake '{}': {}", s, e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_header_forms() {
        assert_eq!(Credential::new("abc", TokenKind::User).authorization(), "abc");
        assert_eq!(Credential::new("abc", TokenKind::Bot).authorization(), "Bot abc");
        assert_eq!(
            Credential::new("abc", TokenKind::Bearer).authorization(),
            "Bearer abc"
        );
    }

    #[test]
    fn credential_debug_hides_token() {
        let debug = format!("{:?}", Credential::new("s3cret", TokenKind::Bot));
        assert!(!debug.contains("s3cret"));
    }

    #[test]
    fn kinds_parse_case_insensitively() {
        assert_eq!("BOT".parse::<TokenKind>().unwrap(), TokenKind::Bot);
        assert_eq!("Guild".parse::<RoomKind>().unwrap(), RoomKind::Guild);
        assert!("forum".parse::<RoomKind>().is_err());
    }

    #[test]
    fn search_path_uses_plural_segment() {
        assert_eq!(
            RoomRef::new(RoomKind::Guild, 42).search_path(),
            "/guilds/42/messages/search"
        );
        assert_eq!(
            RoomRef::new(RoomKind::Channel, 7).search_path(),
            "/channels/7/messages/search"
        );
    }

    #[test]
    fn message_ids_accept_strings_and_numbers() {
        let message: Message = serde_json::from_str(
            r#"{"id": "1093876543210987654", "channel_id": 55, "timestamp": "2023-01-01T00:00:00+00:00"}"#,
        )
        .unwrap();
        assert_eq!(message.id, 1093876543210987654);
        assert_eq!(message.channel_id, 55);
        assert_eq!(message.content, "");

        let bad = serde_json::from_str::<Message>(r#"{"id": "abc", "channel_id": "1"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn summary_tracks_first_and_last_seen() {
        let mut summary = RunSummary::new(Utc::now());
        for (id, ts) in [(200, "t200"), (150, "t150"), (100, "t100")] {
            summary.observe(&Message {
                id,
                channel_id: 1,
                timestamp: ts.into(),
                content: String::new(),
            });
        }
        assert_eq!(summary.newest.as_ref().map(|m| m.id), Some(200));
        assert_eq!(summary.oldest.as_ref().map(|m| m.timestamp.as_str()), Some("t100"));
    }
}
