use std::str::FromStr;

use thiserror::Error;

use crate::models::RoomRef;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown token type '{0}' (expected Bot, Bearer or User)")]
    UnknownTokenKind(String),
    #[error("unknown room type '{0}' (expected channel or guild)")]
    UnknownRoomKind(String),
    #[error("unknown replace mode '{0}' (expected random, fixed or none)")]
    UnknownReplaceMode(String),
    #[error("--replace-to is required when the replace mode is 'fixed'")]
    MissingReplaceText,
    #[error("oldest message id {oldest} is newer than newest message id {newest}")]
    InvertedRange { oldest: u64, newest: u64 },
}

/// What to overwrite a message with before deleting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplaceMode {
    Random,
    Fixed,
    #[default]
    None,
}

impl FromStr for ReplaceMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "fixed" => Ok(Self::Fixed),
            "none" => Ok(Self::None),
            _ => Err(ConfigError::UnknownReplaceMode(s.to_string())),
        }
    }
}

/// Resolved replace policy. `Fixed` always carries its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplacePolicy {
    Random,
    Fixed(String),
    None,
}

impl ReplacePolicy {
    pub fn from_mode(mode: ReplaceMode, replace_to: Option<String>) -> Result<Self, ConfigError> {
        match mode {
            ReplaceMode::Random => Ok(Self::Random),
            ReplaceMode::None => Ok(Self::None),
            ReplaceMode::Fixed => replace_to
                .map(Self::Fixed)
                .ok_or(ConfigError::MissingReplaceText),
        }
    }

    pub fn replaces(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Validated parameters of one sweep.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub room: RoomRef,
    pub author_id: u64,
    pub oldest_message_id: u64,
    pub newest_message_id: u64,
    pub replace: ReplacePolicy,
}

impl RunConfig {
    pub fn new(
        room: RoomRef,
        author_id: u64,
        oldest_message_id: u64,
        newest_message_id: u64,
        replace: ReplacePolicy,
    ) -> Result<Self, ConfigError> {
        if oldest_message_id > newest_message_id {
            return Err(ConfigError::InvertedRange {
                oldest: oldest_message_id,
                newest: newest_message_id,
            });
        }
        Ok(Self {
            room,
            author_id,
            oldest_message_id,
            newest_message_id,
            replace,
        })
    }
}
