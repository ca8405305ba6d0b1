//! Tagged-union DSNP announcement model.
//!
//! Announcements are a closed set of variants discriminated by a numeric
//! `announcementType` wire value. The values are non-contiguous protocol
//! constants (Tombstone=0, Broadcast=2, Reply=3, Reaction=4, Profile=5,
//! Update=6, PublicFollows=113) and are preserved exactly.
//!
//! Wire form is a flat camelCase JSON object; deserialization dispatches
//! exhaustively on the discriminant, and unknown discriminants are rejected.

use crate::schema::SchemaId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Announcement kind with its DSNP wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum AnnouncementType {
    /// Retraction of a prior announcement (0).
    Tombstone,
    /// New top-level content (2).
    Broadcast,
    /// Reply to existing content (3).
    Reply,
    /// Emoji reaction to existing content (4).
    Reaction,
    /// Profile content update (5).
    Profile,
    /// Edit of a prior announcement (6).
    Update,
    /// Public follow list update (113).
    PublicFollows,
}

impl AnnouncementType {
    /// Protocol wire value for this kind.
    pub fn wire_value(self) -> u16 {
        match self {
            Self::Tombstone => 0,
            Self::Broadcast => 2,
            Self::Reply => 3,
            Self::Reaction => 4,
            Self::Profile => 5,
            Self::Update => 6,
            Self::PublicFollows => 113,
        }
    }

    /// Lowercase activity label used for queue and webhook routing.
    pub fn category(self) -> &'static str {
        match self {
            Self::Tombstone => "tombstone",
            Self::Broadcast => "broadcast",
            Self::Reply => "reply",
            Self::Reaction => "reaction",
            Self::Profile => "profile",
            Self::Update => "update",
            Self::PublicFollows => "public_follows",
        }
    }
}

impl From<AnnouncementType> for u16 {
    fn from(value: AnnouncementType) -> Self {
        value.wire_value()
    }
}

impl TryFrom<u16> for AnnouncementType {
    type Error = AnnouncementDecodeError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Tombstone),
            2 => Ok(Self::Broadcast),
            3 => Ok(Self::Reply),
            4 => Ok(Self::Reaction),
            5 => Ok(Self::Profile),
            6 => Ok(Self::Update),
            113 => Ok(Self::PublicFollows),
            other => Err(AnnouncementDecodeError::UnknownType(other)),
        }
    }
}

/// Failure to interpret a wire announcement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnouncementDecodeError {
    /// The discriminant is not one of the seven known wire values.
    #[error("unknown announcement type {0}")]
    UnknownType(u16),

    /// A variant-required field was absent.
    #[error("{category} announcement is missing required field '{field}'")]
    MissingField {
        /// Category label of the announcement being decoded.
        category: &'static str,
        /// Wire name of the absent field.
        field: &'static str,
    },
}

/// A typed content event, one of the seven protocol variants.
///
/// Every variant carries the common `from_id` (the publishing DSNP user id)
/// alongside its own fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "RawAnnouncement", try_from = "RawAnnouncement")]
pub enum Announcement {
    /// Retraction of a prior announcement.
    Tombstone {
        from_id: String,
        target_announcement_type: u16,
        target_content_hash: String,
    },
    /// New top-level content.
    Broadcast {
        from_id: String,
        content_hash: String,
        url: String,
    },
    /// Reply to existing content.
    Reply {
        from_id: String,
        content_hash: String,
        in_reply_to: String,
        url: String,
    },
    /// Emoji reaction; `apply` of 0 retracts, non-zero applies.
    Reaction {
        from_id: String,
        emoji: String,
        in_reply_to: String,
        apply: u8,
    },
    /// Profile content update.
    Profile {
        from_id: String,
        content_hash: String,
        url: String,
    },
    /// Edit of a prior announcement.
    Update {
        from_id: String,
        content_hash: String,
        target_announcement_type: u16,
        target_content_hash: String,
        url: String,
    },
    /// Public follow list update; common fields only.
    PublicFollows { from_id: String },
}

impl Announcement {
    /// The variant's announcement kind.
    pub fn announcement_type(&self) -> AnnouncementType {
        match self {
            Self::Tombstone { .. } => AnnouncementType::Tombstone,
            Self::Broadcast { .. } => AnnouncementType::Broadcast,
            Self::Reply { .. } => AnnouncementType::Reply,
            Self::Reaction { .. } => AnnouncementType::Reaction,
            Self::Profile { .. } => AnnouncementType::Profile,
            Self::Update { .. } => AnnouncementType::Update,
            Self::PublicFollows { .. } => AnnouncementType::PublicFollows,
        }
    }

    /// The publishing DSNP user id.
    pub fn from_id(&self) -> &str {
        match self {
            Self::Tombstone { from_id, .. }
            | Self::Broadcast { from_id, .. }
            | Self::Reply { from_id, .. }
            | Self::Reaction { from_id, .. }
            | Self::Profile { from_id, .. }
            | Self::Update { from_id, .. }
            | Self::PublicFollows { from_id } => from_id,
        }
    }

    /// Lowercase activity label used for queue and webhook routing.
    pub fn category(&self) -> &'static str {
        self.announcement_type().category()
    }
}

/// Flat wire shape: the discriminant, the common `fromId`, and the union of
/// all variant fields as optionals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAnnouncement {
    announcement_type: AnnouncementType,
    from_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    in_reply_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    apply: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_announcement_type: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_content_hash: Option<String>,
}

impl RawAnnouncement {
    fn empty(announcement_type: AnnouncementType, from_id: String) -> Self {
        Self {
            announcement_type,
            from_id,
            content_hash: None,
            url: None,
            in_reply_to: None,
            emoji: None,
            apply: None,
            target_announcement_type: None,
            target_content_hash: None,
        }
    }
}

fn require<T>(
    value: Option<T>,
    category: &'static str,
    field: &'static str,
) -> Result<T, AnnouncementDecodeError> {
    value.ok_or(AnnouncementDecodeError::MissingField { category, field })
}

impl TryFrom<RawAnnouncement> for Announcement {
    type Error = AnnouncementDecodeError;

    fn try_from(raw: RawAnnouncement) -> Result<Self, Self::Error> {
        let kind = raw.announcement_type;
        let category = kind.category();
        match kind {
            AnnouncementType::Tombstone => Ok(Self::Tombstone {
                from_id: raw.from_id,
                target_announcement_type: require(
                    raw.target_announcement_type,
                    category,
                    "targetAnnouncementType",
                )?,
                target_content_hash: require(
                    raw.target_content_hash,
                    category,
                    "targetContentHash",
                )?,
            }),
            AnnouncementType::Broadcast => Ok(Self::Broadcast {
                from_id: raw.from_id,
                content_hash: require(raw.content_hash, category, "contentHash")?,
                url: require(raw.url, category, "url")?,
            }),
            AnnouncementType::Reply => Ok(Self::Reply {
                from_id: raw.from_id,
                content_hash: require(raw.content_hash, category, "contentHash")?,
                in_reply_to: require(raw.in_reply_to, category, "inReplyTo")?,
                url: require(raw.url, category, "url")?,
            }),
            AnnouncementType::Reaction => Ok(Self::Reaction {
                from_id: raw.from_id,
                emoji: require(raw.emoji, category, "emoji")?,
                in_reply_to: require(raw.in_reply_to, category, "inReplyTo")?,
                apply: require(raw.apply, category, "apply")?,
            }),
            AnnouncementType::Profile => Ok(Self::Profile {
                from_id: raw.from_id,
                content_hash: require(raw.content_hash, category, "contentHash")?,
                url: require(raw.url, category, "url")?,
            }),
            AnnouncementType::Update => Ok(Self::Update {
                from_id: raw.from_id,
                content_hash: require(raw.content_hash, category, "contentHash")?,
                target_announcement_type: require(
                    raw.target_announcement_type,
                    category,
                    "targetAnnouncementType",
                )?,
                target_content_hash: require(
                    raw.target_content_hash,
                    category,
                    "targetContentHash",
                )?,
                url: require(raw.url, category, "url")?,
            }),
            AnnouncementType::PublicFollows => Ok(Self::PublicFollows {
                from_id: raw.from_id,
            }),
        }
    }
}

impl From<Announcement> for RawAnnouncement {
    fn from(announcement: Announcement) -> Self {
        let kind = announcement.announcement_type();
        match announcement {
            Announcement::Tombstone {
                from_id,
                target_announcement_type,
                target_content_hash,
            } => Self {
                target_announcement_type: Some(target_announcement_type),
                target_content_hash: Some(target_content_hash),
                ..Self::empty(kind, from_id)
            },
            Announcement::Broadcast {
                from_id,
                content_hash,
                url,
            } => Self {
                content_hash: Some(content_hash),
                url: Some(url),
                ..Self::empty(kind, from_id)
            },
            Announcement::Reply {
                from_id,
                content_hash,
                in_reply_to,
                url,
            } => Self {
                content_hash: Some(content_hash),
                in_reply_to: Some(in_reply_to),
                url: Some(url),
                ..Self::empty(kind, from_id)
            },
            Announcement::Reaction {
                from_id,
                emoji,
                in_reply_to,
                apply,
            } => Self {
                emoji: Some(emoji),
                in_reply_to: Some(in_reply_to),
                apply: Some(apply),
                ..Self::empty(kind, from_id)
            },
            Announcement::Profile {
                from_id,
                content_hash,
                url,
            } => Self {
                content_hash: Some(content_hash),
                url: Some(url),
                ..Self::empty(kind, from_id)
            },
            Announcement::Update {
                from_id,
                content_hash,
                target_announcement_type,
                target_content_hash,
                url,
            } => Self {
                content_hash: Some(content_hash),
                target_announcement_type: Some(target_announcement_type),
                target_content_hash: Some(target_content_hash),
                url: Some(url),
                ..Self::empty(kind, from_id)
            },
            Announcement::PublicFollows { from_id } => Self::empty(kind, from_id),
        }
    }
}

/// An announcement paired with its chain placement, as delivered to webhook
/// subscribers.
///
/// Created by upstream producers (blockchain scan or direct upload), carried
/// through the queue as serialized JSON, and discarded after delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementResponse {
    /// Optional request correlation identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Optional webhook URL registered with a specific search request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    /// Schema the announcement content conforms to.
    pub schema_id: SchemaId,
    /// Block where the announcement was recorded (0 until chain placement).
    pub block_number: u64,
    /// The announcement itself.
    pub announcement: Announcement,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_values_are_protocol_constants() {
        assert_eq!(AnnouncementType::Tombstone.wire_value(), 0);
        assert_eq!(AnnouncementType::Broadcast.wire_value(), 2);
        assert_eq!(AnnouncementType::Reply.wire_value(), 3);
        assert_eq!(AnnouncementType::Reaction.wire_value(), 4);
        assert_eq!(AnnouncementType::Profile.wire_value(), 5);
        assert_eq!(AnnouncementType::Update.wire_value(), 6);
        assert_eq!(AnnouncementType::PublicFollows.wire_value(), 113);
    }

    #[test]
    fn test_unknown_wire_value_rejected() {
        let err = AnnouncementType::try_from(1).unwrap_err();
        assert_eq!(err, AnnouncementDecodeError::UnknownType(1));
        assert!(AnnouncementType::try_from(7).is_err());
        assert!(AnnouncementType::try_from(112).is_err());
    }

    #[test]
    fn test_reply_serializes_flat_camel_case() {
        let announcement = Announcement::Reply {
            from_id: "614".to_string(),
            content_hash: "0xabc".to_string(),
            in_reply_to: "dsnp://614/0xdef".to_string(),
            url: "https://ipfs.example/bafy".to_string(),
        };
        let value = serde_json::to_value(&announcement).unwrap();
        assert_eq!(value["announcementType"], 3);
        assert_eq!(value["fromId"], "614");
        assert_eq!(value["inReplyTo"], "dsnp://614/0xdef");
        // Fields from other variants are absent, not null.
        assert!(value.get("emoji").is_none());
        assert!(value.get("targetContentHash").is_none());
    }

    #[test]
    fn test_broadcast_and_profile_distinguished_by_discriminant() {
        // Same field shape, different discriminants.
        let json = r#"{"announcementType":5,"fromId":"9","contentHash":"0x1","url":"u"}"#;
        let announcement: Announcement = serde_json::from_str(json).unwrap();
        assert!(matches!(announcement, Announcement::Profile { .. }));

        let json = r#"{"announcementType":2,"fromId":"9","contentHash":"0x1","url":"u"}"#;
        let announcement: Announcement = serde_json::from_str(json).unwrap();
        assert!(matches!(announcement, Announcement::Broadcast { .. }));
    }

    #[test]
    fn test_missing_variant_field_rejected() {
        let json = r#"{"announcementType":4,"fromId":"9","emoji":"🎉","inReplyTo":"x"}"#;
        let err = serde_json::from_str::<Announcement>(json).unwrap_err();
        assert!(err.to_string().contains("apply"));
    }

    #[test]
    fn test_response_round_trip() {
        let response = AnnouncementResponse {
            request_id: Some("req-1".to_string()),
            webhook_url: None,
            schema_id: 16_001,
            block_number: 1_234,
            announcement: Announcement::Tombstone {
                from_id: "614".to_string(),
                target_announcement_type: 2,
                target_content_hash: "0xdead".to_string(),
            },
        };
        let encoded = serde_json::to_vec(&response).unwrap();
        let decoded: AnnouncementResponse = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(decoded, response);

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["schemaId"], 16_001);
        assert_eq!(value["blockNumber"], 1_234);
        assert!(value.get("webhookUrl").is_none());
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            Announcement::PublicFollows {
                from_id: "1".to_string()
            }
            .category(),
            "public_follows"
        );
        assert_eq!(AnnouncementType::Broadcast.category(), "broadcast");
    }
}
