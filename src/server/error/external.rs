//! Guild platform failure classification.
//!
//! Every failed platform request is classified by its JSON error code first, then by HTTP
//! status. Codes follow the platform's documented JSON error codes.

use thiserror::Error;

/// Unknown Channel
pub const UNKNOWN_CHANNEL: i64 = 10003;
/// Unknown Guild
pub const UNKNOWN_GUILD: i64 = 10004;
/// Unknown Member
pub const UNKNOWN_MEMBER: i64 = 10007;
/// Unknown Role
pub const UNKNOWN_ROLE: i64 = 10011;
/// Unknown User
pub const UNKNOWN_USER: i64 = 10013;
/// Missing Access
pub const MISSING_ACCESS: i64 = 50001;
/// Cannot send messages to this user
pub const CANNOT_SEND_DM: i64 = 50007;
/// Missing Permissions
pub const MISSING_PERMISSIONS: i64 = 50013;

/// Platform resource that can vanish between a license being issued and used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalResource {
    Guild,
    Member,
    Role,
    User,
    Channel,
}

impl std::fmt::Display for ExternalResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Guild => "guild",
            Self::Member => "member",
            Self::Role => "role",
            Self::User => "user",
            Self::Channel => "channel",
        };

        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum ExternalError {
    #[error("The {0} no longer exists")]
    ResourceMissing(ExternalResource),
    #[error("Missing the `{capability}` permission")]
    PermissionDenied { capability: &'static str },
    #[error("The user does not accept direct messages")]
    DirectMessagesClosed,
    #[error("Guild platform is temporarily unavailable: {0}")]
    Transient(String),
    #[error("Guild platform returned an unexpected payload: {0}")]
    MalformedResponse(String),
    #[error("Guild platform request failed with status {status}: {message}")]
    Other {
        status: u16,
        code: Option<i64>,
        message: String,
    },
}

impl ExternalError {
    /// Classify a failed platform response.
    ///
    /// # Arguments
    /// - `status` - HTTP status of the response
    /// - `code` - Platform JSON error code, when the body carried one
    /// - `message` - Platform error message or raw body
    /// - `capability` - Permission the request needs, reported on permission failures
    pub fn classify(
        status: u16,
        code: Option<i64>,
        message: String,
        capability: &'static str,
    ) -> Self {
        match code {
            Some(UNKNOWN_GUILD) => return Self::ResourceMissing(ExternalResource::Guild),
            Some(UNKNOWN_MEMBER) => return Self::ResourceMissing(ExternalResource::Member),
            Some(UNKNOWN_ROLE) => return Self::ResourceMissing(ExternalResource::Role),
            Some(UNKNOWN_USER) => return Self::ResourceMissing(ExternalResource::User),
            Some(UNKNOWN_CHANNEL) => return Self::ResourceMissing(ExternalResource::Channel),
            Some(MISSING_PERMISSIONS) | Some(MISSING_ACCESS) => {
                return Self::PermissionDenied { capability }
            }
            Some(CANNOT_SEND_DM) => return Self::DirectMessagesClosed,
            _ => {}
        }

        // A 404 without an unknown-resource code is an unknown route, not a missing resource
        match status {
            403 => Self::PermissionDenied { capability },
            429 => Self::Transient(message),
            s if s >= 500 => Self::Transient(message),
            _ => Self::Other {
                status,
                code,
                message,
            },
        }
    }

    /// Whether the failure means the targeted resource is gone.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::ResourceMissing(_))
    }
}

impl From<reqwest::Error> for ExternalError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::MalformedResponse(err.to_string());
        }

        match err.status() {
            Some(status) if status.is_server_error() => Self::Transient(err.to_string()),
            Some(status) => Self::Other {
                status: status.as_u16(),
                code: None,
                message: err.to_string(),
            },
            // Connection, timeout, and other transport failures
            None => Self::Transient(err.to_string()),
        }
    }
}
