//! Wire shapes of the platform REST API.
//!
//! Snowflakes travel as strings and are parsed into `i64` when converted to domain types.

use serde::{Deserialize, Serialize};

use crate::server::{
    discord::{Guild, Member},
    error::external::ExternalError,
};

#[derive(Debug, Deserialize)]
pub struct GuildDto {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UserDto {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct MemberDto {
    pub user: Option<UserDto>,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChannelDto {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct CreateDirectMessageChannelDto {
    pub recipient_id: String,
}

#[derive(Debug, Serialize)]
pub struct CreateMessageDto<'a> {
    pub content: &'a str,
}

/// Error body returned with failed requests.
#[derive(Debug, Deserialize)]
pub struct ApiErrorDto {
    pub code: Option<i64>,
    pub message: Option<String>,
}

pub fn parse_snowflake(raw: &str) -> Result<i64, ExternalError> {
    raw.parse()
        .map_err(|_| ExternalError::MalformedResponse(format!("invalid snowflake `{}`", raw)))
}

impl TryFrom<GuildDto> for Guild {
    type Error = ExternalError;

    fn try_from(dto: GuildDto) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_snowflake(&dto.id)?,
            name: dto.name,
        })
    }
}

impl MemberDto {
    /// Converts the payload into a [`Member`], falling back to `user_id` when the payload omits
    /// the user object.
    pub fn into_member(self, guild_id: i64, user_id: i64) -> Result<Member, ExternalError> {
        let (user_id, username) = match self.user {
            Some(user) => (parse_snowflake(&user.id)?, user.username),
            None => (user_id, String::new()),
        };

        let roles = self
            .roles
            .iter()
            .map(|role| parse_snowflake(role))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Member {
            guild_id,
            user_id,
            username,
            roles,
        })
    }
}
