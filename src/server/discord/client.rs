use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, RequestBuilder, Response};

use crate::server::{
    discord::{
        dto::{
            ApiErrorDto, ChannelDto, CreateDirectMessageChannelDto, CreateMessageDto, GuildDto,
            MemberDto,
        },
        Guild, GuildGateway, Member,
    },
    error::external::ExternalError,
};

const AUDIT_LOG_REASON: &str = "X-Audit-Log-Reason";

const MANAGE_ROLES: &str = "Manage Roles";
const VIEW_GUILD: &str = "View Server";
const SEND_MESSAGES: &str = "Send Messages";

/// Deadline for a single platform request unless configured otherwise.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// REST client for the guild platform, authenticated with a bot token.
#[derive(Clone)]
pub struct DiscordClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl DiscordClient {
    /// Creates a new instance of [`DiscordClient`]
    ///
    /// # Arguments
    /// - `base_url` - API base URL including the version segment, e.g. `https://discord.com/api/v10`
    /// - `token` - Bot token sent as `Authorization: Bot <token>`
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, ExternalError> {
        Self::with_timeout(base_url, token, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Creates a client whose requests fail as transient once `timeout` elapses
    pub fn with_timeout(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ExternalError> {
        let base_url: String = base_url.into();
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(AUTHORIZATION, format!("Bot {}", self.token))
    }

    /// Passes successful responses through and classifies failed ones
    async fn check(
        response: Response,
        capability: &'static str,
    ) -> Result<Response, ExternalError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<ApiErrorDto>(&body) {
            Ok(error) => (error.code, error.message.unwrap_or(body)),
            Err(_) => (None, body),
        };

        Err(ExternalError::classify(
            status.as_u16(),
            code,
            message,
            capability,
        ))
    }

    async fn change_role(
        &self,
        request: RequestBuilder,
        reason: &str,
    ) -> Result<(), ExternalError> {
        let response = self
            .authorize(request)
            .header(AUDIT_LOG_REASON, reason)
            .send()
            .await?;

        Self::check(response, MANAGE_ROLES).await?;

        Ok(())
    }

    fn role_path(guild_id: i64, user_id: i64, role_id: i64) -> String {
        format!("/guilds/{}/members/{}/roles/{}", guild_id, user_id, role_id)
    }
}

#[async_trait]
impl GuildGateway for DiscordClient {
    async fn fetch_guild(&self, guild_id: i64) -> Result<Option<Guild>, ExternalError> {
        let request = self.http.get(self.url(&format!("/guilds/{}", guild_id)));
        let response = self.authorize(request).send().await?;

        match Self::check(response, VIEW_GUILD).await {
            Ok(response) => {
                let guild: GuildDto = response.json().await?;
                Ok(Some(Guild::try_from(guild)?))
            }
            Err(e) if e.is_missing() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn fetch_member(
        &self,
        guild_id: i64,
        user_id: i64,
    ) -> Result<Option<Member>, ExternalError> {
        let request = self
            .http
            .get(self.url(&format!("/guilds/{}/members/{}", guild_id, user_id)));
        let response = self.authorize(request).send().await?;

        match Self::check(response, VIEW_GUILD).await {
            Ok(response) => {
                let member: MemberDto = response.json().await?;
                Ok(Some(member.into_member(guild_id, user_id)?))
            }
            Err(e) if e.is_missing() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn add_role(
        &self,
        guild_id: i64,
        user_id: i64,
        role_id: i64,
        reason: &str,
    ) -> Result<(), ExternalError> {
        let request = self
            .http
            .put(self.url(&Self::role_path(guild_id, user_id, role_id)));

        self.change_role(request, reason).await
    }

    async fn remove_role(
        &self,
        guild_id: i64,
        user_id: i64,
        role_id: i64,
        reason: &str,
    ) -> Result<(), ExternalError> {
        let request = self
            .http
            .delete(self.url(&Self::role_path(guild_id, user_id, role_id)));

        self.change_role(request, reason).await
    }

    async fn send_direct_message(&self, user_id: i64, content: &str) -> Result<(), ExternalError> {
        let request = self
            .http
            .post(self.url("/users/@me/channels"))
            .json(&CreateDirectMessageChannelDto {
                recipient_id: user_id.to_string(),
            });
        let response = self.authorize(request).send().await?;
        let channel: ChannelDto = Self::check(response, SEND_MESSAGES)
            .await?
            .json()
            .await?;

        let request = self
            .http
            .post(self.url(&format!("/channels/{}/messages", channel.id)))
            .json(&CreateMessageDto { content });
        let response = self.authorize(request).send().await?;

        Self::check(response, SEND_MESSAGES).await?;

        Ok(())
    }
}
