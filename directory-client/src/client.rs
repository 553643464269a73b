//! Typed wrapper over the generated `UserDirectory` client

use std::time::Duration;
use tonic::metadata::MetadataValue;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Streaming};

use directory_service::directory::Role;
use directory_service::middleware::AUTHORIZATION_HEADER;
use directory_service::proto::{
    user_directory_client::UserDirectoryClient, GetUserByIdRequest, ListUsersRequest, UserDetail,
    UserSummary,
};

use crate::error::ClientError;
use crate::token::TokenSource;

/// Connection settings
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL shared by gRPC and the token endpoint
    pub server: String,
    /// Group id sent with list and stream requests
    pub group_id: i32,
    /// Per-call deadline; calls are unbounded when unset
    pub timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            server: "http://localhost:5001".to_string(),
            group_id: 1,
            timeout: None,
        }
    }
}

/// Directory client
pub struct DirectoryClient {
    inner: UserDirectoryClient<Channel>,
    tokens: TokenSource,
    group_id: i32,
}

impl DirectoryClient {
    /// Connect to the directory server
    pub async fn connect(options: &ClientOptions) -> Result<Self, ClientError> {
        let mut endpoint = Endpoint::from_shared(options.server.clone())?;
        if let Some(timeout) = options.timeout {
            endpoint = endpoint.timeout(timeout).connect_timeout(timeout);
        }

        let channel = endpoint.connect().await?;
        tracing::debug!(server = %options.server, "Connected to directory server");

        Ok(Self {
            inner: UserDirectoryClient::new(channel),
            tokens: TokenSource::new(&options.server, options.timeout)?,
            group_id: options.group_id,
        })
    }

    /// Every user in one response
    pub async fn list_users(&mut self) -> Result<Vec<UserSummary>, ClientError> {
        let request = Request::new(ListUsersRequest {
            group_id: self.group_id,
        });
        let response = self.inner.list_users(request).await?;
        Ok(response.into_inner().users)
    }

    /// Users one at a time, as the server paces them
    pub async fn stream_users(&mut self) -> Result<Streaming<UserSummary>, ClientError> {
        let request = Request::new(ListUsersRequest {
            group_id: self.group_id,
        });
        let response = self.inner.stream_users(request).await?;
        Ok(response.into_inner())
    }

    /// Fetch a fresh token and look up a single user
    pub async fn get_user_by_id(&mut self, user_id: i32) -> Result<UserDetail, ClientError> {
        let token = self.tokens.fetch().await?;

        let mut request = Request::new(GetUserByIdRequest { user_id });
        let value = MetadataValue::try_from(format!("Bearer {}", token))?;
        request.metadata_mut().insert(AUTHORIZATION_HEADER, value);

        let response = self.inner.get_user_by_id(request).await?;
        Ok(response.into_inner())
    }
}

/// Directory line: `id - first surname - email - Role|membership`
pub fn format_summary(user: &UserSummary) -> String {
    format!(
        "{} - {} {} - {} - {}|{}",
        user.id,
        user.first_name,
        user.surname,
        user.email_address,
        Role::from(user.role()),
        user.membership_id
    )
}

/// Detail line: `id - first surname - email`
pub fn format_detail(user: &UserDetail) -> String {
    format!(
        "{} - {} {} - {}",
        user.id, user.first_name, user.surname, user.email_address
    )
}
