//! `UserDirectory` gRPC service

use futures::{stream, Stream};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tonic::{Request, Response, Status};

use crate::directory::UserSource;
use crate::error::Error;
use crate::middleware::AuthorizationContext;
use crate::proto::{
    user_directory_server::UserDirectory, GetUserByIdRequest, ListUsersRequest, UserDetail,
    UserList, UserSummary,
};

/// Full method path of the bearer-protected lookup
pub const GET_USER_BY_ID_PATH: &str = "/directory.v1.UserDirectory/GetUserById";

/// Stream of users returned by `StreamUsers`
pub type UserSummaryStream = Pin<Box<dyn Stream<Item = Result<UserSummary, Status>> + Send>>;

/// Directory service backed by any [`UserSource`]
#[derive(Debug)]
pub struct DirectoryService<S> {
    source: Arc<S>,
    stream_interval: Duration,
}

impl<S> Clone for DirectoryService<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            stream_interval: self.stream_interval,
        }
    }
}

impl<S: UserSource> DirectoryService<S> {
    /// Create a service that waits `stream_interval` before each streamed user
    pub fn new(source: Arc<S>, stream_interval: Duration) -> Self {
        Self {
            source,
            stream_interval,
        }
    }

    async fn lookup(&self, user_id: i32) -> Result<UserDetail, Error> {
        tracing::info!("Getting user with ID {}", user_id);

        if user_id < 1 {
            return Err(Error::InvalidArgument(
                "User ID cannot be less than 1".to_string(),
            ));
        }

        let user = self.source.get(user_id).await.ok_or_else(|| {
            Error::NotFound(format!("User with ID {} could not be found", user_id))
        })?;

        Ok(UserDetail::from(&user))
    }
}

#[tonic::async_trait]
impl<S: UserSource> UserDirectory for DirectoryService<S> {
    async fn list_users(
        &self,
        request: Request<ListUsersRequest>,
    ) -> Result<Response<UserList>, Status> {
        let group_id = request.into_inner().group_id;
        let users: Vec<UserSummary> = self
            .source
            .list()
            .await
            .iter()
            .map(UserSummary::from)
            .collect();

        tracing::debug!(group_id, count = users.len(), "Listing users");
        Ok(Response::new(UserList { users }))
    }

    type StreamUsersStream = UserSummaryStream;

    async fn stream_users(
        &self,
        request: Request<ListUsersRequest>,
    ) -> Result<Response<Self::StreamUsersStream>, Status> {
        let group_id = request.into_inner().group_id;
        let users = self.source.list().await;
        let interval = self.stream_interval;

        tracing::debug!(group_id, count = users.len(), "Streaming users");

        // One pause before every item, including the first
        let output = stream::unfold(users.into_iter(), move |mut remaining| async move {
            let user = remaining.next()?;
            tokio::time::sleep(interval).await;
            Some((Ok(UserSummary::from(&user)), remaining))
        });

        Ok(Response::new(Box::pin(output)))
    }

    async fn get_user_by_id(
        &self,
        request: Request<GetUserByIdRequest>,
    ) -> Result<Response<UserDetail>, Status> {
        let authorized = request
            .extensions()
            .get::<AuthorizationContext>()
            .map(|ctx| ctx.valid)
            .unwrap_or(false);

        if !authorized {
            return Err(Status::unauthenticated("Missing or invalid bearer token"));
        }

        let detail = self.lookup(request.into_inner().user_id).await?;
        Ok(Response::new(detail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::DirectoryFixture;
    use futures::StreamExt;
    use tokio::time::Instant;
    use tonic::Code;

    fn service() -> DirectoryService<crate::directory::InMemoryDirectory> {
        let directory = DirectoryFixture::new(10, 5).into_directory();
        DirectoryService::new(Arc::new(directory), Duration::from_millis(100))
    }

    fn authorized(user_id: i32) -> Request<GetUserByIdRequest> {
        let mut request = Request::new(GetUserByIdRequest { user_id });
        request
            .extensions_mut()
            .insert(AuthorizationContext { valid: true });
        request
    }

    #[tokio::test]
    async fn test_list_returns_all_users_in_order() {
        let response = service()
            .list_users(Request::new(ListUsersRequest { group_id: 1 }))
            .await
            .unwrap();

        let ids: Vec<i32> = response.into_inner().users.iter().map(|u| u.id).collect();
        assert_eq!(ids, (1..=10).collect::<Vec<_>>());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_paces_every_item() {
        let response = service()
            .stream_users(Request::new(ListUsersRequest { group_id: 1 }))
            .await
            .unwrap();
        let mut stream = response.into_inner();

        let start = Instant::now();
        let mut previous = start;
        let mut ids = Vec::new();
        while let Some(item) = stream.next().await {
            let now = Instant::now();
            assert!(now - previous >= Duration::from_millis(100));
            previous = now;
            ids.push(item.unwrap().id);
        }

        assert_eq!(ids, (1..=10).collect::<Vec<_>>());
        assert!(Instant::now() - start >= Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_stream_matches_list() {
        let svc = service();
        let listed = svc
            .list_users(Request::new(ListUsersRequest { group_id: 1 }))
            .await
            .unwrap()
            .into_inner()
            .users;

        tokio::time::pause();
        let streamed: Vec<UserSummary> = svc
            .stream_users(Request::new(ListUsersRequest { group_id: 1 }))
            .await
            .unwrap()
            .into_inner()
            .map(|item| item.unwrap())
            .collect()
            .await;

        assert_eq!(listed, streamed);
    }

    #[tokio::test]
    async fn test_get_user_by_id() {
        let detail = service()
            .get_user_by_id(authorized(3))
            .await
            .unwrap()
            .into_inner();

        let expected = &DirectoryFixture::generate(10, 5)[2];
        assert_eq!(detail.id, 3);
        assert_eq!(detail.first_name, expected.first_name);
        assert_eq!(detail.surname, expected.surname);
        assert_eq!(detail.email_address, expected.email_address);
    }

    #[tokio::test]
    async fn test_get_user_rejects_ids_below_one() {
        for id in [0, -1, i32::MIN] {
            let status = service().get_user_by_id(authorized(id)).await.unwrap_err();
            assert_eq!(status.code(), Code::InvalidArgument);
            assert_eq!(status.message(), "User ID cannot be less than 1");
        }
    }

    #[tokio::test]
    async fn test_get_user_unknown_id() {
        let status = service().get_user_by_id(authorized(11)).await.unwrap_err();
        assert_eq!(status.code(), Code::NotFound);
        assert_eq!(status.message(), "User with ID 11 could not be found");
    }

    #[tokio::test]
    async fn test_get_user_requires_authorization_context() {
        let status = service()
            .get_user_by_id(Request::new(GetUserByIdRequest { user_id: 3 }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::Unauthenticated);

        // auth is checked before argument validation
        let mut request = Request::new(GetUserByIdRequest { user_id: 0 });
        request
            .extensions_mut()
            .insert(AuthorizationContext { valid: false });
        let status = service().get_user_by_id(request).await.unwrap_err();
        assert_eq!(status.code(), Code::Unauthenticated);
    }
}
