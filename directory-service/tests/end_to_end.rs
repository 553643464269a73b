//! Runs the real server on an ephemeral port and drives it over the wire

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use directory_service::prelude::*;
use directory_service::proto::{
    user_directory_client::UserDirectoryClient, GetUserByIdRequest, ListUsersRequest,
};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tonic::metadata::MetadataValue;
use tonic::transport::Channel;
use tonic::{Code, Request};

const SEED: u64 = 2024;

struct TestServer {
    addr: SocketAddr,
    key: SigningKey,
    shutdown: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<Result<()>>,
}

impl TestServer {
    async fn start() -> Self {
        let key_hex: String = (0..32).map(|i| format!("{:02x}", i * 7 + 1)).collect();

        let mut config = Config::default();
        config.service.host = "127.0.0.1".to_string();
        config.directory.seed = Some(SEED);
        config.auth.signing_key = Some(key_hex.clone());

        let key = SigningKey::from_config(&config.auth).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();

        let server = DirectoryServer::new(config).unwrap();
        let handle = tokio::spawn(async move {
            server
                .serve_with_listener(listener, async {
                    let _ = rx.await;
                })
                .await
        });

        Self {
            addr,
            key,
            shutdown: Some(tx),
            handle,
        }
    }

    fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    async fn client(&self) -> UserDirectoryClient<Channel> {
        UserDirectoryClient::connect(self.url()).await.unwrap()
    }

    async fn fetch_token(&self) -> String {
        reqwest::get(format!("{}/jwt", self.url()))
            .await
            .unwrap()
            .error_for_status()
            .unwrap()
            .text()
            .await
            .unwrap()
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match tokio::time::timeout(Duration::from_secs(5), self.handle).await {
            Ok(joined) => joined.unwrap().unwrap(),
            Err(_) => panic!("server did not shut down"),
        }
    }
}

fn lookup(user_id: i32, token: Option<&str>) -> Request<GetUserByIdRequest> {
    lookup_with_scheme(user_id, "Bearer", token)
}

fn lookup_with_scheme(
    user_id: i32,
    scheme: &str,
    token: Option<&str>,
) -> Request<GetUserByIdRequest> {
    let mut request = Request::new(GetUserByIdRequest { user_id });
    if let Some(token) = token {
        request.metadata_mut().insert(
            "authorization",
            MetadataValue::try_from(format!("{} {}", scheme, token)).unwrap(),
        );
    }
    request
}

#[tokio::test]
async fn test_list_and_stream_agree() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    let listed = client
        .list_users(ListUsersRequest { group_id: 1 })
        .await
        .unwrap()
        .into_inner()
        .users;
    let ids: Vec<i32> = listed.iter().map(|u| u.id).collect();
    assert_eq!(ids, (1..=10).collect::<Vec<_>>());

    let start = Instant::now();
    let mut stream = client
        .stream_users(ListUsersRequest { group_id: 1 })
        .await
        .unwrap()
        .into_inner();
    let mut streamed = Vec::new();
    while let Some(user) = stream.message().await.unwrap() {
        streamed.push(user);
    }

    assert_eq!(listed, streamed);
    // one 100ms pause before each of the ten items
    assert!(start.elapsed() >= Duration::from_millis(1000));

    drop(client);
    server.stop().await;
}

#[tokio::test]
async fn test_lookup_with_fresh_token() {
    let server = TestServer::start().await;
    let mut client = server.client().await;
    let token = server.fetch_token().await;

    let detail = client
        .get_user_by_id(lookup(3, Some(&token)))
        .await
        .unwrap()
        .into_inner();

    let expected = &DirectoryFixture::generate(10, SEED)[2];
    assert_eq!(detail.id, 3);
    assert_eq!(detail.first_name, expected.first_name);
    assert_eq!(detail.surname, expected.surname);
    assert_eq!(detail.email_address, expected.email_address);

    drop(client);
    server.stop().await;
}

#[tokio::test]
async fn test_bearer_scheme_is_case_insensitive() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    for scheme in ["bearer", "BEARER"] {
        let token = server.fetch_token().await;
        let detail = client
            .get_user_by_id(lookup_with_scheme(3, scheme, Some(&token)))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(detail.id, 3);
    }

    let token = server.fetch_token().await;
    let status = client
        .get_user_by_id(lookup_with_scheme(3, "Basic", Some(&token)))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);

    drop(client);
    server.stop().await;
}

#[tokio::test]
async fn test_lookup_errors() {
    let server = TestServer::start().await;
    let mut client = server.client().await;
    let token = server.fetch_token().await;

    let status = client
        .get_user_by_id(lookup(0, Some(&token)))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(status.message(), "User ID cannot be less than 1");

    let status = client
        .get_user_by_id(lookup(11, Some(&token)))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::NotFound);
    assert_eq!(status.message(), "User with ID 11 could not be found");

    drop(client);
    server.stop().await;
}

#[tokio::test]
async fn test_lookup_requires_valid_token() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    let status = client.get_user_by_id(lookup(3, None)).await.unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);

    // rejected before argument validation
    let status = client.get_user_by_id(lookup(0, None)).await.unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);

    let status = client
        .get_user_by_id(lookup(3, Some("not.a.token")))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);

    let foreign = TokenIssuer::new(&SigningKey::generate()).issue().unwrap();
    let status = client
        .get_user_by_id(lookup(3, Some(&foreign)))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);

    let expired = TokenIssuer::new(&server.key)
        .issue_at(chrono::Utc::now().timestamp() - 61)
        .unwrap();
    let status = client
        .get_user_by_id(lookup(3, Some(&expired)))
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unauthenticated);

    // still inside the 60s window
    let recent = TokenIssuer::new(&server.key)
        .issue_at(chrono::Utc::now().timestamp() - 30)
        .unwrap();
    assert!(client.get_user_by_id(lookup(3, Some(&recent))).await.is_ok());

    drop(client);
    server.stop().await;
}

#[tokio::test]
async fn test_http_side_channel() {
    let server = TestServer::start().await;

    let token = server.fetch_token().await;
    let claims = JwtAuth::new(&server.key).validate_token(&token).unwrap();
    assert_eq!(claims.exp - claims.iat, 60);

    let response = reqwest::get(format!("{}/", server.url())).await.unwrap();
    assert!(response.status().is_success());
    assert!(response.text().await.unwrap().contains("gRPC client"));

    server.stop().await;
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = TestServer::start().await;

    let response = reqwest::Client::new()
        .get(format!("{}/jwt", server.url()))
        .header("x-request-id", "e2e-42")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "e2e-42");

    server.stop().await;
}
