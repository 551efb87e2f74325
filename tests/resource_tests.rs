mod common;

use common::{builder, client, json_body, MockTransport};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use vagrant_cloud::{
    auth::{Auth, HcpConfig, HcpToken, TOKEN_EXPIRY_PADDING},
    boxes::{BoxError, BoxRef, Version},
    client::ClientError,
    instrumentor::{Collection, EventMatcher, REDACTED},
    Error, ErrorKind, Organization,
};

#[tokio::test]
async fn test_create_box_issues_single_create_call() {
    let transport = MockTransport::new();
    let mut organization = Organization::new(client(transport.clone()), "hashicorp").unwrap();
    let created = organization.add_box("precise64").unwrap();
    assert!(created.dirty());
    assert!(!created.exist());

    transport.push_json(
        201,
        json!({"created_at": "2024-01-01T00:00:00Z", "name": "precise64"}),
    );
    organization.save().await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(transport.calls(), vec!["post /api/v1/boxes"]);
    assert_eq!(
        json_body(&requests[0]),
        json!({"username": "hashicorp", "name": "precise64"})
    );

    let saved = organization.get_box("precise64").unwrap();
    assert!(saved.exist());
    assert!(!saved.dirty());
}

#[tokio::test]
async fn test_save_cascades_down_the_tree() {
    let transport = MockTransport::new();
    let mut organization = Organization::new(client(transport.clone()), "hashicorp").unwrap();

    let created = organization.add_box("precise64").unwrap();
    created.set_short_description("Ubuntu 12.04");
    let version = created.add_version("1.0.0").await.unwrap();
    version.set_description("First release");
    let provider = version.add_provider("virtualbox", None).unwrap();
    provider.set_url("https://example.com/precise64.box");

    // responses echo the saved attributes, as the service does
    transport.push_json(
        201,
        json!({"created_at": "NOW", "name": "precise64", "short_description": "Ubuntu 12.04"}),
    );
    transport.push_json(
        201,
        json!({"created_at": "NOW", "version": "1.0.0", "description": "First release"}),
    );
    transport.push_json(
        201,
        json!({"created_at": "NOW", "name": "virtualbox", "url": "https://example.com/precise64.box"}),
    );
    organization.save().await.unwrap();

    assert_eq!(
        transport.calls(),
        vec![
            "post /api/v1/boxes",
            "post /api/v1/box/hashicorp/precise64/versions",
            "post /api/v1/box/hashicorp/precise64/version/1.0.0/providers",
        ]
    );
    let requests = transport.requests();
    assert_eq!(json_body(&requests[0])["short_description"], "Ubuntu 12.04");
    assert_eq!(
        json_body(&requests[1]),
        json!({"version": {"version": "1.0.0", "description": "First release"}})
    );
    assert_eq!(
        json_body(&requests[2]),
        json!({"provider": {"name": "virtualbox", "url": "https://example.com/precise64.box"}})
    );

    let saved = organization.get_box("precise64").unwrap();
    assert!(!saved.dirty_deep());

    // nothing left to send
    organization.save().await.unwrap();
    assert_eq!(transport.requests().len(), 3);
}

#[tokio::test]
async fn test_duplicate_children_are_rejected() {
    let transport = MockTransport::new();
    let mut organization = Organization::new(client(transport.clone()), "hashicorp").unwrap();
    organization.add_box("precise64").unwrap();

    let err = organization.add_box("precise64").unwrap_err();
    assert!(matches!(err, Error::Resource(BoxError::BoxExists { .. })));
    assert_eq!(organization.boxes().len(), 1);

    let vagrant_box = organization.get_box_mut("precise64").unwrap();
    vagrant_box.add_version("1.0.0").await.unwrap();
    let err = vagrant_box.add_version("1.0.0").await.unwrap_err();
    assert!(matches!(err, Error::Resource(BoxError::VersionExists { .. })));
    assert_eq!(vagrant_box.loaded_versions().len(), 1);

    let version = vagrant_box.version_mut("1.0.0").unwrap();
    version.add_provider("virtualbox", Some("amd64")).unwrap();
    version.add_provider("virtualbox", Some("arm64")).unwrap();
    let err = version.add_provider("virtualbox", Some("amd64")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(version.providers().len(), 2);

    // a never saved box needs no requests for any of this
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_version_release_state_machine() {
    let transport = MockTransport::new();
    let client = client(transport.clone());
    let box_ref = BoxRef {
        username: "hashicorp".to_string(),
        name: "precise64".to_string(),
    };

    let mut fresh = Version::new(client.clone(), box_ref.clone(), "0.1.0").unwrap();
    let err = fresh.release().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
    assert!(transport.requests().is_empty());

    let mut version = Version::load(
        client,
        box_ref,
        &json!({"version": "1.0.0", "created_at": "NOW", "status": "unreleased"}),
    )
    .unwrap();
    assert!(!version.released());
    assert!(version.revoke().await.is_err());

    transport.push_json(200, json!({"version": "1.0.0", "status": "active"}));
    version.release().await.unwrap();
    assert!(version.released());
    assert_eq!(version.status(), Some("active"));
    assert_eq!(
        transport.calls(),
        vec!["put /api/v1/box/hashicorp/precise64/version/1.0.0/release"]
    );

    let err = version.release().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Resource(BoxError::VersionStatusChange { .. })
    ));

    transport.push_json(200, json!({"version": "1.0.0", "status": "inactive"}));
    version.revoke().await.unwrap();
    assert!(!version.released());
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn test_get_retries_transient_failures() {
    let transport = MockTransport::new();
    let collection = Arc::new(Collection::empty());
    let retries = Arc::new(Mutex::new(0));
    let counter = retries.clone();
    collection.subscribe(EventMatcher::exact("request.retry"), move |_, _| {
        *counter.lock().unwrap() += 1;
    });
    let client = builder(transport.clone())
        .auth(Auth::with_token("integration-token"))
        .retry_count(3)
        .instrumentor(collection)
        .build()
        .unwrap();

    transport.push_failure("connection reset");
    transport.push_failure("connection reset");
    transport.push_json(200, json!({"username": "hashicorp", "name": "precise64"}));

    let body = client.box_get("hashicorp", "precise64").await.unwrap();
    assert_eq!(body["name"], "precise64");
    assert_eq!(transport.requests().len(), 3);
    assert_eq!(*retries.lock().unwrap(), 2);

    // the request identifier survives retries
    let ids: Vec<_> = transport
        .requests()
        .iter()
        .map(|request| request.header_value("X-Request-Id").map(str::to_string))
        .collect();
    assert!(ids[0].is_some());
    assert!(ids.iter().all(|id| *id == ids[0]));
}

#[tokio::test]
async fn test_post_is_never_retried() {
    let transport = MockTransport::new();
    let client = builder(transport.clone())
        .auth(Auth::with_token("integration-token"))
        .build()
        .unwrap();
    let mut organization = Organization::new(client, "hashicorp").unwrap();
    organization.add_box("precise64").unwrap();

    transport.push_json(503, json!({"errors": ["unavailable"]}));
    let err = organization.save().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Request);
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_request_errors_carry_server_messages() {
    let transport = MockTransport::new();
    for _ in 0..3 {
        transport.push_json(404, json!({"errors": ["Resource not found!"]}));
    }

    let err = client(transport.clone())
        .box_get("hashicorp", "missing")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    match &err {
        ClientError::Request(request) => {
            assert_eq!(request.errors, vec!["Resource not found!".to_string()]);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(transport.requests().len(), 3);
    assert_eq!(Error::from(err).exit_code().code(), 67);
}

#[tokio::test]
async fn test_events_are_redacted() {
    let transport = MockTransport::new();
    let collection = Arc::new(Collection::empty());
    let seen: Arc<Mutex<Vec<(String, Value)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    collection.subscribe(EventMatcher::pattern("request.*").unwrap(), move |name, params| {
        sink.lock()
            .unwrap()
            .push((name.to_string(), Value::Object(params.clone())));
    });
    let client = builder(transport.clone())
        .auth(Auth::with_token("secret-token"))
        .instrumentor(collection)
        .build()
        .unwrap();

    transport.push_json(200, json!({"token": "TOKEN", "token_hash": "HASH", "created_at": "NOW"}));
    client
        .authentication_token_create("hashicorp", "hunter2", None, None)
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    let names: Vec<_> = seen.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["request.request", "request.response"]);

    let request = &seen[0].1;
    assert_eq!(request["headers"]["Authorization"], REDACTED);
    assert_eq!(request["body"]["user"]["password"], REDACTED);
    assert_eq!(request["body"]["user"]["login"], "hashicorp");
    assert!(request["timing"]["duration"].is_number());

    let response = &seen[1].1;
    assert_eq!(response["status"], 200);
    assert_eq!(response["body"]["token"], REDACTED);
}

fn hcp_config() -> HcpConfig {
    HcpConfig {
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        auth_url: "https://auth.example.com".to_string(),
        auth_path: "/oauth2/auth".to_string(),
        token_path: "/oauth2/token".to_string(),
    }
}

#[tokio::test]
async fn test_oauth_token_is_exchanged_once_and_reused() {
    let transport = MockTransport::new();
    let collection = Arc::new(Collection::empty());
    let token_events = Arc::new(Mutex::new(0));
    let counter = token_events.clone();
    collection.subscribe(EventMatcher::exact("auth.token"), move |_, _| {
        *counter.lock().unwrap() += 1;
    });
    let client = builder(transport.clone())
        .auth(Auth::from_config(hcp_config()).unwrap())
        .instrumentor(collection)
        .build()
        .unwrap();

    transport.push_json(200, json!({"access_token": "hcp-token", "expires_in": 3600}));
    client.authentication_token_validate().await.unwrap();
    client.authentication_token_validate().await.unwrap();

    assert_eq!(
        transport.calls(),
        vec![
            "post /oauth2/token",
            "get /api/v1/authenticate",
            "get /api/v1/authenticate"
        ]
    );
    let requests = transport.requests();
    assert!(requests[0]
        .header_value("Authorization")
        .unwrap()
        .starts_with("Basic "));
    assert_eq!(
        requests[2].header_value("Authorization"),
        Some("Bearer hcp-token")
    );
    assert_eq!(*token_events.lock().unwrap(), 2);
}

#[tokio::test]
async fn test_failed_token_exchange_is_an_authentication_error() {
    let transport = MockTransport::new();
    let client = builder(transport.clone())
        .auth(Auth::from_config(hcp_config()).unwrap())
        .build()
        .unwrap();

    transport.push_json(401, json!({"error": "invalid_client"}));
    let err = client.authentication_token_validate().await.unwrap_err();
    assert_eq!(Error::from(err).kind(), ErrorKind::Authentication);
    assert_eq!(transport.requests().len(), 1);
}

#[test]
fn test_token_expiry_padding() {
    let now = 1_700_000_000;
    let almost = HcpToken {
        token: "t".to_string(),
        expires_at: now + TOKEN_EXPIRY_PADDING - 1,
    };
    assert!(almost.is_expired_at(now));

    let valid = HcpToken {
        token: "t".to_string(),
        expires_at: now + TOKEN_EXPIRY_PADDING + 1,
    };
    assert!(!valid.is_expired_at(now));
}

#[tokio::test]
async fn test_connection_lock_without_wait() {
    let transport = MockTransport::new();
    let client = client(transport);
    let other = client.clone();

    let guard = client.connection(true).await.unwrap();
    assert!(matches!(
        other.connection(false).await,
        Err(ClientError::ConnectionLocked)
    ));
    // a client with its own token has its own lock
    assert!(other.with_access_token("other").connection(false).await.is_ok());
    drop(guard);
    assert!(other.connection(false).await.is_ok());
}
