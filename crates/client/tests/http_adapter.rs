use std::{path::PathBuf, sync::Arc, time::Duration};

use grafbase_client::{
    AdapterKind, Client, Context, EndpointOptions, EndpointRegistry, Error, OperationStore, Schema, SchemaError,
    TransportError,
};
use serde_json::{json, Value};
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn map(value: Value) -> Context {
    serde_json::from_value(value).unwrap()
}

fn client(options: EndpointOptions) -> Client {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let registry = Arc::new(EndpointRegistry::new());
    registry.register("metaphysics", options).unwrap();

    let store = OperationStore::new([PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")]);

    Client::builder("Metaphysics", "metaphysics", Arc::new(store), registry)
        .default_context(map(json!({ "headers": { "X-Client": "metaphysics" } })))
        .build()
}

async fn server() -> (MockServer, EndpointOptions) {
    let server = MockServer::start().await;
    let options = EndpointOptions::http(format!("{}/graphql", server.uri()));

    (server, options)
}

#[tokio::test]
async fn posts_graphql_requests() {
    let (server, options) = server().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("content-type", "application/json"))
        .and(header("x-client", "metaphysics"))
        .and(header("authorization", "token ..."))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "artist": { "name": "Yayoi Kusama", "birthday": "1929/03/22" } },
            "extensions": { "cost": 1 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(options);
    assert_eq!(client.endpoint().unwrap().adapter_kind(), AdapterKind::Http);

    let response = client
        .operation("artist")
        .variable("id", "yayoi-kusama")
        .context(map(json!({ "headers": { "Authorization": "token ..." } })))
        .await
        .unwrap();

    assert_eq!(response.data()["artist"]["name"], "Yayoi Kusama");
    assert_eq!(response.extensions()["cost"], 1);
    assert!(response.errors().is_empty());

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();

    insta::assert_json_snapshot!(body, @r###"
    {
      "query": "query Metaphysics__Artist($id: String!) {\n  artist(id: $id) {\n    name\n    bio\n    birthday\n  }\n}",
      "operationName": "Metaphysics__Artist",
      "variables": {
        "id": "yayoi-kusama"
      }
    }
    "###);
}

#[tokio::test]
async fn graphql_errors_are_part_of_the_response() {
    let (server, options) = server().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "artist": null },
            "errors": [{ "message": "Artist not found", "locations": [{ "line": 2, "column": 3 }], "path": ["artist"] }]
        })))
        .mount(&server)
        .await;

    let response = client(options)
        .operation("artist")
        .variable("id", "banksy")
        .await
        .unwrap();

    assert!(!response.is_ok());
    assert_eq!(response.errors()[0].message, "Artist not found");
    assert_eq!(response.errors()[0].locations[0].line, 2);
}

#[tokio::test]
async fn non_success_statuses_fail() {
    let (server, options) = server().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let error = client(options).operation("artwork").await.unwrap_err();

    let Error::Transport {
        operation,
        source: TransportError::Status { status, body, .. },
    } = &error
    else {
        unreachable!("unexpected error: {error}");
    };

    assert_eq!(operation, "Metaphysics__Artwork");
    assert_eq!(status.as_u16(), 502);
    assert_eq!(body, "bad gateway");
}

#[tokio::test]
async fn malformed_responses_fail() {
    let (server, options) = server().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let error = client(options).operation("artwork").await.unwrap_err();

    assert!(
        matches!(error, Error::Transport { source: TransportError::MalformedResponse { .. }, .. }),
        "{error}"
    );
}

#[tokio::test]
async fn json_that_is_not_a_graphql_response_fails() {
    let (server, options) = server().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .mount(&server)
        .await;

    let client = client(options);

    let error = client.operation("artwork").await.unwrap_err();
    assert!(
        matches!(&error, Error::Transport { source: TransportError::MalformedResponse { endpoint, .. }, .. } if endpoint == "metaphysics"),
        "{error}"
    );

    server.reset().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "data": null }])))
        .mount(&server)
        .await;

    let error = client.operation("artwork").await.unwrap_err();
    assert!(
        matches!(error, Error::Transport { source: TransportError::MalformedResponse { .. }, .. }),
        "{error}"
    );
}

#[tokio::test]
async fn slow_endpoints_time_out() {
    let (server, options) = server().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": null }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let error = client(options.with_timeout(Duration::from_millis(50)))
        .operation("artwork")
        .await
        .unwrap_err();

    let Error::Transport {
        source: TransportError::Timeout { endpoint, timeout },
        ..
    } = &error
    else {
        unreachable!("unexpected error: {error}");
    };

    assert_eq!(endpoint, "metaphysics");
    assert_eq!(*timeout, Duration::from_millis(50));
}

#[tokio::test]
async fn a_zero_timeout_waits() {
    let (server, options) = server().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": { "artwork": null } }))
                .set_delay(Duration::from_millis(100)),
        )
        .mount(&server)
        .await;

    let response = client(options.with_timeout(Duration::ZERO).with_pool_size(0))
        .operation("artwork")
        .await
        .unwrap();

    assert_eq!(response.data(), &json!({ "artwork": null }));
}

#[tokio::test]
async fn invalid_headers_are_reported() {
    let (server, options) = server().await;

    let error = client(options)
        .operation("artwork")
        .context(map(json!({ "headers": { "Bad Header": "value" } })))
        .await
        .unwrap_err();

    assert!(
        matches!(&error, Error::Transport { source: TransportError::InvalidHeader { name, .. }, .. } if name == "Bad Header"),
        "{error}"
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn introspects_the_schema_once() {
    let (server, options) = server().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "operationName": "Metaphysics__Introspection" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "__schema": { "queryType": { "name": "Query" }, "types": [] } }
        })))
        .expect(2)
        .mount(&server)
        .await;

    let endpoint = client(options).endpoint().unwrap();

    let schema = endpoint.load_schema().await.unwrap();
    assert_eq!(schema.query_type(), Some("Query"));

    let cached = endpoint.load_schema().await.unwrap();
    assert!(Arc::ptr_eq(&schema, &cached));

    let reloaded = endpoint.reload_schema().await.unwrap();
    assert!(!Arc::ptr_eq(&schema, &reloaded));
    assert_eq!(*schema, *reloaded);
}

#[tokio::test]
async fn introspection_errors_are_reported() {
    let (server, options) = server().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{ "message": "introspection is disabled" }]
        })))
        .mount(&server)
        .await;

    let error = client(options).endpoint().unwrap().load_schema().await.unwrap_err();

    let Error::Schema { endpoint, source } = &error else {
        unreachable!("unexpected error: {error}");
    };

    assert_eq!(endpoint, "metaphysics");
    assert!(matches!(source, SchemaError::Introspection(messages) if messages == &["introspection is disabled"]));
}

#[tokio::test]
async fn schema_files_take_precedence_over_introspection() {
    let (server, options) = server().await;

    let endpoint = client(
        options.with_schema_path(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/schema.json")),
    )
    .endpoint()
    .unwrap();

    let schema = endpoint.load_schema().await.unwrap();

    assert!(matches!(&*schema, Schema::Introspection(_)));
    assert_eq!(schema.query_type(), Some("Query"));
    assert!(server.received_requests().await.unwrap().is_empty());
}
