//! Integration tests for the project archive round trip against a mock gateway.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ignition_core::archive::{list_resources, read_resource};
use ignition_core::client::RetryPolicy;
use ignition_core::config::ConnectionProfile;
use ignition_core::perspective::{
    EXTERNAL_ACTOR, ResourceKind, create_resource, delete_resource, update_resource,
};
use ignition_core::{ArchiveError, GatewayClient, GatewayError, with_mutable_project};

mod support;
use support::project_zip::{self, NAMESPACE, view_meta_path, view_path};
use support::socket_guard::start_mock_server_or_skip;

const EXPORT_PATH: &str = "/data/api/v1/projects/export/Plant";
const IMPORT_PATH: &str = "/data/api/v1/projects/import/Plant";

fn client_for(server: &MockServer) -> GatewayClient {
    GatewayClient::new(&ConnectionProfile {
        name: "test".to_string(),
        url: server.uri(),
        token: Some("key:secret".to_string()),
        username: None,
        password: None,
        verify_ssl: true,
        timeout_secs: 5,
    })
    .unwrap()
    .with_retry_policy(RetryPolicy::no_retry())
}

async fn serve_export(server: &MockServer, archive: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(EXPORT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(archive))
        .mount(server)
        .await;
}

async fn accept_imports(server: &MockServer, expected: u64) {
    Mock::given(method("POST"))
        .and(path(IMPORT_PATH))
        .and(query_param("overwrite", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(expected)
        .mount(server)
        .await;
}

/// Body of the single import request the gateway received.
async fn imported_archive(server: &MockServer) -> Vec<u8> {
    let requests = server.received_requests().await.unwrap();
    let imports: Vec<_> = requests
        .into_iter()
        .filter(|request| request.url.path() == IMPORT_PATH)
        .collect();
    assert_eq!(imports.len(), 1, "expected exactly one import");
    imports.into_iter().next().unwrap().body
}

#[tokio::test]
async fn test_reads_never_import() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    serve_export(&server, project_zip::sample_project()).await;
    accept_imports(&server, 0).await;
    let client = client_for(&server);

    let views = list_resources(&client, "Plant", &format!("{NAMESPACE}/views"), "view.json")
        .await
        .unwrap();
    assert_eq!(views, ["Alarms", "Main/Home"]);

    let home = read_resource(&client, "Plant", &view_path("Main/Home"))
        .await
        .unwrap();
    assert_eq!(home["root"]["type"], "ia.container.flex");
}

#[tokio::test]
async fn test_read_missing_and_malformed_entries() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let archive = project_zip::build(&[(view_path("Broken"), "{not json".to_string())]);
    serve_export(&server, archive).await;
    let client = client_for(&server);

    let missing = read_resource(&client, "Plant", &view_path("Nope"))
        .await
        .unwrap_err();
    assert!(matches!(missing, ArchiveError::EntryNotFound { ref path } if path == &view_path("Nope")));

    let malformed = read_resource(&client, "Plant", &view_path("Broken"))
        .await
        .unwrap_err();
    assert!(matches!(malformed, ArchiveError::MalformedJson { .. }));
}

#[tokio::test]
async fn test_create_view_imports_sorted_archive_with_fresh_metadata() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    serve_export(&server, project_zip::sample_project()).await;
    accept_imports(&server, 1).await;
    let client = client_for(&server);

    let payload = json!({"root": {"type": "ia.container.flex", "children": []}});
    with_mutable_project(&client, "Plant", |root| {
        create_resource(root, ResourceKind::View, Some("Main/Overview"), &payload)
    })
    .await
    .unwrap();

    let imported = imported_archive(&server).await;
    assert_eq!(
        project_zip::read_json(&imported, &view_path("Main/Overview")).unwrap(),
        payload
    );
    let meta = project_zip::read_json(&imported, &view_meta_path("Main/Overview")).unwrap();
    assert_eq!(meta["files"], json!(["view.json"]));
    assert_eq!(meta["attributes"]["lastModification"]["actor"], EXTERNAL_ACTOR);

    // Untouched resources ride along unchanged.
    assert!(project_zip::read_json(&imported, &view_path("Alarms")).is_some());

    let names = project_zip::stored_order(&imported);
    let mut sorted = names.clone();
    sorted.sort_by(|a, b| a.split('/').cmp(b.split('/')));
    assert_eq!(names, sorted);
    assert!(names.contains(&format!("{NAMESPACE}/views/Main/Home/thumbnail.png")));
}

#[tokio::test]
async fn test_noop_round_trip_imports_the_export_unchanged() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let exported = project_zip::sample_project();
    serve_export(&server, exported.clone()).await;
    accept_imports(&server, 1).await;
    let client = client_for(&server);

    with_mutable_project(&client, "Plant", |_root| Ok::<_, ArchiveError>(()))
        .await
        .unwrap();

    let imported = imported_archive(&server).await;
    assert_eq!(project_zip::contents(&imported), project_zip::contents(&exported));
}

#[tokio::test]
async fn test_created_view_is_listed_on_next_export() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    serve_export(&server, project_zip::sample_project()).await;
    accept_imports(&server, 1).await;
    let client = client_for(&server);

    with_mutable_project(&client, "Plant", |root| {
        create_resource(root, ResourceKind::View, Some("Main/Overview"), &json!({"root": {}}))
    })
    .await
    .unwrap();

    let imported = imported_archive(&server).await;
    server.reset().await;
    serve_export(&server, imported).await;

    let views = list_resources(&client, "Plant", &format!("{NAMESPACE}/views"), "view.json")
        .await
        .unwrap();
    assert_eq!(views, ["Alarms", "Main/Home", "Main/Overview"]);
}

#[tokio::test]
async fn test_create_existing_view_fails_without_import() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    serve_export(&server, project_zip::sample_project()).await;
    accept_imports(&server, 0).await;
    let client = client_for(&server);

    let err = with_mutable_project(&client, "Plant", |root| {
        create_resource(root, ResourceKind::View, Some("Alarms"), &json!({}))
    })
    .await
    .unwrap_err();
    assert!(matches!(err, ArchiveError::AlreadyExists { ref resource } if resource == "view 'Alarms'"));
}

#[tokio::test]
async fn test_update_refreshes_audit_stamp_only() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    serve_export(&server, project_zip::sample_project()).await;
    accept_imports(&server, 1).await;
    let client = client_for(&server);

    let payload = json!({"root": {"type": "ia.container.column"}});
    with_mutable_project(&client, "Plant", |root| {
        update_resource(root, ResourceKind::View, Some("Main/Home"), &payload)
    })
    .await
    .unwrap();

    let imported = imported_archive(&server).await;
    assert_eq!(
        project_zip::read_json(&imported, &view_path("Main/Home")).unwrap(),
        payload
    );
    let meta = project_zip::read_json(&imported, &view_meta_path("Main/Home")).unwrap();
    assert_eq!(meta["scope"], "G");
    assert_eq!(meta["version"], 1);
    assert_eq!(meta["files"], json!(["view.json", "thumbnail.png"]));
    assert_eq!(meta["attributes"]["lastModificationSignature"], "deadbeef");
    assert_eq!(meta["attributes"]["lastModification"]["actor"], EXTERNAL_ACTOR);
    assert_ne!(
        meta["attributes"]["lastModification"]["timestamp"],
        "2024-01-01T00:00:00Z"
    );
}

#[tokio::test]
async fn test_update_page_config_singleton() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    serve_export(&server, project_zip::sample_project()).await;
    accept_imports(&server, 1).await;
    let client = client_for(&server);

    let config = json!({"pages": {"/": {"viewPath": "Main/Overview"}}});
    with_mutable_project(&client, "Plant", |root| {
        update_resource(root, ResourceKind::PageConfig, None, &config)
    })
    .await
    .unwrap();

    let imported = imported_archive(&server).await;
    let entry = format!("{NAMESPACE}/page-config/config.json");
    assert_eq!(project_zip::read_json(&imported, &entry).unwrap(), config);
}

#[tokio::test]
async fn test_delete_removes_whole_resource_directory() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    serve_export(&server, project_zip::sample_project()).await;
    accept_imports(&server, 1).await;
    let client = client_for(&server);

    with_mutable_project(&client, "Plant", |root| {
        delete_resource(root, ResourceKind::View, "Main/Home")
    })
    .await
    .unwrap();

    let imported = imported_archive(&server).await;
    let names = project_zip::stored_order(&imported);
    assert!(
        names
            .iter()
            .all(|name| !name.starts_with(&format!("{NAMESPACE}/views/Main/Home/"))),
        "leftover entries: {names:?}"
    );
    assert!(names.contains(&view_path("Alarms")));
    assert!(names.contains(&view_meta_path("Alarms")));

    server.reset().await;
    serve_export(&server, imported).await;
    let views = list_resources(&client, "Plant", &format!("{NAMESPACE}/views"), "view.json")
        .await
        .unwrap();
    assert_eq!(views, ["Alarms"]);
}

#[tokio::test]
async fn test_delete_missing_view_fails_without_import() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    serve_export(&server, project_zip::sample_project()).await;
    accept_imports(&server, 0).await;
    let client = client_for(&server);

    let err = with_mutable_project(&client, "Plant", |root| {
        delete_resource(root, ResourceKind::View, "Main/Missing")
    })
    .await
    .unwrap_err();
    assert!(matches!(err, ArchiveError::ResourceNotFound { .. }));
}

#[tokio::test]
async fn test_export_not_found_propagates_gateway_status() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path(EXPORT_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such project"))
        .mount(&server)
        .await;
    accept_imports(&server, 0).await;
    let client = client_for(&server);

    let err = with_mutable_project(&client, "Plant", |_root| Ok::<_, ArchiveError>(()))
        .await
        .unwrap_err();
    assert!(matches!(err, ArchiveError::Gateway(GatewayError::NotFound { .. })));
}

#[tokio::test]
async fn test_zip_slip_entry_aborts_before_mutation() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let archive = project_zip::build(&[
        (view_path("Ok"), "{}".to_string()),
        ("../../outside.json".to_string(), "{}".to_string()),
    ]);
    serve_export(&server, archive).await;
    accept_imports(&server, 0).await;
    let client = client_for(&server);

    let mut mutated = false;
    let err = with_mutable_project(&client, "Plant", |_root| {
        mutated = true;
        Ok::<_, ArchiveError>(())
    })
    .await
    .unwrap_err();
    assert!(matches!(err, ArchiveError::UnsafeEntryPath { .. }));
    assert!(!mutated);
}

#[tokio::test]
async fn test_failed_import_is_reported() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    serve_export(&server, project_zip::sample_project()).await;
    Mock::given(method("POST"))
        .and(path(IMPORT_PATH))
        .respond_with(ResponseTemplate::new(409).set_body_string("project locked"))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server);

    let err = with_mutable_project(&client, "Plant", |root| {
        update_resource(root, ResourceKind::View, Some("Alarms"), &json!({}))
    })
    .await
    .unwrap_err();
    assert!(matches!(err, ArchiveError::Gateway(GatewayError::Conflict { .. })));
}
