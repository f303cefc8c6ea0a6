//! Integration tests for the portfolio client against a mock backend

use portfolio_client::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer, probe_timeout_ms: u64) -> ClientConfig {
    ClientConfig::builder()
        .base_url(server.uri())
        .probe_timeout_ms(probe_timeout_ms)
        .build()
        .unwrap()
}

async fn mount_health(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(template)
        .mount(server)
        .await;
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.unwrap_or_default().len()
}

fn valid_form() -> ContactForm {
    ContactForm::new("A", "a@b.com", "S", "M")
}

#[tokio::test]
async fn test_probe_success_routes_online() {
    let server = MockServer::start().await;
    mount_health(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({"status": "ok", "message": "up"})),
    )
    .await;

    let client = PortfolioClient::connect(&config_for(&server, 1000), Arc::new(MemoryStore::new()))
        .await
        .unwrap();
    assert!(client.is_enabled());

    let health = client.health_check().await.unwrap();
    assert_eq!(health.live(), Some(json!({"status": "ok", "message": "up"})));
}

#[tokio::test]
async fn test_probe_non_success_routes_offline() {
    let server = MockServer::start().await;
    mount_health(&server, ResponseTemplate::new(503)).await;

    let client = PortfolioClient::connect(&config_for(&server, 1000), Arc::new(MemoryStore::new()))
        .await
        .unwrap();
    assert!(!client.is_enabled());

    let before = request_count(&server).await;
    assert!(client.health_check().await.unwrap().is_offline());
    assert!(client.get_portfolio_data().await.unwrap().is_offline());
    assert!(client
        .track_event(&AnalyticsEvent::page_view("/"))
        .await
        .unwrap()
        .is_offline());
    assert_eq!(request_count(&server).await, before);
}

#[tokio::test]
async fn test_probe_timeout_routes_offline() {
    let server = MockServer::start().await;
    mount_health(
        &server,
        ResponseTemplate::new(200).set_delay(Duration::from_millis(500)),
    )
    .await;

    let started = std::time::Instant::now();
    let client = PortfolioClient::connect(&config_for(&server, 50), Arc::new(MemoryStore::new()))
        .await
        .unwrap();
    assert!(started.elapsed() < Duration::from_millis(450));
    assert!(!client.is_enabled());

    let receipt = client.submit_contact(&valid_form()).await.unwrap();
    assert!(receipt.is_saved_offline());
}

#[tokio::test]
async fn test_invalid_email_makes_no_requests_when_online() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/contact"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(0)
        .mount(&server)
        .await;

    let client = PortfolioClient::new(
        &config_for(&server, 1000),
        Availability::online(),
        Arc::new(MemoryStore::new()),
    )
    .unwrap();

    let err = client
        .submit_contact(&ContactForm::new("A", "bad-email", "S", "M"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_empty_fields_rejected_in_both_modes() {
    let server = MockServer::start().await;
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

    for availability in [Availability::online(), Availability::offline()] {
        let client =
            PortfolioClient::new(&config_for(&server, 1000), availability, store.clone()).unwrap();
        for form in [
            ContactForm::new("", "a@b.com", "S", "M"),
            ContactForm::new("A", "", "S", "M"),
            ContactForm::new("A", "a@b.com", "", "M"),
            ContactForm::new("A", "a@b.com", "S", ""),
        ] {
            let err = client.submit_contact(&form).await.unwrap_err();
            assert!(err.is_user_error(), "{:?} should be rejected", form);
        }
        assert!(client.submissions().entries().unwrap().is_empty());
    }
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_offline_submissions_persist_in_order() {
    let dir = TempDir::new().unwrap();
    let config = ClientConfig::builder()
        .data_dir(dir.path())
        .build()
        .unwrap();
    let store = Arc::new(FileStore::new(config.data_dir.clone()));
    let client = PortfolioClient::new(&config, Availability::offline(), store).unwrap();

    for i in 0..5 {
        let form = ContactForm::new(format!("visitor-{}", i), "a@b.com", "S", "M");
        let receipt = client.submit_contact(&form).await.unwrap();
        assert_eq!(receipt, ContactReceipt::SavedOffline { entries: i + 1 });
    }

    // A fresh store over the same directory sees the same log
    let reopened = SubmissionLog::new(
        Arc::new(FileStore::new(dir.path())),
        config.storage_key.clone(),
    );
    let entries = reopened.entries().unwrap();
    assert_eq!(entries.len(), 5);
    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(entry.name, format!("visitor-{}", i));
        assert!(entry.submitted_at().is_some());
    }
    assert!(dir.path().join("chinemerem_offline_contacts.json").exists());
}

async fn submit_concurrently(client: Arc<PortfolioClient>, count: usize) {
    let tasks: Vec<_> = (0..count)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                let form = ContactForm::new(format!("visitor-{}", i), "a@b.com", "S", "M");
                client.submit_contact(&form).await
            })
        })
        .collect();

    for task in tasks {
        let receipt = task.await.unwrap().unwrap();
        assert!(receipt.is_saved_offline());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_offline_submissions_are_all_kept() {
    const SUBMISSIONS: usize = 50;

    let dir = TempDir::new().unwrap();
    let config = ClientConfig::builder()
        .data_dir(dir.path())
        .build()
        .unwrap();
    let file_client = Arc::new(
        PortfolioClient::new(
            &config,
            Availability::offline(),
            Arc::new(FileStore::new(config.data_dir.clone())),
        )
        .unwrap(),
    );
    submit_concurrently(file_client.clone(), SUBMISSIONS).await;
    assert_eq!(file_client.submissions().entries().unwrap().len(), SUBMISSIONS);

    let memory_client = Arc::new(
        PortfolioClient::new(&config, Availability::offline(), Arc::new(MemoryStore::new()))
            .unwrap(),
    );
    submit_concurrently(memory_client.clone(), SUBMISSIONS).await;
    assert_eq!(memory_client.submissions().entries().unwrap().len(), SUBMISSIONS);
}

#[tokio::test]
async fn test_online_contact_returns_body_and_skips_log() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/contact"))
        .and(body_json(json!({
            "name": "A",
            "email": "a@b.com",
            "subject": "S",
            "message": "M"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 123})))
        .expect(1)
        .mount(&server)
        .await;

    let client = PortfolioClient::new(
        &config_for(&server, 1000),
        Availability::online(),
        Arc::new(MemoryStore::new()),
    )
    .unwrap();

    let receipt = client.submit_contact(&valid_form()).await.unwrap();
    assert_eq!(receipt, ContactReceipt::Delivered(json!({"id": 123})));
    assert!(client.submissions().entries().unwrap().is_empty());
}

#[tokio::test]
async fn test_online_failure_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/contact"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"message": "rejected"})))
        .mount(&server)
        .await;

    let client = PortfolioClient::new(
        &config_for(&server, 1000),
        Availability::online(),
        Arc::new(MemoryStore::new()),
    )
    .unwrap();

    match client.submit_contact(&valid_form()).await {
        Err(ClientError::Api { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "rejected");
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_online_failure_without_message_uses_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/portfolio"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = PortfolioClient::new(
        &config_for(&server, 1000),
        Availability::online(),
        Arc::new(MemoryStore::new()),
    )
    .unwrap();

    let err = client.get_portfolio_data().await.unwrap_err();
    assert_eq!(err.to_string(), "API Error 500");
    assert!(err.is_retryable());

    // The best-effort wrapper swallows the same failure
    assert!(matches!(
        client.load_portfolio().await,
        BestEffort::Dropped(ClientError::Api { status: 500, .. })
    ));
}

#[tokio::test]
async fn test_portfolio_data_online() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/portfolio"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "ok", "data": {"projects": ["a", "b"]}})),
        )
        .mount(&server)
        .await;

    let client = PortfolioClient::new(
        &config_for(&server, 1000),
        Availability::online(),
        Arc::new(MemoryStore::new()),
    )
    .unwrap();

    let data = client.load_portfolio().await.delivered().unwrap();
    assert_eq!(data.data(), Some(&json!({"projects": ["a", "b"]})));
}

#[tokio::test]
async fn test_network_failure_surfaces_for_contact_but_not_analytics() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig::builder()
        .base_url(format!("http://{}", addr))
        .build()
        .unwrap();
    let client =
        PortfolioClient::new(&config, Availability::online(), Arc::new(MemoryStore::new())).unwrap();

    let err = client.submit_contact(&valid_form()).await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)));

    let tracked = client.track_page_view("/").await;
    assert!(matches!(tracked, BestEffort::Dropped(ClientError::Network(_))));
}

#[tokio::test]
async fn test_analytics_helpers_post_events() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analytics"))
        .and(body_json(json!({"page": "/projects.html", "action": "project_click: Weather App", "duration": 0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"recorded": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/analytics"))
        .and(body_json(json!({"page": "/about.html", "action": "time_spent", "duration": 30})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"recorded": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = PortfolioClient::new(
        &config_for(&server, 1000),
        Availability::online(),
        Arc::new(MemoryStore::new()),
    )
    .unwrap();

    assert!(client
        .track_project_click("/projects.html", "Weather App")
        .await
        .is_delivered());
    assert!(client.track_time_spent("/about.html", 30).await.is_delivered());
}

#[tokio::test]
async fn test_start_tracks_page_view_when_online() {
    let server = MockServer::start().await;
    mount_health(&server, ResponseTemplate::new(200).set_body_json(json!({"status": "ok"}))).await;
    Mock::given(method("POST"))
        .and(path("/api/analytics"))
        .and(body_json(json!({"page": "/index.html", "action": "page_view", "duration": 0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = PortfolioClient::start(
        &config_for(&server, 1000),
        Arc::new(MemoryStore::new()),
        "/index.html",
    )
    .await
    .unwrap();
    assert!(client.is_enabled());
}

#[tokio::test]
async fn test_beacon_delivers_time_spent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/analytics"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = PortfolioClient::new(
        &config_for(&server, 1000),
        Availability::online(),
        Arc::new(MemoryStore::new()),
    )
    .unwrap();

    let session = PageSession::start("/contact.html");
    let handle = session.finish_with(&client.beacon()).expect("beacon enabled");
    handle.await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: AnalyticsEvent = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body.page, "/contact.html");
    assert_eq!(body.action, "time_spent");
}

#[tokio::test]
async fn test_beacon_failure_is_silent() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig::builder()
        .base_url(format!("http://{}", addr))
        .build()
        .unwrap();
    let client =
        PortfolioClient::new(&config, Availability::online(), Arc::new(MemoryStore::new())).unwrap();

    let handle = client
        .beacon()
        .send(AnalyticsEvent::time_spent("/", 3))
        .unwrap();
    assert!(handle.await.is_ok());
}
