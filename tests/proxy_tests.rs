#![cfg(feature = "proxy")]

use aushadh_ai::config::ModelSettings;
use aushadh_ai::core::photo::PreparedImage;
use aushadh_ai::core::proxy_client::ProxyClient;
use aushadh_ai::server::{router, ProxyState, HEALTH_MESSAGE};
use aushadh_ai::{GeminiClient, PrescriptionAnalyzer};
use httpmock::prelude::*;
use serde_json::json;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

async fn start_proxy(model_server: &MockServer) -> SocketAddr {
    let settings = ModelSettings {
        api_base: model_server.base_url(),
        api_key: Some("server-side-key".to_string()),
        proxy_model: "proxy-vision".to_string(),
        ..Default::default()
    };
    let analyzer = PrescriptionAnalyzer::new(GeminiClient::from_config(&settings).unwrap(), &settings);
    let app = router(ProxyState::new(analyzer), 1024 * 1024);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn photo() -> PreparedImage {
    PreparedImage {
        base64: "/9j/QUJD".to_string(),
        mime_type: "image/jpeg",
        width: 10,
        height: 20,
    }
}

#[tokio::test]
async fn test_client_through_proxy_to_model() {
    let model_server = MockServer::start();
    let model_mock = model_server.mock(|when, then| {
        when.method(POST)
            .path("/v1beta/models/proxy-vision:generateContent")
            .header("x-goog-api-key", "server-side-key")
            .body_contains("\"data\":\"/9j/QUJD\"");
        then.status(200).json_body(json!({
            "candidates": [{"content": {"parts": [{
                "text": "```json\n{\"metadata\": {\"doctor\": \"Dr. Iyer\"}, \"medications\": {\"prescribed_brand\": \"Dolo 650\", \"brand_price_est\": \"₹30\", \"jan_aushadhi_price_est\": \"₹10\"}}\n```"
            }]}}]
        }));
    });

    let addr = start_proxy(&model_server).await;
    let client = ProxyClient::new(&format!("http://{}", addr), Duration::from_secs(5)).unwrap();
    let result = client.analyze(&photo()).await.unwrap();

    model_mock.assert();
    assert_eq!(result.metadata.doctor, "Dr. Iyer");
    assert_eq!(result.medications.len(), 1);
    assert_eq!(result.medications[0].prescribed_brand, "Dolo 650");
    assert_eq!(result.bhashini_summary.en, "Analysis complete.");
}

#[tokio::test]
async fn test_health_and_rate_limit_over_http() {
    let model_server = MockServer::start();
    model_server.mock(|when, then| {
        when.method(POST);
        then.status(429).body("quota");
    });

    let addr = start_proxy(&model_server).await;

    let health = reqwest::get(format!("http://{}/", addr))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(health, HEALTH_MESSAGE);

    let client = ProxyClient::new(&format!("http://{}", addr), Duration::from_secs(5)).unwrap();
    let err = client.analyze(&photo()).await.unwrap_err();
    assert!(err.is_rate_limited());
    assert_eq!(err.user_friendly_message(), "High traffic. Please wait a moment.");
}
