use serde_json::json;
use tax_invoice_workflow::config::BackendConfig;
use tax_invoice_workflow::models::{ApprovalStatus, AuthRequest, SearchContext};
use tax_invoice_workflow::{ApiError, HttpBackend, InvoiceBackend};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer) -> HttpBackend {
    let config = BackendConfig {
        base_url: server.uri(),
        timeout_secs: Some(5),
    };
    HttpBackend::from_config(&config).unwrap()
}

#[tokio::test]
async fn search_unwraps_paged_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tax-invoice/search"))
        .and(header("authorization", "Bearer token-1"))
        .and(body_json(json!({ "page": 1, "size": 10 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "code": 200,
            "message": "ok",
            "result": {
                "content": [{
                    "id": 11,
                    "ipBusinessName": "공급상사",
                    "suBusinessName": "수급상사",
                    "createAt": [2025, 3, 9],
                    "imageUrl": "https://files.example/11.png",
                    "status": "APPROVED"
                }],
                "totalPages": 4
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let params = SearchContext::default().search_params(3, 10);
    let page = backend(&server).search_invoices("token-1", &params).await.unwrap();

    assert_eq!(page.total_pages, 4);
    assert_eq!(page.content[0].id, 11);
    assert_eq!(page.content[0].status, ApprovalStatus::Approved);
}

#[tokio::test]
async fn unsigned_confirmation_is_a_typed_401() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/simple/confirm"))
        .and(body_json(json!({ "key": "abc" })))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "message": "signature not completed"
        })))
        .mount(&server)
        .await;

    let err = backend(&server).confirm_auth("t", "abc").await.unwrap_err();

    assert!(err.is_unauthorized());
    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "signature not completed");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn success_false_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/simple"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "code": 4001,
            "message": "invalid phone number"
        })))
        .mount(&server)
        .await;

    let request = AuthRequest {
        login_type_level: 1,
        user_name: "홍길동".into(),
        phone_no: "01012345678".into(),
        identity: "19990101".into(),
        telecom: String::new(),
        tax_invoice_info_list: Vec::new(),
    };
    let err = backend(&server).auth_request("t", &request).await.unwrap_err();

    assert!(matches!(err, ApiError::Rejected { code: Some(4001), .. }));
    assert!(!err.is_unauthorized());
}

#[tokio::test]
async fn auth_request_returns_provider_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/simple"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "result": { "key": "abc" }
        })))
        .mount(&server)
        .await;

    let request = AuthRequest {
        login_type_level: 5,
        user_name: "홍길동".into(),
        phone_no: "01012345678".into(),
        identity: "19990101".into(),
        telecom: "0".into(),
        tax_invoice_info_list: Vec::new(),
    };
    let result = backend(&server).auth_request("t", &request).await.unwrap();
    assert_eq!(result.key.as_deref(), Some("abc"));
}

#[tokio::test]
async fn delete_and_export_send_id_list() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/tax-invoice"))
        .and(body_json(json!({ "taxInvoiceIdList": [3, 5] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/tax-invoice/excel"))
        .and(body_json(json!({ "taxInvoiceIdList": [3] })))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend(&server);
    backend.delete_invoices("t", &[3, 5]).await.unwrap();
    let bytes = backend.export_invoices("t", &[3]).await.unwrap();
    assert_eq!(bytes, b"PK\x03\x04".to_vec());
}

#[tokio::test]
async fn server_errors_keep_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tax-invoice/9"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = backend(&server).approval_detail("t", 9).await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert!(err.to_string().contains("maintenance"));
}
