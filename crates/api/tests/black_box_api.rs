use std::path::Path;
use std::sync::{Arc, Mutex};

use purchreq_api::alert::{AlertError, ErrorNotifier};
use purchreq_api::app::{AppServices, build_app};
use purchreq_api::archive::{ArchiveError, ArchiveSink, LocalArchive, SessionArchive};
use purchreq_auth::{Credentials, SessionStore};
use reqwest::{
    StatusCode,
    header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
    multipart::{Form, Part},
};
use serde_json::json;

const EMAIL: &str = "finance@club.example";
const PASSWORD: &str = "test-password";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(archive_dir: &Path) -> Self {
        Self::start(services(Arc::new(LocalArchive::new(archive_dir)))).await
    }

    async fn start(services: AppServices) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = build_app(services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            base_url,
            client,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/login"))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(format!("email={email}&password={password}"))
            .send()
            .await
            .unwrap()
    }

    /// Log in and return the `Cookie` header value for later requests.
    async fn login(&self) -> String {
        let res = self.post_login(EMAIL, PASSWORD).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        let set_cookie = res.headers()[SET_COOKIE].to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn submit(&self, cookie: &str, form: Form) -> reqwest::Response {
        self.client
            .post(self.url("/submit-all-requests"))
            .header(COOKIE, cookie)
            .multipart(form)
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn services(archive: Arc<dyn ArchiveSink>) -> AppServices {
    AppServices::new(
        Credentials::new(EMAIL, PASSWORD),
        Arc::new(SessionStore::new(chrono::Duration::hours(1))),
        archive,
    )
}

struct UnavailableArchive;

impl ArchiveSink for UnavailableArchive {
    fn folder_link(&self, folder_name: &str) -> String {
        format!("unavailable/{folder_name}")
    }

    fn store(&self, _archive: &SessionArchive) -> Result<(), ArchiveError> {
        Err(ArchiveError::Io {
            path: "unavailable".into(),
            source: std::io::Error::other("disk full"),
        })
    }
}

#[derive(Default)]
struct RecordingNotifier(Mutex<Vec<(String, String)>>);

impl ErrorNotifier for RecordingNotifier {
    fn notify(&self, subject: &str, body: &str) -> Result<(), AlertError> {
        self.0
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string()));
        Ok(())
    }
}

fn file(name: &str, bytes: &[u8]) -> Part {
    Part::bytes(bytes.to_vec()).file_name(name.to_string())
}

/// One HOME invoice: 2 × 10.00 with 2.60 HST.
fn home_invoice(form: Form, slot: u8, vendor: &str) -> Form {
    form.text(format!("vendor_name_{slot}"), vendor.to_string())
        .text(format!("currency_{slot}"), "CAD")
        .text(format!("item_name_{slot}_1"), "Paint")
        .text(format!("item_usage_{slot}_1"), "Set design")
        .text(format!("item_quantity_{slot}_1"), "2")
        .text(format!("item_price_{slot}_1"), "10.00")
        .text(format!("hst_gst_amount_{slot}"), "2.60")
}

#[tokio::test]
async fn health_is_public() {
    let dir = tempfile::tempdir().unwrap();
    let srv = TestServer::spawn(dir.path()).await;

    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let dir = tempfile::tempdir().unwrap();
    let srv = TestServer::spawn(dir.path()).await;

    let res = srv.client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");

    let res = srv
        .client
        .post(srv.url("/submit-all-requests"))
        .header(COOKIE, "purchreq_session=00000000000000000000000000000000")
        .multipart(Form::new().text("name", "x"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bad_credentials_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let srv = TestServer::spawn(dir.path()).await;

    let res = srv.post_login(EMAIL, "wrong").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().get(SET_COOKIE).is_none());
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_credentials");
}

#[tokio::test]
async fn login_session_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let srv = TestServer::spawn(dir.path()).await;

    let res = srv.post_login(EMAIL, PASSWORD).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers()[LOCATION], "/dashboard");
    let set_cookie = res.headers()[SET_COOKIE].to_str().unwrap().to_string();
    assert!(set_cookie.starts_with("purchreq_session="));
    assert!(set_cookie.contains("HttpOnly"));
    let cookie = set_cookie.split(';').next().unwrap().to_string();

    let res = srv
        .client
        .get(srv.url("/whoami"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["email"], EMAIL);

    let res = srv
        .client
        .get(srv.url("/dashboard"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["max_forms"], 10);
    assert_eq!(body["max_items_per_form"], 15);

    let res = srv
        .client
        .get(srv.url("/logout"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers()[LOCATION], "/login");
    assert!(res.headers()[SET_COOKIE].to_str().unwrap().contains("Max-Age=0"));

    let res = srv
        .client
        .get(srv.url("/whoami"))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn preview_reports_breakdown_presentation_and_blocking() {
    let dir = tempfile::tempdir().unwrap();
    let srv = TestServer::spawn(dir.path()).await;
    let cookie = srv.login().await;

    let payload = json!({
        "fields": {
            "vendor_name_1": "Acme",
            "currency_1": "CAD",
            "item_name_1_1": "Paint",
            "item_quantity_1_1": "2",
            "item_price_1_1": "10",
            "hst_gst_amount_1": "2.60",
            "currency_2": "USD"
        }
    });

    let res = srv
        .client
        .post(srv.url("/forms/preview"))
        .header(COOKIE, &cookie)
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();

    let forms = body["forms"].as_array().unwrap();
    assert_eq!(forms.len(), 10);

    let first = &forms[0];
    assert_eq!(first["slot"], 1);
    assert_eq!(first["row_totals"], json!(["20.00"]));
    assert_eq!(first["breakdown"]["subtotal"], "20.00");
    assert_eq!(first["breakdown"]["total"], "22.60");
    assert_eq!(first["presentation"]["tax_label"], "HST/GST");
    assert_eq!(first["presentation"]["tax_required"], true);
    assert_eq!(first["presentation"]["proof_of_payment_visible"], false);
    assert_eq!(first["can_remove_item"], false);

    let second = &forms[1];
    assert_eq!(second["currency"], "USD");
    assert_eq!(second["presentation"]["tax_label"], "Taxes");
    assert_eq!(second["presentation"]["proof_of_payment_required"], true);

    // Slot 1 is named but has no invoice file yet.
    assert_eq!(body["submittable"], false);
    assert_eq!(body["blocked"]["error"], "missing_invoice");
    assert_eq!(body["blocked"]["slot"], 1);
}

#[tokio::test]
async fn accepted_submission_is_archived() {
    let dir = tempfile::tempdir().unwrap();
    let srv = TestServer::spawn(dir.path()).await;
    let cookie = srv.login().await;

    let form = Form::new()
        .text("name", "Jamie Doe")
        .text("email", "jamie@club.example")
        .text("team", "Design");
    let form = home_invoice(form, 1, "Acme")
        .part("invoice_file_1", file("receipt.pdf", b"%PDF-acme"))
        .text("vendor_name_2", "Globex")
        .text("currency_2", "USD")
        .text("item_name_2_1", "Cable")
        .text("item_usage_2_1", "Lighting")
        .text("item_quantity_2_1", "1")
        .text("item_price_2_1", "4.50")
        .text("us_total_2", "4.50")
        .text("canadian_amount_2", "6.25")
        .part("invoice_file_2", file("scan.png", b"png"))
        .part("proof_of_payment_2", file("paid", b"paid"))
        // Unused slot left as the browser sends it.
        .part("invoice_file_3", file("", b""));

    let res = srv.submit(&cookie, form).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["slots"], json!([1, 2]));
    // 22.60 (CAD total) + 6.25 (USD paid in CAD)
    assert_eq!(body["total"], "28.85");
    assert_eq!(body["archived"], true);
    assert!(body["submission_id"].is_string());

    let folders: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(folders.len(), 1);
    let folder = &folders[0];
    let folder_name = folder.file_name().unwrap().to_str().unwrap();
    assert!(folder_name.starts_with("jamie_doe_"), "{folder_name}");
    assert_eq!(body["folder"], folder.display().to_string());

    assert_eq!(std::fs::read(folder.join("1_Acme.pdf")).unwrap(), b"%PDF-acme");
    assert_eq!(std::fs::read(folder.join("2_Globex.png")).unwrap(), b"png");
    assert_eq!(std::fs::read(folder.join("2_proof_of_payment.pdf")).unwrap(), b"paid");

    let log_row: serde_json::Value =
        serde_json::from_slice(&std::fs::read(folder.join("log_row.json")).unwrap()).unwrap();
    assert_eq!(log_row["row"][1], "Jamie Doe");
    assert_eq!(log_row["row"][6], "$28.85");

    let request: serde_json::Value =
        serde_json::from_slice(&std::fs::read(folder.join("purchase_request.json")).unwrap())
            .unwrap();
    assert_eq!(request["sheets"].as_array().unwrap().len(), 2);
    assert!(folder.join("expense_report.json").is_file());
}

#[tokio::test]
async fn named_form_without_invoice_blocks_submission() {
    let dir = tempfile::tempdir().unwrap();
    let srv = TestServer::spawn(dir.path()).await;
    let cookie = srv.login().await;

    let form = home_invoice(Form::new().text("name", "Jamie Doe"), 1, "Acme")
        .part("invoice_file_1", file("", b""));

    let res = srv.submit(&cookie, form).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "missing_invoice");
    assert_eq!(body["slot"], 1);
    assert!(body["message"].as_str().unwrap().contains("Form 1"));

    // Nothing is archived for a blocked batch.
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn foreign_form_without_proof_of_payment_blocks_submission() {
    let dir = tempfile::tempdir().unwrap();
    let srv = TestServer::spawn(dir.path()).await;
    let cookie = srv.login().await;

    let form = home_invoice(Form::new(), 1, "Acme")
        .part("invoice_file_1", file("a.pdf", b"a"))
        .text("vendor_name_4", "Globex")
        .text("currency_4", "USD")
        .text("item_name_4_1", "Cable")
        .text("item_usage_4_1", "Lighting")
        .text("item_quantity_4_1", "1")
        .text("item_price_4_1", "4.50")
        .part("invoice_file_4", file("b.pdf", b"b"));

    let res = srv.submit(&cookie, form).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "missing_proof_of_payment");
    assert_eq!(body["slot"], 4);
}

#[tokio::test]
async fn blank_batch_is_rejected_with_consolidated_message() {
    let dir = tempfile::tempdir().unwrap();
    let srv = TestServer::spawn(dir.path()).await;
    let cookie = srv.login().await;

    let res = srv
        .submit(&cookie, Form::new().text("name", "Jamie Doe"))
        .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "no_complete_invoice");
    assert!(body["slot"].is_null());
    assert_eq!(body["message"], purchreq_forms::gatekeeper::NO_COMPLETE_INVOICE_MESSAGE);
}

#[tokio::test]
async fn archive_failure_still_accepts_and_alerts_admin() {
    let notifier = Arc::new(RecordingNotifier::default());
    let srv = TestServer::start(
        services(Arc::new(UnavailableArchive)).with_notifier(notifier.clone()),
    )
    .await;
    let cookie = srv.login().await;

    let form = home_invoice(Form::new().text("name", "Jamie Doe"), 1, "Acme")
        .part("invoice_file_1", file("a.pdf", b"a"));
    let res = srv.submit(&cookie, form).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["archived"], false);
    let submission_id = body["submission_id"].as_str().unwrap().to_string();

    // The alert is sent in the background; poll briefly.
    for _ in 0..50 {
        if !notifier.0.lock().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    let sent = notifier.0.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "submission not archived");
    assert!(sent[0].1.contains(&submission_id));
    assert!(sent[0].1.contains("disk full"));
}
