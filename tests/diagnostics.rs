use apisvc::http::RequestError;
use apisvc::runtime::RealRuntime;
use apisvc::storage::MemoryStorage;
use apisvc::{ApiClient, ClientConfig, ErrorKind, Notice, Notifier, RequestOptions};
use log::{Level, LevelFilter, Log, Metadata, Record};
use mockito::Server;
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Keeps every record at error level so the test can look at what was logged.
struct CaptureLogger {
    lines: Mutex<Vec<String>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Error
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.lines.lock().unwrap().push(record.args().to_string());
        }
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger {
    lines: Mutex::new(Vec::new()),
};

#[derive(Default)]
struct CountingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl Notifier for CountingNotifier {
    fn on_loading_change(&self, _visible: bool) {}

    fn on_notify(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}

fn logged() -> Vec<String> {
    LOGGER.lines.lock().unwrap().clone()
}

// One test per binary: the logger is process-global.
#[tokio::test]
async fn test_errors_are_logged_whether_or_not_they_are_shown() {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(LevelFilter::Error);

    let mut server = Server::new_async().await;
    let _missing = server
        .mock("GET", "/missing")
        .with_status(404)
        .create_async()
        .await;
    let _rejected = server
        .mock("GET", "/rejected")
        .with_body(r#"{"code":42,"data":null,"message":"quota exceeded"}"#)
        .create_async()
        .await;

    let notifier = Arc::new(CountingNotifier::default());
    let client = ApiClient::new(
        ClientConfig::default().with_base_url(server.url()),
        Arc::new(RealRuntime),
        Arc::new(MemoryStorage::new()),
        notifier.clone(),
    )
    .unwrap();

    let err: RequestError = client
        .get::<Value>("/missing", RequestOptions::new().silent())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::HttpStatus);
    assert!(notifier.notices.lock().unwrap().is_empty());
    assert!(
        logged()
            .iter()
            .any(|line| line.contains("HTTP 404") && line.contains("requested resource not found"))
    );

    let err = client
        .get::<Value>("/rejected", RequestOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Business);
    assert_eq!(err.code.as_deref(), Some("42"));
    assert_eq!(
        *notifier.notices.lock().unwrap(),
        vec![Notice::Error("quota exceeded".to_string())]
    );
    assert!(logged().iter().any(|line| line.contains("quota exceeded")));
}
