use once_cell::sync::Lazy;
use reqwest::Client;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use storefront_visits::detector::{Activation, FileMarker, VisitDetector, VisitRecorder};
use storefront_visits::models::{DailyVisitCounter, RecordVisitResponse};
use tokio::sync::Mutex;
use tokio::time::sleep;

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_temp_path(label: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "storefront_visits_http_{label}_{}_{nanos}",
        std::process::id()
    ));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/today")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = format!("{}.json", unique_temp_path("data"));
    let child = Command::new(env!("CARGO_BIN_EXE_storefront_visits"))
        .env("PORT", port.to_string())
        .env("VISITS_DATA_PATH", data_path)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn today_counter(client: &Client, base_url: &str) -> DailyVisitCounter {
    client
        .get(format!("{base_url}/api/today"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_record_visit_increments_today() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = today_counter(&client, &server.base_url).await;

    let response: RecordVisitResponse = client
        .post(format!("{}/api/visits", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(response.success);
    assert!(response.error.is_none());

    let today = today_counter(&client, &server.base_url).await;
    assert_eq!(today.count, before.count + 1);
    assert!(!today.date.is_empty());
}

#[tokio::test]
async fn http_stats_reports_expected_series() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let stats: serde_json::Value = client
        .get(format!("{}/api/stats", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(stats["last_7_days"].as_array().unwrap().len(), 7);
    assert_eq!(stats["weekly_totals"].as_array().unwrap().len(), 8);
    assert_eq!(stats["weekly_averages"].as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn http_concurrent_visits_are_all_counted() {
    let _guard = TEST_LOCK.lock().await;
    let server = spawn_server().await;
    let client = Client::new();

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let client = client.clone();
        let url = format!("{}/api/visits", server.base_url);
        tasks.push(tokio::spawn(async move {
            client
                .post(url)
                .send()
                .await
                .unwrap()
                .json::<RecordVisitResponse>()
                .await
                .unwrap()
        }));
    }
    for task in tasks {
        assert!(task.await.unwrap().success);
    }

    let today = today_counter(&client, &server.base_url).await;
    assert_eq!(today.count, 16);
}

struct HttpRecorder {
    client: Client,
    url: String,
}

impl VisitRecorder for HttpRecorder {
    async fn record_visit(&self) -> RecordVisitResponse {
        let sent = self
            .client
            .post(&self.url)
            .timeout(Duration::from_secs(2))
            .send()
            .await;
        match sent {
            Ok(response) => match response.json().await {
                Ok(body) => body,
                Err(err) => RecordVisitResponse::failed(err.to_string()),
            },
            Err(err) => RecordVisitResponse::failed(err.to_string()),
        }
    }
}

#[tokio::test]
async fn http_detector_records_once_per_day() {
    let _guard = TEST_LOCK.lock().await;
    let server = spawn_server().await;
    let client = Client::new();

    let marker_path = unique_temp_path("marker");
    // Serialized by TEST_LOCK, so the env override cannot race other tests.
    unsafe {
        std::env::set_var("VISIT_MARKER_PATH", &marker_path);
    }
    let marker = FileMarker::discover().expect("marker location");
    let detector = VisitDetector::new(
        marker,
        HttpRecorder {
            client: client.clone(),
            url: format!("{}/api/visits", server.base_url),
        },
    );

    assert_eq!(detector.activate().await, Activation::Recorded);
    assert_eq!(today_counter(&client, &server.base_url).await.count, 1);

    assert_eq!(detector.activate().await, Activation::AlreadyRecorded);
    assert_eq!(today_counter(&client, &server.base_url).await.count, 1);

    let _ = std::fs::remove_file(marker_path);
}
