//! Integration tests for whole-dataset fetches.
//!
//! These tests run the fetcher against mock HTTP servers with isolated data
//! homes.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use mdanalysis_data::{
    DatasetFetcher, DatasetSpec, DirectoryDescriptions, DownloaderConfig, FetchError, FetchOptions,
    RemoteFileMetadata, RetryPolicy, Role,
};
use sha2::{Digest, Sha256};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::socket_guard::{should_skip_socket_bound_test, start_mock_server_or_skip};

const TOPOLOGY: &[u8] = b"PSF EXT\n\n         2 !NTITLE\n REMARKS sample topology\n";
const TRAJECTORY: &[u8] = b"\x54\x00\x00\x00CORD\x0a\x00\x00\x00 sample trajectory frames";
const DESCRIPTION: &str = "Sample dataset\n==============\n\nTwo files for tests.\n";

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn sample_spec(server: &MockServer) -> DatasetSpec {
    DatasetSpec::new()
        .with_file(
            Role::Topology,
            RemoteFileMetadata::new(
                "sample.psf",
                format!("{}/files/1", server.uri()),
                sha256_hex(TOPOLOGY),
            )
            .unwrap(),
        )
        .unwrap()
        .with_file(
            Role::Trajectory,
            RemoteFileMetadata::new(
                "sample.dcd",
                format!("{}/files/2", server.uri()),
                sha256_hex(TRAJECTORY),
            )
            .unwrap(),
        )
        .unwrap()
}

fn fetcher(max_attempts: u32) -> DatasetFetcher {
    DatasetFetcher::new(DownloaderConfig::default().with_retry_policy(RetryPolicy::new(
        max_attempts,
        Duration::from_millis(5),
        Duration::from_millis(20),
        2.0,
    )))
    .unwrap()
}

/// Data home plus a description directory holding `sample.rst`.
struct Fixture {
    home: TempDir,
    descr: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let descr = TempDir::new().expect("failed to create temp dir");
        std::fs::write(descr.path().join("sample.rst"), DESCRIPTION).unwrap();
        Self {
            home: TempDir::new().expect("failed to create temp dir"),
            descr,
        }
    }

    fn descriptions(&self) -> DirectoryDescriptions {
        DirectoryDescriptions::new(self.descr.path())
    }

    fn options(&self) -> FetchOptions {
        FetchOptions::default().with_data_home(self.home.path())
    }

    fn dataset_dir(&self) -> PathBuf {
        self.home.path().join("sample")
    }
}

async fn mount_file(server: &MockServer, route: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

/// Serves `body` over plain HTTP/1.1. The first `truncated` connections
/// declare the full `Content-Length` but close after half the body.
/// Returns the base URL and a counter of accepted connections.
async fn start_truncating_server(
    body: Vec<u8>,
    truncated: usize,
) -> Option<(String, Arc<AtomicUsize>)> {
    if should_skip_socket_bound_test() {
        return None;
    }
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&accepted);
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            let sent = if n < truncated {
                &body[..body.len() / 2]
            } else {
                &body[..]
            };
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(sent).await;
            let _ = socket.shutdown().await;
        }
    });
    Some((format!("http://{addr}"), accepted))
}

fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_sample_dataset_downloads_both_files() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_file(&server, "/files/1", TOPOLOGY).await;
    mount_file(&server, "/files/2", TRAJECTORY).await;
    let fixture = Fixture::new();

    let bundle = fetcher(3)
        .fetch(
            "sample",
            &sample_spec(&server),
            &fixture.descriptions(),
            &fixture.options(),
        )
        .await
        .unwrap();

    let topology = bundle.topology().unwrap();
    let trajectory = bundle.trajectory().unwrap();
    assert!(topology.ends_with("sample.psf"));
    assert!(trajectory.ends_with("sample.dcd"));
    assert_eq!(std::fs::read(topology).unwrap(), TOPOLOGY);
    assert_eq!(std::fs::read(trajectory).unwrap(), TRAJECTORY);
    assert_eq!(bundle.description(), DESCRIPTION);
    assert_eq!(bundle.dataset(), "sample");
    assert_eq!(
        dir_entries(&fixture.dataset_dir()),
        vec!["sample.dcd".to_string(), "sample.psf".to_string()]
    );
}

#[tokio::test]
async fn test_second_fetch_makes_no_requests() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_file(&server, "/files/1", TOPOLOGY).await;
    mount_file(&server, "/files/2", TRAJECTORY).await;
    let fixture = Fixture::new();
    let fetcher = fetcher(3);
    let spec = sample_spec(&server);

    let first = fetcher
        .fetch("sample", &spec, &fixture.descriptions(), &fixture.options())
        .await
        .unwrap();
    let second = fetcher
        .fetch("sample", &spec, &fixture.descriptions(), &fixture.options())
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_fresh_data_home_gets_only_the_dataset_directory() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_file(&server, "/files/1", TOPOLOGY).await;
    mount_file(&server, "/files/2", TRAJECTORY).await;
    let fixture = Fixture::new();
    let data_home = fixture.home.path().join("not").join("yet").join("there");
    let options = FetchOptions::default().with_data_home(&data_home);

    fetcher(1)
        .fetch(
            "sample",
            &sample_spec(&server),
            &fixture.descriptions(),
            &options,
        )
        .await
        .unwrap();

    assert_eq!(dir_entries(&data_home), vec!["sample".to_string()]);
}

#[tokio::test]
async fn test_mutated_cached_file_is_replaced() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_file(&server, "/files/1", TOPOLOGY).await;
    mount_file(&server, "/files/2", TRAJECTORY).await;
    let fixture = Fixture::new();
    let fetcher = fetcher(1);
    let spec = sample_spec(&server);

    let bundle = fetcher
        .fetch("sample", &spec, &fixture.descriptions(), &fixture.options())
        .await
        .unwrap();
    let topology = bundle.topology().unwrap().to_path_buf();
    std::fs::write(&topology, b"tampered").unwrap();

    fetcher
        .fetch("sample", &spec, &fixture.descriptions(), &fixture.options())
        .await
        .unwrap();

    assert_eq!(std::fs::read(&topology).unwrap(), TOPOLOGY);
    // Two initial downloads plus one repair of the topology.
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_mutated_cached_file_offline_is_integrity_error() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_file(&server, "/files/1", TOPOLOGY).await;
    mount_file(&server, "/files/2", TRAJECTORY).await;
    let fixture = Fixture::new();
    let fetcher = fetcher(1);
    let spec = sample_spec(&server);

    fetcher
        .fetch("sample", &spec, &fixture.descriptions(), &fixture.options())
        .await
        .unwrap();
    std::fs::write(fixture.dataset_dir().join("sample.dcd"), b"tampered").unwrap();

    let result = fetcher
        .fetch(
            "sample",
            &spec,
            &fixture.descriptions(),
            &fixture.options().offline(),
        )
        .await;

    match result {
        Err(FetchError::Integrity {
            role,
            expected,
            actual,
            ..
        }) => {
            assert_eq!(role, Role::Trajectory);
            assert_eq!(expected, sha256_hex(TRAJECTORY));
            assert_eq!(actual, sha256_hex(b"tampered"));
        }
        other => panic!("expected Integrity, got {other:?}"),
    }
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_offline_with_empty_cache_makes_no_requests() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let fixture = Fixture::new();

    let result = fetcher(3)
        .fetch(
            "sample",
            &sample_spec(&server),
            &fixture.descriptions(),
            &fixture.options().offline(),
        )
        .await;

    match result {
        Err(FetchError::MissingData { role, path, .. }) => {
            assert_eq!(role, Role::Topology);
            assert_eq!(path, fixture.dataset_dir().join("sample.psf"));
        }
        other => panic!("expected MissingData, got {other:?}"),
    }
    assert!(dir_entries(&fixture.dataset_dir()).is_empty());
}

#[tokio::test]
async fn test_failed_transfer_leaves_no_partial_file_and_recovers() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_file(&server, "/files/1", TOPOLOGY).await;
    Mock::given(method("GET"))
        .and(path("/files/2"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_file(&server, "/files/2", TRAJECTORY).await;
    let fixture = Fixture::new();
    let fetcher = fetcher(1);
    let spec = sample_spec(&server);

    let result = fetcher
        .fetch("sample", &spec, &fixture.descriptions(), &fixture.options())
        .await;

    let err = result.unwrap_err();
    assert!(err.is_retryable());
    match err {
        FetchError::TransientFetch { role, attempts, .. } => {
            assert_eq!(role, Role::Trajectory);
            assert_eq!(attempts, 1);
        }
        other => panic!("expected TransientFetch, got {other:?}"),
    }
    // The verified topology stays; nothing exists for the trajectory.
    assert_eq!(
        dir_entries(&fixture.dataset_dir()),
        vec!["sample.psf".to_string()]
    );

    let bundle = fetcher
        .fetch("sample", &spec, &fixture.descriptions(), &fixture.options())
        .await
        .unwrap();
    assert_eq!(std::fs::read(bundle.trajectory().unwrap()).unwrap(), TRAJECTORY);
}

#[tokio::test]
async fn test_interrupted_transfer_leaves_no_partial_file_and_recovers() {
    let body: Vec<u8> = TRAJECTORY.iter().copied().cycle().take(64 * 1024).collect();
    let checksum = sha256_hex(&body);
    let Some((base, accepted)) = start_truncating_server(body.clone(), 2).await else {
        return;
    };
    let spec = DatasetSpec::new()
        .with_file(
            Role::Trajectory,
            RemoteFileMetadata::new("sample.dcd", format!("{base}/files/2"), checksum).unwrap(),
        )
        .unwrap();
    let fixture = Fixture::new();
    let fetcher = fetcher(2);

    let err = fetcher
        .fetch("sample", &spec, &fixture.descriptions(), &fixture.options())
        .await
        .unwrap_err();

    let final_path = fixture.dataset_dir().join("sample.dcd");
    let msg = err.to_string();
    assert!(msg.contains("sample/trajectory"), "got {msg}");
    assert!(msg.contains(&final_path.display().to_string()), "got {msg}");
    match err {
        FetchError::TransientFetch { role, attempts, path, .. } => {
            assert_eq!(role, Role::Trajectory);
            assert_eq!(attempts, 2);
            assert_eq!(path, final_path);
        }
        other => panic!("expected TransientFetch, got {other:?}"),
    }
    assert_eq!(accepted.load(Ordering::SeqCst), 2);
    // Neither the final file nor a temporary download survives.
    assert!(dir_entries(&fixture.dataset_dir()).is_empty());

    let bundle = fetcher
        .fetch("sample", &spec, &fixture.descriptions(), &fixture.options())
        .await
        .unwrap();
    assert_eq!(std::fs::read(bundle.trajectory().unwrap()).unwrap(), body);
    assert_eq!(dir_entries(&fixture.dataset_dir()), vec!["sample.dcd".to_string()]);
}

#[tokio::test]
async fn test_transient_server_error_is_retried() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_file(&server, "/files/1", TOPOLOGY).await;
    Mock::given(method("GET"))
        .and(path("/files/2"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_file(&server, "/files/2", TRAJECTORY).await;
    let fixture = Fixture::new();

    let bundle = fetcher(3)
        .fetch(
            "sample",
            &sample_spec(&server),
            &fixture.descriptions(),
            &fixture.options(),
        )
        .await
        .unwrap();

    assert_eq!(std::fs::read(bundle.trajectory().unwrap()).unwrap(), TRAJECTORY);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/files/1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    let fixture = Fixture::new();

    let result = fetcher(5)
        .fetch(
            "sample",
            &sample_spec(&server),
            &fixture.descriptions(),
            &fixture.options(),
        )
        .await;

    match result {
        Err(FetchError::TransientFetch {
            role,
            attempts,
            url,
            ..
        }) => {
            assert_eq!(role, Role::Topology);
            assert_eq!(attempts, 1);
            assert!(url.ends_with("/files/1"));
        }
        other => panic!("expected TransientFetch, got {other:?}"),
    }
}

#[tokio::test]
async fn test_wrong_bytes_from_server_is_integrity_error() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_file(&server, "/files/1", b"not the topology").await;
    let fixture = Fixture::new();

    let result = fetcher(3)
        .fetch(
            "sample",
            &sample_spec(&server),
            &fixture.descriptions(),
            &fixture.options(),
        )
        .await;

    match result {
        Err(FetchError::Integrity {
            role, path, actual, ..
        }) => {
            assert_eq!(role, Role::Topology);
            assert_eq!(path, fixture.dataset_dir().join("sample.psf"));
            assert_eq!(actual, sha256_hex(b"not the topology"));
        }
        other => panic!("expected Integrity, got {other:?}"),
    }
    assert!(dir_entries(&fixture.dataset_dir()).is_empty());
    // Integrity failures are not retried.
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_force_redownloads_cached_files() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_file(&server, "/files/1", TOPOLOGY).await;
    mount_file(&server, "/files/2", TRAJECTORY).await;
    let fixture = Fixture::new();
    let fetcher = fetcher(1);
    let spec = sample_spec(&server);

    fetcher
        .fetch("sample", &spec, &fixture.descriptions(), &fixture.options())
        .await
        .unwrap();
    fetcher
        .fetch(
            "sample",
            &spec,
            &fixture.descriptions(),
            &fixture.options().with_force(true),
        )
        .await
        .unwrap();

    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}

#[test]
fn test_catalog_dataset_offline_in_empty_home_is_missing_data() {
    let home = TempDir::new().expect("failed to create temp dir");
    let options = FetchOptions::default()
        .with_data_home(home.path())
        .offline();

    let result = tokio_test::block_on(mdanalysis_data::fetch_ifabp_water(&options));

    match result {
        Err(FetchError::MissingData { dataset, role, .. }) => {
            assert_eq!(dataset, "ifabp_water");
            assert_eq!(role, Role::Topology);
        }
        other => panic!("expected MissingData, got {other:?}"),
    }
}
