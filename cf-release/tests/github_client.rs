use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};

use cf_release::github::GithubClient;
use cf_release::load_config::RepoRef;
use cf_release_core::contract::{PublishError, Publisher};

/// Minimal HTTP/1.1 responder on a loopback port. The handler sees the
/// request line ("POST /repos/o/r/releases HTTP/1.1") and returns the full
/// response; every request line is also recorded for assertions.
fn spawn_stub<F>(handler: F) -> (String, Arc<Mutex<Vec<String>>>)
where
    F: Fn(&str) -> String + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub listener");
    let addr = listener.local_addr().expect("stub addr");
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = requests.clone();
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { break };
            let mut reader = BufReader::new(stream);
            let mut request_line = String::new();
            if reader.read_line(&mut request_line).is_err() {
                continue;
            }
            let request_line = request_line.trim_end().to_string();
            // Drain headers and any body so the client sees a clean close.
            let mut content_length = 0usize;
            loop {
                let mut header = String::new();
                if reader.read_line(&mut header).unwrap_or(0) == 0 {
                    break;
                }
                if header == "\r\n" || header == "\n" {
                    break;
                }
                if let Some(v) = header.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = v.trim().parse().unwrap_or(0);
                }
            }
            let mut body = vec![0u8; content_length];
            let _ = reader.read_exact(&mut body);
            seen.lock().expect("lock").push(request_line.clone());
            let response = handler(&request_line);
            let mut stream = reader.into_inner();
            let _ = stream.write_all(response.as_bytes());
        }
    });
    (format!("http://{addr}"), requests)
}

fn response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

fn repo() -> RepoRef {
    RepoRef {
        owner: "someone".to_string(),
        name: "some-addon".to_string(),
    }
}

#[tokio::test]
async fn rejected_credentials_map_to_auth_errors() {
    let (base, _) = spawn_stub(|_| response("401 Unauthorized", r#"{"message":"Bad credentials"}"#));
    let client = GithubClient::with_base_url("bad-token", repo(), base);

    let err = client
        .latest_release()
        .await
        .expect_err("401 must fail the request");
    match err {
        PublishError::Auth { status } => assert_eq!(status.as_u16(), 401),
        other => panic!("expected an auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn latest_release_is_none_for_an_empty_repository() {
    let (base, _) = spawn_stub(|_| response("404 Not Found", r#"{"message":"Not Found"}"#));
    let client = GithubClient::with_base_url("token", repo(), base);

    let latest = client.latest_release().await.expect("404 is not an error");
    assert!(latest.is_none());
}

#[tokio::test]
async fn latest_release_collects_asset_names() {
    let (base, _) = spawn_stub(|_| {
        response(
            "200 OK",
            r#"{
              "tag_name": "v2025.08.01.09.30",
              "upload_url": "https://uploads.test/repos/someone/some-addon/releases/1/assets{?name,label}",
              "assets": [{"name": "TestAddon-1.2.3.zip"}, {"name": "release.json"}]
            }"#,
        )
    });
    let client = GithubClient::with_base_url("token", repo(), base);

    let latest = client
        .latest_release()
        .await
        .expect("release loads")
        .expect("release present");
    assert_eq!(latest.tag, "v2025.08.01.09.30");
    assert_eq!(
        latest.asset_names,
        vec!["TestAddon-1.2.3.zip".to_string(), "release.json".to_string()]
    );
}

#[tokio::test]
async fn missing_tag_creates_the_release() {
    let (base, requests) = spawn_stub(|request_line| {
        if request_line.starts_with("GET") && request_line.contains("/releases/tags/v1") {
            return response("404 Not Found", r#"{"message":"Not Found"}"#);
        }
        if request_line.starts_with("POST") && request_line.contains("/releases") {
            return response(
                "201 Created",
                r#"{
                  "tag_name": "v1",
                  "upload_url": "https://uploads.test/repos/someone/some-addon/releases/7/assets{?name,label}",
                  "assets": []
                }"#,
            );
        }
        response("500 Internal Server Error", "unexpected request")
    });
    let client = GithubClient::with_base_url("token", repo(), base);

    let handle = client
        .get_or_create_release("v1", "release notes")
        .await
        .expect("release is created");
    assert_eq!(handle.tag, "v1");
    assert_eq!(
        handle.upload_url,
        "https://uploads.test/repos/someone/some-addon/releases/7/assets"
    );

    let seen = requests.lock().expect("lock");
    assert!(seen.iter().any(|r| r.starts_with("POST")), "create must POST");
}

#[tokio::test]
async fn existing_tag_is_reused_without_creating() {
    let (base, requests) = spawn_stub(|request_line| {
        assert!(
            request_line.starts_with("GET"),
            "only the tag lookup is expected: {request_line}"
        );
        response(
            "200 OK",
            r#"{
              "tag_name": "v1",
              "upload_url": "https://uploads.test/repos/someone/some-addon/releases/7/assets{?name,label}",
              "assets": []
            }"#,
        )
    });
    let client = GithubClient::with_base_url("token", repo(), base);

    let handle = client
        .get_or_create_release("v1", "release notes")
        .await
        .expect("existing release is reused");
    assert_eq!(handle.tag, "v1");

    let seen = requests.lock().expect("lock");
    assert_eq!(seen.len(), 1);
    assert!(seen[0].starts_with("GET"));
}

#[tokio::test]
async fn upload_asset_posts_with_the_asset_name() {
    let (base, requests) = spawn_stub(|_| response("201 Created", "{}"));
    let client = GithubClient::with_base_url("token", repo(), base.clone());

    client
        .upload_asset(
            &format!("{base}/upload/assets"),
            "release.json",
            "application/json",
            b"{\"releases\":[]}".to_vec(),
        )
        .await
        .expect("upload succeeds");

    let seen = requests.lock().expect("lock");
    assert_eq!(seen.len(), 1);
    assert!(seen[0].starts_with("POST"));
    assert!(seen[0].contains("name=release.json"));
}
