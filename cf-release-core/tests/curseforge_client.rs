use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;

use cf_release_core::contract::{FetchError, Fetcher};
use cf_release_core::curseforge::CurseforgeClient;

/// Minimal HTTP/1.1 responder on a loopback port. The handler sees the
/// request line ("GET /mods/42 HTTP/1.1") and returns the full response.
fn spawn_stub<F>(handler: F) -> String
where
    F: Fn(&str) -> String + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub listener");
    let addr = listener.local_addr().expect("stub addr");
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { break };
            let mut reader = BufReader::new(stream);
            let mut request_line = String::new();
            if reader.read_line(&mut request_line).is_err() {
                continue;
            }
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
            let response = handler(request_line.trim_end());
            let mut stream = reader.into_inner();
            let _ = stream.write_all(response.as_bytes());
        }
    });
    format!("http://{addr}")
}

fn response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

#[tokio::test]
async fn rejected_credentials_map_to_auth_errors() {
    let base = spawn_stub(|_| response("403 Forbidden", r#"{"error":"forbidden"}"#));
    let client = CurseforgeClient::with_base_url(42, "bad-token", base);

    let err = client
        .version_types()
        .await
        .expect_err("403 must fail the request");
    match err {
        FetchError::Auth { status } => assert_eq!(status.as_u16(), 403),
        other => panic!("expected an auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn other_api_errors_keep_status_and_body() {
    let base = spawn_stub(|_| response("500 Internal Server Error", "upstream exploded"));
    let client = CurseforgeClient::with_base_url(42, "token", base);

    let err = client
        .latest_stable()
        .await
        .expect_err("500 must fail the request");
    match err {
        FetchError::Api { status, body } => {
            assert_eq!(status.as_u16(), 500);
            assert!(body.contains("upstream exploded"));
        }
        other => panic!("expected an api error, got {other:?}"),
    }
}

#[tokio::test]
async fn version_types_parse_the_data_envelope() {
    let base = spawn_stub(|_| {
        response(
            "200 OK",
            r#"{"data":[{"id":517,"slug":"classic"},{"id":1,"slug":"mainline"}]}"#,
        )
    });
    let client = CurseforgeClient::with_base_url(42, "token", base);

    let types = client.version_types().await.expect("version types load");
    assert_eq!(types.get(&517).map(String::as_str), Some("classic"));
    assert_eq!(types.get(&1).map(String::as_str), Some("mainline"));
}

#[tokio::test]
async fn latest_stable_filters_and_orders_by_the_remote_index() {
    let base = spawn_stub(|request_line| {
        assert!(
            request_line.contains("/mods/42"),
            "unexpected request: {request_line}"
        );
        response(
            "200 OK",
            r#"{
              "data": {
                "name": "TestAddon",
                "latestFiles": [
                  {"id": 10, "fileName": "TestAddon-1.2.3.zip", "releaseType": 1,
                   "downloadUrl": "https://edge.test/10.zip",
                   "sortableGameVersions": [{"gameVersionName": "11.0.2", "gameVersionTypeId": 1}]},
                  {"id": 11, "fileName": "TestAddon-1.2.3-beta.zip", "releaseType": 2,
                   "downloadUrl": "https://edge.test/11.zip",
                   "sortableGameVersions": []},
                  {"id": 12, "fileName": "TestAddon-1.2.3-classic.zip", "releaseType": 1,
                   "downloadUrl": "https://edge.test/12.zip",
                   "sortableGameVersions": [{"gameVersionName": "1.15.6", "gameVersionTypeId": 517}]}
                ],
                "latestFilesIndexes": [
                  {"fileId": 12},
                  {"fileId": 10},
                  {"fileId": 12},
                  {"fileId": 11}
                ]
              }
            }"#,
        )
    });
    let client = CurseforgeClient::with_base_url(42, "token", base);

    let listing = client.latest_stable().await.expect("listing loads");
    assert_eq!(listing.mod_name, "TestAddon");
    // Beta file 11 filtered out, duplicate index entry for 12 collapsed,
    // index order (12 before 10) preserved.
    let ids: Vec<i64> = listing.files.iter().map(|f| f.file_id).collect();
    assert_eq!(ids, vec![12, 10]);
    assert_eq!(listing.files[0].game_versions[0].name, "1.15.6");
}

#[tokio::test]
async fn changelog_unwraps_the_data_field() {
    let base = spawn_stub(|request_line| {
        assert!(
            request_line.contains("/mods/42/files/10/changelog"),
            "unexpected request: {request_line}"
        );
        response("200 OK", r#"{"data":"<p>Fixed a crash</p>"}"#)
    });
    let client = CurseforgeClient::with_base_url(42, "token", base);

    let html = client.changelog(10).await.expect("changelog loads");
    assert_eq!(html, "<p>Fixed a crash</p>");
}
