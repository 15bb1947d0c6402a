use public_sheets::transport::RESPONSE_MARKER;
use public_sheets::{Error, FetchTransport, Fetched, StreamingTransport, Transport, UnusableReason};
use reqwest::StatusCode;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::{sleep, timeout};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BODY: &str =
    "/*O_o*/\ngoogle.visualization.Query.setResponse({\"table\":{\"cols\":[],\"rows\":[]}});";

async fn serve(status: u16, body: &str) -> (MockServer, Url) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sheet"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;
    let url = Url::parse(&format!("{}/sheet", server.uri())).unwrap();
    (server, url)
}

#[test]
fn marker_matches_google_prefix() {
    assert_eq!(RESPONSE_MARKER, b"/*O_o*/");
}

#[tokio::test]
async fn fetch_returns_body_on_success() {
    let (_server, url) = serve(200, BODY).await;
    let fetched = FetchTransport::new().fetch_text(&url).await.unwrap();
    assert_eq!(fetched, Fetched::Body(BODY.to_string()));
}

#[tokio::test]
async fn fetch_reports_error_status() {
    let (_server, url) = serve(404, "<html>Not Found</html>").await;
    let fetched = FetchTransport::new().fetch_text(&url).await.unwrap();
    assert_eq!(fetched, Fetched::Unusable(UnusableReason::Status(StatusCode::NOT_FOUND)));
}

#[tokio::test]
async fn streaming_returns_body_after_marker() {
    let (_server, url) = serve(200, BODY).await;
    let fetched = StreamingTransport::new().fetch_text(&url).await.unwrap();
    assert_eq!(fetched, Fetched::Body(BODY.to_string()));
}

#[tokio::test]
async fn streaming_rejects_body_without_marker() {
    let (_server, url) = serve(200, "<!DOCTYPE html><html></html>").await;
    let fetched = StreamingTransport::new().fetch_text(&url).await.unwrap();
    assert_eq!(fetched, Fetched::Unusable(UnusableReason::MissingMarker));
}

#[tokio::test]
async fn streaming_keeps_status_of_error_pages() {
    let (_server, url) = serve(500, "oops").await;
    let fetched = StreamingTransport::new().fetch_text(&url).await.unwrap();
    assert_eq!(
        fetched,
        Fetched::Unusable(UnusableReason::Status(StatusCode::INTERNAL_SERVER_ERROR))
    );
}

#[tokio::test]
async fn streaming_treats_empty_body_as_unusable() {
    let (_server, url) = serve(200, "").await;
    let fetched = StreamingTransport::new().fetch_text(&url).await.unwrap();
    assert_eq!(fetched, Fetched::Unusable(UnusableReason::MissingMarker));
}

#[tokio::test]
async fn connection_failures_are_errors() {
    // nothing listens on the discard port
    let url = Url::parse("http://127.0.0.1:9/sheet").unwrap();
    let result = FetchTransport::new().fetch_text(&url).await;
    assert!(matches!(result, Err(Error::Transport(_))));

    let result = StreamingTransport::new().fetch_text(&url).await;
    assert!(matches!(result, Err(Error::Transport(_))));
}

/// Serves one response whose body is sent as chunked transfer encoding, one
/// chunk per entry with a pause in between. Without `finish` the body is never
/// terminated and the connection is held open.
async fn serve_chunks(chunks: &'static [&'static str], finish: bool) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let head = "HTTP/1.1 200 OK\r\nContent-Type: text/javascript\r\n\
                    Transfer-Encoding: chunked\r\nConnection: close\r\n\r\n";
        if socket.write_all(head.as_bytes()).await.is_err() {
            return;
        }

        for chunk in chunks {
            let frame = format!("{:x}\r\n{chunk}\r\n", chunk.len());
            if socket.write_all(frame.as_bytes()).await.is_err() {
                return;
            }
            let _ = socket.flush().await;
            sleep(Duration::from_millis(50)).await;
        }

        if finish {
            let _ = socket.write_all(b"0\r\n\r\n").await;
        } else {
            sleep(Duration::from_secs(30)).await;
        }
    });

    Url::parse(&format!("http://{addr}/sheet")).unwrap()
}

#[tokio::test]
async fn streaming_accepts_marker_split_across_chunks() {
    let url = serve_chunks(&["/*O", "_o*/", "google.visualization"], true).await;
    let fetched = StreamingTransport::new().fetch_text(&url).await.unwrap();
    assert_eq!(
        fetched,
        Fetched::Body("/*O_o*/google.visualization".to_string())
    );
}

#[tokio::test]
async fn streaming_stops_after_bad_first_chunk() {
    // the body never ends, so only an early return can finish in time
    let url = serve_chunks(&["<!DOCTYPE html>", "<html>"], false).await;
    let fetched = timeout(Duration::from_secs(5), StreamingTransport::new().fetch_text(&url))
        .await
        .expect("transport kept reading after a non-marker chunk")
        .unwrap();
    assert_eq!(fetched, Fetched::Unusable(UnusableReason::MissingMarker));
}

#[tokio::test]
async fn streaming_rejects_marker_prefix_followed_by_other_bytes() {
    let url = serve_chunks(&["/*O", "<html>", "/*O_o*/"], true).await;
    let fetched = StreamingTransport::new().fetch_text(&url).await.unwrap();
    assert_eq!(fetched, Fetched::Unusable(UnusableReason::MissingMarker));
}

#[tokio::test]
async fn streaming_rejects_body_ending_inside_marker() {
    let url = serve_chunks(&["/*O_"], true).await;
    let fetched = StreamingTransport::new().fetch_text(&url).await.unwrap();
    assert_eq!(fetched, Fetched::Unusable(UnusableReason::MissingMarker));
}
