use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use schlagwort::fetch;
use schlagwort::ScrapeContext;

/// Tiny fixture server: drops the first `failures` connections before
/// responding, then serves a fixed 200 body. Returns the bound address and
/// the connection counter.
fn spawn_flaky_server(failures: usize, body: &'static str) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = format!("http://{}/", listener.local_addr().unwrap());
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);

    std::thread::spawn(move || {
        loop {
            let (mut stream, _) = match listener.accept() {
                Ok(conn) => conn,
                Err(_) => return,
            };
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            if attempt < failures {
                // Close before sending any bytes: a transport error for the client.
                drop(stream);
                continue;
            }
            let mut buf = [0u8; 2048];
            let _ = stream.read(&mut buf);
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    (addr, attempts)
}

#[tokio::test]
async fn second_attempt_succeeds_after_transport_error() {
    let (addr, attempts) = spawn_flaky_server(1, "all good");
    let ctx = ScrapeContext::builder()
        .retries(1)
        .timeout(Duration::from_secs(5))
        .build();

    let body = fetch::fetch_text(&addr, &ctx).await.unwrap();

    assert_eq!(body, "all good");
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn error_propagates_once_retries_are_exhausted() {
    let (addr, attempts) = spawn_flaky_server(usize::MAX, "never served");
    let ctx = ScrapeContext::builder()
        .retries(1)
        .timeout(Duration::from_secs(5))
        .build();

    let result = fetch::fetch_text(&addr, &ctx).await;

    assert!(result.is_err());
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = format!("http://{}/", listener.local_addr().unwrap());
    std::thread::spawn(move || {
        while let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 2048];
            let _ = stream.read(&mut buf);
            let _ = stream.write_all(
                b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            );
        }
    });

    let ctx = ScrapeContext::builder()
        .retries(0)
        .timeout(Duration::from_secs(5))
        .build();
    let result = fetch::fetch_text(&addr, &ctx).await;
    assert!(result.is_err());
}
