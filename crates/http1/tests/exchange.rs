use std::convert::Infallible;

use bytes::Bytes;
use futures::stream;
use http::header::ETAG;
use http::{HeaderMap, HeaderValue, Method, StatusCode, Version};
use http_body::Frame;
use http_body_util::{Empty, Full, StreamBody};
use micro_http1::Config;
use micro_http1::connection::{HttpConnection, State};
use micro_http1::protocol::ParseError;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, duplex};

const NO_HEADERS: [(&str, &str); 0] = [];

fn pair() -> (HttpConnection<DuplexStream>, HttpConnection<DuplexStream>) {
    pair_with_config(Config::default())
}

fn pair_with_config(config: Config) -> (HttpConnection<DuplexStream>, HttpConnection<DuplexStream>) {
    let (client, server) = duplex(64 * 1024);
    (HttpConnection::with_config(client, config), HttpConnection::with_config(server, config))
}

fn chunks(chunks: Vec<Bytes>) -> StreamBody<stream::Iter<std::vec::IntoIter<Result<Frame<Bytes>, Infallible>>>> {
    StreamBody::new(stream::iter(chunks.into_iter().map(|chunk| Ok(Frame::data(chunk))).collect::<Vec<_>>()))
}

#[tokio::test]
async fn request_head_round_trip() {
    let (mut client, mut server) = pair();

    let headers = [("accept", "*/*"), ("x-forwarded-for", "10.0.0.1"), ("x-forwarded-for", "10.0.0.2")];
    client.write_request("example.com:8080", &Method::GET, "/search?q=rust", Version::HTTP_11, headers).unwrap();
    client.write_body::<Empty<Bytes>>(Version::HTTP_11, None, false, None).await.unwrap();

    let request = server.read_request().await.unwrap().unwrap();
    assert_eq!(request.method(), &Method::GET);
    assert_eq!(request.target(), "/search?q=rust");
    assert_eq!(request.version(), Version::HTTP_11);
    assert_eq!(request.authority(), Some("example.com:8080"));
    assert_eq!(request.headers()["accept"], "*/*");

    let forwarded: Vec<_> = request.headers().get_all("x-forwarded-for").iter().collect();
    assert_eq!(forwarded, ["10.0.0.1", "10.0.0.2"]);
    assert!(request.headers().get("content-length").is_none());
    assert!(!request.has_body());
}

#[tokio::test]
async fn response_head_round_trip() {
    let (mut client, mut server) = pair();

    client.write_request("localhost", &Method::GET, "/missing", Version::HTTP_11, NO_HEADERS).unwrap();
    client.write_empty_body().await.unwrap();
    drop(server.read_request().await.unwrap());

    server.write_response(Version::HTTP_11, StatusCode::NOT_FOUND, [("content-type", "text/plain")], Some("Nothing Here")).unwrap();
    server.write_body(Version::HTTP_11, Some(Full::new(Bytes::from("not found"))), false, None).await.unwrap();

    let mut response = client.read_response(&Method::GET).await.unwrap();
    assert_eq!(response.version(), Version::HTTP_11);
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.reason(), "Nothing Here");
    assert_eq!(response.headers()["content-type"], "text/plain");
    assert_eq!(response.join().await.unwrap(), Bytes::from_static(b"not found"));
}

#[tokio::test]
async fn fixed_length_body() {
    let (mut client, mut server) = pair();

    client.write_request("localhost", &Method::POST, "/echo", Version::HTTP_11, NO_HEADERS).unwrap();
    client.write_body(Version::HTTP_11, Some(Full::new(Bytes::from("Hello World"))), false, None).await.unwrap();
    assert!(client.is_half_closed_local());

    let mut request = server.read_request().await.unwrap().unwrap();
    assert_eq!(request.body().unwrap().remaining(), Some(11));
    assert_eq!(request.join().await.unwrap(), Bytes::from_static(b"Hello World"));
}

#[tokio::test]
async fn fixed_length_body_with_wrong_length() {
    let (mut client, _server) = pair();

    client.write_request("localhost", &Method::POST, "/", Version::HTTP_11, NO_HEADERS).unwrap();
    let error = client.write_fixed_length_body(Full::new(Bytes::from("Hello")), 10, false).await.unwrap_err();

    assert!(error.is_content_length());
    assert_eq!(error.to_string(), "write error: trying to write 5 bytes, but content length was 10 bytes");
    assert!(!client.is_persistent());
}

#[tokio::test]
async fn chunked_body_with_trailers() {
    let (mut client, mut server) = pair();

    let mut trailers = HeaderMap::new();
    trailers.insert(ETAG, HeaderValue::from_static("abcd"));

    client.write_request("localhost", &Method::PUT, "/upload", Version::HTTP_11, [("trailer", "etag")]).unwrap();
    let body = chunks(vec![Bytes::from("Hello"), Bytes::from(" "), Bytes::from("World")]);
    client.write_body(Version::HTTP_11, Some(body), false, Some(trailers)).await.unwrap();

    let mut request = server.read_request().await.unwrap().unwrap();
    assert!(request.body().unwrap().is_chunked());
    assert_eq!(request.headers()["trailer"], "etag");
    assert!(request.headers().get(ETAG).is_none());

    assert_eq!(request.join().await.unwrap(), Bytes::from_static(b"Hello World"));
    assert_eq!(request.headers()[ETAG], "abcd");
}

#[tokio::test]
async fn chunked_body_larger_than_transport_buffer() {
    let (mut client, mut server) = pair();
    let payload: Vec<Bytes> = (0..64u8).map(|i| Bytes::from(vec![i; 4096])).collect();
    let expected: Vec<u8> = payload.iter().flat_map(|chunk| chunk.iter().copied()).collect();

    let send = async {
        client.write_request("localhost", &Method::POST, "/", Version::HTTP_11, NO_HEADERS).unwrap();
        client.write_chunked_body(chunks(payload), false, None).await.unwrap();
    };
    let receive = async {
        let mut request = server.read_request().await.unwrap().unwrap();
        request.join().await.unwrap()
    };

    let ((), received) = tokio::join!(send, receive);
    assert_eq!(received.len(), expected.len());
    assert_eq!(received, expected);
}

#[tokio::test]
async fn persistent_connection_carries_several_exchanges() {
    let (mut client, mut server) = pair();

    for i in 1..=3 {
        let target = format!("/page/{i}");
        client.write_request("localhost", &Method::GET, &target, Version::HTTP_11, NO_HEADERS).unwrap();
        client.write_empty_body().await.unwrap();

        let request = server.read_request().await.unwrap().unwrap();
        assert_eq!(request.target(), target);
        drop(request);

        server.write_response(Version::HTTP_11, StatusCode::OK, NO_HEADERS, None).unwrap();
        server.write_body(Version::HTTP_11, Some(Full::new(Bytes::from(target.clone()))), false, None).await.unwrap();
        assert_eq!(server.state(), State::Idle);

        let mut response = client.read_response(&Method::GET).await.unwrap();
        assert_eq!(response.join().await.unwrap(), Bytes::from(target));
        drop(response);

        assert_eq!(client.state(), State::Idle);
        assert!(client.is_persistent());
        assert!(server.is_persistent());
        assert_eq!(client.count(), i);
        assert_eq!(server.count(), i);
    }
}

#[tokio::test]
async fn non_persistent_exchange_closes_both_ends() {
    let (mut client, mut server) = pair();

    client.write_request("localhost", &Method::GET, "/", Version::HTTP_11, [("connection", "close")]).unwrap();
    client.write_empty_body().await.unwrap();

    let request = server.read_request().await.unwrap().unwrap();
    drop(request);
    assert!(!server.is_persistent());

    server.write_response(Version::HTTP_11, StatusCode::OK, NO_HEADERS, None).unwrap();
    server.write_body(Version::HTTP_11, Some(Full::new(Bytes::from("bye"))), false, None).await.unwrap();
    assert!(server.is_closed());

    let mut response = client.read_response(&Method::GET).await.unwrap();
    assert_eq!(response.headers()["connection"], "close");
    assert_eq!(response.join().await.unwrap(), Bytes::from_static(b"bye"));
    drop(response);

    assert!(client.is_closed());
    assert!(!client.is_persistent());
    assert!(client.write_request("localhost", &Method::GET, "/", Version::HTTP_11, NO_HEADERS).unwrap_err().is_protocol_state());
}

#[tokio::test]
async fn http10_body_delimited_by_close() {
    let (mut client, mut server) = pair();

    client.write_request("localhost", &Method::GET, "/", Version::HTTP_10, NO_HEADERS).unwrap();
    client.write_empty_body().await.unwrap();
    drop(server.read_request().await.unwrap());

    server.write_response(Version::HTTP_10, StatusCode::OK, NO_HEADERS, None).unwrap();
    let body = chunks(vec![Bytes::from("streamed "), Bytes::from("until close")]);
    server.write_body(Version::HTTP_10, Some(body), false, None).await.unwrap();
    assert!(server.is_closed());

    let mut response = client.read_response(&Method::GET).await.unwrap();
    assert!(response.body().unwrap().is_remainder());
    assert_eq!(response.join().await.unwrap(), Bytes::from_static(b"streamed until close"));
    drop(response);
    assert!(client.is_closed());
}

#[tokio::test]
async fn upgrade_then_hijack_both_ends() {
    let (mut client, mut server) = pair();

    client.write_request("localhost", &Method::GET, "/chat", Version::HTTP_11, NO_HEADERS).unwrap();
    client.write_upgrade_body::<Empty<Bytes>>("websocket", None).await.unwrap();

    let request = server.read_request().await.unwrap().unwrap();
    assert_eq!(request.headers()["upgrade"], "websocket");
    assert_eq!(request.headers()["connection"], "upgrade");
    drop(request);

    server.write_response(Version::HTTP_11, StatusCode::SWITCHING_PROTOCOLS, NO_HEADERS, None).unwrap();
    server.write_upgrade_body::<Empty<Bytes>>("websocket", None).await.unwrap();

    let response = client.read_response(&Method::GET).await.unwrap();
    assert_eq!(response.status(), StatusCode::SWITCHING_PROTOCOLS);
    assert!(!response.has_body());
    drop(response);

    let mut client_stream = client.hijack().await.unwrap();
    let mut server_stream = server.hijack().await.unwrap();
    assert!(client.is_hijacked() && server.is_hijacked());
    assert!(!client.is_persistent() && !server.is_persistent());

    client_stream.write_all(b"ping").await.unwrap();
    let mut ping = [0; 4];
    server_stream.read_exact(&mut ping).await.unwrap();
    assert_eq!(&ping, b"ping");

    server_stream.write_all(b"pong").await.unwrap();
    let mut pong = [0; 4];
    client_stream.read_exact(&mut pong).await.unwrap();
    assert_eq!(&pong, b"pong");

    assert!(server.read_request().await.unwrap_err().is_protocol_state());
    assert!(client.write_empty_body().await.unwrap_err().is_protocol_state());
}

#[tokio::test]
async fn request_line_longer_than_limit() {
    let (mut client, mut server) = pair_with_config(Config::new().max_line_length(32));

    let target = format!("/{}", "a".repeat(64));
    client.write_request("localhost", &Method::GET, &target, Version::HTTP_11, NO_HEADERS).unwrap();
    client.write_empty_body().await.unwrap();

    assert!(server.read_request().await.unwrap_err().is_line_too_long());
}

#[tokio::test]
async fn too_many_headers() {
    let (mut client, mut server) = pair_with_config(Config::new().max_headers(4));

    let headers: Vec<_> = (0..8).map(|i| (format!("x-header-{i}"), "value")).collect();
    client.write_request("localhost", &Method::GET, "/", Version::HTTP_11, headers).unwrap();
    client.write_empty_body().await.unwrap();

    let error = server.read_request().await.unwrap_err();
    assert!(matches!(error.as_parse_error(), Some(ParseError::TooManyHeaders { max_num: 4 })));
}
