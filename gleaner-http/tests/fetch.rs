use gleaner_http::assets::{ImageDownloader, ImageNaming};
use gleaner_http::{HttpClient, HttpError, RequestOpts};
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> HttpClient {
    HttpClient::new()
        .expect("client builds")
        .with_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn get_text_returns_page_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .and(query_param("lang", "en"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string("<html><body><p>héllo</p></body></html>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let opts = RequestOpts {
        query: Some(vec![("lang", "en".into())]),
        ..Default::default()
    };
    let body = client()
        .get_text(&format!("{}/page", server.uri()), opts)
        .await
        .expect("page fetched");

    assert!(body.contains("<p>héllo</p>"));
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let body = client()
        .get_text(&format!("{}/flaky", server.uri()), RequestOpts::default())
        .await
        .expect("second attempt succeeds");

    assert_eq!(body, "ok");
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such page"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client()
        .get_text(&format!("{}/missing", server.uri()), RequestOpts::default())
        .await
        .unwrap_err();

    match err {
        HttpError::Api { status, message } => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(message, "no such page");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn retry_budget_is_respected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let opts = RequestOpts {
        retries: Some(1),
        ..Default::default()
    };
    let err = client()
        .get_bytes(&format!("{}/down", server.uri()), opts)
        .await
        .unwrap_err();

    assert!(matches!(err, HttpError::Api { .. }));
}

#[tokio::test]
async fn relative_urls_are_rejected() {
    let err = client()
        .get_text("/no-host", RequestOpts::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Url(_)));
}

#[tokio::test]
async fn images_are_written_in_input_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/a.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/b.gif"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![4u8]))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("assets");
    let http = client();
    let urls = vec![
        Url::parse(&format!("{}/img/a.jpg", server.uri())).unwrap(),
        Url::parse(&format!("{}/img/b.gif?v=1", server.uri())).unwrap(),
    ];

    let saved = ImageDownloader::new(&http, &dir, ImageNaming::ReplaceAppendix("png".into()))
        .with_concurrency(2)
        .download_all(&urls)
        .await
        .expect("images saved");

    assert_eq!(saved, vec![dir.join("a.png"), dir.join("b.png")]);
    assert_eq!(std::fs::read(dir.join("a.png")).unwrap(), vec![1, 2, 3]);
    assert_eq!(std::fs::read(dir.join("b.png")).unwrap(), vec![4]);
}

#[tokio::test]
async fn images_sharing_a_name_are_kept_apart() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a/logo.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![1u8; 10])
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b/logo.gif"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![2u8; 5]))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("assets");
    let http = client();
    let urls = vec![
        Url::parse(&format!("{}/a/logo.jpg", server.uri())).unwrap(),
        Url::parse(&format!("{}/b/logo.gif", server.uri())).unwrap(),
    ];

    let saved = ImageDownloader::new(&http, &dir, ImageNaming::ReplaceAppendix("png".into()))
        .with_concurrency(2)
        .download_all(&urls)
        .await
        .expect("images saved");

    assert_eq!(saved, vec![dir.join("logo.png"), dir.join("logo-1.png")]);
    assert_eq!(std::fs::read(&saved[0]).unwrap(), vec![1u8; 10]);
    assert_eq!(std::fs::read(&saved[1]).unwrap(), vec![2u8; 5]);
}

#[tokio::test]
async fn get_text_falls_back_to_meta_charset() {
    let server = MockServer::start().await;
    let mut body = br#"<html><head><meta charset="shift_jis"></head><body><p>"#.to_vec();
    body.extend_from_slice(&[0x93, 0xFA, 0x96, 0x7B]);
    body.extend_from_slice(b"</p></body></html>");
    Mock::given(method("GET"))
        .and(path("/sjis"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(&server)
        .await;

    let text = client()
        .get_text(&format!("{}/sjis", server.uri()), RequestOpts::default())
        .await
        .expect("page fetched");

    assert!(text.contains("<p>日本</p>"), "decoded body: {text}");
}

#[tokio::test]
async fn header_charset_wins_over_meta() {
    let server = MockServer::start().await;
    let mut body = br#"<meta http-equiv="Content-Type" content="text/html; charset=shift_jis"><p>Caf"#.to_vec();
    body.push(0xE9);
    body.extend_from_slice(b"</p>");
    Mock::given(method("GET"))
        .and(path("/latin1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=ISO-8859-1"))
        .mount(&server)
        .await;

    let text = client()
        .get_text(&format!("{}/latin1", server.uri()), RequestOpts::default())
        .await
        .expect("page fetched");

    assert!(text.ends_with("<p>Café</p>"), "decoded body: {text}");
}
