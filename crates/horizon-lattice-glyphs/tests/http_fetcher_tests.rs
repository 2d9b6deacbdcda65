//! Integration tests for the HTTP glyph fetcher.

#![cfg(feature = "http")]

use std::sync::Arc;

use horizon_lattice_glyphs::http::HttpGlyphFetcher;
use horizon_lattice_glyphs::{
    FetchError, GlyphError, GlyphManager, GlyphManagerConfig, GlyphRangeFetcher, GlyphRequest,
};
use prost::Message;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Clone, PartialEq, Message)]
struct Glyphs {
    #[prost(message, repeated, tag = "1")]
    stacks: Vec<Fontstack>,
}

#[derive(Clone, PartialEq, Message)]
struct Fontstack {
    #[prost(string, optional, tag = "1")]
    name: Option<String>,
    #[prost(string, optional, tag = "2")]
    range: Option<String>,
    #[prost(message, repeated, tag = "3")]
    glyphs: Vec<Glyph>,
}

#[derive(Clone, PartialEq, Message)]
struct Glyph {
    #[prost(uint32, optional, tag = "1")]
    id: Option<u32>,
    #[prost(bytes = "vec", optional, tag = "2")]
    bitmap: Option<Vec<u8>>,
    #[prost(uint32, optional, tag = "3")]
    width: Option<u32>,
    #[prost(uint32, optional, tag = "4")]
    height: Option<u32>,
    #[prost(sint32, optional, tag = "5")]
    left: Option<i32>,
    #[prost(sint32, optional, tag = "6")]
    top: Option<i32>,
    #[prost(uint32, optional, tag = "7")]
    advance: Option<u32>,
}

fn glyph_payload(stack: &str, ids: &[u32]) -> Vec<u8> {
    Glyphs {
        stacks: vec![Fontstack {
            name: Some(stack.to_string()),
            range: Some("0-255".to_string()),
            glyphs: ids
                .iter()
                .map(|&id| Glyph {
                    id: Some(id),
                    bitmap: Some(vec![id as u8; 14 * 16]),
                    width: Some(8),
                    height: Some(10),
                    left: Some(0),
                    top: Some(-14),
                    advance: Some(9),
                })
                .collect(),
        }],
    }
    .encode_to_vec()
}

#[tokio::test]
async fn test_fetch_decodes_range() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fonts/Roboto-Regular/0-255.pbf"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(glyph_payload("Roboto-Regular", &[65])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = HttpGlyphFetcher::new().expect("Failed to create fetcher");
    let template = format!("{}/fonts/{{fontstack}}/{{range}}.pbf", mock_server.uri());
    let range = fetcher
        .fetch("Roboto-Regular", 0, &template)
        .await
        .expect("Fetch failed");

    assert_eq!(range.len(), 256);
    let a = range[&65].as_ref().expect("glyph A");
    assert_eq!(a.bitmap.width(), 14);
    assert_eq!(a.bitmap.height(), 16);
    assert_eq!(a.metrics.top, -14);
    assert_eq!(range[&66], None);
}

#[tokio::test]
async fn test_fetch_reports_http_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let fetcher = HttpGlyphFetcher::new().expect("Failed to create fetcher");
    let template = format!("{}/{{fontstack}}/{{range}}.pbf", mock_server.uri());
    let err = fetcher.fetch("Arial", 1, &template).await.unwrap_err();
    assert_eq!(err, FetchError::HttpStatus { status: 404 });
}

#[tokio::test]
async fn test_manager_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/Arial/0-255.pbf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(glyph_payload("Arial", &[72, 105])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Arial/256-511.pbf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xff, 0xff]))
        .mount(&mock_server)
        .await;

    let fetcher = Arc::new(HttpGlyphFetcher::new().expect("Failed to create fetcher"));
    let config = GlyphManagerConfig::new()
        .with_service_url(format!("{}/{{fontstack}}/{{range}}.pbf", mock_server.uri()));
    let manager = GlyphManager::new(config, fetcher);

    let request = GlyphRequest::from([("Arial".to_string(), vec![72, 105, 33])]);
    let response = manager.get_glyphs(&request).await.expect("Batch failed");
    assert!(response["Arial"][&72].is_some());
    assert!(response["Arial"][&105].is_some());
    assert_eq!(response["Arial"][&33], None);

    let request = GlyphRequest::from([("Arial".to_string(), vec![300])]);
    let err = manager.get_glyphs(&request).await.unwrap_err();
    assert!(matches!(
        err,
        GlyphError::FetchFailed {
            range: 1,
            source: FetchError::Decode(_),
            ..
        }
    ));
}

#[tokio::test]
async fn test_oversized_glyph_fails_range_fetch() {
    let mock_server = MockServer::start().await;

    let payload = Glyphs {
        stacks: vec![Fontstack {
            name: Some("Arial".to_string()),
            range: Some("0-255".to_string()),
            glyphs: vec![Glyph {
                id: Some(65),
                bitmap: None,
                width: Some(u32::MAX - 1),
                height: Some(1),
                left: Some(0),
                top: Some(-14),
                advance: Some(9),
            }],
        }],
    }
    .encode_to_vec();
    Mock::given(method("GET"))
        .and(path("/Arial/0-255.pbf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(payload))
        .mount(&mock_server)
        .await;

    let fetcher = Arc::new(HttpGlyphFetcher::new().expect("Failed to create fetcher"));
    let config = GlyphManagerConfig::new()
        .with_service_url(format!("{}/{{fontstack}}/{{range}}.pbf", mock_server.uri()));
    let manager = GlyphManager::new(config, fetcher);

    let request = GlyphRequest::from([("Arial".to_string(), vec![65, 66])]);
    let err = manager.get_glyphs(&request).await.unwrap_err();
    assert!(matches!(
        err,
        GlyphError::FetchFailed {
            range: 0,
            source: FetchError::Decode(_),
            ..
        }
    ));
    assert!(!manager.cache().is_range_loaded("Arial", 0));
}
