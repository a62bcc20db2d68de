use common::FeedSource;
use intelbrief::ingestion::{feed_client, fetch_source, FEED_ENTRY_CAP};
use intelbrief::item::ItemKind;

fn rss_body(entry_count: usize) -> String {
    let mut items = String::new();
    for i in 0..entry_count {
        items.push_str(&format!(
            r#"<item>
                <title>Story {i}</title>
                <link>https://news.example/story-{i}</link>
                <description>Summary of story {i}</description>
            </item>"#
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
        <rss version="2.0">
            <channel>
                <title>Test Feed</title>
                <link>https://news.example</link>
                <description>Feed for tests</description>
                {items}
            </channel>
        </rss>"#
    )
}

#[tokio::test]
async fn caps_entries_and_builds_headline_items() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/feed")
        .with_status(200)
        .with_header("content-type", "application/rss+xml")
        .with_body(rss_body(5))
        .create_async()
        .await;

    let client = feed_client(5).expect("client");
    let source = FeedSource {
        name: "Test Feed".to_string(),
        url: format!("{}/feed", server.url()),
    };

    let items = fetch_source(&client, &source).await.expect("fetch");

    assert_eq!(items.len(), FEED_ENTRY_CAP);
    assert_eq!(items[0].source, "Test Feed");
    assert_eq!(items[0].title, "Story 0");
    assert_eq!(items[0].url, "https://news.example/story-0");
    assert_eq!(items[0].content, "Summary of story 0");
    assert_eq!(items[0].kind, ItemKind::Headline);
    assert!(items[0].original_source.is_none());

    mock.assert_async().await;
}

#[tokio::test]
async fn empty_feed_is_ok_not_error() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/feed")
        .with_status(200)
        .with_header("content-type", "application/rss+xml")
        .with_body(rss_body(0))
        .create_async()
        .await;

    let client = feed_client(5).expect("client");
    let source = FeedSource {
        name: "Empty Feed".to_string(),
        url: format!("{}/feed", server.url()),
    };

    let items = fetch_source(&client, &source).await.expect("fetch");
    assert!(items.is_empty());

    mock.assert_async().await;
}

#[tokio::test]
async fn http_error_is_returned_to_the_caller() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/feed")
        .with_status(404)
        .create_async()
        .await;

    let client = feed_client(5).expect("client");
    let source = FeedSource {
        name: "Gone Feed".to_string(),
        url: format!("{}/feed", server.url()),
    };

    let result = fetch_source(&client, &source).await;
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("404"));

    mock.assert_async().await;
}

#[tokio::test]
async fn entry_without_link_is_skipped() {
    let body = r#"<?xml version="1.0" encoding="UTF-8"?>
        <rss version="2.0">
            <channel>
                <title>Test Feed</title>
                <link>https://news.example</link>
                <description>Feed for tests</description>
                <item>
                    <title>Linkless story</title>
                    <description>No link here</description>
                </item>
                <item>
                    <title>Linked story</title>
                    <link>https://news.example/linked</link>
                    <description>Has a link</description>
                </item>
            </channel>
        </rss>"#;

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/feed")
        .with_status(200)
        .with_header("content-type", "application/rss+xml")
        .with_body(body)
        .create_async()
        .await;

    let client = feed_client(5).expect("client");
    let source = FeedSource {
        name: "Test Feed".to_string(),
        url: format!("{}/feed", server.url()),
    };

    let items = fetch_source(&client, &source).await.expect("fetch");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].url, "https://news.example/linked");

    mock.assert_async().await;
}
