use super::*;

fn test_client(base_url: &str) -> SearchClient {
    SearchClient::new("test-key", 30, base_url).expect("client construction should not fail")
}

#[test]
fn build_url_first_page_has_no_cursor() {
    let client = test_client("https://api.example.com/twitter/tweet/advanced_search");
    let url = client.build_url("tariff", None);
    assert_eq!(
        url.as_str(),
        "https://api.example.com/twitter/tweet/advanced_search?query=tariff&queryType=Top"
    );
}

#[test]
fn build_url_appends_cursor_and_query_type() {
    let client = test_client("https://api.example.com/search").with_query_type("Latest");
    let url = client.build_url("tariff", Some("CURSOR1"));
    assert_eq!(
        url.as_str(),
        "https://api.example.com/search?query=tariff&queryType=Latest&cursor=CURSOR1"
    );
}

#[test]
fn build_url_encodes_query_operators() {
    let client = test_client("https://api.example.com/search");
    let url = client.build_url("(tariff OR \"trade war\") since:2025-09-29", None);
    let query = url.query().unwrap_or_default();
    assert!(
        !query.contains(' ') && !query.contains('"'),
        "query should be percent-encoded: {url}"
    );
    let decoded: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert_eq!(
        decoded[0].1,
        "(tariff OR \"trade war\") since:2025-09-29"
    );
}

#[test]
fn invalid_base_url_is_rejected() {
    let err = SearchClient::new("k", 30, "not a url").err().expect("should fail");
    assert!(matches!(err, CollectorError::InvalidBaseUrl { .. }));
}
