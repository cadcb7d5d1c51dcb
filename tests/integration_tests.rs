//! Integration tests for Bookfinder
//!
//! These drive a `BrowseSession` end to end, against the in-memory source and
//! against the Open Library adapter talking to a local mock server.

use bookfinder::config::SearchConfig;
use bookfinder::models::{BookDetail, SearchResult, SortOrder};
use bookfinder::search::{BrowseSession, DetailState, QueryEvent, SessionUpdate};
use bookfinder::sources::mock::{make_book, MockSource, SearchCall};
use bookfinder::sources::{OpenLibrarySource, SourceError};
use bookfinder::FilterCriteria;
use mockito::Matcher;
use std::sync::Arc;
use std::time::Duration;

fn harry_potter_page() -> SearchResult {
    SearchResult::new(
        vec![
            make_book("OL82563W", "Harry Potter and the Philosopher's Stone", Some(1997))
                .authors(["J. K. Rowling"])
                .languages(["eng", "fre"]),
            make_book("OL82586W", "Harry Potter and the Deathly Hallows", Some(2007))
                .authors(["J. K. Rowling"])
                .languages(["eng"]),
            make_book("OL82537W", "Harry Potter and the Chamber of Secrets", Some(1998))
                .authors(["J. K. Rowling"])
                .languages(["spa"]),
        ],
        1024,
    )
}

#[tokio::test(start_paused = true)]
async fn test_browse_select_and_close_discards_late_details() {
    let mock = Arc::new(MockSource::new());
    mock.set_search_response("harry potter", harry_potter_page());
    mock.set_detail_response(
        "OL82537W",
        BookDetail {
            description: Some("The second year at Hogwarts.".to_string()),
            subjects: vec!["Magic".to_string(), "Schools".to_string()],
            ..BookDetail::default()
        },
    );
    mock.set_delay("OL82537W", Duration::from_millis(250));

    let mut session = BrowseSession::new(mock.clone(), &SearchConfig::default());
    session.handle_query(QueryEvent::Changed("harry potter".to_string()));
    session.settle().await;

    assert_eq!(
        mock.search_calls(),
        vec![SearchCall {
            query: "harry potter".to_string(),
            page: 1,
            limit: 20
        }]
    );
    assert_eq!(session.visible_books().len(), 3);
    assert_eq!(session.result().total_count, 1024);
    assert_eq!(session.page_window().total_pages, 52);

    // Third result loads
    assert!(session.select(2));
    assert_eq!(
        session.detail_state(),
        &DetailState::Loading {
            work_id: "OL82537W".to_string()
        }
    );
    session.settle().await;
    match session.detail_state() {
        DetailState::Loaded(detail) => {
            assert_eq!(
                detail.description.as_deref(),
                Some("The second year at Hogwarts.")
            );
            assert_eq!(detail.subjects, vec!["Magic", "Schools"]);
        }
        other => panic!("unexpected detail state {:?}", other),
    }

    // Closing before the next response arrives discards it
    assert!(session.select(2));
    session.close_details();
    assert_eq!(session.next_update().await, Some(SessionUpdate::Stale));
    assert_eq!(session.detail_state(), &DetailState::Idle);
    assert!(session.selected_book().is_none());
    assert_eq!(mock.detail_calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_superseded_query_never_renders() {
    let mock = Arc::new(MockSource::new());
    mock.set_search_response("harry", harry_potter_page());
    mock.set_search_response("dune", SearchResult::new(vec![make_book("OL1W", "Dune", Some(1965))], 1));
    mock.set_delay("harry", Duration::from_secs(3));

    let mut session = BrowseSession::new(mock.clone(), &SearchConfig::default());

    session.handle_query(QueryEvent::Changed("harry".to_string()));
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(matches!(
        session.next_update().await,
        Some(SessionUpdate::QueryCommitted { dispatched: true, .. })
    ));

    session.handle_query(QueryEvent::Changed("dune".to_string()));
    let updates = session.settle().await;
    assert!(updates.contains(&SessionUpdate::ResultsApplied));
    assert_eq!(session.query(), "dune");

    assert_eq!(session.next_update().await, Some(SessionUpdate::Stale));
    let titles: Vec<String> = session.visible_books().into_iter().map(|b| b.title).collect();
    assert_eq!(titles, vec!["Dune".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_filters_and_sort_over_fetched_page() {
    let mock = Arc::new(MockSource::new());
    mock.set_search_response("harry potter", harry_potter_page());

    let mut session = BrowseSession::new(mock.clone(), &SearchConfig::default());
    session.handle_query(QueryEvent::Submit("harry potter".to_string()));
    session.settle().await;

    session.set_filters(FilterCriteria::new().language("eng").sort(SortOrder::Newest));
    let years: Vec<Option<i32>> = session
        .visible_books()
        .into_iter()
        .map(|b| b.first_publish_year)
        .collect();
    assert_eq!(years, vec![Some(2007), Some(1997)]);

    session.set_filters(FilterCriteria::new().max_year(1997));
    assert_eq!(session.visible_books().len(), 1);
    assert_eq!(mock.search_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_search_recovers_on_next_query() {
    let mock = Arc::new(MockSource::new());
    mock.set_search_error("harry potter", SourceError::Api { status: 503 });
    let mut session = BrowseSession::new(mock.clone(), &SearchConfig::default());
    let mut errors = session.subscribe_errors();

    session.handle_query(QueryEvent::Submit("harry potter".to_string()));
    session.settle().await;
    assert!(session.result().is_empty());
    let failure = errors.try_recv().unwrap();
    assert_eq!(failure.error, SourceError::Api { status: 503 });

    mock.set_search_response("harry potter", harry_potter_page());
    session.handle_query(QueryEvent::Submit("harry potter".to_string()));
    session.settle().await;
    assert_eq!(session.visible_books().len(), 3);
    assert!(session.last_error().is_none());
}

#[tokio::test]
async fn test_session_against_open_library_http() {
    let mut server = mockito::Server::new_async().await;
    let search = server
        .mock("GET", "/search.json")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "dune".into()),
            Matcher::UrlEncoded("page".into(), "1".into()),
        ]))
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"numFound": 1, "docs": [
                {"key": "/works/OL893415W", "title": "Dune", "author_name": ["Frank Herbert"],
                 "first_publish_year": 1965, "cover_i": 11481354, "language": ["eng"]}
            ]}"#,
        )
        .create_async()
        .await;
    let work = server
        .mock("GET", "/works/OL893415W.json")
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"title": "Dune",
                "description": [{"type": "/type/text", "value": "Arrakis."}, "Second"],
                "subjects": ["Science fiction", "Deserts"]}"#,
        )
        .create_async()
        .await;

    let source = OpenLibrarySource::with_base_url(server.url()).unwrap();
    let config = SearchConfig {
        debounce_ms: 20,
        ..SearchConfig::default()
    };
    let mut session = BrowseSession::new(Arc::new(source), &config);

    session.handle_query(QueryEvent::Changed("dune".to_string()));
    session.settle().await;
    search.assert_async().await;

    let books = session.visible_books();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].author_line(), "Frank Herbert");

    assert!(session.select(0));
    session.settle().await;
    work.assert_async().await;

    match session.detail_state() {
        DetailState::Loaded(detail) => {
            assert_eq!(detail.description.as_deref(), Some("Arrakis."));
            assert_eq!(detail.subjects.len(), 2);
        }
        other => panic!("unexpected detail state {:?}", other),
    }
}

#[tokio::test]
async fn test_book_without_key_is_unavailable() {
    let mock = Arc::new(MockSource::new());
    mock.set_search_response(
        "keyless",
        SearchResult::new(vec![bookfinder::BookSummary::new("", "Keyless")], 1),
    );
    let mut session = BrowseSession::new(mock.clone(), &SearchConfig::default());
    session.handle_query(QueryEvent::Submit("keyless".to_string()));
    session.settle().await;

    assert!(session.select(0));
    assert_eq!(session.detail_state(), &DetailState::Unavailable);
    assert!(session.is_idle());
    assert!(mock.detail_calls().is_empty());
}
