//! Open Library catalogue source implementation.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::ApiConfig;
use crate::models::{BookDetail, BookSummary, Description, SearchResult};
use crate::sources::{Source, SourceError};
use crate::utils::HttpClient;

/// Open Library catalogue source
///
/// Uses the public `search.json` and `works/{id}.json` endpoints.
#[derive(Debug, Clone)]
pub struct OpenLibrarySource {
    http: HttpClient,
    base_url: String,
}

impl OpenLibrarySource {
    /// Create a source from API settings
    pub fn new(config: &ApiConfig) -> Result<Self, SourceError> {
        Ok(Self {
            http: HttpClient::from_config(config)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a source pointed at a different host, with default timeouts
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, SourceError> {
        let config = ApiConfig {
            base_url: base_url.into(),
            ..ApiConfig::default()
        };
        Self::new(&config)
    }

    /// Build request URL
    fn build_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Send a GET and return the body of a successful response
    async fn get_body(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<String, SourceError> {
        let response = request
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to fetch {}: {}", what, e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            return Err(SourceError::Api {
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }

    fn parse_doc(doc: OLDoc) -> BookSummary {
        BookSummary {
            id: doc.key,
            title: doc.title,
            author_names: doc.author_name,
            first_publish_year: doc.first_publish_year,
            cover_image_id: doc.cover_i,
            languages: doc.language,
        }
    }

    fn parse_work(work: OLWork) -> BookDetail {
        BookDetail {
            subjects: work.subjects,
            description: work.description.as_ref().and_then(Description::resolve),
            first_publish_date: work.first_publish_date,
            edition_count: work.edition_count,
            number_of_pages: work.number_of_pages,
        }
    }
}

#[async_trait]
impl Source for OpenLibrarySource {
    fn id(&self) -> &str {
        "openlibrary"
    }

    async fn search(
        &self,
        query: &str,
        page: u32,
        limit: u32,
    ) -> Result<SearchResult, SourceError> {
        if query.trim().is_empty() {
            return Err(SourceError::InvalidRequest("empty query".to_string()));
        }

        let page = page.max(1).to_string();
        let limit = limit.to_string();
        let request = self
            .http
            .client()
            .get(self.build_url("/search.json"))
            .query(&[("q", query), ("page", page.as_str()), ("limit", limit.as_str())]);

        tracing::debug!(query, page = %page, "Searching Open Library");

        let body = self.get_body(request, "search results").await?;
        let data: OLSearchResponse = serde_json::from_str(&body)?;

        let total = data.total()?;
        let items = data.docs.into_iter().map(Self::parse_doc).collect();
        Ok(SearchResult::new(items, total))
    }

    async fn work_details(&self, work_id: &str) -> Result<BookDetail, SourceError> {
        let work_id = work_id.trim();
        if work_id.is_empty() || work_id.contains('/') {
            return Err(SourceError::InvalidRequest(format!(
                "invalid work id '{}'",
                work_id
            )));
        }

        let url = self.build_url(&format!("/works/{}.json", urlencoding::encode(work_id)));

        tracing::debug!(work_id, "Fetching work details");

        let body = self
            .get_body(self.http.client().get(url), &format!("work {}", work_id))
            .await?;
        let data: OLWork = serde_json::from_str(&body)?;

        Ok(Self::parse_work(data))
    }
}

// ===== Open Library API Types =====

#[derive(Debug, Deserialize)]
struct OLSearchResponse {
    docs: Vec<OLDoc>,
    // The live API sends both spellings; older mirrors only the snake case one
    #[serde(rename = "numFound")]
    num_found_camel: Option<u64>,
    num_found: Option<u64>,
}

impl OLSearchResponse {
    fn total(&self) -> Result<u64, SourceError> {
        self.num_found_camel
            .or(self.num_found)
            .ok_or_else(|| SourceError::Parse("missing field `numFound`".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct OLDoc {
    key: String,
    title: String,
    #[serde(default)]
    author_name: Vec<String>,
    first_publish_year: Option<i32>,
    cover_i: Option<i64>,
    #[serde(default)]
    language: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OLWork {
    #[serde(default)]
    subjects: Vec<String>,
    description: Option<Description>,
    first_publish_date: Option<String>,
    number_of_pages: Option<u32>,
    edition_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const SEARCH_BODY: &str = r#"{
        "numFound": 2,
        "start": 0,
        "docs": [
            {
                "key": "/works/OL82563W",
                "title": "Harry Potter and the Philosopher's Stone",
                "author_name": ["J. K. Rowling"],
                "first_publish_year": 1997,
                "cover_i": 10521270,
                "language": ["eng", "fre"]
            },
            {
                "key": "/works/OL82586W",
                "title": "Harry Potter and the Deathly Hallows"
            }
        ]
    }"#;

    fn source_for(server: &mockito::ServerGuard) -> OpenLibrarySource {
        OpenLibrarySource::with_base_url(server.url()).unwrap()
    }

    #[tokio::test]
    async fn test_search_sends_query_page_and_limit() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search.json")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "harry potter".into()),
                Matcher::UrlEncoded("page".into(), "1".into()),
                Matcher::UrlEncoded("limit".into(), "20".into()),
            ]))
            .with_header("content-type", "application/json")
            .with_body(SEARCH_BODY)
            .create_async()
            .await;

        let source = source_for(&server);
        let result = source.search("harry potter", 1, 20).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.total_count, 2);
        assert_eq!(result.items.len(), 2);

        let first = &result.items[0];
        assert_eq!(first.id, "/works/OL82563W");
        assert_eq!(first.author_names, vec!["J. K. Rowling"]);
        assert_eq!(first.first_publish_year, Some(1997));
        assert_eq!(first.cover_image_id, Some(10521270));
        assert_eq!(first.languages, vec!["eng", "fre"]);

        let second = &result.items[1];
        assert!(second.author_names.is_empty());
        assert_eq!(second.first_publish_year, None);
        assert_eq!(second.cover_image_id, None);
    }

    #[tokio::test]
    async fn test_search_accepts_snake_case_count() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search.json")
            .match_query(Matcher::Any)
            .with_body(r#"{"num_found": 0, "docs": []}"#)
            .create_async()
            .await;

        let result = source_for(&server)
            .search("nothing", 1, 20)
            .await
            .unwrap();
        assert_eq!(result, SearchResult::empty());
    }

    #[tokio::test]
    async fn test_search_accepts_live_response_shape() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search.json")
            .match_query(Matcher::Any)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"numFound": 1, "start": 0, "numFoundExact": true,
                    "docs": [{"key": "/works/OL893415W", "title": "Dune"}],
                    "num_found": 1, "q": "dune", "offset": null}"#,
            )
            .create_async()
            .await;

        let result = source_for(&server).search("dune", 1, 20).await.unwrap();
        assert_eq!(result.total_count, 1);
        assert_eq!(result.items[0].title, "Dune");
    }

    #[tokio::test]
    async fn test_search_without_count_fails_closed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search.json")
            .match_query(Matcher::Any)
            .with_body(r#"{"docs": []}"#)
            .create_async()
            .await;

        let err = source_for(&server)
            .search("dune", 1, 20)
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }

    #[tokio::test]
    async fn test_search_malformed_payload_fails_closed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search.json")
            .match_query(Matcher::Any)
            .with_body(r#"{"numFound": 1, "docs": [{"key": "/works/OL1W"}]}"#)
            .create_async()
            .await;

        let err = source_for(&server)
            .search("dune", 1, 20)
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }

    #[tokio::test]
    async fn test_search_server_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search.json")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let err = source_for(&server)
            .search("dune", 2, 20)
            .await
            .unwrap_err();
        assert_eq!(err, SourceError::Api { status: 503 });
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected_locally() {
        let source = OpenLibrarySource::with_base_url("http://127.0.0.1:9").unwrap();
        let err = source.search("   ", 1, 20).await.unwrap_err();
        assert!(matches!(err, SourceError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_work_details_normalizes_description() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/works/OL82563W.json")
            .with_body(
                r#"{
                    "title": "Harry Potter and the Philosopher's Stone",
                    "subjects": ["Magic", "Wizards"],
                    "description": {"type": "/type/text", "value": "A boy learns he is a wizard."},
                    "first_publish_date": "June 26, 1997",
                    "edition_count": 350
                }"#,
            )
            .create_async()
            .await;

        let detail = source_for(&server)
            .work_details("OL82563W")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(detail.subjects, vec!["Magic", "Wizards"]);
        assert_eq!(
            detail.description.as_deref(),
            Some("A boy learns he is a wizard.")
        );
        assert_eq!(detail.first_publish_date.as_deref(), Some("June 26, 1997"));
        assert_eq!(detail.edition_count, Some(350));
        assert_eq!(detail.number_of_pages, None);
    }

    #[tokio::test]
    async fn test_work_details_missing_fields() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/works/OL1W.json")
            .with_body(r#"{"title": "Sparse"}"#)
            .create_async()
            .await;

        let detail = source_for(&server).work_details("OL1W").await.unwrap();
        assert_eq!(detail, BookDetail::default());
    }

    #[tokio::test]
    async fn test_work_details_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/works/OL0W.json")
            .with_status(404)
            .create_async()
            .await;

        let err = source_for(&server)
            .work_details("OL0W")
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
    }
}
