// src/api/pagination.rs
//! Page-numbered walk of the Vista listing endpoint.
//!
//! Page 1 is fetched first to learn `paginas`; its response is reused as the
//! first yielded page, so a walk over `n` pages issues exactly `n` requests.

use super::responses::ListingPageBody;
use super::retry::{Fetched, RetryPolicy};
use super::types::ListingQuery;
use super::ApiTransport;
use crate::config::ApiConfig;
use crate::error::AppError;
use futures::stream::{self, Stream, TryStreamExt};
use serde_json::Value;
use std::sync::Arc;

/// Position of an in-progress walk. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    /// 1-based number of the next page to fetch
    pub page_number: u32,
    pub page_size: u32,
    /// Discovered from page 1 and fixed thereafter
    pub total_pages: u32,
}

impl PageCursor {
    fn advance(self) -> Option<Self> {
        (self.page_number < self.total_pages).then(|| Self {
            page_number: self.page_number + 1,
            ..self
        })
    }
}

/// One yielded page: its number and its object-typed items.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPage {
    pub number: u32,
    pub total_pages: u32,
    pub items: Vec<Value>,
}

enum WalkState {
    Start,
    Next(PageCursor),
}

/// Walks every page of the listing endpoint for one [`ListingQuery`].
pub struct ListingFetcher {
    transport: Arc<dyn ApiTransport>,
    policy: RetryPolicy,
    config: ApiConfig,
    query: ListingQuery,
}

impl ListingFetcher {
    pub fn new(
        transport: Arc<dyn ApiTransport>,
        policy: RetryPolicy,
        config: ApiConfig,
        query: ListingQuery,
    ) -> Self {
        Self {
            transport,
            policy,
            config,
            query,
        }
    }

    /// Fetches and decodes one page. A "no data" answer is an empty page.
    async fn fetch_page(&self, page: u32) -> Result<ListingPageBody, AppError> {
        let request = self.query.page_request(&self.config, page);
        match self.policy.execute(self.transport.as_ref(), &request).await? {
            Fetched::Payload(body) => ListingPageBody::from_value(body),
            Fetched::NoData => Ok(ListingPageBody {
                total_pages: 1,
                items: Vec::new(),
            }),
        }
    }

    /// A lazy, finite stream of pages in order.
    ///
    /// The first error ends the stream.
    pub fn pages(&self) -> impl Stream<Item = Result<ListingPage, AppError>> + '_ {
        stream::try_unfold(Some(WalkState::Start), move |state| async move {
            let cursor = match state {
                None => return Ok::<_, AppError>(None),
                Some(WalkState::Start) => {
                    let first = self.fetch_page(1).await?;
                    let cursor = PageCursor {
                        page_number: 1,
                        page_size: self.query.page_size,
                        total_pages: first.total_pages,
                    };
                    log::info!(
                        "Listing walk: {} page(s) of up to {} items",
                        cursor.total_pages,
                        cursor.page_size
                    );
                    if cursor.total_pages == 0 {
                        return Ok(None);
                    }
                    let page = ListingPage {
                        number: 1,
                        total_pages: cursor.total_pages,
                        items: first.items,
                    };
                    return Ok(Some((page, cursor.advance().map(WalkState::Next))));
                }
                Some(WalkState::Next(cursor)) => cursor,
            };

            let body = self.fetch_page(cursor.page_number).await?;
            let page = ListingPage {
                number: cursor.page_number,
                total_pages: cursor.total_pages,
                items: body.items,
            };
            Ok(Some((page, cursor.advance().map(WalkState::Next))))
        })
    }

    /// Collects every item of every page, in page order.
    pub async fn fetch_all(&self) -> Result<Vec<Value>, AppError> {
        self.pages()
            .try_fold(Vec::new(), |mut all, page| async move {
                log::info!(
                    "Fetched listing page {}/{} ({} items)",
                    page.number,
                    page.total_pages,
                    page.items.len()
                );
                all.extend(page.items);
                Ok(all)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiResponse, RecordingPause, RequestDescriptor};
    use crate::types::{ApiKey, ValidatedUrl};
    use parking_lot::Mutex;
    use reqwest::StatusCode;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    /// Serves canned bodies keyed by the requested page number.
    struct PagedTransport {
        pages: HashMap<u64, (u16, Value)>,
        requested: Mutex<Vec<u64>>,
    }

    impl PagedTransport {
        fn new(pages: Vec<(u64, u16, Value)>) -> Self {
            Self {
                pages: pages.into_iter().map(|(n, s, b)| (n, (s, b))).collect(),
                requested: Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<u64> {
            self.requested.lock().clone()
        }
    }

    #[async_trait::async_trait]
    impl ApiTransport for PagedTransport {
        async fn get(&self, request: &RequestDescriptor) -> Result<ApiResponse<String>, AppError> {
            let search: Value =
                serde_json::from_str(request.query_value("pesquisa").unwrap()).unwrap();
            let page = search["paginacao"]["pagina"].as_u64().unwrap();
            self.requested.lock().push(page);
            let (status, body) = self.pages.get(&page).cloned().unwrap();
            Ok(ApiResponse {
                data: body.to_string(),
                status: StatusCode::from_u16(status).unwrap(),
                url: request.url.to_string(),
            })
        }
    }

    fn config() -> ApiConfig {
        let listing_url = ValidatedUrl::parse("https://demo.vistahost.com.br/imoveis/listar").unwrap();
        ApiConfig {
            api_key: ApiKey::new("secret").unwrap(),
            detail_url: listing_url.with_last_segment("detalhes").unwrap(),
            listing_url,
            listing_page_size: 2,
            timeout: Duration::from_secs(30),
            max_attempts: 2,
            pacing: Duration::ZERO,
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy::new(2, Arc::new(RecordingPause::new()))
    }

    #[tokio::test]
    async fn test_walk_issues_one_request_per_page() {
        let transport = Arc::new(PagedTransport::new(vec![
            (1, 200, json!({"total": 5, "paginas": 3, "1": {"Codigo": "A1"}, "2": {"Codigo": "A2"}})),
            (2, 200, json!({"paginas": 3, "3": {"Codigo": "A3"}, "4": "junk"})),
            (3, 200, json!({"paginas": "3", "5": {"Codigo": "A5"}})),
        ]));
        let fetcher = ListingFetcher::new(
            transport.clone(),
            policy(),
            config(),
            ListingQuery::for_sync(2),
        );

        let items = fetcher.fetch_all().await.unwrap();

        let codes: Vec<&str> = items.iter().map(|i| i["Codigo"].as_str().unwrap()).collect();
        assert_eq!(codes, vec!["A1", "A2", "A3", "A5"]);
        assert_eq!(transport.requested(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_missing_page_count_means_single_page() {
        let transport = Arc::new(PagedTransport::new(vec![(1, 200, json!({"1": {"Codigo": "A1"}}))]));
        let fetcher = ListingFetcher::new(
            transport.clone(),
            policy(),
            config(),
            ListingQuery::for_sync(2),
        );

        assert_eq!(fetcher.fetch_all().await.unwrap().len(), 1);
        assert_eq!(transport.requested(), vec![1]);
    }

    #[tokio::test]
    async fn test_zero_pages_yields_nothing() {
        let transport = Arc::new(PagedTransport::new(vec![(1, 200, json!({"total": 0, "paginas": 0}))]));
        let fetcher = ListingFetcher::new(
            transport.clone(),
            policy(),
            config(),
            ListingQuery::for_sync(2),
        );

        assert!(fetcher.fetch_all().await.unwrap().is_empty());
        assert_eq!(transport.requested(), vec![1]);
    }

    #[tokio::test]
    async fn test_error_envelope_aborts_whole_walk() {
        let transport = Arc::new(PagedTransport::new(vec![
            (1, 200, json!({"paginas": 2, "1": {"Codigo": "A1"}})),
            (2, 200, json!({"status": 400, "message": "Limite excedido"})),
        ]));
        let fetcher = ListingFetcher::new(
            transport.clone(),
            policy(),
            config(),
            ListingQuery::for_sync(2),
        );

        let err = fetcher.fetch_all().await.unwrap_err();
        assert!(matches!(err, AppError::ApiService { .. }));
    }

    #[tokio::test]
    async fn test_pages_stream_is_lazy() {
        let transport = Arc::new(PagedTransport::new(vec![
            (1, 200, json!({"paginas": 2, "1": {"Codigo": "A1"}})),
            (2, 200, json!({"paginas": 2, "2": {"Codigo": "A2"}})),
        ]));
        let fetcher = ListingFetcher::new(
            transport.clone(),
            policy(),
            config(),
            ListingQuery::for_sync(2),
        );

        let pages = fetcher.pages();
        futures::pin_mut!(pages);
        let first = pages.try_next().await.unwrap().unwrap();

        assert_eq!(first.number, 1);
        assert_eq!(transport.requested(), vec![1]);
    }
}
