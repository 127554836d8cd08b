//! Paginated collection fetching.
//!
//! Trackers signal pagination in two ways, and both are supported:
//!
//! - [`PageStrategy::Unpaginated`]: the request asks the server for the whole
//!   collection at once (Taiga's `x-disable-pagination` header). One
//!   round-trip.
//! - [`PageStrategy::LinkHeader`]: each response carries an RFC 8288 `Link`
//!   header. The fetcher follows `rel="next"` until it is absent (GitHub).
//!
//! Either way the result is the complete collection in server order, or a
//! [`FetchError`] naming the page that failed. Partial collections are never
//! returned.

use serde::de::DeserializeOwned;

use crate::client::ApiClient;
use crate::error::{ApiError, FetchError};
use crate::sync::{ProgressCallback, SyncProgress, emit};

/// Header Taiga honours to return a collection in a single response.
pub const DISABLE_PAGINATION_HEADER: &str = "x-disable-pagination";

/// Default page size for link-header pagination.
pub const DEFAULT_PER_PAGE: u32 = 100;

/// What a `Link` header says about the page after the current one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPagination {
    /// A `rel="next"` link is present, whether or not it carries a page number.
    pub has_next: bool,
    /// `page` parameter of the next link.
    pub next_page: Option<u32>,
}

/// One `<target>; rel="a b"` entry of a `Link` header.
fn link_entry(entry: &str) -> Option<(&str, Vec<&str>)> {
    let (target, params) = entry.trim().split_once(';')?;
    let target = target.trim().strip_prefix('<')?.strip_suffix('>')?;

    let rels = params
        .split(';')
        .filter_map(|param| {
            let (name, value) = param.split_once('=')?;
            name.trim()
                .eq_ignore_ascii_case("rel")
                .then(|| value.trim().trim_matches('"'))
        })
        .flat_map(str::split_whitespace)
        .collect();

    Some((target, rels))
}

/// Parse an RFC 8288 `Link` header, e.g.
/// `<https://api.github.com/repositories/1/issues?page=2>; rel="next", <...?page=5>; rel="last"`.
///
/// Entries that do not parse are ignored.
pub fn parse_link_header(link_header: &str) -> LinkPagination {
    link_header
        .split(',')
        .filter_map(link_entry)
        .fold(LinkPagination::default(), |mut info, (target, rels)| {
            if rels.contains(&"next") {
                info.has_next = true;
                info.next_page = extract_page_from_url(target);
            }
            info
        })
}

/// The `page` query parameter of an absolute URL.
fn extract_page_from_url(target: &str) -> Option<u32> {
    url::Url::parse(target)
        .ok()?
        .query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
}

/// How a collection endpoint is paged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStrategy {
    /// Ask the server for everything in one response.
    Unpaginated,
    /// Follow `rel="next"` links using a `page` query parameter.
    LinkHeader { per_page: u32 },
}

impl PageStrategy {
    pub fn link_header() -> Self {
        PageStrategy::LinkHeader {
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// A collection to fetch.
#[derive(Debug, Clone)]
pub struct CollectionRequest {
    /// Name used in progress events and errors (e.g. "userstories").
    pub collection: String,
    /// Endpoint path without query string.
    pub path: String,
    /// Query filters sent with every page.
    pub query: Vec<(String, String)>,
    pub strategy: PageStrategy,
}

impl CollectionRequest {
    pub fn new(collection: &str, path: &str, strategy: PageStrategy) -> Self {
        Self {
            collection: collection.to_string(),
            path: path.to_string(),
            query: Vec::new(),
            strategy,
        }
    }

    /// Add a query filter.
    #[must_use]
    pub fn filter(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Path and query string for a page (`None` for unpaginated requests).
    pub fn route(&self, page: Option<u32>) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in &self.query {
            serializer.append_pair(k, v);
        }
        if let (PageStrategy::LinkHeader { per_page }, Some(page)) = (self.strategy, page) {
            serializer.append_pair("per_page", &per_page.to_string());
            serializer.append_pair("page", &page.to_string());
        }

        let query = serializer.finish();
        if query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, query)
        }
    }
}

/// Fetch a whole collection, following pagination until the server says stop.
///
/// Termination is decided only from response metadata. A `rel="next"` link
/// that does not advance past the current page, or carries no `page`
/// parameter, fails the fetch.
pub async fn fetch_collection<T: DeserializeOwned>(
    client: &ApiClient,
    request: &CollectionRequest,
    on_progress: Option<&ProgressCallback>,
) -> Result<Vec<T>, FetchError> {
    let fail = |page: u32, cause: ApiError| FetchError {
        collection: request.collection.clone(),
        page,
        cause,
    };

    emit(
        on_progress,
        SyncProgress::FetchingCollection {
            collection: request.collection.clone(),
        },
    );

    let mut all_items: Vec<T> = Vec::new();

    match request.strategy {
        PageStrategy::Unpaginated => {
            let (items, _): (Vec<T>, _) = client
                .get_json(&request.route(None), &[(DISABLE_PAGINATION_HEADER, "True")])
                .await
                .map_err(|e| fail(1, e))?;

            all_items = items;
            emit(
                on_progress,
                SyncProgress::FetchedPage {
                    collection: request.collection.clone(),
                    page: 1,
                    count: all_items.len(),
                    total_so_far: all_items.len(),
                },
            );
        }
        PageStrategy::LinkHeader { .. } => {
            let mut page = 1u32;

            loop {
                let (items, response): (Vec<T>, _) = client
                    .get_json(&request.route(Some(page)), &[])
                    .await
                    .map_err(|e| fail(page, e))?;

                let count = items.len();
                all_items.extend(items);

                emit(
                    on_progress,
                    SyncProgress::FetchedPage {
                        collection: request.collection.clone(),
                        page,
                        count,
                        total_so_far: all_items.len(),
                    },
                );

                let pagination = response
                    .header("link")
                    .map(parse_link_header)
                    .unwrap_or_default();

                if !pagination.has_next {
                    break;
                }

                let Some(next) = pagination.next_page else {
                    return Err(fail(
                        page,
                        ApiError::Pagination("next link has no page number".to_string()),
                    ));
                };
                if next <= page {
                    return Err(fail(
                        page,
                        ApiError::Pagination(format!(
                            "next link points to page {} from page {}",
                            next, page
                        )),
                    ));
                }
                page = next;
            }
        }
    }

    tracing::debug!(
        collection = %request.collection,
        total = all_items.len(),
        "Fetched collection"
    );

    emit(
        on_progress,
        SyncProgress::FetchComplete {
            collection: request.collection.clone(),
            total: all_items.len(),
        },
    );

    Ok(all_items)
}
