//! Cursor-based pagination over `Link` headers.
//!
//! [`fetch_page`] performs one request and reads the next cursor from the
//! response's `Link` header. [`Paginator`] chains those calls lazily:
//!
//! ```ignore
//! let mut pages = Paginator::<ReplayError>::new(transport, request, 50);
//! while let Some(page) = pages.next_page().await? {
//!     errors.extend(page);
//! }
//! ```
//!
//! A missing or malformed `Link` header ends the stream instead of failing
//! it, so callers keep whatever pages they already have.

use std::marker::PhantomData;
use std::sync::Arc;

use futures::Stream;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::link_header::parse_link_header;
use crate::transport::{ApiRequest, Transport};

/// Cursor of the first page.
pub const INITIAL_CURSOR: &str = "0:0:0";

/// Opaque pagination token (`value:offset:is_prev`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub token: String,
    /// Whether the server reported more results behind this cursor.
    pub results: bool,
}

impl Cursor {
    pub fn new(token: impl Into<String>, results: bool) -> Self {
        Self {
            token: token.into(),
            results,
        }
    }

    pub fn initial() -> Self {
        Self::new(INITIAL_CURSOR, true)
    }

    /// Cursor addressing a fixed offset, for endpoints whose total is known
    /// up front.
    pub fn at_offset(offset: u64) -> Self {
        Self::new(format!("0:{}:0", offset), true)
    }
}

/// One page of results.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// `None` once the server reports no further results.
    pub next: Option<Cursor>,
}

/// Page bodies come either bare (`[...]`) or wrapped (`{"data": [...]}`).
///
/// `Bare` is tried first: a one-element array would otherwise satisfy the
/// struct variant positionally.
#[derive(Deserialize)]
#[serde(untagged)]
enum PageBody<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> PageBody<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            Self::Bare(items) => items,
            Self::Wrapped { data } => data,
        }
    }
}

/// Fetch one page: `request` plus `per_page` and `cursor` query parameters.
///
/// No retries; transport and decode errors propagate.
pub async fn fetch_page<T>(
    transport: &dyn Transport,
    request: &ApiRequest,
    cursor: &Cursor,
    per_page: usize,
) -> Result<Page<T>, FetchError>
where
    T: DeserializeOwned,
{
    let request = request
        .clone()
        .with_query("per_page", per_page)
        .with_query("cursor", &cursor.token);

    let response = transport.get(&request).await?;
    let items = response.json::<PageBody<T>>()?.into_items();
    let next = next_cursor(&request.path, response.link.as_deref());

    debug!(
        path = %request.path,
        cursor = %cursor.token,
        items = items.len(),
        has_next = next.is_some(),
        "fetched page"
    );

    Ok(Page { items, next })
}

fn next_cursor(path: &str, link: Option<&str>) -> Option<Cursor> {
    let header = link?;
    match parse_link_header(header) {
        Ok(parsed) => parsed
            .next()
            .filter(|next| next.has_results())
            .and_then(|next| next.cursor.clone())
            .map(|token| Cursor::new(token, true)),
        Err(e) => {
            warn!(path = %path, error = %e, "treating malformed Link header as end of results");
            None
        }
    }
}

/// Lazily walks a paginated endpoint, starting at [`INITIAL_CURSOR`].
pub struct Paginator<T> {
    transport: Arc<dyn Transport>,
    request: ApiRequest,
    per_page: usize,
    cursor: Option<Cursor>,
    pages_fetched: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Paginator<T>
where
    T: DeserializeOwned + Send + 'static,
{
    pub fn new(transport: Arc<dyn Transport>, request: ApiRequest, per_page: usize) -> Self {
        Self {
            transport,
            request,
            per_page: per_page.max(1),
            cursor: Some(Cursor::initial()),
            pages_fetched: 0,
            _marker: PhantomData,
        }
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor.is_none()
    }

    /// Fetch the next page, or `None` once the server signalled the end.
    ///
    /// A failed request also exhausts the paginator.
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>, FetchError> {
        let Some(cursor) = self.cursor.take() else {
            return Ok(None);
        };

        let transport = self.transport.as_ref();
        let page = fetch_page(transport, &self.request, &cursor, self.per_page).await?;
        self.pages_fetched += 1;
        self.cursor = page.next;
        Ok(Some(page.items))
    }

    /// Drain every page into one vector, in page order.
    pub async fn collect_all(mut self) -> Result<Vec<T>, FetchError> {
        let mut all_items = Vec::new();
        while let Some(page) = self.next_page().await? {
            all_items.extend(page);
        }
        Ok(all_items)
    }

    /// Turn the paginator into a stream of pages.
    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<T>, FetchError>> + Send {
        futures::stream::try_unfold(self, |mut paginator| async move {
            Ok(paginator.next_page().await?.map(|page| (page, paginator)))
        })
    }
}
