//! Test doubles for [`Fetcher`].
//!
//! [`StubFetcher`] serves canned responses keyed by request URL and records
//! every request it receives, so adapters can be exercised without network
//! access.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::fetch::{FetchError, Fetcher, HttpRequest, HttpResponse};

/// Deterministic [`Fetcher`] answering from a fixed URL table.
///
/// Unknown URLs fail with a 404 [`FetchError::Http`].
///
/// # Example
///
/// ```
/// use shelter_data::test_support::StubFetcher;
/// use shelter_data::{Fetcher, HttpRequest};
/// use url::Url;
///
/// let fetcher = StubFetcher::new().with_body("https://example.org/a", "image/png", b"png");
/// let request = HttpRequest::get(Url::parse("https://example.org/a").expect("url"));
/// let response = fetcher.fetch(&request).expect("stubbed");
/// assert_eq!(response.body, b"png");
/// assert_eq!(fetcher.requests().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct StubFetcher {
    responses: HashMap<String, HttpResponse>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl StubFetcher {
    /// A fetcher with no stubbed URLs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with `content_type` for `url`.
    ///
    /// The match is on the full URL, including any query string.
    #[must_use]
    pub fn with_body(mut self, url: &str, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        self.responses.insert(
            url.to_owned(),
            HttpResponse {
                content_type: Some(content_type.to_owned()),
                body: body.into(),
            },
        );
        self
    }

    /// Serve `response` verbatim for `url`.
    #[must_use]
    pub fn with_response(mut self, url: &str, response: HttpResponse) -> Self {
        self.responses.insert(url.to_owned(), response);
        self
    }

    /// Requests received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }
}

impl Fetcher for StubFetcher {
    fn fetch(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError> {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .get(request.url.as_str())
            .cloned()
            .ok_or_else(|| FetchError::Http {
                url: request.url.to_string(),
                status: 404,
            })
    }
}
