//! Page-number pagination for list endpoints.
//!
//! `?page=` is 1-based; `?page_size=` overrides the endpoint default up to
//! [`MAX_PAGE_SIZE`]. Navigation links keep every other query parameter.

use axum::extract::{FromRequestParts, OriginalUri};
use axum::http::request::Parts;

use super::error::ApiError;
use super::types::Paginated;
use crate::db::{Page, PageRequest};

pub const DEFAULT_PAGE_SIZE: u64 = 50;
pub const MAX_PAGE_SIZE: u64 = 500;
const INVALID_PAGE: &str = "Invalid page.";

/// Query state of a paginated request.
#[derive(Debug, Clone)]
pub struct Pagination {
    path: String,
    params: Vec<(String, String)>,
}

impl<S: Send + Sync> FromRequestParts<S> for Pagination {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map_or_else(|| parts.uri.clone(), |original| original.0.clone());

        let params = uri
            .query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        Ok(Self {
            path: uri.path().to_string(),
            params,
        })
    }
}

impl Pagination {
    fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// # Errors
    ///
    /// A non-numeric or non-positive `page` is a 404.
    pub fn request(&self, default_size: u64) -> Result<PageRequest, ApiError> {
        let page = match self.param("page") {
            None | Some("") => 1,
            Some(raw) => match raw.parse::<u64>() {
                Ok(page) if page >= 1 => page,
                _ => return Err(ApiError::NotFound(INVALID_PAGE.to_string())),
            },
        };

        let page_size = self
            .param("page_size")
            .and_then(|raw| raw.parse::<u64>().ok())
            .filter(|size| *size > 0)
            .map_or(default_size, |size| size.min(MAX_PAGE_SIZE));

        Ok(PageRequest::new(page, page_size))
    }

    /// # Errors
    ///
    /// A page past the last one is a 404.
    pub fn respond<T>(&self, page: Page<T>) -> Result<Paginated<T>, ApiError> {
        if page.is_out_of_range() {
            return Err(ApiError::NotFound(INVALID_PAGE.to_string()));
        }

        let num_pages = page.num_pages();
        let next = (page.page < num_pages).then(|| self.link(Some(page.page + 1)));
        let previous = match page.page {
            1 => None,
            2 => Some(self.link(None)),
            n => Some(self.link(Some(n - 1))),
        };

        Ok(Paginated {
            active_page: page.page,
            num_pages,
            count: page.count,
            next,
            previous,
            results: page.items,
        })
    }

    /// Current URL with `page` replaced, or dropped for the first page.
    fn link(&self, page: Option<u64>) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.params.iter().filter(|(k, _)| k != "page") {
            query.append_pair(key, value);
        }
        if let Some(page) = page {
            query.append_pair("page", &page.to_string());
        }

        let query = query.finish();
        if query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{query}", self.path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pagination(query: &str) -> Pagination {
        Pagination {
            path: "/api/v1/anime/list/".to_string(),
            params: url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        }
    }

    #[test]
    fn page_size_is_capped() {
        let request = pagination("page=2&page_size=10000").request(12).unwrap();
        assert_eq!(request, PageRequest::new(2, MAX_PAGE_SIZE));

        let request = pagination("page_size=abc").request(12).unwrap();
        assert_eq!(request, PageRequest::new(1, 12));
    }

    #[test]
    fn bad_page_is_not_found() {
        assert!(matches!(
            pagination("page=zero").request(12),
            Err(ApiError::NotFound(msg)) if msg == INVALID_PAGE
        ));
        assert!(pagination("page=0").request(12).is_err());

        let page: Page<i32> = Page::new(vec![], 3, PageRequest::new(5, 2));
        assert!(pagination("page=5").respond(page).is_err());
    }

    #[test]
    fn links_keep_filters() {
        let p = pagination("status=COMES_OUT&page=2");
        let page = Page::new(vec![1, 2], 5, PageRequest::new(2, 2));
        let body = p.respond(page).unwrap();

        assert_eq!(body.num_pages, 3);
        assert_eq!(
            body.next.as_deref(),
            Some("/api/v1/anime/list/?status=COMES_OUT&page=3")
        );
        assert_eq!(
            body.previous.as_deref(),
            Some("/api/v1/anime/list/?status=COMES_OUT")
        );
    }
}
