//! Draining key-paginated list queries.

use crate::error::ClientError;
use cosmos_proto::cosmos::base::query::v1beta1::{PageRequest, PageResponse};
use std::collections::HashSet;
use std::future::Future;
use tracing::trace;

/// Page size used by the list helpers.
pub const DEFAULT_PAGE_LIMIT: u64 = 100;

/// Fetch every page of a list query.
///
/// `fetch` receives the request for the next page and returns that page's
/// items together with the server's page response. Stops when the server
/// returns no `next_key`; a key seen twice is an error.
pub async fn paginate<T, F, Fut>(limit: u64, mut fetch: F) -> Result<Vec<T>, ClientError>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<(Vec<T>, Option<PageResponse>), ClientError>>,
{
    let mut items = Vec::new();
    let mut seen = HashSet::new();
    let mut key = Vec::new();

    loop {
        let (page, response) = fetch(PageRequest::after(key, limit)).await?;
        trace!(count = page.len(), "Fetched page");
        items.extend(page);

        match response {
            Some(response) if response.has_next() => {
                if !seen.insert(response.next_key.clone()) {
                    return Err(ClientError::Pagination(format!(
                        "server repeated page key {:02x?}",
                        response.next_key
                    )));
                }
                key = response.next_key;
            }
            _ => return Ok(items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(next_key: &[u8]) -> Option<PageResponse> {
        Some(PageResponse {
            next_key: next_key.to_vec(),
            total: 0,
        })
    }

    #[tokio::test]
    async fn test_collects_all_pages() {
        let data: Vec<u32> = (0..25).collect();

        let items = paginate(10, |request| {
            let start = request.key.first().copied().unwrap_or(0) as usize;
            let end = (start + request.limit as usize).min(data.len());
            let next = if end < data.len() { vec![end as u8] } else { vec![] };
            let chunk = data[start..end].to_vec();
            async move { Ok((chunk, page(&next))) }
        })
        .await
        .unwrap();

        assert_eq!(items, data);
    }

    #[tokio::test]
    async fn test_missing_page_response_ends() {
        let mut calls = 0;
        let items = paginate(DEFAULT_PAGE_LIMIT, |_| {
            calls += 1;
            async { Ok((vec!["a"], None)) }
        })
        .await
        .unwrap();

        assert_eq!(items, vec!["a"]);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_repeated_key_is_an_error() {
        let result: Result<Vec<u8>, _> =
            paginate(5, |_| async { Ok((vec![1], page(b"same"))) }).await;
        assert!(matches!(result, Err(ClientError::Pagination(_))));
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() {
        let result: Result<Vec<u8>, _> = paginate(5, |_| async {
            Err(ClientError::from(tonic::Status::unavailable("down")))
        })
        .await;
        assert!(matches!(result, Err(ClientError::Connection(_))));
    }

    #[tokio::test]
    async fn test_request_carries_limit_and_key() {
        let mut requests = Vec::new();
        let _ = paginate(7, |request| {
            requests.push(request.clone());
            let next = if request.key.is_empty() { b"k1".to_vec() } else { vec![] };
            async move { Ok((Vec::<u8>::new(), page(&next))) }
        })
        .await
        .unwrap();

        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].limit, 7);
        assert!(requests[0].key.is_empty());
        assert_eq!(requests[1].key, b"k1");
    }
}
