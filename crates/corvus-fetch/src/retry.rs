//! The three-rung retry ladder from `fetcher.py`'s `fetch_with_retry`:
//! random proxy, then a *different* proxy if the failure looks
//! proxy-related, then a direct connection as a last resort. Each rung is
//! tried only if the previous one both failed and looks retryable.

use corvus_types::fetch::FetchResponse;
use corvus_types::RequestType;
use tracing::instrument;

use crate::Fetcher;

#[instrument(skip(fetcher), fields(%url, use_random_proxy))]
pub async fn fetch_with_retry(
    fetcher: &Fetcher,
    url: &str,
    use_random_proxy: bool,
) -> FetchResponse {
    let first_proxy = if use_random_proxy {
        fetcher.proxy_rotator().random().map(str::to_string)
    } else {
        None
    };

    let first = fetcher
        .fetch(url, RequestType::Normal, first_proxy.as_deref())
        .await;
    if !is_retryable(&first) {
        return first;
    }

    let Some(used) = &first_proxy else {
        return first;
    };

    let second_proxy = fetcher.proxy_rotator().different_from(used).map(str::to_string);
    let second = if let Some(proxy) = &second_proxy {
        fetcher.fetch(url, RequestType::Normal, Some(proxy.as_str())).await
    } else {
        first
    };
    if !is_retryable(&second) {
        return second;
    }

    fetcher.fetch(url, RequestType::Normal, None).await
}

fn is_retryable(response: &FetchResponse) -> bool {
    response.failed
        && response
            .failed_reasons
            .iter()
            .any(|r| r.kind.is_retryable())
}
