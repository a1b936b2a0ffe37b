use axum::http::HeaderMap;
use crate::domain::{FilterMode, ReferenceId};

/// Header carrying the identity the transcript is viewed as.
pub const VIEWER_HEADER: &str = "x-viewer-id";

/// Query parameter naming the filter mode.
pub const FILTER_PARAM: &str = "filter";

/// Filter mode from raw query pairs.
///
/// The first `filter` value wins; unknown or missing values mean `affected`.
pub fn filter_from_query(pairs: &[(String, String)]) -> FilterMode {
    let token = pairs
        .iter()
        .find(|(key, _)| key == FILTER_PARAM)
        .map(|(_, value)| value.as_str());
    FilterMode::from_token(token)
}

/// Extract the viewer identity from request headers.
pub fn viewer_from_headers(headers: &HeaderMap) -> Option<ReferenceId> {
    headers
        .get(VIEWER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|viewer| !viewer.is_empty())
        .map(ReferenceId::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn test_filter_from_query() {
        assert_eq!(filter_from_query(&pairs(&[("filter", "owned")])), FilterMode::Owned);
        assert_eq!(filter_from_query(&[]), FilterMode::Affected);
        assert_eq!(
            filter_from_query(&pairs(&[("filter", "everything")])),
            FilterMode::Affected
        );
        assert_eq!(
            filter_from_query(&pairs(&[("page", "2"), ("filter", "all")])),
            FilterMode::All
        );
    }

    #[test]
    fn test_repeated_filter_takes_first() {
        let query = pairs(&[("filter", "owned"), ("filter", "all")]);
        assert_eq!(filter_from_query(&query), FilterMode::Owned);
    }

    #[test]
    fn test_viewer_from_headers() {
        let mut headers = HeaderMap::new();
        assert!(viewer_from_headers(&headers).is_none());

        headers.insert(VIEWER_HEADER, HeaderValue::from_static("  "));
        assert!(viewer_from_headers(&headers).is_none());

        headers.insert(VIEWER_HEADER, HeaderValue::from_static("PHID-USER-1"));
        assert_eq!(
            viewer_from_headers(&headers),
            Some(ReferenceId::new("PHID-USER-1"))
        );
    }
}
