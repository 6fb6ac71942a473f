//! Parsing the framework's request headers into a fixed record.

use {
    http::{
        HeaderMap, HeaderName, HeaderValue,
        header::{CONTENT_SECURITY_POLICY, CONTENT_SECURITY_POLICY_REPORT_ONLY},
    },
    serde::Serialize,
};

use crate::{
    config::CaptureSettings,
    error::{ErrorReporter, HeaderError, ResultExt},
    headers::{
        NEXT_HMR_REFRESH_HEADER, NEXT_ROUTER_PREFETCH_HEADER, RSC_HEADER,
        nonce::get_script_nonce_from_header,
        router_state::{FlightRouterState, parse_and_validate_flight_router_state},
    },
};

/// Options affecting header parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Whether partial prerendering is enabled for the route.
    pub is_route_ppr_enabled: bool,
}

impl From<&CaptureSettings> for ParseOptions {
    fn from(settings: &CaptureSettings) -> Self {
        Self {
            is_route_ppr_enabled: settings.route_ppr_enabled,
        }
    }
}

/// Request properties derived from headers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedRequestHeaders {
    /// Client router state, when the request needs it.
    pub router_state: Option<FlightRouterState>,
    /// Whether this is a prefetch request.
    pub is_prefetch_request: bool,
    /// Whether this is a hot-module-replacement refresh.
    pub is_hmr_refresh: bool,
    /// Whether this is a React Server Components request.
    pub is_rsc_request: bool,
    /// Script nonce from the Content-Security-Policy header.
    pub nonce: Option<String>,
}

/// Parses request headers.
///
/// The router state is only read for RSC requests that are not prefetches,
/// or that are prefetches while partial prerendering is disabled.
///
/// # Arguments
///
/// * `headers` - Request headers; lookups are case-insensitive.
/// * `options` - Parsing options.
///
/// # Errors
///
/// Returns `HeaderError` when a router state that must be read is invalid.
/// An unusable nonce is logged and reported as absent.
pub fn parse_request_headers(
    headers: &HeaderMap,
    options: ParseOptions,
) -> Result<ParsedRequestHeaders, HeaderError> {
    let is_prefetch_request = headers.contains_key(NEXT_ROUTER_PREFETCH_HEADER);
    let is_hmr_refresh = headers.contains_key(NEXT_HMR_REFRESH_HEADER);
    let is_rsc_request = headers.contains_key(RSC_HEADER);

    let should_provide_router_state =
        is_rsc_request && (!is_prefetch_request || !options.is_route_ppr_enabled);
    let router_state = if should_provide_router_state {
        parse_and_validate_flight_router_state(headers)?
    } else {
        None
    };

    Ok(ParsedRequestHeaders {
        router_state,
        is_prefetch_request,
        is_hmr_refresh,
        is_rsc_request,
        nonce: script_nonce(headers),
    })
}

fn script_nonce(headers: &HeaderMap) -> Option<String> {
    let csp = headers
        .get(CONTENT_SECURITY_POLICY)
        .filter(|value| !value.is_empty())
        .or_else(|| headers.get(CONTENT_SECURITY_POLICY_REPORT_ONLY))?;

    let nonce = csp
        .to_str()
        .add_context("Content-Security-Policy header is not valid text")
        .and_then(|csp| get_script_nonce_from_header(csp).map_err(Into::into));
    match nonce {
        Ok(nonce) => nonce,
        Err(error) => {
            ErrorReporter::warn(&error, "Ignoring Content-Security-Policy nonce");
            None
        }
    }
}

/// Builds a header map from name/value pairs.
///
/// # Errors
///
/// Returns `HeaderError::InvalidHeader` for names or values that are not
/// valid HTTP.
pub fn header_map_from_pairs<I, K, V>(pairs: I) -> Result<HeaderMap, HeaderError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        let name = name.as_ref();
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|error| HeaderError::InvalidHeader {
                name: name.to_string(),
                reason: error.to_string(),
            })?;
        let header_value =
            HeaderValue::from_str(value.as_ref()).map_err(|error| HeaderError::InvalidHeader {
                name: name.to_string(),
                reason: error.to_string(),
            })?;
        headers.append(header_name, header_value);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use crate::{
        config::CaptureSettings,
        error::HeaderError,
        headers::parser::{ParseOptions, header_map_from_pairs, parse_request_headers},
    };

    const TREE: &str = r#"["",{"children":["__PAGE__",{}]},null,null,true]"#;

    fn ppr() -> ParseOptions {
        ParseOptions {
            is_route_ppr_enabled: true,
        }
    }

    #[test]
    fn test_rsc_request_with_ppr_parses_tree() {
        let headers =
            header_map_from_pairs([("next-router-state-tree", TREE), ("rsc", "1")]).unwrap();
        let parsed = parse_request_headers(&headers, ppr()).unwrap();

        assert!(parsed.is_rsc_request);
        assert!(!parsed.is_prefetch_request);
        assert!(!parsed.is_hmr_refresh);
        let tree = parsed.router_state.unwrap();
        assert!(tree.parallel_routes.contains_key("children"));
        assert_eq!(tree.is_root_layout, Some(true));
    }

    #[test]
    fn test_prefetch_with_ppr_skips_tree() {
        let headers = header_map_from_pairs([
            ("next-router-state-tree", TREE),
            ("rsc", "1"),
            ("next-router-prefetch", "1"),
        ])
        .unwrap();
        let parsed = parse_request_headers(&headers, ppr()).unwrap();

        assert!(parsed.is_prefetch_request);
        assert!(parsed.router_state.is_none());
    }

    #[test]
    fn test_prefetch_without_ppr_parses_tree() {
        let headers = header_map_from_pairs([
            ("next-router-state-tree", TREE),
            ("rsc", "1"),
            ("next-router-prefetch", "1"),
        ])
        .unwrap();
        let parsed = parse_request_headers(&headers, ParseOptions::default()).unwrap();
        assert!(parsed.router_state.is_some());
    }

    #[test]
    fn test_non_rsc_request_skips_tree() {
        let headers =
            header_map_from_pairs([("next-router-state-tree", "definitely not json")]).unwrap();
        let parsed = parse_request_headers(&headers, ParseOptions::default()).unwrap();
        assert!(!parsed.is_rsc_request);
        assert!(parsed.router_state.is_none());
    }

    #[test]
    fn test_names_are_case_insensitive() {
        let headers = header_map_from_pairs([
            ("RSC", "1"),
            ("Next-HMR-Refresh", "1"),
            ("Next-Router-State-Tree", TREE),
        ])
        .unwrap();
        let parsed = parse_request_headers(&headers, ParseOptions::default()).unwrap();
        assert!(parsed.is_rsc_request);
        assert!(parsed.is_hmr_refresh);
        assert!(parsed.router_state.is_some());
    }

    #[test]
    fn test_invalid_tree_is_an_error() {
        let headers =
            header_map_from_pairs([("rsc", "1"), ("next-router-state-tree", "[1]")]).unwrap();
        assert!(matches!(
            parse_request_headers(&headers, ParseOptions::default()),
            Err(HeaderError::InvalidRouterState { .. })
        ));
    }

    #[test]
    fn test_nonce_from_first_csp_header() {
        let headers = header_map_from_pairs([
            ("content-security-policy", "script-src 'nonce-primary'"),
            (
                "content-security-policy-report-only",
                "script-src 'nonce-report'",
            ),
        ])
        .unwrap();
        let parsed = parse_request_headers(&headers, ParseOptions::default()).unwrap();
        assert_eq!(parsed.nonce.as_deref(), Some("primary"));

        let report_only = header_map_from_pairs([(
            "content-security-policy-report-only",
            "default-src 'nonce-report'",
        )])
        .unwrap();
        let parsed = parse_request_headers(&report_only, ParseOptions::default()).unwrap();
        assert_eq!(parsed.nonce.as_deref(), Some("report"));
    }

    #[test]
    fn test_unusable_nonce_is_absent() {
        let headers =
            header_map_from_pairs([("content-security-policy", "script-src 'nonce-a&b'")]).unwrap();
        let parsed = parse_request_headers(&headers, ParseOptions::default()).unwrap();
        assert!(parsed.nonce.is_none());

        let parsed = parse_request_headers(
            &header_map_from_pairs(Vec::<(String, String)>::new()).unwrap(),
            ParseOptions::default(),
        )
        .unwrap();
        assert!(parsed.nonce.is_none());
    }

    #[test]
    fn test_empty_csp_falls_back_to_report_only() {
        let headers = header_map_from_pairs([
            ("content-security-policy", ""),
            (
                "content-security-policy-report-only",
                "script-src 'nonce-report'",
            ),
        ])
        .unwrap();
        let parsed = parse_request_headers(&headers, ParseOptions::default()).unwrap();
        assert_eq!(parsed.nonce.as_deref(), Some("report"));
    }

    #[test]
    fn test_options_from_settings() {
        let settings = CaptureSettings {
            route_ppr_enabled: true,
            ..CaptureSettings::default()
        };
        assert_eq!(ParseOptions::from(&settings), ppr());
    }

    #[test]
    fn test_invalid_header_name() {
        assert!(matches!(
            header_map_from_pairs([("bad header", "1")]),
            Err(HeaderError::InvalidHeader { .. })
        ));
    }
}
