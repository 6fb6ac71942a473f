//! Flight router state: decoding and validating the tree header.

use std::collections::BTreeMap;

use {
    http::HeaderMap,
    percent_encoding::percent_decode_str,
    serde::Serialize,
    serde_json::{Value, from_str},
};

use crate::{error::HeaderError, headers::NEXT_ROUTER_STATE_TREE_HEADER};

/// Largest accepted router state header, in bytes.
pub const MAX_ROUTER_STATE_HEADER_LEN: usize = 20 * 4000;

/// Kind of a dynamic route parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DynamicParamType {
    /// `[...slug]`
    #[serde(rename = "c")]
    CatchAll,
    /// Intercepted `[...slug]`
    #[serde(rename = "ci")]
    CatchAllIntercepted,
    /// `[[...slug]]`
    #[serde(rename = "oc")]
    OptionalCatchAll,
    /// `[slug]`
    #[serde(rename = "d")]
    Dynamic,
    /// Intercepted `[slug]`
    #[serde(rename = "di")]
    DynamicIntercepted,
}

impl DynamicParamType {
    fn parse(code: &str) -> Option<Self> {
        match code {
            "c" => Some(Self::CatchAll),
            "ci" => Some(Self::CatchAllIntercepted),
            "oc" => Some(Self::OptionalCatchAll),
            "d" => Some(Self::Dynamic),
            "di" => Some(Self::DynamicIntercepted),
            _ => None,
        }
    }
}

/// One route segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Segment {
    /// A static segment such as `dashboard` or `__PAGE__`.
    Static(String),
    /// A dynamic segment with its resolved value.
    Dynamic {
        /// Parameter name.
        param_name: String,
        /// Resolved value.
        param_value: String,
        /// Parameter kind.
        param_type: DynamicParamType,
    },
}

/// Refresh marker on a subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefreshMarker {
    /// The subtree must be fetched again.
    Refetch,
    /// The subtree must be refreshed.
    Refresh,
    /// The subtree is inside a shared layout.
    InsideSharedLayout,
}

/// The client's view of which route segments are already rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlightRouterState {
    /// Segment at this level.
    pub segment: Segment,
    /// Child trees keyed by parallel route name.
    pub parallel_routes: BTreeMap<String, FlightRouterState>,
    /// URL the subtree was rendered for.
    pub url: Option<String>,
    /// Refresh marker.
    pub refresh: Option<RefreshMarker>,
    /// Whether this level is the root layout.
    pub is_root_layout: Option<bool>,
}

impl FlightRouterState {
    /// Validates a decoded JSON tree.
    ///
    /// The wire shape is `[segment, parallelRoutes, url?, refresh?,
    /// isRootLayout?]`.
    ///
    /// # Errors
    ///
    /// Returns `HeaderError::InvalidRouterState` describing the first
    /// violation.
    pub fn from_value(value: &Value) -> Result<Self, HeaderError> {
        let Some(items) = value.as_array() else {
            return Err(HeaderError::invalid_router_state("tree must be an array"));
        };
        if !(2..=5).contains(&items.len()) {
            return Err(HeaderError::invalid_router_state(format!(
                "tree must have 2 to 5 elements, got {}",
                items.len()
            )));
        }

        let segment = parse_segment(&items[0])?;

        let Some(children) = items[1].as_object() else {
            return Err(HeaderError::invalid_router_state(
                "parallel routes must be an object",
            ));
        };
        let parallel_routes = children
            .iter()
            .map(|(key, child)| Ok((key.clone(), Self::from_value(child)?)))
            .collect::<Result<BTreeMap<_, _>, HeaderError>>()?;

        let url = match items.get(2) {
            None | Some(Value::Null) => None,
            Some(Value::String(url)) => Some(url.clone()),
            Some(_) => {
                return Err(HeaderError::invalid_router_state("url must be a string"));
            }
        };

        let refresh = match items.get(3) {
            None | Some(Value::Null) => None,
            Some(Value::String(marker)) => Some(parse_refresh_marker(marker)?),
            Some(_) => {
                return Err(HeaderError::invalid_router_state(
                    "refresh marker must be a string",
                ));
            }
        };

        let is_root_layout = match items.get(4) {
            None => None,
            Some(Value::Bool(flag)) => Some(*flag),
            Some(_) => {
                return Err(HeaderError::invalid_router_state(
                    "root layout flag must be a boolean",
                ));
            }
        };

        Ok(Self {
            segment,
            parallel_routes,
            url,
            refresh,
            is_root_layout,
        })
    }
}

fn parse_segment(value: &Value) -> Result<Segment, HeaderError> {
    match value {
        Value::String(segment) => Ok(Segment::Static(segment.clone())),
        Value::Array(parts) => match parts.as_slice() {
            [
                Value::String(param_name),
                Value::String(param_value),
                Value::String(param_type),
            ] => {
                let param_type = DynamicParamType::parse(param_type).ok_or_else(|| {
                    HeaderError::invalid_router_state(format!(
                        "unknown dynamic parameter type {param_type:?}"
                    ))
                })?;
                Ok(Segment::Dynamic {
                    param_name: param_name.clone(),
                    param_value: param_value.clone(),
                    param_type,
                })
            }
            _ => Err(HeaderError::invalid_router_state(
                "dynamic segment must be [name, value, type]",
            )),
        },
        _ => Err(HeaderError::invalid_router_state(
            "segment must be a string or an array",
        )),
    }
}

fn parse_refresh_marker(marker: &str) -> Result<RefreshMarker, HeaderError> {
    match marker {
        "refetch" => Ok(RefreshMarker::Refetch),
        "refresh" => Ok(RefreshMarker::Refresh),
        "inside-shared-layout" => Ok(RefreshMarker::InsideSharedLayout),
        other => Err(HeaderError::invalid_router_state(format!(
            "unknown refresh marker {other:?}"
        ))),
    }
}

/// Reads and validates the router state tree header.
///
/// # Arguments
///
/// * `headers` - Request headers.
///
/// # Returns
///
/// `None` when the header is absent.
///
/// # Errors
///
/// Returns `HeaderError` when the header is repeated, too large, not valid
/// percent-encoded UTF-8 JSON, or not a valid tree.
pub fn parse_and_validate_flight_router_state(
    headers: &HeaderMap,
) -> Result<Option<FlightRouterState>, HeaderError> {
    let mut values = headers.get_all(NEXT_ROUTER_STATE_TREE_HEADER).iter();
    let Some(value) = values.next() else {
        return Ok(None);
    };
    if values.next().is_some() {
        return Err(HeaderError::MultipleRouterStateHeaders);
    }
    if value.len() > MAX_ROUTER_STATE_HEADER_LEN {
        return Err(HeaderError::RouterStateTooLarge {
            len: value.len(),
            limit: MAX_ROUTER_STATE_HEADER_LEN,
        });
    }

    let raw = value
        .to_str()
        .map_err(|error| HeaderError::invalid_router_state(error.to_string()))?;
    let decoded = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|error| HeaderError::invalid_router_state(error.to_string()))?;
    let tree: Value =
        from_str(&decoded).map_err(|error| HeaderError::invalid_router_state(error.to_string()))?;

    FlightRouterState::from_value(&tree).map(Some)
}
