//! Server-side request header parsing.
//!
//! A stateless helper deriving request properties (RSC, prefetch, HMR
//! refresh), the client router state, and the CSP script nonce.

pub mod nonce;
pub mod parser;
pub mod router_state;

pub use {
    nonce::get_script_nonce_from_header,
    parser::{ParseOptions, ParsedRequestHeaders, header_map_from_pairs, parse_request_headers},
    router_state::{FlightRouterState, parse_and_validate_flight_router_state},
};

/// Marks React Server Components requests.
pub const RSC_HEADER: &str = "rsc";

/// Marks prefetch requests.
pub const NEXT_ROUTER_PREFETCH_HEADER: &str = "next-router-prefetch";

/// Carries the client router state tree.
pub const NEXT_ROUTER_STATE_TREE_HEADER: &str = "next-router-state-tree";

/// Marks hot-module-replacement refresh requests.
pub const NEXT_HMR_REFRESH_HEADER: &str = "next-hmr-refresh";
