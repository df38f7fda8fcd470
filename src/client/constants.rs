//! Constants for the gateway client (paths, headers, timeouts, paging).

/// Path appended to the gateway URL to reach the REST API.
pub const API_BASE_PATH: &str = "/data/api/v1";

/// Header carrying the gateway API token (`keyId:secretKey`).
pub const API_TOKEN_HEADER: &str = "X-Ignition-API-Token";

/// Default overall request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Upper bound for configured request timeouts (1 hour).
pub const MAX_TIMEOUT_SECS: u64 = 3600;

/// Connect timeout cap; the effective value is `min(this, timeout)`.
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Page size used by [`super::GatewayClient::get_all_items`].
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Suffix for in-flight streamed downloads.
pub const PARTIAL_SUFFIX: &str = "partial";
