use const_format::concatcp;

// Root
pub const OKX_API_URL: &str = "https://www.okx.com";

// Paths
pub const OKX_FUNDING_RATE_HISTORY_PATH: &str = "/api/v5/public/funding-rate-history";

// Headers
const ACCESS_PREFIX: &str = "OK-ACCESS-";
pub const HEADER_ACCESS_KEY: &str = concatcp!(ACCESS_PREFIX, "KEY");
pub const HEADER_ACCESS_PASSPHRASE: &str = concatcp!(ACCESS_PREFIX, "PASSPHRASE");
pub const HEADER_ACCESS_SIGN: &str = concatcp!(ACCESS_PREFIX, "SIGN");
pub const HEADER_ACCESS_TIMESTAMP: &str = concatcp!(ACCESS_PREFIX, "TIMESTAMP");

/// Success value of the `code` field in every OKX response envelope.
pub const OKX_SUCCESS_CODE: &str = "0";
