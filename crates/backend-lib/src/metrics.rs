// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const TOKEN_ISSUED: &str = "auth.token_issued";
/// Labelled with `category`
pub const AUTH_FAILURE: &str = "auth.failure";
pub const USER_REGISTERED: &str = "auth.user_registered";
// Scan metrics are labelled with `lookahead_days`
pub const SCAN_TICK: &str = "scan.tick";
pub const NOTIFICATION_SENT: &str = "scan.notification_sent";
pub const DISPATCH_FAILED: &str = "scan.dispatch_failed";
pub const SCAN_QUERY_FAILED: &str = "scan.query_failed";
