//! Default User-Agent string for all session traffic.

/// Product token used in the default User-Agent.
const PRODUCT_NAME: &str = "BulkImageDownloader";

/// Default User-Agent (identifies the tool and crate version).
#[must_use]
pub fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("{PRODUCT_NAME}/{version}")
}
