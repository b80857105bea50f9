/// Current UTC timestamp (millis)
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Global id prefix for upstream orders
pub const ORDER_GID_PREFIX: &str = "gid://shopify/Order/";

/// Normalize a caller-supplied order id to its global id form.
///
/// Accepts a bare numeric id (`1234`) or a global id
/// (`gid://shopify/Order/1234`). Anything else yields `None`.
pub fn normalize_order_id(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let numeric = raw.strip_prefix(ORDER_GID_PREFIX).unwrap_or(raw);
    if numeric.is_empty() || !numeric.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{ORDER_GID_PREFIX}{numeric}"))
}

/// Numeric tail of a global order id
pub fn order_numeric_id(gid: &str) -> &str {
    gid.rsplit('/').next().unwrap_or(gid)
}
