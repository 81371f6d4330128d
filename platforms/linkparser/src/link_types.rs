use std::collections::HashMap;

use log::error;
use once_cell::sync::Lazy;

static LINK_TYPES: Lazy<HashMap<String, String>> = Lazy::new(|| {
    match serde_json::from_str(include_str!("../data/link-types.json")) {
        Ok(table) => table,
        Err(err) => {
            error!(error = err.to_string().as_str(); "Link type table is malformed");
            HashMap::new()
        }
    }
});

/// Description of a link type. Subscripts and other non-uppercase characters are
/// ignored, so `Ds`, `D*u` and `D` all describe the `D` link.
pub fn describe_link_type(label: &str) -> Option<&'static str> {
    let code: String = label.chars().filter(|c| c.is_ascii_uppercase()).collect();
    LINK_TYPES.get(&code).map(String::as_str)
}
