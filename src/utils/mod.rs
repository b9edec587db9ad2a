//! Shared utilities

pub mod error;

pub use error::{
    ConfigError, InserterError, LocatorError, ProtocolError, Result, StorageError,
};

use url::Url;

/// Hostname of a page URL, the key its locators are stored under.
///
/// Returns `None` for URLs without a host (e.g. `file:` or `data:` pages).
pub fn hostname_of(page_url: &str) -> Result<Option<String>> {
    let url = Url::parse(page_url).map_err(|_| ProtocolError::InvalidUrl(page_url.to_string()))?;
    Ok(url
        .host_str()
        .filter(|host| !host.is_empty())
        .map(str::to_string))
}
