use url::{Position, Url};

/// Returns the scheme and authority of a parsed URL, e.g. `https://ex.org:8443`
///
/// URLs without a host (such as `mailto:` links) have no origin.
///
/// # Examples
///
/// ```
/// use openactive_rpde::url::origin_of;
/// use url::Url;
///
/// let url = Url::parse("https://ex.org/feed?page=1").unwrap();
/// assert_eq!(origin_of(&url).as_deref(), Some("https://ex.org"));
/// ```
pub fn origin_of(url: &Url) -> Option<String> {
    url.host_str().filter(|host| !host.is_empty())?;
    Some(format!(
        "{}://{}",
        url.scheme(),
        &url[Position::BeforeHost..Position::AfterPort]
    ))
}

/// Extracts the origin from a URL string
pub fn extract_origin(url_str: &str) -> Option<String> {
    Url::parse(url_str).ok().as_ref().and_then(origin_of)
}

/// Returns true if the string is an absolute URL with a host
pub fn is_absolute(url_str: &str) -> bool {
    extract_origin(url_str).is_some()
}
