use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

const APP_USER_AGENT: &str = concat!("InterfaceOficial/", env!("CARGO_PKG_VERSION"));

/// The one HTTP client shared by every component of a launch.
///
/// Identity encoding keeps `Content-Length` equal to the bytes on disk, which
/// the size checks rely on.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .build()
}
