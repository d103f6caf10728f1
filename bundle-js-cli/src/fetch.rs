use bundle_js::FetchError;
use bundle_js::Fetcher;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// A fetch that never answers would otherwise hang the whole compile.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub const MAX_REDIRECTS: usize = 10;

/// Whether a redirect from `original`, after `hops` earlier redirects, may continue to `next`. Remote modules
/// must stay on the origin they were requested from.
pub fn redirect_allowed(original: &Url, next: &Url, hops: usize) -> bool {
  hops < MAX_REDIRECTS && original.origin() == next.origin()
}

/// Fetches remote modules over HTTP(S).
pub struct HttpFetcher {
  client: Client,
}

impl HttpFetcher {
  pub fn new() -> reqwest::Result<Self> {
    let client = Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .user_agent(concat!("bundle-js/", env!("CARGO_PKG_VERSION")))
      .redirect(Policy::custom(|attempt| {
        let previous = attempt.previous();
        let allowed = match previous.first() {
          Some(original) => redirect_allowed(original, attempt.url(), previous.len() - 1),
          None => false,
        };
        if allowed {
          attempt.follow()
        } else {
          let reason = format!("refusing to follow redirect to {}", attempt.url());
          attempt.error(reason)
        }
      }))
      .build()?;
    Ok(Self { client })
  }
}

impl Fetcher for HttpFetcher {
  fn fetch(&self, url: &Url) -> Result<String, FetchError> {
    let network = |err: reqwest::Error| FetchError::Network {
      url: url.to_string(),
      reason: err.to_string(),
    };
    let response = self.client.get(url.clone()).send().map_err(network)?;
    let status = response.status();
    debug!(%url, status = status.as_u16(), "fetched");
    if !status.is_success() {
      return Err(FetchError::Status {
        status: status.as_u16(),
        url: url.to_string(),
      });
    };
    response.text().map_err(network)
  }
}
