use crate::UrlError;
use std::path::PathBuf;
use url::Url;

/// The host a crawl is confined to, derived once from the seed URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    domain: String,
    port: Option<u16>,
}

impl CrawlTarget {
    /// Derives the crawl target from a seed URL
    ///
    /// The seed must use http or https and carry a host. An explicit
    /// non-default port becomes part of the target, so `example.com:8080`
    /// and `example.com` are different targets.
    ///
    /// # Examples
    ///
    /// ```
    /// use url::Url;
    /// use meta_crawl::url::CrawlTarget;
    ///
    /// let seed = Url::parse("https://EXAMPLE.com/start").unwrap();
    /// let target = CrawlTarget::from_seed(&seed).unwrap();
    /// assert_eq!(target.domain(), "example.com");
    /// ```
    pub fn from_seed(seed: &Url) -> Result<Self, UrlError> {
        if seed.scheme() != "http" && seed.scheme() != "https" {
            return Err(UrlError::InvalidScheme(format!(
                "Only HTTP and HTTPS schemes are supported, got: {}",
                seed.scheme()
            )));
        }

        let domain = extract_domain(seed).ok_or(UrlError::MissingDomain)?;

        Ok(Self {
            domain,
            port: seed.port(),
        })
    }

    /// The lowercase host
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Explicit port of the seed, if any
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Returns true if the URL's host and explicit port match this target
    pub fn matches_host(&self, url: &Url) -> bool {
        extract_domain(url).as_deref() == Some(self.domain.as_str()) && url.port() == self.port
    }

    /// Default output file name, `<host>.csv`
    ///
    /// A port is appended with an underscore so the name stays portable.
    pub fn default_output_path(&self) -> PathBuf {
        let stem = match self.port {
            Some(port) => format!("{}_{}", self.domain, port),
            None => self.domain.clone(),
        };
        PathBuf::from(format!("{}.csv", stem))
    }
}

/// Extracts the domain from a URL
///
/// Returns the lowercase host, or None when the URL has no host.
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}
