use log::info;
use pitwall_platform::Platform;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed to open store page {url}: {source}")]
pub struct StoreOpenError {
    pub url: String,
    #[source]
    pub source: std::io::Error,
}

/// Where to send the user when they accept an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    Ios { app_name: String },
    Android { app_name: String },
    Web { app_name: String },
}

impl StoreTarget {
    #[must_use]
    pub fn for_platform(platform: Platform, app_name: impl Into<String>) -> Self {
        let app_name = app_name.into();
        match platform {
            Platform::Ios => Self::Ios { app_name },
            Platform::Android => Self::Android { app_name },
            Platform::Web => Self::Web { app_name },
        }
    }

    /// Generic search-by-name listing, used when the server sends no link.
    #[must_use]
    pub fn search_url(&self) -> String {
        let (base, params): (&str, Vec<(&str, &str)>) = match self {
            Self::Ios { app_name } => (
                "itms-apps://itunes.apple.com/search",
                vec![("term", app_name.as_str())],
            ),
            Self::Android { app_name } => ("market://search", vec![("q", app_name.as_str())]),
            Self::Web { app_name } => (
                "https://play.google.com/store/search",
                vec![("q", app_name.as_str()), ("c", "apps")],
            ),
        };

        match reqwest::Url::parse_with_params(base, &params) {
            Ok(url) => url.into(),
            Err(_) => base.to_string(),
        }
    }

    #[must_use]
    pub fn resolve_url(&self, update_url: Option<&str>) -> String {
        match update_url.map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => self.search_url(),
        }
    }
}

/// Capability to hand the user over to the platform's app store.
pub trait StoreOpener: Send + Sync {
    /// Open `update_url` if given, otherwise the store's search listing.
    ///
    /// # Errors
    /// Returns an error when the host cannot open the resolved URL.
    fn open_store(&self, update_url: Option<&str>) -> Result<(), StoreOpenError>;
}

/// Opens store links through the operating system's URL handler.
pub struct SystemStoreOpener {
    target: StoreTarget,
}

impl SystemStoreOpener {
    #[must_use]
    pub fn new(target: StoreTarget) -> Self {
        Self { target }
    }
}

impl StoreOpener for SystemStoreOpener {
    fn open_store(&self, update_url: Option<&str>) -> Result<(), StoreOpenError> {
        let url = self.target.resolve_url(update_url);
        info!("Opening store page {url}");
        open::that(&url).map_err(|source| StoreOpenError { url, source })
    }
}
