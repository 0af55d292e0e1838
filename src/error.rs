use thiserror::Error;

/// Failures talking to the page backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network or TLS failure, or a body that could not be decoded.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("invalid URL '{0}'")]
    InvalidUrl(String),
}

/// Reasons a position fix could not be obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("Geolocation is not supported by this browser.")]
    Unsupported,
    #[error("Location access was denied.")]
    PermissionDenied,
    #[error("Your location is currently unavailable.")]
    Unavailable,
    #[error("Timed out while getting your location.")]
    Timeout,
    /// A later lookup was started before this one finished.
    #[error("A newer location request replaced this one.")]
    Superseded,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Geolocation(#[from] GeolocationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("template rendering failed: {0}")]
    Template(#[from] askama::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
