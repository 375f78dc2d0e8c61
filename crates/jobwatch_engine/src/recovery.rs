use jobwatch_core::RecoveryTarget;
use jobwatch_logging::watch_info;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum OpenError {
    #[error("invalid recovery url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("could not open browser: {0}")]
    Launch(#[from] std::io::Error),
}

/// Absolute recovery URL for `target` on the marketplace site.
pub fn recovery_url(site_url: &str, target: &RecoveryTarget) -> Result<Url, OpenError> {
    let base = Url::parse(site_url)?;
    Ok(base.join(&target.path())?)
}

/// Opens a page where the user can sign in again.
pub trait RecoveryOpener: Send + Sync {
    fn open(&self, url: &Url) -> Result<(), OpenError>;
}

/// Opens recovery pages in the default browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserOpener;

impl RecoveryOpener for BrowserOpener {
    fn open(&self, url: &Url) -> Result<(), OpenError> {
        watch_info!("Opening recovery page {}", url);
        open::that(url.as_str())?;
        Ok(())
    }
}

/// Logs the recovery page instead of opening it; for headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOpener;

impl RecoveryOpener for LogOpener {
    fn open(&self, url: &Url) -> Result<(), OpenError> {
        watch_info!("Sign in again at {}", url);
        Ok(())
    }
}
