use thiserror::Error;

/// Failures that end processing of a single lesson page. The batch loop
/// catches these and moves on to the next URL.
#[derive(Debug, Error)]
pub enum SpiderError {
    #[error("no content frame found on the page")]
    FrameNotFound,

    #[error("lesson title element '{0}' did not appear")]
    TitleMissing(String),

    #[error(transparent)]
    WebDriver(#[from] thirtyfour::error::WebDriverError),
}
