use crate::error::ScrapeError;

/// Result of a single fallback stage.
///
/// The orchestrators branch on this explicitly instead of catching errors,
/// so "try the next stage" is always a visible decision.
#[derive(Debug)]
pub enum StageOutcome {
    /// The stage produced a usable document.
    Html(String),
    /// The stage ran but found nothing useful.
    Empty,
    /// The stage got a response, but it is a CAPTCHA/consent interstitial.
    Blocked,
    /// The stage was skipped because its backend is not available.
    Unavailable,
    /// The stage failed outright.
    Failed(ScrapeError),
}

impl StageOutcome {
    /// Classify a fetch result, treating blank bodies as [`StageOutcome::Empty`].
    pub fn from_fetch(res: Result<String, ScrapeError>) -> Self {
        match res {
            Ok(html) => {
                if html.trim().is_empty() {
                    StageOutcome::Empty
                } else {
                    StageOutcome::Html(html)
                }
            }
            Err(ScrapeError::BlockedContent { .. }) => StageOutcome::Blocked,
            Err(ScrapeError::BackendUnavailable { .. }) => StageOutcome::Unavailable,
            Err(err) => StageOutcome::Failed(err),
        }
    }

    pub fn is_html(&self) -> bool {
        match self {
            StageOutcome::Html(_) => true,
            _ => false,
        }
    }

    pub fn is_blocked(&self) -> bool {
        match self {
            StageOutcome::Blocked => true,
            _ => false,
        }
    }

    /// The rendered document, if this stage succeeded.
    pub fn into_html(self) -> Option<String> {
        match self {
            StageOutcome::Html(html) => Some(html),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_body_is_empty() {
        let outcome = StageOutcome::from_fetch(Ok("  \n".to_string()));
        assert!(!outcome.is_html());
    }

    #[test]
    fn blocked_error_maps_to_blocked() {
        let outcome = StageOutcome::from_fetch(Err(ScrapeError::BlockedContent {
            url: "https://www.google.com/search?q=x".to_string(),
        }));
        assert!(outcome.is_blocked());
    }
}
