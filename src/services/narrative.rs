// src/services/narrative.rs
use log::info;
use reqwest::Client;
use scraper::{Html, Selector};

use crate::errors::ReportError;

/// Strategy for turning a fetched page into the day's narrative text. The
/// production selector is brittle by construction, so the extraction step is
/// kept behind this seam and can be faked in tests.
pub trait NarrativeExtractor {
    fn extract(&self, html: &str) -> Result<String, ReportError>;
}

/// Extracts the text of the first element matching a fixed CSS selector
/// (tag + class pointing at the page's main content region).
pub struct SelectorExtractor {
    selector: String,
}

impl SelectorExtractor {
    pub fn new(selector: impl Into<String>) -> Self {
        SelectorExtractor {
            selector: selector.into(),
        }
    }
}

impl NarrativeExtractor for SelectorExtractor {
    fn extract(&self, html: &str) -> Result<String, ReportError> {
        let document = Html::parse_document(html);
        let selector = Selector::parse(&self.selector)
            .map_err(|_| ReportError::Extraction(format!("invalid selector '{}'", self.selector)))?;

        let element = document.select(&selector).next().ok_or_else(|| {
            ReportError::Extraction(format!("no element matches '{}'", self.selector))
        })?;

        let text = element.text().collect::<Vec<_>>().join(" ");
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            return Err(ReportError::Extraction(format!(
                "element matching '{}' has no text",
                self.selector
            )));
        }
        Ok(text)
    }
}

/// Build the client used for page fetches. Sites like the narrative page
/// reject requests without a browser User-Agent.
pub fn http_client() -> Result<Client, ReportError> {
    Client::builder()
        .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
        .build()
        .map_err(|e| ReportError::Fetch(e.to_string()))
}

/// Fetch the narrative page and run the extraction strategy over it.
pub async fn fetch_narrative(
    client: &Client,
    url: &str,
    extractor: &dyn NarrativeExtractor,
) -> Result<String, ReportError> {
    info!("Fetching narrative page: {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ReportError::Fetch(e.to_string()))?;
    if !response.status().is_success() {
        return Err(ReportError::Fetch(format!(
            "narrative page returned {}",
            response.status()
        )));
    }
    let html = response
        .text()
        .await
        .map_err(|e| ReportError::Fetch(e.to_string()))?;

    let narrative = extractor.extract(&html)?;
    info!("Extracted narrative ({} chars)", narrative.len());
    Ok(narrative)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<!DOCTYPE html>
<html>
<body>
    <nav class="w-full">Menu</nav>
    <section class="sidebar">Unrelated links</section>
    <section class="w-full">
        <h1>Daily market recap</h1>
        <p>Stocks slipped as the Fed signaled a pause.</p>
    </section>
    <section class="w-full">
        <p>Second region that must not be picked.</p>
    </section>
</body>
</html>
"#;

    #[test]
    fn extracts_text_of_first_matching_element() {
        let extractor = SelectorExtractor::new("section.w-full");
        let narrative = extractor.extract(PAGE).unwrap();

        assert!(narrative.contains("Daily market recap"));
        assert!(narrative.contains("Fed signaled a pause"));
        assert!(!narrative.contains("Second region"));
        assert!(!narrative.contains("Menu"));
    }

    #[test]
    fn zero_matches_is_an_extraction_error() {
        let extractor = SelectorExtractor::new("section.main-content");
        let err = extractor.extract(PAGE).unwrap_err();

        assert!(matches!(err, ReportError::Extraction(_)));
    }

    #[test]
    fn empty_match_is_never_returned_silently() {
        let extractor = SelectorExtractor::new("div.empty");
        let err = extractor
            .extract("<html><body><div class=\"empty\">   </div></body></html>")
            .unwrap_err();

        assert!(matches!(err, ReportError::Extraction(_)));
    }

    #[test]
    fn page_client_builds_with_a_browser_user_agent() {
        http_client().unwrap();
    }

    #[test]
    fn fake_extractor_can_replace_the_selector_strategy() {
        struct Fixed;
        impl NarrativeExtractor for Fixed {
            fn extract(&self, _html: &str) -> Result<String, ReportError> {
                Ok("Fed signals pause".to_string())
            }
        }

        let narrative = Fixed.extract(PAGE).unwrap();
        assert_eq!(narrative, "Fed signals pause");
    }
}
