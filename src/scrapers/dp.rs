//! The Daily Pennsylvanian scraper.
//!
//! Fetches one page from [thedp.com](https://www.thedp.com) and turns it into a
//! [`DailyRecord`] according to the configured [`ExtractionMode`]:
//!
//! - `sections`: the top headline under each tracked section heading
//!   (`Featured`, `News`, `Sports`, `Opinion` by default)
//! - `single`: the first link after a heading mentioning any target
//!   (e.g. `Video` or `Gallery` on `/multimedia`)

use crate::config::{Config, ExtractionMode};
use crate::extractor::{HeadlineExtractor, parse_document};
use crate::models::DailyRecord;
use crate::scrapers::FetchPage;
use crate::utils::truncate_for_log;
use std::error::Error;
use tracing::{debug, info, instrument};

/// Fetch the configured page and extract today's data point.
///
/// # Errors
///
/// Only fetch failures are errors. Missing headings or links produce empty
/// headlines inside the returned record.
#[instrument(level = "info", skip_all, fields(url = %config.url, policy = %extractor.policy()))]
pub async fn scrape_data_point(
    fetcher: &impl FetchPage,
    config: &Config,
    extractor: &HeadlineExtractor,
) -> Result<DailyRecord, Box<dyn Error>> {
    let body = fetcher.fetch(&config.url).await?;
    debug!(body_preview = %truncate_for_log(&body, 300), "Fetched body");

    let record = extract_record(&body, config, extractor);
    match &record {
        DailyRecord::Single(headline) => info!(data_point = %headline, "Data point"),
        DailyRecord::Sections(_) => {
            for section in &config.extraction.targets {
                let headline = record.headline(section).unwrap_or_default();
                info!(%section, data_point = %headline, "Data point");
            }
        }
    }
    Ok(record)
}

/// Parse `body` and apply the configured extraction. Pure; no I/O.
pub fn extract_record(body: &str, config: &Config, extractor: &HeadlineExtractor) -> DailyRecord {
    let document = parse_document(body);
    let targets = &config.extraction.targets;
    match config.extraction.mode {
        ExtractionMode::Sections => extractor.extract_sections(&document, targets),
        ExtractionMode::Single => {
            DailyRecord::Single(extractor.find_first_headline(&document, targets))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::MatchPolicy;

    const HOME_PAGE: &str = r#"
        <html><body>
          <nav><a href="/">The Daily Pennsylvanian</a></nav>
          <div class="col">
            <h2 class="frontpage-section">Featured</h2>
            <article><a href="/article/1">Penn announces new provost</a></article>
          </div>
          <div class="col">
            <h3 class="frontpage-section">News</h3>
            <p class="byline">By Staff</p>
            <article><a href="/article/2">  City Council passes budget  </a></article>
          </div>
          <div class="col">
            <h3 class="frontpage-section">Opinion</h3>
            <article><a href="/article/3">Guest column: Why we write</a></article>
          </div>
        </body></html>"#;

    const MULTIMEDIA_PAGE: &str = r#"
        <h1>Multimedia</h1><a href="/m">All media</a>
        <h4>Photo Gallery | Homecoming</h4>
        <div><a href="/g/1">Homecoming in photos</a></div>
        <h4>Video</h4><a href="/v/1">Behind the scenes</a>"#;

    struct StubFetcher(Result<&'static str, &'static str>);

    impl FetchPage for StubFetcher {
        async fn fetch(&self, _url: &str) -> Result<String, Box<dyn Error>> {
            match self.0 {
                Ok(body) => Ok(body.to_string()),
                Err(msg) => Err(msg.into()),
            }
        }
    }

    #[tokio::test]
    async fn test_sections_scrape() {
        let config = Config::default();
        let extractor = config.extraction.extractor();
        let record = scrape_data_point(&StubFetcher(Ok(HOME_PAGE)), &config, &extractor)
            .await
            .unwrap();

        assert_eq!(record.headline("Featured"), Some("Penn announces new provost"));
        assert_eq!(record.headline("News"), Some("City Council passes budget"));
        assert_eq!(record.headline("Sports"), Some(""));
        assert_eq!(record.headline("Opinion"), Some("Guest column: Why we write"));
    }

    #[tokio::test]
    async fn test_single_scrape_with_keywords() {
        let mut config = Config::default();
        config.extraction.mode = ExtractionMode::Single;
        config.extraction.targets = vec!["Video".to_string(), "Gallery".to_string()];
        config.extraction.match_policy = MatchPolicy::Contains;
        config.extraction.heading_levels = (1..=6).collect();
        let extractor = config.extraction.extractor();

        let record = scrape_data_point(&StubFetcher(Ok(MULTIMEDIA_PAGE)), &config, &extractor)
            .await
            .unwrap();
        assert_eq!(record, DailyRecord::Single("Homecoming in photos".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_error() {
        let config = Config::default();
        let extractor = config.extraction.extractor();
        let result =
            scrape_data_point(&StubFetcher(Err("503 Service Unavailable")), &config, &extractor)
                .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_unrelated_page_yields_empty_headlines() {
        let config = Config::default();
        let extractor = config.extraction.extractor();
        let record = extract_record("<p>Maintenance</p>", &config, &extractor);
        assert_eq!(record.found_count(), 0);
        assert_eq!(record.headline("News"), Some(""));
    }
}
