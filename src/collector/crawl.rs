// src/collector/crawl.rs

//! Open-directory crawl engine.
//!
//! Performs a bounded breadth-first search over a sample URL's path
//! ancestry and any directory listings those ancestors expose, handing
//! every candidate archive to the kit acquisition engine. The visited
//! set is checked before enqueue, so each distinct URL is fetched at
//! most once and the crawl always terminates, cyclic cross-links
//! included.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use scraper::{Html, Selector};
use url::Url;

use crate::collector::KitAcquirer;
use crate::models::{Config, PhishKit, Sample};

/// Marker text emitted by directory-listing pages. Advisory heuristic:
/// a page without it is treated as not browsable.
const LISTING_MARKER: &str = "Index of";

/// What a crawl of one sample turned up.
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    /// Kits recovered for this sample, in discovery order, deduplicated
    /// by content hash
    pub kits: Vec<PhishKit>,

    /// Whether any probed directory exposed a listing
    pub indexing_enabled: bool,
}

/// Crawls a sample's host for open directories and kit archives.
pub struct DirectoryCrawler {
    client: reqwest::Client,
    config: Arc<Config>,
    kits: KitAcquirer,
}

impl DirectoryCrawler {
    pub fn new(config: Arc<Config>, client: reqwest::Client, kits: KitAcquirer) -> Self {
        Self {
            client,
            config,
            kits,
        }
    }

    /// Crawl the site hosting `sample` for exposed kits.
    ///
    /// Never fails: anything that goes wrong with an individual probe
    /// or download just leaves that candidate out of the outcome.
    pub async fn crawl(&self, sample: &Sample) -> CrawlOutcome {
        let mut outcome = CrawlOutcome::default();

        let mut queue: VecDeque<String> = VecDeque::new();
        let mut seen: HashSet<String> = HashSet::new();
        // Insertion-ordered copy of the visited set, for the guess pass.
        let mut visited: Vec<String> = Vec::new();
        let mut kit_urls: HashSet<String> = HashSet::new();

        for ancestor in seed_ancestors(&sample.url) {
            seen.insert(ancestor.clone());
            visited.push(ancestor.clone());
            queue.push_back(ancestor);
        }

        while let Some(dir_url) = queue.pop_front() {
            log::debug!("Checking for open directory at {}", dir_url);

            let Some(body) = self.fetch_listing(&dir_url).await else {
                continue;
            };
            outcome.indexing_enabled = true;

            let Ok(base) = Url::parse(&dir_url) else {
                continue;
            };

            let mut subdirectories = 0usize;
            for link in extract_links(&base, &body) {
                if seen.contains(&link) {
                    continue;
                }

                if link.ends_with(".zip") {
                    if let Some(kit) = self.kits.acquire(&link, &sample.id).await {
                        kit_urls.insert(link);
                        push_kit(&mut outcome.kits, kit);
                    }
                    continue;
                }

                if link.ends_with('/') {
                    // The cap bounds blow-up on pathological listings;
                    // zip files in the same listing are unaffected.
                    subdirectories += 1;
                    if subdirectories > self.config.collector.max_links_per_directory {
                        continue;
                    }
                    log::debug!("Adding directory to queue: {}", link);
                    seen.insert(link.clone());
                    visited.push(link.clone());
                    queue.push_back(link);
                }
            }
        }

        // Kits often sit one level above their extracted directory under
        // a predictable name, reachable even with indexing disabled.
        if self.config.collector.guess_archives {
            for dir_url in &visited {
                let Some(guess) = guess_zip_url(dir_url) else {
                    continue;
                };
                if kit_urls.contains(&guess) {
                    log::debug!("Kit already downloaded from {}", guess);
                    continue;
                }
                log::debug!("Guessing kit archive at {}", guess);
                if let Some(kit) = self.kits.acquire(&guess, &sample.id).await {
                    kit_urls.insert(guess);
                    push_kit(&mut outcome.kits, kit);
                }
            }
        }

        outcome
    }

    /// Fetch a candidate directory and return its body only if it looks
    /// like an exposed listing.
    async fn fetch_listing(&self, url: &str) -> Option<String> {
        let timeout = Duration::from_secs(self.config.collector.probe_timeout_secs);
        let response = self.client.get(url).timeout(timeout).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        let body = response.text().await.ok()?;
        if !body.contains(LISTING_MARKER) {
            return None;
        }
        Some(body)
    }
}

/// Append a kit unless its hash was already recorded for this sample.
fn push_kit(kits: &mut Vec<PhishKit>, kit: PhishKit) {
    if !kits.iter().any(|k| k.hash == kit.hash) {
        kits.push(kit);
    }
}

/// Every path-ancestor directory of a URL, deepest first, from the
/// parent of the leaf down to the host root.
fn seed_ancestors(url: &str) -> Vec<String> {
    let Ok(parsed) = Url::parse(url) else {
        return Vec::new();
    };
    let Some(host) = parsed.host_str() else {
        return Vec::new();
    };
    let authority = match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    let segments: Vec<&str> = parsed.path().split('/').filter(|s| !s.is_empty()).collect();

    let mut ancestors = Vec::new();
    for depth in (0..segments.len()).rev() {
        let mut dir = format!("{}://{}/", parsed.scheme(), authority);
        if depth > 0 {
            dir.push_str(&segments[..depth].join("/"));
            dir.push('/');
        }
        ancestors.push(dir);
    }
    ancestors
}

/// Hyperlink targets of a listing body, resolved against the listing
/// URL. The parent-directory link and `?`-prefixed sort controls are
/// not content and are skipped.
fn extract_links(base: &Url, body: &str) -> Vec<String> {
    let document = Html::parse_document(body);
    let selector = Selector::parse("a[href]").unwrap();

    let mut links = Vec::new();
    for element in document.select(&selector) {
        let text: String = element.text().collect();
        if text.contains("Parent Directory") {
            continue;
        }
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if href.is_empty() || href.starts_with('?') {
            continue;
        }
        let Ok(resolved) = base.join(href) else {
            continue;
        };
        links.push(resolved.to_string());
    }
    links
}

/// The guessed archive URL for a visited directory: trailing slash
/// stripped, `.zip` appended. The host root is excluded because
/// stripping its slash would eat into the authority.
fn guess_zip_url(dir_url: &str) -> Option<String> {
    let stripped = dir_url.trim_end_matches('/');
    let after_scheme = &stripped[stripped.find("://")? + 3..];
    if !after_scheme.contains('/') {
        return None;
    }
    Some(format!("{stripped}.zip"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_ancestors_deepest_first() {
        assert_eq!(
            seed_ancestors("http://evil.test/a/b/login.php"),
            vec![
                "http://evil.test/a/b/",
                "http://evil.test/a/",
                "http://evil.test/",
            ]
        );
    }

    #[test]
    fn test_seed_ancestors_keeps_port() {
        assert_eq!(
            seed_ancestors("http://evil.test:8080/kit/index.html"),
            vec!["http://evil.test:8080/kit/", "http://evil.test:8080/"]
        );
    }

    #[test]
    fn test_seed_ancestors_root_page_has_none() {
        assert!(seed_ancestors("http://evil.test/").is_empty());
        assert!(seed_ancestors("not a url").is_empty());
    }

    #[test]
    fn test_extract_links_filters_controls() {
        let base = Url::parse("http://evil.test/a/").unwrap();
        let body = r#"
            <html><body><h1>Index of /a</h1>
            <a href="?C=M;O=A">Last modified</a>
            <a href="/">Parent Directory</a>
            <a href="kit.zip">kit.zip</a>
            <a href="c/">c/</a>
            </body></html>
        "#;
        assert_eq!(
            extract_links(&base, body),
            vec!["http://evil.test/a/kit.zip", "http://evil.test/a/c/"]
        );
    }

    #[test]
    fn test_extract_links_resolves_absolute_paths() {
        let base = Url::parse("http://evil.test/a/b/").unwrap();
        let body = r#"<a href="/other/kit.zip">kit.zip</a>"#;
        assert_eq!(extract_links(&base, body), vec!["http://evil.test/other/kit.zip"]);
    }

    #[test]
    fn test_guess_zip_url() {
        assert_eq!(
            guess_zip_url("http://evil.test/a/b/"),
            Some("http://evil.test/a/b.zip".to_string())
        );
        assert_eq!(guess_zip_url("http://evil.test/"), None);
    }
}
