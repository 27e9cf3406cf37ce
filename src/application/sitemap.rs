//! sitemap.xml generation.

use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use url::Url;

use crate::application::content::ContentService;
use crate::cache::{Clock, SystemClock};
use crate::domain::query::{PageRequest, Sort};

const ARTICLE_PAGE_SIZE: u32 = 10;

#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("public site url is not configured")]
    MissingSiteUrl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChangeFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl ChangeFrequency {
    fn as_str(self) -> &'static str {
        match self {
            ChangeFrequency::Daily => "daily",
            ChangeFrequency::Weekly => "weekly",
            ChangeFrequency::Monthly => "monthly",
        }
    }
}

#[derive(Clone)]
pub struct SitemapService {
    content: ContentService,
    site_url: Option<Url>,
    clock: Arc<dyn Clock>,
}

impl SitemapService {
    pub fn new(content: ContentService, site_url: Option<Url>) -> Self {
        Self::with_clock(content, site_url, Arc::new(SystemClock))
    }

    pub fn with_clock(
        content: ContentService,
        site_url: Option<Url>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            content,
            site_url,
            clock,
        }
    }

    /// Static pages followed by one entry per article on the first page of
    /// default-locale articles.
    pub async fn sitemap_xml(&self) -> Result<String, SitemapError> {
        let site_url = self.site_url.as_ref().ok_or(SitemapError::MissingSiteUrl)?;
        let base = site_url.as_str();
        let now = self.clock.now();
        let locales = self.content.locales();
        let default = locales.default_locale();

        let mut entries = vec![
            sitemap_entry(base, "/", Some(now), ChangeFrequency::Daily, "1.0"),
            sitemap_entry(
                base,
                &format!("/{default}/newslist"),
                Some(now),
                ChangeFrequency::Daily,
                "0.9",
            ),
        ];
        for locale in locales.supported() {
            entries.push(sitemap_entry(
                base,
                &format!("/{locale}/contact"),
                Some(now),
                ChangeFrequency::Monthly,
                "0.8",
            ));
        }

        let articles = self
            .content
            .articles(
                default,
                PageRequest::new(1, ARTICLE_PAGE_SIZE),
                Sort::newest_first(),
            )
            .await;
        for article in &articles.data {
            let Some(slug) = article.slug() else {
                continue;
            };
            let lastmod = article.updated_at().or_else(|| article.published_at());
            entries.push(sitemap_entry(
                base,
                &format!("/{default}/newsdesc/{slug}"),
                lastmod,
                ChangeFrequency::Weekly,
                "0.8",
            ));
        }

        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
        );
        for entry in entries {
            xml.push_str(&entry);
        }
        xml.push_str("</urlset>\n");
        Ok(xml)
    }
}

fn sitemap_entry(
    base: &str,
    path: &str,
    lastmod: Option<OffsetDateTime>,
    changefreq: ChangeFrequency,
    priority: &str,
) -> String {
    let loc = escape_xml(&canonical_url(base, path));
    let lastmod = lastmod
        .and_then(|dt| dt.format(&Rfc3339).ok())
        .map(|formatted| format!("<lastmod>{formatted}</lastmod>"))
        .unwrap_or_default();
    format!(
        "  <url><loc>{loc}</loc>{lastmod}<changefreq>{}</changefreq><priority>{priority}</priority></url>\n",
        changefreq.as_str()
    )
}

fn canonical_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path == "/" {
        base.to_string()
    } else {
        format!("{base}{path}")
    }
}

fn escape_xml(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
