//! Built-in substitute content served while the CMS is unreachable.
//!
//! Every response has the same envelope shape as a live one, so callers never special-case
//! degraded mode.

use once_cell::sync::Lazy;
use serde_json::{Value, json};

use crate::domain::query::{ContentQuery, Operation};
use crate::domain::{ContentItem, ContentResult, Envelope};

const MOCK_LOCALE: &str = "en";
const DEMO_IMAGE: &str = "/images/demo_logo.png";

static ARTICLES: Lazy<Vec<ContentItem>> = Lazy::new(|| {
    vec![
        article(
            1,
            "Welcome to Our News Platform",
            "welcome-to-our-news-platform",
            "This is a demo article to showcase our news platform capabilities when the CMS is not available.",
            "This is a sample article content. In a real scenario, this would be loaded from your CMS. The platform is designed to work seamlessly with a headless CMS, but also provides fallback content when the CMS is offline.",
            "2024-01-15T00:00:00.000Z",
            ("Technology", "technology"),
            ("Demo Author", "demo-author"),
            &[("demo", "demo"), ("news", "news")],
        ),
        article(
            2,
            "Getting Started with Content Management",
            "getting-started-with-content-management",
            "Learn how to manage your content effectively using our CMS integration.",
            "Content management is crucial for any modern website. This article explains the basics of setting up and using a CMS for your content needs.",
            "2024-01-14T00:00:00.000Z",
            ("Tutorial", "tutorial"),
            ("Content Manager", "content-manager"),
            &[("tutorial", "tutorial"), ("cms", "cms")],
        ),
        article(
            3,
            "Building Responsive Websites",
            "building-responsive-websites",
            "Best practices for creating websites that work on all devices.",
            "Responsive design is essential in today's multi-device world. Learn the key principles and techniques for building websites that adapt to different screen sizes.",
            "2024-01-13T00:00:00.000Z",
            ("Web Development", "web-development"),
            ("Web Developer", "web-developer"),
            &[("responsive", "responsive"), ("web-design", "web-design")],
        ),
    ]
});

static CATEGORIES: Lazy<Vec<ContentItem>> = Lazy::new(|| {
    [
        (1, "Technology", "technology"),
        (2, "Tutorial", "tutorial"),
        (3, "Web Development", "web-development"),
    ]
    .into_iter()
    .map(|(id, name, slug)| {
        ContentItem::new(id, MOCK_LOCALE)
            .with_attribute("name", json!(name))
            .with_attribute("slug", json!(slug))
    })
    .collect()
});

static HOME: Lazy<ContentItem> = Lazy::new(|| {
    let teasers: Vec<Value> = [
        (1, "Sample Article 1", "sample-article-1", "2024-01-01T00:00:00.000Z", "Health"),
        (2, "Sample Article 2", "sample-article-2", "2024-01-02T00:00:00.000Z", "Geography"),
        (3, "Sample Article 3", "sample-article-3", "2024-01-03T00:00:00.000Z", "Events & Updates"),
    ]
    .into_iter()
    .map(|(id, title, slug, published_at, category)| {
        json!({
            "id": id,
            "title": title,
            "description": format!("This is the description of {}", title.to_lowercase()),
            "slug": slug,
            "publishedAt": published_at,
            "thumbnail": { "url": DEMO_IMAGE, "alternativeText": "Article thumbnail" },
            "category": { "name": category },
        })
    })
    .collect();

    ContentItem::new(1, MOCK_LOCALE)
        .with_attribute("title", json!("Welcome to Our Platform"))
        .with_attribute(
            "subtitle",
            json!("Your trusted source for news and information"),
        )
        .with_attribute(
            "description",
            json!("This is a demo homepage. In a real scenario, this content would be managed through your CMS."),
        )
        .with_attribute(
            "banners",
            json!([{
                "id": 1,
                "title": "Featured Article",
                "description": "Check out our latest featured content",
                "image": { "url": DEMO_IMAGE, "alternativeText": "Featured banner" }
            }]),
        )
        .with_attribute("articles", Value::Array(teasers))
        .with_attribute(
            "homeDetails",
            json!([{
                "id": 1,
                "title": "About Us",
                "description": "We provide quality content and news updates.",
                "icon": "info"
            }]),
        )
        .with_attribute(
            "homeImg",
            json!({ "url": DEMO_IMAGE, "alternativeText": "Homepage image" }),
        )
});

#[allow(clippy::too_many_arguments)]
fn article(
    id: u64,
    title: &str,
    slug: &str,
    description: &str,
    content: &str,
    published_at: &str,
    category: (&str, &str),
    author: (&str, &str),
    tags: &[(&str, &str)],
) -> ContentItem {
    let tags: Vec<Value> = tags
        .iter()
        .map(|(name, slug)| json!({ "name": name, "slug": slug }))
        .collect();
    ContentItem::new(id, MOCK_LOCALE)
        .with_attribute("title", json!(title))
        .with_attribute("slug", json!(slug))
        .with_attribute("description", json!(description))
        .with_attribute("content", json!(content))
        .with_attribute("publishedAt", json!(published_at))
        .with_attribute(
            "cover",
            json!({ "url": DEMO_IMAGE, "alternativeText": title }),
        )
        .with_attribute(
            "category",
            json!({ "name": category.0, "slug": category.1 }),
        )
        .with_attribute("author", json!({ "name": author.0, "slug": author.1 }))
        .with_attribute("tags", Value::Array(tags))
}

pub fn articles() -> &'static [ContentItem] {
    &ARTICLES
}

pub fn categories() -> &'static [ContentItem] {
    &CATEGORIES
}

pub fn home() -> &'static ContentItem {
    &HOME
}

/// Wrap items in the live envelope shape: `{page: 1, pageSize: 10, pageCount: 1, total: N}`.
pub fn envelope(items: Vec<ContentItem>) -> ContentResult {
    Envelope::wrap(items)
}

/// Case-insensitive substring match on title, description and tag names.
pub fn search(text: &str) -> Vec<ContentItem> {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    let matches = |value: Option<&str>| value.is_some_and(|v| v.to_lowercase().contains(&needle));
    ARTICLES
        .iter()
        .filter(|item| {
            matches(item.title())
                || matches(item.description())
                || item.tag_names().into_iter().any(|tag| matches(Some(tag)))
        })
        .cloned()
        .collect()
}

/// The substitute response for `query`'s operation.
///
/// The article list only honours the requested page size, as a truncation of the three
/// built-in articles. The page number is ignored and the envelope always reports page 1, so
/// a degraded news list shows one page.
pub fn respond(query: &ContentQuery) -> ContentResult {
    match query.operation() {
        Operation::Articles => {
            let limit = query
                .page()
                .map_or(ARTICLES.len(), |page| page.page_size as usize);
            envelope(ARTICLES.iter().take(limit).cloned().collect())
        }
        Operation::ArticleBySlug => envelope(
            ARTICLES
                .iter()
                .filter(|item| query.slug().is_some_and(|slug| item.slug() == Some(slug)))
                .take(1)
                .cloned()
                .collect(),
        ),
        Operation::SearchArticles => envelope(search(query.search_text().unwrap_or_default())),
        Operation::Categories => envelope(categories().to_vec()),
        Operation::Home => envelope(vec![home().clone()]),
        Operation::Contact | Operation::Social(_) => envelope(Vec::new()),
    }
}
