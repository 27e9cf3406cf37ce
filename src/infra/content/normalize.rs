//! Backend JSON → canonical [`ContentResult`].
//!
//! The backend may answer with flat items (`{id, documentId, title, ...}`) or with the older
//! nesting (`{id, attributes: {title, ...}}`), and with `data` as a list or a single
//! document. All of that is resolved here, once.

use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use crate::application::backend::ContentError;
use crate::domain::locale::LocaleSet;
use crate::domain::query::ContentQuery;
use crate::domain::{ContentItem, ContentResult, Envelope, Pagination};

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    data: Option<RawData>,
    #[serde(default)]
    meta: Option<RawMeta>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawData {
    Many(Vec<RawItem>),
    One(Box<RawItem>),
}

#[derive(Debug, Default, Deserialize)]
struct RawMeta {
    #[serde(default)]
    pagination: Option<RawPagination>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPagination {
    page: Option<u32>,
    page_size: Option<u32>,
    page_count: Option<u32>,
    total: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct RawItem {
    #[serde(default)]
    id: Option<RawId>,
    #[serde(default, rename = "documentId")]
    document_id: Option<String>,
    #[serde(default)]
    locale: Option<String>,
    #[serde(default)]
    attributes: Option<Map<String, Value>>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

/// Normalize a backend response for `query`.
///
/// Items without a (supported) locale are stamped with the query's locale, or the default
/// locale for locale-free documents. Missing pagination is derived from the query.
pub fn normalize(
    value: Value,
    query: &ContentQuery,
    locales: &LocaleSet,
) -> Result<ContentResult, ContentError> {
    let raw: RawEnvelope =
        serde_json::from_value(value).map_err(|err| ContentError::Decode(err.to_string()))?;

    let stamp = query
        .locale()
        .unwrap_or_else(|| locales.default_locale())
        .as_str();

    let items: Vec<ContentItem> = match raw.data {
        None => Vec::new(),
        Some(RawData::Many(items)) => items
            .into_iter()
            .map(|item| normalize_item(item, stamp, locales))
            .collect(),
        Some(RawData::One(item)) => vec![normalize_item(*item, stamp, locales)],
    };

    let requested = query.page().unwrap_or_default();
    let derived = Pagination::for_total(requested.page, requested.page_size, items.len() as u64);
    let pagination = match raw.meta.and_then(|meta| meta.pagination) {
        Some(raw) => Pagination {
            page: raw.page.unwrap_or(derived.page),
            page_size: raw.page_size.unwrap_or(derived.page_size),
            page_count: raw.page_count.unwrap_or(derived.page_count),
            total: raw.total.unwrap_or(derived.total),
        },
        None => derived,
    };

    Ok(Envelope::new(items, pagination))
}

/// Attribute names that hold media objects (`{url, alternativeText, formats, ...}`).
const MEDIA_FIELDS: [&str; 5] = ["cover", "thumbnail", "image", "homeImg", "shareImage"];

/// Rewrite backend-relative media `url`s (`/uploads/x.jpg`) against `base`.
///
/// Media objects are found by attribute name at any depth, so `banners[*].image` is covered.
/// URLs that already start with `http` are left alone.
pub fn resolve_media_urls(result: &mut ContentResult, base: &Url) {
    let base = base.as_str().trim_end_matches('/');
    for item in &mut result.data {
        for (key, value) in item.attributes.iter_mut() {
            visit(key, value, base);
        }
    }
}

fn visit(key: &str, value: &mut Value, base: &str) {
    if MEDIA_FIELDS.contains(&key) {
        rewrite_urls(value, base);
        return;
    }
    match value {
        Value::Object(map) => {
            for (key, value) in map.iter_mut() {
                visit(key, value, base);
            }
        }
        Value::Array(values) => {
            for value in values {
                visit("", value, base);
            }
        }
        _ => {}
    }
}

fn rewrite_urls(value: &mut Value, base: &str) {
    match value {
        Value::Object(map) => {
            for (key, value) in map.iter_mut() {
                match value {
                    Value::String(url) if key == "url" => {
                        if let Some(absolute) = absolute_media_url(base, url) {
                            *url = absolute;
                        }
                    }
                    other => rewrite_urls(other, base),
                }
            }
        }
        Value::Array(values) => values.iter_mut().for_each(|value| rewrite_urls(value, base)),
        _ => {}
    }
}

fn absolute_media_url(base: &str, url: &str) -> Option<String> {
    if url.is_empty() || url.starts_with("http") {
        return None;
    }
    let separator = if url.starts_with('/') { "" } else { "/" };
    Some(format!("{base}{separator}{url}"))
}

fn normalize_item(raw: RawItem, stamp: &str, locales: &LocaleSet) -> ContentItem {
    let mut attributes = raw.rest;
    if let Some(nested) = raw.attributes {
        attributes.extend(nested);
    }

    let nested_locale = attributes
        .remove("locale")
        .and_then(|value| value.as_str().map(str::to_owned));
    let locale = raw
        .locale
        .or(nested_locale)
        .filter(|code| locales.contains(code))
        .unwrap_or_else(|| stamp.to_string());

    let nested_document_id = attributes
        .remove("documentId")
        .and_then(|value| value.as_str().map(str::to_owned));

    let id = match raw.id {
        Some(RawId::Number(id)) => id,
        Some(RawId::Text(text)) => text.parse().unwrap_or_default(),
        None => 0,
    };

    ContentItem {
        id,
        document_id: raw.document_id.or(nested_document_id),
        locale,
        attributes,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::locale::Locale;
    use crate::domain::query::SocialChannel;

    fn locale(code: &str) -> Locale {
        Locale::new(code).expect("locale")
    }

    #[test]
    fn flat_items_keep_their_fields() {
        let body = json!({
            "data": [
                { "id": 4, "documentId": "abc", "locale": "th", "title": "สวัสดี", "slug": "hello" }
            ],
            "meta": { "pagination": { "page": 1, "pageSize": 10, "pageCount": 1, "total": 1 } }
        });
        let result = normalize(
            body,
            &ContentQuery::articles(locale("th")),
            &LocaleSet::default(),
        )
        .expect("normalize");
        let item = result.first().expect("one item");
        assert_eq!(item.id, 4);
        assert_eq!(item.document_id.as_deref(), Some("abc"));
        assert_eq!(item.locale, "th");
        assert_eq!(item.slug(), Some("hello"));
        assert_eq!(result.pagination().total, 1);
    }

    #[test]
    fn nested_attributes_are_flattened() {
        let body = json!({
            "data": [
                { "id": "9", "attributes": { "title": "Nested", "locale": "en", "slug": "nested" } }
            ]
        });
        let result = normalize(
            body,
            &ContentQuery::articles(locale("th")),
            &LocaleSet::default(),
        )
        .expect("normalize");
        let item = result.first().expect("one item");
        assert_eq!(item.id, 9);
        assert_eq!(item.locale, "en");
        assert_eq!(item.title(), Some("Nested"));
        assert!(item.attribute("attributes").is_none());
        assert!(item.attribute("locale").is_none());
    }

    #[test]
    fn single_document_becomes_one_item_envelope() {
        let body = json!({ "data": { "id": 1, "title": "Home" } });
        let result = normalize(
            body,
            &ContentQuery::home(locale("th")),
            &LocaleSet::default(),
        )
        .expect("normalize");
        assert_eq!(result.len(), 1);
        assert_eq!(result.first().map(|item| item.locale.as_str()), Some("th"));
        assert_eq!(result.pagination().page_count, 1);
    }

    #[test]
    fn null_or_missing_data_is_empty() {
        for body in [json!({ "data": null }), json!({})] {
            let result = normalize(
                body,
                &ContentQuery::categories(locale("en")),
                &LocaleSet::default(),
            )
            .expect("normalize");
            assert!(result.is_empty());
            assert_eq!(result.pagination().page_count, 0);
        }
    }

    #[test]
    fn unsupported_item_locale_is_restamped() {
        let body = json!({ "data": [{ "id": 1, "locale": "fr" }] });
        let result = normalize(
            body,
            &ContentQuery::articles(locale("th")),
            &LocaleSet::default(),
        )
        .expect("normalize");
        assert_eq!(result.first().map(|item| item.locale.as_str()), Some("th"));
    }

    #[test]
    fn locale_free_documents_take_the_default_locale() {
        let body = json!({ "data": { "id": 2, "url": "https://facebook.com/example" } });
        let result = normalize(
            body,
            &ContentQuery::social(SocialChannel::Facebook),
            &LocaleSet::default(),
        )
        .expect("normalize");
        assert_eq!(result.first().map(|item| item.locale.as_str()), Some("en"));
    }

    #[test]
    fn partial_pagination_is_completed_from_the_query() {
        let body = json!({
            "data": [{ "id": 1 }, { "id": 2 }],
            "meta": { "pagination": { "total": 42 } }
        });
        let result = normalize(
            body,
            &ContentQuery::articles(locale("en")),
            &LocaleSet::default(),
        )
        .expect("normalize");
        assert_eq!(result.pagination().total, 42);
        assert_eq!(result.pagination().page, 1);
        assert_eq!(result.pagination().page_size, 10);
    }

    #[test]
    fn non_object_data_is_a_decode_error() {
        let err = normalize(
            json!({ "data": 5 }),
            &ContentQuery::articles(locale("en")),
            &LocaleSet::default(),
        )
        .expect_err("number is not content");
        assert!(matches!(err, ContentError::Decode(_)));
    }

    #[test]
    fn relative_media_urls_resolve_against_the_backend() {
        let body = json!({
            "data": {
                "id": 1,
                "title": "Home",
                "homeImg": { "url": "/uploads/home.jpg" },
                "banners": [
                    {
                        "title": "Hero",
                        "url": "/en/newslist",
                        "image": { "url": "/uploads/hero.png" }
                    }
                ],
                "cover": {
                    "url": "https://cdn.example.com/cover.jpg",
                    "formats": { "small": { "url": "uploads/small_cover.jpg" } }
                }
            }
        });
        let mut result = normalize(
            body,
            &ContentQuery::home(locale("en")),
            &LocaleSet::default(),
        )
        .expect("normalize");
        let base = Url::parse("http://cms.local:1337/").expect("url");
        resolve_media_urls(&mut result, &base);

        let home = result.first().expect("one item");
        let attributes = Value::Object(home.attributes.clone());
        let url = |pointer: &str| attributes.pointer(pointer).and_then(Value::as_str);
        assert_eq!(url("/homeImg/url"), Some("http://cms.local:1337/uploads/home.jpg"));
        assert_eq!(url("/banners/0/image/url"), Some("http://cms.local:1337/uploads/hero.png"));
        assert_eq!(url("/banners/0/url"), Some("/en/newslist"));
        assert_eq!(url("/cover/url"), Some("https://cdn.example.com/cover.jpg"));
        assert_eq!(
            url("/cover/formats/small/url"),
            Some("http://cms.local:1337/uploads/small_cover.jpg")
        );
    }
}
