//! Canonical content shapes shared by the newsdesk gateway and its consumers.
//!
//! Every backend response, live or substitute, is normalized into an [`Envelope`] of
//! [`ContentItem`]s before it leaves the fetching layer, so consumers never probe
//! alternative nestings.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Pagination summary carried by every list envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub page_count: u32,
    pub total: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::empty(DEFAULT_PAGE, DEFAULT_PAGE_SIZE)
    }
}

impl Pagination {
    pub fn empty(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            page_count: 0,
            total: 0,
        }
    }

    /// Summary for a result that fits on a single default-sized page.
    pub fn single_page(total: usize) -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            page_count: u32::from(total > 0),
            total: total as u64,
        }
    }

    /// Summary for `total` items split into pages of `page_size`.
    pub fn for_total(page: u32, page_size: u32, total: u64) -> Self {
        let page_count = if page_size == 0 {
            0
        } else {
            total.div_ceil(u64::from(page_size))
        };
        Self {
            page,
            page_size,
            page_count: u32::try_from(page_count).unwrap_or(u32::MAX),
            total,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub pagination: Pagination,
}

/// `{ data: [...], meta: { pagination } }`, uniform across list and single-item results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub meta: Meta,
}

impl<T> Envelope<T> {
    pub fn new(data: Vec<T>, pagination: Pagination) -> Self {
        Self {
            data,
            meta: Meta { pagination },
        }
    }

    /// Wrap a sequence as a single page: `{page: 1, pageSize: 10, pageCount: 1, total: N}`.
    pub fn wrap(data: Vec<T>) -> Self {
        let pagination = Pagination::single_page(data.len());
        Self::new(data, pagination)
    }

    pub fn empty(page: u32, page_size: u32) -> Self {
        Self::new(Vec::new(), Pagination::empty(page, page_size))
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn pagination(&self) -> &Pagination {
        &self.meta.pagination
    }

    pub fn first(&self) -> Option<&T> {
        self.data.first()
    }

    pub fn into_first(self) -> Option<T> {
        self.data.into_iter().next()
    }
}

impl<T> Default for Envelope<T> {
    fn default() -> Self {
        Self::empty(DEFAULT_PAGE, DEFAULT_PAGE_SIZE)
    }
}

/// A single piece of structured content (article, category, home document, ...).
///
/// Attributes stay free-form; the typed accessors cover the fields the gateway itself
/// reasons about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: u64,
    #[serde(
        rename = "documentId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub document_id: Option<String>,
    pub locale: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl ContentItem {
    pub fn new(id: u64, locale: impl Into<String>) -> Self {
        Self {
            id,
            document_id: None,
            locale: locale.into(),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn str_attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    pub fn slug(&self) -> Option<&str> {
        self.str_attribute("slug")
    }

    pub fn title(&self) -> Option<&str> {
        self.str_attribute("title")
    }

    pub fn description(&self) -> Option<&str> {
        self.str_attribute("description")
    }

    pub fn published_at(&self) -> Option<OffsetDateTime> {
        self.timestamp("publishedAt")
    }

    pub fn updated_at(&self) -> Option<OffsetDateTime> {
        self.timestamp("updatedAt")
    }

    /// Tag names, whether tags are stored as `[{ "name": .. }]` or as plain strings.
    pub fn tag_names(&self) -> Vec<&str> {
        let Some(Value::Array(tags)) = self.attributes.get("tags") else {
            return Vec::new();
        };
        tags.iter()
            .filter_map(|tag| match tag {
                Value::String(name) => Some(name.as_str()),
                Value::Object(fields) => fields.get("name").and_then(Value::as_str),
                _ => None,
            })
            .collect()
    }

    fn timestamp(&self, key: &str) -> Option<OffsetDateTime> {
        self.str_attribute(key)
            .and_then(|raw| OffsetDateTime::parse(raw, &Rfc3339).ok())
    }
}
