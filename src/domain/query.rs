//! Query descriptors for the content backend and their query-string encoding.

use std::fmt;

use newsdesk_content_types::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE};

use super::locale::Locale;

const ARTICLES_ENDPOINT: &str = "/api/articles";
const CATEGORIES_ENDPOINT: &str = "/api/categories";
const HOME_ENDPOINT: &str = "/api/home";
const CONTACT_ENDPOINT: &str = "/api/contact";
const FACEBOOK_ENDPOINT: &str = "/api/social";
const INSTAGRAM_ENDPOINT: &str = "/api/instagram";

pub const PUBLISHED_AT: &str = "publishedAt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocialChannel {
    Facebook,
    Instagram,
}

impl SocialChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            SocialChannel::Facebook => "facebook",
            SocialChannel::Instagram => "instagram",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Articles,
    ArticleBySlug,
    SearchArticles,
    Categories,
    Home,
    Contact,
    Social(SocialChannel),
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::Articles => "articles",
            Operation::ArticleBySlug => "article-by-slug",
            Operation::SearchArticles => "search",
            Operation::Categories => "categories",
            Operation::Home => "home",
            Operation::Contact => "contact",
            Operation::Social(SocialChannel::Facebook) => "social-facebook",
            Operation::Social(SocialChannel::Instagram) => "social-instagram",
        }
    }

    pub fn endpoint(self) -> &'static str {
        match self {
            Operation::Articles | Operation::ArticleBySlug | Operation::SearchArticles => {
                ARTICLES_ENDPOINT
            }
            Operation::Categories => CATEGORIES_ENDPOINT,
            Operation::Home => HOME_ENDPOINT,
            Operation::Contact => CONTACT_ENDPOINT,
            Operation::Social(SocialChannel::Facebook) => FACEBOOK_ENDPOINT,
            Operation::Social(SocialChannel::Instagram) => INSTAGRAM_ENDPOINT,
        }
    }

    /// Operations whose consumers want at most one item.
    pub fn is_single(self) -> bool {
        matches!(
            self,
            Operation::ArticleBySlug | Operation::Home | Operation::Contact | Operation::Social(_)
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sort {
    field: String,
    direction: SortDirection,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    pub fn newest_first() -> Self {
        Self::desc(PUBLISHED_AT)
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = match self.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        write!(f, "{}:{direction}", self.field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    Eq,
    ContainsI,
}

impl FilterOp {
    fn as_str(self) -> &'static str {
        match self {
            FilterOp::Eq => "$eq",
            FilterOp::ContainsI => "$containsi",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: String,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    pub fn contains_i(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::ContainsI,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterClause {
    Where(Filter),
    /// Matches when any of the filters matches (`filters[$or][i]...`).
    AnyOf(Vec<Filter>),
}

/// Which related fields the backend should expand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Populate {
    #[default]
    None,
    /// `populate=*`
    All,
    /// `populate[field]=*`
    Fields(Vec<String>),
    /// Raw `populate...` pairs, emitted in order.
    Custom(Vec<(String, String)>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_PAGE_SIZE)
    }
}

/// A single request against the content backend.
///
/// Built once per fetch; the locale-fallback attempt derives a sibling via
/// [`ContentQuery::with_locale`] instead of mutating the original.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentQuery {
    operation: Operation,
    locale: Option<Locale>,
    page: Option<PageRequest>,
    sort: Option<Sort>,
    filters: Vec<FilterClause>,
    populate: Populate,
    slug: Option<String>,
    search: Option<String>,
}

impl ContentQuery {
    fn new(operation: Operation, locale: Option<Locale>) -> Self {
        Self {
            operation,
            locale,
            page: None,
            sort: None,
            filters: Vec::new(),
            populate: Populate::None,
            slug: None,
            search: None,
        }
    }

    /// Article list: newest first, everything populated, first page of ten.
    pub fn articles(locale: Locale) -> Self {
        Self {
            page: Some(PageRequest::default()),
            sort: Some(Sort::newest_first()),
            populate: Populate::All,
            ..Self::new(Operation::Articles, Some(locale))
        }
    }

    /// Newest `limit` articles with only the relations a teaser card shows.
    pub fn featured_articles(locale: Locale, limit: u32) -> Self {
        Self::articles(locale)
            .with_page(PageRequest::new(1, limit))
            .with_populate(Populate::Fields(
                ["cover", "author", "category", "tags"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            ))
    }

    pub fn article_by_slug(locale: Locale, slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            filters: vec![FilterClause::Where(Filter::eq("slug", slug.clone()))],
            populate: Populate::Custom(vec![
                ("populate".into(), "*".into()),
                ("populate[blocks][populate]".into(), "*".into()),
                (
                    "populate[blocks][on][shared.slider][populate][files]".into(),
                    "*".into(),
                ),
                (
                    "populate[blocks][on][shared.slider][populate][images]".into(),
                    "*".into(),
                ),
            ]),
            slug: Some(slug),
            ..Self::new(Operation::ArticleBySlug, Some(locale))
        }
    }

    /// Case-insensitive containment on title, description or tags.
    pub fn search(locale: Locale, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            page: Some(PageRequest::default()),
            filters: vec![FilterClause::AnyOf(vec![
                Filter::contains_i("title", text.clone()),
                Filter::contains_i("description", text.clone()),
                Filter::contains_i("tags", text.clone()),
            ])],
            populate: Populate::All,
            search: Some(text),
            ..Self::new(Operation::SearchArticles, Some(locale))
        }
    }

    pub fn categories(locale: Locale) -> Self {
        Self {
            populate: Populate::All,
            ..Self::new(Operation::Categories, Some(locale))
        }
    }

    pub fn home(locale: Locale) -> Self {
        Self {
            populate: Populate::Custom(vec![
                ("populate[banners][populate]".into(), "*".into()),
                ("populate[homeDetails][populate]".into(), "*".into()),
                ("populate[SEO][populate]".into(), "*".into()),
                ("populate".into(), "homeImg".into()),
            ]),
            ..Self::new(Operation::Home, Some(locale))
        }
    }

    pub fn contact(locale: Locale) -> Self {
        Self {
            populate: Populate::All,
            ..Self::new(Operation::Contact, Some(locale))
        }
    }

    pub fn social(channel: SocialChannel) -> Self {
        Self {
            populate: Populate::All,
            ..Self::new(Operation::Social(channel), None)
        }
    }

    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_filter(mut self, clause: FilterClause) -> Self {
        self.filters.push(clause);
        self
    }

    pub fn with_populate(mut self, populate: Populate) -> Self {
        self.populate = populate;
        self
    }

    /// Same query, different locale.
    pub fn with_locale(&self, locale: Locale) -> Self {
        Self {
            locale: Some(locale),
            ..self.clone()
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn locale(&self) -> Option<&Locale> {
        self.locale.as_ref()
    }

    pub fn page(&self) -> Option<PageRequest> {
        self.page
    }

    pub fn sort(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }

    pub fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    pub fn search_text(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Encode as backend query pairs: sort, locale, populate, pagination, filters.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();

        if let Some(sort) = &self.sort {
            pairs.push(("sort".to_string(), sort.to_string()));
        }

        if let Some(locale) = &self.locale {
            pairs.push(("locale".to_string(), locale.to_string()));
        }

        match &self.populate {
            Populate::None => {}
            Populate::All => pairs.push(("populate".to_string(), "*".to_string())),
            Populate::Fields(fields) => {
                for field in fields {
                    pairs.push((format!("populate[{field}]"), "*".to_string()));
                }
            }
            Populate::Custom(raw) => pairs.extend(raw.iter().cloned()),
        }

        if let Some(page) = self.page {
            pairs.push(("pagination[page]".to_string(), page.page.to_string()));
            pairs.push((
                "pagination[pageSize]".to_string(),
                page.page_size.to_string(),
            ));
        }

        for clause in &self.filters {
            match clause {
                FilterClause::Where(filter) => pairs.push((
                    format!("filters[{}][{}]", filter.field, filter.op.as_str()),
                    filter.value.clone(),
                )),
                FilterClause::AnyOf(filters) => {
                    for (index, filter) in filters.iter().enumerate() {
                        pairs.push((
                            format!(
                                "filters[$or][{index}][{}][{}]",
                                filter.field,
                                filter.op.as_str()
                            ),
                            filter.value.clone(),
                        ));
                    }
                }
            }
        }

        pairs
    }
}
