//! Data behind each public page.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::application::content::ContentService;
use crate::domain::locale::Locale;
use crate::domain::query::{PUBLISHED_AT, PageRequest, SocialChannel, Sort};
use crate::domain::{ContentItem, ContentResult};

pub const FEATURED_ARTICLES: u32 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOption {
    #[default]
    Newest,
    Oldest,
    TitleAsc,
    TitleDesc,
    Popular,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown sort option `{0}`")]
pub struct UnknownSortOption(pub String);

impl SortOption {
    pub const ALL: [SortOption; 5] = [
        SortOption::Newest,
        SortOption::Oldest,
        SortOption::TitleAsc,
        SortOption::TitleDesc,
        SortOption::Popular,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortOption::Newest => "newest",
            SortOption::Oldest => "oldest",
            SortOption::TitleAsc => "title-asc",
            SortOption::TitleDesc => "title-desc",
            SortOption::Popular => "popular",
        }
    }

    /// Backend sort order. There is no view counter, so `popular` orders like `newest`.
    pub fn to_sort(self) -> Sort {
        match self {
            SortOption::Newest | SortOption::Popular => Sort::desc(PUBLISHED_AT),
            SortOption::Oldest => Sort::asc(PUBLISHED_AT),
            SortOption::TitleAsc => Sort::asc("title"),
            SortOption::TitleDesc => Sort::desc("title"),
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOption {
    type Err = UnknownSortOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortOption::ALL
            .into_iter()
            .find(|option| option.as_str() == s)
            .ok_or_else(|| UnknownSortOption(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HomePage {
    pub locale: Locale,
    pub home: Option<ContentItem>,
    pub featured: Vec<ContentItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewsListPage {
    pub locale: Locale,
    pub sort: SortOption,
    #[serde(flatten)]
    pub articles: ContentResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactPage {
    pub locale: Locale,
    pub contact: Option<ContentItem>,
    pub facebook: Option<ContentItem>,
    pub instagram: Option<ContentItem>,
}

#[derive(Clone)]
pub struct PageService {
    content: ContentService,
}

impl PageService {
    pub fn new(content: ContentService) -> Self {
        Self { content }
    }

    pub fn content(&self) -> &ContentService {
        &self.content
    }

    pub async fn home(&self, locale: &Locale) -> HomePage {
        let (home, featured) = tokio::join!(
            self.content.home(locale),
            self.content.featured_articles(locale, FEATURED_ARTICLES),
        );
        HomePage {
            locale: locale.clone(),
            home,
            featured: featured.data,
        }
    }

    pub async fn news_list(
        &self,
        locale: &Locale,
        sort: SortOption,
        page: PageRequest,
    ) -> NewsListPage {
        let articles = self.content.articles(locale, page, sort.to_sort()).await;
        NewsListPage {
            locale: locale.clone(),
            sort,
            articles,
        }
    }

    pub async fn contact(&self, locale: &Locale) -> ContactPage {
        let (contact, facebook, instagram) = tokio::join!(
            self.content.contact(locale),
            self.content.social(SocialChannel::Facebook),
            self.content.social(SocialChannel::Instagram),
        );
        ContactPage {
            locale: locale.clone(),
            contact,
            facebook,
            instagram,
        }
    }
}
