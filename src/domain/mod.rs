//! Locale and query types independent of any transport.

pub mod locale;
pub mod query;

pub use newsdesk_content_types::{ContentItem, Envelope, Pagination};

/// A normalized backend result: ordered items plus a pagination summary.
pub type ContentResult = Envelope<ContentItem>;
