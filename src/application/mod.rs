//! Content resolution and page assembly.

pub mod backend;
pub mod content;
pub mod error;
pub mod mock;
pub mod pages;
pub mod search;
pub mod sitemap;
