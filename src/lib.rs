//! Localized news content gateway over a headless CMS.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
