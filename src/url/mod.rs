//! URL handling module for Crawlbox
//!
//! This module provides URL canonicalization, scope and keyword filtering of
//! discovered links, and the stable identifier encoding used for frontier
//! database names and archive file names.

mod encode;
mod filter;
mod normalize;

pub use encode::encode_url;
pub use filter::LinkFilter;
pub use normalize::normalize_url;
