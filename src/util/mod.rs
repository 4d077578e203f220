//! Utility functions for common operations.
//!
//! This module provides reusable utilities for:
//!
//! - **Text sanitization**: Reducing untrusted client input to safe single-line strings
//! - **HTML escaping**: Safe embedding of author names, titles and links in report markup
//!
//! # Examples
//!
//! ```
//! use byline::util::{escape_html, sanitize_text_field};
//!
//! let label = sanitize_text_field(" <i>all time</i>\n");
//! assert_eq!(label, "all time");
//!
//! let heading = escape_html("Ana & \"Bo\"");
//! assert_eq!(heading, "Ana &amp; &quot;Bo&quot;");
//! ```

mod html;
mod text;

pub use html::{escape_html, escape_url};
pub use text::{sanitize_text_field, strip_control_chars, strip_tags};
