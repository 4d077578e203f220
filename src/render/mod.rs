//! HTML rendering for the author report.
//!
//! Everything here is a pure function of its inputs: the same reports and
//! range always produce byte-identical markup. Text coming from the content
//! database (display names, titles) is escaped before it is embedded.

mod page;
mod report;

pub use page::{render_page, render_selector, PageParts};
pub use report::render_report;
