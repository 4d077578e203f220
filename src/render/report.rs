use crate::range::RangeLabel;
use crate::storage::{Article, AuthorReport, POST_DATE_FORMAT};
use crate::util::{escape_html, escape_url};

/// "since 1 year ago", or "at any time" for the open-ended range.
fn period(range: RangeLabel) -> String {
    match range {
        RangeLabel::AllTime => "at any time".to_string(),
        other => format!("since {}", other),
    }
}

fn render_article(out: &mut String, article: &Article) {
    out.push_str(&format!(
        "<li><a href='{}' target='_blank' rel='noopener'>{}</a> ({})</li>\n",
        escape_url(&article.permalink),
        escape_html(&article.title),
        article.published.format(POST_DATE_FORMAT),
    ));
}

/// Render the report fragment swapped into the settings page.
///
/// Authors appear in the order given, each with a heading and either a list of
/// articles or an explicit "no articles" note. The fragment is the entire body
/// of a selection-change response.
pub fn render_report(reports: &[AuthorReport], range: RangeLabel) -> String {
    let period = period(range);
    let mut out = String::with_capacity(256 + reports.len() * 256);

    out.push_str(&format!(
        "<h2>Articles published {} sorted by author</h2>\n",
        escape_html(&period)
    ));

    if reports.is_empty() {
        out.push_str(&format!(
            "<p class='no-authors'>No authors found with articles published {}.</p>\n",
            escape_html(&period)
        ));
        return out;
    }

    for report in reports {
        out.push_str(&format!(
            "<h3>{} ({} articles)</h3>\n",
            escape_html(&report.author.display_name),
            report.article_count()
        ));

        if report.articles.is_empty() {
            out.push_str(&format!(
                "<p class='no-articles'>No articles found for this author {}.</p>\n",
                escape_html(&period)
            ));
            continue;
        }

        out.push_str("<ul>\n");
        for article in &report.articles {
            render_article(&mut out, article);
        }
        out.push_str("</ul>\n");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Author;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn author(id: i64, name: &str) -> Author {
        Author {
            id,
            display_name: Arc::from(name),
        }
    }

    fn article(id: i64, author_id: i64, title: &str, day: u32) -> Article {
        Article {
            id,
            author_id,
            title: Arc::from(title),
            published: NaiveDate::from_ymd_opt(2024, 5, day)
                .unwrap()
                .and_hms_opt(8, 15, 0)
                .unwrap(),
            permalink: format!("https://example.org/?p={id}"),
        }
    }

    #[test]
    fn test_empty_reports_render_single_message() {
        let html = render_report(&[], RangeLabel::OneYear);
        assert_eq!(
            html,
            "<h2>Articles published since 1 year ago sorted by author</h2>\n\
             <p class='no-authors'>No authors found with articles published since 1 year ago.</p>\n"
        );
    }

    #[test]
    fn test_all_time_wording() {
        let html = render_report(&[], RangeLabel::AllTime);
        assert!(html.contains("Articles published at any time sorted by author"));
    }

    #[test]
    fn test_author_with_articles() {
        let reports = vec![AuthorReport {
            author: author(1, "Ana"),
            articles: vec![article(11, 1, "Second", 20), article(10, 1, "First", 2)],
        }];
        let html = render_report(&reports, RangeLabel::ThreeMonths);
        assert_eq!(
            html,
            "<h2>Articles published since 3 months ago sorted by author</h2>\n\
             <h3>Ana (2 articles)</h3>\n\
             <ul>\n\
             <li><a href='https://example.org/?p=11' target='_blank' rel='noopener'>Second</a> (2024-05-20 08:15:00)</li>\n\
             <li><a href='https://example.org/?p=10' target='_blank' rel='noopener'>First</a> (2024-05-02 08:15:00)</li>\n\
             </ul>\n"
        );
    }

    #[test]
    fn test_author_without_articles_gets_explicit_note() {
        let reports = vec![AuthorReport {
            author: author(2, "Bo"),
            articles: vec![],
        }];
        let html = render_report(&reports, RangeLabel::OneYear);
        assert!(html.contains("<h3>Bo (0 articles)</h3>"));
        assert!(html.contains("No articles found for this author since 1 year ago."));
        assert!(!html.contains("<ul>"));
    }

    #[test]
    fn test_count_is_always_plural() {
        let reports = vec![AuthorReport {
            author: author(1, "Ana"),
            articles: vec![article(10, 1, "Only", 2)],
        }];
        assert!(render_report(&reports, RangeLabel::OneYear).contains("<h3>Ana (1 articles)</h3>"));
    }

    #[test]
    fn test_names_and_titles_are_escaped() {
        let reports = vec![AuthorReport {
            author: author(1, "<script>alert('x')</script>"),
            articles: vec![article(10, 1, "Tom & \"Jerry\" <b>", 2)],
        }];
        let html = render_report(&reports, RangeLabel::OneYear);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(&#039;x&#039;)&lt;/script&gt;"));
        assert!(html.contains("Tom &amp; &quot;Jerry&quot; &lt;b&gt;"));
    }

    #[test]
    fn test_non_http_permalink_is_dropped() {
        let mut bad = article(10, 1, "Bad link", 2);
        bad.permalink = "javascript:alert(1)".to_string();
        let reports = vec![AuthorReport {
            author: author(1, "Ana"),
            articles: vec![bad],
        }];
        let html = render_report(&reports, RangeLabel::OneYear);
        assert!(html.contains("<a href='' target='_blank'"));
        assert!(!html.contains("javascript:"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let reports = vec![
            AuthorReport {
                author: author(1, "Ana"),
                articles: vec![article(10, 1, "A", 2)],
            },
            AuthorReport {
                author: author(2, "Bo"),
                articles: vec![],
            },
        ];
        assert_eq!(
            render_report(&reports, RangeLabel::SixMonths),
            render_report(&reports, RangeLabel::SixMonths)
        );
    }
}
