use crate::range::RangeLabel;
use crate::util::escape_html;

/// Page styling.
const STYLE: &str = r#"<style>
    .author-article-list-admin-container h2 {
        border-bottom: 2px solid #ddd;
        padding-bottom: 10px;
    }
    .author-article-list-admin-container h3 {
        margin-top: 25px;
        color: #555;
        font-size: 1.2em;
    }
    .author-article-list-admin-container ul {
        list-style-type: disc;
        margin-left: 20px;
    }
    .author-article-list-admin-container li {
        margin-bottom: 5px;
    }
    #author-article-range label {
        margin-right: 12px;
    }
</style>"#;

/// Posts the checked range on every change and once on load, then swaps the
/// returned fragment into the report container. Endpoint and token are read
/// from data attributes on the form.
const SCRIPT: &str = r#"<script>
(function () {
    const form = document.getElementById('author-article-range');
    const target = document.getElementById('author-article-report');
    if (!form || !target) {
        return;
    }

    function refresh(range) {
        const body = new URLSearchParams({ range: range, security: form.dataset.security });
        fetch(form.dataset.endpoint, { method: 'POST', body: body, credentials: 'same-origin' })
            .then(function (res) {
                if (!res.ok) {
                    throw new Error('HTTP ' + res.status);
                }
                return res.text();
            })
            .then(function (html) {
                target.innerHTML = html;
            })
            .catch(function (err) {
                console.error('author report refresh failed', err);
                target.insertAdjacentHTML('afterbegin', "<p class='error'>Could not refresh the report.</p>");
            });
    }

    form.querySelectorAll("input[name='RadioRange']").forEach(function (radio) {
        radio.addEventListener('change', function () {
            if (radio.checked) {
                refresh(radio.value);
            }
        });
    });

    const checked = form.querySelector("input[name='RadioRange']:checked");
    if (checked) {
        refresh(checked.value);
    }
})();
</script>"#;

/// Radio set with one option per range, `selected` pre-checked.
pub fn render_selector(selected: RangeLabel) -> String {
    let mut out = String::new();
    for range in RangeLabel::ALL {
        let label = escape_html(range.as_str());
        let checked = if range == selected { " checked" } else { "" };
        out.push_str(&format!(
            "<label><input type='radio' name='RadioRange' value='{label}'{checked}> {label}</label>\n"
        ));
    }
    out
}

/// Inputs to [`render_page`].
#[derive(Debug, Clone)]
pub struct PageParts<'a> {
    /// Output of [`render_selector`].
    pub selector: &'a str,
    /// Output of [`render_report`](super::render_report).
    pub fragment: &'a str,
    /// Anti-forgery token the client echoes back as `security`.
    pub token: &'a str,
    /// Where the client posts range changes.
    pub endpoint: &'a str,
}

/// The full settings page: selector, initial report, styling and refresh script.
pub fn render_page(parts: &PageParts<'_>) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html lang='en'>\n\
         <head>\n<meta charset='utf-8'>\n<title>Author Articles</title>\n{style}\n</head>\n\
         <body>\n\
         <div class='wrap'>\n\
         <h1>Author Article List</h1>\n\
         <form id='author-article-range' data-endpoint='{endpoint}' data-security='{token}'>\n\
         {selector}\
         </form>\n\
         <div id='author-article-report' class='author-article-list-admin-container'>\n\
         {fragment}\
         </div>\n\
         </div>\n\
         {script}\n\
         </body>\n\
         </html>\n",
        style = STYLE,
        endpoint = escape_html(parts.endpoint),
        token = escape_html(parts.token),
        selector = parts.selector,
        fragment = parts.fragment,
        script = SCRIPT,
    )
}
