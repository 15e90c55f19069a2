//! Document assembly: wrap rendered HTML into a printable page, build the
//! print footer and derive the PDF filename.
//!
//! All three functions are pure over their arguments (the footer takes the
//! render date explicitly through [`build_footer_template_on`]).

use crate::branding::Branding;
use crate::output::DocumentMetadata;
use crate::pipeline::markdown::escape_html;
use crate::styles::DOCUMENT_CSS;
use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

static RE_UNSAFE_FILENAME_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[/\\?%*:|"<>]"#).unwrap());

const FOOTER_STYLE: &str = "width: 100%; font-size: 9px; color: #6b7280; padding: 10px 40px; \
display: flex; justify-content: space-between; font-family: sans-serif;";

/// Wrap `body_html` in the full document skeleton.
///
/// The page header (logo, title, version) is emitted only when the
/// branding carries a logo.
pub fn build_full_html(body_html: &str, metadata: &DocumentMetadata, branding: &Branding) -> String {
    let header = match branding.logo {
        Some(ref logo) => format!(
            concat!(
                "<div class=\"page-header\">\n",
                "  <div class=\"logo-section\"><img src=\"{src}\" alt=\"{alt}\"></div>\n",
                "  <div class=\"header-info\">\n",
                "    <div class=\"header-title\">{title}</div>\n",
                "    <div class=\"header-version\">Version {version}</div>\n",
                "  </div>\n",
                "</div>\n"
            ),
            src = escape_html(logo.data_uri()),
            alt = escape_html(logo.alt()),
            title = escape_html(&metadata.title),
            version = escape_html(&metadata.version),
        ),
        None => String::new(),
    };

    format!(
        concat!(
            "<!DOCTYPE html>\n",
            "<html lang=\"en\">\n",
            "<head>\n",
            "<meta charset=\"UTF-8\">\n",
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
            "<title>{title}</title>\n",
            "<link rel=\"stylesheet\" href=\"{stylesheet}\">\n",
            "<style>{css}</style>\n",
            "</head>\n",
            "<body>\n",
            "{header}",
            "{body}\n",
            "</body>\n",
            "</html>\n"
        ),
        title = escape_html(&metadata.title),
        stylesheet = escape_html(&branding.highlight_stylesheet_url),
        css = DOCUMENT_CSS,
        header = header,
        body = body_html,
    )
}

/// Footer template dated today (local time).
pub fn build_footer_template(metadata: &DocumentMetadata) -> String {
    build_footer_template_on(metadata, Local::now().date_naive())
}

/// Footer template for a given render date.
///
/// The print service substitutes the `pageNumber` and `totalPages` spans.
pub fn build_footer_template_on(metadata: &DocumentMetadata, today: NaiveDate) -> String {
    format!(
        concat!(
            "<div style=\"{style}\">",
            "<span>Version {version} | {month_year} | Confidential</span>",
            "<span>Document generated on: {generated}</span>",
            "<span>Page <span class=\"pageNumber\"></span> of <span class=\"totalPages\"></span></span>",
            "</div>"
        ),
        style = FOOTER_STYLE,
        version = escape_html(&metadata.version),
        month_year = today.format("%B %Y"),
        generated = today.format("%-d %B %Y"),
    )
}

/// `"{date} {brand} - {client}.pdf"` with filesystem-unsafe characters
/// replaced by `-`. Empty date or client parts are dropped with their
/// separators.
///
/// `original_filename` is accepted for call-site symmetry with the upload
/// but does not influence the result.
pub fn build_pdf_filename(metadata: &DocumentMetadata, original_filename: &str, brand: &str) -> String {
    let _ = original_filename;
    let mut name = String::with_capacity(brand.len() + 48);
    if !metadata.date_str.is_empty() {
        name.push_str(&metadata.date_str);
        name.push(' ');
    }
    name.push_str(brand);
    if !metadata.client_name.is_empty() {
        name.push_str(" - ");
        name.push_str(&metadata.client_name);
    }
    name.push_str(".pdf");
    RE_UNSAFE_FILENAME_CHARS.replace_all(&name, "-").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branding::Logo;

    fn meta(client: &str, date: &str) -> DocumentMetadata {
        DocumentMetadata {
            title: "Plan <A&B>".into(),
            version: "2.1".into(),
            client_name: client.into(),
            date_str: date.into(),
        }
    }

    #[test]
    fn skeleton_without_logo_has_no_header() {
        let html = build_full_html("<p>body</p>", &meta("", "2025-01-01"), &Branding::default());
        assert!(html.starts_with("<!DOCTYPE html>\n<html lang=\"en\">"));
        assert!(html.contains("<meta charset=\"UTF-8\">"));
        assert!(html.contains("<title>Plan &lt;A&amp;B&gt;</title>"));
        assert!(html.contains("atom-one-dark"));
        assert!(html.contains("<p>body</p>"));
        assert!(!html.contains("page-header"));
    }

    #[test]
    fn logo_turns_header_on() {
        let branding = Branding {
            logo: Some(Logo::from_bytes(b"png", "image/png", "Brand Logo")),
            ..Branding::default()
        };
        let html = build_full_html("<p>x</p>", &meta("", "2025-01-01"), &branding);
        assert!(html.contains("<div class=\"page-header\">"));
        assert!(html.contains("src=\"data:image/png;base64,"));
        assert!(html.contains("alt=\"Brand Logo\""));
        assert!(html.contains("Version 2.1"));
    }

    #[test]
    fn style_sheet_is_embedded() {
        let html = build_full_html("", &meta("", ""), &Branding::default());
        assert!(html.contains("<style>"));
        assert!(html.contains(DOCUMENT_CSS));
    }

    #[test]
    fn footer_has_three_cells_and_placeholders() {
        let today = NaiveDate::from_ymd_opt(2025, 12, 5).unwrap();
        let footer = build_footer_template_on(&meta("", ""), today);
        assert!(footer.contains("<span>Version 2.1 | December 2025 | Confidential</span>"));
        assert!(footer.contains("<span>Document generated on: 5 December 2025</span>"));
        assert!(footer.contains("<span class=\"pageNumber\"></span>"));
        assert!(footer.contains("<span class=\"totalPages\"></span>"));
        assert_eq!(footer.matches("<span>").count(), 3);
    }

    #[test]
    fn filename_with_all_parts() {
        let name = build_pdf_filename(&meta("ACME Corp", "2025-12-15"), "in.md", "Brand");
        assert_eq!(name, "2025-12-15 Brand - ACME Corp.pdf");
    }

    #[test]
    fn filename_without_client_has_no_dangling_separator() {
        let name = build_pdf_filename(&meta("", "2025-12-15"), "in.md", "Brand");
        assert_eq!(name, "2025-12-15 Brand.pdf");
        assert!(!name.contains("  "));
    }

    #[test]
    fn filename_without_date_starts_with_brand() {
        assert_eq!(build_pdf_filename(&meta("", ""), "in.md", "Brand"), "Brand.pdf");
    }

    #[test]
    fn unsafe_characters_are_replaced() {
        let name = build_pdf_filename(&meta("A/B\\C?D%E*F:G|H\"I<J>K", "2025-01-01"), "x", "Brand");
        assert_eq!(name, "2025-01-01 Brand - A-B-C-D-E-F-G-H-I-J-K.pdf");
        assert!(name.ends_with(".pdf"));
    }

    #[test]
    fn original_filename_is_ignored() {
        let m = meta("X", "2025-01-01");
        assert_eq!(
            build_pdf_filename(&m, "a.md", "Brand"),
            build_pdf_filename(&m, "completely/different.md", "Brand")
        );
    }
}
