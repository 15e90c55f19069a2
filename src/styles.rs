//! Fixed style sheet embedded in every assembled document.
//!
//! Keeping the CSS in one constant means the look of every PDF changes in
//! exactly one place, and tests can assert on the selectors the assembler
//! relies on (`.page-header`, `.logo-section`, `.header-title`).
//!
//! Colours follow the brand palette: violet accent `#7c3aed`, grey rules
//! `#e5e7eb`, dark code blocks.

/// Highlight.js theme linked from every document's `<head>`.
///
/// Code blocks carry inline colours from the syntax highlighter, so this
/// sheet only styles the `.hljs` wrapper when the print service can reach it.
pub const DEFAULT_HIGHLIGHT_STYLESHEET_URL: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/highlight.js/11.8.0/styles/atom-one-dark.min.css";

/// Document style sheet, embedded verbatim in a `<style>` element.
pub const DOCUMENT_CSS: &str = r#"html {
  background: #e5e7eb;
  margin: 0;
  padding: 0;
}

body {
  font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Helvetica Neue', Arial, sans-serif;
  line-height: 1.6;
  color: #333333;
  background: white;
  padding: 50px 35px;
  max-width: 750px;
  margin: 0 auto;
  font-size: 11pt;
}

/* Headers */
h1, h2, h3, h4, h5, h6 {
  color: #1a1a1a;
  margin-top: 1.5em;
  margin-bottom: 0.5em;
  font-weight: 600;
}

h1 {
  font-size: 24pt;
  border-bottom: 2px solid #7c3aed;
  padding-bottom: 0.3em;
}

h2 {
  font-size: 18pt;
  color: #7c3aed;
}

h3 {
  font-size: 14pt;
}

/* Paragraphs and text */
p {
  margin: 1em 0;
}

strong {
  font-weight: 600;
}

/* Links */
a {
  color: #7c3aed;
  text-decoration: none;
}

a:hover {
  text-decoration: underline;
}

/* Lists */
ul, ol {
  margin: 1em 0;
  padding-left: 2em;
}

li {
  margin: 0.5em 0;
}

/* Tables */
table {
  width: 100%;
  border-collapse: collapse;
  margin: 1.5em 0;
  font-size: 10pt;
}

th {
  background-color: #7c3aed;
  color: white;
  padding: 12px 15px;
  text-align: left;
  font-weight: 600;
}

td {
  padding: 10px 15px;
  border-bottom: 1px solid #e5e7eb;
}

tr:nth-child(even) {
  background-color: #f9fafb;
}

/* Code blocks */
pre {
  background-color: #1e1e1e;
  padding: 16px;
  border-radius: 8px;
  overflow-x: auto;
  margin: 1.5em 0;
}

pre code {
  color: #d4d4d4;
  font-family: 'Fira Code', 'Monaco', 'Consolas', monospace;
  font-size: 10pt;
  line-height: 1.5;
}

code {
  font-family: 'Fira Code', 'Monaco', 'Consolas', monospace;
  background-color: #f3f4f6;
  padding: 2px 6px;
  border-radius: 4px;
  font-size: 0.9em;
}

pre code {
  background: none;
  padding: 0;
}

/* Blockquotes */
blockquote {
  border-left: 4px solid #7c3aed;
  margin: 1.5em 0;
  padding: 0.5em 1em;
  background-color: #f9fafb;
  color: #4b5563;
}

/* Horizontal rules */
hr {
  border: none;
  border-top: 1px solid #e5e7eb;
  margin: 2em 0;
}

/* Page header styling */
.page-header {
  display: flex;
  justify-content: space-between;
  align-items: center;
  margin-bottom: 2em;
  padding-bottom: 1em;
  border-bottom: 2px solid #7c3aed;
}

.logo-section img {
  max-height: 50px;
  width: auto;
}

.header-info {
  text-align: right;
}

.header-title {
  font-size: 14pt;
  font-weight: 600;
  color: #7c3aed;
}

.header-version {
  font-size: 10pt;
  color: #6b7280;
}

/* Print-specific styles */
@media print {
  body {
    padding: 0;
  }

  pre {
    white-space: pre-wrap;
    word-wrap: break-word;
  }
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_styles_header_block() {
        for selector in [".page-header", ".logo-section img", ".header-title", ".header-version"] {
            assert!(DOCUMENT_CSS.contains(selector), "missing selector {selector}");
        }
    }

    #[test]
    fn css_has_print_rules() {
        assert!(DOCUMENT_CSS.contains("@media print"));
        assert!(DOCUMENT_CSS.contains("white-space: pre-wrap"));
    }

    #[test]
    fn highlight_stylesheet_is_https() {
        assert!(DEFAULT_HIGHLIGHT_STYLESHEET_URL.starts_with("https://"));
        assert!(DEFAULT_HIGHLIGHT_STYLESHEET_URL.ends_with(".css"));
    }
}
