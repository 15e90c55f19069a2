//! Syntax highlighting for fenced code blocks.
//!
//! syntect's default syntax and theme sets are expensive to deserialise, so
//! they are loaded once per [`Highlighter`] and shared by every block it
//! renders. The output uses inline `style` attributes, which survive
//! printing without depending on the external highlight style sheet.

use once_cell::sync::Lazy;
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use thiserror::Error;

static DEFAULT_THEMES: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

/// Whether `name` is one of syntect's bundled themes.
pub fn theme_exists(name: &str) -> bool {
    DEFAULT_THEMES.themes.contains_key(name)
}

/// Per-block highlight failure. Callers fall back to escaped code.
#[derive(Debug, Error)]
pub enum HighlightError {
    #[error("no syntax for language '{0}'")]
    UnknownLanguage(String),

    #[error("highlighting failed: {0}")]
    Syntect(#[from] syntect::Error),
}

/// Owns the syntax definitions and the selected theme.
pub struct Highlighter {
    syntaxes: SyntaxSet,
    theme: Theme,
}

impl std::fmt::Debug for Highlighter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Highlighter")
            .field("syntaxes", &self.syntaxes.syntaxes().len())
            .field("theme", &self.theme.name)
            .finish()
    }
}

impl Highlighter {
    /// Load the default syntaxes with `theme_name`, falling back to the
    /// first bundled theme when the name is unknown.
    pub fn new(theme_name: &str) -> Self {
        let theme = DEFAULT_THEMES
            .themes
            .get(theme_name)
            .or_else(|| DEFAULT_THEMES.themes.values().next())
            .cloned()
            .unwrap_or_default();
        Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
            theme,
        }
    }

    /// Highlight `code` as `lang`, returning HTML spans without the
    /// surrounding `<pre><code>` wrapper.
    ///
    /// `lang` is matched by token (`rust`, `rs`, `py`) and then by name.
    pub fn highlight(&self, code: &str, lang: &str) -> Result<String, HighlightError> {
        let syntax = self
            .syntaxes
            .find_syntax_by_token(lang)
            .or_else(|| self.syntaxes.find_syntax_by_name(lang))
            .ok_or_else(|| HighlightError::UnknownLanguage(lang.to_string()))?;

        let mut lines = HighlightLines::new(syntax, &self.theme);
        let mut html = String::with_capacity(code.len() * 2);
        for line in LinesWithEndings::from(code) {
            let regions = lines.highlight_line(line, &self.syntaxes)?;
            html.push_str(&styled_line_to_highlighted_html(
                &regions[..],
                IncludeBackground::No,
            )?);
        }
        Ok(html)
    }
}
