//! Token styles and color schemes for syntax highlighting.

use std::collections::HashMap;

/// RGBA color represented as [r, g, b, a] with values 0.0-1.0.
pub type Color = [f32; 4];

/// Token style categories emitted by the lexers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenStyle {
    /// Declaration keywords (fn, def, class, typedef, ...).
    Keyword,
    /// Control flow keywords (if, else, for, while, return, ...).
    ControlFlow,
    /// String literals and quoted attribute values.
    String,
    /// Numeric literals.
    Number,
    /// Boolean literals.
    Boolean,
    /// Named constants (null, nullptr, None, undefined).
    Constant,
    /// Comments.
    Comment,
    /// Function names at definition and call sites.
    Function,
    /// Type names and markup tag names.
    Type,
    /// Attributes, decorators, preprocessor directives, markup attributes.
    Attribute,
}

/// A syntax highlighting theme.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Theme name.
    pub name: String,
    /// Background color.
    pub background: Color,
    /// Default text color; also the "default" entry for freshly inserted
    /// characters before a highlight pass rewrites them.
    pub foreground: Color,
    /// Colors for each token style.
    colors: HashMap<TokenStyle, Color>,
}

impl Theme {
    /// The built-in dark theme.
    pub fn dark() -> Self {
        let mut colors = HashMap::new();
        colors.insert(TokenStyle::Keyword, [0.78, 0.47, 0.87, 1.0]);
        colors.insert(TokenStyle::ControlFlow, [0.86, 0.44, 0.58, 1.0]);
        colors.insert(TokenStyle::String, [0.60, 0.78, 0.45, 1.0]);
        colors.insert(TokenStyle::Number, [0.84, 0.67, 0.44, 1.0]);
        colors.insert(TokenStyle::Boolean, [0.84, 0.67, 0.44, 1.0]);
        colors.insert(TokenStyle::Constant, [0.33, 0.71, 0.85, 1.0]);
        colors.insert(TokenStyle::Comment, [0.42, 0.48, 0.42, 1.0]);
        colors.insert(TokenStyle::Function, [0.38, 0.68, 0.94, 1.0]);
        colors.insert(TokenStyle::Type, [0.31, 0.79, 0.69, 1.0]);
        colors.insert(TokenStyle::Attribute, [0.78, 0.70, 0.40, 1.0]);
        Self {
            name: "Quill Dark".to_string(),
            background: [0.10, 0.11, 0.12, 1.0],
            foreground: [0.85, 0.86, 0.87, 1.0],
            colors,
        }
    }

    /// Returns the color for a token style, falling back to the foreground.
    pub fn color(&self, style: TokenStyle) -> Color {
        self.colors.get(&style).copied().unwrap_or(self.foreground)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_styles_have_colors() {
        let theme = Theme::dark();
        assert_ne!(theme.color(TokenStyle::Keyword), theme.foreground);
        assert_ne!(theme.color(TokenStyle::Comment), theme.foreground);
    }
}
