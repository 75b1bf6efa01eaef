//! Closed lexer dispatch.
//!
//! The engine never owns tokenization rules; it selects one of a fixed set
//! of tree-sitter grammars by file extension and maps node kinds to token
//! styles. Everything runs over a snapshot on the highlight worker and polls
//! the cancel token between nodes.

use super::scheduler::CancelToken;
use super::theme::{Color, Theme, TokenStyle};
use crate::error::EngineError;
use std::path::Path;
use tree_sitter::{Node, Parser, TreeCursor};

/// How many nodes are painted between cancel-token polls.
const CANCEL_POLL_STRIDE: usize = 64;

/// The closed set of tokenizers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexerKind {
    Cpp,
    Python,
    Html,
    Jsx,
    #[default]
    PlainText,
}

impl LexerKind {
    /// Extension → tokenizer table. Unknown extensions are plain text.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "c" | "h" | "cpp" | "cc" | "cxx" | "c++" | "hpp" | "hh" | "hxx" | "h++" => Self::Cpp,
            "py" | "pyw" | "pyi" => Self::Python,
            "html" | "htm" => Self::Html,
            "js" | "jsx" | "mjs" | "cjs" => Self::Jsx,
            _ => Self::PlainText,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::PlainText)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Cpp => "C++",
            Self::Python => "Python",
            Self::Html => "HTML",
            Self::Jsx => "JSX",
            Self::PlainText => "Plain Text",
        }
    }

    fn grammar(&self) -> Option<tree_sitter::Language> {
        match self {
            Self::Cpp => Some(tree_sitter_cpp::LANGUAGE.into()),
            Self::Python => Some(tree_sitter_python::LANGUAGE.into()),
            Self::Html => Some(tree_sitter_html::LANGUAGE.into()),
            Self::Jsx => Some(tree_sitter_javascript::LANGUAGE.into()),
            Self::PlainText => None,
        }
    }

    /// Runs this tokenizer over `text`, writing colors for the characters in
    /// `[start, end)`. Entries outside the span are left untouched. Returns
    /// early (without error) when cancelled.
    pub fn apply(
        &self,
        text: &str,
        colors: &mut [Color],
        start: usize,
        end: usize,
        theme: &Theme,
        cancel: &CancelToken,
    ) -> Result<(), EngineError> {
        let span_end = end.min(colors.len());
        let span_start = start.min(span_end);
        for slot in &mut colors[span_start..span_end] {
            *slot = theme.foreground;
        }

        let Some(grammar) = self.grammar() else {
            return Ok(());
        };

        let mut parser = Parser::new();
        parser
            .set_language(&grammar)
            .map_err(|err| EngineError::Tokenize(err.to_string()))?;
        if cancel.is_cancelled() {
            return Ok(());
        }
        let tree = parser
            .parse(text, None)
            .ok_or_else(|| EngineError::Tokenize("parser produced no tree".to_string()))?;

        let mut painter = Painter {
            kind: *self,
            colors,
            span_start,
            span_end,
            char_of_byte: char_offsets(text),
            theme,
            cancel,
            nodes_since_poll: 0,
        };
        painter.walk(&mut tree.walk());
        Ok(())
    }
}

/// Char offset for every byte offset of `text` (plus one entry for the end).
fn char_offsets(text: &str) -> Vec<usize> {
    let mut table = vec![0; text.len() + 1];
    let mut chars = 0;
    for (byte, ch) in text.char_indices() {
        for slot in &mut table[byte..byte + ch.len_utf8()] {
            *slot = chars;
        }
        chars += 1;
    }
    table[text.len()] = chars;
    table
}

struct Painter<'a> {
    kind: LexerKind,
    colors: &'a mut [Color],
    span_start: usize,
    span_end: usize,
    char_of_byte: Vec<usize>,
    theme: &'a Theme,
    cancel: &'a CancelToken,
    nodes_since_poll: usize,
}

impl Painter<'_> {
    /// Depth-first walk; children are painted after their parent so inner
    /// spans win. Returns false when cancelled.
    fn walk(&mut self, cursor: &mut TreeCursor) -> bool {
        loop {
            self.nodes_since_poll += 1;
            if self.nodes_since_poll >= CANCEL_POLL_STRIDE {
                self.nodes_since_poll = 0;
                if self.cancel.is_cancelled() {
                    return false;
                }
            }

            let node = cursor.node();
            if let Some(style) = node_style(self.kind, &node) {
                self.paint(&node, style);
            }

            if cursor.goto_first_child() {
                if !self.walk(cursor) {
                    return false;
                }
                cursor.goto_parent();
            }
            if !cursor.goto_next_sibling() {
                return true;
            }
        }
    }

    fn paint(&mut self, node: &Node, style: TokenStyle) {
        let max_byte = self.char_of_byte.len() - 1;
        let from = self.char_of_byte[node.start_byte().min(max_byte)].max(self.span_start);
        let to = self.char_of_byte[node.end_byte().min(max_byte)].min(self.span_end);
        if from < to {
            let color = self.theme.color(style);
            for slot in &mut self.colors[from..to] {
                *slot = color;
            }
        }
    }
}

fn node_style(kind: LexerKind, node: &Node) -> Option<TokenStyle> {
    match kind {
        LexerKind::Cpp => cpp_style(node),
        LexerKind::Python => python_style(node),
        LexerKind::Html => html_style(node),
        LexerKind::Jsx => jsx_style(node),
        LexerKind::PlainText => None,
    }
}

/// True when `node` is the `field` child of its parent.
fn is_field_of_parent(node: &Node, parent_kinds: &[&str], field: &str) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    parent_kinds.contains(&parent.kind()) && parent.child_by_field_name(field) == Some(*node)
}

fn cpp_style(node: &Node) -> Option<TokenStyle> {
    match node.kind() {
        "auto" | "const" | "constexpr" | "enum" | "extern" | "inline" | "namespace"
        | "operator" | "signed" | "sizeof" | "static" | "struct" | "template" | "typedef"
        | "typename" | "union" | "unsigned" | "using" | "virtual" | "volatile" | "class"
        | "public" | "private" | "protected" | "friend" | "explicit" | "mutable" | "new"
        | "delete" | "this" | "noexcept" | "decltype" => Some(TokenStyle::Keyword),

        "if" | "else" | "for" | "while" | "do" | "switch" | "case" | "default" | "break"
        | "continue" | "return" | "goto" | "try" | "catch" | "throw" => {
            Some(TokenStyle::ControlFlow)
        }

        "string_literal" | "char_literal" | "raw_string_literal" | "system_lib_string" => {
            Some(TokenStyle::String)
        }
        "number_literal" => Some(TokenStyle::Number),
        "true" | "false" => Some(TokenStyle::Boolean),
        "null" | "nullptr" => Some(TokenStyle::Constant),
        "comment" => Some(TokenStyle::Comment),

        "type_identifier" | "primitive_type" | "sized_type_specifier" => Some(TokenStyle::Type),

        "preproc_include" | "preproc_def" | "preproc_ifdef" | "preproc_ifndef" | "preproc_if"
        | "preproc_else" | "preproc_elif" | "preproc_endif" | "#include" | "#define"
        | "#ifdef" | "#ifndef" | "#if" | "#else" | "#elif" | "#endif" | "#pragma" => {
            Some(TokenStyle::Attribute)
        }

        "identifier" => {
            if is_field_of_parent(node, &["function_declarator"], "declarator")
                || is_field_of_parent(node, &["call_expression"], "function")
            {
                Some(TokenStyle::Function)
            } else {
                None
            }
        }

        _ => None,
    }
}

fn python_style(node: &Node) -> Option<TokenStyle> {
    match node.kind() {
        "def" | "class" | "import" | "from" | "as" | "global" | "nonlocal" | "lambda"
        | "with" | "assert" | "yield" | "del" | "pass" | "raise" | "except" | "finally"
        | "try" | "async" | "await" => Some(TokenStyle::Keyword),

        "if" | "elif" | "else" | "for" | "while" | "break" | "continue" | "return" | "in"
        | "not" | "and" | "or" | "is" => Some(TokenStyle::ControlFlow),

        "string" | "string_start" | "string_content" | "string_end" => Some(TokenStyle::String),
        "integer" | "float" => Some(TokenStyle::Number),
        "true" | "false" => Some(TokenStyle::Boolean),
        "none" => Some(TokenStyle::Constant),
        "comment" => Some(TokenStyle::Comment),
        "decorator" => Some(TokenStyle::Attribute),

        "identifier" => {
            if is_field_of_parent(node, &["function_definition", "class_definition"], "name")
                || is_field_of_parent(node, &["call"], "function")
            {
                Some(TokenStyle::Function)
            } else {
                None
            }
        }

        _ => None,
    }
}

fn html_style(node: &Node) -> Option<TokenStyle> {
    match node.kind() {
        "tag_name" | "erroneous_end_tag_name" => Some(TokenStyle::Type),
        "attribute_name" => Some(TokenStyle::Attribute),
        "attribute_value" | "quoted_attribute_value" => Some(TokenStyle::String),
        "comment" => Some(TokenStyle::Comment),
        "doctype" => Some(TokenStyle::Keyword),
        "entity" => Some(TokenStyle::Constant),
        _ => None,
    }
}

fn jsx_style(node: &Node) -> Option<TokenStyle> {
    match node.kind() {
        "function" | "const" | "let" | "var" | "class" | "extends" | "import" | "export"
        | "default" | "from" | "as" | "new" | "this" | "super" | "static" | "get" | "set"
        | "async" | "await" | "typeof" | "instanceof" | "void" | "delete" | "in" | "of" => {
            Some(TokenStyle::Keyword)
        }

        "if" | "else" | "for" | "while" | "do" | "switch" | "case" | "break" | "continue"
        | "return" | "throw" | "try" | "catch" | "finally" | "yield" => {
            Some(TokenStyle::ControlFlow)
        }

        "string" | "template_string" | "string_fragment" => Some(TokenStyle::String),
        "number" => Some(TokenStyle::Number),
        "true" | "false" => Some(TokenStyle::Boolean),
        "null" | "undefined" => Some(TokenStyle::Constant),
        "comment" => Some(TokenStyle::Comment),

        "identifier" => {
            if is_field_of_parent(node, &["function_declaration", "method_definition"], "name")
                || is_field_of_parent(node, &["call_expression"], "function")
            {
                Some(TokenStyle::Function)
            } else if is_field_of_parent(
                node,
                &[
                    "jsx_opening_element",
                    "jsx_closing_element",
                    "jsx_self_closing_element",
                ],
                "name",
            ) {
                Some(TokenStyle::Type)
            } else {
                None
            }
        }
        "property_identifier" => {
            if node
                .parent()
                .map(|p| p.kind() == "jsx_attribute")
                .unwrap_or(false)
            {
                Some(TokenStyle::Attribute)
            } else if is_field_of_parent(node, &["call_expression"], "function") {
                Some(TokenStyle::Function)
            } else {
                None
            }
        }

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLANK: Color = [0.0, 0.0, 0.0, 0.0];

    fn apply(kind: LexerKind, text: &str) -> (Vec<Color>, Theme) {
        let theme = Theme::dark();
        let mut colors = vec![BLANK; text.chars().count()];
        let cancel = CancelToken::new();
        kind.apply(text, &mut colors, 0, text.chars().count(), &theme, &cancel)
            .unwrap();
        (colors, theme)
    }

    #[test]
    fn extension_table_is_closed() {
        assert_eq!(LexerKind::from_extension("cpp"), LexerKind::Cpp);
        assert_eq!(LexerKind::from_extension("CC"), LexerKind::Cpp);
        assert_eq!(LexerKind::from_extension("py"), LexerKind::Python);
        assert_eq!(LexerKind::from_extension("html"), LexerKind::Html);
        assert_eq!(LexerKind::from_extension("jsx"), LexerKind::Jsx);
        assert_eq!(LexerKind::from_extension("rs"), LexerKind::PlainText);
        assert_eq!(
            LexerKind::from_path(Path::new("src/main.cpp")),
            LexerKind::Cpp
        );
        assert_eq!(LexerKind::from_path(Path::new("README")), LexerKind::PlainText);
    }

    #[test]
    fn plain_text_fills_span_with_foreground() {
        let (colors, theme) = apply(LexerKind::PlainText, "hello world");
        assert!(colors.iter().all(|&c| c == theme.foreground));
    }

    #[test]
    fn apply_only_touches_the_requested_span() {
        let theme = Theme::dark();
        let text = "hello";
        let mut colors = vec![BLANK; 5];
        let cancel = CancelToken::new();
        LexerKind::PlainText
            .apply(text, &mut colors, 1, 3, &theme, &cancel)
            .unwrap();
        assert_eq!(colors[0], BLANK);
        assert_eq!(colors[1], theme.foreground);
        assert_eq!(colors[2], theme.foreground);
        assert_eq!(colors[3], BLANK);
    }

    #[test]
    fn cpp_types_and_strings_get_styled() {
        let source = "int main() { const char* s = \"hi\"; }";
        let (colors, theme) = apply(LexerKind::Cpp, source);
        // "int" is a primitive type.
        assert_eq!(colors[0], theme.color(TokenStyle::Type));
        // The string literal, including quotes.
        let quote = source.find('"').unwrap();
        assert_eq!(colors[quote], theme.color(TokenStyle::String));
    }

    #[test]
    fn python_keywords_get_styled() {
        let source = "def f():\n    return 1\n";
        let (colors, theme) = apply(LexerKind::Python, source);
        assert_eq!(colors[0], theme.color(TokenStyle::Keyword)); // def
        let ret = source.find("return").unwrap();
        assert_eq!(colors[ret], theme.color(TokenStyle::ControlFlow));
    }

    #[test]
    fn html_tags_get_styled() {
        let source = "<div class=\"x\">hi</div>";
        let (colors, theme) = apply(LexerKind::Html, source);
        assert_eq!(colors[1], theme.color(TokenStyle::Type)); // div
        let class = source.find("class").unwrap();
        assert_eq!(colors[class], theme.color(TokenStyle::Attribute));
    }

    #[test]
    fn cancelled_apply_returns_without_error() {
        let theme = Theme::dark();
        let text = "int x = 1;";
        let mut colors = vec![BLANK; text.len()];
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(LexerKind::Cpp
            .apply(text, &mut colors, 0, text.len(), &theme, &cancel)
            .is_ok());
    }

    #[test]
    fn char_offsets_handle_multibyte() {
        let table = char_offsets("aé b");
        // 'a'=1 byte, 'é'=2 bytes, ' '=1, 'b'=1 -> 5 bytes, 4 chars.
        assert_eq!(table, vec![0, 1, 1, 2, 3, 4]);
    }
}
