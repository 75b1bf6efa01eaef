//! Text metrics collaborator.
//!
//! Supplies the line height and per-glyph advances used by caret pixel math,
//! hit-testing, and scrolling. The renderer owns the real font; the engine
//! only consumes these numbers.

pub trait TextMetrics {
    /// Height of one line in pixels.
    fn line_height(&self) -> f32;

    /// Horizontal advance of `ch` in pixels.
    fn advance(&self, ch: char) -> f32;
}

/// Fixed-cell metrics. The default for tests and terminals without a real
/// font; tabs advance by four cells.
#[derive(Debug, Clone, Copy)]
pub struct MonospaceMetrics {
    pub cell_width: f32,
    pub line_height: f32,
}

impl Default for MonospaceMetrics {
    fn default() -> Self {
        Self {
            cell_width: 8.0,
            line_height: 16.0,
        }
    }
}

impl TextMetrics for MonospaceMetrics {
    fn line_height(&self) -> f32 {
        self.line_height
    }

    fn advance(&self, ch: char) -> f32 {
        match ch {
            '\n' => 0.0,
            '\t' => self.cell_width * 4.0,
            _ => self.cell_width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monospace_advances() {
        let metrics = MonospaceMetrics::default();
        assert_eq!(metrics.advance('a'), 8.0);
        assert_eq!(metrics.advance('\t'), 32.0);
        assert_eq!(metrics.advance('\n'), 0.0);
    }
}
