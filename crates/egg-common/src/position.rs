use serde::{Deserialize, Serialize};

/// Source position of a literal, identifier or declared name
/// (1-based line and column, as attached by the parser).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Character offset of this position inside `source`, if the position
    /// lies within it. Diagnostic renderers index source text by character.
    pub fn char_offset_in(&self, source: &str) -> Option<usize> {
        if self.line == 0 || self.column == 0 {
            return None;
        }
        let mut line_start = 0usize;
        for (index, line) in source.split_inclusive('\n').enumerate() {
            let width = line.chars().count();
            if index + 1 == self.line as usize {
                let column = self.column as usize - 1;
                // One past the last character still points into the line.
                return (column <= width).then_some(line_start + column);
            }
            line_start += width;
        }
        None
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
