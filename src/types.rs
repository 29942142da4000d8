//! Core types used throughout the project.

/// A position in a source file (1-indexed, as reported to humans).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourcePosition {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
}

impl From<tree_sitter::Point> for SourcePosition {
    #[allow(clippy::cast_possible_truncation)] // ソースファイルの行・列が42億を超えることはない
    fn from(point: tree_sitter::Point) -> Self {
        Self { line: point.row as u32 + 1, column: point.column as u32 + 1 }
    }
}

impl std::fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;

    use super::*;

    #[googletest::test]
    fn test_position_from_point_is_one_based() {
        let point = tree_sitter::Point { row: 0, column: 0 };
        let position = SourcePosition::from(point);

        expect_that!(position.line, eq(1));
        expect_that!(position.column, eq(1));
    }

    #[googletest::test]
    fn test_position_display() {
        let position = SourcePosition { line: 12, column: 4 };

        expect_that!(format!("{position}"), eq("12:4"));
    }
}
