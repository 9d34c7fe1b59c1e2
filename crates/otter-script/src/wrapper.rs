//! Prologue/epilogue wrapping.
//!
//! The wrapper never inserts characters of its own: the final text is exactly
//! `prologue + body + epilogue`. It records how far the prologue pushed the
//! body so positions reported against the final text can be moved back.

use crate::position::Position;

/// Final source text together with the shift the prologue introduced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedSource {
    pub final_text: String,
    /// Number of line breaks in the prologue.
    pub body_offset_lines: u32,
    /// Characters between the prologue's last line break and the body.
    pub body_offset_columns: u32,
    body_end: Position,
    has_epilogue: bool,
}

/// Part of the final text a position falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Prologue,
    /// Position relative to the start of the body.
    Body(Position),
    Epilogue,
}

/// Concatenate `prologue`, `body` and `epilogue`.
pub fn wrap(body: impl Into<String>, prologue: &str, epilogue: &str) -> WrappedSource {
    let body = body.into();
    let (body_lines, body_tail) = extent(&body);

    if prologue.is_empty() && epilogue.is_empty() {
        return WrappedSource {
            body_end: Position::new(body_lines + 1, body_tail + 1),
            final_text: body,
            body_offset_lines: 0,
            body_offset_columns: 0,
            has_epilogue: false,
        };
    }

    let (offset_lines, offset_columns) = extent(prologue);
    let body_end = if body_lines == 0 {
        Position::new(offset_lines + 1, offset_columns + body_tail + 1)
    } else {
        Position::new(offset_lines + body_lines + 1, body_tail + 1)
    };

    let mut final_text = String::with_capacity(prologue.len() + body.len() + epilogue.len());
    final_text.push_str(prologue);
    final_text.push_str(&body);
    final_text.push_str(epilogue);

    tracing::trace!(
        offset_lines,
        offset_columns,
        "wrapped body with {} byte prologue and {} byte epilogue",
        prologue.len(),
        epilogue.len()
    );

    WrappedSource {
        final_text,
        body_offset_lines: offset_lines,
        body_offset_columns: offset_columns,
        body_end,
        has_epilogue: !epilogue.is_empty(),
    }
}

impl WrappedSource {
    /// First position of the body in the final text.
    pub fn body_start(&self) -> Position {
        Position::new(self.body_offset_lines + 1, self.body_offset_columns + 1)
    }

    /// Position just past the last character of the final text.
    pub fn end(&self) -> Position {
        let (lines, tail) = extent(&self.final_text);
        Position::new(lines + 1, tail + 1)
    }

    /// Classify a final-text position and translate body positions.
    ///
    /// Positions past the body count as epilogue only when an epilogue exists;
    /// otherwise they are end-of-input positions of the body itself.
    pub fn locate(&self, position: Position) -> Region {
        if position < self.body_start() {
            return Region::Prologue;
        }
        if self.has_epilogue && position >= self.body_end {
            return Region::Epilogue;
        }

        let column = if position.line == self.body_offset_lines + 1 {
            position.column - self.body_offset_columns
        } else {
            position.column
        };
        Region::Body(Position::new(
            position.line - self.body_offset_lines,
            column,
        ))
    }
}

/// Line breaks in `text` and characters after the last one.
fn extent(text: &str) -> (u32, u32) {
    let lines = text.matches('\n').count();
    let tail = match text.rfind('\n') {
        Some(idx) => &text[idx + 1..],
        None => text,
    };
    (lines as u32, tail.chars().count() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_wrappers_return_body_unchanged() {
        let wrapped = wrap("1 + 2", "", "");
        assert_eq!(wrapped.final_text, "1 + 2");
        assert_eq!(wrapped.body_offset_lines, 0);
        assert_eq!(wrapped.body_offset_columns, 0);
        assert_eq!(
            wrapped.locate(Position::new(1, 3)),
            Region::Body(Position::new(1, 3))
        );
    }

    #[test]
    fn test_single_line_prologue_shifts_columns() {
        let wrapped = wrap("fn(1)", "(function(fn){", "})");
        assert_eq!(wrapped.final_text, "(function(fn){fn(1)})");
        assert_eq!(wrapped.body_offset_lines, 0);
        assert_eq!(wrapped.body_offset_columns, 14);

        assert_eq!(wrapped.locate(Position::new(1, 14)), Region::Prologue);
        assert_eq!(
            wrapped.locate(Position::new(1, 15)),
            Region::Body(Position::new(1, 1))
        );
        assert_eq!(
            wrapped.locate(Position::new(1, 19)),
            Region::Body(Position::new(1, 5))
        );
        assert_eq!(wrapped.locate(Position::new(1, 20)), Region::Epilogue);
    }

    #[test]
    fn test_multi_line_prologue_shifts_lines() {
        let wrapped = wrap("a;\nb;", "// header\nvar x = ", "\n// footer");
        assert_eq!(wrapped.body_offset_lines, 1);
        assert_eq!(wrapped.body_offset_columns, 8);
        assert_eq!(
            wrapped.locate(Position::new(2, 9)),
            Region::Body(Position::new(1, 1))
        );
        // Only the first body line is shifted horizontally
        assert_eq!(
            wrapped.locate(Position::new(3, 2)),
            Region::Body(Position::new(2, 2))
        );
        assert_eq!(wrapped.locate(Position::new(4, 1)), Region::Epilogue);
        assert_eq!(wrapped.locate(Position::new(1, 3)), Region::Prologue);
    }

    #[test]
    fn test_end_of_input_without_epilogue_is_body() {
        let wrapped = wrap("foo(", "x = ", "");
        assert_eq!(
            wrapped.locate(Position::new(1, 9)),
            Region::Body(Position::new(1, 5))
        );
    }

    #[test]
    fn test_end_of_final_text() {
        assert_eq!(wrap("", "", "").end(), Position::new(1, 1));
        assert_eq!(wrap("a;\nbc", "", "").end(), Position::new(2, 3));

        let wrapped = wrap("x", "(function(){\n", "\n})");
        assert_eq!(wrapped.end(), Position::new(3, 3));
        assert_eq!(wrapped.locate(wrapped.end()), Region::Epilogue);
    }

    #[test]
    fn test_columns_count_chars_not_bytes() {
        let wrapped = wrap("x", "'é';", "");
        assert_eq!(wrapped.body_offset_columns, 4);
    }

    proptest! {
        #[test]
        fn prop_wrap_is_plain_concatenation(body in ".*", prologue in ".*", epilogue in ".*") {
            let wrapped = wrap(body.clone(), &prologue, &epilogue);
            prop_assert_eq!(wrapped.final_text, format!("{prologue}{body}{epilogue}"));
        }

        #[test]
        fn prop_body_start_maps_to_origin(body in "[a-z;\n]{1,40}", prologue in "[a-z(){\n]{0,20}") {
            let wrapped = wrap(body, &prologue, "})");
            prop_assert_eq!(
                wrapped.locate(wrapped.body_start()),
                Region::Body(Position::new(1, 1))
            );
        }
    }
}
