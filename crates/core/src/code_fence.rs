//! Line-level code fence tracking.
//!
//! The directive scanner works on raw lines before markdown-rs sees them, so
//! it has to know which lines belong to a fenced code block: a `:::` line
//! inside a fence is code, not a directive.

/// Fence tracking state carried from one line to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FenceState {
    /// Marker of the open fence (`` ` `` or `~`), `None` outside a fence.
    pub marker: Option<char>,
    /// Length of the opening marker run.
    pub length: usize,
}

impl FenceState {
    /// True while a fence is open.
    pub fn is_open(&self) -> bool {
        self.marker.is_some()
    }
}

/// Result of feeding one line to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenceStep {
    /// State to carry into the next line.
    pub next_state: FenceState,
    /// The line is part of a fence (opener, content or closer).
    pub in_code: bool,
}

/// Advances fence state over a single line.
pub fn advance_fence_state(line: &str, state: FenceState) -> FenceStep {
    let (visual_indent, byte_offset) = leading_whitespace_info(line);
    let after_indent = &line[byte_offset..];

    match state.marker {
        None => {
            // An opener may be indented by at most three columns.
            if visual_indent <= 3
                && let Some((marker, length)) = fence_run(after_indent)
            {
                return FenceStep {
                    next_state: FenceState {
                        marker: Some(marker),
                        length,
                    },
                    in_code: true,
                };
            }
            FenceStep {
                next_state: state,
                in_code: false,
            }
        }
        Some(open_marker) => {
            let closes = visual_indent <= 3
                && is_bare_fence(after_indent)
                && matches!(fence_run(after_indent), Some((marker, len)) if marker == open_marker && len >= state.length);
            FenceStep {
                next_state: if closes { FenceState::default() } else { state },
                in_code: true,
            }
        }
    }
}

/// True when the line is an indented code line (four columns or a tab).
pub fn is_indented_code(line: &str) -> bool {
    let (visual_indent, byte_offset) = leading_whitespace_info(line);
    visual_indent >= 4 && byte_offset < line.len()
}

/// Returns (visual columns, byte offset) of the leading whitespace.
/// Tabs advance to the next multiple of four columns.
fn leading_whitespace_info(line: &str) -> (usize, usize) {
    let mut col = 0;
    let mut bytes = 0;
    for b in line.bytes() {
        match b {
            b' ' => col += 1,
            b'\t' => col += 4 - (col % 4),
            _ => break,
        }
        bytes += 1;
    }
    (col, bytes)
}

fn fence_run(after_indent: &str) -> Option<(char, usize)> {
    let first = after_indent.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }
    let run = after_indent.chars().take_while(|c| *c == first).count();
    (run >= 3).then_some((first, run))
}

/// A closing fence carries no info string.
fn is_bare_fence(after_indent: &str) -> bool {
    let Some(first) = after_indent.chars().next() else {
        return false;
    };
    after_indent
        .trim_start_matches(first)
        .chars()
        .all(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(lines: &[&str]) -> Vec<bool> {
        let mut state = FenceState::default();
        lines
            .iter()
            .map(|line| {
                let step = advance_fence_state(line, state);
                state = step.next_state;
                step.in_code
            })
            .collect()
    }

    #[test]
    fn directive_lines_inside_fence_are_code() {
        let flags = feed(&["before", "```md", ":::r2b_note", ":::", "```", ":::r2b_note"]);
        assert_eq!(flags, [false, true, true, true, true, false]);
    }

    #[test]
    fn closer_needs_same_marker_and_length() {
        let flags = feed(&["````", "```", "~~~~", "````", "after"]);
        assert_eq!(flags, [true, true, true, true, false]);
    }

    #[test]
    fn info_string_does_not_close() {
        let flags = feed(&["```", "```latex", "```", "x"]);
        assert_eq!(flags, [true, true, true, false]);
    }

    #[test]
    fn deep_indent_does_not_open() {
        assert_eq!(feed(&["    ```", "text"]), [false, false]);
        assert_eq!(feed(&["\t```", "text"]), [false, false]);
        assert_eq!(feed(&["   ```", "text", "  ```", "x"]), [true, true, true, false]);
    }

    #[test]
    fn indented_code_detection() {
        assert!(is_indented_code("    :::r2b_note"));
        assert!(is_indented_code("\tcode"));
        assert!(!is_indented_code("   :::r2b_note"));
        assert!(!is_indented_code("    "));
    }
}
