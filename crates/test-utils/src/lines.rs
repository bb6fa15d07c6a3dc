use std::io;
use std::path::Path;

use proptest::prelude::*;

/// One line of printable noise, 19 to 28 characters.
pub fn line_strategy() -> impl Strategy<Value = String> {
    "[abcdef 0123456789_!?-]{19,28}"
}

/// Three to five lines of noise.
pub fn lines_strategy() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(line_strategy(), 3..6)
}

/// Overwrite `path` with `lines`, newline-terminated.
pub fn write_lines(path: &Path, lines: &[String]) -> io::Result<()> {
    let mut contents = lines.join("\n");
    contents.push('\n');
    std::fs::write(path, contents)
}

/// Fixed, recognisable content.
pub fn numbered_lines(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{prefix} line {i}")).collect()
}
