//! Lexical analysis for the shell's command lines.
//!
//! A line is split into words on runs of delimiter characters. There is no
//! quoting, escaping or substitution: every non-delimiter character belongs to
//! the word it appears in.

/// Characters that separate words: space, tab, carriage return, newline and bell.
pub const DELIMITERS: [char; 5] = [' ', '\t', '\r', '\n', '\x07'];

/// Splits `line` into its argument vector.
///
/// Consecutive delimiters collapse, so no empty word is ever produced. A line
/// made only of delimiters (or an empty line) yields an empty vector.
///
/// # Arguments
/// * `line` - The raw input line as returned by the line reader.
pub fn tokenize(line: &str) -> Vec<String> {
    line.split(is_delimiter)
        .filter(|word| !word.is_empty())
        .map(str::to_owned)
        .collect()
}

fn is_delimiter(c: char) -> bool {
    DELIMITERS.contains(&c)
}
