//! Filesystem wildcard expansion for the `glob` builtin.
//!
//! Supports `*`, `?` and bracket expressions (`[abc]`, `[a-z]`, `[!a]`,
//! `[^a]`, `[[:digit:]]`). A backslash makes the following character literal.
//! Each path component is compiled to an anchored regular expression and
//! matched against the raw bytes of directory entries, so a wildcard never
//! crosses a `/` and names that are not UTF-8 are still found.

use anyhow::{Context, Result};
use regex::bytes::Regex;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::os::unix::ffi::OsStrExt;

/// Character classes accepted inside a bracket expression as `[:name:]`.
const POSIX_CLASSES: [&str; 12] = [
    "alnum", "alpha", "blank", "cntrl", "digit", "graph", "lower", "print", "punct", "space",
    "upper", "xdigit",
];

/// Expands `pattern` into the sorted list of existing paths it matches.
///
/// Directories are reported with a trailing `/`. A pattern that matches
/// nothing yields an empty list, not an error. Paths are sorted bytewise.
pub fn expand(pattern: &str) -> Result<Vec<OsString>> {
    if pattern.is_empty() {
        return Ok(Vec::new());
    }

    let dirs_only = pattern.ends_with('/');
    let components: Vec<&str> = pattern.split('/').filter(|c| !c.is_empty()).collect();

    let root = if pattern.starts_with('/') { "/" } else { "" };
    let mut candidates = vec![OsString::from(root)];

    for (i, component) in components.iter().enumerate() {
        let last = i + 1 == components.len();
        let must_be_dir = !last || dirs_only;

        let mut next = Vec::new();
        match ComponentMatcher::compile(component)? {
            ComponentMatcher::Literal(name) => {
                for base in &candidates {
                    next.push(join(base, OsStr::new(&name)));
                }
            }
            ComponentMatcher::Wildcard { regex, allow_hidden } => {
                for base in &candidates {
                    for name in entry_names(base, allow_hidden) {
                        let bytes = name.as_bytes();
                        if bytes.first() == Some(&b'.') && !allow_hidden {
                            continue;
                        }
                        if !regex.is_match(bytes) {
                            continue;
                        }
                        let path = join(base, &name);
                        if !must_be_dir || is_dir(&path) {
                            next.push(path);
                        }
                    }
                }
            }
        }

        candidates = next;
        if candidates.is_empty() {
            break;
        }
    }

    let mut matches: Vec<OsString> = candidates
        .into_iter()
        .filter(|path| fs::symlink_metadata(path).is_ok())
        .filter(|path| !dirs_only || is_dir(path))
        .map(mark_dir)
        .collect();
    matches.sort();
    Ok(matches)
}

enum ComponentMatcher {
    Literal(String),
    Wildcard { regex: Regex, allow_hidden: bool },
}

impl ComponentMatcher {
    fn compile(component: &str) -> Result<Self> {
        let translated = translate(component);
        if !translated.magic {
            return Ok(ComponentMatcher::Literal(translated.literal));
        }
        let regex = Regex::new(&translated.regex)
            .with_context(|| format!("invalid pattern `{}`", component))?;
        Ok(ComponentMatcher::Wildcard {
            regex,
            allow_hidden: component.starts_with('.'),
        })
    }
}

struct Translated {
    regex: String,
    /// The component with escapes removed, meaningful when `magic` is false.
    literal: String,
    magic: bool,
}

fn translate(component: &str) -> Translated {
    let chars: Vec<char> = component.chars().collect();
    let mut regex = String::from("(?s)^");
    let mut literal = String::new();
    let mut magic = false;

    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => {
                // Any byte, so invalid UTF-8 sequences are matched too.
                regex.push_str("(?-u:.)*");
                magic = true;
            }
            '?' => {
                regex.push_str("(?:.|(?-u:.))");
                magic = true;
            }
            '[' => match bracket_class(&chars[i + 1..]) {
                Some((class, consumed)) => {
                    regex.push_str(&class);
                    magic = true;
                    i += consumed;
                }
                None => {
                    push_literal(&mut regex, '[');
                    literal.push('[');
                }
            },
            '\\' if i + 1 < chars.len() => {
                i += 1;
                push_literal(&mut regex, chars[i]);
                literal.push(chars[i]);
            }
            c => {
                push_literal(&mut regex, c);
                literal.push(c);
            }
        }
        i += 1;
    }
    regex.push('$');

    Translated {
        regex,
        literal,
        magic,
    }
}

/// Translates the bracket expression following a `[`.
///
/// Returns the regex class and the number of characters consumed (closing
/// bracket included), or `None` when the bracket is never closed.
fn bracket_class(rest: &[char]) -> Option<(String, usize)> {
    let mut i = 0;
    let negated = matches!(rest.first(), Some('!') | Some('^'));
    if negated {
        i += 1;
    }

    let mut items = String::new();
    let start = i;
    while i < rest.len() {
        let c = rest[i];
        // A `]` right after the opening bracket is a member, not the end.
        if c == ']' && i > start {
            let class = match (items.is_empty(), negated) {
                (true, false) => r"[^\s\S]".to_string(),
                (true, true) => r"[\s\S]".to_string(),
                (false, false) => format!("[{}]", items),
                (false, true) => format!("[^{}]", items),
            };
            return Some((class, i + 1));
        }
        if c == '[' {
            if let Some((name, consumed)) = posix_class(&rest[i + 1..]) {
                items.push_str(&format!("[:{}:]", name));
                i += 1 + consumed;
                continue;
            }
        }
        if i + 2 < rest.len() && rest[i + 1] == '-' && rest[i + 2] != ']' {
            let (lo, hi) = (c, rest[i + 2]);
            // Reversed ranges match nothing.
            if lo <= hi {
                push_class_member(&mut items, lo);
                items.push('-');
                push_class_member(&mut items, hi);
            }
            i += 3;
            continue;
        }
        push_class_member(&mut items, c);
        i += 1;
    }
    None
}

/// Recognizes `:name:]` after a `[` inside a bracket expression.
///
/// Returns the class name and the characters consumed. Unknown names are not
/// classes, and their `[` is taken as an ordinary member.
fn posix_class(rest: &[char]) -> Option<(String, usize)> {
    if rest.first() != Some(&':') {
        return None;
    }
    let body: String = rest[1..].iter().collect();
    let end = body.find(":]")?;
    let name = &body[..end];
    if !POSIX_CLASSES.contains(&name) {
        return None;
    }
    Some((name.to_string(), 1 + name.chars().count() + 2))
}

fn push_literal(regex: &mut String, c: char) {
    let mut buf = [0u8; 4];
    regex.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}

fn push_class_member(items: &mut String, c: char) {
    if matches!(c, '\\' | '[' | ']' | '^' | '-' | '&' | '~') {
        items.push('\\');
    }
    items.push(c);
}

/// Names in directory `base`, plus `.` and `..` when the pattern may match them.
fn entry_names(base: &OsStr, with_dot_entries: bool) -> Vec<OsString> {
    let dir = if base.is_empty() { OsStr::new(".") } else { base };
    let mut names: Vec<OsString> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name())
            .collect(),
        Err(_) => return Vec::new(),
    };
    if with_dot_entries {
        names.push(OsString::from("."));
        names.push(OsString::from(".."));
    }
    names
}

fn join(base: &OsStr, name: &OsStr) -> OsString {
    let mut path = base.to_os_string();
    if !base.is_empty() && !base.as_bytes().ends_with(b"/") {
        path.push("/");
    }
    path.push(name);
    path
}

fn is_dir(path: &OsStr) -> bool {
    fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

fn mark_dir(mut path: OsString) -> OsString {
    if !path.as_bytes().ends_with(b"/") && is_dir(&path) {
        path.push("/");
    }
    path
}
