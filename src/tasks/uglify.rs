//! Script concatenation and minification.
//!
//! The minifier is conservative: it removes comments (keeping `/*!` license
//! blocks), indentation, trailing whitespace and blank lines, and collapses
//! runs of spaces. Line breaks are kept so automatic semicolon insertion
//! still sees the same statements. String, template and regex literals pass
//! through untouched.

use std::fs;

use crate::build::BuildContext;
use crate::task::{TaskError, TaskLog, TransformError};

/// Keywords after which a `/` starts a regex literal rather than a division.
const REGEX_KEYWORDS: &[&str] = &[
    "await",
    "case",
    "delete",
    "do",
    "else",
    "in",
    "instanceof",
    "new",
    "of",
    "return",
    "throw",
    "typeof",
    "void",
    "yield",
];

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn copy_quoted(chars: &[char], start: usize, out: &mut String) -> usize {
    let quote = chars[start];
    out.push(quote);
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        if c == '\\' {
            if let Some(&next) = chars.get(i + 1) {
                out.push(next);
            }
            i += 2;
            continue;
        }
        i += 1;
        if c == quote {
            break;
        }
    }
    i
}

fn copy_regex(chars: &[char], start: usize, out: &mut String) -> usize {
    out.push('/');
    let mut i = start + 1;
    let mut in_class = false;
    while i < chars.len() {
        let c = chars[i];
        if c == '\n' {
            break;
        }
        out.push(c);
        i += 1;
        match c {
            '\\' => {
                if let Some(&next) = chars.get(i) {
                    out.push(next);
                    i += 1;
                }
            }
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => break,
            _ => {}
        }
    }
    i
}

fn end_line(out: &mut String) {
    let trimmed = out.trim_end_matches([' ', '\t']).len();
    out.truncate(trimmed);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

/// Minify a script.
pub fn minify_script(source: &str) -> String {
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len());
    // Whether a `/` here would start a regex literal, decided by the
    // previous token: operands (names, numbers, literals, `)`, `]`, `++`,
    // `--`) are followed by division, operators and keywords by a regex.
    let mut regex_allowed = true;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            '\'' | '"' | '`' => {
                i = copy_quoted(&chars, i, &mut out);
                regex_allowed = false;
            }
            '/' if next == Some('/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if next == Some('*') => {
                let body_start = i + 2;
                let mut end = body_start;
                while end + 1 < chars.len() && !(chars[end] == '*' && chars[end + 1] == '/') {
                    end += 1;
                }
                let close = (end + 2).min(chars.len());
                if chars.get(body_start) == Some(&'!') {
                    out.extend(&chars[i..close]);
                    end_line(&mut out);
                } else if chars[i..close].contains(&'\n') {
                    end_line(&mut out);
                }
                i = close;
            }
            '/' if regex_allowed => {
                i = copy_regex(&chars, i, &mut out);
                regex_allowed = false;
            }
            '\n' => {
                end_line(&mut out);
                i += 1;
            }
            ' ' | '\t' | '\r' => {
                if !(out.is_empty() || out.ends_with(['\n', ' '])) {
                    out.push(' ');
                }
                i += 1;
            }
            c if is_word_char(c) => {
                let start = i;
                while i < chars.len() && is_word_char(chars[i]) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                regex_allowed = !c.is_ascii_digit() && REGEX_KEYWORDS.contains(&word.as_str());
                out.push_str(&word);
            }
            '+' | '-' if next == Some(c) => {
                out.push(c);
                out.push(c);
                regex_allowed = false;
                i += 2;
            }
            _ => {
                out.push(c);
                regex_allowed = !matches!(c, ')' | ']');
                i += 1;
            }
        }
    }

    end_line(&mut out);
    out
}

fn kib(bytes: usize) -> String {
    format!("{:.1} KiB", bytes as f64 / 1024.0)
}

/// Concatenate the configured sources and write the minified bundle.
pub fn uglify(ctx: &mut BuildContext, log: &TaskLog<'_>) -> Result<(), TaskError> {
    let scripts = &ctx.config().scripts;

    let mut bundle = String::new();
    for source in &scripts.sources {
        let path = ctx.resolve_path(source);
        if !path.is_file() {
            return Err(TransformError::MissingSource(source.clone()).into());
        }
        let code = fs::read_to_string(&path).map_err(|e| TaskError::io(&path, e))?;
        bundle.push_str(&code);
        if !bundle.ends_with('\n') {
            bundle.push('\n');
        }
    }

    let minified = minify_script(&bundle);
    let output = ctx.out_dir().join(&scripts.output);
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(|e| TaskError::io(parent, e))?;
    }
    fs::write(&output, &minified).map_err(|e| TaskError::io(&output, e))?;

    log.info(format!(
        "{}: {} -> {}",
        ctx.display_path(&output),
        kib(bundle.len()),
        kib(minified.len())
    ));
    Ok(())
}
