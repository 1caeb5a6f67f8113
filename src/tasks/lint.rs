//! Script linting.
//!
//! A line-based checker for the handful of rules the theme enforces, with a
//! grouped console reporter in the style of the usual "stylish" formatter.

use regex::Regex;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use crate::build::BuildContext;
use crate::config::LintConfig;
use crate::task::{TaskError, TaskLog, TransformError};

/// A single lint finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintProblem {
    /// 1-based line
    pub line: usize,
    /// 1-based column
    pub column: usize,
    /// Rule identifier
    pub rule: &'static str,
    pub message: String,
}

fn string_literal() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#""(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'"#).expect("static pattern is valid")
    })
}

fn loose_equality() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(^|[^=!<>])(==|!=)($|[^=])").expect("static pattern is valid"))
}

fn debugger_statement() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\bdebugger\b").expect("static pattern is valid"))
}

/// Blank out string literals and trailing `//` comments so rules only see code.
///
/// Column positions are preserved.
fn code_only(line: &str) -> String {
    let blanked = string_literal().replace_all(line, |caps: &regex::Captures<'_>| {
        let quote = &caps[0][..1];
        format!("{}{}{}", quote, " ".repeat(caps[0].len() - 2), quote)
    });
    match blanked.find("//") {
        Some(pos) => blanked[..pos].to_string(),
        None => blanked.into_owned(),
    }
}

/// Check one script and return its problems in line order.
pub fn lint_source(source: &str, rules: &LintConfig) -> Vec<LintProblem> {
    let mut problems = Vec::new();
    let mut in_block_comment = false;

    for (index, line) in source.lines().enumerate() {
        let number = index + 1;

        if rules.trailing_whitespace && line.ends_with([' ', '\t']) {
            problems.push(LintProblem {
                line: number,
                column: line.trim_end().chars().count() + 1,
                rule: "trailing-whitespace",
                message: "Trailing whitespace.".to_string(),
            });
        }

        let length = line.chars().count();
        if rules.max_line_length > 0 && length > rules.max_line_length {
            problems.push(LintProblem {
                line: number,
                column: rules.max_line_length + 1,
                rule: "max-len",
                message: format!("Line is too long ({} > {}).", length, rules.max_line_length),
            });
        }

        let trimmed = line.trim_start();
        if in_block_comment {
            if line.contains("*/") {
                in_block_comment = false;
            }
            continue;
        }
        if trimmed.starts_with("/*") {
            in_block_comment = !trimmed.contains("*/");
            continue;
        }

        let code = code_only(line);
        if rules.eqeqeq {
            for caps in loose_equality().captures_iter(&code) {
                if let Some(op) = caps.get(2) {
                    let expected = if op.as_str() == "==" { "===" } else { "!==" };
                    problems.push(LintProblem {
                        line: number,
                        column: code[..op.start()].chars().count() + 1,
                        rule: "eqeqeq",
                        message: format!("Expected '{}' and instead saw '{}'.", expected, op.as_str()),
                    });
                }
            }
        }
        if rules.no_debugger {
            if let Some(found) = debugger_statement().find(&code) {
                problems.push(LintProblem {
                    line: number,
                    column: code[..found.start()].chars().count() + 1,
                    rule: "no-debugger",
                    message: "Forgotten 'debugger' statement?".to_string(),
                });
            }
        }
    }

    problems.sort_by_key(|p| (p.line, p.column));
    problems
}

/// Writes lint problems grouped by file.
pub struct LintReporter {
    output: Mutex<Box<dyn Write + Send>>,
}

impl Default for LintReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl LintReporter {
    /// Reporter writing to stderr.
    pub fn new() -> Self {
        Self { output: Mutex::new(Box::new(io::stderr())) }
    }

    /// Reporter writing to a custom writer.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self { output: Mutex::new(Box::new(output)) }
    }

    /// Print every file's problems and a total.
    pub fn report(&self, results: &[(PathBuf, Vec<LintProblem>)]) {
        let Ok(mut out) = self.output.lock() else {
            return;
        };
        let mut total = 0;
        for (file, problems) in results.iter().filter(|(_, p)| !p.is_empty()) {
            let _ = writeln!(out, "{}", file.display());
            for problem in problems {
                let _ = writeln!(
                    out,
                    "  line {:<4} col {:<3} {}  ({})",
                    problem.line, problem.column, problem.message, problem.rule
                );
            }
            let _ = writeln!(out);
            total += problems.len();
        }
        if total > 0 {
            let _ = writeln!(out, "✖ {} problem{}", total, if total == 1 { "" } else { "s" });
        }
        let _ = out.flush();
    }
}

fn lint_files(
    ctx: &BuildContext,
    files: &[PathBuf],
) -> Result<Vec<(PathBuf, Vec<LintProblem>)>, TaskError> {
    files
        .iter()
        .map(|file| {
            let path = ctx.resolve_path(file);
            if !path.is_file() {
                return Err(TransformError::MissingSource(file.clone()).into());
            }
            let source = fs::read_to_string(&path).map_err(|e| TaskError::io(&path, e))?;
            Ok((file.clone(), lint_source(&source, &ctx.config().lint)))
        })
        .collect()
}

/// Lint the configured scripts, failing when any problem is found.
pub fn jshint(ctx: &mut BuildContext, log: &TaskLog<'_>) -> Result<(), TaskError> {
    lint_with(ctx, log, &LintReporter::new())
}

/// Lint the configured scripts, reporting problems to `reporter`.
pub fn lint_with(
    ctx: &BuildContext,
    log: &TaskLog<'_>,
    reporter: &LintReporter,
) -> Result<(), TaskError> {
    let results = lint_files(ctx, &ctx.config().scripts.lint)?;
    let files = results.iter().filter(|(_, p)| !p.is_empty()).count();
    let problems: usize = results.iter().map(|(_, p)| p.len()).sum();

    if problems > 0 {
        reporter.report(&results);
        return Err(TransformError::Lint { files, problems }.into());
    }

    if log.is_verbose() {
        log.info(format!("{} files lint free", results.len()));
    }
    Ok(())
}
