//! Build mode selection.
//!
//! The mode is part of the [`BuildContext`](crate::build::BuildContext) handed
//! to every task. It starts from the `--env=<value>` command-line flag and can
//! be overwritten by the `env-production` task before later tasks read it.

use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;

/// Development or production build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Unminified output into the scratch directory
    #[default]
    Development,
    /// Minified output into the distribution directory
    Production,
}

impl Mode {
    /// Lowercase name used in logs and templates.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Development => "development",
            Mode::Production => "production",
        }
    }

    /// Whether this is a production build.
    pub fn is_production(&self) -> bool {
        matches!(self, Mode::Production)
    }

    /// Parse a single `--env=<value>` argument.
    ///
    /// Returns `None` for every argument that is not of that exact shape, for
    /// values that are not purely alphabetic (`--env=`, `--env=123`), and for
    /// alphabetic values that do not name a mode.
    pub fn from_flag(arg: &str) -> Option<Mode> {
        let caps = env_flag_pattern().captures(arg)?;
        caps.get(1)?.as_str().parse().ok()
    }

    /// Resolve the mode from a full argument list.
    ///
    /// The last valid `--env=` flag wins; when none is valid the prior mode
    /// is kept.
    pub fn from_args<I, S>(args: I, prior: Mode) -> Mode
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        args.into_iter().filter_map(|arg| Mode::from_flag(arg.as_ref())).last().unwrap_or(prior)
    }
}

fn env_flag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^--env=([A-Za-z]+)$").expect("static pattern is valid"))
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Mode::Development),
            "production" | "prod" => Ok(Mode::Production),
            other => Err(format!("unknown mode '{}'", other)),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
