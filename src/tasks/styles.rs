//! Stylesheet compilation and vendor prefixing.
//!
//! `sass` concatenates the mode's source list into the scratch directory,
//! flattening nested rules. `autoprefixer` reads that bundle, adds the vendor
//! prefixes the supported browsers need and writes it to the output
//! directory, minified in production.

use lightningcss::error::Error as CssError;
use lightningcss::stylesheet::{MinifyOptions, ParserFlags, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use crate::build::BuildContext;
use crate::task::{TaskError, TaskLog, TransformError};

/// Encode a browser version the way lightningcss expects (`major << 16`).
const fn version(major: u32, minor: u32) -> Option<u32> {
    Some((major << 16) | (minor << 8))
}

/// Browsers the stylesheets are compiled and prefixed for.
pub fn browser_targets() -> Targets {
    Targets::from(Browsers {
        android: version(4, 4),
        chrome: version(80, 0),
        edge: version(80, 0),
        firefox: version(72, 0),
        ie: None,
        ios_saf: version(12, 0),
        opera: version(67, 0),
        safari: version(12, 0),
        samsung: version(10, 0),
    })
}

fn style_error<T: Display>(file: &Path, err: CssError<T>) -> TransformError {
    let (line, column) = err.loc.as_ref().map(|loc| (loc.line + 1, loc.column)).unwrap_or((0, 0));
    TransformError::Style { file: file.to_path_buf(), line, column, message: err.kind.to_string() }
}

/// Compile one stylesheet, lowering nested rules for the supported browsers.
pub fn compile_css(file: &Path, code: &str) -> Result<String, TransformError> {
    let options = ParserOptions {
        filename: file.display().to_string(),
        flags: ParserFlags::NESTING,
        ..ParserOptions::default()
    };
    let sheet = StyleSheet::parse(code, options).map_err(|e| style_error(file, e))?;
    let printed = sheet
        .to_css(PrinterOptions { targets: browser_targets(), ..PrinterOptions::default() })
        .map_err(|e| style_error(file, e))?;
    Ok(printed.code)
}

/// Add vendor prefixes, minifying when `minify` is set.
pub fn prefix_css(file: &Path, code: &str, minify: bool) -> Result<String, TransformError> {
    let options = ParserOptions { filename: file.display().to_string(), ..ParserOptions::default() };
    let mut sheet = StyleSheet::parse(code, options).map_err(|e| style_error(file, e))?;
    sheet
        .minify(MinifyOptions { targets: browser_targets(), ..MinifyOptions::default() })
        .map_err(|e| style_error(file, e))?;
    let printed = sheet
        .to_css(PrinterOptions { minify, targets: browser_targets(), ..PrinterOptions::default() })
        .map_err(|e| style_error(file, e))?;
    Ok(printed.code)
}

fn write_output(path: &Path, code: &str) -> Result<(), TaskError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| TaskError::io(parent, e))?;
    }
    fs::write(path, code).map_err(|e| TaskError::io(path, e))
}

fn bundle_path(ctx: &BuildContext) -> PathBuf {
    ctx.tmp_dir().join(&ctx.config().styles.output)
}

/// Concatenate and compile the stylesheet sources for the current mode.
pub fn sass(ctx: &mut BuildContext, log: &TaskLog<'_>) -> Result<(), TaskError> {
    let styles = &ctx.config().styles;
    let sources = if ctx.mode().is_production() { &styles.production } else { &styles.development };

    let mut bundle = String::new();
    for source in sources {
        let path = ctx.resolve_path(source);
        if !path.is_file() {
            return Err(TransformError::MissingSource(source.clone()).into());
        }
        let code = fs::read_to_string(&path).map_err(|e| TaskError::io(&path, e))?;
        let compiled = compile_css(source, &code)?;
        bundle.push_str(&compiled);
        if !bundle.ends_with('\n') {
            bundle.push('\n');
        }
    }

    let output = bundle_path(ctx);
    write_output(&output, &bundle)?;
    if log.is_verbose() {
        log.info(format!("compiled {} sources ({})", sources.len(), ctx.mode()));
    }
    Ok(())
}

/// Prefix the compiled bundle and write it to the output directory.
pub fn autoprefixer(ctx: &mut BuildContext, log: &TaskLog<'_>) -> Result<(), TaskError> {
    let input = bundle_path(ctx);
    if !input.is_file() {
        return Err(TransformError::MissingSource(input).into());
    }
    let code = fs::read_to_string(&input).map_err(|e| TaskError::io(&input, e))?;
    let prefixed = prefix_css(&ctx.config().styles.output, &code, ctx.mode().is_production())?;

    let output = ctx.out_dir().join(&ctx.config().styles.output);
    write_output(&output, &prefixed)?;
    log.info(format!("wrote {}", ctx.display_path(&output)));
    Ok(())
}
