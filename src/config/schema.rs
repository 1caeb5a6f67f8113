//! Configuration schema types for `themekit.toml`
//!
//! Defines the structure and validation rules for a theme project. Every
//! section is optional; the defaults describe the stock theme layout.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::watch::WatchEvent;

/// Project metadata and top-level directories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name, available to templates
    #[serde(default = "default_name")]
    pub name: String,
    /// Project version, available to templates
    #[serde(default = "default_version")]
    pub version: String,
    /// Short description, available to templates
    #[serde(default)]
    pub description: String,
    /// Source tree
    #[serde(default = "default_src")]
    pub src: PathBuf,
    /// Distribution output directory
    #[serde(default = "default_dist")]
    pub dist: PathBuf,
    /// Scratch output directory for development builds
    #[serde(default = "default_tmp")]
    pub tmp: PathBuf,
}

fn default_name() -> String {
    "theme".to_string()
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_src() -> PathBuf {
    PathBuf::from("src")
}

fn default_dist() -> PathBuf {
    PathBuf::from("dist")
}

fn default_tmp() -> PathBuf {
    PathBuf::from(".tmp")
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            version: default_version(),
            description: String::new(),
            src: default_src(),
            dist: default_dist(),
            tmp: default_tmp(),
        }
    }
}

/// Directories removed by the `clean` task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanConfig {
    #[serde(default = "default_clean_targets")]
    pub targets: Vec<PathBuf>,
}

fn default_clean_targets() -> Vec<PathBuf> {
    vec![PathBuf::from(".tmp"), PathBuf::from("dist")]
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self { targets: default_clean_targets() }
    }
}

/// Static asset copy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyConfig {
    /// Directory that matched paths are made relative to
    #[serde(default = "default_src")]
    pub base: PathBuf,
    /// Glob patterns, `{a,b}` alternatives allowed
    #[serde(default = "default_copy_patterns")]
    pub patterns: Vec<String>,
}

fn default_copy_patterns() -> Vec<String> {
    vec![
        "src/*.{php,png,css}".to_string(),
        "src/modules/*.php".to_string(),
        "src/img/**/*.{jpg,png,svg,gif,webp,ico}".to_string(),
        "src/fonts/*.{woff,woff2,ttf,otf,eot,svg}".to_string(),
        "src/languages/*.{po,mo,pot}".to_string(),
    ]
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self { base: default_src(), patterns: default_copy_patterns() }
    }
}

/// Stylesheet sources per mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StylesConfig {
    /// Sources concatenated in development mode
    #[serde(default = "default_css_dev")]
    pub development: Vec<PathBuf>,
    /// Sources concatenated in production mode
    #[serde(default = "default_css_prod")]
    pub production: Vec<PathBuf>,
    /// Output path relative to the output directory
    #[serde(default = "default_css_output")]
    pub output: PathBuf,
}

fn default_css_dev() -> Vec<PathBuf> {
    vec![PathBuf::from("src/css/banner.css"), PathBuf::from("src/css/style.css")]
}

fn default_css_prod() -> Vec<PathBuf> {
    vec![
        PathBuf::from("src/css/banner.css"),
        PathBuf::from("node_modules/normalize.css/normalize.css"),
        PathBuf::from("src/css/style.css"),
    ]
}

fn default_css_output() -> PathBuf {
    PathBuf::from("css/style.css")
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            development: default_css_dev(),
            production: default_css_prod(),
            output: default_css_output(),
        }
    }
}

/// Script bundle and lint sources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptsConfig {
    /// Sources concatenated into the bundle, in order
    #[serde(default = "default_js_sources")]
    pub sources: Vec<PathBuf>,
    /// Files checked by the lint task
    #[serde(default = "default_js_lint")]
    pub lint: Vec<PathBuf>,
    /// Bundle path relative to the distribution directory
    #[serde(default = "default_js_output")]
    pub output: PathBuf,
}

fn default_js_sources() -> Vec<PathBuf> {
    vec![
        PathBuf::from("src/js/lib/modernizr.js"),
        PathBuf::from("src/js/lib/conditionizr-4.3.0.min.js"),
        PathBuf::from("node_modules/jquery/dist/jquery.js"),
        PathBuf::from("src/js/scripts.js"),
    ]
}

fn default_js_lint() -> Vec<PathBuf> {
    vec![PathBuf::from("src/js/scripts.js")]
}

fn default_js_output() -> PathBuf {
    PathBuf::from("js/scripts.min.js")
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self { sources: default_js_sources(), lint: default_js_lint(), output: default_js_output() }
    }
}

/// Script lint rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintConfig {
    /// Maximum line length, 0 disables the check
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
    /// Require `===` and `!==`
    #[serde(default = "default_true")]
    pub eqeqeq: bool,
    /// Reject `debugger` statements
    #[serde(default = "default_true")]
    pub no_debugger: bool,
    /// Reject trailing whitespace
    #[serde(default = "default_true")]
    pub trailing_whitespace: bool,
}

fn default_max_line_length() -> usize {
    120
}

fn default_true() -> bool {
    true
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            max_line_length: default_max_line_length(),
            eqeqeq: true,
            no_debugger: true,
            trailing_whitespace: true,
        }
    }
}

/// One template rendered by the `template` task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateFile {
    pub source: PathBuf,
    pub output: PathBuf,
}

/// Derived file generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    #[serde(default = "default_template_files")]
    pub files: Vec<TemplateFile>,
    /// Extra `{{ key }}` substitutions
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
}

fn default_template_files() -> Vec<TemplateFile> {
    vec![TemplateFile {
        source: PathBuf::from("src/templates/banner.css.tpl"),
        output: PathBuf::from("src/css/banner.css"),
    }]
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self { files: default_template_files(), vars: BTreeMap::new() }
    }
}

/// Feature-detection script generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModernizrConfig {
    #[serde(default = "default_modernizr_output")]
    pub output: PathBuf,
    /// Detect names to include; empty includes all built-in detects
    #[serde(default)]
    pub features: Vec<String>,
}

fn default_modernizr_output() -> PathBuf {
    PathBuf::from("src/js/lib/modernizr.js")
}

impl Default for ModernizrConfig {
    fn default() -> Self {
        Self { output: default_modernizr_output(), features: vec![] }
    }
}

/// A vendored file copied from the dependency tree into the source tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorFile {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Vendored dependencies synchronised before watching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorConfig {
    #[serde(default = "default_vendor_jquery")]
    pub jquery: VendorFile,
    #[serde(default = "default_vendor_normalize")]
    pub normalize: VendorFile,
}

fn default_vendor_jquery() -> VendorFile {
    VendorFile {
        from: PathBuf::from("node_modules/jquery/dist/jquery.js"),
        to: PathBuf::from("src/js/lib/jquery.js"),
    }
}

fn default_vendor_normalize() -> VendorFile {
    VendorFile {
        from: PathBuf::from("node_modules/normalize.css/normalize.css"),
        to: PathBuf::from("src/css/lib/normalize.css"),
    }
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self { jquery: default_vendor_jquery(), normalize: default_vendor_normalize() }
    }
}

/// A glob-to-entrypoint binding active in watch mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchBindingConfig {
    /// Glob patterns relative to the project root
    pub patterns: Vec<String>,
    /// Events that trigger the target; empty means all
    #[serde(default)]
    pub events: Vec<WatchEvent>,
    /// Entrypoint name to run
    pub target: String,
}

/// Watch mode configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Debounce delay in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u32,
    #[serde(default = "default_watch_bindings")]
    pub bindings: Vec<WatchBindingConfig>,
}

fn default_debounce_ms() -> u32 {
    100
}

fn default_watch_bindings() -> Vec<WatchBindingConfig> {
    vec![
        WatchBindingConfig {
            patterns: vec!["src/templates/*.tpl".to_string()],
            events: vec![],
            target: "template".to_string(),
        },
        WatchBindingConfig {
            patterns: vec!["src/css/**/*.css".to_string()],
            events: vec![],
            target: "styles".to_string(),
        },
        WatchBindingConfig {
            patterns: vec!["src/js/*.js".to_string()],
            events: vec![WatchEvent::Add, WatchEvent::Change],
            target: "jshint".to_string(),
        },
    ]
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: default_debounce_ms(), bindings: default_watch_bindings() }
    }
}

/// Complete themekit.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub clean: CleanConfig,
    #[serde(default)]
    pub copy: CopyConfig,
    #[serde(default)]
    pub styles: StylesConfig,
    #[serde(default)]
    pub scripts: ScriptsConfig,
    #[serde(default)]
    pub lint: LintConfig,
    #[serde(default)]
    pub template: TemplateConfig,
    #[serde(default)]
    pub modernizr: ModernizrConfig,
    #[serde(default)]
    pub vendor: VendorConfig,
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "watch.bindings[0].target")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "themekit.toml: '{}' {}", self.field, self.message)
    }
}

impl ThemeConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        for (i, target) in self.clean.targets.iter().enumerate() {
            if target.as_os_str().is_empty() {
                errors.push(ConfigValidationError {
                    field: format!("clean.targets[{}]", i),
                    message: "must be a non-empty path".to_string(),
                });
            }
        }

        if self.styles.output.as_os_str().is_empty() {
            errors.push(ConfigValidationError {
                field: "styles.output".to_string(),
                message: "must be a non-empty path".to_string(),
            });
        }

        if self.scripts.output.as_os_str().is_empty() {
            errors.push(ConfigValidationError {
                field: "scripts.output".to_string(),
                message: "must be a non-empty path".to_string(),
            });
        }

        for (i, binding) in self.watch.bindings.iter().enumerate() {
            if binding.patterns.is_empty() {
                errors.push(ConfigValidationError {
                    field: format!("watch.bindings[{}].patterns", i),
                    message: "must contain at least one glob pattern".to_string(),
                });
            }
            for pattern in &binding.patterns {
                if let Err(e) = crate::build::compile_patterns(pattern) {
                    errors.push(ConfigValidationError {
                        field: format!("watch.bindings[{}].patterns", i),
                        message: e.to_string(),
                    });
                }
            }
            match binding.target.parse::<crate::entrypoint::Entrypoint>() {
                Ok(entry) if entry.is_resident() => errors.push(ConfigValidationError {
                    field: format!("watch.bindings[{}].target", i),
                    message: format!("'{}' never returns and cannot be a watch target", entry),
                }),
                Ok(_) => {}
                Err(e) => errors.push(ConfigValidationError {
                    field: format!("watch.bindings[{}].target", i),
                    message: e,
                }),
            }
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}
