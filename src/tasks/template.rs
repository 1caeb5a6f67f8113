//! Derived file generation from `{{ key }}` templates.

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::fs;
use std::sync::OnceLock;

use crate::build::BuildContext;
use crate::task::{TaskError, TaskLog, TransformError};

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.-]*)\s*\}\}").expect("static pattern is valid")
    })
}

/// Substitute `{{ key }}` placeholders.
///
/// Returns the rendered text and the names of placeholders that had no
/// value. Unknown placeholders are left in place.
pub fn render(text: &str, vars: &BTreeMap<String, String>) -> (String, Vec<String>) {
    let mut unknown = Vec::new();
    let rendered = placeholder().replace_all(text, |caps: &Captures<'_>| match vars.get(&caps[1]) {
        Some(value) => value.clone(),
        None => {
            if !unknown.iter().any(|u: &String| u == &caps[1]) {
                unknown.push(caps[1].to_string());
            }
            caps[0].to_string()
        }
    });
    (rendered.into_owned(), unknown)
}

/// Variables available to templates: project metadata, the current mode and
/// the configured extras, which override the built-ins.
pub fn template_vars(ctx: &BuildContext) -> BTreeMap<String, String> {
    let project = &ctx.config().project;
    let mut vars = BTreeMap::new();
    vars.insert("name".to_string(), project.name.clone());
    vars.insert("version".to_string(), project.version.clone());
    vars.insert("description".to_string(), project.description.clone());
    vars.insert("mode".to_string(), ctx.mode().to_string());
    vars.extend(ctx.config().template.vars.iter().map(|(k, v)| (k.clone(), v.clone())));
    vars
}

/// Render every configured template file.
pub fn template(ctx: &mut BuildContext, log: &TaskLog<'_>) -> Result<(), TaskError> {
    let vars = template_vars(ctx);

    for file in &ctx.config().template.files {
        let source = ctx.resolve_path(&file.source);
        if !source.is_file() {
            return Err(TransformError::MissingSource(file.source.clone()).into());
        }
        let text = fs::read_to_string(&source).map_err(|e| TaskError::io(&source, e))?;
        let (rendered, unknown) = render(&text, &vars);
        for name in unknown {
            log.warn(format!("{}: no value for '{{{{ {} }}}}'", file.source.display(), name));
        }

        let output = ctx.resolve_path(&file.output);
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|e| TaskError::io(parent, e))?;
        }
        fs::write(&output, rendered).map_err(|e| TaskError::io(&output, e))?;
        tracing::debug!(output = %output.display(), "rendered template");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::progress::{NullProgress, ProgressReporter};
    use crate::config::ThemeConfig;
    use crate::mode::Mode;
    use crate::task::Task;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_render_substitutes_with_optional_spacing() {
        let (out, unknown) =
            render("/*! {{name}} v{{ version }} */", &vars(&[("name", "blank"), ("version", "1.2")]));
        assert_eq!(out, "/*! blank v1.2 */");
        assert!(unknown.is_empty());
    }

    #[test]
    fn test_render_leaves_unknown_placeholders() {
        let (out, unknown) = render("{{ author }} / {{ author }}", &BTreeMap::new());
        assert_eq!(out, "{{ author }} / {{ author }}");
        assert_eq!(unknown, vec!["author".to_string()]);
    }

    #[test]
    fn test_template_task_writes_output() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("src/templates")).unwrap();
        fs::write(
            root.join("src/templates/banner.css.tpl"),
            "/*! {{ name }} {{ version }} ({{ mode }}) by {{ author }} */\n",
        )
        .unwrap();

        let mut config = ThemeConfig::default();
        config.project.name = "blank".to_string();
        config.project.version = "2.0.0".to_string();
        config.template.vars.insert("author".to_string(), "Todd".to_string());
        let mut ctx =
            BuildContext::new(config, root.to_path_buf()).with_mode(Mode::Production);

        let reporter: Arc<dyn ProgressReporter> = Arc::new(NullProgress::new());
        Task::new("template", template).invoke(&mut ctx, &reporter).unwrap();

        let banner = fs::read_to_string(root.join("src/css/banner.css")).unwrap();
        assert_eq!(banner, "/*! blank 2.0.0 (production) by Todd */\n");
    }

    #[test]
    fn test_template_task_missing_source() {
        let temp = TempDir::new().unwrap();
        let mut ctx = BuildContext::new(ThemeConfig::default(), temp.path().to_path_buf());
        let reporter: Arc<dyn ProgressReporter> = Arc::new(NullProgress::new());
        let err = Task::new("template", template).invoke(&mut ctx, &reporter).unwrap_err();
        assert!(matches!(err, TaskError::Transform(TransformError::MissingSource(_))));
    }
}
