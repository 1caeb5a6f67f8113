//! Feature-detection script generation.
//!
//! The generated script runs each detect once on page load, records the
//! result on `window.Modernizr` and adds `feature` or `no-feature` classes
//! to the root element, replacing `no-js` with `js`.

use std::fmt::Write as _;
use std::fs;

use crate::build::BuildContext;
use crate::task::{TaskError, TaskLog, TransformError};

/// Built-in detects: name and the JavaScript expression that tests it.
pub const DETECTS: &[(&str, &str)] = &[
    ("audio", "!!document.createElement('audio').canPlayType"),
    ("canvas", "!!document.createElement('canvas').getContext"),
    ("cssgrid", "supportsCss('display', 'grid')"),
    ("csstransforms", "supportsCss('transform', 'translateX(1px)')"),
    ("flexbox", "supportsCss('display', 'flex')"),
    ("geolocation", "'geolocation' in navigator"),
    ("history", "!!(window.history && window.history.pushState)"),
    ("json", "'JSON' in window && 'parse' in JSON && 'stringify' in JSON"),
    ("localstorage", "canStore('localStorage')"),
    ("requestanimationframe", "'requestAnimationFrame' in window"),
    ("sessionstorage", "canStore('sessionStorage')"),
    ("svg", "!!document.createElementNS && !!document.createElementNS('http://www.w3.org/2000/svg', 'svg').createSVGRect"),
    ("touchevents", "('ontouchstart' in window) || !!(window.DocumentTouch && document instanceof window.DocumentTouch)"),
    ("video", "!!document.createElement('video').canPlayType"),
    ("webgl", "'WebGLRenderingContext' in window"),
];

const PRELUDE: &str = r#";(function (window, document, navigator) {
  var Modernizr = window.Modernizr || {};
  var root = document.documentElement;
  var classes = [];

  function supportsCss(prop, value) {
    if (window.CSS && window.CSS.supports) {
      return window.CSS.supports(prop, value);
    }
    var el = document.createElement('div');
    el.style[prop] = value;
    return el.style[prop] === value;
  }

  function canStore(kind) {
    try {
      var store = window[kind];
      store.setItem('themekit', '1');
      store.removeItem('themekit');
      return true;
    } catch (e) {
      return false;
    }
  }

  function detect(name, test) {
    var result = false;
    try {
      result = !!test();
    } catch (e) {
      result = false;
    }
    Modernizr[name] = result;
    classes.push((result ? '' : 'no-') + name);
  }

"#;

const EPILOGUE: &str = r#"
  root.className = root.className.replace(/(^|\s)no-js(\s|$)/, '$1js$2') + ' ' + classes.join(' ');
  window.Modernizr = Modernizr;
})(window, document, navigator);
"#;

/// Generate the detection script for `features`, or every built-in detect
/// when the list is empty.
pub fn generate_script(features: &[String]) -> Result<String, TransformError> {
    let selected: Vec<(&str, &str)> = if features.is_empty() {
        DETECTS.to_vec()
    } else {
        features
            .iter()
            .map(|name| {
                DETECTS
                    .iter()
                    .find(|(detect, _)| detect.eq_ignore_ascii_case(name))
                    .copied()
                    .ok_or_else(|| TransformError::Other(format!("unknown feature detect '{}'", name)))
            })
            .collect::<Result<_, _>>()?
    };

    let names: Vec<&str> = selected.iter().map(|(name, _)| *name).collect();
    let mut script = format!("/*! themekit feature detection | {} */\n", names.join(", "));
    script.push_str(PRELUDE);
    for (name, expression) in &selected {
        let _ = writeln!(script, "  detect('{}', function () {{ return {}; }});", name, expression);
    }
    script.push_str(EPILOGUE);
    Ok(script)
}

/// Write the feature-detection script to its configured location.
pub fn modernizr(ctx: &mut BuildContext, log: &TaskLog<'_>) -> Result<(), TaskError> {
    let config = &ctx.config().modernizr;
    let script = generate_script(&config.features)?;

    let output = ctx.resolve_path(&config.output);
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(|e| TaskError::io(parent, e))?;
    }
    fs::write(&output, script).map_err(|e| TaskError::io(&output, e))?;
    if log.is_verbose() {
        log.info(format!("wrote {}", ctx.display_path(&output)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::progress::{NullProgress, ProgressReporter};
    use crate::config::ThemeConfig;
    use crate::task::Task;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_all_detects_by_default() {
        let script = generate_script(&[]).unwrap();
        for (name, _) in DETECTS {
            assert!(script.contains(&format!("detect('{}'", name)), "missing {}", name);
        }
        assert!(script.contains("window.Modernizr = Modernizr;"));
    }

    #[test]
    fn test_selected_detects_keep_order() {
        let script = generate_script(&["svg".to_string(), "Flexbox".to_string()]).unwrap();
        assert!(script.starts_with("/*! themekit feature detection | svg, flexbox */"));
        let svg = script.find("detect('svg'").unwrap();
        let flex = script.find("detect('flexbox'").unwrap();
        assert!(svg < flex);
        assert!(!script.contains("detect('canvas'"));
    }

    #[test]
    fn test_unknown_detect_rejected() {
        let err = generate_script(&["teleport".to_string()]).unwrap_err();
        assert_eq!(err.to_string(), "unknown feature detect 'teleport'");
    }

    #[test]
    fn test_detects_are_sorted_and_unique() {
        let names: Vec<_> = DETECTS.iter().map(|(n, _)| *n).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_modernizr_task_writes_script() {
        let temp = TempDir::new().unwrap();
        let mut ctx = BuildContext::new(ThemeConfig::default(), temp.path().to_path_buf());
        let reporter: Arc<dyn ProgressReporter> = Arc::new(NullProgress::new());
        Task::new("modernizr", modernizr).invoke(&mut ctx, &reporter).unwrap();

        let script = fs::read_to_string(temp.path().join("src/js/lib/modernizr.js")).unwrap();
        assert!(script.contains("detect('flexbox'"));
    }
}
