//! Vendored dependency sync from the package tree into the source tree.

use std::fs;

use crate::build::BuildContext;
use crate::config::VendorFile;
use crate::task::{TaskError, TaskLog, TransformError};

/// Copy one vendored file, creating the destination directory as needed.
pub fn sync(ctx: &BuildContext, file: &VendorFile) -> Result<(), TaskError> {
    let from = ctx.resolve_path(&file.from);
    if !from.is_file() {
        return Err(TransformError::MissingSource(file.from.clone()).into());
    }
    let to = ctx.resolve_path(&file.to);
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|e| TaskError::io(parent, e))?;
    }
    fs::copy(&from, &to).map_err(|e| TaskError::io(&from, e))?;
    tracing::debug!(from = %from.display(), to = %to.display(), "vendored");
    Ok(())
}

pub fn jquery(ctx: &mut BuildContext, log: &TaskLog<'_>) -> Result<(), TaskError> {
    sync(ctx, &ctx.config().vendor.jquery)?;
    if log.is_verbose() {
        log.info(format!("synced {}", ctx.config().vendor.jquery.to.display()));
    }
    Ok(())
}

pub fn normalize(ctx: &mut BuildContext, log: &TaskLog<'_>) -> Result<(), TaskError> {
    sync(ctx, &ctx.config().vendor.normalize)?;
    if log.is_verbose() {
        log.info(format!("synced {}", ctx.config().vendor.normalize.to.display()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThemeConfig;
    use tempfile::TempDir;

    #[test]
    fn test_sync_copies_and_overwrites() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("node_modules/jquery/dist")).unwrap();
        fs::write(root.join("node_modules/jquery/dist/jquery.js"), "v2").unwrap();
        fs::create_dir_all(root.join("src/js/lib")).unwrap();
        fs::write(root.join("src/js/lib/jquery.js"), "v1").unwrap();

        let config = ThemeConfig::default();
        let ctx = BuildContext::new(config.clone(), root.to_path_buf());
        sync(&ctx, &config.vendor.jquery).unwrap();
        sync(&ctx, &config.vendor.jquery).unwrap();
        assert_eq!(fs::read_to_string(root.join("src/js/lib/jquery.js")).unwrap(), "v2");
    }

    #[test]
    fn test_sync_creates_destination_dir() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("node_modules/normalize.css")).unwrap();
        fs::write(root.join("node_modules/normalize.css/normalize.css"), "html{}").unwrap();

        let config = ThemeConfig::default();
        let ctx = BuildContext::new(config.clone(), root.to_path_buf());
        sync(&ctx, &config.vendor.normalize).unwrap();
        assert!(root.join("src/css/lib/normalize.css").is_file());
    }

    #[test]
    fn test_sync_missing_package() {
        let temp = TempDir::new().unwrap();
        let config = ThemeConfig::default();
        let ctx = BuildContext::new(config.clone(), temp.path().to_path_buf());
        let err = sync(&ctx, &config.vendor.jquery).unwrap_err();
        assert_eq!(err.to_string(), "source not found: node_modules/jquery/dist/jquery.js");
    }
}
