//! Bundle command - mirror the project and its plugin packages

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr, bail};
use yarnsite_core::{
    BundlePlan, ManifestDependencies, PackageResolver, ResolvedPaths, config::absolutize,
};

use super::load_project;

/// Run the bundle command.
///
/// Copies the manifest, the source tree, the active theme and every installed
/// plugin package into `output`, keyed by their project-relative paths.
pub fn run(config_path: &Path, output: &Path) -> Result<()> {
    let (config, paths) = load_project(config_path)?;
    let output = &bundle_output(&paths, output)?;

    let plugins = if paths.manifest.is_file() {
        let deps =
            ManifestDependencies::load(&paths.manifest).wrap_err("Failed to read manifest")?;
        PackageResolver::new(config.plugins.prefix).resolve(&deps)
    } else {
        tracing::warn!(manifest = %paths.manifest.display(), "No manifest, bundling without plugins");
        Default::default()
    };

    let plan = BundlePlan::for_project(&paths, &plugins).wrap_err("Failed to plan bundle")?;
    let copied = plan
        .mirror_to(output)
        .wrap_err_with(|| format!("Failed to write bundle to {}", output.display()))?;

    println!();
    println!("  Bundled {copied} files into {}", output.display());
    println!("  Plugins: {}", plugins.len());
    for missing in plan.missing() {
        println!("  ⚠ {missing} is declared but not installed");
    }
    println!();

    Ok(())
}

/// Resolve `output` the way project paths are resolved and refuse anything
/// inside the source directory.
fn bundle_output(paths: &ResolvedPaths, output: &Path) -> Result<PathBuf> {
    let output = absolutize(Path::new("."), output).wrap_err("Invalid bundle output path")?;

    if output.starts_with(&paths.source) {
        bail!(
            "Bundle output {} must not be inside the source directory",
            output.display()
        );
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> (tempfile::TempDir, ResolvedPaths) {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(dir.path().join("source")).expect("mkdir");
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "[site]\ntitle = \"Bundle\"\n").expect("write");
        let (_config, paths) = load_project(&config_path).expect("load project");
        (dir, paths)
    }

    #[test]
    fn test_output_outside_source_is_accepted() {
        let (dir, paths) = project();
        let output = bundle_output(&paths, &dir.path().join("bundle")).expect("accepted");
        assert_eq!(output, paths.root.join("bundle"));
    }

    #[test]
    fn test_output_inside_source_is_rejected() {
        let (_dir, paths) = project();
        let err = bundle_output(&paths, &paths.source.join("out")).unwrap_err();
        assert!(err.to_string().contains("must not be inside the source directory"));
    }

    #[cfg(unix)]
    #[test]
    fn test_output_inside_source_through_symlink_is_rejected() {
        let (dir, paths) = project();
        let link = tempfile::tempdir().expect("create temp dir");
        let alias = link.path().join("alias");
        std::os::unix::fs::symlink(dir.path(), &alias).expect("symlink");

        let err = bundle_output(&paths, &alias.join("source/out")).unwrap_err();
        assert!(err.to_string().contains("must not be inside the source directory"));
    }
}
