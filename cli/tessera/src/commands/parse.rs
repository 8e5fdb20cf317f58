//! `tessera parse`: build a descriptor and print it.

use std::path::PathBuf;

use anyhow::Result;
use tessera_target::{builtin_kinds, JsonConfigLoader, Resolver, Target, Value};

use super::tags::load_tags;
use crate::OutputFormat;

#[derive(Debug)]
pub struct ParseOptions {
    pub format: OutputFormat,
    pub strict_device_check: bool,
    pub tag_files: Vec<PathBuf>,
    pub tags_dir: Option<PathBuf>,
}

/// Render `target` in the requested format.
pub fn render(target: &Target, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Canonical => target.str().to_string(),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&Value::from_config(target.export()))?
        }
        OutputFormat::Debug => target.to_debug_string(),
    })
}

pub fn run(input: &str, options: &ParseOptions) -> Result<()> {
    let kinds = builtin_kinds()?;
    let tags = load_tags(&kinds, &options.tag_files, options.tags_dir.as_deref())?;
    let loader = JsonConfigLoader;
    let resolver = Resolver::new(&kinds)
        .with_tags(&tags)
        .with_config_loader(&loader)
        .strict_device_check(options.strict_device_check);

    let target = Target::parse(input, &resolver)?;
    println!("{}", render(&target, options.format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(format: OutputFormat) -> ParseOptions {
        ParseOptions {
            format,
            strict_device_check: false,
            tag_files: Vec::new(),
            tags_dir: None,
        }
    }

    fn parse(text: &str) -> std::sync::Arc<Target> {
        let kinds = builtin_kinds().unwrap();
        let loader = JsonConfigLoader;
        let resolver = Resolver::new(&kinds).with_config_loader(&loader);
        Target::parse(text, &resolver).unwrap()
    }

    #[test]
    fn canonical_output() {
        let target = parse("llvm -num-cores=4 -mcpu=skylake");
        assert_eq!(
            render(&target, OutputFormat::Canonical).unwrap(),
            "llvm -keys=cpu -mcpu=skylake -num-cores=4"
        );
    }

    #[test]
    fn json_output_exports_host() {
        let target = parse("cuda -arch=sm_80 -host='llvm -mcpu=skylake'");
        let json: serde_json::Value =
            serde_json::from_str(&render(&target, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["kind"], "cuda");
        assert_eq!(json["keys"], serde_json::json!(["cuda", "gpu"]));
        assert_eq!(json["host"]["mcpu"], "skylake");
    }

    #[test]
    fn debug_output_names_kind() {
        let target = parse("c");
        let text = render(&target, OutputFormat::Debug).unwrap();
        assert!(text.starts_with("Target(id="));
        assert!(text.contains("kind='c'"));
    }

    #[test]
    fn json_strings_are_accepted() {
        assert!(run(r#"{"kind": "rocm", "mcpu": "gfx90a"}"#, &options(OutputFormat::Canonical)).is_ok());
    }

    #[test]
    fn invalid_target_fails() {
        let err = run("llvm -mcpu=a -mcpu=b", &options(OutputFormat::Canonical)).unwrap_err();
        assert!(format!("{err:#}").contains("appears more than once"));
    }

    #[test]
    fn tags_resolve_through_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("boards.tags.toml"),
            "[tag.\"pi/4b\"]\nkind = \"llvm\"\nmtriple = \"aarch64-linux-gnu\"\n",
        )
        .unwrap();
        let opts = ParseOptions {
            tags_dir: Some(dir.path().to_path_buf()),
            ..options(OutputFormat::Debug)
        };
        assert!(run("pi/4b", &opts).is_ok());
    }
}
