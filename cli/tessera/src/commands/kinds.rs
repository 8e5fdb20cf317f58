//! `tessera kinds` / `tessera kind`: kind listing and schema description.

use anyhow::{bail, Result};
use tessera_target::kind::KindExtension;
use tessera_target::{builtin_kinds, KindLookup, KindRegistry, TargetKind};

/// One line per kind: name, device type, default keys.
pub fn render_list(kinds: &KindRegistry) -> String {
    let mut out = String::new();
    for kind in kinds.iter() {
        out.push_str(&format!(
            "  {:<10} {:<8} keys: {}\n",
            kind.name(),
            kind.default_device_type().to_string(),
            kind.default_keys().join(",")
        ));
    }
    out
}

/// The attribute schema of one kind.
pub fn render_kind(kind: &TargetKind) -> String {
    let mut out = format!("=== Kind: {} ===\n", kind.name());
    out.push_str(&format!("Device type:  {}\n", kind.default_device_type()));
    out.push_str(&format!("Default keys: {}\n", kind.default_keys().join(",")));
    let hook = match kind.extension() {
        KindExtension::None => "none",
        KindExtension::Preprocessor(_) => "attribute preprocessor",
        KindExtension::Parser(_) => "target parser",
    };
    out.push_str(&format!("Hook:         {hook}\n"));
    out.push('\n');
    out.push_str("--- Attributes ---\n");
    for (key, schema) in kind.attrs() {
        match &schema.default {
            Some(default) => out.push_str(&format!(
                "  {key:<30} {:<12} default {default}\n",
                schema.value_type.to_string()
            )),
            None => out.push_str(&format!("  {key:<30} {}\n", schema.value_type)),
        }
    }
    out
}

pub fn list() -> Result<()> {
    let kinds = builtin_kinds()?;
    println!("Built-in kinds:");
    println!();
    print!("{}", render_list(&kinds));
    println!();
    println!("Use 'tessera kind <name>' for details.");
    Ok(())
}

pub fn describe(name: &str) -> Result<()> {
    let kinds = builtin_kinds()?;
    let Some(kind) = kinds.lookup_kind(name) else {
        bail!("unknown kind: '{name}'. Use 'tessera kinds' to see available kinds.");
    };
    print!("{}", render_kind(&kind));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_includes_builtins() {
        let kinds = builtin_kinds().unwrap();
        let text = render_list(&kinds);
        assert!(text.contains("llvm"));
        assert!(text.contains("keys: cuda,gpu"));
    }

    #[test]
    fn describe_shows_defaults() {
        let kinds = builtin_kinds().unwrap();
        let cuda = kinds.lookup_kind("cuda").unwrap();
        let text = render_kind(&cuda);
        assert!(text.contains("attribute preprocessor"));
        assert!(text.contains("max_num_threads"));
        assert!(text.contains("default 1024"));
        assert!(text.contains("Array<str>"));
    }

    #[test]
    fn describe_known_kind() {
        assert!(describe("llvm").is_ok());
    }

    #[test]
    fn describe_unknown_kind_fails() {
        assert!(describe("metal").is_err());
    }
}
