//! `tessera tags`: loading and listing tag files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tessera_target::{discover_tag_files, KindRegistry, Resolver, TagLookup, TagRegistry};
use tracing::debug;

/// Load explicit tag files followed by every tag file in `dir`.
pub fn load_tags(kinds: &KindRegistry, files: &[PathBuf], dir: Option<&Path>) -> Result<TagRegistry> {
    let mut paths = files.to_vec();
    if let Some(dir) = dir {
        paths.extend(
            discover_tag_files(dir)
                .with_context(|| format!("failed to scan {} for tag files", dir.display()))?,
        );
    }

    let resolver = Resolver::new(kinds);
    let mut tags = TagRegistry::new();
    for path in &paths {
        let added = tags
            .load_file(path, &resolver)
            .with_context(|| format!("failed to load tags from {}", path.display()))?;
        debug!(path = %path.display(), count = added.len(), "loaded tag file");
    }
    Ok(tags)
}

/// Render one line per tag: name and canonical string.
pub fn render(tags: &TagRegistry) -> String {
    let mut out = String::new();
    for name in tags.names() {
        if let Some(target) = tags.lookup_tag(name) {
            out.push_str(&format!("  {name:<25} {target}\n"));
        }
    }
    out
}

pub fn list(files: &[PathBuf], dir: Option<&Path>) -> Result<()> {
    let kinds = tessera_target::builtin_kinds()?;
    let tags = load_tags(&kinds, files, dir)?;
    if tags.is_empty() {
        println!("No tags loaded. Pass --tags <FILE> or --tags-dir <DIR>.");
        return Ok(());
    }
    println!("Tags:");
    println!();
    print!("{}", render(&tags));
    Ok(())
}
