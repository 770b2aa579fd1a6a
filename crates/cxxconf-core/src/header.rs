//! Generated build artifacts: config header and JSON configuration store.

use crate::context::ConfigureContext;
use crate::error::ConfigureError;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Render the context's define table as a guarded preprocessor header.
pub fn render_config_header(ctx: &ConfigureContext, guard: &str) -> String {
    let mut out = String::new();
    out.push_str("/* Generated by cxxconf configure. Do not edit. */\n");
    out.push_str(&format!("#ifndef {}\n", guard));
    out.push_str(&format!("#define {}\n\n", guard));

    for (name, value) in ctx.defines() {
        out.push_str(&format!("#define {} {}\n", name, value.render()));
    }

    out.push_str(&format!("\n#endif /* {} */\n", guard));
    out
}

/// Include-guard symbol derived from the header file name.
pub fn guard_for(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "config.h".to_string());
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Write the config header for downstream compilation steps.
pub fn write_config_header(ctx: &ConfigureContext, path: &Path) -> Result<(), ConfigureError> {
    let contents = render_config_header(ctx, &guard_for(path));
    write_atomic(path, contents.as_bytes()).map_err(|e| ConfigureError::HeaderWrite(e.to_string()))
}

/// Write the JSON configuration store (full snapshot of the run).
pub fn write_store(ctx: &ConfigureContext, path: &Path) -> Result<(), ConfigureError> {
    let snapshot = ctx.snapshot();
    let json = serde_json::to_vec_pretty(&snapshot)?;
    write_atomic(path, &json).map_err(|e| ConfigureError::StoreWrite(e.to_string()))
}

// Atomic write: temp file in the target directory, then rename.
fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
