use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use super::inspect::resolve_address;
use super::{load, load_with_policy, save};
use crate::CommandContext;
use crate::output::{format_address, is_json, print_json};

#[derive(Serialize)]
struct EditResult {
    changed: usize,
    written: bool,
}

fn report(summary: &str, result: &EditResult, ctx: &CommandContext) -> Result<()> {
    if is_json(ctx.format) {
        print_json(result, ctx.format)
    } else {
        println!("{summary}");
        Ok(())
    }
}

pub fn patch(path: &Path, address: &str, value: &str, ctx: &CommandContext) -> Result<()> {
    let mut file = load(path, ctx)?;
    let before = file.snapshot()?;
    let address = resolve_address(&file, address)?;

    file.patch(address, value)
        .with_context(|| format!("Failed to patch {value} at 0x{address:X}"))?;
    let written = save(&file, &before, path, ctx)?;

    let result = EditResult {
        changed: value.trim().len() / 2,
        written,
    };
    let summary = format!(
        "Patched {} bytes at {}",
        result.changed,
        format_address(address, file.address_chars()?)
    );
    report(&summary, &result, ctx)
}

pub fn patch_file(path: &Path, address: &str, source: &Path, ctx: &CommandContext) -> Result<()> {
    let mut file = load(path, ctx)?;
    // Tags name addresses in the target only
    let other = load_with_policy(source, ctx)?;
    let before = file.snapshot()?;
    let address = resolve_address(&file, address)?;

    file.patch_from(address, &other).with_context(|| {
        format!(
            "Failed to copy {} to 0x{address:X}",
            source.display()
        )
    })?;
    let written = save(&file, &before, path, ctx)?;

    let result = EditResult {
        changed: other.data_payload()?.len(),
        written,
    };
    let summary = format!(
        "Copied {} bytes from {} to {}",
        result.changed,
        source.display(),
        format_address(address, file.address_chars()?)
    );
    report(&summary, &result, ctx)
}

pub fn fix_checksums(path: &Path, ctx: &CommandContext) -> Result<()> {
    let mut file = load(path, ctx)?;
    let before = file.snapshot()?;

    let changed = file.fix_checksums()?;
    let written = save(&file, &before, path, ctx)?;

    let result = EditResult { changed, written };
    report(&format!("Fixed {changed} checksums"), &result, ctx)
}
