//! Command handlers

pub mod edit;
pub mod inspect;

use anyhow::{Context, Result};
use srec_formats::{LoadOptions, SRecordFile, Snapshot};
use std::path::Path;
use tracing::{debug, info};

use crate::{CommandContext, Commands};

/// Run one subcommand
pub fn handle(cmd: Commands, ctx: &CommandContext) -> Result<()> {
    match cmd {
        Commands::Info { file } => inspect::info(&file, ctx),
        Commands::Sectors { file } => inspect::sectors(&file, ctx),
        Commands::Show {
            file,
            address,
            count,
        } => inspect::show(&file, &address, count, ctx),
        Commands::Dump {
            file,
            address,
            words,
            lines,
            endianness,
        } => inspect::dump(&file, address.as_deref(), words, lines, endianness, ctx),
        Commands::Patch {
            file,
            address,
            value,
        } => edit::patch(&file, &address, &value, ctx),
        Commands::PatchFile {
            file,
            address,
            source,
        } => edit::patch_file(&file, &address, &source, ctx),
        Commands::FixChecksums { file } => edit::fix_checksums(&file, ctx),
        Commands::Verify { file } => inspect::verify(&file, ctx),
        Commands::Strings { file, min_len } => inspect::strings(&file, min_len, ctx),
        Commands::Resolve { file, expression } => inspect::resolve(&file, &expression, ctx),
    }
}

/// Load `path` with the context's checksum policy only
pub fn load_with_policy(path: &Path, ctx: &CommandContext) -> Result<SRecordFile> {
    let options = LoadOptions::new().with_checksum_policy(ctx.checksum_policy);
    SRecordFile::from_path_with_options(path, options)
        .with_context(|| format!("Failed to load {}", path.display()))
}

/// Load `path` with the context's checksum policy and register its tags
pub fn load(path: &Path, ctx: &CommandContext) -> Result<SRecordFile> {
    let mut file = load_with_policy(path, ctx)?;

    for tag in &ctx.tags {
        let address = file
            .convert_address(&tag.address)
            .with_context(|| format!("Invalid address for tag '{}'", tag.name))?;
        file.add_tag_with_length(&tag.name, address, tag.length)
            .with_context(|| format!("Failed to add tag '{}'", tag.name))?;
        debug!("Tag {} -> 0x{:X} ({} bytes)", tag.name, address, tag.length);
    }
    Ok(file)
}

/// Write `file` to `--output` or back to `input` when it differs from `before`
///
/// Returns whether anything was written.
pub fn save(
    file: &SRecordFile,
    before: &Snapshot,
    input: &Path,
    ctx: &CommandContext,
) -> Result<bool> {
    let destination = ctx.output.as_deref().unwrap_or(input);
    let changed = file.differs_from(before)?;
    if !changed && destination == input {
        info!("{} unchanged", input.display());
        return Ok(false);
    }

    file.export(destination)
        .with_context(|| format!("Failed to write {}", destination.display()))?;
    info!("Wrote {}", destination.display());
    Ok(true)
}
