use anyhow::{Context, Result, bail};
use serde::Serialize;
use srec_formats::{Endianness, SRecordFile};
use std::path::Path;

use super::load;
use crate::CommandContext;
use crate::output::{format_address, is_json, print_json};

pub fn info(path: &Path, ctx: &CommandContext) -> Result<()> {
    let file = load(path, ctx)?;
    if is_json(ctx.format) {
        print_json(&file.summary()?, ctx.format)
    } else {
        println!("{}", file.get_file_summary()?);
        Ok(())
    }
}

pub fn sectors(path: &Path, ctx: &CommandContext) -> Result<()> {
    let file = load(path, ctx)?;
    if is_json(ctx.format) {
        print_json(file.sectors()?, ctx.format)
    } else {
        print!("{}", file.get_sector_summary()?);
        Ok(())
    }
}

#[derive(Serialize)]
struct ShownRecord {
    address: u32,
    line: String,
}

pub fn show(path: &Path, address: &str, count: usize, ctx: &CommandContext) -> Result<()> {
    let file = load(path, ctx)?;
    let address = resolve_address(&file, address)?;
    let records = file
        .show_records(address, count)
        .with_context(|| format!("No record holds 0x{address:X}"))?;

    if is_json(ctx.format) {
        let shown: Vec<ShownRecord> = records
            .iter()
            .map(|record| ShownRecord {
                address: record.address(),
                line: record.to_line(),
            })
            .collect();
        return print_json(&shown, ctx.format);
    }

    for record in &records {
        println!("{}", record);
    }
    if records.len() < count {
        println!("-- end of sector");
    }
    Ok(())
}

#[derive(Serialize)]
struct DumpLine {
    address: u32,
    words: Vec<String>,
}

pub fn dump(
    path: &Path,
    address: Option<&str>,
    words: usize,
    lines: usize,
    endianness: Endianness,
    ctx: &CommandContext,
) -> Result<()> {
    let file = load(path, ctx)?;
    let start = match address {
        Some(address) => resolve_address(&file, address)?,
        None => match file.bounds()? {
            Some((low, _)) => low,
            None => bail!("{} holds no data", path.display()),
        },
    };

    if is_json(ctx.format) {
        if words == 0 || lines == 0 {
            bail!("Nothing to dump: {words} words x {lines} lines");
        }
        let Some(total) = words
            .checked_mul(4)
            .and_then(|stride| stride.checked_mul(lines))
        else {
            bail!("Cannot dump {lines} lines of {words} words: view too large");
        };
        let stride = 4 * words;
        let bytes = file
            .read(start, total)
            .with_context(|| format!("Cannot dump {lines} lines of {words} words at 0x{start:X}"))?;
        let dumped: Vec<DumpLine> = bytes
            .chunks(stride)
            .enumerate()
            .map(|(line, chunk)| DumpLine {
                address: start + (stride * line) as u32,
                words: chunk
                    .chunks(4)
                    .map(|word| {
                        let mut word = word.to_vec();
                        if endianness == Endianness::Little {
                            word.reverse();
                        }
                        hex::encode_upper(word)
                    })
                    .collect(),
            })
            .collect();
        return print_json(&dumped, ctx.format);
    }

    let body = file
        .binary_display(start, words, lines, endianness)
        .with_context(|| format!("Cannot dump {lines} lines of {words} words at 0x{start:X}"))?;
    println!("{}", file.binary_display_header(words, endianness)?);
    println!("{body}");
    Ok(())
}

pub fn verify(path: &Path, ctx: &CommandContext) -> Result<()> {
    let file = load(path, ctx)?;
    let stale = file.checksum_mismatches()?;
    let chars = file.address_chars()?;

    if is_json(ctx.format) {
        print_json(&stale, ctx.format)?;
    } else if stale.is_empty() {
        println!("All checksums valid");
    } else {
        for record in &stale {
            println!(
                "{} record at {}: stored {:02X}, computed {:02X}",
                record.kind,
                format_address(record.address, chars),
                record.stored,
                record.computed
            );
        }
    }

    if !stale.is_empty() {
        bail!("{} records with a stale checksum", stale.len());
    }
    Ok(())
}

pub fn strings(path: &Path, min_len: usize, ctx: &CommandContext) -> Result<()> {
    let file = load(path, ctx)?;
    let found = file.strings(min_len)?;
    if is_json(ctx.format) {
        return print_json(&found, ctx.format);
    }

    let chars = file.address_chars()?;
    for string in &found {
        println!("{}  {}", format_address(string.address, chars), string.text);
    }
    Ok(())
}

#[derive(Serialize)]
struct Resolved {
    address: u32,
    record: u32,
    offset: usize,
    value: u8,
}

pub fn resolve(path: &Path, expression: &str, ctx: &CommandContext) -> Result<()> {
    let file = load(path, ctx)?;
    let address = resolve_address(&file, expression)?;
    let coordinate = file
        .get_coordinate(address)
        .with_context(|| format!("No record holds 0x{address:X}"))?;
    let resolved = Resolved {
        address,
        record: coordinate.record,
        offset: coordinate.offset,
        value: file.byte_at(address)?,
    };

    if is_json(ctx.format) {
        return print_json(&resolved, ctx.format);
    }
    let chars = file.address_chars()?;
    println!(
        "{} = {:02X} (record {} offset {})",
        format_address(resolved.address, chars),
        resolved.value,
        format_address(resolved.record, chars),
        resolved.offset
    );
    Ok(())
}

pub(crate) fn resolve_address(file: &SRecordFile, token: &str) -> Result<u32> {
    file.convert_address(token)
        .with_context(|| format!("Cannot resolve address '{token}'"))
}
