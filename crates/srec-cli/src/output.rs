//! Output helpers shared by the command handlers

use anyhow::Result;
use serde::Serialize;

use crate::OutputFormat;

/// Whether `format` is one of the JSON variants
pub fn is_json(format: OutputFormat) -> bool {
    matches!(format, OutputFormat::Json | OutputFormat::JsonPretty)
}

/// Print `value` as JSON in the requested style
pub fn print_json<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<()> {
    let output = if format == OutputFormat::JsonPretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", output);
    Ok(())
}

/// Address zero-padded to the width used by the file
pub fn format_address(address: u32, chars: usize) -> String {
    format!("0x{address:0chars$X}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_address() {
        assert_eq!(format_address(0x1F, 4), "0x001F");
        assert_eq!(format_address(0x12345, 6), "0x012345");
        assert_eq!(format_address(0xDEAD_BEEF, 4), "0xDEADBEEF");
    }

    #[test]
    fn test_is_json() {
        assert!(is_json(OutputFormat::Json));
        assert!(is_json(OutputFormat::JsonPretty));
        assert!(!is_json(OutputFormat::Text));
    }
}
