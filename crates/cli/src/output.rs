use std::io::Read;
use std::path::Path;

use serde::Serialize;

use rollcall_store::{StoreError, WriteOutcome};

use crate::CliError;

/// Print one pretty JSON value to stdout.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::internal(format!("JSON serialization error: {e}")))?;
    println!("{json}");
    Ok(())
}

/// Report a store write. JSON mode prints a `WriteOutcome` either way;
/// human mode prints `describe` on success. Failures keep their exit code.
pub(crate) fn finish_write<T>(
    json: bool,
    result: Result<T, StoreError>,
    describe: impl FnOnce(&T) -> String,
) -> Result<T, CliError> {
    if json {
        print_json(&WriteOutcome::from(&result))?;
    }
    match result {
        Ok(value) => {
            if !json {
                eprintln!("{}", describe(&value));
            }
            Ok(value)
        }
        Err(e) => Err(CliError::store(e)),
    }
}

/// Read a file argument, where `-` means stdin.
pub(crate) fn read_input(path: &Path) -> Result<String, CliError> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| CliError::usage(format!("cannot read stdin: {e}")))?;
        return Ok(buf);
    }
    std::fs::read_to_string(path)
        .map_err(|e| CliError::usage(format!("cannot read {}: {e}", path.display())))
}
