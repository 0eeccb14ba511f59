#![deny(clippy::all, clippy::pedantic)]

use std::fs;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::args::PasswordInput;
use crate::client::CliError;

fn read_file(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::InputFile {
        path: path.display().to_string(),
        source,
    })
}

pub fn read_opt_value(
    val: Option<String>,
    file: Option<PathBuf>,
) -> Result<Option<String>, CliError> {
    if let Some(path) = file {
        return read_file(&path).map(Some);
    }
    Ok(val)
}

/// Secret read from a file (first line, trailing newline dropped).
pub fn read_secret_file(path: &Path) -> Result<String, CliError> {
    let data = read_file(path)?;
    Ok(data.lines().next().unwrap_or_default().to_string())
}

pub fn read_password(input: &PasswordInput) -> Result<String, CliError> {
    if let Some(path) = &input.password_file {
        return read_secret_file(path);
    }
    input.password_env.clone().ok_or_else(|| {
        CliError::InvalidInput(
            "password required (use --password-file or LISTINGDESK_PASSWORD)".into(),
        )
    })
}

pub fn parse_time(val: &str) -> Result<OffsetDateTime, CliError> {
    OffsetDateTime::parse(val.trim(), &Rfc3339).map_err(|e| CliError::InvalidInput(e.to_string()))
}

pub fn parse_time_opt(val: Option<String>) -> Result<Option<OffsetDateTime>, CliError> {
    val.as_deref().map(parse_time).transpose()
}
