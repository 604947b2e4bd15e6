use crate::errors::CliError;
use crate::println_pad;
use crate::utils::format_size;
use camino::Utf8Path;
use colored::Colorize;
use miette::{IntoDiagnostic, Result};
use s2_vpk::{Package, PackageEntry};
use serde::Serialize;

pub struct ListArgs {
    pub file_path: String,
    pub extension: Option<String>,
    pub json: bool,
}

#[derive(Serialize)]
struct EntryInfo {
    path: String,
    size: u64,
    crc32: u32,
    archive_index: u16,
}

impl From<&PackageEntry> for EntryInfo {
    fn from(entry: &PackageEntry) -> Self {
        Self {
            path: entry.full_path(),
            size: entry.total_length(),
            crc32: entry.crc32,
            archive_index: entry.archive_index,
        }
    }
}

pub fn list_package(args: ListArgs) -> Result<()> {
    let file_path = Utf8Path::new(&args.file_path);
    if !file_path.exists() {
        return Err(CliError::FileNotFound {
            path: file_path.as_std_path().to_path_buf(),
        }
        .into());
    }

    let package = Package::open(file_path).map_err(CliError::from)?;
    let entries: Vec<EntryInfo> = match &args.extension {
        Some(ext) => package
            .entries_with_extension(ext.trim_start_matches('.'))
            .map(EntryInfo::from)
            .collect(),
        None => package.entries().iter().map(EntryInfo::from).collect(),
    };

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).into_diagnostic()?
        );
        return Ok(());
    }

    println_pad!(
        "{} {} {}",
        "📦 Package:".bright_blue().bold(),
        file_path.as_str().bright_cyan().bold(),
        format!(
            "(v{}, {} entries{})",
            package.header().version,
            package.len(),
            if package.is_split() { ", split" } else { "" }
        )
        .dimmed()
    );
    for entry in &entries {
        println_pad!(
            "   {} {}",
            entry.path.bright_white(),
            format!("({})", format_size(entry.size)).dimmed()
        );
    }

    let total: u64 = entries.iter().map(|e| e.size).sum();
    println_pad!(
        "\n{} {} {}",
        "Σ".bright_magenta(),
        format!("{} files,", entries.len()).bright_white(),
        format_size(total).bright_white().bold()
    );
    Ok(())
}
