use super::LoaderArgs;
use crate::errors::CliError;
use crate::println_pad;
use crate::utils::format_size;
use camino::{Utf8Path, Utf8PathBuf};
use colored::Colorize;
use miette::{IntoDiagnostic, Result};
use s2_vfs::Resolved;
use s2_vpk::Package;
use std::fs;

pub struct ExtractArgs {
    pub path: String,
    pub output: Option<String>,
    pub verify: bool,
    pub loader: LoaderArgs,
}

/// File name of the logical path, in the current directory.
fn default_output(path: &str) -> Utf8PathBuf {
    let normalized = path.replace('\\', "/");
    let name = Utf8Path::new(&normalized).file_name().unwrap_or("extracted");
    Utf8PathBuf::from(name)
}

pub fn extract_file(args: ExtractArgs) -> Result<()> {
    args.loader.with_loader(|loader| {
        let file = loader
            .load_file(&args.path)
            .map_err(CliError::from)?
            .ok_or_else(|| CliError::NotFound {
                path: args.path.clone(),
            })?;

        println_pad!(
            "{} {}",
            "🔎 Resolved:".bright_blue().bold(),
            file.resolved.to_string().bright_cyan()
        );

        if args.verify {
            match &file.resolved {
                Resolved::InArchive { entry, .. } => {
                    if !Package::verify_entry(entry, &file.data) {
                        return Err(CliError::ChecksumMismatch {
                            path: entry.full_path(),
                            expected: entry.crc32,
                            actual: s2_vpk::checksum(&file.data),
                        }
                        .into());
                    }
                    println_pad!("{}", "✓ Checksum OK".bright_green());
                }
                _ => println_pad!(
                    "{}",
                    "Loose files carry no checksum; skipping verification".bright_yellow()
                ),
            }
        }

        let output = args
            .output
            .clone()
            .map(Utf8PathBuf::from)
            .unwrap_or_else(|| default_output(&args.path));
        if let Some(parent) = output.parent().filter(|p| !p.as_str().is_empty()) {
            fs::create_dir_all(parent).into_diagnostic()?;
        }
        fs::write(&output, &file.data[..]).into_diagnostic()?;

        println_pad!(
            "{} {} {}",
            "📁 Wrote:".bright_yellow(),
            output.as_str().bright_white().bold(),
            format!("({})", format_size(file.data.len() as u64)).dimmed()
        );

        Ok(())
    })
}
