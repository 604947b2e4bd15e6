use crate::errors::CliError;
use crate::println_pad;
use camino::{Utf8Path, Utf8PathBuf};
use colored::Colorize;
use miette::{IntoDiagnostic, Result, WrapErr};
use s2_vpk::PackageBuilder;
use std::fs::{self, File};
use std::io::BufWriter;
use walkdir::WalkDir;

pub struct PackArgs {
    pub input_dir: String,
    pub output: String,
    pub split: bool,
    pub preload: usize,
}

/// Collect every file under `input_dir`, keyed by its `/`-separated relative path.
fn collect_files(input_dir: &Utf8Path, builder: &mut PackageBuilder) -> Result<usize> {
    let mut count = 0;
    for entry in WalkDir::new(input_dir).sort_by_file_name() {
        let entry = entry.into_diagnostic()?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(input_dir)
            .into_diagnostic()?
            .to_string_lossy()
            .replace('\\', "/");
        let data = fs::read(entry.path())
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read {}", entry.path().display()))?;

        tracing::debug!("Packing {} ({} bytes)", relative, data.len());
        builder.add_file(relative, data);
        count += 1;
    }
    Ok(count)
}

pub fn pack_directory(args: PackArgs) -> Result<()> {
    let input_dir = Utf8Path::new(&args.input_dir);
    if !input_dir.is_dir() {
        return Err(CliError::FileNotFound {
            path: input_dir.as_std_path().to_path_buf(),
        }
        .into());
    }

    let output = Utf8PathBuf::from(&args.output);
    let is_dir_name = output
        .file_stem()
        .is_some_and(|stem| stem.to_ascii_lowercase().ends_with("_dir"));
    if args.split && !is_dir_name {
        return Err(CliError::InvalidSplitName { path: args.output }.into());
    }

    println_pad!(
        "{} {}",
        "📦 Packing:".bright_blue().bold(),
        input_dir.as_str().bright_cyan().bold()
    );

    let mut builder = PackageBuilder::new().with_preload_limit(args.preload);
    let count = collect_files(input_dir, &mut builder)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_str().is_empty()) {
        fs::create_dir_all(parent).into_diagnostic()?;
    }

    if args.split {
        let volume = builder.write_split(&output).map_err(CliError::from)?;
        println_pad!(
            "{} {}",
            "📁 Volume:".bright_yellow(),
            volume.as_str().bright_white()
        );
    } else {
        let mut writer = BufWriter::new(File::create(&output).into_diagnostic()?);
        builder.write(&mut writer).map_err(CliError::from)?;
    }

    println_pad!(
        "{} {} {}",
        "✅ Wrote".bright_green().bold(),
        output.as_str().bright_white().bold(),
        format!("({} files)", count).dimmed()
    );
    Ok(())
}
