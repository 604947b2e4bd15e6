use super::LoaderArgs;
use crate::errors::CliError;
use crate::println_pad;
use colored::Colorize;
use miette::Result;
use s2_vfs::Resolved;

pub struct ResolveArgs {
    pub path: String,
    pub loader: LoaderArgs,
}

pub fn resolve_file(args: ResolveArgs) -> Result<()> {
    args.loader.with_loader(|loader| {
        match loader.resolve(&args.path) {
            Resolved::OnDisk(path) => {
                println_pad!(
                    "{} {}",
                    "📄 On disk:".bright_green().bold(),
                    path.as_str().bright_white()
                );
            }
            Resolved::InArchive { archive, entry } => {
                println_pad!(
                    "{} {}",
                    "📦 In package:".bright_blue().bold(),
                    archive.path().bright_cyan()
                );
                println_pad!(
                    "{} {} {}",
                    "   Entry:".bright_yellow(),
                    entry.full_path().bright_white().bold(),
                    format!("({} bytes, crc {:08x})", entry.total_length(), entry.crc32).dimmed()
                );
            }
            Resolved::NotFound => {
                return Err(CliError::NotFound { path: args.path.clone() }.into());
            }
        }

        Ok(())
    })
}
