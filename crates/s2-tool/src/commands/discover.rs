use super::LoaderArgs;
use crate::errors::CliError;
use crate::println_pad;
use colored::Colorize;
use miette::Result;
use s2_vfs::SearchRoot;

pub struct DiscoverArgs {
    pub loader: LoaderArgs,
}

pub fn discover_roots(args: DiscoverArgs) -> Result<()> {
    if !args.loader.has_context() {
        return Err(CliError::MissingContext.into());
    }

    args.loader.with_loader(|loader| {
        let roots = loader.search_roots_snapshot();

        if let Some(file) = loader.current_file() {
            println_pad!(
                "{} {}",
                "🔎 Search roots for:".bright_blue().bold(),
                file.as_str().bright_cyan().bold()
            );
        }

        if roots.is_empty() {
            println_pad!("{}", "   (no search roots found)".bright_yellow());
        }
        for (index, root) in roots.iter().enumerate() {
            let kind = match root {
                SearchRoot::LooseFolder(_) => "folder ".bright_green(),
                SearchRoot::ArchivePath(_) | SearchRoot::ArchiveHandle(_) => "package".bright_blue(),
            };
            let location = match root {
                SearchRoot::LooseFolder(path) | SearchRoot::ArchivePath(path) => path.to_string(),
                SearchRoot::ArchiveHandle(archive) => archive.path().to_string(),
            };
            println_pad!(
                "   {} {} {}",
                format!("{:>2}.", index + 1).dimmed(),
                kind,
                location.bright_white()
            );
        }

        println_pad!(
            "\n{} {}",
            "📦 Packages opened:".bright_magenta(),
            loader.cache().len().to_string().bright_white().bold()
        );

        Ok(())
    })
}
