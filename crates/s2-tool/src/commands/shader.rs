use super::LoaderArgs;
use crate::errors::CliError;
use crate::println_pad;
use crate::utils::config::load_config;
use crate::utils::format_size;
use colored::Colorize;
use miette::Result;
use s2_vfs::Platform;

pub struct ShaderArgs {
    pub name: String,
    pub loader: LoaderArgs,
}

pub fn show_shader(args: ShaderArgs) -> Result<()> {
    let preferred = match load_config().default_platform {
        Some(name) => Some(
            Platform::from_name(&name).ok_or(CliError::InvalidPlatform { name })?,
        ),
        None => None,
    };

    args.loader.with_loader(|loader| {
        let collection = loader.load_shader(&args.name);

        let (Some(platform), Some(model)) = (collection.platform(), collection.model()) else {
            return Err(CliError::ShaderNotFound { name: args.name.clone() }.into());
        };

        println_pad!(
            "{} {} {}",
            "🎨 Shader:".bright_blue().bold(),
            args.name.bright_cyan().bold(),
            format!("({}, model {})", platform, model).dimmed()
        );
        if let Some(preferred) = preferred.filter(|p| *p != platform) {
            println_pad!(
                "{}",
                format!(
                    "   Note: no {} variant found; using {} instead",
                    preferred, platform
                )
                .bright_yellow()
            );
        }

        println_pad!("\n{}", "🧩 Stages:".bright_magenta().bold());
        for file in collection.iter() {
            println_pad!(
                "   {} {} {}",
                "•".bright_cyan(),
                file.program.to_string().bright_white().bold(),
                format!("(v{}, {})", file.version, format_size(file.data.len() as u64)).dimmed()
            );
        }

        Ok(())
    })
}
