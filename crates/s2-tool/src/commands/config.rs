use crate::errors::CliError;
use crate::utils::config::{self, AppConfig};
use camino::Utf8PathBuf;
use colored::Colorize;
use miette::Result;
use s2_vfs::Platform;

pub struct ConfigArgs {
    pub show: bool,
    pub add_root: Option<String>,
    pub clear_roots: bool,
    pub default_platform: Option<String>,
}

pub fn manage_config(args: ConfigArgs) -> Result<()> {
    let mut cfg = config::load_config();
    let mut changed = false;

    if args.clear_roots {
        cfg.search_roots.clear();
        changed = true;
        println!("{}", "✓ Search roots cleared".bright_green().bold());
    }

    if let Some(root) = args.add_root {
        let root = Utf8PathBuf::from(root);
        if !root.exists() {
            eprintln!(
                "  {} {} does not exist yet; adding anyway",
                "•".bright_yellow(),
                root
            );
        }
        if cfg.add_root(root.clone()) {
            changed = true;
            println!(
                "{} {}",
                "✓ Added search root".bright_green().bold(),
                root.as_str().bright_white()
            );
        } else {
            println!("{}", "Search root already configured".bright_yellow());
        }
    }

    if let Some(name) = args.default_platform {
        let platform = Platform::from_name(&name).ok_or(CliError::InvalidPlatform { name })?;
        cfg.default_platform = Some(platform.name().to_string());
        changed = true;
        println!(
            "{} {}",
            "✓ Default platform set to".bright_green().bold(),
            platform.name().bright_white()
        );
    }

    if changed {
        config::save_config(&cfg).map_err(|source| CliError::ConfigSaveFailed { source })?;
    }

    if args.show || !changed {
        show_config(&cfg);
    }
    Ok(())
}

fn show_config(cfg: &AppConfig) {
    let config_path = config::default_config_path()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    println!();
    println!("  {} {}", "config_file:".bright_white(), config_path);

    println!(
        "  {} {}",
        "default_platform:".bright_white(),
        cfg.default_platform
            .as_deref()
            .map(|p| p.normal())
            .unwrap_or_else(|| "(not set)".bright_yellow())
    );

    if cfg.search_roots.is_empty() {
        println!(
            "  {} {}",
            "search_roots:".bright_white(),
            "(none)".bright_yellow()
        );
    } else {
        println!("  {}", "search_roots:".bright_white());
        for root in &cfg.search_roots {
            let status = if root.exists() {
                "✓".bright_green()
            } else {
                "✗".bright_red()
            };
            println!("    {} {}", root, status);
        }
    }
    println!();
}
