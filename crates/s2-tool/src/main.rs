use clap::builder::{styling::AnsiColor, Styles};
use clap::ColorChoice;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::{
    discover_roots, extract_file, list_package, manage_config, pack_directory, resolve_file,
    show_shader, ConfigArgs, DiscoverArgs, ExtractArgs, ListArgs, LoaderArgs, PackArgs,
    ResolveArgs, ShaderArgs,
};
use miette::Result;

mod commands;
mod errors;
mod utils;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Show debug logs from the resolver
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show where a logical path resolves to
    Resolve {
        /// Logical path, e.g. materials/dev/dev_floor.vmat_c
        path: String,

        #[command(flatten)]
        loader: LoaderArgs,
    },
    /// Resolve a logical path and write its bytes to disk
    Extract {
        /// Logical path to extract
        path: String,

        /// Output file (defaults to the file name in the current directory)
        #[arg(short, long)]
        output: Option<String>,

        /// Check the CRC of files read from packages
        #[arg(long)]
        verify: bool,

        #[command(flatten)]
        loader: LoaderArgs,
    },
    /// Find the best compiled variant of a shader and list its stages
    Shader {
        /// Shader name, e.g. complex.vfx
        name: String,

        #[command(flatten)]
        loader: LoaderArgs,
    },
    /// Show the search roots discovered for a file
    Discover {
        #[command(flatten)]
        loader: LoaderArgs,
    },
    /// List the entries of a VPK package
    List {
        /// The package to list
        file_path: String,

        /// Only show entries with this extension
        #[arg(short, long)]
        extension: Option<String>,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Pack a directory into a VPK package
    Pack {
        /// Directory to pack
        input_dir: String,

        /// Output package path
        #[arg(short, long)]
        output: String,

        /// Write a `_dir.vpk` plus `_000.vpk` volume instead of a single file
        #[arg(long)]
        split: bool,

        /// Bytes of each file stored inline in the directory tree
        #[arg(long, default_value_t = 0)]
        preload: usize,
    },
    /// Show or change the tool configuration
    Config {
        /// Print the current configuration
        #[arg(long)]
        show: bool,

        /// Add a folder or .vpk to the default search roots
        #[arg(long)]
        add_root: Option<String>,

        /// Remove all default search roots
        #[arg(long)]
        clear_roots: bool,

        /// Preferred shader platform (pc, vulkan, ...)
        #[arg(long)]
        default_platform: Option<String>,
    },
}

fn parse_args() -> Result<Args> {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Blue.on_default());

    let matches = Args::command()
        .styles(styles)
        .color(ColorChoice::Auto)
        .get_matches();

    Args::from_arg_matches(&matches).map_err(|e| miette::miette!("{}", e))
}

fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("s2_tool=debug,s2_vfs=debug,s2_vpk=debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "s2_tool=info,s2_vfs=info".into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = parse_args()?;
    init_logging(args.verbose);

    match args.command {
        Commands::Resolve { path, loader } => resolve_file(ResolveArgs { path, loader }),
        Commands::Extract {
            path,
            output,
            verify,
            loader,
        } => extract_file(ExtractArgs {
            path,
            output,
            verify,
            loader,
        }),
        Commands::Shader { name, loader } => show_shader(ShaderArgs { name, loader }),
        Commands::Discover { loader } => discover_roots(DiscoverArgs { loader }),
        Commands::List {
            file_path,
            extension,
            json,
        } => list_package(ListArgs {
            file_path,
            extension,
            json,
        }),
        Commands::Pack {
            input_dir,
            output,
            split,
            preload,
        } => pack_directory(PackArgs {
            input_dir,
            output,
            split,
            preload,
        }),
        Commands::Config {
            show,
            add_root,
            clear_roots,
            default_platform,
        } => manage_config(ConfigArgs {
            show,
            add_root,
            clear_roots,
            default_platform,
        }),
    }
}
