use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("File not found: {path}")]
    #[diagnostic(
        code(file::not_found),
        help("Make sure the file exists and the path is correct")
    )]
    FileNotFound { path: PathBuf },

    #[error("Could not resolve '{path}'")]
    #[diagnostic(
        code(resolve::not_found),
        help("Pass --file or --archive so the game folders can be discovered, or add search roots with --root")
    )]
    NotFound { path: String },

    #[error("No file to discover from")]
    #[diagnostic(
        code(discover::missing_context),
        help("Pass --file <path> or --archive <path.vpk>")
    )]
    MissingContext,

    #[error("Shader '{name}' has no compiled variants")]
    #[diagnostic(
        code(shader::not_found),
        help("Compiled shaders live in shaders/vfx/ inside the game folders or in shaders_<platform>_dir.vpk")
    )]
    ShaderNotFound { name: String },

    #[error("Unknown shader platform: {name}")]
    #[diagnostic(
        code(config::invalid_platform),
        help("Use one of: pc, pcgl, mobile_gles, vulkan, android_vulkan, ios_vulkan")
    )]
    InvalidPlatform { name: String },

    #[error("Checksum mismatch for {path}")]
    #[diagnostic(
        code(extract::checksum_mismatch),
        help("The package may be damaged or its volumes may belong to a different version")
    )]
    ChecksumMismatch { path: String, expected: u32, actual: u32 },

    #[error("Split package name must end with _dir.vpk: {path}")]
    #[diagnostic(
        code(pack::invalid_split_name),
        help("Name the output like pak01_dir.vpk; the volume is written next to it as pak01_000.vpk")
    )]
    InvalidSplitName { path: String },

    #[error("Failed to save config")]
    #[diagnostic(code(config::save_failed))]
    ConfigSaveFailed {
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(code(vfs::error))]
    Vfs(#[from] s2_vfs::Error),

    #[error(transparent)]
    #[diagnostic(code(vpk::error))]
    Vpk(#[from] s2_vpk::VpkError),

    #[error("IO operation failed")]
    #[diagnostic(code(io::operation_failed))]
    IoError {
        #[from]
        source: std::io::Error,
    },
}
