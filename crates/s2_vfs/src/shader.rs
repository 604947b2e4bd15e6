//! Compiled shader lookup.
//!
//! A shader `foo.vfx` compiles to one `.vcs` file per program stage, platform and
//! shader model: `shaders/vfx/foo_{platform}_{model}_{program}.vcs`. The `features`
//! file picks the variant; the other stages are then loaded for that same variant.

use crate::error::{Error, Result};
use std::fmt;

/// `vcs2` in little-endian.
pub const VCS_MAGIC: u32 = 0x3273_6376;

const SHADER_DIRECTORY: &str = "shaders/vfx";

/// Target platform of a compiled shader, in lookup preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Platform {
    Pc,
    PcGl,
    MobileGles,
    Vulkan,
    AndroidVulkan,
    IosVulkan,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::Pc,
        Platform::PcGl,
        Platform::MobileGles,
        Platform::Vulkan,
        Platform::AndroidVulkan,
        Platform::IosVulkan,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Platform::Pc => "pc",
            Platform::PcGl => "pcgl",
            Platform::MobileGles => "mobile_gles",
            Platform::Vulkan => "vulkan",
            Platform::AndroidVulkan => "android_vulkan",
            Platform::IosVulkan => "ios_vulkan",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shader model, ordered from oldest to newest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Model {
    Sm20,
    Sm2b,
    Sm30,
    Sm31,
    Sm40,
    Sm41,
    Sm50,
    Sm60,
}

impl Model {
    pub const ALL: [Model; 8] = [
        Model::Sm20,
        Model::Sm2b,
        Model::Sm30,
        Model::Sm31,
        Model::Sm40,
        Model::Sm41,
        Model::Sm50,
        Model::Sm60,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Model::Sm20 => "20",
            Model::Sm2b => "2b",
            Model::Sm30 => "30",
            Model::Sm31 => "31",
            Model::Sm40 => "40",
            Model::Sm41 => "41",
            Model::Sm50 => "50",
            Model::Sm60 => "60",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProgramType {
    Features,
    Vertex,
    Pixel,
    Geometry,
    Hull,
    Domain,
    Compute,
    PixelShaderRenderState,
    RayTracing,
}

impl ProgramType {
    pub const ALL: [ProgramType; 9] = [
        ProgramType::Features,
        ProgramType::Vertex,
        ProgramType::Pixel,
        ProgramType::Geometry,
        ProgramType::Hull,
        ProgramType::Domain,
        ProgramType::Compute,
        ProgramType::PixelShaderRenderState,
        ProgramType::RayTracing,
    ];

    /// File name suffix of this stage.
    pub fn name(self) -> &'static str {
        match self {
            ProgramType::Features => "features",
            ProgramType::Vertex => "vs",
            ProgramType::Pixel => "ps",
            ProgramType::Geometry => "gs",
            ProgramType::Hull => "hs",
            ProgramType::Domain => "ds",
            ProgramType::Compute => "cs",
            ProgramType::PixelShaderRenderState => "psrs",
            ProgramType::RayTracing => "rtx",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for ProgramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lowercased shader name without directory or `.vfx` extension.
pub fn base_shader_name(name: &str) -> String {
    let name = name.replace('\\', "/").to_ascii_lowercase();
    let name = name.rsplit('/').next().unwrap_or_default();
    name.strip_suffix(".vfx").unwrap_or(name).to_string()
}

/// Logical path of one compiled variant.
pub fn shader_file_path(
    shader: &str,
    program: ProgramType,
    platform: Platform,
    model: Model,
) -> String {
    format!(
        "{}/{}_{}_{}_{}.vcs",
        SHADER_DIRECTORY,
        base_shader_name(shader),
        platform.name(),
        model.name(),
        program.name()
    )
}

/// Split `foo_vulkan_60_ps.vcs` into its shader name and variant.
pub fn parse_shader_file_name(file_name: &str) -> Option<(String, Platform, Model, ProgramType)> {
    let lower = file_name.to_ascii_lowercase();
    let stem = lower.strip_suffix(".vcs")?;

    let (rest, program) = stem.rsplit_once('_')?;
    let program = ProgramType::from_name(program)?;
    let (rest, model) = rest.rsplit_once('_')?;
    let model = Model::from_name(model)?;

    // Platform names contain underscores; try the longest first so `android_vulkan`
    // is not read as `vulkan`.
    let mut platforms = Platform::ALL;
    platforms.sort_by_key(|p| std::cmp::Reverse(p.name().len()));
    platforms.into_iter().find_map(|platform| {
        let shader = rest.strip_suffix(platform.name())?.strip_suffix('_')?;
        (!shader.is_empty()).then(|| (shader.to_string(), platform, model, program))
    })
}

/// One compiled stage of a shader.
#[derive(Debug, Clone)]
pub struct ShaderFile {
    pub shader_name: String,
    pub platform: Platform,
    pub model: Model,
    pub program: ProgramType,
    /// File format version from the header.
    pub version: u32,
    pub data: Vec<u8>,
}

impl ShaderFile {
    /// Validate the header and read the variant from the file name.
    pub fn parse(file_name: &str, data: Vec<u8>) -> Result<Self> {
        let (shader_name, platform, model, program) = parse_shader_file_name(file_name)
            .ok_or_else(|| {
                Error::InvalidShader(format!("unrecognized file name {}", file_name))
            })?;

        let header = data
            .get(..8)
            .ok_or_else(|| Error::InvalidShader(format!("{} is truncated", file_name)))?;
        let magic = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        if magic != VCS_MAGIC {
            return Err(Error::InvalidShader(format!(
                "{} has bad magic {:#010x}",
                file_name, magic
            )));
        }
        let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        Ok(Self {
            shader_name,
            platform,
            model,
            program,
            version,
            data,
        })
    }
}

/// Every stage found for one variant of a shader. Empty when nothing was found.
#[derive(Debug, Clone, Default)]
pub struct ShaderCollection {
    files: Vec<ShaderFile>,
}

impl ShaderCollection {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShaderFile> {
        self.files.iter()
    }

    pub fn get(&self, program: ProgramType) -> Option<&ShaderFile> {
        self.files.iter().find(|f| f.program == program)
    }

    pub fn features(&self) -> Option<&ShaderFile> {
        self.get(ProgramType::Features)
    }

    pub fn platform(&self) -> Option<Platform> {
        self.features().map(|f| f.platform)
    }

    pub fn model(&self) -> Option<Model> {
        self.features().map(|f| f.model)
    }
}

/// Find the best variant of `shader_name` and collect all of its stages.
///
/// `load` resolves a logical path to `(file name, bytes)`. Platforms are tried in
/// [`Platform::ALL`] order and, for each, models from newest to oldest. The first
/// `features` file that parses and whose platform matches wins.
pub fn resolve_shader<F>(shader_name: &str, mut load: F) -> ShaderCollection
where
    F: FnMut(&str) -> Option<(String, Vec<u8>)>,
{
    let base = base_shader_name(shader_name);

    let mut accepted = None;
    'search: for platform in Platform::ALL {
        for model in Model::ALL.into_iter().rev() {
            let path = shader_file_path(&base, ProgramType::Features, platform, model);
            let Some((file_name, data)) = load(&path) else {
                continue;
            };

            match ShaderFile::parse(&file_name, data) {
                Ok(file) if file.platform == platform => {
                    accepted = Some((file, platform, model));
                    break 'search;
                }
                Ok(file) => tracing::debug!(
                    "Ignoring {}: platform {} does not match {}",
                    path,
                    file.platform,
                    platform
                ),
                Err(e) => tracing::debug!("Ignoring {}: {}", path, e),
            }
        }
    }

    let Some((features, platform, model)) = accepted else {
        tracing::error!("Failed to find shader {}", shader_name);
        return ShaderCollection::default();
    };
    tracing::debug!("Using {} variant {}_{}", base, platform, model);

    let mut files = vec![features];
    for program in ProgramType::ALL.into_iter().skip(1) {
        let path = shader_file_path(&base, program, platform, model);
        let Some((file_name, data)) = load(&path) else {
            continue;
        };
        match ShaderFile::parse(&file_name, data) {
            Ok(file) => files.push(file),
            Err(e) => tracing::warn!("Skipping {}: {}", path, e),
        }
    }

    ShaderCollection { files }
}
