//! Command-line interface for packing, unpacking and editing variant containers

use crate::diff::blocks::DiffOptions;
use crate::diff::pack::pack_images_with;
use crate::diff::patch::apply_patches;
use crate::format::codec::serialize;
use crate::format::compression::Zlib;
use crate::format::mutator::{add_variants, remove_variants, write_container_file};
use crate::format::reader::ContainerFile;
use crate::io::configuration::{
    CONTAINER_EXTENSION, DEFAULT_BLOCK_SIZE, DEFAULT_COLOR_DISTANCE, DEFAULT_COMPRESSION_LEVEL,
    DEFAULT_DIFF_THRESHOLD, DEFAULT_OUTPUT_FORMAT, DEFAULT_TOLERANCE_RATIO,
};
use crate::io::error::{IoContext, PackError, Result};
use crate::io::image::{ChannelLayout, load_pixel_buffer, save_pixel_buffer};
use crate::io::input::{InputSpec, NamedInput, resolve_inputs};
use crate::io::progress::ProgressManager;
use crate::model::PixelBuffer;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Component, Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "charpack")]
#[command(
    author,
    version,
    about = "Pack many near-identical images into one base image plus per-variant patches"
)]
/// Command-line arguments for the container tool
pub struct Cli {
    /// Operation to run
    #[command(subcommand)]
    pub command: Command,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log pack, add and remove summaries
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Default log filter directive when `RUST_LOG` is unset
    pub const fn log_level(&self) -> &'static str {
        if self.verbose { "info" } else { "warn" }
    }
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a container from images; the first input becomes the base image
    Pack {
        /// Image files, directories, or NAME=PATH pairs
        #[arg(required = true, value_name = "INPUT")]
        inputs: Vec<InputSpec>,

        /// Container file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Differencing and compression settings
        #[command(flatten)]
        diff: DiffArgs,
    },
    /// Write every variant (or a selection) as image files
    Unpack {
        /// Container file to read
        container: PathBuf,

        /// Directory receiving one image per variant
        #[arg(short, long)]
        output: PathBuf,

        /// Image format of the written files
        #[arg(short, long, value_enum, default_value = DEFAULT_OUTPUT_FORMAT)]
        format: OutputFormat,

        /// Only write these variants
        #[arg(long, num_args = 1.., value_name = "NAME")]
        only: Vec<String>,
    },
    /// Write a single variant as an image file
    Extract {
        /// Container file to read
        container: PathBuf,

        /// Variant to rebuild
        name: String,

        /// Image file to write; the format follows the extension
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Difference new images against a container's base and append them
    Add {
        /// Container file to update
        container: PathBuf,

        /// Image files, directories, or NAME=PATH pairs
        #[arg(required = true, value_name = "INPUT")]
        inputs: Vec<InputSpec>,

        /// Differencing and compression settings
        #[command(flatten)]
        diff: DiffArgs,
    },
    /// Drop variants from a container's index
    Remove {
        /// Container file to update
        container: PathBuf,

        /// Variants to drop
        #[arg(required = true, value_name = "NAME")]
        names: Vec<String>,
    },
    /// Print the container's shape and index
    List {
        /// Container file to read
        container: PathBuf,
    },
}

/// Differencing and compression flags shared by `pack` and `add`
#[derive(Args, Clone, Debug)]
pub struct DiffArgs {
    /// Edge length of the square comparison blocks
    #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
    pub block_size: u32,

    /// Largest per-channel difference still treated as equal
    #[arg(short, long, default_value_t = DEFAULT_DIFF_THRESHOLD)]
    pub diff_threshold: u8,

    /// Largest RGB distance still treated as equal; overrides --diff-threshold when non-zero
    #[arg(short, long, default_value_t = DEFAULT_COLOR_DISTANCE)]
    pub color_distance: f64,

    /// Fraction of differing pixels a block may hold and still count as unchanged
    #[arg(short, long, default_value_t = DEFAULT_TOLERANCE_RATIO)]
    pub tolerance_ratio: f64,

    /// Zlib compression level (0-9)
    #[arg(short, long, default_value_t = DEFAULT_COMPRESSION_LEVEL)]
    pub level: u32,

    /// Decode images as RGB, discarding alpha
    #[arg(long)]
    pub rgb: bool,
}

impl DiffArgs {
    /// Differencing options described by the flags
    pub fn options(&self) -> DiffOptions {
        DiffOptions::from_thresholds(
            self.block_size,
            self.diff_threshold,
            self.color_distance,
            self.tolerance_ratio,
        )
    }

    /// Compressor at the requested level
    ///
    /// # Errors
    ///
    /// Returns an error if the level is out of range
    pub fn compressor(&self) -> Result<Zlib> {
        Zlib::new(self.level)
    }

    /// Channel layout images are decoded into
    pub const fn layout(&self) -> ChannelLayout {
        if self.rgb {
            ChannelLayout::Rgb
        } else {
            ChannelLayout::Rgba
        }
    }
}

/// Image format for unpacked variants
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Lossless PNG
    Png,
    /// JPEG (alpha dropped)
    Jpg,
    /// Lossless WebP
    Webp,
}

impl OutputFormat {
    /// File extension for this format
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Webp => "webp",
        }
    }
}

/// Container path with the default extension added when none was given
pub fn container_path(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(CONTAINER_EXTENSION)
    }
}

/// File an unpacked variant is written to inside `output`
///
/// Names come from the container, so anything that is not a single plain
/// file name is refused rather than joined.
///
/// # Errors
///
/// Returns [`PackError::InvalidVariantName`] if the name is empty, is `.` or
/// `..`, is absolute, or contains a path separator, drive colon or NUL
pub fn variant_file_path(output: &Path, name: &str, format: OutputFormat) -> Result<PathBuf> {
    let mut components = Path::new(name).components();
    let plain = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !plain || name.contains(['/', '\\', ':', '\0']) {
        return Err(PackError::InvalidVariantName {
            name: name.to_string(),
        });
    }
    Ok(output.join(format!("{name}.{}", format.extension())))
}

/// Executes one parsed command line
pub struct CommandRunner {
    cli: Cli,
}

impl CommandRunner {
    /// Create a runner for the given CLI arguments
    pub const fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the selected subcommand
    ///
    /// # Errors
    ///
    /// Returns an error if inputs cannot be resolved or loaded, the container
    /// is invalid, or any file cannot be written
    pub fn run(&self) -> Result<()> {
        match &self.cli.command {
            Command::Pack {
                inputs,
                output,
                diff,
            } => self.pack(inputs, output, diff),
            Command::Unpack {
                container,
                output,
                format,
                only,
            } => self.unpack(container, output, *format, only),
            Command::Extract {
                container,
                name,
                output,
            } => Self::extract(container, name, output),
            Command::Add {
                container,
                inputs,
                diff,
            } => self.add(container, inputs, diff),
            Command::Remove { container, names } => Self::remove(container, names),
            Command::List { container } => Self::list(container),
        }
    }

    fn pack(&self, inputs: &[InputSpec], output: &Path, diff: &DiffArgs) -> Result<()> {
        let options = diff.options();
        options.validate()?;
        let compressor = diff.compressor()?;

        let images = self.load_images(&resolve_inputs(inputs)?, diff.layout())?;
        let mut progress =
            ProgressManager::new(images.len(), "Differencing", self.cli.should_show_progress());
        let container =
            pack_images_with(images, &options, |variant| progress.advance(&variant.name))?;
        progress.finish();

        let output = container_path(output);
        let bytes = serialize(&container, &compressor)?;
        write_container_file(&output, &bytes)?;

        info!(
            path = %output.display(),
            variants = container.variants().len(),
            bytes = bytes.len(),
            "Wrote container"
        );
        Ok(())
    }

    fn unpack(
        &self,
        container: &Path,
        output: &Path,
        format: OutputFormat,
        only: &[String],
    ) -> Result<()> {
        let file = ContainerFile::open(container)?;
        let compressor = Zlib::default();

        let names: Vec<String> = if only.is_empty() {
            file.names().map(str::to_string).collect()
        } else {
            only.to_vec()
        };
        let targets = names
            .iter()
            .map(|name| -> Result<(&str, PathBuf)> {
                file.header().find(name)?;
                Ok((name.as_str(), variant_file_path(output, name, format)?))
            })
            .collect::<Result<Vec<_>>>()?;

        std::fs::create_dir_all(output).io_context("create directory", output)?;
        let base = file.base_image(&compressor)?;
        let mut progress =
            ProgressManager::new(names.len(), "Unpacking", self.cli.should_show_progress());

        for (name, path) in &targets {
            let variant = file.read_variant(name, &compressor)?;
            let image = apply_patches(&base, &variant.patches)?;
            save_pixel_buffer(&image, path)?;
            progress.advance(name);
        }
        progress.finish();

        info!(
            path = %output.display(),
            variants = names.len(),
            "Unpacked container"
        );
        Ok(())
    }

    fn extract(container: &Path, name: &str, output: &Path) -> Result<()> {
        let image = ContainerFile::open(container)?.extract_variant(name, &Zlib::default())?;
        save_pixel_buffer(&image, output)
    }

    fn add(&self, container: &Path, inputs: &[InputSpec], diff: &DiffArgs) -> Result<()> {
        let compressor = diff.compressor()?;
        let images = self.load_images(&resolve_inputs(inputs)?, diff.layout())?;
        add_variants(container, &images, &diff.options(), &compressor)?;
        Ok(())
    }

    fn remove(container: &Path, names: &[String]) -> Result<()> {
        remove_variants(container, names)?;
        Ok(())
    }

    // Listing is the command's output
    #[allow(clippy::print_stdout)]
    fn list(container: &Path) -> Result<()> {
        let file = ContainerFile::open(container)?;
        let header = file.header();
        println!(
            "{}: {}x{}, {} channels, format version {}",
            container.display(),
            header.width,
            header.height,
            header.channels,
            header.version
        );

        let name_width = file.names().map(str::len).max().unwrap_or_default();
        for entry in file.entries() {
            println!(
                "{:<name_width$}  offset {:>10}  size {:>10}",
                entry.name, entry.offset, entry.size
            );
        }
        Ok(())
    }

    fn load_images(
        &self,
        inputs: &[NamedInput],
        layout: ChannelLayout,
    ) -> Result<Vec<(String, PixelBuffer)>> {
        let mut progress =
            ProgressManager::new(inputs.len(), "Loading", self.cli.should_show_progress());
        let mut images = Vec::with_capacity(inputs.len());
        for input in inputs {
            images.push((input.name.clone(), load_pixel_buffer(&input.path, layout)?));
            progress.advance(&input.name);
        }
        progress.finish();
        Ok(images)
    }
}
