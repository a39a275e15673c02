extern crate bmpsave;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use bmpsave::{BitmapEncoder, PixelBuffer, PixelSource};
use bmpsave::save::save_bitmap_or_remove;
use bmpsave::pixels::{IndexedImage, RawSource};
use clap::{Parser, Subcommand};

#[derive(Subcommand)]
enum CliCommand {
    /// Re-encodes a bitmap as uncompressed 24-bit
    Convert {
        /// Bitmap to read
        input: PathBuf,
        /// Output file
        output: PathBuf,
    },
    /// Writes an image of a single color
    Solid {
        width: u32,
        height: u32,
        /// Color as RRGGBB
        color: String,
        /// Output file
        output: PathBuf,
    },
    /// Renders 8-bit palette indices through a 768-byte RGB palette
    Indexed {
        /// Raw index data, one byte per pixel
        pixels: PathBuf,
        /// Palette file
        palette: PathBuf,
        width: u32,
        height: u32,
        /// Output file
        output: PathBuf,
    },
    /// Encodes little-endian 32-bit packed pixels (0xAARRGGBB)
    Raw {
        /// Pixel data
        input: PathBuf,
        width: u32,
        height: u32,
        /// Output file
        output: PathBuf,
    },
}

/// Writes uncompressed 24-bit BMP files
#[derive(Parser)]
struct Cli {
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,
    #[clap(long, default_value_t=0)]
    /// Horizontal resolution in pixels per meter
    x_ppm: i32,
    #[clap(long, default_value_t=0)]
    /// Vertical resolution in pixels per meter
    y_ppm: i32,
    #[command(subcommand)]
    command: CliCommand
}

fn parse_color(s: &str) -> Result<u32> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.bytes().all(|c| c.is_ascii_hexdigit()) {
        return Err(anyhow!("color '{}' is not of the form RRGGBB", s));
    }
    u32::from_str_radix(hex, 16).with_context(|| format!("color '{}' is not hexadecimal", s))
}

fn read_palette(path: &Path) -> Result<[u8; 768]> {
    let data = std::fs::read(path).with_context(|| format!("cannot read palette {}", path.display()))?;
    if data.len() < 768 {
        return Err(anyhow!("palette {} is {} bytes, need 768", path.display(), data.len()));
    }
    let mut palette = [ 0u8; 768 ];
    palette.copy_from_slice(&data[0..768]);
    Ok(palette)
}

fn save(encoder: &BitmapEncoder, source: &mut dyn PixelSource, output: &Path) -> Result<()> {
    save_bitmap_or_remove(encoder, source, output)
        .with_context(|| format!("cannot write {}", output.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let encoder = BitmapEncoder::new().with_resolution(args.x_ppm, args.y_ppm);

    match &args.command {
        CliCommand::Convert{ input, output } => {
            let mut image = bmp::open(input)
                .map_err(|e| anyhow!("cannot decode {}: {}", input.display(), e))?;
            save(&encoder, &mut image, output)
        },
        CliCommand::Solid{ width, height, color, output } => {
            let color = parse_color(color)?;
            let mut buffer = PixelBuffer::solid(*width, *height, color)?;
            save(&encoder, &mut buffer, output)
        },
        CliCommand::Indexed{ pixels, palette, width, height, output } => {
            let palette = read_palette(palette)?;
            let bits = std::fs::read(pixels).with_context(|| format!("cannot read {}", pixels.display()))?;
            let mut image = IndexedImage::new(*width, *height, &bits, &palette)?;
            save(&encoder, &mut image, output)
        },
        CliCommand::Raw{ input, width, height, output } => {
            let file = File::open(input).with_context(|| format!("cannot open {}", input.display()))?;
            let mut source = RawSource::new(*width, *height, BufReader::new(file));
            save(&encoder, &mut source, output)
        },
    }
}
