use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::encoder::BitmapEncoder;
use crate::error::{EncodeError, Result};
use crate::headers::BitmapLayout;
use crate::pixels::{self, PixelSource};

/// Captures `source` and writes it to `path` as a 24-bit bitmap.
///
/// The pixels are grabbed before the file is created, so a failing source
/// leaves nothing on disk. On any later failure the file is left as-is and
/// must be treated as invalid by the caller.
pub fn save_bitmap(encoder: &BitmapEncoder, source: &mut dyn PixelSource, path: &Path) -> Result<BitmapLayout> {
    save_with(encoder, source, path, |p: &Path| File::create(p), |file: File| file.sync_all())
}

/// Like `save_bitmap`, but removes the output again if writing it failed.
pub fn save_bitmap_or_remove(encoder: &BitmapEncoder, source: &mut dyn PixelSource, path: &Path) -> Result<BitmapLayout> {
    let result = save_bitmap(encoder, source, path);
    if let Err(e) = &result {
        discard_incomplete(path, e);
    }
    result
}

/// Removes what a failed save left at `path`. Only failures after the
/// output was created leave anything of ours behind; a file that was
/// already there when the save bailed out earlier is not touched.
/// Returns whether a file was removed.
pub fn discard_incomplete(path: &Path, err: &EncodeError) -> bool {
    if !matches!(err, EncodeError::Io(_) | EncodeError::Header{ .. }) {
        return false;
    }
    match std::fs::remove_file(path) {
        Ok(()) => {
            log::debug!("{}: removed incomplete output", path.display());
            true
        },
        Err(e) => {
            log::warn!("{}: unable to remove incomplete output: {}", path.display(), e);
            false
        }
    }
}

fn save_with<W, C, F>(encoder: &BitmapEncoder, source: &mut dyn PixelSource, path: &Path, create: C, close: F) -> Result<BitmapLayout>
where
    W: Write,
    C: FnOnce(&Path) -> io::Result<W>,
    F: FnOnce(W) -> io::Result<()>,
{
    let buffer = pixels::capture(source)?;

    let sink = create(path).map_err(EncodeError::Create)?;
    let mut out = BufWriter::new(sink);
    let result = encoder.encode_buffer(&buffer, &mut out)
        .and_then(|layout| { out.flush()?; Ok(layout) });

    // Whatever happens while closing must not hide the outcome of the write
    match out.into_inner() {
        Ok(sink) => {
            if let Err(e) = close(sink) {
                log::warn!("{}: error while closing: {}", path.display(), e);
            }
        },
        Err(e) => {
            log::warn!("{}: error while closing: {}", path.display(), e.error());
        }
    }

    if let Ok(layout) = &result {
        log::info!("{}: wrote {}x{} bitmap, {} bytes", path.display(), layout.width, layout.height, layout.file_size);
    }
    result
}
