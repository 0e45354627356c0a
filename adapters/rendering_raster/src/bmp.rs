//! Uncompressed 24-bit BMP encoding.

use std::io::{self, Write};

const FILE_HEADER_LEN: u32 = 14;
const INFO_HEADER_LEN: u32 = 40;
const BITS_PER_PIXEL: u16 = 24;
// 72 DPI expressed in pixels per metre.
const PIXELS_PER_METRE: i32 = 2_835;

/// Bytes per stored row, padded to a multiple of four.
pub(crate) fn row_stride(width: u32) -> u32 {
    (width * 3 + 3) & !3
}

/// Writes `pixels` (row-major, top row first, RGB) as a bottom-up BMP.
pub(crate) fn write_bmp(
    writer: &mut impl Write,
    width: u32,
    height: u32,
    pixels: &[[u8; 3]],
) -> io::Result<()> {
    let stride = row_stride(width);
    let image_len = stride * height;
    let offset = FILE_HEADER_LEN + INFO_HEADER_LEN;

    writer.write_all(b"BM")?;
    writer.write_all(&(offset + image_len).to_le_bytes())?;
    writer.write_all(&0u32.to_le_bytes())?;
    writer.write_all(&offset.to_le_bytes())?;

    writer.write_all(&INFO_HEADER_LEN.to_le_bytes())?;
    writer.write_all(&(width as i32).to_le_bytes())?;
    writer.write_all(&(height as i32).to_le_bytes())?;
    writer.write_all(&1u16.to_le_bytes())?;
    writer.write_all(&BITS_PER_PIXEL.to_le_bytes())?;
    writer.write_all(&0u32.to_le_bytes())?;
    writer.write_all(&image_len.to_le_bytes())?;
    writer.write_all(&PIXELS_PER_METRE.to_le_bytes())?;
    writer.write_all(&PIXELS_PER_METRE.to_le_bytes())?;
    writer.write_all(&0u32.to_le_bytes())?;
    writer.write_all(&0u32.to_le_bytes())?;

    let padding = vec![0u8; (stride - width * 3) as usize];
    let mut row_bytes = Vec::with_capacity(stride as usize);
    for row in pixels.chunks(width.max(1) as usize).rev() {
        row_bytes.clear();
        for [red, green, blue] in row {
            row_bytes.extend_from_slice(&[*blue, *green, *red]);
        }
        row_bytes.extend_from_slice(&padding);
        writer.write_all(&row_bytes)?;
    }
    Ok(())
}
