use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use bytes::BufMut;
use log::debug;

use crate::{
    DibErr, Result,
    header::{self, DibHeader, FILE_HEADER_SIZE, INFO_HEADER_SIZE, Masks},
};

/// A single pixel color.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(v: u8) -> Self {
        Self::new(v, v, v)
    }
}

/// An image held in memory as rows of pixels, the first row being the top of the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl Bitmap {
    /// Creates a new `Bitmap`.
    ///
    /// # Arguments
    /// * `width` - The amount of pixels per row.
    /// * `height` - The amount of rows.
    /// * `pixels` - The pixels, row by row starting from the top left corner.
    ///
    /// # Returns
    /// The bitmap or an error if the dimensions are empty, too large for the file format or
    /// don't match the amount of pixels.
    pub fn new(width: u32, height: u32, pixels: Vec<Rgb>) -> Result<Self> {
        let invalid = || DibErr::InvalidDimensions {
            width: width.into(),
            height: height.into(),
        };

        if width == 0 || height == 0 || width > i32::MAX as u32 || height > i32::MAX as u32 {
            return Err(invalid());
        }

        let expected = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(invalid)?;

        if pixels.len() != expected {
            return Err(DibErr::ActivationCount {
                got: pixels.len(),
                expected,
            });
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// The pixels, row by row starting from the top left corner.
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }

        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Opens and decodes the bitmap file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("opening bitmap {}", path.display());

        Self::read(BufReader::new(File::open(path)?))
    }

    /// Reads and decodes a whole bitmap file from `reader`.
    pub fn read<R: Read>(mut reader: R) -> Result<Self> {
        let mut file = Vec::new();
        reader.read_to_end(&mut file)?;
        Self::from_bytes(&file)
    }

    /// Decodes an in memory bitmap file.
    pub fn from_bytes(file: &[u8]) -> Result<Self> {
        let header = DibHeader::parse(file)?;
        let DibHeader {
            width,
            height,
            top_down,
            bit_count,
            ..
        } = header;

        let invalid = || DibErr::InvalidDimensions {
            width: width as i64,
            height: height as i64,
        };

        let stride = header::row_stride(width, bit_count);
        let size = stride.checked_mul(height).ok_or_else(invalid)?;
        let data = &file[header.pixel_offset..];
        if data.len() < size {
            return Err(DibErr::Truncated { what: "pixel data" });
        }

        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            let row = if top_down { y } else { height - 1 - y };
            let row = &data[row * stride..(row + 1) * stride];

            pixels.extend((0..width).map(|x| decode_pixel(&header, row, x)));
        }

        debug!(width = width, height = height, bit_count = bit_count; "decoded bitmap");

        Self::new(width as u32, height as u32, pixels)
    }

    /// Encodes this bitmap as an uncompressed, bottom-up, 24 bit bitmap file.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let (width, height) = (self.width as usize, self.height as usize);
        let stride = header::row_stride(width, 24);

        let image_size = stride
            .checked_mul(height)
            .filter(|&n| n + FILE_HEADER_SIZE + INFO_HEADER_SIZE <= u32::MAX as usize)
            .ok_or(DibErr::InvalidDimensions {
                width: width as i64,
                height: height as i64,
            })?;

        let mut buf = Vec::with_capacity(FILE_HEADER_SIZE + INFO_HEADER_SIZE + image_size);
        DibHeader::put_rgb24(
            &mut buf,
            self.width as i32,
            self.height as i32,
            image_size as u32,
        );

        let padding = stride - width * 3;
        for row in self.pixels.chunks(width).rev() {
            for px in row {
                buf.put_slice(&[px.b, px.g, px.r]);
            }

            buf.put_bytes(0, padding);
        }

        Ok(buf)
    }

    /// Writes this bitmap to `writer` as a 24 bit bitmap file.
    pub fn write<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.to_bytes()?)?;
        writer.flush()?;
        Ok(())
    }

    /// Creates or truncates the file at `path` and writes this bitmap into it.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        debug!(
            "saving {}x{} bitmap to {}",
            self.width,
            self.height,
            path.display()
        );

        self.write(BufWriter::new(File::create(path)?))
    }
}

fn decode_pixel(header: &DibHeader, row: &[u8], x: usize) -> Rgb {
    match header.bit_count {
        24 => {
            let px = &row[x * 3..x * 3 + 3];
            Rgb::new(px[2], px[1], px[0])
        }
        32 => {
            let px = &row[x * 4..x * 4 + 4];

            match header.masks {
                Some(masks) => unpack(u32::from_le_bytes([px[0], px[1], px[2], px[3]]), masks),
                None => Rgb::new(px[2], px[1], px[0]),
            }
        }
        bits => {
            let bits = bits as usize;
            let per_byte = 8 / bits;
            let byte = row[x / per_byte];
            let shift = 8 - bits * (x % per_byte + 1);
            let index = (byte >> shift) & ((1 << bits) - 1) as u8;

            // Out of range indices read as black.
            header
                .palette
                .get(index as usize)
                .copied()
                .unwrap_or_default()
        }
    }
}

fn unpack(px: u32, masks: Masks) -> Rgb {
    Rgb::new(channel(px, masks.r), channel(px, masks.g), channel(px, masks.b))
}

/// Extracts a channel and scales it to 8 bits.
fn channel(px: u32, mask: u32) -> u8 {
    if mask == 0 {
        return 0;
    }

    let shift = mask.trailing_zeros();
    let max = (mask >> shift) as u64;
    let v = ((px & mask) >> shift) as u64;

    ((v * 255 + max / 2) / max) as u8
}
