use bytes::{Buf, BufMut};
use log::debug;

use crate::{DibErr, Result, Rgb};

pub(crate) const FILE_HEADER_SIZE: usize = 14;
pub(crate) const INFO_HEADER_SIZE: usize = 40;

const MAGIC: &[u8; 2] = b"BM";
const BI_RGB: u32 = 0;
const BI_BITFIELDS: u32 = 3;
const V2_HEADER_SIZE: usize = 52;
const PIXELS_PER_METER: i32 = 2835;

/// How the pixels of a 32 bit bitmap are packed, one mask per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Masks {
    pub r: u32,
    pub g: u32,
    pub b: u32,
}

/// Everything needed to decode the pixel array of a bitmap file.
#[derive(Debug)]
pub(crate) struct DibHeader {
    pub width: usize,
    pub height: usize,
    pub top_down: bool,
    pub bit_count: u16,
    pub masks: Option<Masks>,
    pub palette: Vec<Rgb>,
    pub pixel_offset: usize,
}

impl DibHeader {
    /// Parses the file header, the info header and the color table of a bitmap file.
    pub(crate) fn parse(file: &[u8]) -> Result<Self> {
        let mut buf = file;

        need(buf, FILE_HEADER_SIZE, "file header")?;
        let magic = [buf.get_u8(), buf.get_u8()];
        if &magic != MAGIC {
            return Err(DibErr::NotABitmap { magic });
        }

        let _file_size = buf.get_u32_le();
        buf.advance(4); // reserved
        let pixel_offset = buf.get_u32_le() as usize;

        need(buf, 4, "info header")?;
        let header_size = buf.get_u32_le();
        let header_len = header_size as usize;
        if header_len < INFO_HEADER_SIZE {
            return Err(DibErr::UnsupportedHeader { size: header_size });
        }

        need(buf, header_len - 4, "info header")?;
        let mut info = &buf[..header_len - 4];
        buf.advance(header_len - 4);

        let width = info.get_i32_le();
        let height = info.get_i32_le();
        let _planes = info.get_u16_le();
        let bit_count = info.get_u16_le();
        let compression = info.get_u32_le();
        let _image_size = info.get_u32_le();
        info.advance(8); // resolution
        let colors_used = info.get_u32_le();
        let _colors_important = info.get_u32_le();

        debug!(width = width, height = height, bit_count = bit_count; "read bitmap info header");

        if width <= 0 || height == 0 || height == i32::MIN {
            return Err(DibErr::InvalidDimensions {
                width: width.into(),
                height: height.into(),
            });
        }

        let masks = match (compression, bit_count) {
            (BI_RGB, 1 | 4 | 8 | 24 | 32) => None,
            (BI_RGB, _) => return Err(DibErr::UnsupportedBitCount { bit_count }),
            (BI_BITFIELDS, 32) => {
                // Newer headers hold the masks, the plain info header is followed by them.
                let mut masks = if header_len >= V2_HEADER_SIZE {
                    info
                } else {
                    need(buf, 12, "color masks")?;
                    let masks = buf;
                    buf.advance(12);
                    masks
                };

                Some(Masks {
                    r: masks.get_u32_le(),
                    g: masks.get_u32_le(),
                    b: masks.get_u32_le(),
                })
            }
            _ => {
                return Err(DibErr::UnsupportedCompression {
                    compression,
                    bit_count,
                });
            }
        };

        let palette = if bit_count <= 8 {
            let max = 1usize << bit_count;
            let count = match colors_used as usize {
                0 => max,
                n => n.min(max),
            };

            need(buf, count * 4, "color table")?;
            (0..count)
                .map(|_| {
                    let (b, g, r) = (buf.get_u8(), buf.get_u8(), buf.get_u8());
                    buf.advance(1);
                    Rgb { r, g, b }
                })
                .collect()
        } else {
            Vec::new()
        };

        if pixel_offset > file.len() {
            return Err(DibErr::Truncated { what: "pixel data" });
        }

        Ok(Self {
            width: width as usize,
            height: height.unsigned_abs() as usize,
            top_down: height < 0,
            bit_count,
            masks,
            palette,
            pixel_offset,
        })
    }

    /// Writes the headers of an uncompressed, bottom-up, 24 bit bitmap.
    pub(crate) fn put_rgb24<B: BufMut>(buf: &mut B, width: i32, height: i32, image_size: u32) {
        let pixel_offset = (FILE_HEADER_SIZE + INFO_HEADER_SIZE) as u32;

        buf.put_slice(MAGIC);
        buf.put_u32_le(pixel_offset + image_size);
        buf.put_u32_le(0);
        buf.put_u32_le(pixel_offset);

        buf.put_u32_le(INFO_HEADER_SIZE as u32);
        buf.put_i32_le(width);
        buf.put_i32_le(height);
        buf.put_u16_le(1);
        buf.put_u16_le(24);
        buf.put_u32_le(BI_RGB);
        buf.put_u32_le(image_size);
        buf.put_i32_le(PIXELS_PER_METER);
        buf.put_i32_le(PIXELS_PER_METER);
        buf.put_u32_le(0);
        buf.put_u32_le(0);
    }
}

/// The amount of bytes of a pixel row, rows are padded to 4 bytes.
pub(crate) fn row_stride(width: usize, bit_count: u16) -> usize {
    (bit_count as usize * width).div_ceil(32) * 4
}

fn need(buf: &[u8], n: usize, what: &'static str) -> Result<()> {
    if buf.remaining() < n {
        return Err(DibErr::Truncated { what });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strides_are_padded_to_four_bytes() {
        assert_eq!(row_stride(1, 24), 4);
        assert_eq!(row_stride(4, 24), 12);
        assert_eq!(row_stride(5, 24), 16);
        assert_eq!(row_stride(3, 32), 12);
        assert_eq!(row_stride(9, 1), 4);
        assert_eq!(row_stride(9, 4), 8);
    }

    #[test]
    fn written_header_parses_back() {
        let mut buf = Vec::new();
        DibHeader::put_rgb24(&mut buf, 3, 2, 24);
        buf.resize(buf.len() + 24, 0);

        let header = DibHeader::parse(&buf).unwrap();
        assert_eq!(header.width, 3);
        assert_eq!(header.height, 2);
        assert!(!header.top_down);
        assert_eq!(header.bit_count, 24);
        assert_eq!(header.pixel_offset, 54);
        assert!(header.palette.is_empty());
    }

    #[test]
    fn rejects_wrong_magic() {
        let mut buf = Vec::new();
        DibHeader::put_rgb24(&mut buf, 1, 1, 4);
        buf[0] = b'P';

        assert!(matches!(
            DibHeader::parse(&buf),
            Err(DibErr::NotABitmap { magic: [b'P', b'M'] })
        ));
    }

    #[test]
    fn rejects_core_headers() {
        let mut buf = Vec::new();
        DibHeader::put_rgb24(&mut buf, 1, 1, 4);
        buf[14..18].copy_from_slice(&12u32.to_le_bytes());

        assert!(matches!(
            DibHeader::parse(&buf),
            Err(DibErr::UnsupportedHeader { size: 12 })
        ));
    }

    #[test]
    fn rejects_truncated_headers() {
        let mut buf = Vec::new();
        DibHeader::put_rgb24(&mut buf, 1, 1, 4);

        assert!(matches!(
            DibHeader::parse(&buf[..30]),
            Err(DibErr::Truncated { .. })
        ));
    }

    #[test]
    fn rejects_pixel_offsets_past_the_end() {
        let mut buf = Vec::new();
        DibHeader::put_rgb24(&mut buf, 1, 1, 4);
        buf.resize(buf.len() + 4, 0);
        let past_the_end = buf.len() as u32 + 1;
        buf[10..14].copy_from_slice(&past_the_end.to_le_bytes());

        assert!(matches!(
            DibHeader::parse(&buf),
            Err(DibErr::Truncated { what: "pixel data" })
        ));
    }

    #[test]
    fn rejects_run_length_encoding() {
        let mut buf = Vec::new();
        DibHeader::put_rgb24(&mut buf, 1, 1, 4);
        buf[30..34].copy_from_slice(&1u32.to_le_bytes());

        assert!(matches!(
            DibHeader::parse(&buf),
            Err(DibErr::UnsupportedCompression { compression: 1, .. })
        ));
    }

    #[test]
    fn rejects_sixteen_bit_pixels() {
        let mut buf = Vec::new();
        DibHeader::put_rgb24(&mut buf, 1, 1, 4);
        buf[28..30].copy_from_slice(&16u16.to_le_bytes());

        assert!(matches!(
            DibHeader::parse(&buf),
            Err(DibErr::UnsupportedBitCount { bit_count: 16 })
        ));
    }
}
