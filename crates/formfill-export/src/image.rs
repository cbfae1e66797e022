//! Minimal header parsing for the image formats the writer can embed.
//!
//! No pixel decoding happens anywhere: JPEG files are embedded whole via
//! `DCTDecode`, and 8-bit grayscale/truecolor PNGs contribute their raw
//! zlib `IDAT` stream via `FlateDecode` with PNG predictors. Anything else
//! is reported as unsupported and rendered as a placeholder.

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// Channel layout of an embeddable PNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PngColor {
    Gray,
    Rgb,
}

impl PngColor {
    pub fn channels(&self) -> u8 {
        match self {
            PngColor::Gray => 1,
            PngColor::Rgb => 3,
        }
    }
}

/// An image payload in a form the PDF writer can embed directly.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageData {
    Jpeg {
        width: u32,
        height: u32,
        grayscale: bool,
        data: Vec<u8>,
    },
    Png {
        width: u32,
        height: u32,
        color: PngColor,
        /// Concatenated IDAT chunk payloads: a complete zlib stream.
        data: Vec<u8>,
    },
}

impl ImageData {
    pub fn width(&self) -> u32 {
        match self {
            ImageData::Jpeg { width, .. } | ImageData::Png { width, .. } => *width,
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            ImageData::Jpeg { height, .. } | ImageData::Png { height, .. } => *height,
        }
    }
}

/// Sniffs the payload and extracts what the writer needs, or `None` when the
/// format cannot be embedded.
pub fn parse_image(bytes: &[u8]) -> Option<ImageData> {
    if bytes.starts_with(&PNG_SIGNATURE) {
        parse_png(bytes)
    } else if bytes.starts_with(&[0xff, 0xd8]) {
        parse_jpeg(bytes)
    } else {
        None
    }
}

fn parse_png(bytes: &[u8]) -> Option<ImageData> {
    let mut cursor = PNG_SIGNATURE.len();
    let mut header: Option<(u32, u32, PngColor)> = None;
    let mut idat = Vec::new();

    while cursor + 8 <= bytes.len() {
        let length = u32::from_be_bytes(bytes[cursor..cursor + 4].try_into().ok()?) as usize;
        let kind = &bytes[cursor + 4..cursor + 8];
        let data_start = cursor + 8;
        let data_end = data_start.checked_add(length)?;
        if data_end > bytes.len() {
            return None;
        }
        let data = &bytes[data_start..data_end];

        match kind {
            b"IHDR" => {
                if data.len() < 13 {
                    return None;
                }
                let width = u32::from_be_bytes(data[0..4].try_into().ok()?);
                let height = u32::from_be_bytes(data[4..8].try_into().ok()?);
                let bit_depth = data[8];
                let color_type = data[9];
                let interlace = data[12];
                let color = match (bit_depth, color_type, interlace) {
                    (8, 0, 0) => PngColor::Gray,
                    (8, 2, 0) => PngColor::Rgb,
                    // Palette, alpha, 16-bit, and interlaced images would
                    // need real decoding.
                    _ => return None,
                };
                header = Some((width, height, color));
            }
            b"IDAT" => idat.extend_from_slice(data),
            b"IEND" => break,
            _ => {}
        }

        // Skip past the CRC.
        cursor = data_end + 4;
    }

    let (width, height, color) = header?;
    if idat.is_empty() || width == 0 || height == 0 {
        return None;
    }
    Some(ImageData::Png {
        width,
        height,
        color,
        data: idat,
    })
}

fn parse_jpeg(bytes: &[u8]) -> Option<ImageData> {
    let mut cursor = 2;
    while cursor + 4 <= bytes.len() {
        if bytes[cursor] != 0xff {
            return None;
        }
        let marker = bytes[cursor + 1];
        match marker {
            // Padding and restart markers carry no segment length.
            0xff => {
                cursor += 1;
                continue;
            }
            0x01 | 0xd0..=0xd7 => {
                cursor += 2;
                continue;
            }
            _ => {}
        }

        let length = u16::from_be_bytes([bytes[cursor + 2], bytes[cursor + 3]]) as usize;
        if length < 2 {
            return None;
        }
        if is_sof_marker(marker) {
            let segment = bytes.get(cursor + 4..cursor + 2 + length)?;
            if segment.len() < 6 {
                return None;
            }
            let height = u16::from_be_bytes([segment[1], segment[2]]) as u32;
            let width = u16::from_be_bytes([segment[3], segment[4]]) as u32;
            let components = segment[5];
            if width == 0 || height == 0 {
                return None;
            }
            return Some(ImageData::Jpeg {
                width,
                height,
                grayscale: components == 1,
                data: bytes.to_vec(),
            });
        }
        cursor += 2 + length;
    }
    None
}

fn is_sof_marker(marker: u8) -> bool {
    matches!(
        marker,
        0xc0..=0xc3 | 0xc5..=0xc7 | 0xc9..=0xcb | 0xcd..=0xcf
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
        let mut chunk = Vec::new();
        chunk.extend_from_slice(&(data.len() as u32).to_be_bytes());
        chunk.extend_from_slice(kind);
        chunk.extend_from_slice(data);
        chunk.extend_from_slice(&[0; 4]);
        chunk
    }

    fn rgb_png(width: u32, height: u32) -> Vec<u8> {
        let mut ihdr = Vec::new();
        ihdr.extend_from_slice(&width.to_be_bytes());
        ihdr.extend_from_slice(&height.to_be_bytes());
        ihdr.extend_from_slice(&[8, 2, 0, 0, 0]);

        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend(png_chunk(b"IHDR", &ihdr));
        bytes.extend(png_chunk(b"IDAT", &[1, 2, 3, 4]));
        bytes.extend(png_chunk(b"IEND", &[]));
        bytes
    }

    fn minimal_jpeg(width: u16, height: u16) -> Vec<u8> {
        let mut bytes = vec![0xff, 0xd8];
        // SOF0 segment: length 17, precision 8, dims, 3 components.
        bytes.extend_from_slice(&[0xff, 0xc0, 0x00, 0x11, 0x08]);
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&[
            0x03, 0x01, 0x22, 0x00, 0x02, 0x11, 0x01, 0x03, 0x11, 0x01,
        ]);
        bytes.extend_from_slice(&[0xff, 0xd9]);
        bytes
    }

    #[test]
    fn parses_rgb_png_headers_and_idat() {
        let parsed = parse_image(&rgb_png(12, 34)).expect("embeddable png");
        match parsed {
            ImageData::Png {
                width,
                height,
                color,
                data,
            } => {
                assert_eq!((width, height), (12, 34));
                assert_eq!(color, PngColor::Rgb);
                assert_eq!(data, vec![1, 2, 3, 4]);
            }
            other => panic!("expected png, got {other:?}"),
        }
    }

    #[test]
    fn parses_jpeg_dimensions() {
        let parsed = parse_image(&minimal_jpeg(640, 480)).expect("embeddable jpeg");
        assert_eq!(parsed.width(), 640);
        assert_eq!(parsed.height(), 480);
    }

    #[test]
    fn rejects_unembeddable_payloads() {
        assert!(parse_image(b"GIF89a").is_none());

        // RGBA (color type 6) needs real decoding.
        let mut ihdr = Vec::new();
        ihdr.extend_from_slice(&5u32.to_be_bytes());
        ihdr.extend_from_slice(&5u32.to_be_bytes());
        ihdr.extend_from_slice(&[8, 6, 0, 0, 0]);
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend(png_chunk(b"IHDR", &ihdr));
        bytes.extend(png_chunk(b"IDAT", &[0]));
        bytes.extend(png_chunk(b"IEND", &[]));
        assert!(parse_image(&bytes).is_none());
    }
}
