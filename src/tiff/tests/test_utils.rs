//! In-memory TIFF fixtures
//!
//! `TiffFixture` writes small but complete TIFF/BigTIFF containers in
//! either byte order so decoding paths can be tested without files.

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use std::io::Write;

use crate::tiff::constants::{field_types, tags};

/// One IFD entry before layout: its encoded values and their type
struct FixtureEntry {
    tag: u16,
    field_type: u16,
    count: u64,
    data: Vec<u8>,
}

/// Builder for single-image TIFF containers
#[derive(Debug, Clone)]
pub struct TiffFixture {
    big_endian: bool,
    big_tiff: bool,
    width: u32,
    height: u32,
    bits_per_sample: u16,
    sample_format: u16,
    samples_per_pixel: u16,
    planar: u16,
    compression: u16,
    predictor: Option<u16>,
    rows_per_strip: Option<u32>,
    tile_size: Option<(u32, u32)>,
    segments: Vec<Vec<u8>>,
    nodata: Option<String>,
    pixel_scale: Option<[f64; 3]>,
    tiepoint: Option<[f64; 6]>,
    transformation: Option<[f64; 16]>,
}

impl TiffFixture {
    /// Little-endian classic TIFF, 8-bit unsigned, one sample per pixel,
    /// uncompressed, no segments yet
    pub fn new(width: u32, height: u32) -> Self {
        TiffFixture {
            big_endian: false,
            big_tiff: false,
            width,
            height,
            bits_per_sample: 8,
            sample_format: 1,
            samples_per_pixel: 1,
            planar: 1,
            compression: 1,
            predictor: None,
            rows_per_strip: None,
            tile_size: None,
            segments: Vec::new(),
            nodata: None,
            pixel_scale: None,
            tiepoint: None,
            transformation: None,
        }
    }

    pub fn big_endian(mut self) -> Self {
        self.big_endian = true;
        self
    }

    pub fn big_tiff(mut self) -> Self {
        self.big_tiff = true;
        self
    }

    /// Sets BitsPerSample and SampleFormat (1 unsigned, 2 signed, 3 float)
    pub fn sample_type(mut self, bits: u16, format: u16) -> Self {
        self.bits_per_sample = bits;
        self.sample_format = format;
        self
    }

    pub fn samples_per_pixel(mut self, count: u16) -> Self {
        self.samples_per_pixel = count;
        self
    }

    pub fn planar(mut self) -> Self {
        self.planar = 2;
        self
    }

    pub fn compression(mut self, code: u16) -> Self {
        self.compression = code;
        self
    }

    pub fn predictor(mut self, code: u16) -> Self {
        self.predictor = Some(code);
        self
    }

    pub fn rows_per_strip(mut self, rows: u32) -> Self {
        self.rows_per_strip = Some(rows);
        self
    }

    pub fn tiles(mut self, tile_width: u32, tile_height: u32) -> Self {
        self.tile_size = Some((tile_width, tile_height));
        self
    }

    /// Appends one strip or tile, already compressed
    pub fn segment(mut self, bytes: Vec<u8>) -> Self {
        self.segments.push(bytes);
        self
    }

    pub fn nodata(mut self, text: &str) -> Self {
        self.nodata = Some(text.to_string());
        self
    }

    /// Adds ModelPixelScale and a ModelTiepoint anchoring raster (0, 0)
    pub fn geo(mut self, origin_x: f64, origin_y: f64, scale_x: f64, scale_y: f64) -> Self {
        self.pixel_scale = Some([scale_x, scale_y, 0.0]);
        self.tiepoint = Some([0.0, 0.0, 0.0, origin_x, origin_y, 0.0]);
        self
    }

    pub fn model_transformation(mut self, matrix: [f64; 16]) -> Self {
        self.transformation = Some(matrix);
        self
    }

    /// Writes the container
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.write_all(if self.big_endian { b"MM" } else { b"II" }).unwrap();
        if self.big_tiff {
            self.put_u16(&mut out, 43);
            self.put_u16(&mut out, 8);
            self.put_u16(&mut out, 0);
            self.put_u64(&mut out, 0);
        } else {
            self.put_u16(&mut out, 42);
            self.put_u32(&mut out, 0);
        }

        let mut offsets = Vec::new();
        let mut byte_counts = Vec::new();
        for segment in &self.segments {
            offsets.push(out.len() as u32);
            byte_counts.push(segment.len() as u32);
            out.extend_from_slice(segment);
        }

        let mut entries = self.entries(&offsets, &byte_counts);
        entries.sort_by_key(|e| e.tag);

        let inline_len = if self.big_tiff { 8 } else { 4 };
        let mut value_offsets = Vec::with_capacity(entries.len());
        for entry in &entries {
            if entry.data.len() > inline_len {
                if out.len() % 2 == 1 {
                    out.push(0);
                }
                value_offsets.push(Some(out.len() as u64));
                out.extend_from_slice(&entry.data);
            } else {
                value_offsets.push(None);
            }
        }

        if out.len() % 2 == 1 {
            out.push(0);
        }
        let ifd_offset = out.len() as u64;

        if self.big_tiff {
            self.put_u64(&mut out, entries.len() as u64);
        } else {
            self.put_u16(&mut out, entries.len() as u16);
        }
        for (entry, value_offset) in entries.iter().zip(&value_offsets) {
            self.put_u16(&mut out, entry.tag);
            self.put_u16(&mut out, entry.field_type);
            if self.big_tiff {
                self.put_u64(&mut out, entry.count);
            } else {
                self.put_u32(&mut out, entry.count as u32);
            }
            match value_offset {
                Some(offset) if self.big_tiff => self.put_u64(&mut out, *offset),
                Some(offset) => self.put_u32(&mut out, *offset as u32),
                None => {
                    let mut field = entry.data.clone();
                    field.resize(inline_len, 0);
                    out.extend_from_slice(&field);
                }
            }
        }
        if self.big_tiff {
            self.put_u64(&mut out, 0);
        } else {
            self.put_u32(&mut out, 0);
        }

        let mut patch = Vec::new();
        if self.big_tiff {
            self.put_u64(&mut patch, ifd_offset);
            out[8..16].copy_from_slice(&patch);
        } else {
            self.put_u32(&mut patch, ifd_offset as u32);
            out[4..8].copy_from_slice(&patch);
        }

        out
    }

    fn entries(&self, offsets: &[u32], byte_counts: &[u32]) -> Vec<FixtureEntry> {
        let spp = self.samples_per_pixel as usize;
        let mut entries = vec![
            self.longs(tags::IMAGE_WIDTH, &[self.width]),
            self.longs(tags::IMAGE_LENGTH, &[self.height]),
            self.shorts(tags::BITS_PER_SAMPLE, &vec![self.bits_per_sample; spp]),
            self.shorts(tags::COMPRESSION, &[self.compression]),
            self.shorts(tags::PHOTOMETRIC_INTERPRETATION, &[1]),
            self.shorts(tags::SAMPLES_PER_PIXEL, &[self.samples_per_pixel]),
            self.shorts(tags::PLANAR_CONFIGURATION, &[self.planar]),
            self.shorts(tags::SAMPLE_FORMAT, &vec![self.sample_format; spp]),
        ];

        match self.tile_size {
            Some((tile_width, tile_height)) => {
                entries.push(self.longs(tags::TILE_WIDTH, &[tile_width]));
                entries.push(self.longs(tags::TILE_LENGTH, &[tile_height]));
                entries.push(self.longs(tags::TILE_OFFSETS, offsets));
                entries.push(self.longs(tags::TILE_BYTE_COUNTS, byte_counts));
            },
            None => {
                if let Some(rows) = self.rows_per_strip {
                    entries.push(self.longs(tags::ROWS_PER_STRIP, &[rows]));
                }
                entries.push(self.longs(tags::STRIP_OFFSETS, offsets));
                entries.push(self.longs(tags::STRIP_BYTE_COUNTS, byte_counts));
            },
        }

        if let Some(predictor) = self.predictor {
            entries.push(self.shorts(tags::PREDICTOR, &[predictor]));
        }
        if let Some(scale) = &self.pixel_scale {
            entries.push(self.doubles(tags::MODEL_PIXEL_SCALE_TAG, scale));
        }
        if let Some(tiepoint) = &self.tiepoint {
            entries.push(self.doubles(tags::MODEL_TIEPOINT_TAG, tiepoint));
        }
        if let Some(matrix) = &self.transformation {
            entries.push(self.doubles(tags::MODEL_TRANSFORMATION_TAG, matrix));
        }
        if let Some(text) = &self.nodata {
            let mut data = text.as_bytes().to_vec();
            data.push(0);
            entries.push(FixtureEntry {
                tag: tags::GDAL_NODATA,
                field_type: field_types::ASCII,
                count: data.len() as u64,
                data,
            });
        }

        entries
    }

    fn shorts(&self, tag: u16, values: &[u16]) -> FixtureEntry {
        let mut data = Vec::new();
        for v in values {
            self.put_u16(&mut data, *v);
        }
        FixtureEntry { tag, field_type: field_types::SHORT, count: values.len() as u64, data }
    }

    fn longs(&self, tag: u16, values: &[u32]) -> FixtureEntry {
        let mut data = Vec::new();
        for v in values {
            self.put_u32(&mut data, *v);
        }
        FixtureEntry { tag, field_type: field_types::LONG, count: values.len() as u64, data }
    }

    fn doubles(&self, tag: u16, values: &[f64]) -> FixtureEntry {
        let mut data = Vec::new();
        for v in values {
            self.put_u64(&mut data, v.to_bits());
        }
        FixtureEntry { tag, field_type: field_types::DOUBLE, count: values.len() as u64, data }
    }

    fn put_u16(&self, out: &mut Vec<u8>, value: u16) {
        if self.big_endian {
            out.write_u16::<BigEndian>(value).unwrap();
        } else {
            out.write_u16::<LittleEndian>(value).unwrap();
        }
    }

    fn put_u32(&self, out: &mut Vec<u8>, value: u32) {
        if self.big_endian {
            out.write_u32::<BigEndian>(value).unwrap();
        } else {
            out.write_u32::<LittleEndian>(value).unwrap();
        }
    }

    fn put_u64(&self, out: &mut Vec<u8>, value: u64) {
        if self.big_endian {
            out.write_u64::<BigEndian>(value).unwrap();
        } else {
            out.write_u64::<LittleEndian>(value).unwrap();
        }
    }
}

/// Encodes u16 samples in the requested byte order
pub fn u16_bytes(values: &[u16], big_endian: bool) -> Vec<u8> {
    values.iter()
        .flat_map(|v| if big_endian { v.to_be_bytes() } else { v.to_le_bytes() })
        .collect()
}

/// Encodes i16 samples in the requested byte order
pub fn i16_bytes(values: &[i16], big_endian: bool) -> Vec<u8> {
    values.iter()
        .flat_map(|v| if big_endian { v.to_be_bytes() } else { v.to_le_bytes() })
        .collect()
}

/// Encodes f32 samples in the requested byte order
pub fn f32_bytes(values: &[f32], big_endian: bool) -> Vec<u8> {
    values.iter()
        .flat_map(|v| if big_endian { v.to_be_bytes() } else { v.to_le_bytes() })
        .collect()
}

/// Encodes f64 samples in the requested byte order
pub fn f64_bytes(values: &[f64], big_endian: bool) -> Vec<u8> {
    values.iter()
        .flat_map(|v| if big_endian { v.to_be_bytes() } else { v.to_le_bytes() })
        .collect()
}

/// Zlib-compresses a segment the way Deflate TIFFs store it
pub fn deflate(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

/// Zstandard-compresses a segment
pub fn zstd_compress(bytes: &[u8]) -> Vec<u8> {
    zstd::encode_all(bytes, 3).unwrap()
}
