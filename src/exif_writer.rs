/**
 * EXIF Writer module - rewrites the date fields of a JPEG's EXIF block
 *
 * - The JPEG container is split into segments with img-parts
 * - The existing APP1/EXIF block (if any) is decoded with kamadak-exif
 * - All fields are carried over except the date/subsecond tags being replaced
 * - A new TIFF block is encoded with kamadak-exif's writer in the source byte order
 * - Only the APP1 segment changes; every other segment and the scan data stay as they were
 */

use chrono::{NaiveDateTime, Timelike};
use exif::experimental::Writer;
use exif::{Field, In, Reader as ExifReader, Tag, Value};
use img_parts::jpeg::{markers, Jpeg, JpegSegment};
use img_parts::{Bytes, ImageEXIF};
use log::debug;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use crate::error::MetadataError;
use crate::exif::EXIF_DATE_FORMAT;

/// Modification, original-capture and digitized date fields.
pub const DATE_TAGS: [Tag; 3] = [Tag::DateTime, Tag::DateTimeOriginal, Tag::DateTimeDigitized];

/// Sub-second companions of `DATE_TAGS`, in the same order.
pub const SUBSEC_TAGS: [Tag; 3] = [Tag::SubSecTime, Tag::SubSecTimeOriginal, Tag::SubSecTimeDigitized];

/// APP1 payload prefix that marks an EXIF segment.
const EXIF_PREFIX: &[u8] = b"Exif\0\0";

/// Largest APP1 payload a segment length field can describe.
const MAX_SEGMENT_CONTENTS: usize = u16::MAX as usize - 2;

pub struct ExifWriter {
    /// Byte order used when the image has no EXIF block yet.
    default_little_endian: bool,
}

impl ExifWriter {
    pub fn new() -> Self {
        Self {
            default_little_endian: false,
        }
    }

    /// Set DateTime, DateTimeOriginal and DateTimeDigitized of a JPEG file in place.
    pub fn write_capture_time(&self, file_path: &Path, timestamp: NaiveDateTime) -> Result<(), MetadataError> {
        debug!("Writing {} to {}", timestamp, file_path.display());

        let image_bytes = fs::read(file_path)?;
        let output = self.rewrite_jpeg(image_bytes, timestamp)?;
        fs::write(file_path, output)?;
        Ok(())
    }

    /// Return a copy of `image_bytes` whose EXIF block carries `timestamp`.
    pub fn rewrite_jpeg(&self, image_bytes: Vec<u8>, timestamp: NaiveDateTime) -> Result<Bytes, MetadataError> {
        let mut jpeg = Jpeg::from_bytes(Bytes::from(image_bytes))
            .map_err(|e| MetadataError::Decode(format!("Failed to parse JPEG: {}", e)))?;

        if jpeg.segment_by_marker(markers::SOS).is_none() {
            return Err(MetadataError::Decode("JPEG has no image scan".to_string()));
        }

        let tiff = self.build_exif_block(jpeg.exif(), timestamp)?;
        replace_exif_segment(&mut jpeg, &tiff)?;

        Ok(jpeg.encoder().bytes())
    }

    /// Encode a TIFF/EXIF block from `existing` (raw TIFF data, no "Exif\0\0" prefix) with new dates.
    fn build_exif_block(&self, existing: Option<Bytes>, timestamp: NaiveDateTime) -> Result<Vec<u8>, MetadataError> {
        let existing = match existing {
            Some(raw) => Some(
                ExifReader::new()
                    .read_raw(raw.to_vec())
                    .map_err(|e| MetadataError::Decode(format!("Failed to read existing EXIF: {}", e)))?,
            ),
            None => None,
        };

        let little_endian = existing
            .as_ref()
            .map(|exif| exif.little_endian())
            .unwrap_or(self.default_little_endian);

        let mut fields: Vec<Field> = Vec::new();
        if let Some(exif) = &existing {
            for field in exif.fields() {
                if !should_carry_over(field) {
                    continue;
                }
                fields.push(Field {
                    tag: field.tag,
                    ifd_num: field.ifd_num,
                    value: field.value.clone(),
                });
            }
        }
        fields.extend(date_fields(timestamp));

        let thumbnail = existing.as_ref().and_then(|exif| {
            let offset = exif
                .get_field(Tag::JPEGInterchangeFormat, In::THUMBNAIL)?
                .value
                .get_uint(0)? as usize;
            let length = exif
                .get_field(Tag::JPEGInterchangeFormatLength, In::THUMBNAIL)?
                .value
                .get_uint(0)? as usize;
            exif.buf().get(offset..offset.checked_add(length)?)
        });

        let mut writer = Writer::new();
        for field in &fields {
            writer.push_field(field);
        }
        if let Some(jpeg) = thumbnail {
            writer.set_jpeg(jpeg, In::THUMBNAIL);
        }

        let mut buffer = Cursor::new(Vec::new());
        writer
            .write(&mut buffer, little_endian)
            .map_err(|e| MetadataError::Encode(e.to_string()))?;
        Ok(buffer.into_inner())
    }
}

impl Default for ExifWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn is_exif_segment(segment: &JpegSegment) -> bool {
    segment.marker() == markers::APP1 && segment.contents().starts_with(EXIF_PREFIX)
}

/// Put `tiff` into the image's EXIF segment, leaving every other segment as it was.
///
/// An existing EXIF segment is replaced where it stands. Otherwise the new one goes
/// right after a leading APP0 (JFIF) segment, or first.
fn replace_exif_segment(jpeg: &mut Jpeg, tiff: &[u8]) -> Result<(), MetadataError> {
    let mut contents = Vec::with_capacity(EXIF_PREFIX.len() + tiff.len());
    contents.extend_from_slice(EXIF_PREFIX);
    contents.extend_from_slice(tiff);
    if contents.len() > MAX_SEGMENT_CONTENTS {
        return Err(MetadataError::Encode(format!(
            "EXIF block of {} bytes does not fit in one APP1 segment",
            contents.len()
        )));
    }
    let segment = JpegSegment::new_with_contents(markers::APP1, Bytes::from(contents));

    let segments = jpeg.segments_mut();
    let position = match segments.iter().position(is_exif_segment) {
        Some(existing) => existing,
        None => match segments.first() {
            Some(first) if first.marker() == markers::APP0 => 1,
            _ => 0,
        },
    };
    segments.retain(|s| !is_exif_segment(s));
    segments.insert(position, segment);
    Ok(())
}

fn should_carry_over(field: &Field) -> bool {
    if field.ifd_num != In::PRIMARY && field.ifd_num != In::THUMBNAIL {
        return false;
    }
    if field.ifd_num == In::PRIMARY && (DATE_TAGS.contains(&field.tag) || SUBSEC_TAGS.contains(&field.tag)) {
        return false;
    }
    // The writer cannot encode values of unknown type.
    !matches!(field.value, Value::Unknown(..))
}

/// New date fields for `timestamp`; subsecond fields only when it has a millisecond part.
pub fn date_fields(timestamp: NaiveDateTime) -> Vec<Field> {
    let formatted = timestamp.format(EXIF_DATE_FORMAT).to_string();
    let mut fields: Vec<Field> = DATE_TAGS
        .iter()
        .map(|&tag| ascii_field(tag, &formatted))
        .collect();

    let millis = timestamp.nanosecond() / 1_000_000;
    if millis > 0 {
        let subsec = format!("{:03}", millis);
        fields.extend(SUBSEC_TAGS.iter().map(|&tag| ascii_field(tag, &subsec)));
    }
    fields
}

fn ascii_field(tag: Tag, text: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![text.as_bytes().to_vec()]),
    }
}
