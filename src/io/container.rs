//! Binary `.fxds` dataset container.
//!
//! One file holds either the four training arrays or a prediction-probability
//! matrix. The format is a 32-byte header followed by a Postcard-encoded,
//! optionally zstd-compressed payload:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                    Header (32 bytes)                        │
//! ├────────────────────────────────────────────────────────────┤
//! │                    Payload (variable)                       │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Files are published atomically: the codec stages to `<path>.tmp` and
//! renames, so a reader never observes a container missing one of the
//! mandatory arrays.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{CIGAR_CLASSES, QV_BINS};
use crate::dataset::{DatasetError, FextractDataset};
use crate::encode::FeatureOrder;

// ============================================================================
// Constants
// ============================================================================

/// Magic bytes identifying an fextract dataset container.
pub const MAGIC: &[u8; 4] = b"FXDS";

/// Current format version (major).
pub const CURRENT_VERSION_MAJOR: u8 = 1;

/// Current format version (minor).
pub const CURRENT_VERSION_MINOR: u8 = 0;

/// Size of the format header in bytes.
pub const HEADER_SIZE: usize = 32;

/// Minimum payload size for auto-compression (32KB).
pub const COMPRESSION_THRESHOLD: usize = 32 * 1024;

// ============================================================================
// Container Kind
// ============================================================================

/// Container content identifier stored in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ContainerKind {
    /// The four training arrays.
    TrainData = 0,
    /// Per-row class probabilities from an external model.
    Predictions = 1,
}

impl ContainerKind {
    /// Convert from u8, returning None for unknown values.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::TrainData),
            1 => Some(Self::Predictions),
            _ => None,
        }
    }
}

// ============================================================================
// Format Flags
// ============================================================================

/// Bitfield flags for format features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatFlags(u16);

impl FormatFlags {
    /// Payload is compressed with zstd.
    pub const COMPRESSED: u16 = 1 << 0;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, flag: u16) -> bool {
        (self.0 & flag) != 0
    }

    pub fn set(&mut self, flag: u16) {
        self.0 |= flag;
    }
}

// ============================================================================
// Format Header
// ============================================================================

/// 32-byte header for the container format.
///
/// # Layout
///
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       4     Magic ("FXDS")
/// 4       1     Version major
/// 5       1     Version minor
/// 6       1     Container kind
/// 7       1     Reserved (padding)
/// 8       2     Flags (bitfield)
/// 10      2     Reserved
/// 12      4     Payload size (bytes)
/// 16      4     CRC32 checksum of payload
/// 20      4     Number of rows
/// 24      4     Number of feature columns
/// 28      4     Reserved
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatHeader {
    pub version_major: u8,
    pub version_minor: u8,
    pub kind: ContainerKind,
    pub flags: FormatFlags,
    pub payload_size: u32,
    pub checksum: u32,
    pub n_rows: u32,
    pub n_cols: u32,
}

impl FormatHeader {
    /// Create a new header with the current version.
    pub fn new(kind: ContainerKind, n_rows: u32, n_cols: u32) -> Self {
        Self {
            version_major: CURRENT_VERSION_MAJOR,
            version_minor: CURRENT_VERSION_MINOR,
            kind,
            flags: FormatFlags::empty(),
            payload_size: 0,
            checksum: 0,
            n_rows,
            n_cols,
        }
    }

    /// Serialize the header to 32 bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(MAGIC);
        buf[4] = self.version_major;
        buf[5] = self.version_minor;
        buf[6] = self.kind as u8;
        buf[8..10].copy_from_slice(&self.flags.bits().to_le_bytes());
        buf[12..16].copy_from_slice(&self.payload_size.to_le_bytes());
        buf[16..20].copy_from_slice(&self.checksum.to_le_bytes());
        buf[20..24].copy_from_slice(&self.n_rows.to_le_bytes());
        buf[24..28].copy_from_slice(&self.n_cols.to_le_bytes());
        buf
    }

    /// Parse a header from 32 bytes.
    pub fn from_bytes(buf: &[u8; HEADER_SIZE]) -> Result<Self, DeserializeError> {
        if &buf[0..4] != MAGIC {
            return Err(DeserializeError::NotAContainer);
        }

        let version_major = buf[4];
        let version_minor = buf[5];
        if version_major > CURRENT_VERSION_MAJOR {
            return Err(DeserializeError::UnsupportedVersion {
                major: version_major,
                minor: version_minor,
            });
        }

        let kind = ContainerKind::from_u8(buf[6])
            .ok_or_else(|| DeserializeError::CorruptPayload("invalid container kind".into()))?;
        let flags = FormatFlags::from_bits(u16::from_le_bytes([buf[8], buf[9]]));
        let payload_size = u32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]);
        let checksum = u32::from_le_bytes([buf[16], buf[17], buf[18], buf[19]]);
        let n_rows = u32::from_le_bytes([buf[20], buf[21], buf[22], buf[23]]);
        let n_cols = u32::from_le_bytes([buf[24], buf[25], buf[26], buf[27]]);

        Ok(Self {
            version_major,
            version_minor,
            kind,
            flags,
            payload_size,
            checksum,
            n_rows,
            n_cols,
        })
    }
}

// ============================================================================
// Payload
// ============================================================================

/// Version-tagged payload enum for forward compatibility.
///
/// New format versions add new variants rather than modifying existing ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Payload {
    /// Version 1 payload format.
    V1(PayloadV1),
}

/// Version 1 payload variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PayloadV1 {
    TrainData(TrainDataPayload),
    Predictions(PredictionsPayload),
}

/// The four mandatory training arrays, row-major.
///
/// Every array's length is tied to `n_rows`; decoding fails fast when any of
/// them disagrees, so a reader can never see a partially consistent dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainDataPayload {
    pub n_rows: u32,
    pub n_cols: u32,
    /// Feature matrix, `n_rows * n_cols` values.
    pub features: Vec<f32>,
    /// Raw quality values, `n_rows` values.
    pub arrow_qvs: Vec<f32>,
    /// Quality-value one-hot matrix, `n_rows * 8` values.
    pub qv_bins: Vec<f32>,
    /// Operation-label one-hot matrix, `n_rows * 4` values.
    pub cigar_labels: Vec<f32>,
}

/// Per-row class probabilities, `n_rows * 4` values row-major.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionsPayload {
    pub n_rows: u32,
    pub probabilities: Vec<f32>,
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while writing a container.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding error: {0}")]
    Encoding(#[from] postcard::Error),

    #[error("compression error: {0}")]
    Compression(std::io::Error),
}

/// Errors that can occur while reading a container.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("not an fextract dataset container")]
    NotAContainer,

    #[error("container requires format version {major}.{minor} or later")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("file truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("corrupt payload: {0}")]
    CorruptPayload(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decoding error: {0}")]
    Decoding(#[from] postcard::Error),

    #[error("decompression error: {0}")]
    Decompression(std::io::Error),

    #[error("container kind mismatch: expected {expected:?}, got {actual:?}")]
    KindMismatch {
        expected: ContainerKind,
        actual: ContainerKind,
    },

    #[error("array '{array}' has {actual} values, expected {expected}")]
    ShapeMismatch {
        array: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// Compute the CRC32 checksum of payload bytes.
pub fn compute_checksum(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

// ============================================================================
// Codec
// ============================================================================

/// Codec for reading and writing `.fxds` containers.
#[derive(Debug, Clone)]
pub struct ContainerCodec {
    /// Whether to compress payloads over the threshold.
    pub compress: bool,
    /// zstd compression level (1-22, default 3).
    pub compression_level: i32,
}

impl Default for ContainerCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerCodec {
    pub fn new() -> Self {
        Self {
            compress: true,
            compression_level: 3,
        }
    }

    pub fn without_compression() -> Self {
        Self {
            compress: false,
            compression_level: 0,
        }
    }

    /// Write header and raw payload bytes to a writer.
    pub fn write_to<W: Write>(
        &self,
        writer: &mut W,
        header: &mut FormatHeader,
        payload: &[u8],
    ) -> Result<(), SerializeError> {
        let (payload_bytes, compressed) = if self.compress && payload.len() >= COMPRESSION_THRESHOLD
        {
            let compressed = zstd::encode_all(payload, self.compression_level)
                .map_err(SerializeError::Compression)?;
            (compressed, true)
        } else {
            (payload.to_vec(), false)
        };

        header.payload_size = payload_bytes.len() as u32;
        header.checksum = compute_checksum(&payload_bytes);
        if compressed {
            header.flags.set(FormatFlags::COMPRESSED);
        }

        writer.write_all(&header.to_bytes())?;
        writer.write_all(&payload_bytes)?;
        Ok(())
    }

    /// Read header and decompressed payload bytes from a reader.
    pub fn read_from<R: Read>(
        &self,
        reader: &mut R,
    ) -> Result<(FormatHeader, Vec<u8>), DeserializeError> {
        let mut header_buf = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header_buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                DeserializeError::Truncated {
                    expected: HEADER_SIZE,
                    actual: 0,
                }
            } else {
                DeserializeError::Io(e)
            }
        })?;
        let header = FormatHeader::from_bytes(&header_buf)?;

        let mut payload = vec![0u8; header.payload_size as usize];
        reader.read_exact(&mut payload).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                DeserializeError::Truncated {
                    expected: header.payload_size as usize,
                    actual: payload.len(),
                }
            } else {
                DeserializeError::Io(e)
            }
        })?;

        let actual_checksum = compute_checksum(&payload);
        if actual_checksum != header.checksum {
            return Err(DeserializeError::ChecksumMismatch {
                expected: header.checksum,
                actual: actual_checksum,
            });
        }

        let payload = if header.flags.contains(FormatFlags::COMPRESSED) {
            zstd::decode_all(payload.as_slice()).map_err(DeserializeError::Decompression)?
        } else {
            payload
        };

        Ok((header, payload))
    }

    /// Serialize a dataset container to bytes.
    pub fn serialize_dataset(&self, dataset: &FextractDataset) -> Result<Vec<u8>, SerializeError> {
        let payload = Payload::V1(PayloadV1::TrainData(TrainDataPayload {
            n_rows: dataset.n_rows() as u32,
            n_cols: dataset.n_features() as u32,
            features: dataset.features().iter().copied().collect(),
            arrow_qvs: dataset.arrow_qvs().to_vec(),
            qv_bins: dataset.qv_bins().iter().copied().collect(),
            cigar_labels: dataset.cigar_labels().iter().copied().collect(),
        }));
        let payload_bytes = postcard::to_allocvec(&payload)?;
        let mut header = FormatHeader::new(
            ContainerKind::TrainData,
            dataset.n_rows() as u32,
            dataset.n_features() as u32,
        );
        let mut output = Vec::with_capacity(HEADER_SIZE + payload_bytes.len());
        self.write_to(&mut output, &mut header, &payload_bytes)?;
        Ok(output)
    }

    /// Serialize a predictions container to bytes.
    pub fn serialize_predictions(
        &self,
        probabilities: &Array2<f32>,
    ) -> Result<Vec<u8>, SerializeError> {
        let payload = Payload::V1(PayloadV1::Predictions(PredictionsPayload {
            n_rows: probabilities.nrows() as u32,
            probabilities: probabilities.iter().copied().collect(),
        }));
        let payload_bytes = postcard::to_allocvec(&payload)?;
        let mut header = FormatHeader::new(
            ContainerKind::Predictions,
            probabilities.nrows() as u32,
            probabilities.ncols() as u32,
        );
        let mut output = Vec::with_capacity(HEADER_SIZE + payload_bytes.len());
        self.write_to(&mut output, &mut header, &payload_bytes)?;
        Ok(output)
    }

    /// Deserialize a dataset container from bytes.
    ///
    /// The feature order is carried by the side manifest, not the container,
    /// so the caller supplies it.
    pub fn deserialize_dataset(
        &self,
        bytes: &[u8],
        order: FeatureOrder,
    ) -> Result<FextractDataset, DeserializeError> {
        let mut cursor = std::io::Cursor::new(bytes);
        let (header, payload_bytes) = self.read_from(&mut cursor)?;
        if header.kind != ContainerKind::TrainData {
            return Err(DeserializeError::KindMismatch {
                expected: ContainerKind::TrainData,
                actual: header.kind,
            });
        }
        let payload: Payload = postcard::from_bytes(&payload_bytes)?;
        let Payload::V1(PayloadV1::TrainData(data)) = payload else {
            return Err(DeserializeError::CorruptPayload(
                "header says train data but payload is not".into(),
            ));
        };
        train_data_to_dataset(data, order)
    }

    /// Deserialize a predictions container from bytes.
    pub fn deserialize_predictions(
        &self,
        bytes: &[u8],
    ) -> Result<Array2<f32>, DeserializeError> {
        let mut cursor = std::io::Cursor::new(bytes);
        let (header, payload_bytes) = self.read_from(&mut cursor)?;
        if header.kind != ContainerKind::Predictions {
            return Err(DeserializeError::KindMismatch {
                expected: ContainerKind::Predictions,
                actual: header.kind,
            });
        }
        let payload: Payload = postcard::from_bytes(&payload_bytes)?;
        let Payload::V1(PayloadV1::Predictions(data)) = payload else {
            return Err(DeserializeError::CorruptPayload(
                "header says predictions but payload is not".into(),
            ));
        };
        let n_rows = data.n_rows as usize;
        expect_len("probabilities", &data.probabilities, n_rows * CIGAR_CLASSES)?;
        Array2::from_shape_vec((n_rows, CIGAR_CLASSES), data.probabilities)
            .map_err(|e| DeserializeError::CorruptPayload(e.to_string()))
    }
}

fn expect_len(
    array: &'static str,
    values: &[f32],
    expected: usize,
) -> Result<(), DeserializeError> {
    if values.len() != expected {
        return Err(DeserializeError::ShapeMismatch {
            array,
            expected,
            actual: values.len(),
        });
    }
    Ok(())
}

fn train_data_to_dataset(
    data: TrainDataPayload,
    order: FeatureOrder,
) -> Result<FextractDataset, DeserializeError> {
    let n_rows = data.n_rows as usize;
    let n_cols = data.n_cols as usize;
    expect_len("features", &data.features, n_rows * n_cols)?;
    expect_len("arrow_qvs", &data.arrow_qvs, n_rows)?;
    expect_len("qv_bins", &data.qv_bins, n_rows * QV_BINS)?;
    expect_len("cigar_labels", &data.cigar_labels, n_rows * CIGAR_CLASSES)?;

    let features = Array2::from_shape_vec((n_rows, n_cols), data.features)
        .map_err(|e| DeserializeError::CorruptPayload(e.to_string()))?;
    let qv_bins = Array2::from_shape_vec((n_rows, QV_BINS), data.qv_bins)
        .map_err(|e| DeserializeError::CorruptPayload(e.to_string()))?;
    let cigar_labels = Array2::from_shape_vec((n_rows, CIGAR_CLASSES), data.cigar_labels)
        .map_err(|e| DeserializeError::CorruptPayload(e.to_string()))?;
    Ok(FextractDataset::new(
        features,
        Array1::from_vec(data.arrow_qvs),
        qv_bins,
        cigar_labels,
        order,
    )?)
}

// ============================================================================
// File helpers (atomic publish)
// ============================================================================

/// Write container bytes to `path` via a staged `<path>.tmp` rename.
fn publish_atomically(path: &Path, bytes: &[u8]) -> Result<(), SerializeError> {
    let tmp = staging_path(path);
    {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        writer.write_all(bytes)?;
        writer.flush()?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn staging_path(path: &Path) -> std::path::PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    std::path::PathBuf::from(name)
}

/// Save a dataset container to disk.
pub fn save_dataset(path: &Path, dataset: &FextractDataset) -> Result<(), SerializeError> {
    let bytes = ContainerCodec::new().serialize_dataset(dataset)?;
    publish_atomically(path, &bytes)
}

/// Load a dataset container from disk. `order` comes from the side manifest.
pub fn load_dataset(path: &Path, order: FeatureOrder) -> Result<FextractDataset, DeserializeError> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    ContainerCodec::new().deserialize_dataset(&bytes, order)
}

/// Save a predictions container to disk.
pub fn save_predictions(path: &Path, probabilities: &Array2<f32>) -> Result<(), SerializeError> {
    let bytes = ContainerCodec::new().serialize_predictions(probabilities)?;
    publish_atomically(path, &bytes)
}

/// Load a predictions container from disk.
pub fn load_predictions(path: &Path) -> Result<Array2<f32>, DeserializeError> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    ContainerCodec::new().deserialize_predictions(&bytes)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn tiny_dataset() -> FextractDataset {
        let features = array![[1.0_f32, 2.0], [3.0, 4.0]];
        let arrow_qvs = array![10.0_f32, 70.0];
        let qv_bins = Array2::from_shape_fn((2, QV_BINS), |(r, c)| {
            if (r == 0 && c == 1) || (r == 1 && c == 7) {
                1.0
            } else {
                0.0
            }
        });
        let cigar_labels = Array2::from_shape_fn((2, CIGAR_CLASSES), |(r, c)| {
            if (r == 0 && c == 0) || (r == 1 && c == 3) {
                1.0
            } else {
                0.0
            }
        });
        FextractDataset::new(
            features,
            arrow_qvs,
            qv_bins,
            cigar_labels,
            FeatureOrder::new(vec!["F1".into(), "F2".into()]),
        )
        .unwrap()
    }

    #[test]
    fn header_roundtrip() {
        let header = FormatHeader {
            version_major: 1,
            version_minor: 2,
            kind: ContainerKind::Predictions,
            flags: FormatFlags::from_bits(FormatFlags::COMPRESSED),
            payload_size: 12345,
            checksum: 0xDEADBEEF,
            n_rows: 100,
            n_cols: 4,
        };
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(FormatHeader::from_bytes(&bytes).unwrap(), header);
    }

    #[test]
    fn header_wrong_magic() {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(b"XXXX");
        assert!(matches!(
            FormatHeader::from_bytes(&buf),
            Err(DeserializeError::NotAContainer)
        ));
    }

    #[test]
    fn header_unsupported_version() {
        let mut header = FormatHeader::new(ContainerKind::TrainData, 1, 1);
        header.version_major = 99;
        let bytes = header.to_bytes();
        assert!(matches!(
            FormatHeader::from_bytes(&bytes),
            Err(DeserializeError::UnsupportedVersion { major: 99, .. })
        ));
    }

    #[test]
    fn dataset_roundtrip() {
        let dataset = tiny_dataset();
        let codec = ContainerCodec::new();
        let bytes = codec.serialize_dataset(&dataset).unwrap();
        let loaded = codec
            .deserialize_dataset(&bytes, dataset.order().clone())
            .unwrap();
        assert_eq!(loaded.n_rows(), 2);
        assert_eq!(loaded.n_features(), 2);
        assert_eq!(loaded.features(), dataset.features());
        assert_eq!(loaded.arrow_qvs(), dataset.arrow_qvs());
        assert_eq!(loaded.qv_bins(), dataset.qv_bins());
        assert_eq!(loaded.cigar_labels(), dataset.cigar_labels());
    }

    #[test]
    fn predictions_roundtrip() {
        let probs = array![[0.7_f32, 0.1, 0.1, 0.1], [0.0, 0.0, 0.0, 1.0]];
        let codec = ContainerCodec::new();
        let bytes = codec.serialize_predictions(&probs).unwrap();
        let loaded = codec.deserialize_predictions(&bytes).unwrap();
        assert_eq!(loaded, probs);
    }

    fn wide_dataset(n_rows: usize) -> FextractDataset {
        let features = Array2::from_shape_fn((n_rows, 8), |(r, c)| (r * 8 + c) as f32);
        let arrow_qvs = ndarray::Array1::from_shape_fn(n_rows, |r| (r % 90) as f32);
        let qv_bins = Array2::from_shape_fn((n_rows, QV_BINS), |(_, c)| (c == 0) as u8 as f32);
        let cigar_labels =
            Array2::from_shape_fn((n_rows, CIGAR_CLASSES), |(_, c)| (c == 0) as u8 as f32);
        let order = FeatureOrder::new((0..8).map(|i| format!("F{i}")).collect());
        FextractDataset::new(features, arrow_qvs, qv_bins, cigar_labels, order).unwrap()
    }

    fn header_of(bytes: &[u8]) -> FormatHeader {
        let buf: [u8; HEADER_SIZE] = bytes[..HEADER_SIZE].try_into().unwrap();
        FormatHeader::from_bytes(&buf).unwrap()
    }

    #[test]
    fn large_payloads_compress_unless_disabled() {
        // Well over the threshold: 2000 rows x (8 + 1 + 8 + 4) f32 values.
        let dataset = wide_dataset(2000);

        let compressed = ContainerCodec::new().serialize_dataset(&dataset).unwrap();
        assert!(header_of(&compressed).flags.contains(FormatFlags::COMPRESSED));

        let codec = ContainerCodec::without_compression();
        let plain = codec.serialize_dataset(&dataset).unwrap();
        assert!(!header_of(&plain).flags.contains(FormatFlags::COMPRESSED));
        assert!(plain.len() > compressed.len());

        // Both decode to the same arrays.
        let a = codec.deserialize_dataset(&compressed, dataset.order().clone()).unwrap();
        let b = codec.deserialize_dataset(&plain, dataset.order().clone()).unwrap();
        assert_eq!(a.features(), dataset.features());
        assert_eq!(b.features(), dataset.features());
    }

    #[test]
    fn small_payloads_stay_uncompressed() {
        let bytes = ContainerCodec::new().serialize_dataset(&tiny_dataset()).unwrap();
        assert!(!header_of(&bytes).flags.contains(FormatFlags::COMPRESSED));
    }

    #[test]
    fn kind_mismatch_is_detected() {
        let codec = ContainerCodec::new();
        let bytes = codec.serialize_dataset(&tiny_dataset()).unwrap();
        assert!(matches!(
            codec.deserialize_predictions(&bytes),
            Err(DeserializeError::KindMismatch { .. })
        ));
    }

    #[test]
    fn corruption_is_detected() {
        let codec = ContainerCodec::new();
        let mut bytes = codec.serialize_dataset(&tiny_dataset()).unwrap();
        bytes[HEADER_SIZE + 3] ^= 0xFF;
        assert!(matches!(
            codec.deserialize_dataset(&bytes, FeatureOrder::new(vec![])),
            Err(DeserializeError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn truncation_is_detected() {
        let codec = ContainerCodec::new();
        let bytes = codec.serialize_dataset(&tiny_dataset()).unwrap();
        let result = codec.deserialize_dataset(&bytes[..HEADER_SIZE + 4], FeatureOrder::new(vec![]));
        assert!(matches!(result, Err(DeserializeError::Truncated { .. })));
    }

    #[test]
    fn atomic_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.train.fxds");
        let dataset = tiny_dataset();
        save_dataset(&path, &dataset).unwrap();
        assert!(path.exists());
        assert!(!staging_path(&path).exists());
        let loaded = load_dataset(&path, dataset.order().clone()).unwrap();
        assert_eq!(loaded.features(), dataset.features());
    }
}
