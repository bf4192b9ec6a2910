//! Dataset loading and model-input assembly.
//!
//! Reads the record-oriented JSON training/test files, imputes missing
//! incidence angles, derives per-band scalar statistics, and assembles the
//! two-channel [`ImageBatch`] plus metadata [`Matrix`] the model consumes.
//!
//! The metadata layout is fixed:
//! `[inc_angle, size_1, min_1, max_1, med_1, mean_1, max_2]`.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{IcefoldError, Result};
use crate::primitives::{ImageBatch, Matrix};

/// Number of metadata features per sample.
pub const META_FEATURES: usize = 7;

/// One labeled (or unlabeled, for test data) radar sample.
///
/// `band_1` and `band_2` are flattened square images of backscatter values
/// in dB. `inc_angle` is `None` where the raw file holds the literal string
/// `"na"`. `is_iceberg` is absent for test records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Sample identifier, carried through to the submission file.
    pub id: String,
    /// First band, flattened row-major.
    pub band_1: Vec<f32>,
    /// Second band, flattened row-major.
    pub band_2: Vec<f32>,
    /// Incidence angle in degrees; `None` when the source says `"na"`.
    #[serde(deserialize_with = "na_as_none")]
    pub inc_angle: Option<f32>,
    /// Binary label; absent for test samples.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_iceberg: Option<u8>,
}

/// Accepts a number, the string `"na"`, or null for the incidence angle.
fn na_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f32),
        Text(String),
        Missing,
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(v) => Ok(Some(v)),
        Raw::Text(s) if s.eq_ignore_ascii_case("na") => Ok(None),
        Raw::Text(s) => s
            .parse::<f32>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid inc_angle: {s:?}"))),
        Raw::Missing => Ok(None),
    }
}

/// Scalar statistics derived from one band of one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandStats {
    /// Count of pixels more than two standard deviations above the mean.
    pub object_size: f32,
    /// Minimum pixel value.
    pub min: f32,
    /// Maximum pixel value.
    pub max: f32,
    /// Median pixel value.
    pub median: f32,
    /// Mean pixel value.
    pub mean: f32,
}

impl BandStats {
    /// Computes the statistics for one flattened band.
    ///
    /// # Panics
    ///
    /// Panics if the band is empty.
    #[must_use]
    pub fn compute(band: &[f32]) -> Self {
        assert!(!band.is_empty(), "band cannot be empty");

        let n = band.len() as f32;
        let mean = band.iter().sum::<f32>() / n;
        let variance = band.iter().map(|&v| (v - mean).powi(2)).sum::<f32>() / n;
        let std = variance.sqrt();

        let threshold = mean + 2.0 * std;
        let object_size = band.iter().filter(|&&v| v > threshold).count() as f32;

        let min = band.iter().copied().fold(f32::INFINITY, f32::min);
        let max = band.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        let mut sorted = band.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let median = if sorted.len() % 2 == 1 {
            sorted[sorted.len() / 2]
        } else {
            (sorted[sorted.len() / 2 - 1] + sorted[sorted.len() / 2]) / 2.0
        };

        Self {
            object_size,
            min,
            max,
            median,
            mean,
        }
    }
}

/// Assembled model inputs: image batch plus metadata matrix.
#[derive(Debug, Clone)]
pub struct ModelInputs {
    /// Two-channel image batch (band 1, band 2), N×H×W×2.
    pub images: ImageBatch,
    /// N×[`META_FEATURES`] metadata matrix.
    pub meta: Matrix,
}

/// A loaded dataset of radar samples.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    /// Wraps a vector of records.
    ///
    /// # Errors
    ///
    /// Returns an error if the record set is empty, a band is not a
    /// non-empty square image, or the bands disagree in size.
    pub fn new(records: Vec<Record>) -> Result<Self> {
        if records.is_empty() {
            return Err(IcefoldError::InvalidDataset {
                message: "no records".to_string(),
            });
        }
        let expected = records[0].band_1.len();
        for record in &records {
            if record.band_1.len() != expected || record.band_2.len() != expected {
                return Err(IcefoldError::InvalidDataset {
                    message: format!(
                        "record {} has ragged bands ({} and {}, expected {expected})",
                        record.id,
                        record.band_1.len(),
                        record.band_2.len()
                    ),
                });
            }
        }
        let side = (expected as f64).sqrt() as usize;
        if side == 0 || side * side != expected {
            return Err(IcefoldError::InvalidDataset {
                message: format!("band length {expected} is not a non-zero perfect square"),
            });
        }
        Ok(Self { records })
    }

    /// Loads a dataset from a record-oriented JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read, parsed, or validated.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let records: Vec<Record> = serde_json::from_reader(BufReader::new(file))?;
        Self::new(records)
    }

    /// Returns the number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the dataset has no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the records.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Returns the sample identifiers in record order.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.id.as_str()).collect()
    }

    /// Returns the side length of the square band images.
    #[must_use]
    pub fn image_side(&self) -> usize {
        (self.records[0].band_1.len() as f64).sqrt() as usize
    }

    /// Replaces missing incidence angles with the mean of the present ones.
    ///
    /// # Errors
    ///
    /// Returns an error if every angle is missing.
    pub fn impute_inc_angle(&mut self) -> Result<()> {
        let present: Vec<f32> = self.records.iter().filter_map(|r| r.inc_angle).collect();
        if present.is_empty() {
            return Err(IcefoldError::InvalidDataset {
                message: "cannot impute inc_angle: all values missing".to_string(),
            });
        }
        let mean = present.iter().sum::<f32>() / present.len() as f32;
        for record in &mut self.records {
            if record.inc_angle.is_none() {
                record.inc_angle = Some(mean);
            }
        }
        Ok(())
    }

    /// Returns the binary labels as f32 targets.
    ///
    /// # Errors
    ///
    /// Returns an error if any record lacks a label (i.e. this is test data).
    pub fn labels(&self) -> Result<Vec<f32>> {
        self.records
            .iter()
            .map(|r| {
                r.is_iceberg
                    .map(f32::from)
                    .ok_or_else(|| IcefoldError::InvalidDataset {
                        message: format!("record {} has no label", r.id),
                    })
            })
            .collect()
    }

    /// Assembles model inputs: a two-channel image batch and the N×7
    /// metadata matrix of incidence angle plus derived band statistics.
    ///
    /// If `input_size` is given and differs from the dataset's spatial
    /// shape, images are resized (nearest neighbor) to match.
    ///
    /// # Errors
    ///
    /// Returns an error if any incidence angle is still missing (call
    /// [`Dataset::impute_inc_angle`] on training data first).
    pub fn assemble(&self, input_size: Option<(usize, usize)>) -> Result<ModelInputs> {
        let side = self.image_side();
        let n = self.records.len();

        let mut pixels = Vec::with_capacity(n * side * side * 2);
        let mut meta = Matrix::zeros(n, META_FEATURES);

        for (i, record) in self.records.iter().enumerate() {
            let angle = record
                .inc_angle
                .ok_or_else(|| IcefoldError::InvalidDataset {
                    message: format!("record {} has missing inc_angle; impute first", record.id),
                })?;

            for p in 0..side * side {
                pixels.push(record.band_1[p]);
                pixels.push(record.band_2[p]);
            }

            let stats_1 = BandStats::compute(&record.band_1);
            let stats_2 = BandStats::compute(&record.band_2);
            meta.set_row(
                i,
                &[
                    angle,
                    stats_1.object_size,
                    stats_1.min,
                    stats_1.max,
                    stats_1.median,
                    stats_1.mean,
                    stats_2.max,
                ],
            );
        }

        let mut images = ImageBatch::from_vec(n, side, side, 2, pixels)?;
        if let Some((h, w)) = input_size {
            if (h, w) != (side, side) {
                images = images.resized(h, w);
            }
        }

        Ok(ModelInputs { images, meta })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, fill: f32, angle: Option<f32>, label: Option<u8>) -> Record {
        Record {
            id: id.to_string(),
            band_1: vec![fill; 16],
            band_2: vec![fill - 1.0; 16],
            inc_angle: angle,
            is_iceberg: label,
        }
    }

    #[test]
    fn test_parse_record_with_na_angle() {
        let json = r#"{
            "id": "a1b2c3",
            "band_1": [1.0, 2.0, 3.0, 4.0],
            "band_2": [0.5, 1.5, 2.5, 3.5],
            "inc_angle": "na",
            "is_iceberg": 1
        }"#;
        let r: Record = serde_json::from_str(json).unwrap();
        assert_eq!(r.inc_angle, None);
        assert_eq!(r.is_iceberg, Some(1));
    }

    #[test]
    fn test_parse_record_numeric_angle_no_label() {
        let json = r#"{
            "id": "t1",
            "band_1": [1.0],
            "band_2": [2.0],
            "inc_angle": 39.26
        }"#;
        let r: Record = serde_json::from_str(json).unwrap();
        assert!((r.inc_angle.unwrap() - 39.26).abs() < 1e-4);
        assert_eq!(r.is_iceberg, None);
    }

    #[test]
    fn test_dataset_rejects_empty_and_ragged() {
        assert!(Dataset::new(vec![]).is_err());

        let mut bad = record("x", 0.0, Some(40.0), Some(0));
        bad.band_2 = vec![0.0; 9];
        assert!(Dataset::new(vec![bad]).is_err());
    }

    #[test]
    fn test_dataset_rejects_non_square_bands() {
        let mut r = record("x", 0.0, Some(40.0), Some(0));
        r.band_1 = vec![0.0; 15];
        r.band_2 = vec![0.0; 15];
        assert!(Dataset::new(vec![r]).is_err());
    }

    #[test]
    fn test_impute_inc_angle_uses_mean_of_present() {
        let mut ds = Dataset::new(vec![
            record("a", 0.0, Some(30.0), Some(0)),
            record("b", 0.0, None, Some(1)),
            record("c", 0.0, Some(40.0), Some(0)),
        ])
        .unwrap();
        ds.impute_inc_angle().unwrap();
        assert!((ds.records()[1].inc_angle.unwrap() - 35.0).abs() < 1e-5);
        // Present angles are untouched.
        assert_eq!(ds.records()[0].inc_angle, Some(30.0));
    }

    #[test]
    fn test_impute_fails_when_all_missing() {
        let mut ds = Dataset::new(vec![record("a", 0.0, None, Some(0))]).unwrap();
        assert!(ds.impute_inc_angle().is_err());
    }

    #[test]
    fn test_labels_error_on_test_data() {
        let ds = Dataset::new(vec![record("a", 0.0, Some(40.0), None)]).unwrap();
        assert!(ds.labels().is_err());
    }

    #[test]
    fn test_band_stats_flat_band() {
        let stats = BandStats::compute(&[2.0; 8]);
        assert_eq!(stats.object_size, 0.0);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 2.0);
        assert_eq!(stats.median, 2.0);
        assert_eq!(stats.mean, 2.0);
    }

    #[test]
    fn test_band_stats_with_bright_object() {
        // Background of zeros with one very bright pixel.
        let mut band = vec![0.0f32; 99];
        band.push(100.0);
        let stats = BandStats::compute(&band);
        assert_eq!(stats.object_size, 1.0);
        assert_eq!(stats.max, 100.0);
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.median, 0.0);
    }

    #[test]
    fn test_band_stats_median_even() {
        let stats = BandStats::compute(&[4.0, 1.0, 3.0, 2.0]);
        assert!((stats.median - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_assemble_shapes_and_meta_layout() {
        let ds = Dataset::new(vec![
            record("a", 1.0, Some(35.0), Some(1)),
            record("b", 2.0, Some(45.0), Some(0)),
        ])
        .unwrap();
        let inputs = ds.assemble(None).unwrap();
        assert_eq!(inputs.images.shape(), (2, 4, 4, 2));
        assert_eq!(inputs.meta.shape(), (2, META_FEATURES));

        // Flat bands: size 0, min=max=median=mean=fill, max_2 = fill - 1.
        assert_eq!(inputs.meta.row(0), &[35.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0]);

        // Channel interleave: band_1 then band_2 per pixel.
        assert_eq!(inputs.images.get(0, 0, 0, 0), 1.0);
        assert_eq!(inputs.images.get(0, 0, 0, 1), 0.0);
    }

    #[test]
    fn test_assemble_resizes_to_input_size() {
        let ds = Dataset::new(vec![record("a", 1.0, Some(35.0), Some(1))]).unwrap();
        let inputs = ds.assemble(Some((8, 8))).unwrap();
        assert_eq!(inputs.images.shape(), (1, 8, 8, 2));
    }

    #[test]
    fn test_assemble_requires_angles() {
        let ds = Dataset::new(vec![record("a", 1.0, None, Some(1))]).unwrap();
        assert!(ds.assemble(None).is_err());
    }

    #[test]
    fn test_from_json_file_roundtrip() {
        use std::io::Write;

        let records = vec![
            record("a", 1.0, Some(35.0), Some(1)),
            record("b", 2.0, None, Some(0)),
        ];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.json");
        let mut file = File::create(&path).unwrap();
        write!(file, "{}", serde_json::to_string(&records).unwrap()).unwrap();

        let ds = Dataset::from_json_file(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.ids(), vec!["a", "b"]);
        assert_eq!(ds.records()[1].inc_angle, None);
    }
}
