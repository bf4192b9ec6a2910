//! Submission output: the two-column (id, probability) result file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{IcefoldError, Result};

/// Writes blended probabilities as a `id,is_iceberg` CSV file.
///
/// One row per sample, in the given order, probabilities with six decimal
/// places.
///
/// # Errors
///
/// Returns an error if the id and probability counts differ or the file
/// can't be written.
///
/// # Examples
///
/// ```no_run
/// use icefold::submission::write_submission;
///
/// write_submission("submission.csv", vec!["5941774d", "4023181e"], &[0.42, 0.91])?;
/// # Ok::<(), icefold::IcefoldError>(())
/// ```
pub fn write_submission<P: AsRef<Path>>(
    path: P,
    ids: Vec<&str>,
    probabilities: &[f32],
) -> Result<()> {
    if ids.len() != probabilities.len() {
        return Err(IcefoldError::DimensionMismatch {
            expected: format!("{} probabilities", ids.len()),
            actual: format!("{} probabilities", probabilities.len()),
        });
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "id,is_iceberg")?;
    for (id, prob) in ids.iter().zip(probabilities) {
        writeln!(writer, "{id},{prob:.6}")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submission.csv");
        write_submission(&path, vec!["a1", "b2"], &[0.5, 0.123456789]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["id,is_iceberg", "a1,0.500000", "b2,0.123457"]);
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submission.csv");
        assert!(write_submission(&path, vec!["a1"], &[0.5, 0.6]).is_err());
    }

    #[test]
    fn test_empty_submission_is_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submission.csv");
        write_submission(&path, Vec::new(), &[]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "id,is_iceberg\n");
    }
}
