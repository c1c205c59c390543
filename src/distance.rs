use crate::error::{KnnError, Result};

/// signature shared by the distance functions
pub type DistanceFn = fn(&[f64], &[f64]) -> Result<f64>;

/// makes sure both vectors have the same length before they are zipped
fn check_dims(a_data: &[f64], b_data: &[f64]) -> Result<()> {
    if a_data.len() != b_data.len() {
        return Err(KnnError::DimensionMismatch {
            expected: a_data.len(),
            found: b_data.len(),
        });
    }

    Ok(())
}

/// calculates the euclidean distance between 2 sets of datapoints
pub fn euclidean(a_data: &[f64], b_data: &[f64]) -> Result<f64> {
    check_dims(a_data, b_data)?;

    Ok(a_data
        .iter()
        .zip(b_data)
        .map(|(a, b)| (a - b).powf(2.0))
        .sum::<f64>()
        .sqrt())
}

/// calculates the manhattan distance between 2 sets of datapoints
pub fn manhattan(a_data: &[f64], b_data: &[f64]) -> Result<f64> {
    check_dims(a_data, b_data)?;

    Ok(a_data
        .iter()
        .zip(b_data)
        .map(|(a, b)| (a - b).abs())
        .sum::<f64>())
}
