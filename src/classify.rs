//! nearest neighbor selection for a single query vector
//!
//! every training sample is measured against the query, there is no index
//! and no pruning. the candidates are then grouped by exact distance and the
//! groups are walked from nearest to farthest, emitting labels until `k` of
//! them have been collected.
//!
//! when the last group needed does not fit into the remaining budget only the
//! first labels of that group (by training set order) are emitted and the
//! rest of the group is dropped.
//!
//! [`nearest_labels`] is a convenience function that allocates the buffers
//! for the candidates and selected labels.
//!
//! [`nearest_labels_buffered`] performs the actual selection and lets a
//! worker reuse its buffers across records.
use crate::distance::DistanceFn;
use crate::error::Result;
use crate::record::{Label, LabeledSample};

/// distance from the query to one training sample along with its label
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborCandidate {
    pub distance: f64,
    pub label: Label,
}

/// convenience function that will allocate memory for the candidates and
/// the selected labels.
///
/// refer to [`nearest_labels_buffered`]
pub fn nearest_labels<'a, R>(
    k: usize,
    samples: R,
    algo: DistanceFn,
    query: &[f64],
) -> Result<Vec<Label>>
where
    R: IntoIterator<Item = &'a LabeledSample>,
{
    let samples = samples.into_iter();
    let (min_size, _) = samples.size_hint();

    let mut collected = Vec::with_capacity(min_size);
    let mut labels = Vec::with_capacity(std::cmp::min(k, min_size));

    nearest_labels_buffered(k, samples, algo, query, &mut collected, &mut labels)?;

    Ok(labels)
}

/// selects the labels of the `k` nearest samples to `query`
///
/// both buffers are cleared before use. on success `labels` holds exactly
/// `min(k, samples)` labels ordered from nearest to farthest and the number
/// of labels is returned.
pub fn nearest_labels_buffered<'a, R>(
    k: usize,
    samples: R,
    algo: DistanceFn,
    query: &[f64],
    collected: &mut Vec<NeighborCandidate>,
    labels: &mut Vec<Label>,
) -> Result<usize>
where
    R: IntoIterator<Item = &'a LabeledSample>,
{
    collected.clear();
    labels.clear();

    for sample in samples {
        collected.push(NeighborCandidate {
            distance: algo(query, sample.features.as_slice())?,
            label: sample.label,
        });
    }

    // sort_by is stable so samples at the same distance keep their training
    // set order. floats do not implement Ord so f64::total_cmp is used
    collected.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    let groups = collected.chunk_by(|a, b| a.distance.total_cmp(&b.distance).is_eq());

    'groups: for group in groups {
        for candidate in group {
            if labels.len() >= k {
                break 'groups;
            }

            labels.push(candidate.label);
        }
    }

    Ok(labels.len())
}

#[cfg(test)]
mod test {
    //! datapoints used for the grid tests are the same small set of (x, y)
    //! points with two labels spread across a 3x3 area.
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use crate::distance;
    use crate::error::KnnError;

    use super::*;

    const T1: [f64; 2] = [1.5, 1.0];
    const T2: [f64; 2] = [1.5, 1.5];

    // (x, y) datapoints on a small graph
    const RECORDS: [([f64; 2], Label); 8] = [
        ([1.0, 1.0], 0),
        ([2.0, 2.0], 1),
        ([1.5, 2.5], 0),
        ([1.0, 3.0], 1),
        ([2.0, 1.0], 0),
        ([1.0, 2.0], 1),
        ([3.0, 1.0], 0),
        ([2.5, 1.5], 1),
    ];

    fn records() -> Vec<LabeledSample> {
        RECORDS
            .iter()
            .map(|(data, label)| LabeledSample::new(data.to_vec(), *label))
            .collect()
    }

    fn samples(list: &[(Vec<f64>, Label)]) -> Vec<LabeledSample> {
        list.iter()
            .map(|(data, label)| LabeledSample::new(data.clone(), *label))
            .collect()
    }

    #[test]
    fn k2_euclidean_t1() {
        let labels = nearest_labels(2, &records(), distance::euclidean, &T1).unwrap();

        assert_eq!(labels, vec![0, 0]);
    }

    #[test]
    fn k3_euclidean_t1() {
        // three samples are tied for the third spot, the first one in the
        // training set wins it
        let labels = nearest_labels(3, &records(), distance::euclidean, &T1).unwrap();

        assert_eq!(labels, vec![0, 0, 1]);
    }

    #[test]
    fn k3_manhattan_t1() {
        let labels = nearest_labels(3, &records(), distance::manhattan, &T1).unwrap();

        assert_eq!(labels, vec![0, 0, 1]);
    }

    #[test]
    fn k2_euclidean_t2() {
        // 4 datapoints are equidistant from t2 so the group is cut after the
        // first two in training set order
        let labels = nearest_labels(2, &records(), distance::euclidean, &T2).unwrap();

        assert_eq!(labels, vec![0, 1]);
    }

    #[test]
    fn k3_euclidean_t2() {
        let labels = nearest_labels(3, &records(), distance::euclidean, &T2).unwrap();

        assert_eq!(labels, vec![0, 1, 0]);
    }

    #[test]
    fn tie_group_is_cut_at_k() {
        let training = samples(&[
            (vec![1.0, 0.0], 10),
            (vec![0.0, 1.0], 20),
            (vec![2.0, 0.0], 30),
        ]);

        let labels = nearest_labels(1, &training, distance::euclidean, &[0.0, 0.0]).unwrap();
        assert_eq!(labels, vec![10]);

        let labels = nearest_labels(2, &training, distance::euclidean, &[0.0, 0.0]).unwrap();
        assert_eq!(labels, vec![10, 20]);

        let labels = nearest_labels(3, &training, distance::euclidean, &[0.0, 0.0]).unwrap();
        assert_eq!(labels, vec![10, 20, 30]);
    }

    #[test]
    fn ties_follow_training_order_not_position() {
        // the tied samples are not adjacent in the training set
        let training = samples(&[
            (vec![0.0, 1.0], 20),
            (vec![5.0, 5.0], 99),
            (vec![1.0, 0.0], 10),
            (vec![0.0, -1.0], 30),
        ]);

        let labels = nearest_labels(2, &training, distance::euclidean, &[0.0, 0.0]).unwrap();

        assert_eq!(labels, vec![20, 10]);
    }

    #[test]
    fn nearest_first_end_to_end() {
        let training = samples(&[
            (vec![0.0, 0.0], 0),
            (vec![10.0, 10.0], 1),
            (vec![0.0, 1.0], 0),
        ]);

        let labels = nearest_labels(2, &training, distance::euclidean, &[0.0, 0.0]).unwrap();

        assert_eq!(labels, vec![0, 0]);
    }

    #[test]
    fn k_larger_than_training_set() {
        let training = samples(&[(vec![3.0], 3), (vec![1.0], 1), (vec![2.0], 2)]);

        let labels = nearest_labels(10, &training, distance::euclidean, &[0.0]).unwrap();

        assert_eq!(labels, vec![1, 2, 3]);
    }

    #[test]
    fn empty_training_set() {
        let training: Vec<LabeledSample> = Vec::new();
        let labels = nearest_labels(3, &training, distance::euclidean, &[0.0]).unwrap();

        assert!(labels.is_empty());
    }

    #[test]
    fn returns_min_of_k_and_size() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..200 {
            let size = rng.random_range(0..40);
            let dims = rng.random_range(1..5);
            // coarse integer coordinates so plenty of distance ties show up
            let training: Vec<LabeledSample> = (0..size)
                .map(|_| {
                    let data = (0..dims)
                        .map(|_| rng.random_range(-3i32..=3) as f64)
                        .collect::<Vec<f64>>();

                    LabeledSample::new(data, rng.random_range(0..4))
                })
                .collect();
            let query: Vec<f64> = (0..dims)
                .map(|_| rng.random_range(-3i32..=3) as f64)
                .collect();
            let k = rng.random_range(1..50);

            let labels = nearest_labels(k, &training, distance::euclidean, &query).unwrap();

            assert_eq!(labels.len(), std::cmp::min(k, size));
        }
    }

    #[test]
    fn buffers_are_reused() {
        let training = records();
        let mut collected = Vec::new();
        let mut labels = Vec::new();

        let count = nearest_labels_buffered(
            3,
            &training,
            distance::euclidean,
            &T1,
            &mut collected,
            &mut labels,
        )
        .unwrap();
        assert_eq!(count, 3);

        let count = nearest_labels_buffered(
            2,
            &training,
            distance::euclidean,
            &T2,
            &mut collected,
            &mut labels,
        )
        .unwrap();
        assert_eq!(count, 2);
        assert_eq!(labels, vec![0, 1]);
        assert_eq!(collected.len(), training.len());
    }

    #[test]
    fn dimension_mismatch_is_reported() {
        let err = nearest_labels(2, &records(), distance::euclidean, &[1.0]).unwrap_err();

        assert!(matches!(err, KnnError::DimensionMismatch { .. }));
    }
}
