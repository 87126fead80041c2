use crate::dataset::collate::{Batch, Sample, collate};
use crate::error::DatasetResult;

/// An indexable collection of detection samples.
///
/// `get` takes `&self` and implementations hold no per-call state, so a loader can call it
/// from several threads at once.
pub trait DetectionDataset {
    fn len(&self) -> usize;

    fn get(&self, index: usize) -> DatasetResult<Sample>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sequential, unshuffled batches over a [`DetectionDataset`]. The last batch may be short.
///
/// Any error from loading or collating ends up in the yielded item; iteration then moves on to
/// the next batch and the caller decides whether to stop.
pub struct Batches<'a, D: DetectionDataset + ?Sized> {
    dataset: &'a D,
    batch_size: usize,
    cursor: usize,
    end: usize,
}

impl<'a, D: DetectionDataset + ?Sized> Batches<'a, D> {
    /// `batch_size` of zero is treated as one.
    pub fn new(dataset: &'a D, batch_size: usize) -> Self {
        Batches {
            dataset,
            batch_size: batch_size.max(1),
            cursor: 0,
            end: dataset.len(),
        }
    }

    /// Stops after the first `samples` samples. The batch that reaches the cap is cut short
    /// instead of loading past it.
    pub fn limit(mut self, samples: usize) -> Self {
        self.end = self.end.min(samples);
        self
    }
}

impl<D: DetectionDataset + ?Sized> Iterator for Batches<'_, D> {
    type Item = DatasetResult<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.end {
            return None;
        }
        let end = (self.cursor + self.batch_size).min(self.end);
        let range = self.cursor..end;
        self.cursor = end;
        Some(
            range
                .map(|index| self.dataset.get(index))
                .collect::<DatasetResult<Vec<Sample>>>()
                .and_then(collate),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end.saturating_sub(self.cursor);
        let batches = remaining.div_ceil(self.batch_size);
        (batches, Some(batches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatasetError;
    use ndarray::{Array1, Array2, Array3};

    /// Sample `i` has `i` boxes; index 3 fails to load.
    struct Synthetic {
        len: usize,
    }

    impl DetectionDataset for Synthetic {
        fn len(&self) -> usize {
            self.len
        }

        fn get(&self, index: usize) -> DatasetResult<Sample> {
            if index == 3 {
                return Err(DatasetError::MissingImageRecord { image_id: 3 });
            }
            Ok(Sample {
                image: Array3::zeros((3, 2, 2)),
                boxes: Array2::zeros((index, 4)),
                labels: Array1::zeros(index),
            })
        }
    }

    #[test]
    fn batches_cover_dataset_in_order() {
        let dataset = Synthetic { len: 3 };
        let batches: Vec<Batch> = Batches::new(&dataset, 2)
            .collect::<DatasetResult<_>>()
            .unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[1].len(), 1);
        assert_eq!(batches[1].boxes[0].nrows(), 2);
    }

    #[test]
    fn size_hint_counts_partial_batch() {
        let dataset = Synthetic { len: 3 };
        assert_eq!(Batches::new(&dataset, 2).size_hint(), (2, Some(2)));
        assert_eq!(Batches::new(&dataset, 0).size_hint(), (3, Some(3)));
    }

    #[test]
    fn failing_sample_fails_its_batch_only() {
        let dataset = Synthetic { len: 6 };
        let results: Vec<bool> = Batches::new(&dataset, 2).map(|b| b.is_ok()).collect();
        assert_eq!(results, vec![true, false, true]);
    }

    #[test]
    fn limit_truncates_the_last_batch() {
        let dataset = Synthetic { len: 10 };
        let sizes: Vec<usize> = Batches::new(&dataset, 8)
            .limit(3)
            .map(|b| b.unwrap().len())
            .collect();
        assert_eq!(sizes, vec![3]);
        let sizes: Vec<usize> = Batches::new(&dataset, 2)
            .limit(3)
            .map(|b| b.unwrap().len())
            .collect();
        assert_eq!(sizes, vec![2, 1]);
        assert_eq!(Batches::new(&dataset, 2).limit(3).size_hint(), (2, Some(2)));
        assert_eq!(Batches::new(&dataset, 2).limit(0).count(), 0);
    }
}
