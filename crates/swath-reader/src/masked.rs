//! Data array paired with an invalid-sample mask.

use ndarray::{ArrayD, IxDyn, Zip};

use crate::error::{ReaderError, Result};

/// Swath values with a mask; `true` in the mask marks an invalid sample.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedArray {
    data: ArrayD<f64>,
    mask: ArrayD<bool>,
}

impl MaskedArray {
    pub fn new(data: ArrayD<f64>, mask: ArrayD<bool>) -> Result<Self> {
        if data.shape() != mask.shape() {
            return Err(ReaderError::config(format!(
                "mask shape {:?} doesn't match data shape {:?}",
                mask.shape(),
                data.shape()
            )));
        }
        Ok(Self { data, mask })
    }

    /// An unmasked array of zeros.
    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            data: ArrayD::zeros(IxDyn(shape)),
            mask: ArrayD::from_elem(IxDyn(shape), false),
        }
    }

    /// Wrap `data` with nothing masked.
    pub fn unmasked(data: ArrayD<f64>) -> Self {
        let mask = ArrayD::from_elem(data.raw_dim(), false);
        Self { data, mask }
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    pub fn mask(&self) -> &ArrayD<bool> {
        &self.mask
    }

    pub fn into_parts(self) -> (ArrayD<f64>, ArrayD<bool>) {
        (self.data, self.mask)
    }

    /// Mask every sample where `extra` is set as well.
    pub fn mask_where(&mut self, extra: &ArrayD<bool>) -> Result<()> {
        if extra.shape() != self.mask.shape() {
            return Err(ReaderError::config(format!(
                "extra mask shape {:?} doesn't match data shape {:?}",
                extra.shape(),
                self.mask.shape()
            )));
        }
        Zip::from(&mut self.mask).and(extra).for_each(|m, &e| *m |= e);
        Ok(())
    }

    /// Unmasked values in logical order.
    pub fn valid_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.data
            .iter()
            .zip(self.mask.iter())
            .filter(|(_, masked)| !**masked)
            .map(|(&v, _)| v)
    }

    pub fn count_valid(&self) -> usize {
        self.mask.iter().filter(|&&m| !m).count()
    }

    pub fn mean(&self) -> Option<f64> {
        let count = self.count_valid();
        if count == 0 {
            return None;
        }
        Some(self.valid_values().sum::<f64>() / count as f64)
    }

    pub fn min(&self) -> Option<f64> {
        self.valid_values().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.valid_values().reduce(f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_statistics_skip_masked() {
        let data = array![[1.0, 2.0], [3.0, 100.0]].into_dyn();
        let mask = array![[false, false], [false, true]].into_dyn();
        let arr = MaskedArray::new(data, mask).unwrap();

        assert_eq!(arr.count_valid(), 3);
        assert_eq!(arr.mean(), Some(2.0));
        assert_eq!(arr.min(), Some(1.0));
        assert_eq!(arr.max(), Some(3.0));
        assert_eq!(arr.valid_values().collect::<Vec<_>>(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_fully_masked_has_no_statistics() {
        let mut arr = MaskedArray::zeros(&[2]);
        arr.mask_where(&array![true, true].into_dyn()).unwrap();
        assert_eq!(arr.count_valid(), 0);
        assert_eq!(arr.mean(), None);
        assert_eq!(arr.max(), None);
    }

    #[test]
    fn test_shape_checks() {
        let err = MaskedArray::new(ArrayD::zeros(IxDyn(&[2, 2])), ArrayD::from_elem(IxDyn(&[4]), false));
        assert!(err.is_err());
        let mut arr = MaskedArray::zeros(&[2, 2]);
        assert!(arr.mask_where(&ArrayD::from_elem(IxDyn(&[3]), true)).is_err());
    }
}
