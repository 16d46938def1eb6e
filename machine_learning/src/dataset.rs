use std::num::NonZeroUsize;

use ndarray::{ArrayView2, Axis};
use rand::{Rng, seq::SliceRandom};

use crate::{MlErr, Result};

/// A set of training cases stored row by row, each row being the inputs followed by the
/// expected outputs (the truths) of a case.
///
/// The cases keep the order they were given in, shuffling only changes the order `batches`
/// visits them.
#[derive(Debug, Clone)]
pub struct Dataset {
    x_size: usize,
    y_size: usize,
    data: Vec<f32>,
    shuffled: Option<Vec<f32>>,
}

impl Dataset {
    /// Creates a new `Dataset`.
    ///
    /// # Arguments
    /// * `data` - The cases, `x_size + y_size` values per row.
    /// * `x_size` - The amount of inputs of each case.
    /// * `y_size` - The amount of expected outputs of each case.
    ///
    /// # Returns
    /// The dataset or an error if `data` can't be split in rows.
    pub fn new(data: Vec<f32>, x_size: usize, y_size: usize) -> Result<Self> {
        let row_size = x_size + y_size;

        if x_size == 0 || y_size == 0 || data.len() % row_size != 0 {
            return Err(MlErr::InvalidDataset {
                len: data.len(),
                row_size,
            });
        }

        if data.is_empty() {
            return Err(MlErr::EmptyDataset);
        }

        Ok(Self {
            x_size,
            y_size,
            data,
            shuffled: None,
        })
    }

    /// Creates a new `Dataset` from separate input and truth rows.
    ///
    /// # Returns
    /// The dataset or an error if there are no cases, the amount of input and truth rows differ
    /// or the rows don't all have the same width.
    pub fn from_cases<X, Y>(inputs: &[X], truths: &[Y]) -> Result<Self>
    where
        X: AsRef<[f32]>,
        Y: AsRef<[f32]>,
    {
        if inputs.len() != truths.len() {
            return Err(MlErr::SizeMismatch {
                what: "truth cases",
                got: truths.len(),
                expected: inputs.len(),
            });
        }

        let (Some(x0), Some(y0)) = (inputs.first(), truths.first()) else {
            return Err(MlErr::EmptyDataset);
        };

        let x_size = x0.as_ref().len();
        let y_size = y0.as_ref().len();
        let mut data = Vec::with_capacity(inputs.len() * (x_size + y_size));

        for (x, y) in inputs.iter().zip(truths) {
            let (x, y) = (x.as_ref(), y.as_ref());

            if x.len() != x_size {
                return Err(MlErr::SizeMismatch {
                    what: "case inputs",
                    got: x.len(),
                    expected: x_size,
                });
            }

            if y.len() != y_size {
                return Err(MlErr::SizeMismatch {
                    what: "case truths",
                    got: y.len(),
                    expected: y_size,
                });
            }

            data.extend_from_slice(x);
            data.extend_from_slice(y);
        }

        Self::new(data, x_size, y_size)
    }

    /// The amount of cases.
    pub fn len(&self) -> usize {
        self.data.len() / self.row_size()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn x_size(&self) -> usize {
        self.x_size
    }

    pub fn y_size(&self) -> usize {
        self.y_size
    }

    /// Returns a view over the inputs of every case, in their original order.
    pub fn inputs(&self) -> ArrayView2<'_, f32> {
        self.split_rows(&self.data).0
    }

    /// Returns a view over the truths of every case, in their original order.
    pub fn truths(&self) -> ArrayView2<'_, f32> {
        self.split_rows(&self.data).1
    }

    /// Draws a new order for `batches` to visit the cases in.
    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        let row_size = self.row_size();
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.shuffle(rng);

        let mut shuffled = self.shuffled.take().unwrap_or_default();
        shuffled.clear();
        shuffled.extend(
            order
                .into_iter()
                .flat_map(|i| &self.data[i * row_size..(i + 1) * row_size]),
        );
        self.shuffled = Some(shuffled);
    }

    /// Iterates the cases `batch_size` at a time, in their original order unless shuffled. The
    /// last batch might be smaller.
    pub fn batches(
        &self,
        batch_size: NonZeroUsize,
    ) -> impl Iterator<Item = (ArrayView2<'_, f32>, ArrayView2<'_, f32>)> {
        let chunk = batch_size.get() * self.row_size();
        let rows = self.shuffled.as_deref().unwrap_or(&self.data);

        rows.chunks(chunk).map(|rows| self.split_rows(rows))
    }

    fn row_size(&self) -> usize {
        self.x_size + self.y_size
    }

    fn split_rows<'a>(&self, rows: &'a [f32]) -> (ArrayView2<'a, f32>, ArrayView2<'a, f32>) {
        let nrows = rows.len() / self.row_size();
        let view = ArrayView2::from_shape((nrows, self.row_size()), rows)
            .expect("rows are always a multiple of the row size");

        view.split_at(Axis(1), self.x_size)
    }
}
