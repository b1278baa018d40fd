use std::fmt;

use md_parsers::Samples;
use shared::numeric_methods::{
    count_nan,
    min_max,
};


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchNanCount {
    pub ibatch: usize,
    pub nnan:   usize,
    pub total:  usize,
}


impl fmt::Display for BatchNanCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Batch {}: {}/{} NaN values", self.ibatch, self.nnan, self.total)
    }
}


#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValueStats {
    pub min:  f64,
    pub max:  f64,
    pub mean: f64,
}


#[derive(Clone, Debug, PartialEq)]
pub struct NanReport {
    pub nbatches: usize,

    /// Batches whose `x_pred` contains at least one NaN.
    pub invalid:  Vec<BatchNanCount>,

    /// Statistics of the first batch's `x_pred`, only when every batch is valid.
    pub first_batch_stats: Option<ValueStats>,
}


impl NanReport {
    pub fn nvalid(&self) -> usize { self.nbatches - self.invalid.len() }
    pub fn is_clean(&self) -> bool { self.invalid.is_empty() }
}


impl fmt::Display for NanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.invalid.iter() {
            writeln!(f, "{}", b)?;
        }
        writeln!(f, "Valid batches:   {}/{}", self.nvalid(), self.nbatches)?;
        write!(f,   "Invalid batches: {}/{}", self.invalid.len(), self.nbatches)?;
        if let Some(s) = self.first_batch_stats {
            writeln!(f)?;
            writeln!(f, "Sample x_pred stats (first batch):")?;
            writeln!(f, "  Min:  {:.4}", s.min)?;
            writeln!(f, "  Max:  {:.4}", s.max)?;
            write!(f,   "  Mean: {:.4}", s.mean)?;
        }
        Ok(())
    }
}


/// Count the NaN entries in `x_pred` of every batch.
pub fn scan_samples(samples: &Samples) -> NanReport {
    let invalid = samples.batches.iter()
        .enumerate()
        .map(|(ibatch, b)| BatchNanCount {
            ibatch,
            nnan: count_nan(b.x_pred.iter()),
            total: b.x_pred.len(),
        })
        .filter(|c| c.nnan > 0)
        .collect::<Vec<_>>();

    let first_batch_stats = if invalid.is_empty() {
        samples.batches.first().and_then(|b| {
            let (min, max) = min_max(b.x_pred.iter())?;
            let mean = b.x_pred.mean()?;
            Some(ValueStats { min, max, mean })
        })
    } else {
        None
    };

    NanReport {
        nbatches: samples.len(),
        invalid,
        first_batch_stats,
    }
}
