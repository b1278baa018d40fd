use std::iter;
use std::ops::Div;
use num_traits::{Float, NumAssign};
use ordered_float::OrderedFloat;


pub fn mean<T, I>(xs: I) -> T
where T: NumAssign + Copy + Div<f64, Output=T> + iter::Sum<T>,
      I: AsRef<[T]>,
{
    let xs = xs.as_ref();
    let len = xs.len();
    assert!(len > 0);
    xs.iter().cloned().sum::<T>() / len as f64
}


/// Sample standard deviation, normalized by `n - 1`.
///
/// Returns `NaN` when fewer than two values are given.
pub fn std_dev<I>(xs: I) -> f64
where I: AsRef<[f64]>,
{
    let xs = xs.as_ref();
    let len = xs.len();
    if len < 2 {
        return f64::NAN;
    }

    let xs_mean: f64 = mean(xs);
    let ss = xs.iter()
        .map(|x| (x - xs_mean).powi(2))
        .sum::<f64>();
    (ss / (len - 1) as f64).sqrt()
}


/// Median without interpolation: the lower of the two middle values is taken for even lengths.
///
/// `NaN` values sort last. Returns `None` for empty input.
pub fn median_lower<I>(xs: I) -> Option<f64>
where I: AsRef<[f64]>,
{
    let xs = xs.as_ref();
    if xs.is_empty() {
        return None;
    }

    let mut sorted = xs.iter()
        .cloned()
        .map(OrderedFloat)
        .collect::<Vec<_>>();
    let mid = (sorted.len() - 1) / 2;
    let (_, m, _) = sorted.select_nth_unstable(mid);
    Some(m.0)
}


/// Minimum and maximum of the non-NaN values, `None` if there are none.
pub fn min_max<'a, T, I>(xs: I) -> Option<(T, T)>
where T: Float + 'a,
      I: IntoIterator<Item=&'a T>,
{
    xs.into_iter()
        .cloned()
        .filter(|x| !x.is_nan())
        .fold(None, |acc, x| match acc {
            None => Some((x, x)),
            Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
        })
}


/// Number of `NaN` entries.
pub fn count_nan<'a, T, I>(xs: I) -> usize
where T: Float + 'a,
      I: IntoIterator<Item=&'a T>,
{
    xs.into_iter().filter(|x| x.is_nan()).count()
}
