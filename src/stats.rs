//! Statistics over the data of a map.
//!
//! Three summaries are provided. [`DescriptiveStatistics`] sorts the data
//! and yields exact percentiles; [`FastStatistics`] makes two linear passes
//! and approximates percentiles with fine histograms, which is what palette
//! scaling needs; [`Histogram`] counts values into equally wide buckets.
//!
//! Each summary can be restricted with a [`RangeFilter`], which keeps only
//! values inside a positive band, a negative band and, optionally, zeros.
//! Non-finite values never take part.
//!
//! [`DescriptiveStatistics`]: ./struct.DescriptiveStatistics.html
//! [`FastStatistics`]: ./struct.FastStatistics.html
//! [`Histogram`]: ./struct.Histogram.html
//! [`RangeFilter`]: ./struct.RangeFilter.html

use approx::abs_diff_eq;
use std::f32;

/// Magnitude under which a value is treated as zero.
pub const ZERO_TOLERANCE: f32 = 1.0e-6;

/// Default number of buckets of a [`Histogram`](./struct.Histogram.html).
pub const DEFAULT_HISTOGRAM_BUCKETS: usize = 100;

const FAST_PERCENTILE_BUCKETS: usize = 1000;

fn is_zero(value: f32) -> bool {
    abs_diff_eq!(value, 0.0, epsilon = ZERO_TOLERANCE)
}

/// Inclusive bands of values kept for a ranged summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeFilter {
    /// Positive values above this are excluded.
    pub most_positive: f32,
    /// Positive values below this are excluded.
    pub least_positive: f32,
    /// Negative values above this are excluded.
    pub least_negative: f32,
    /// Negative values below this are excluded.
    pub most_negative: f32,
    /// Whether values very near zero are kept.
    pub include_zero: bool,
}

impl RangeFilter {
    /// Create a filter from its five parameters.
    pub fn new(
        most_positive: f32,
        least_positive: f32,
        least_negative: f32,
        most_negative: f32,
        include_zero: bool,
    ) -> Self {
        RangeFilter {
            most_positive,
            least_positive,
            least_negative,
            most_negative,
            include_zero,
        }
    }

    /// A filter keeping every finite value.
    pub fn all() -> Self {
        RangeFilter::new(f32::INFINITY, 0., 0., f32::NEG_INFINITY, true)
    }

    /// Whether `value` is kept.
    pub fn includes(&self, value: f32) -> bool {
        if !value.is_finite() {
            false
        } else if is_zero(value) {
            self.include_zero
        } else if value > 0. {
            value >= self.least_positive && value <= self.most_positive
        } else {
            value <= self.least_negative && value >= self.most_negative
        }
    }
}

fn filtered<'a>(data: &'a [f32], filter: &'a RangeFilter) -> impl Iterator<Item = f32> + 'a {
    data.iter().cloned().filter(move |v| filter.includes(*v))
}

/// Extremes of the signed bands, shared by the statistics types.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct SignedExtremes {
    most_positive: f32,
    least_positive: f32,
    least_negative: f32,
    most_negative: f32,
    positive_count: usize,
    negative_count: usize,
}

impl SignedExtremes {
    fn from_values<I: Iterator<Item = f32>>(values: I) -> Self {
        let mut e = SignedExtremes {
            most_positive: 0.,
            least_positive: f32::MAX,
            least_negative: f32::MIN,
            most_negative: 0.,
            positive_count: 0,
            negative_count: 0,
        };
        for v in values {
            if is_zero(v) {
                continue;
            }
            if v > 0. {
                e.positive_count += 1;
                e.most_positive = e.most_positive.max(v);
                e.least_positive = e.least_positive.min(v);
            } else {
                e.negative_count += 1;
                e.most_negative = e.most_negative.min(v);
                e.least_negative = e.least_negative.max(v);
            }
        }
        if e.positive_count == 0 {
            e.least_positive = 0.;
        }
        if e.negative_count == 0 {
            e.least_negative = 0.;
        }
        e
    }
}

/// Exact statistics, including percentiles, of a set of values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DescriptiveStatistics {
    count: usize,
    mean: f32,
    population_standard_deviation: f32,
    sample_standard_deviation: f32,
    minimum: f32,
    maximum: f32,
    extremes: SignedExtremes,
    /// 101 entries, one per integer percentile, or empty
    percentiles: Vec<f32>,
}

impl DescriptiveStatistics {
    /// Statistics of nothing.
    pub fn new() -> Self {
        DescriptiveStatistics::default()
    }

    /// Recompute over all finite values of `data`.
    pub fn update(&mut self, data: &[f32]) {
        self.update_ranged(data, &RangeFilter::all());
    }

    /// Recompute over the values of `data` kept by `filter`.
    pub fn update_ranged(&mut self, data: &[f32], filter: &RangeFilter) {
        let mut values: Vec<f32> = filtered(data, filter).collect();
        if values.is_empty() {
            *self = DescriptiveStatistics::new();
            return;
        }
        values.sort_by(|a, b| a.total_cmp(b));

        let n = values.len();
        let sum: f64 = values.iter().map(|v| f64::from(*v)).sum();
        let mean = sum / n as f64;
        let ss: f64 = values
            .iter()
            .map(|v| {
                let d = f64::from(*v) - mean;
                d * d
            })
            .sum();

        let percentiles = (0..=100)
            .map(|p| interpolated_percentile(&values, p as f32))
            .collect();

        *self = DescriptiveStatistics {
            count: n,
            mean: mean as f32,
            population_standard_deviation: (ss / n as f64).sqrt() as f32,
            sample_standard_deviation: if n > 1 {
                (ss / (n - 1) as f64).sqrt() as f32
            } else {
                0.
            },
            minimum: values[0],
            maximum: values[n - 1],
            extremes: SignedExtremes::from_values(values.iter().cloned()),
            percentiles,
        };
    }

    /// Number of values summarized.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Arithmetic mean.
    pub fn mean(&self) -> f32 {
        self.mean
    }

    /// Standard deviation with `n` in the denominator.
    pub fn population_standard_deviation(&self) -> f32 {
        self.population_standard_deviation
    }

    /// Standard deviation with `n - 1` in the denominator.
    pub fn sample_standard_deviation(&self) -> f32 {
        self.sample_standard_deviation
    }

    /// Smallest value.
    pub fn minimum(&self) -> f32 {
        self.minimum
    }

    /// Largest value.
    pub fn maximum(&self) -> f32 {
        self.maximum
    }

    /// Median value.
    pub fn median(&self) -> f32 {
        self.percentile(50.)
    }

    /// Largest positive value, or zero.
    pub fn most_positive_value(&self) -> f32 {
        self.extremes.most_positive
    }

    /// Smallest positive value, or zero.
    pub fn least_positive_value(&self) -> f32 {
        self.extremes.least_positive
    }

    /// Negative value closest to zero, or zero.
    pub fn least_negative_value(&self) -> f32 {
        self.extremes.least_negative
    }

    /// Most negative value, or zero.
    pub fn most_negative_value(&self) -> f32 {
        self.extremes.most_negative
    }

    /// Value at `percent` (in `[0, 100]`), interpolated between the integer
    /// percentiles. Zero when no value was summarized.
    pub fn percentile(&self, percent: f32) -> f32 {
        if self.percentiles.is_empty() {
            return 0.;
        }
        let p = percent.max(0.).min(100.);
        let lo = p.floor() as usize;
        let hi = p.ceil() as usize;
        let t = p - lo as f32;
        self.percentiles[lo] + t * (self.percentiles[hi] - self.percentiles[lo])
    }
}

fn interpolated_percentile(sorted: &[f32], percent: f32) -> f32 {
    let rank = percent / 100. * (sorted.len() - 1) as f32;
    let lo = rank.floor() as usize;
    let hi = (rank.ceil() as usize).min(sorted.len() - 1);
    let t = rank - lo as f32;
    sorted[lo] + t * (sorted[hi] - sorted[lo])
}

/// Statistics computed in linear time, with approximate percentiles.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FastStatistics {
    count: usize,
    mean: f32,
    standard_deviation: f32,
    minimum: f32,
    maximum: f32,
    extremes: SignedExtremes,
    positive_buckets: Vec<u64>,
    negative_buckets: Vec<u64>,
}

impl FastStatistics {
    /// Statistics of nothing.
    pub fn new() -> Self {
        FastStatistics::default()
    }

    /// Recompute over all finite values of `data`.
    pub fn update(&mut self, data: &[f32]) {
        let filter = RangeFilter::all();
        let mut count = 0usize;
        let mut sum = 0f64;
        let mut sum2 = 0f64;
        let mut minimum = f32::MAX;
        let mut maximum = f32::MIN;
        for v in filtered(data, &filter) {
            count += 1;
            sum += f64::from(v);
            sum2 += f64::from(v) * f64::from(v);
            minimum = minimum.min(v);
            maximum = maximum.max(v);
        }
        if count == 0 {
            *self = FastStatistics::new();
            return;
        }
        let mean = sum / count as f64;
        let variance = (sum2 / count as f64 - mean * mean).max(0.);
        let extremes = SignedExtremes::from_values(filtered(data, &filter));

        let mut positive_buckets = vec![0u64; FAST_PERCENTILE_BUCKETS];
        let mut negative_buckets = vec![0u64; FAST_PERCENTILE_BUCKETS];
        for v in filtered(data, &filter) {
            if is_zero(v) {
                continue;
            }
            if v > 0. {
                positive_buckets[bucket_of(v, extremes.most_positive)] += 1;
            } else {
                negative_buckets[bucket_of(-v, -extremes.most_negative)] += 1;
            }
        }

        *self = FastStatistics {
            count,
            mean: mean as f32,
            standard_deviation: variance.sqrt() as f32,
            minimum,
            maximum,
            extremes,
            positive_buckets,
            negative_buckets,
        };
    }

    /// Number of values summarized.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Arithmetic mean.
    pub fn mean(&self) -> f32 {
        self.mean
    }

    /// Population standard deviation.
    pub fn standard_deviation(&self) -> f32 {
        self.standard_deviation
    }

    /// Smallest value.
    pub fn minimum(&self) -> f32 {
        self.minimum
    }

    /// Largest value.
    pub fn maximum(&self) -> f32 {
        self.maximum
    }

    /// Largest positive value, or zero.
    pub fn most_positive_value(&self) -> f32 {
        self.extremes.most_positive
    }

    /// Smallest positive value, or zero.
    pub fn least_positive_value(&self) -> f32 {
        self.extremes.least_positive
    }

    /// Negative value closest to zero, or zero.
    pub fn least_negative_value(&self) -> f32 {
        self.extremes.least_negative
    }

    /// Most negative value, or zero.
    pub fn most_negative_value(&self) -> f32 {
        self.extremes.most_negative
    }

    /// Approximate value below which `percent` of the positive values lie.
    pub fn approximate_positive_percentile(&self, percent: f32) -> f32 {
        approximate_percentile(&self.positive_buckets, self.extremes.most_positive, percent)
    }

    /// Approximate negative value whose magnitude exceeds that of `percent`
    /// of the negative values.
    pub fn approximate_negative_percentile(&self, percent: f32) -> f32 {
        -approximate_percentile(&self.negative_buckets, -self.extremes.most_negative, percent)
    }
}

/// Bucket of a magnitude in `(0, max]` among `FAST_PERCENTILE_BUCKETS`.
fn bucket_of(magnitude: f32, max: f32) -> usize {
    if max <= 0. {
        return 0;
    }
    let b = (magnitude / max * FAST_PERCENTILE_BUCKETS as f32) as usize;
    b.min(FAST_PERCENTILE_BUCKETS - 1)
}

fn approximate_percentile(buckets: &[u64], max: f32, percent: f32) -> f32 {
    let total: u64 = buckets.iter().sum();
    if total == 0 {
        return 0.;
    }
    let wanted = (f64::from(percent.max(0.).min(100.)) / 100. * total as f64).ceil() as u64;
    let width = max / buckets.len() as f32;
    let mut seen = 0u64;
    for (i, c) in buckets.iter().enumerate() {
        seen += c;
        if seen >= wanted.max(1) {
            return (i + 1) as f32 * width;
        }
    }
    max
}

/// Counts of values in equally wide buckets.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    buckets: Vec<u64>,
    minimum: f32,
    maximum: f32,
    count: u64,
}

impl Default for Histogram {
    fn default() -> Self {
        Histogram::new(DEFAULT_HISTOGRAM_BUCKETS)
    }
}

impl Histogram {
    /// An empty histogram with the given number of buckets (at least one).
    pub fn new(number_of_buckets: usize) -> Self {
        Histogram {
            buckets: vec![0; number_of_buckets.max(1)],
            minimum: 0.,
            maximum: 0.,
            count: 0,
        }
    }

    /// Recount all finite values of `data`.
    pub fn update(&mut self, data: &[f32]) {
        self.update_ranged(data, &RangeFilter::all());
    }

    /// Recount the values of `data` kept by `filter`.
    pub fn update_ranged(&mut self, data: &[f32], filter: &RangeFilter) {
        for b in self.buckets.iter_mut() {
            *b = 0;
        }
        self.count = 0;
        self.minimum = 0.;
        self.maximum = 0.;

        let mut minimum = f32::MAX;
        let mut maximum = f32::MIN;
        for v in filtered(data, filter) {
            minimum = minimum.min(v);
            maximum = maximum.max(v);
            self.count += 1;
        }
        if self.count == 0 {
            return;
        }
        self.minimum = minimum;
        self.maximum = maximum;

        let n = self.buckets.len();
        let range = maximum - minimum;
        for v in filtered(data, filter) {
            let b = if range > 0. {
                (((v - minimum) / range * n as f32) as usize).min(n - 1)
            } else {
                0
            };
            self.buckets[b] += 1;
        }
    }

    /// Count of values in each bucket.
    pub fn buckets(&self) -> &[u64] {
        &self.buckets
    }

    /// Number of buckets.
    pub fn number_of_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Total number of values counted.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Smallest and largest value counted, or zeros.
    pub fn range(&self) -> (f32, f32) {
        (self.minimum, self.maximum)
    }

    /// Width of one bucket.
    pub fn bucket_width(&self) -> f32 {
        (self.maximum - self.minimum) / self.buckets.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> Vec<f32> {
        vec![-4., -2., -1., 0., 0., 1., 2., 3., 4., 5., f32::NAN]
    }

    #[test]
    fn descriptive() {
        let mut ds = DescriptiveStatistics::new();
        ds.update(&data());
        assert_eq!(ds.count(), 10);
        assert_eq!(ds.mean(), 0.8);
        assert_eq!(ds.minimum(), -4.);
        assert_eq!(ds.maximum(), 5.);
        assert_eq!(ds.median(), 0.5);
        assert_eq!(ds.percentile(0.), -4.);
        assert_eq!(ds.percentile(100.), 5.);
        assert_eq!(ds.most_positive_value(), 5.);
        assert_eq!(ds.least_positive_value(), 1.);
        assert_eq!(ds.least_negative_value(), -1.);
        assert_eq!(ds.most_negative_value(), -4.);
    }

    #[test]
    fn ranged_excludes_outliers() {
        let mut ds = DescriptiveStatistics::new();
        ds.update_ranged(&data(), &RangeFilter::new(4., 1., -1., -2., false));
        assert_eq!(ds.count(), 6);
        assert_eq!(ds.maximum(), 4.);
        assert_eq!(ds.minimum(), -2.);

        let mut h = Histogram::new(10);
        h.update_ranged(&data(), &RangeFilter::new(4., 1., -1., -2., true));
        assert_eq!(h.count(), 8);
    }

    #[test]
    fn ranged_all_equals_unranged() {
        let mut a = DescriptiveStatistics::new();
        let mut b = DescriptiveStatistics::new();
        a.update(&data());
        b.update_ranged(&data(), &RangeFilter::all());
        assert_eq!(a, b);

        let mut a = Histogram::new(7);
        let mut b = Histogram::new(7);
        a.update(&data());
        b.update_ranged(&data(), &RangeFilter::all());
        assert_eq!(a, b);
    }

    #[test]
    fn empty_resets() {
        let mut ds = DescriptiveStatistics::new();
        ds.update(&data());
        ds.update(&[]);
        assert_eq!(ds.count(), 0);
        assert_eq!(ds, DescriptiveStatistics::new());

        let mut fs = FastStatistics::new();
        fs.update(&data());
        fs.update(&[]);
        assert_eq!(fs.count(), 0);

        let mut h = Histogram::new(5);
        h.update(&data());
        h.update(&[]);
        assert_eq!(h.count(), 0);
        assert_eq!(h.buckets(), &[0, 0, 0, 0, 0]);
    }

    #[test]
    fn fast() {
        let values: Vec<f32> = (1..=100).map(|v| v as f32).collect();
        let mut fs = FastStatistics::new();
        fs.update(&values);
        assert_eq!(fs.count(), 100);
        assert_eq!(fs.mean(), 50.5);
        assert_eq!(fs.most_positive_value(), 100.);
        assert_eq!(fs.least_positive_value(), 1.);
        assert_eq!(fs.most_negative_value(), 0.);
        let p = fs.approximate_positive_percentile(50.);
        assert!((p - 50.).abs() <= 0.2, "{}", p);
        let p = fs.approximate_positive_percentile(100.);
        assert!((p - 100.).abs() <= 1e-3, "{}", p);
        assert_eq!(fs.approximate_negative_percentile(50.), 0.);
    }

    #[test]
    fn histogram_buckets() {
        let mut h = Histogram::new(5);
        h.update(&[0., 1., 2., 3., 4., 5.]);
        assert_eq!(h.range(), (0., 5.));
        assert_eq!(h.buckets(), &[1, 1, 1, 1, 2]);
        assert_eq!(h.bucket_width(), 1.);
    }
}
