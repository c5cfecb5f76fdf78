//! Derived content of one map, computed on request and kept until invalidated.
//!
//! A [`MapContent`] holds the colors of a map's values and three statistical
//! summaries of them. Summaries are pulled: the first request computes one
//! from the map's data, later requests with the same range filter reuse it
//! until the data changes. Colors are recomputed only after an explicit
//! invalidation, which the owning file issues whenever the palette settings,
//! the label table or the data of the map change.
//!
//! Whether the content is *modified* (needs saving) is tracked apart from
//! whether the colors are stale, since a display change may need recoloring
//! without touching the data.
//!
//! [`MapContent`]: ./struct.MapContent.html

use crate::coloring;
use crate::error::Result;
use crate::mapping::{CiftiXml, PaletteHandle};
use crate::metadata::MetaData;
use crate::palette::PaletteFile;
use crate::stats::{DescriptiveStatistics, FastStatistics, Histogram, RangeFilter};
use rgb::RGBA;
use tracing::trace;

/// A memoized value, along with the range filter it was computed with.
#[derive(Debug, Clone, PartialEq)]
pub enum Cached<T> {
    /// Not computed, or computed from data that has since changed.
    Stale,
    /// Computed from the current data.
    Fresh {
        /// Filter the value was computed with.
        filter: RangeFilter,
        /// The value.
        value: T,
    },
}

impl<T> Default for Cached<T> {
    fn default() -> Self {
        Cached::Stale
    }
}

impl<T> Cached<T> {
    /// The value, if it is fresh and was computed with `filter`.
    pub fn get(&self, filter: &RangeFilter) -> Option<&T> {
        match self {
            Cached::Fresh { filter: f, value } if f == filter => Some(value),
            _ => None,
        }
    }

    /// Whether a value is held.
    pub fn is_fresh(&self) -> bool {
        matches!(self, Cached::Fresh { .. })
    }

    /// Drop the value.
    pub fn invalidate(&mut self) {
        *self = Cached::Stale;
    }

    /// Return the value computed with `filter`, computing it first if needed.
    fn get_or_try_update<F>(&mut self, filter: RangeFilter, compute: F) -> Result<&T>
    where
        F: FnOnce() -> Result<T>,
    {
        if self.get(&filter).is_none() {
            *self = Cached::Fresh {
                filter,
                value: compute()?,
            };
        }
        match &*self {
            Cached::Fresh { value, .. } => Ok(value),
            Cached::Stale => unreachable!("cache was just filled"),
        }
    }
}

/// What the colors of a map are derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColoringSource {
    /// A palette color mapping of the file's description.
    Palette(PaletteHandle),
    /// The label table of the label map at this index.
    LabelTable(usize),
}

/// State of the color buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorState {
    /// The colors do not reflect the current data or settings.
    Stale,
    /// The colors are up to date.
    Fresh,
}

/// Colors and summaries of one map.
#[derive(Debug, Clone)]
pub struct MapContent {
    data_count: usize,
    name: String,
    name_modified: bool,
    metadata: MetaData,
    source: ColoringSource,
    rgba: Vec<RGBA<f32>>,
    colors: ColorState,
    statistics: Cached<DescriptiveStatistics>,
    fast_statistics: Cached<FastStatistics>,
    histogram: Cached<Histogram>,
    histogram_buckets: usize,
}

impl MapContent {
    /// Content of a map with `data_count` values. The colors start stale
    /// and fully transparent.
    pub fn new<S: Into<String>>(
        data_count: usize,
        name: S,
        metadata: MetaData,
        source: ColoringSource,
        histogram_buckets: usize,
    ) -> Self {
        MapContent {
            data_count,
            name: name.into(),
            name_modified: false,
            metadata,
            source,
            rgba: vec![RGBA::new(0., 0., 0., 0.); data_count],
            colors: ColorState::Stale,
            statistics: Cached::Stale,
            fast_statistics: Cached::Stale,
            histogram: Cached::Stale,
            histogram_buckets,
        }
    }

    /// Number of values of the map.
    pub fn data_count(&self) -> usize {
        self.data_count
    }

    /// Name of the map.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the map.
    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        let name = name.into();
        if name != self.name {
            self.name = name;
            self.name_modified = true;
        }
    }

    /// Map metadata.
    pub fn metadata(&self) -> &MetaData {
        &self.metadata
    }

    /// Map metadata, for changes.
    pub fn metadata_mut(&mut self) -> &mut MetaData {
        &mut self.metadata
    }

    /// What the colors are derived from.
    pub fn coloring_source(&self) -> ColoringSource {
        self.source
    }

    /// One color per value, valid when [`coloring_state`] is fresh.
    ///
    /// [`coloring_state`]: #method.coloring_state
    pub fn rgba(&self) -> &[RGBA<f32>] {
        &self.rgba
    }

    /// State of the colors.
    pub fn coloring_state(&self) -> ColorState {
        self.colors
    }

    /// Exact statistics of the values kept by `filter`, or of all values.
    /// `fetch` provides the map's data when the summary must be computed.
    pub fn statistics<F>(
        &mut self,
        filter: Option<&RangeFilter>,
        fetch: F,
    ) -> Result<&DescriptiveStatistics>
    where
        F: FnOnce() -> Result<Vec<f32>>,
    {
        let filter = filter.cloned().unwrap_or_else(RangeFilter::all);
        self.statistics.get_or_try_update(filter, || {
            let data = fetch()?;
            let mut stats = DescriptiveStatistics::new();
            stats.update_ranged(&data, &filter);
            Ok(stats)
        })
    }

    /// Fast statistics of all values.
    pub fn fast_statistics<F>(&mut self, fetch: F) -> Result<&FastStatistics>
    where
        F: FnOnce() -> Result<Vec<f32>>,
    {
        self.fast_statistics.get_or_try_update(RangeFilter::all(), || {
            let data = fetch()?;
            let mut stats = FastStatistics::new();
            stats.update(&data);
            Ok(stats)
        })
    }

    /// Histogram of the values kept by `filter`, or of all values.
    pub fn histogram<F>(&mut self, filter: Option<&RangeFilter>, fetch: F) -> Result<&Histogram>
    where
        F: FnOnce() -> Result<Vec<f32>>,
    {
        let filter = filter.cloned().unwrap_or_else(RangeFilter::all);
        let buckets = self.histogram_buckets;
        self.histogram.get_or_try_update(filter, || {
            let data = fetch()?;
            let mut histogram = Histogram::new(buckets);
            histogram.update_ranged(&data, &filter);
            Ok(histogram)
        })
    }

    /// Recompute the colors from `data`, unless they are fresh or there is
    /// no data. Returns whether the colors were recomputed.
    ///
    /// Label maps are colored by key. Palette maps first refresh their fast
    /// statistics, then look up the selected palette in `palettes`; when the
    /// palette cannot be found the colors become fully transparent.
    pub fn update_coloring(
        &mut self,
        data: &[f32],
        xml: &CiftiXml,
        palettes: Option<&PaletteFile>,
    ) -> bool {
        if data.is_empty() || self.colors == ColorState::Fresh {
            return false;
        }
        if data.len() != self.data_count {
            return false;
        }

        match self.source {
            ColoringSource::LabelTable(index) => match xml.label_table(index) {
                Some(table) => coloring::color_indices_with_label_table(table, data, &mut self.rgba),
                None => coloring::clear(&mut self.rgba),
            },
            ColoringSource::Palette(handle) => {
                let mut fast = FastStatistics::new();
                fast.update(data);
                trace!(
                    mean = fast.mean(),
                    min = fast.minimum(),
                    max = fast.maximum(),
                    "coloring map with palette"
                );
                let mapping = xml.palette(handle);
                let palette = mapping.and_then(|m| {
                    palettes.and_then(|p| p.palette_by_name(m.selected_palette_name()))
                });
                match (mapping, palette) {
                    (Some(mapping), Some(palette)) => coloring::color_scalars_with_palette(
                        &fast,
                        mapping,
                        palette,
                        data,
                        &mut self.rgba,
                    ),
                    _ => coloring::clear(&mut self.rgba),
                }
                self.fast_statistics = Cached::Fresh {
                    filter: RangeFilter::all(),
                    value: fast,
                };
            }
        }
        self.colors = ColorState::Fresh;
        true
    }

    /// Mark the colors stale.
    pub fn invalidate_coloring(&mut self) {
        self.colors = ColorState::Stale;
    }

    /// Drop every summary and mark the colors stale, after the data changed.
    pub fn invalidate_data(&mut self) {
        self.statistics.invalidate();
        self.fast_statistics.invalidate();
        self.histogram.invalidate();
        self.invalidate_coloring();
    }

    /// Whether the name, metadata, palette settings or label table changed
    /// since the last `clear_modified_status`.
    pub fn is_modified_status(&self, xml: &CiftiXml) -> bool {
        let coloring_modified = match self.source {
            ColoringSource::Palette(handle) => {
                xml.palette(handle).map(|p| p.is_modified()).unwrap_or(false)
            }
            ColoringSource::LabelTable(index) => xml
                .label_table(index)
                .map(|t| t.is_modified())
                .unwrap_or(false),
        };
        self.name_modified || self.metadata.is_modified() || coloring_modified
    }

    /// Forget about previous changes. The colors are left as they are.
    pub fn clear_modified_status(&mut self, xml: &mut CiftiXml) {
        self.name_modified = false;
        self.metadata.clear_modified();
        match self.source {
            ColoringSource::Palette(handle) => {
                if let Some(p) = xml.palette_mut(handle) {
                    p.clear_modified();
                }
            }
            ColoringSource::LabelTable(index) => {
                if let Some(t) = xml.label_table_mut(index) {
                    t.clear_modified();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{IndexMap, NamedMap};
    use crate::palette::PaletteColorMapping;
    use std::cell::Cell;

    fn xml() -> CiftiXml {
        CiftiXml::new(
            IndexMap::Scalars(vec![NamedMap::scalar(
                "a",
                PaletteColorMapping::with_palette("Gray_Interp"),
            )]),
            IndexMap::Invalid,
        )
    }

    fn content() -> MapContent {
        MapContent::new(
            4,
            "a",
            MetaData::new(),
            ColoringSource::Palette(PaletteHandle::Map(0)),
            10,
        )
    }

    #[test]
    fn statistics_are_pulled_once() {
        let mut c = content();
        let fetches = Cell::new(0);
        let fetch = || -> Result<Vec<f32>> {
            fetches.set(fetches.get() + 1);
            Ok(vec![1., 2., 3., 4.])
        };
        assert_eq!(c.statistics(None, fetch).unwrap().count(), 4);
        assert_eq!(c.statistics(None, fetch).unwrap().count(), 4);
        assert_eq!(fetches.get(), 1);

        let filter = RangeFilter::new(3., 2., 0., 0., false);
        assert_eq!(c.statistics(Some(&filter), fetch).unwrap().count(), 2);
        assert_eq!(fetches.get(), 2);

        assert_eq!(c.histogram(None, fetch).unwrap().number_of_buckets(), 10);
        c.invalidate_coloring();
        let _ = c.histogram(None, fetch).unwrap();
        assert_eq!(fetches.get(), 3);

        c.invalidate_data();
        let _ = c.histogram(None, fetch).unwrap();
        assert_eq!(fetches.get(), 4);
    }

    #[test]
    fn coloring_is_memoized() {
        let xml = xml();
        let palettes = PaletteFile::with_default_palettes();
        let mut c = content();
        let data = [0., 0.25, 0.5, 1.];
        assert_eq!(c.coloring_state(), ColorState::Stale);
        assert!(!c.update_coloring(&[], &xml, Some(&palettes)));
        assert!(c.update_coloring(&data, &xml, Some(&palettes)));
        assert_eq!(c.coloring_state(), ColorState::Fresh);
        assert!(!c.update_coloring(&data, &xml, Some(&palettes)));
        c.invalidate_coloring();
        assert!(c.update_coloring(&data, &xml, Some(&palettes)));
        assert_eq!(c.rgba().len(), 4);
    }

    #[test]
    fn unresolved_palette_is_transparent() {
        let xml = xml();
        let mut c = content();
        assert!(c.update_coloring(&[1., 1., 1., 1.], &xml, None));
        assert!(c.rgba().iter().all(|p| *p == RGBA::new(0., 0., 0., 0.)));
    }

    #[test]
    fn modified_status() {
        let mut xml = xml();
        let mut c = content();
        assert!(!c.is_modified_status(&xml));
        c.set_name("a");
        assert!(!c.is_modified_status(&xml));
        c.set_name("b");
        assert!(c.is_modified_status(&xml));
        c.clear_modified_status(&mut xml);
        assert!(!c.is_modified_status(&xml));

        xml.palette_mut(PaletteHandle::Map(0))
            .unwrap()
            .set_interpolate_colors(false);
        assert!(c.is_modified_status(&xml));
        c.clear_modified_status(&mut xml);
        assert!(!c.is_modified_status(&xml));
    }
}
