//! Grid sampling of color transforms.
//!
//! The sampler walks a regular grid spanning the preset's `in_range` on
//! every axis and evaluates the transform once per node. Node order is
//! fixed by [`GridOrder`] and is the order in which backends write data
//! lines.
//!
//! # Axis coordinates
//!
//! Point `i` of `n` on an axis is `min + (max - min) * i / (n - 1)`. A
//! single-point axis (`n == 1`) samples `min` only.
//!
//! # Example
//!
//! ```rust
//! use lutkit_core::{GridOrder, LutType, Preset, Sampler};
//!
//! let preset = Preset::new(LutType::Lut3D, ".cube").with_cube_size(2);
//! let grid = Sampler::new().sample_3d(&|rgb: [f64; 3]| rgb, &preset, GridOrder::RedFastest)?;
//! assert_eq!(grid.outputs[1], [1.0, 0.0, 0.0]);
//! # Ok::<(), lutkit_core::LutError>(())
//! ```

use rayon::prelude::*;

use crate::{LutError, LutResult, LutType, Preset, ValueRange};

/// A color transform sampled by the exporter.
///
/// Implemented for every `Fn([f64; 3]) -> [f64; 3]`. The sampler calls
/// [`apply`](ColorTransform::apply) exactly once per grid node and never
/// reuses a result for another node.
pub trait ColorTransform {
    /// Maps one input RGB coordinate to one output RGB coordinate.
    fn apply(&self, rgb: [f64; 3]) -> [f64; 3];
}

impl<F> ColorTransform for F
where
    F: Fn([f64; 3]) -> [f64; 3],
{
    #[inline]
    fn apply(&self, rgb: [f64; 3]) -> [f64; 3] {
        self(rgb)
    }
}

/// Iteration order of a 3D grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridOrder {
    /// Red index changes fastest, then green, then blue.
    /// Used by .cube, .cc and Iridas files.
    #[default]
    RedFastest,
    /// Blue index changes fastest, then green, then red.
    BlueFastest,
}

impl GridOrder {
    /// Grid indices `[r, g, b]` of node `k` in a cube of `size` points per axis.
    #[inline]
    pub fn node(self, k: usize, size: usize) -> [usize; 3] {
        let fast = k % size;
        let mid = (k / size) % size;
        let slow = k / (size * size);
        match self {
            GridOrder::RedFastest => [fast, mid, slow],
            GridOrder::BlueFastest => [slow, mid, fast],
        }
    }
}

/// Inputs and outputs of one sampling pass, in node order.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleGrid {
    /// Input coordinate of every node
    pub inputs: Vec<[f64; 3]>,
    /// Transform output of every node
    pub outputs: Vec<[f64; 3]>,
    /// Points per axis (3D) or point count (1D/2D)
    pub size: usize,
    /// Node order for 3D grids
    pub order: GridOrder,
}

impl SampleGrid {
    /// Number of sampled nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Returns true if nothing was sampled.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

/// Evenly spaced axis coordinates over `range`.
pub fn axis_values(range: &ValueRange, n: usize) -> Vec<f64> {
    let (min, max) = (range.min(), range.max());
    if n <= 1 {
        return vec![min; n];
    }
    let step = (max - min) / (n - 1) as f64;
    (0..n)
        .map(|i| if i == n - 1 { max } else { min + step * i as f64 })
        .collect()
}

/// Grid sampler.
///
/// Sequential by default; [`Sampler::parallel`] spreads node evaluation
/// over the rayon pool without changing node order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sampler {
    parallel: bool,
}

impl Sampler {
    /// Sequential sampler.
    pub fn new() -> Self {
        Self { parallel: false }
    }

    /// Sampler that evaluates nodes on the rayon thread pool.
    pub fn parallel() -> Self {
        Self { parallel: true }
    }

    /// Returns true if nodes are evaluated in parallel.
    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Samples a `cube_size^3` grid.
    ///
    /// Fails with [`LutError::GridSize`] when the node count overflows
    /// `usize`; nothing is evaluated in that case.
    pub fn sample_3d<T>(&self, transform: &T, preset: &Preset, order: GridOrder) -> LutResult<SampleGrid>
    where
        T: ColorTransform + Sync + ?Sized,
    {
        let size = preset.cube_size;
        let total = size.checked_pow(3).ok_or(LutError::GridSize { size })?;
        let axis = axis_values(&preset.in_range, size);

        let inputs: Vec<[f64; 3]> = (0..total)
            .map(|k| {
                let [r, g, b] = order.node(k, size);
                [axis[r], axis[g], axis[b]]
            })
            .collect();

        tracing::debug!(size, total, parallel = self.parallel, ?order, "sampling 3D grid");
        let outputs = self.evaluate(transform, &inputs);

        Ok(SampleGrid { inputs, outputs, size, order })
    }

    /// Samples `cube_size` gray points for a 1D or 2D LUT.
    ///
    /// A 1D LUT keeps the red output for every channel (one shared curve);
    /// a 2D LUT keeps each channel's own output.
    pub fn sample_1d<T>(&self, transform: &T, preset: &Preset) -> SampleGrid
    where
        T: ColorTransform + Sync + ?Sized,
    {
        let size = preset.cube_size;
        let inputs: Vec<[f64; 3]> = axis_values(&preset.in_range, size)
            .into_iter()
            .map(|v| [v, v, v])
            .collect();

        tracing::debug!(size, lut_type = %preset.lut_type, parallel = self.parallel, "sampling curve");
        let mut outputs = self.evaluate(transform, &inputs);
        if preset.lut_type == LutType::Lut1D {
            for rgb in &mut outputs {
                *rgb = [rgb[0]; 3];
            }
        }

        SampleGrid { inputs, outputs, size, order: GridOrder::RedFastest }
    }

    fn evaluate<T>(&self, transform: &T, inputs: &[[f64; 3]]) -> Vec<[f64; 3]>
    where
        T: ColorTransform + Sync + ?Sized,
    {
        if self.parallel {
            // Indexed collect keeps node order
            inputs.par_iter().map(|&rgb| transform.apply(rgb)).collect()
        } else {
            inputs.iter().map(|&rgb| transform.apply(rgb)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn preset(size: usize) -> Preset {
        Preset::new(LutType::Lut3D, ".cube").with_cube_size(size)
    }

    #[test]
    fn axis_spans_range() {
        let v = axis_values(&ValueRange::float(-1.0, 1.0), 5);
        assert_eq!(v.len(), 5);
        assert_relative_eq!(v[0], -1.0);
        assert_relative_eq!(v[2], 0.0);
        assert_eq!(v[4], 1.0);
    }

    #[test]
    fn single_point_axis_is_min() {
        assert_eq!(axis_values(&ValueRange::float(0.25, 1.0), 1), vec![0.25]);
    }

    #[test]
    fn red_fastest_corners() {
        let grid = Sampler::new().sample_3d(&|rgb: [f64; 3]| rgb, &preset(2), GridOrder::RedFastest).unwrap();
        assert_eq!(
            grid.outputs,
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
                [1.0, 0.0, 1.0],
                [0.0, 1.0, 1.0],
                [1.0, 1.0, 1.0],
            ]
        );
    }

    #[test]
    fn blue_fastest_corners() {
        let grid = Sampler::new().sample_3d(&|rgb: [f64; 3]| rgb, &preset(2), GridOrder::BlueFastest).unwrap();
        assert_eq!(grid.outputs[1], [0.0, 0.0, 1.0]);
        assert_eq!(grid.outputs[4], [1.0, 0.0, 0.0]);
        assert_eq!(grid.outputs[7], [1.0, 1.0, 1.0]);
    }

    #[test]
    fn transform_called_once_per_node() {
        let calls = AtomicUsize::new(0);
        let transform = |rgb: [f64; 3]| {
            calls.fetch_add(1, Ordering::SeqCst);
            rgb
        };
        let grid = Sampler::new().sample_3d(&transform, &preset(5), GridOrder::RedFastest).unwrap();
        assert_eq!(grid.len(), 125);
        assert_eq!(calls.load(Ordering::SeqCst), 125);
    }

    #[test]
    fn parallel_matches_sequential() {
        let calls = AtomicUsize::new(0);
        let transform = |rgb: [f64; 3]| {
            calls.fetch_add(1, Ordering::SeqCst);
            [rgb[0] * 0.5, rgb[1].powf(2.2), 1.0 - rgb[2]]
        };
        let p = preset(9);
        let seq = Sampler::new().sample_3d(&transform, &p, GridOrder::RedFastest).unwrap();
        let par = Sampler::parallel().sample_3d(&transform, &p, GridOrder::RedFastest).unwrap();
        assert_eq!(seq, par);
        assert_eq!(calls.load(Ordering::SeqCst), 2 * 729);
    }

    #[test]
    fn curve_sampling() {
        let transform = |rgb: [f64; 3]| [rgb[0] * 2.0, rgb[1] * 3.0, rgb[2] * 4.0];

        let p1 = preset(3).with_type(LutType::Lut1D);
        let g1 = Sampler::new().sample_1d(&transform, &p1);
        assert_eq!(g1.len(), 3);
        assert_eq!(g1.outputs[2], [2.0, 2.0, 2.0]);

        let p2 = preset(3).with_type(LutType::Lut2D);
        let g2 = Sampler::new().sample_1d(&transform, &p2);
        assert_eq!(g2.outputs[1], [1.0, 1.5, 2.0]);
    }

    #[test]
    fn oversized_grid_is_an_error() {
        let calls = AtomicUsize::new(0);
        let transform = |rgb: [f64; 3]| {
            calls.fetch_add(1, Ordering::SeqCst);
            rgb
        };
        for sampler in [Sampler::new(), Sampler::parallel()] {
            let err = sampler
                .sample_3d(&transform, &preset(1 << 22), GridOrder::RedFastest)
                .unwrap_err();
            assert!(matches!(err, LutError::GridSize { size } if size == 1 << 22));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn node_indices() {
        assert_eq!(GridOrder::RedFastest.node(5, 3), [2, 1, 0]);
        assert_eq!(GridOrder::BlueFastest.node(5, 3), [0, 1, 2]);
    }
}
