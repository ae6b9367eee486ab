// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The unpack dispatch tables and their three entry points.

use crate::kernels::{self, DequantFn, DequantJob, WidenFn};
use crate::observe::{NoopObserver, UnpackObserver};
use crate::scale::{ScaleLayout, Scales};
use crate::{CodecError, ZeroPoint};
use partition_planner::{
    execute_partitions, Channels, ElementBlocks, PartitionPlan, PartitionStrategy, PlannerError,
    ScaleGroups, UnpackOptions,
};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tensor_core::{DType, TensorView, TensorViewMut};

type Key = (DType, DType);

#[derive(Clone, Copy)]
struct Entry<F> {
    name: &'static str,
    run: F,
}

/// Unpacks and dequantizes packed weight tensors.
///
/// A `Codec` owns three explicit dispatch tables keyed by
/// `(source, destination)` type: plain widening, symmetric scaling and
/// asymmetric scaling. It holds no per-call state and can be shared across
/// threads.
///
/// # Examples
/// ```
/// use partition_planner::UnpackOptions;
/// use tensor_core::{DType, Shape, Tensor};
/// use weight_codec::Codec;
///
/// let packed = Tensor::from_i4(Shape::vector(4), &[-8, -1, 0, 7]).unwrap();
/// let mut out = Tensor::zeros(Shape::vector(4), DType::I8);
/// Codec::new()
///     .unpack(&packed.view(), &mut out.view_mut(), &UnpackOptions::default())
///     .unwrap();
/// assert_eq!(out.to_vec::<i8>().unwrap(), vec![-8, -1, 0, 7]);
/// ```
pub struct Codec {
    widen: HashMap<Key, Entry<WidenFn>>,
    scaled: HashMap<Key, Entry<DequantFn>>,
    asymmetric: HashMap<Key, Entry<DequantFn>>,
    observer: Arc<dyn UnpackObserver>,
}

impl Codec {
    /// Creates a codec with the full catalogue and no observer.
    pub fn new() -> Self {
        let mut widen: HashMap<Key, Entry<WidenFn>> = HashMap::new();
        widen.insert((DType::I4, DType::I8), Entry { name: "i4->i8", run: kernels::i4_to_i8 });
        widen.insert((DType::I4, DType::F16), Entry { name: "i4->f16", run: kernels::i4_to_f16 });
        widen.insert((DType::U4, DType::I8), Entry { name: "u4->i8", run: kernels::u4_to_i8 });
        widen.insert((DType::U4, DType::F16), Entry { name: "u4->f16", run: kernels::u4_to_f16 });
        widen.insert((DType::U4, DType::F32), Entry { name: "u4->f32", run: kernels::u4_to_f32 });
        widen.insert((DType::I8, DType::F16), Entry { name: "i8->f16", run: kernels::i8_to_f16 });

        let mut scaled: HashMap<Key, Entry<DequantFn>> = HashMap::new();
        scaled.insert(
            (DType::I4, DType::F16),
            Entry { name: "i4*s->f16", run: kernels::i4_scaled_f16 },
        );
        scaled.insert(
            (DType::I8, DType::F16),
            Entry { name: "i8*s->f16", run: kernels::i8_scaled_f16 },
        );

        let mut asymmetric: HashMap<Key, Entry<DequantFn>> = HashMap::new();
        asymmetric.insert(
            (DType::U4, DType::F16),
            Entry { name: "(u4-z)*s->f16", run: kernels::u4_asymmetric_f16 },
        );
        asymmetric.insert(
            (DType::U8, DType::F16),
            Entry { name: "(u8-z)*s->f16", run: kernels::u8_asymmetric_f16 },
        );

        Self {
            widen,
            scaled,
            asymmetric,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Replaces the observer that receives per-call timings.
    pub fn with_observer(mut self, observer: Arc<dyn UnpackObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Returns the process-wide default codec used by the free functions.
    pub fn global() -> &'static Codec {
        static GLOBAL: OnceLock<Codec> = OnceLock::new();
        GLOBAL.get_or_init(Codec::new)
    }

    /// Returns `true` if [`Codec::unpack`] accepts `from -> to`.
    pub fn supports(&self, from: DType, to: DType) -> bool {
        self.widen.contains_key(&(from, to))
    }

    /// Returns `true` if [`Codec::unpack_scaled`] accepts `from -> to`.
    pub fn supports_scaled(&self, from: DType, to: DType) -> bool {
        self.scaled.contains_key(&(from, to))
    }

    /// Returns `true` if [`Codec::unpack_asymmetric`] accepts `from -> to`.
    pub fn supports_asymmetric(&self, from: DType, to: DType) -> bool {
        self.asymmetric.contains_key(&(from, to))
    }

    /// Lists the plain widening pairs, sorted.
    pub fn conversions(&self) -> Vec<(DType, DType)> {
        let mut pairs: Vec<Key> = self.widen.keys().copied().collect();
        pairs.sort_by_key(|&(a, b)| (a.as_str(), b.as_str()));
        pairs
    }

    /// Widens `from` into `to` without scaling.
    ///
    /// Supported pairs: `i4->i8`, `i4->f16`, `u4->i8`, `u4->f16`, `u4->f32`
    /// and `i8->f16`.
    ///
    /// # Errors
    /// - [`CodecError::UnsupportedConversion`] for any other pair.
    /// - [`CodecError::Tensor`] if either side is strided.
    /// - [`CodecError::InvariantViolation`] if element counts differ.
    ///
    /// The destination is untouched on error.
    pub fn unpack(
        &self,
        from: &TensorView<'_>,
        to: &mut TensorViewMut<'_>,
        options: &UnpackOptions,
    ) -> Result<(), CodecError> {
        let entry = *self
            .widen
            .get(&(from.dtype(), to.dtype()))
            .ok_or(CodecError::UnsupportedConversion {
                from: from.dtype(),
                to: to.dtype(),
            })?;
        check_sizes("unpack", from, to)?;
        let src = from.contiguous_bytes("unpack")?;
        let total = from.num_elements();
        let plan = ElementBlocks::new().plan(total, options)?;
        let width = to.dtype().size_bytes();
        let dst = to.contiguous_bytes_mut("unpack")?;

        self.run(entry.name, total, &plan, options, || {
            execute_partitions(&plan, dst, width, options.use_parallel_execution, |p, out| {
                (entry.run)(src, p.start, out)
            })
        })
    }

    /// Symmetric dequantization: `to = decode(from) * scale`.
    ///
    /// `from` is `I4` or `I8`, `to` is `F16` and `scale` is `F16`/`F32` in
    /// one of the [`ScaleLayout`] patterns.
    ///
    /// # Errors
    /// - [`CodecError::UnsupportedSource`] for other source types.
    /// - [`CodecError::UnsupportedConversion`] for a non-`F16` destination.
    /// - [`CodecError::InvariantViolation`] for an unrecognised scale shape,
    ///   a non-float scale, or mismatched element counts.
    pub fn unpack_scaled(
        &self,
        from: &TensorView<'_>,
        scale: &TensorView<'_>,
        to: &mut TensorViewMut<'_>,
        options: &UnpackOptions,
    ) -> Result<(), CodecError> {
        if !matches!(from.dtype(), DType::I4 | DType::I8) {
            return Err(CodecError::UnsupportedSource {
                mode: "symmetric",
                dtype: from.dtype(),
            });
        }
        let entry = *self
            .scaled
            .get(&(from.dtype(), to.dtype()))
            .ok_or(CodecError::UnsupportedConversion {
                from: from.dtype(),
                to: to.dtype(),
            })?;
        check_sizes("unpack_scaled", from, to)?;
        let layout = ScaleLayout::infer(from.shape(), scale.shape())?;
        let job = DequantJob {
            src: from.contiguous_bytes("unpack_scaled")?,
            scales: Scales::new(scale)?,
            zero: None,
            layout,
        };
        self.dequantize(entry, job, to, options)
    }

    /// Asymmetric dequantization: `to = (decode(from) - zerop) * scale`.
    ///
    /// `from` is `U4` or `U8` and `to` is `F16`. The zero point is a
    /// scalar, or one value per scale element (see [`ZeroPoint`]). The
    /// per-column layout only takes a scalar zero point, and `U8` sources
    /// only take `U8` zero points with a group-wise scale.
    ///
    /// # Errors
    /// Same as [`Codec::unpack_scaled`], plus
    /// [`CodecError::InvariantViolation`] for a zero point that does not
    /// match the scale.
    pub fn unpack_asymmetric(
        &self,
        from: &TensorView<'_>,
        zerop: &TensorView<'_>,
        scale: &TensorView<'_>,
        to: &mut TensorViewMut<'_>,
        options: &UnpackOptions,
    ) -> Result<(), CodecError> {
        if !matches!(from.dtype(), DType::U4 | DType::U8) {
            return Err(CodecError::UnsupportedSource {
                mode: "asymmetric",
                dtype: from.dtype(),
            });
        }
        let entry = *self
            .asymmetric
            .get(&(from.dtype(), to.dtype()))
            .ok_or(CodecError::UnsupportedConversion {
                from: from.dtype(),
                to: to.dtype(),
            })?;
        check_sizes("unpack_asymmetric", from, to)?;
        let layout = ScaleLayout::infer(from.shape(), scale.shape())?;
        let zero = ZeroPoint::resolve(zerop, layout.scale_count())?;
        if matches!(layout, ScaleLayout::PerColumn { .. }) && !zero.is_scalar() {
            return Err(CodecError::invariant(
                "unpack_asymmetric",
                "per-column scales take a scalar zero point only",
            ));
        }
        if from.dtype() == DType::U8 {
            if zerop.dtype() != DType::U8 {
                return Err(CodecError::invariant(
                    "unpack_asymmetric",
                    format!("u8 data takes u8 zero points, got {}", zerop.dtype()),
                ));
            }
            if layout.groups().is_none() {
                return Err(CodecError::invariant(
                    "unpack_asymmetric",
                    "u8 data takes per-row or per-group scales only",
                ));
            }
        }
        let job = DequantJob {
            src: from.contiguous_bytes("unpack_asymmetric")?,
            scales: Scales::new(scale)?,
            zero: Some(zero),
            layout,
        };
        self.dequantize(entry, job, to, options)
    }

    fn dequantize(
        &self,
        entry: Entry<DequantFn>,
        job: DequantJob<'_>,
        to: &mut TensorViewMut<'_>,
        options: &UnpackOptions,
    ) -> Result<(), CodecError> {
        let width = to.dtype().size_bytes();
        let (plan, unit_bytes) = match job.layout.groups() {
            Some((groups, eps)) => (ScaleGroups::new(eps).plan(groups, options)?, eps * width),
            None => {
                let ScaleLayout::PerColumn {
                    channels,
                    rows,
                    cols,
                } = job.layout
                else {
                    return Err(CodecError::invariant("dequantize", "unknown layout"));
                };
                (Channels::new().plan(channels, options)?, rows * cols * width)
            }
        };
        tracing::debug!(
            kernel = entry.name,
            layout = job.layout.name(),
            zero_point = job.zero.map_or("none", |z| z.name()),
            partitions = plan.num_partitions(),
            "dequantize"
        );
        let total = to.num_elements();
        let dst = to.contiguous_bytes_mut("dequantize")?;
        self.run(entry.name, total, &plan, options, || {
            execute_partitions(&plan, dst, unit_bytes, options.use_parallel_execution, |p, out| {
                (entry.run)(&job, p, out)
            })
        })
    }

    fn run<F>(
        &self,
        kernel: &'static str,
        total: usize,
        plan: &PartitionPlan,
        options: &UnpackOptions,
        body: F,
    ) -> Result<(), CodecError>
    where
        F: FnOnce() -> Result<(), PlannerError>,
    {
        tracing::debug!(
            kernel,
            total,
            partitions = plan.num_partitions(),
            parallel = options.use_parallel_execution,
            "unpack"
        );
        let start = Instant::now();
        body()?;
        self.observer.record(kernel, total, start.elapsed());
        Ok(())
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec")
            .field("widen", &self.widen.len())
            .field("scaled", &self.scaled.len())
            .field("asymmetric", &self.asymmetric.len())
            .finish()
    }
}

fn check_sizes(
    op: &'static str,
    from: &TensorView<'_>,
    to: &TensorViewMut<'_>,
) -> Result<(), CodecError> {
    if from.num_elements() != to.num_elements() {
        return Err(CodecError::invariant(
            op,
            format!(
                "source {} has {} elements, destination {} has {}",
                from.shape(),
                from.num_elements(),
                to.shape(),
                to.num_elements()
            ),
        ));
    }
    to.ensure_contiguous(op)?;
    Ok(())
}

/// [`Codec::unpack`] on the default codec.
pub fn unpack(
    from: &TensorView<'_>,
    to: &mut TensorViewMut<'_>,
    options: &UnpackOptions,
) -> Result<(), CodecError> {
    Codec::global().unpack(from, to, options)
}

/// [`Codec::unpack_scaled`] on the default codec.
pub fn unpack_scaled(
    from: &TensorView<'_>,
    scale: &TensorView<'_>,
    to: &mut TensorViewMut<'_>,
    options: &UnpackOptions,
) -> Result<(), CodecError> {
    Codec::global().unpack_scaled(from, scale, to, options)
}

/// [`Codec::unpack_asymmetric`] on the default codec.
pub fn unpack_asymmetric(
    from: &TensorView<'_>,
    zerop: &TensorView<'_>,
    scale: &TensorView<'_>,
    to: &mut TensorViewMut<'_>,
    options: &UnpackOptions,
) -> Result<(), CodecError> {
    Codec::global().unpack_asymmetric(from, zerop, scale, to, options)
}
