// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Core tensor type and view abstractions.

use crate::nibble;
use crate::{DType, Element, Shape, TensorError};
use std::fmt;

/// An owned, n-dimensional tensor stored in contiguous memory.
///
/// `Tensor` owns its data buffer and hands out borrowed descriptors via
/// [`Tensor::view`] and [`Tensor::view_mut`]. Every codec and transform
/// operates on those descriptors, never on the owner.
///
/// # Memory Layout
/// Data is stored in row-major (C) order as a flat byte buffer. 4-bit types
/// are packed two per byte, low nibble first.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Shape,
    dtype: DType,
    data: Vec<u8>,
}

impl Tensor {
    /// Creates a new tensor filled with zeros.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, Shape, DType};
    /// let t = Tensor::zeros(Shape::matrix(2, 3), DType::F32);
    /// assert_eq!(t.size_bytes(), 24); // 2 * 3 * 4 bytes
    /// let p = Tensor::zeros(Shape::matrix(2, 3), DType::U4);
    /// assert_eq!(p.size_bytes(), 3);
    /// ```
    pub fn zeros(shape: Shape, dtype: DType) -> Self {
        let size = shape.size_bytes(dtype);
        Self {
            shape,
            dtype,
            data: vec![0u8; size],
        }
    }

    /// Creates a tensor from raw bytes.
    ///
    /// Returns an error if the buffer size does not match `shape.size_bytes(dtype)`.
    pub fn from_bytes(shape: Shape, dtype: DType, data: Vec<u8>) -> Result<Self, TensorError> {
        let expected = shape.size_bytes(dtype);
        if data.len() != expected {
            return Err(TensorError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, dtype, data })
    }

    /// Creates a tensor from a slice of byte-addressable elements.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, Shape};
    /// let t = Tensor::from_slice(Shape::vector(3), &[1.0f32, 2.0, 3.0]).unwrap();
    /// assert_eq!(t.to_vec::<f32>().unwrap(), vec![1.0, 2.0, 3.0]);
    /// ```
    pub fn from_slice<T: Element>(shape: Shape, values: &[T]) -> Result<Self, TensorError> {
        let width = T::DTYPE.size_bytes();
        let expected_elements = shape.num_elements();
        if values.len() != expected_elements {
            return Err(TensorError::BufferSizeMismatch {
                expected: expected_elements * width,
                actual: values.len() * width,
            });
        }
        let mut data = vec![0u8; values.len() * width];
        for (chunk, &v) in data.chunks_exact_mut(width).zip(values) {
            v.write_le(chunk);
        }
        Ok(Self {
            shape,
            dtype: T::DTYPE,
            data,
        })
    }

    /// Creates a tensor from a slice of `f32` values.
    pub fn from_f32(shape: Shape, values: &[f32]) -> Result<Self, TensorError> {
        Self::from_slice(shape, values)
    }

    /// Packs signed values in `-8..=7` into an `I4` tensor.
    pub fn from_i4(shape: Shape, values: &[i8]) -> Result<Self, TensorError> {
        if let Some(v) = values.iter().find(|v| !(-8..=7).contains(*v)) {
            return Err(TensorError::invariant(
                "from_i4",
                format!("value {v} does not fit in 4 signed bits"),
            ));
        }
        Self::packed(shape, DType::I4, values.len(), nibble::pack_i4(values))
    }

    /// Packs unsigned values in `0..=15` into a `U4` tensor.
    pub fn from_u4(shape: Shape, values: &[u8]) -> Result<Self, TensorError> {
        if let Some(v) = values.iter().find(|v| **v > 15) {
            return Err(TensorError::invariant(
                "from_u4",
                format!("value {v} does not fit in 4 unsigned bits"),
            ));
        }
        Self::packed(shape, DType::U4, values.len(), nibble::pack_u4(values))
    }

    fn packed(shape: Shape, dtype: DType, len: usize, data: Vec<u8>) -> Result<Self, TensorError> {
        if len != shape.num_elements() {
            return Err(TensorError::BufferSizeMismatch {
                expected: shape.size_bytes(dtype),
                actual: dtype.buffer_bytes(len),
            });
        }
        Ok(Self { shape, dtype, data })
    }

    /// Returns the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the tensor's data type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Returns the number of logical elements.
    pub fn num_elements(&self) -> usize {
        self.shape.num_elements()
    }

    /// Returns an immutable view over this tensor's data.
    pub fn view(&self) -> TensorView<'_> {
        TensorView {
            strides: self.shape.strides(),
            shape: self.shape.clone(),
            dtype: self.dtype,
            data: &self.data,
        }
    }

    /// Returns a mutable view over this tensor's data.
    pub fn view_mut(&mut self) -> TensorViewMut<'_> {
        TensorViewMut {
            strides: self.shape.strides(),
            shape: self.shape.clone(),
            dtype: self.dtype,
            data: &mut self.data,
        }
    }

    /// Returns the raw byte slice backing this tensor.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns a mutable reference to the raw byte buffer.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consumes the tensor and returns its buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Returns the memory footprint of this tensor in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Decodes the buffer into a vector of `T`.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>, TensorError> {
        self.view().to_vec()
    }
}

/// Number of bytes a strided descriptor spans, from its first element to the
/// end of its last one.
pub(crate) fn span_bytes(shape: &Shape, strides: &[usize], dtype: DType) -> usize {
    if shape.num_elements() == 0 {
        return 0;
    }
    if dtype.is_sub_byte() {
        return shape.size_bytes(dtype);
    }
    let last: usize = shape
        .dims()
        .iter()
        .zip(strides)
        .map(|(&d, &s)| (d - 1) * s)
        .sum();
    (last + 1) * dtype.size_bytes()
}

fn strides_are_row_major(shape: &Shape, strides: &[usize]) -> bool {
    if shape.num_elements() == 0 {
        return true;
    }
    shape
        .dims()
        .iter()
        .zip(strides.iter().zip(shape.strides()))
        .all(|(&d, (&s, dense))| d == 1 || s == dense)
}

fn byte_strides_of(
    dtype: DType,
    strides: &[usize],
) -> Result<Vec<usize>, TensorError> {
    if dtype.is_sub_byte() {
        return Err(TensorError::UnsupportedDType {
            op: "byte_strides",
            dtype,
        });
    }
    Ok(strides.iter().map(|s| s * dtype.size_bytes()).collect())
}

fn gather_elements<T: Element>(
    shape: &Shape,
    strides: &[usize],
    dtype: DType,
    data: &[u8],
) -> Result<Vec<T>, TensorError> {
    if dtype != T::DTYPE {
        return Err(TensorError::invariant(
            "to_vec",
            format!("cannot read {dtype} tensor as {}", T::DTYPE),
        ));
    }
    let width = dtype.size_bytes();
    let n = shape.num_elements();
    if strides_are_row_major(shape, strides) {
        return Ok(data[..n * width]
            .chunks_exact(width)
            .map(T::read_le)
            .collect());
    }
    let dims = shape.dims();
    let mut coord = vec![0usize; dims.len()];
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        let offset: usize = coord.iter().zip(strides).map(|(c, s)| c * s).sum();
        out.push(T::read_le(&data[offset * width..]));
        for d in (0..dims.len()).rev() {
            coord[d] += 1;
            if coord[d] < dims[d] {
                break;
            }
            coord[d] = 0;
        }
    }
    Ok(out)
}

/// A borrowed, read-only tensor descriptor.
///
/// Views never own their buffer. A view produced by
/// [`crate::view`] may be strided; everything else is dense.
/// Strides are measured in elements.
#[derive(Clone)]
pub struct TensorView<'a> {
    shape: Shape,
    strides: Vec<usize>,
    dtype: DType,
    data: &'a [u8],
}

impl<'a> TensorView<'a> {
    /// Wraps a dense row-major buffer.
    ///
    /// Returns an error if `data.len()` is not exactly `shape.size_bytes(dtype)`.
    pub fn new(shape: Shape, dtype: DType, data: &'a [u8]) -> Result<Self, TensorError> {
        let expected = shape.size_bytes(dtype);
        if data.len() != expected {
            return Err(TensorError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            strides: shape.strides(),
            shape,
            dtype,
            data,
        })
    }

    /// Creates a strided view. `data` must start at the first element and
    /// cover [`span_bytes`] bytes.
    pub(crate) fn strided(shape: Shape, strides: Vec<usize>, dtype: DType, data: &'a [u8]) -> Self {
        debug_assert!(data.len() >= span_bytes(&shape, &strides, dtype));
        Self {
            shape,
            strides,
            dtype,
            data,
        }
    }

    /// Returns the shape of the viewed tensor.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the data type of the viewed tensor.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Returns the per-dimension strides in elements.
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Returns the per-dimension strides in bytes.
    ///
    /// Fails for sub-byte types, whose elements have no byte address.
    pub fn byte_strides(&self) -> Result<Vec<usize>, TensorError> {
        byte_strides_of(self.dtype, &self.strides)
    }

    /// Returns `true` if the strides match the row-major layout of the shape.
    pub fn is_contiguous(&self) -> bool {
        strides_are_row_major(&self.shape, &self.strides)
    }

    /// Returns the number of logical elements.
    pub fn num_elements(&self) -> usize {
        self.shape.num_elements()
    }

    /// Returns the raw byte span, starting at the first element.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Fails with [`TensorError::NotContiguous`] unless the view is dense.
    pub fn ensure_contiguous(&self, op: &'static str) -> Result<(), TensorError> {
        if self.is_contiguous() {
            Ok(())
        } else {
            Err(TensorError::NotContiguous {
                op,
                shape: self.shape.clone(),
                strides: self.strides.clone(),
            })
        }
    }

    /// Returns exactly the packed bytes of a dense view.
    pub fn contiguous_bytes(&self, op: &'static str) -> Result<&'a [u8], TensorError> {
        self.ensure_contiguous(op)?;
        Ok(&self.data[..self.shape.size_bytes(self.dtype)])
    }

    /// Decodes the viewed elements, in row-major order, into a vector of `T`.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>, TensorError> {
        gather_elements(&self.shape, &self.strides, self.dtype, self.data)
    }
}

impl fmt::Debug for TensorView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TensorView")
            .field("shape", &self.shape)
            .field("strides", &self.strides)
            .field("dtype", &self.dtype)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// A borrowed, writable tensor descriptor.
///
/// Codec and gather outputs are written through this type; the engine never
/// reallocates or resizes the buffer behind it.
pub struct TensorViewMut<'a> {
    shape: Shape,
    strides: Vec<usize>,
    dtype: DType,
    data: &'a mut [u8],
}

impl<'a> TensorViewMut<'a> {
    /// Wraps a dense row-major buffer.
    ///
    /// Returns an error if `data.len()` is not exactly `shape.size_bytes(dtype)`.
    pub fn new(shape: Shape, dtype: DType, data: &'a mut [u8]) -> Result<Self, TensorError> {
        let expected = shape.size_bytes(dtype);
        if data.len() != expected {
            return Err(TensorError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            strides: shape.strides(),
            shape,
            dtype,
            data,
        })
    }

    pub(crate) fn strided(
        shape: Shape,
        strides: Vec<usize>,
        dtype: DType,
        data: &'a mut [u8],
    ) -> Self {
        debug_assert!(data.len() >= span_bytes(&shape, &strides, dtype));
        Self {
            shape,
            strides,
            dtype,
            data,
        }
    }

    pub(crate) fn into_parts(self) -> (Shape, Vec<usize>, DType, &'a mut [u8]) {
        (self.shape, self.strides, self.dtype, self.data)
    }

    /// Returns the shape of the viewed tensor.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the data type of the viewed tensor.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Returns the per-dimension strides in elements.
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Returns the per-dimension strides in bytes.
    pub fn byte_strides(&self) -> Result<Vec<usize>, TensorError> {
        byte_strides_of(self.dtype, &self.strides)
    }

    /// Returns `true` if the strides match the row-major layout of the shape.
    pub fn is_contiguous(&self) -> bool {
        strides_are_row_major(&self.shape, &self.strides)
    }

    /// Returns the number of logical elements.
    pub fn num_elements(&self) -> usize {
        self.shape.num_elements()
    }

    /// Reborrows as a read-only view.
    pub fn as_view(&self) -> TensorView<'_> {
        TensorView {
            shape: self.shape.clone(),
            strides: self.strides.clone(),
            dtype: self.dtype,
            data: self.data,
        }
    }

    /// Reborrows as a shorter-lived mutable view.
    pub fn reborrow(&mut self) -> TensorViewMut<'_> {
        TensorViewMut {
            shape: self.shape.clone(),
            strides: self.strides.clone(),
            dtype: self.dtype,
            data: self.data,
        }
    }

    /// Returns the raw byte span, starting at the first element.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.data
    }

    /// Fails with [`TensorError::NotContiguous`] unless the view is dense.
    pub fn ensure_contiguous(&self, op: &'static str) -> Result<(), TensorError> {
        if self.is_contiguous() {
            Ok(())
        } else {
            Err(TensorError::NotContiguous {
                op,
                shape: self.shape.clone(),
                strides: self.strides.clone(),
            })
        }
    }

    /// Returns exactly the packed bytes of a dense view.
    pub fn contiguous_bytes_mut(&mut self, op: &'static str) -> Result<&mut [u8], TensorError> {
        self.ensure_contiguous(op)?;
        let len = self.shape.size_bytes(self.dtype);
        Ok(&mut self.data[..len])
    }

    /// Decodes the viewed elements, in row-major order, into a vector of `T`.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>, TensorError> {
        gather_elements(&self.shape, &self.strides, self.dtype, self.data)
    }
}

impl fmt::Debug for TensorViewMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TensorViewMut")
            .field("shape", &self.shape)
            .field("strides", &self.strides)
            .field("dtype", &self.dtype)
            .field("bytes", &self.data.len())
            .finish()
    }
}
