//! N-dimensional arrays with per-dimension lower bounds.
//!
//! Elements are stored row-major in one flat buffer. A vector is the
//! common case: one dimension starting at zero.

use smallvec::{smallvec, SmallVec};

use crate::{Value, ValueError};

/// One array dimension: first valid index and number of elements.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Dim {
    pub lower: i64,
    pub len: usize,
}

impl Dim {
    pub const fn new(lower: i64, len: usize) -> Self {
        Dim { lower, len }
    }

    pub const fn zero_based(len: usize) -> Self {
        Dim { lower: 0, len }
    }
}

/// Array storage.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayData {
    dims: SmallVec<[Dim; 2]>,
    items: Vec<Value>,
}

impl ArrayData {
    /// One-dimensional, zero-based array.
    pub fn vector(items: Vec<Value>) -> Self {
        ArrayData {
            dims: smallvec![Dim::zero_based(items.len())],
            items,
        }
    }

    /// Zero-based two-dimensional array, row-major.
    pub fn matrix(rows: usize, cols: usize, items: Vec<Value>) -> Result<Self, ValueError> {
        Self::from_parts(&[Dim::zero_based(rows), Dim::zero_based(cols)], items)
    }

    /// Array of the given shape with every cell set to `fill`.
    pub fn filled(dims: &[Dim], fill: &Value) -> Result<Self, ValueError> {
        let count = Self::cell_count(dims)?;
        Self::from_parts(dims, vec![fill.clone(); count])
    }

    pub fn from_parts(dims: &[Dim], items: Vec<Value>) -> Result<Self, ValueError> {
        let expected = Self::cell_count(dims)?;
        if expected != items.len() {
            return Err(ValueError::ShapeMismatch {
                expected,
                found: items.len(),
            });
        }
        Ok(ArrayData {
            dims: dims.iter().copied().collect(),
            items,
        })
    }

    fn cell_count(dims: &[Dim]) -> Result<usize, ValueError> {
        if dims.is_empty() {
            return Err(ValueError::EmptyShape);
        }
        dims.iter()
            .try_fold(1usize, |count, dim| count.checked_mul(dim.len))
            .ok_or(ValueError::ShapeOverflow)
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn dims(&self) -> &[Dim] {
        &self.dims
    }

    /// Total number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_zero_based(&self) -> bool {
        self.dims.iter().all(|dim| dim.lower == 0)
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [Value] {
        &mut self.items
    }

    pub fn into_items(self) -> Vec<Value> {
        self.items
    }

    /// Flat offset of a multi-dimensional index, `None` if out of bounds.
    pub fn offset(&self, index: &[i64]) -> Option<usize> {
        if index.len() != self.dims.len() {
            return None;
        }
        let mut offset = 0usize;
        for (dim, &at) in self.dims.iter().zip(index) {
            let relative = usize::try_from(at.checked_sub(dim.lower)?).ok()?;
            if relative >= dim.len {
                return None;
            }
            offset = offset * dim.len + relative;
        }
        Some(offset)
    }

    pub fn get(&self, index: &[i64]) -> Option<&Value> {
        self.offset(index).and_then(|offset| self.items.get(offset))
    }

    pub fn set(&mut self, index: &[i64], value: Value) -> Result<(), ValueError> {
        let slot = self
            .offset(index)
            .and_then(|offset| self.items.get_mut(offset))
            .ok_or_else(|| ValueError::IndexOutOfBounds {
                index: index.to_vec(),
            })?;
        *slot = value;
        Ok(())
    }
}
