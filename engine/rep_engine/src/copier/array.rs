//! Arrays of any rank.
//!
//! New copies start from a shallow copy of the storage and then deep-copy
//! cells when the element type needs it. Copy-into walks the overlap of
//! source and target, which is the minimum extent in each dimension,
//! aligned at each side's own lower bound. Cells of the target outside the
//! overlap are left alone.

use rep_value::{ArrayData, Dim, ObjRef, ObjectData, ValueError};
use smallvec::{smallvec, SmallVec};

use super::Copier;
use crate::plan::{ArrayPlan, SlotAction};
use crate::{CloneError, CloneResult};

impl Copier<'_> {
    /// `dst` is the registered shallow copy of `src` and already holds its cells.
    pub(super) fn fill_array(&mut self, plan: &ArrayPlan, src: &ObjRef, dst: &ObjRef) -> CloneResult<()> {
        if matches!(plan.elem, SlotAction::Keep) {
            return Ok(());
        }
        let source = self.array_data(src)?;
        let mut cells = Vec::with_capacity(source.len());
        for item in source.items() {
            cells.push(self.apply(&plan.elem, item)?);
        }
        dst.replace(ObjectData::Array(ArrayData::from_parts(source.dims(), cells)?));
        Ok(())
    }

    pub(super) fn array_into(&mut self, plan: &ArrayPlan, src: &ObjRef, dst: &ObjRef) -> CloneResult<()> {
        let source = self.array_data(src)?;
        let target_dims: SmallVec<[Dim; 2]> = match &*dst.read() {
            ObjectData::Array(target) => target.dims().iter().copied().collect(),
            other => return Err(self.shape_error(dst, "array", other.label())),
        };
        if source.rank() != target_dims.len() {
            return Err(CloneError::RankMismatch {
                expected: source.rank(),
                found: target_dims.len(),
            });
        }

        let pairs = overlap(source.dims(), &target_dims);
        let mut writes = Vec::with_capacity(pairs.len());
        for (from, to) in pairs {
            let item = source.items().get(from).ok_or(ValueError::SlotOutOfRange {
                index: from,
                len: source.len(),
            })?;
            writes.push((to, self.apply(&plan.elem, item)?));
        }

        let mut guard = dst.write();
        match &mut *guard {
            ObjectData::Array(target) => {
                let items = target.items_mut();
                for (to, value) in writes {
                    if let Some(cell) = items.get_mut(to) {
                        *cell = value;
                    }
                }
                Ok(())
            }
            other => Err(self.shape_error(dst, "array", other.label())),
        }
    }

    fn array_data(&self, src: &ObjRef) -> CloneResult<ArrayData> {
        match &*src.read() {
            ObjectData::Array(array) => Ok(array.clone()),
            other => Err(self.shape_error(src, "array", other.label())),
        }
    }
}

/// Row-major `(source, target)` offset pairs covering the overlap of two
/// arrays of equal rank.
fn overlap(source: &[Dim], target: &[Dim]) -> Vec<(usize, usize)> {
    let extents: SmallVec<[usize; 4]> = source
        .iter()
        .zip(target)
        .map(|(s, t)| s.len.min(t.len))
        .collect();

    match extents.as_slice() {
        [] => Vec::new(),
        [len] => (0..*len).map(|i| (i, i)).collect(),
        [rows, cols] => {
            let (src_cols, dst_cols) = (source[1].len, target[1].len);
            let mut pairs = Vec::with_capacity(rows * cols);
            for row in 0..*rows {
                for col in 0..*cols {
                    pairs.push((row * src_cols + col, row * dst_cols + col));
                }
            }
            pairs
        }
        _ => {
            if extents.contains(&0) {
                return Vec::new();
            }
            let mut cursor: SmallVec<[usize; 4]> = smallvec![0; extents.len()];
            let mut pairs = Vec::new();
            loop {
                pairs.push((flat_offset(&cursor, source), flat_offset(&cursor, target)));
                // Odometer step, last dimension fastest.
                let mut dim = extents.len();
                loop {
                    if dim == 0 {
                        return pairs;
                    }
                    dim -= 1;
                    cursor[dim] += 1;
                    if cursor[dim] < extents[dim] {
                        break;
                    }
                    cursor[dim] = 0;
                }
            }
        }
    }
}

fn flat_offset(cursor: &[usize], dims: &[Dim]) -> usize {
    cursor
        .iter()
        .zip(dims)
        .fold(0, |acc, (index, dim)| acc * dim.len + index)
}
