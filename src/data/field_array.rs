//! Tagged field arrays borrowed from simulation memory.
//!
//! A [`FieldArray`] is a flat, tuple-major buffer (`tuples * components`
//! values) in one of a handful of scalar types. Values are held as
//! `Cow<'a, [T]>`: the adaptor normally lends its own buffers for the
//! duration of co-processing, and the `'a` lifetime keeps pipelines from
//! holding on to them once the step is over. [`FieldArray::to_owned_array`]
//! copies out anything that has to survive.

use crate::coproc_error::CoProcessingError;
use num_traits::ToPrimitive;
use std::borrow::Cow;

/// Scalar type tag for field arrays.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ScalarType {
    F64,
    F32,
    I32,
    I64,
}

impl ScalarType {
    /// Returns a stable string label for the scalar type.
    pub fn as_str(self) -> &'static str {
        match self {
            ScalarType::F64 => "f64",
            ScalarType::F32 => "f32",
            ScalarType::I32 => "i32",
            ScalarType::I64 => "i64",
        }
    }

    /// Legacy VTK data type keyword.
    pub fn vtk_name(self) -> &'static str {
        match self {
            ScalarType::F64 => "double",
            ScalarType::F32 => "float",
            ScalarType::I32 => "int",
            ScalarType::I64 => "long",
        }
    }
}

/// Flat values of one field, borrowed or owned.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValues<'a> {
    F64(Cow<'a, [f64]>),
    F32(Cow<'a, [f32]>),
    I32(Cow<'a, [i32]>),
    I64(Cow<'a, [i64]>),
}

impl FieldValues<'_> {
    /// Return the scalar type tag for these values.
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            FieldValues::F64(_) => ScalarType::F64,
            FieldValues::F32(_) => ScalarType::F32,
            FieldValues::I32(_) => ScalarType::I32,
            FieldValues::I64(_) => ScalarType::I64,
        }
    }

    /// Number of scalar values.
    pub fn len(&self) -> usize {
        match self {
            FieldValues::F64(v) => v.len(),
            FieldValues::F32(v) => v.len(),
            FieldValues::I32(v) => v.len(),
            FieldValues::I64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value `i` widened to `f64`, `None` when out of range.
    pub fn get_f64(&self, i: usize) -> Option<f64> {
        match self {
            FieldValues::F64(v) => v.get(i).and_then(ToPrimitive::to_f64),
            FieldValues::F32(v) => v.get(i).and_then(ToPrimitive::to_f64),
            FieldValues::I32(v) => v.get(i).and_then(ToPrimitive::to_f64),
            FieldValues::I64(v) => v.get(i).and_then(ToPrimitive::to_f64),
        }
    }

    /// Iterate every value widened to `f64`.
    pub fn iter_f64(&self) -> Box<dyn Iterator<Item = f64> + '_> {
        fn widen<T: ToPrimitive>(values: &[T]) -> Box<dyn Iterator<Item = f64> + '_> {
            Box::new(values.iter().filter_map(ToPrimitive::to_f64))
        }
        match self {
            FieldValues::F64(v) => widen(&v[..]),
            FieldValues::F32(v) => widen(&v[..]),
            FieldValues::I32(v) => widen(&v[..]),
            FieldValues::I64(v) => widen(&v[..]),
        }
    }

    /// Render values as text, one string per scalar (used by the VTK writer).
    pub(crate) fn to_strings(&self) -> Vec<String> {
        match self {
            FieldValues::F64(v) => v.iter().map(ToString::to_string).collect(),
            FieldValues::F32(v) => v.iter().map(ToString::to_string).collect(),
            FieldValues::I32(v) => v.iter().map(ToString::to_string).collect(),
            FieldValues::I64(v) => v.iter().map(ToString::to_string).collect(),
        }
    }

    fn into_owned(self) -> FieldValues<'static> {
        match self {
            FieldValues::F64(v) => FieldValues::F64(Cow::Owned(v.into_owned())),
            FieldValues::F32(v) => FieldValues::F32(Cow::Owned(v.into_owned())),
            FieldValues::I32(v) => FieldValues::I32(Cow::Owned(v.into_owned())),
            FieldValues::I64(v) => FieldValues::I64(Cow::Owned(v.into_owned())),
        }
    }
}

/// One populated data array: flat values plus the tuple width.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldArray<'a> {
    components: usize,
    values: FieldValues<'a>,
}

impl<'a> FieldArray<'a> {
    /// Wrap `values` as an array of `components`-wide tuples.
    ///
    /// # Errors
    /// `InvalidArrayShape` if `components == 0` or the value count is not a
    /// multiple of `components`.
    pub fn new(components: usize, values: FieldValues<'a>) -> Result<Self, CoProcessingError> {
        if components == 0 {
            return Err(CoProcessingError::InvalidArrayShape(
                "component count must be non-zero".into(),
            ));
        }
        if values.len() % components != 0 {
            return Err(CoProcessingError::InvalidArrayShape(format!(
                "{} values do not split into tuples of {components}",
                values.len()
            )));
        }
        Ok(Self { components, values })
    }

    /// Borrow a scalar `f64` buffer (one component per tuple).
    pub fn scalars(values: &'a [f64]) -> Self {
        Self {
            components: 1,
            values: FieldValues::F64(Cow::Borrowed(values)),
        }
    }

    /// Borrow an interleaved `f64` buffer with `components` per tuple.
    pub fn borrowed_f64(components: usize, values: &'a [f64]) -> Result<Self, CoProcessingError> {
        Self::new(components, FieldValues::F64(Cow::Borrowed(values)))
    }

    /// Borrow an interleaved `f32` buffer with `components` per tuple.
    pub fn borrowed_f32(components: usize, values: &'a [f32]) -> Result<Self, CoProcessingError> {
        Self::new(components, FieldValues::F32(Cow::Borrowed(values)))
    }

    /// Borrow an interleaved `i32` buffer with `components` per tuple.
    pub fn borrowed_i32(components: usize, values: &'a [i32]) -> Result<Self, CoProcessingError> {
        Self::new(components, FieldValues::I32(Cow::Borrowed(values)))
    }

    /// Borrow an interleaved `i64` buffer with `components` per tuple.
    pub fn borrowed_i64(components: usize, values: &'a [i64]) -> Result<Self, CoProcessingError> {
        Self::new(components, FieldValues::I64(Cow::Borrowed(values)))
    }

    pub fn components(&self) -> usize {
        self.components
    }

    /// Number of tuples (values / components).
    pub fn tuples(&self) -> usize {
        self.values.len() / self.components
    }

    pub fn values(&self) -> &FieldValues<'a> {
        &self.values
    }

    pub fn scalar_type(&self) -> ScalarType {
        self.values.scalar_type()
    }

    /// Whether the values still point into simulation memory.
    pub fn is_borrowed(&self) -> bool {
        match &self.values {
            FieldValues::F64(v) => matches!(v, Cow::Borrowed(_)),
            FieldValues::F32(v) => matches!(v, Cow::Borrowed(_)),
            FieldValues::I32(v) => matches!(v, Cow::Borrowed(_)),
            FieldValues::I64(v) => matches!(v, Cow::Borrowed(_)),
        }
    }

    /// Euclidean magnitude of tuple `t` (the value itself for scalars).
    pub fn tuple_magnitude(&self, t: usize) -> Option<f64> {
        if t >= self.tuples() {
            return None;
        }
        let start = t * self.components;
        if self.components == 1 {
            return self.values.get_f64(start);
        }
        let mut sum = 0.0;
        for i in start..start + self.components {
            let v = self.values.get_f64(i)?;
            sum += v * v;
        }
        Some(sum.sqrt())
    }

    /// Deep-copy the values so the array outlives the simulation buffers.
    pub fn to_owned_array(&self) -> FieldArray<'static> {
        FieldArray {
            components: self.components,
            values: self.values.clone().into_owned(),
        }
    }
}
