//! Host typed arrays and the engine vectors backing them.
//!
//! The element kind of a [`Vector`] is fixed when it is created and always
//! selected from the [`HostArray`] variant. Plain arrays of boxed numbers
//! ([`HostArray::Untyped`]) are rejected, never coerced.

use backend::ffi::{self, ElementType};

use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::kinds::VectorKind;
use crate::native;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Int32,
    Uint32,
    Float64,
    BigInt64,
    BigUint64,
}

impl ElementKind {
    pub const ALL: [ElementKind; 5] = [
        ElementKind::Int32,
        ElementKind::Uint32,
        ElementKind::Float64,
        ElementKind::BigInt64,
        ElementKind::BigUint64,
    ];

    /// Name of the host container holding this kind.
    pub fn array_name(self) -> &'static str {
        match self {
            ElementKind::Int32 => "Int32Array",
            ElementKind::Uint32 => "Uint32Array",
            ElementKind::Float64 => "Float64Array",
            ElementKind::BigInt64 => "BigInt64Array",
            ElementKind::BigUint64 => "BigUint64Array",
        }
    }

    fn element_type(self) -> ElementType {
        match self {
            ElementKind::Int32 => ElementType::Int32,
            ElementKind::Uint32 => ElementType::Uint32,
            ElementKind::Float64 => ElementType::Float64,
            ElementKind::BigInt64 => ElementType::Int64,
            ElementKind::BigUint64 => ElementType::Uint64,
        }
    }

    fn from_code(code: u8) -> Option<ElementKind> {
        ElementKind::ALL
            .into_iter()
            .find(|kind| kind.element_type() as u8 == code)
    }
}

/// One element of a host array.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HostScalar {
    Int32(i32),
    Uint32(u32),
    Float64(f64),
    BigInt64(i64),
    BigUint64(u64),
}

impl HostScalar {
    pub fn kind(&self) -> ElementKind {
        match self {
            HostScalar::Int32(_) => ElementKind::Int32,
            HostScalar::Uint32(_) => ElementKind::Uint32,
            HostScalar::Float64(_) => ElementKind::Float64,
            HostScalar::BigInt64(_) => ElementKind::BigInt64,
            HostScalar::BigUint64(_) => ElementKind::BigUint64,
        }
    }

    fn to_bits(self) -> u64 {
        match self {
            HostScalar::Int32(x) => x.to_bits(),
            HostScalar::Uint32(x) => x.to_bits(),
            HostScalar::Float64(x) => Element::to_bits(x),
            HostScalar::BigInt64(x) => x.to_bits(),
            HostScalar::BigUint64(x) => x.to_bits(),
        }
    }

    fn from_bits(kind: ElementKind, bits: u64) -> HostScalar {
        match kind {
            ElementKind::Int32 => HostScalar::Int32(i32::from_bits(bits)),
            ElementKind::Uint32 => HostScalar::Uint32(u32::from_bits(bits)),
            ElementKind::Float64 => HostScalar::Float64(<f64 as Element>::from_bits(bits)),
            ElementKind::BigInt64 => HostScalar::BigInt64(i64::from_bits(bits)),
            ElementKind::BigUint64 => HostScalar::BigUint64(u64::from_bits(bits)),
        }
    }
}

/// A host-side array as handed to or returned by the bindings.
#[derive(Clone, Debug, PartialEq)]
pub enum HostArray {
    Int32(Vec<i32>),
    Uint32(Vec<u32>),
    Float64(Vec<f64>),
    BigInt64(Vec<i64>),
    BigUint64(Vec<u64>),
    /// Plain array of boxed numbers.
    Untyped(Vec<HostScalar>),
}

impl HostArray {
    /// Element kind, `None` for an untyped array.
    pub fn kind(&self) -> Option<ElementKind> {
        match self {
            HostArray::Int32(_) => Some(ElementKind::Int32),
            HostArray::Uint32(_) => Some(ElementKind::Uint32),
            HostArray::Float64(_) => Some(ElementKind::Float64),
            HostArray::BigInt64(_) => Some(ElementKind::BigInt64),
            HostArray::BigUint64(_) => Some(ElementKind::BigUint64),
            HostArray::Untyped(_) => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.kind().map_or("Array", ElementKind::array_name)
    }

    pub fn len(&self) -> usize {
        match self {
            HostArray::Int32(v) => v.len(),
            HostArray::Uint32(v) => v.len(),
            HostArray::Float64(v) => v.len(),
            HostArray::BigInt64(v) => v.len(),
            HostArray::BigUint64(v) => v.len(),
            HostArray::Untyped(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Little-endian packed elements; `None` for an untyped array.
    fn to_le_bytes(&self) -> Option<Vec<u8>> {
        match self {
            HostArray::Int32(v) => Some(pack(v)),
            HostArray::Uint32(v) => Some(pack(v)),
            HostArray::Float64(v) => Some(pack(v)),
            HostArray::BigInt64(v) => Some(pack(v)),
            HostArray::BigUint64(v) => Some(pack(v)),
            HostArray::Untyped(_) => None,
        }
    }

    fn from_le_bytes(kind: ElementKind, bytes: &[u8]) -> HostArray {
        match kind {
            ElementKind::Int32 => HostArray::Int32(unpack(bytes)),
            ElementKind::Uint32 => HostArray::Uint32(unpack(bytes)),
            ElementKind::Float64 => HostArray::Float64(unpack(bytes)),
            ElementKind::BigInt64 => HostArray::BigInt64(unpack(bytes)),
            ElementKind::BigUint64 => HostArray::BigUint64(unpack(bytes)),
        }
    }
}

/// Primitive types a [`Vector`] can hold.
pub trait Element: Copy + Sized {
    const KIND: ElementKind;
    const WIDTH: usize;
    /// Sign-extended integer or IEEE-754 pattern.
    fn to_bits(self) -> u64;
    fn from_bits(bits: u64) -> Self;
    fn extend_le(self, out: &mut Vec<u8>);
    fn from_le(chunk: &[u8]) -> Self;
    fn into_host(values: Vec<Self>) -> HostArray;
    fn from_host(array: HostArray) -> Option<Vec<Self>>;
}

macro_rules! element {
    ($ty:ty, $kind:ident, |$x:ident| $to:expr, |$b:ident| $from:expr) => {
        impl Element for $ty {
            const KIND: ElementKind = ElementKind::$kind;
            const WIDTH: usize = std::mem::size_of::<$ty>();

            fn to_bits(self) -> u64 {
                let $x: $ty = self;
                $to
            }

            fn from_bits($b: u64) -> Self {
                $from
            }

            fn extend_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn from_le(chunk: &[u8]) -> Self {
                let mut bytes: [u8; std::mem::size_of::<$ty>()] = [0; std::mem::size_of::<$ty>()];
                bytes.copy_from_slice(chunk);
                <$ty>::from_le_bytes(bytes)
            }

            fn into_host(values: Vec<Self>) -> HostArray {
                HostArray::$kind(values)
            }

            fn from_host(array: HostArray) -> Option<Vec<Self>> {
                match array {
                    HostArray::$kind(values) => Some(values),
                    _ => None,
                }
            }
        }
    };
}

element!(i32, Int32, |x| x as i64 as u64, |b| b as i64 as i32);
element!(u32, Uint32, |x| x as u64, |b| b as u32);
element!(f64, Float64, |x| x.to_bits(), |b| f64::from_bits(b));
element!(i64, BigInt64, |x| x as u64, |b| b as i64);
element!(u64, BigUint64, |x| x, |b| b);

fn pack<T: Element>(values: &[T]) -> Vec<u8> {
    let mut bytes: Vec<u8> = Vec::with_capacity(values.len() * T::WIDTH);
    values.iter().for_each(|x| x.extend_le(&mut bytes));
    bytes
}

fn unpack<T: Element>(bytes: &[u8]) -> Vec<T> {
    bytes.chunks_exact(T::WIDTH).map(T::from_le).collect()
}

/// Engine vector of one fixed element kind.
pub type Vector = Handle<VectorKind>;

impl Vector {
    /// Empty vector of `kind`.
    pub fn new(kind: ElementKind) -> Result<Vector> {
        Self::from_bytes(kind, &[])
    }

    fn from_bytes(kind: ElementKind, bytes: &[u8]) -> Result<Vector> {
        native::construct(|out| unsafe {
            ffi::vector::seal_vector_create(kind.element_type() as u8, bytes.as_ptr(), bytes.len() as u64, out)
        })
    }

    pub fn from_host(array: &HostArray) -> Result<Vector> {
        match (array.kind(), array.to_le_bytes()) {
            (Some(kind), Some(bytes)) => Self::from_bytes(kind, &bytes),
            _ => Err(Error::TypeMismatch {
                expected: "typed array",
                found: array.type_name(),
            }),
        }
    }

    pub fn from_slice<T: Element>(values: &[T]) -> Result<Vector> {
        Self::from_bytes(T::KIND, &pack(values))
    }

    pub fn element_kind(&self) -> Result<ElementKind> {
        let this: *const ffi::vector_t = self.as_const()?;
        let code: u8 = native::read(|out| unsafe { ffi::vector::seal_vector_element_type(this, out) })?;
        ElementKind::from_code(code).ok_or(Error::TypeMismatch {
            expected: "element kind",
            found: "unknown element code",
        })
    }

    pub fn len(&self) -> Result<usize> {
        let this: *const ffi::vector_t = self.as_const()?;
        native::read(|out| unsafe { ffi::vector::seal_vector_size(this, out) }).map(|n: u64| n as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Element `index`, `None` past the end.
    pub fn get(&self, index: usize) -> Result<Option<HostScalar>> {
        let kind: ElementKind = self.element_kind()?;
        let this: *const ffi::vector_t = self.as_const()?;
        let mut bits: u64 = 0;
        let found: bool = native::check_found(unsafe { ffi::vector::seal_vector_get(this, index as u64, &mut bits) })?;
        Ok(found.then(|| HostScalar::from_bits(kind, bits)))
    }

    /// Writes element `index`. Out of bounds writes nothing and returns
    /// `false`.
    pub fn set(&mut self, index: usize, value: HostScalar) -> Result<bool> {
        self.expect_kind(value.kind())?;
        let this: *mut ffi::vector_t = self.as_ptr()?;
        native::check_found(unsafe { ffi::vector::seal_vector_set(this, index as u64, value.to_bits()) })
    }

    /// Grows with `fill` or truncates to `len` elements.
    pub fn resize(&mut self, len: usize, fill: HostScalar) -> Result<()> {
        self.expect_kind(fill.kind())?;
        let this: *mut ffi::vector_t = self.as_ptr()?;
        native::check(unsafe { ffi::vector::seal_vector_resize(this, len as u64, fill.to_bits()) })?;
        Ok(())
    }

    /// Fresh host array of the vector's kind.
    pub fn to_host(&self) -> Result<HostArray> {
        let kind: ElementKind = self.element_kind()?;
        let this: *const ffi::vector_t = self.as_const()?;
        let bytes: Vec<u8> = native::read_buffer(|buf, len| unsafe { ffi::vector::seal_vector_copy_to(this, buf, len) })?;
        Ok(HostArray::from_le_bytes(kind, &bytes))
    }

    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        self.expect_kind(T::KIND)?;
        let host: HostArray = self.to_host()?;
        let found: &'static str = host.type_name();
        T::from_host(host).ok_or(Error::TypeMismatch {
            expected: T::KIND.array_name(),
            found,
        })
    }

    fn expect_kind(&self, found: ElementKind) -> Result<()> {
        let expected: ElementKind = self.element_kind()?;
        if expected != found {
            return Err(Error::TypeMismatch {
                expected: expected.array_name(),
                found: found.array_name(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::tests::init;

    #[test]
    fn bits_follow_the_engine_convention() {
        assert_eq!((-1i32).to_bits(), u64::MAX);
        assert_eq!(i32::from_bits(u64::MAX), -1);
        assert_eq!(<f64 as Element>::from_bits(Element::to_bits(1.5f64)), 1.5);
        assert_eq!(HostScalar::from_bits(ElementKind::Uint32, 7), HostScalar::Uint32(7));
    }

    #[test]
    fn host_round_trip() {
        init();
        let arrays: [HostArray; 5] = [
            HostArray::Int32(vec![-3, 0, i32::MAX]),
            HostArray::Uint32(vec![u32::MAX, 1]),
            HostArray::Float64(vec![0.25, -1e300]),
            HostArray::BigInt64(vec![i64::MIN]),
            HostArray::BigUint64(vec![]),
        ];
        for array in arrays {
            let vector: Vector = Vector::from_host(&array).unwrap();
            assert_eq!(vector.len().unwrap(), array.len());
            assert_eq!(Some(vector.element_kind().unwrap()), array.kind());
            assert_eq!(vector.to_host().unwrap(), array);
        }
    }

    #[test]
    fn untyped_input_is_rejected() {
        init();
        let err: Error = Vector::from_host(&HostArray::Untyped(vec![HostScalar::Int32(1)])).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::TypeMismatch);
    }

    #[test]
    fn access_is_bounds_checked() {
        init();
        let mut vector: Vector = Vector::from_slice(&[1u32, 2, 3]).unwrap();
        assert_eq!(vector.get(2).unwrap(), Some(HostScalar::Uint32(3)));
        assert_eq!(vector.get(3).unwrap(), None);
        assert!(vector.set(0, HostScalar::Uint32(9)).unwrap());
        assert!(!vector.set(3, HostScalar::Uint32(9)).unwrap());
        assert_eq!(
            vector.set(0, HostScalar::Int32(9)).unwrap_err().category(),
            ErrorCategory::TypeMismatch
        );
        vector.resize(5, HostScalar::Uint32(7)).unwrap();
        assert_eq!(vector.to_vec::<u32>().unwrap(), vec![9, 2, 3, 7, 7]);
        vector.resize(1, HostScalar::Uint32(0)).unwrap();
        assert_eq!(vector.to_vec::<u32>().unwrap(), vec![9]);
        assert!(vector.to_vec::<i32>().is_err());
    }
}
