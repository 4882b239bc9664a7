use crate::fault::{NativeFault, Result};

/// Largest element count a vector may be resized to.
pub const MAX_VECTOR_LEN: u64 = 1 << 27;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ElementType {
    Int32 = 1,
    Uint32 = 2,
    Float64 = 3,
    Int64 = 4,
    Uint64 = 5,
}

impl ElementType {
    pub fn from_u8(value: u8) -> Option<ElementType> {
        match value {
            1 => Some(ElementType::Int32),
            2 => Some(ElementType::Uint32),
            3 => Some(ElementType::Float64),
            4 => Some(ElementType::Int64),
            5 => Some(ElementType::Uint64),
            _ => None,
        }
    }

    pub fn width(&self) -> usize {
        match self {
            ElementType::Int32 | ElementType::Uint32 => 4,
            ElementType::Float64 | ElementType::Int64 | ElementType::Uint64 => 8,
        }
    }
}

/// Engine-side growable numeric array. Elements cross the boundary as raw
/// 64-bit patterns: sign-extended integers or IEEE-754 bits.
#[derive(Clone, Debug, PartialEq)]
pub enum Vector {
    Int32(Vec<i32>),
    Uint32(Vec<u32>),
    Float64(Vec<f64>),
    Int64(Vec<i64>),
    Uint64(Vec<u64>),
}

impl Vector {
    pub fn new(element_type: ElementType) -> Vector {
        match element_type {
            ElementType::Int32 => Vector::Int32(Vec::new()),
            ElementType::Uint32 => Vector::Uint32(Vec::new()),
            ElementType::Float64 => Vector::Float64(Vec::new()),
            ElementType::Int64 => Vector::Int64(Vec::new()),
            ElementType::Uint64 => Vector::Uint64(Vec::new()),
        }
    }

    /// Builds a vector from little-endian packed elements.
    pub fn from_bytes(element_type: ElementType, bytes: &[u8]) -> Result<Vector> {
        let width: usize = element_type.width();
        if bytes.len() % width != 0 {
            return Err(NativeFault::invalid_argument(format!(
                "{} bytes is not a whole number of {width} byte elements",
                bytes.len()
            )));
        }
        let vector: Vector = match element_type {
            ElementType::Int32 => Vector::Int32(
                bytes
                    .chunks_exact(4)
                    .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
            ElementType::Uint32 => Vector::Uint32(
                bytes
                    .chunks_exact(4)
                    .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
            ElementType::Float64 => Vector::Float64(bytes.chunks_exact(8).map(|c| f64::from_bits(le_u64(c))).collect()),
            ElementType::Int64 => Vector::Int64(bytes.chunks_exact(8).map(|c| le_u64(c) as i64).collect()),
            ElementType::Uint64 => Vector::Uint64(bytes.chunks_exact(8).map(le_u64).collect()),
        };
        Ok(vector)
    }

    /// Little-endian packed elements.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Vector::Int32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            Vector::Uint32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            Vector::Float64(v) => v.iter().flat_map(|x| x.to_bits().to_le_bytes()).collect(),
            Vector::Int64(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            Vector::Uint64(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
        }
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            Vector::Int32(_) => ElementType::Int32,
            Vector::Uint32(_) => ElementType::Uint32,
            Vector::Float64(_) => ElementType::Float64,
            Vector::Int64(_) => ElementType::Int64,
            Vector::Uint64(_) => ElementType::Uint64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Vector::Int32(v) => v.len(),
            Vector::Uint32(v) => v.len(),
            Vector::Float64(v) => v.len(),
            Vector::Int64(v) => v.len(),
            Vector::Uint64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_bits(&self, index: usize) -> Option<u64> {
        match self {
            Vector::Int32(v) => v.get(index).map(|x| *x as i64 as u64),
            Vector::Uint32(v) => v.get(index).map(|x| *x as u64),
            Vector::Float64(v) => v.get(index).map(|x| x.to_bits()),
            Vector::Int64(v) => v.get(index).map(|x| *x as u64),
            Vector::Uint64(v) => v.get(index).copied(),
        }
    }

    /// Writes element `index`; returns false when it is out of bounds.
    pub fn set_bits(&mut self, index: usize, bits: u64) -> bool {
        if index >= self.len() {
            return false;
        }
        match self {
            Vector::Int32(v) => v[index] = bits as i64 as i32,
            Vector::Uint32(v) => v[index] = bits as u32,
            Vector::Float64(v) => v[index] = f64::from_bits(bits),
            Vector::Int64(v) => v[index] = bits as i64,
            Vector::Uint64(v) => v[index] = bits,
        }
        true
    }

    pub fn resize(&mut self, len: u64, fill_bits: u64) -> Result<()> {
        if len > MAX_VECTOR_LEN {
            return Err(NativeFault::out_of_range(format!(
                "requested size {len} exceeds maximum vector size {MAX_VECTOR_LEN}"
            )));
        }
        let len: usize = len as usize;
        match self {
            Vector::Int32(v) => grow(v, len, fill_bits as i64 as i32),
            Vector::Uint32(v) => grow(v, len, fill_bits as u32),
            Vector::Float64(v) => grow(v, len, f64::from_bits(fill_bits)),
            Vector::Int64(v) => grow(v, len, fill_bits as i64),
            Vector::Uint64(v) => grow(v, len, fill_bits),
        }
    }
}

/// Resizes `v` to `len`, reporting an allocation failure instead of aborting.
/// `v` is unchanged on error.
fn grow<T: Clone>(v: &mut Vec<T>, len: usize, fill: T) -> Result<()> {
    if len > v.len() {
        v.try_reserve_exact(len - v.len()).map_err(|err| {
            NativeFault::out_of_range(format!("cannot allocate {len} vector elements: {err}"))
        })?;
    }
    v.resize(len, fill);
    Ok(())
}

fn le_u64(chunk: &[u8]) -> u64 {
    let mut bytes: [u8; 8] = [0; 8];
    bytes.copy_from_slice(chunk);
    u64::from_le_bytes(bytes)
}
