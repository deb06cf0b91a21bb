//! Fill values.
//!
//! A [`FillValue`] is the element value stamped into the destination where a wanted index space overlaps a tile with no stored chunk.
//! It is just the bytes of one element, the geometry of this crate never interprets element bytes.

use derive_more::Display;

/// The fill value of an array.
///
/// Values converted with [`From`] are in native endianness, use [`FillValue::new_with_endianness`] for the byte order of stored data.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct FillValue(Vec<u8>);

impl core::fmt::Display for FillValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl From<Vec<u8>> for FillValue {
    fn from(value: Vec<u8>) -> Self {
        FillValue(value)
    }
}

impl From<bool> for FillValue {
    fn from(value: bool) -> Self {
        FillValue(vec![u8::from(value)])
    }
}

macro_rules! impl_from_primitive {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FillValue {
                fn from(value: $t) -> Self {
                    FillValue(value.to_ne_bytes().to_vec())
                }
            }
        )*
    };
}

impl_from_primitive!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl FillValue {
    /// Create a new fill value composed of `bytes`.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> FillValue {
        FillValue(bytes)
    }

    /// Create a new fill value from a primitive `value` with the byte order of `endianness`.
    #[must_use]
    pub fn new_with_endianness<T: bytemuck::Pod>(value: T, endianness: Endianness) -> FillValue {
        let mut bytes = bytemuck::bytes_of(&value).to_vec();
        if !endianness.is_native() {
            bytes.reverse();
        }
        FillValue(bytes)
    }

    /// Returns the size in bytes of the fill value.
    #[must_use]
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Return the byte representation of the fill value.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns true if every element of `bytes` is equal to the fill value.
    ///
    /// Returns false if `bytes` is not a whole number of elements.
    #[must_use]
    pub fn equals_all(&self, bytes: &[u8]) -> bool {
        match self.size() {
            0 => bytes.is_empty(),
            1 => bytes.iter().all(|byte| *byte == self.0[0]),
            size => {
                bytes.len() % size == 0
                    && bytes
                        .chunks_exact(size)
                        .all(|element| element == self.0.as_slice())
            }
        }
    }

    /// Return `nelems` repetitions of the fill value.
    #[must_use]
    pub fn repeat(&self, nelems: usize) -> Vec<u8> {
        self.0.repeat(nelems)
    }
}

/// The byte order of the elements of an array, either `big` or `little`.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display)]
pub enum Endianness {
    /// Little endian.
    #[display("little")]
    Little,

    /// Big endian.
    #[display("big")]
    Big,
}

impl Endianness {
    /// Return true if the endianness matches the endianness of the CPU.
    #[must_use]
    pub fn is_native(self) -> bool {
        self == NATIVE_ENDIAN
    }
}

/// The endianness of the CPU.
pub const NATIVE_ENDIAN: Endianness = if cfg!(target_endian = "big") {
    Endianness::Big
} else {
    Endianness::Little
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_value() {
        assert_eq!(FillValue::from(true).as_bytes(), &[1]);
        assert_eq!(FillValue::from(-1i16).as_bytes(), &[255, 255]);
        assert_eq!(FillValue::from(1.5f64).size(), 8);
        assert_eq!(
            FillValue::from(7u32).as_bytes(),
            7u32.to_ne_bytes().as_slice()
        );
        assert_eq!(FillValue::from(vec![1, 2, 3]).to_string(), "[1, 2, 3]");
    }

    #[test]
    fn fill_value_endianness() {
        assert_eq!(
            FillValue::new_with_endianness(0x0102_0304u32, Endianness::Big).as_bytes(),
            &[1, 2, 3, 4]
        );
        assert_eq!(
            FillValue::new_with_endianness(0x0102_0304u32, Endianness::Little).as_bytes(),
            &[4, 3, 2, 1]
        );
        assert_eq!(
            FillValue::new_with_endianness(-9999.0f32, NATIVE_ENDIAN),
            FillValue::from(-9999.0f32)
        );
        assert_eq!(Endianness::Big.to_string(), "big");
    }

    #[test]
    fn fill_value_equals_all() {
        let fill_value = FillValue::from(0x0102u16);
        assert!(fill_value.equals_all(&fill_value.repeat(4)));
        assert!(!fill_value.equals_all(&[1, 2, 3]));
        assert!(!fill_value.equals_all(&[0, 0]));
        assert!(FillValue::from(5u8).equals_all(&[5, 5, 5]));
        assert!(FillValue::default().equals_all(&[]));
    }
}
