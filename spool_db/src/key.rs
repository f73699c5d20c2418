use crate::prefix::IsPrefixOf;

/// Raised when a byte slice has the wrong width for a fixed-size integer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WidthMismatchError {
    pub expected: usize,
    pub actual: usize,
}

impl std::fmt::Display for WidthMismatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "expected {} bytes, found {}", self.expected, self.actual)
    }
}

impl std::error::Error for WidthMismatchError {}

// Big-endian integers compare bytewise in the same order as numerically,
// which is what makes them usable as key components.
macro_rules! big_endian_int {
    ($BeInt:ident, $Int:ty) => {
        #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
        pub struct $BeInt([u8; std::mem::size_of::<$Int>()]);

        impl $BeInt {
            pub const WIDTH: usize = std::mem::size_of::<$Int>();

            pub fn get(self) -> $Int {
                <$Int>::from_be_bytes(self.0)
            }
        }

        impl From<$Int> for $BeInt {
            fn from(value: $Int) -> $BeInt {
                $BeInt(value.to_be_bytes())
            }
        }
        impl From<$BeInt> for $Int {
            fn from(value: $BeInt) -> $Int {
                <$Int>::from_be_bytes(value.0)
            }
        }
        impl From<$BeInt> for [u8; std::mem::size_of::<$Int>()] {
            fn from(value: $BeInt) -> [u8; std::mem::size_of::<$Int>()] {
                value.0
            }
        }
        impl From<[u8; std::mem::size_of::<$Int>()]> for $BeInt {
            fn from(value: [u8; std::mem::size_of::<$Int>()]) -> $BeInt {
                $BeInt(value)
            }
        }
        impl<'a> TryFrom<&'a [u8]> for $BeInt {
            type Error = WidthMismatchError;

            fn try_from(value: &'a [u8]) -> Result<$BeInt, WidthMismatchError> {
                <[u8; std::mem::size_of::<$Int>()]>::try_from(value)
                    .map($BeInt)
                    .map_err(|_| WidthMismatchError {
                        expected: Self::WIDTH,
                        actual: value.len(),
                    })
            }
        }
        impl AsRef<[u8]> for $BeInt {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }
        impl IsPrefixOf<[u8]> for $BeInt {
            fn is_prefix_of(&self, other: &[u8]) -> bool {
                self.0.is_prefix_of(other)
            }
        }
    };
}

big_endian_int!(BigEndianU16, u16);
big_endian_int!(BigEndianU64, u64);
