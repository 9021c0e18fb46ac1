//! Fixed-width integer keys.

use std::fmt::Debug;

/// An integer type that can live in the key region.
///
/// Keys are stored back to back in native byte order, `WIDTH` bytes each.
/// The key region starts at byte 0 of the block, so reads go through
/// byte arrays and never assume alignment.
pub trait Key: Copy + Ord + Debug {
    /// Size of one key in bytes.
    const WIDTH: usize;

    /// Decodes a key from exactly `WIDTH` bytes.
    fn read(bytes: &[u8]) -> Self;

    /// Encodes the key into exactly `WIDTH` bytes.
    fn write(self, bytes: &mut [u8]);

    /// `n` as a key, or `None` if it is not representable.
    fn from_index(n: usize) -> Option<Self>;
}

macro_rules! impl_key {
    ($($t:ty),* $(,)?) => {$(
        impl Key for $t {
            const WIDTH: usize = std::mem::size_of::<$t>();

            #[inline]
            fn read(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(bytes);
                <$t>::from_ne_bytes(raw)
            }

            #[inline]
            fn write(self, bytes: &mut [u8]) {
                bytes.copy_from_slice(&self.to_ne_bytes());
            }

            #[inline]
            fn from_index(n: usize) -> Option<Self> {
                <$t>::try_from(n).ok()
            }
        }
    )*};
}

impl_key!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_widths() {
        let mut buf = [0u8; 8];
        (-7i64).write(&mut buf);
        assert_eq!(i64::read(&buf), -7);

        let mut buf = [0u8; 2];
        0xBEEFu16.write(&mut buf);
        assert_eq!(u16::read(&buf), 0xBEEF);

        assert_eq!(<u32 as Key>::WIDTH, 4);
        assert_eq!(<u128 as Key>::WIDTH, 16);
    }

    #[test]
    fn test_from_index_bounds() {
        assert_eq!(u8::from_index(255), Some(255));
        assert_eq!(u8::from_index(256), None);
        assert_eq!(i8::from_index(127), Some(127));
        assert_eq!(i8::from_index(128), None);
    }
}
