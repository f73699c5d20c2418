/// Trait for comparing keys with prefixes.
pub trait IsPrefixOf<Rhs: ?Sized = Self> {
    fn is_prefix_of(&self, other: &Rhs) -> bool;
}

impl IsPrefixOf for [u8] {
    #[inline(always)]
    fn is_prefix_of(&self, other: &Self) -> bool {
        if other.len() < self.len() {
            return false;
        }
        self == &other[..self.len()]
    }
}

impl IsPrefixOf for str {
    #[inline(always)]
    fn is_prefix_of(&self, other: &Self) -> bool {
        self.as_bytes().is_prefix_of(other.as_bytes())
    }
}

impl IsPrefixOf<[u8]> for Vec<u8> {
    #[inline(always)]
    fn is_prefix_of(&self, other: &[u8]) -> bool {
        self[..].is_prefix_of(other)
    }
}

impl<P: IsPrefixOf<T> + ?Sized, T: ?Sized> IsPrefixOf<T> for Box<P> {
    #[inline(always)]
    fn is_prefix_of(&self, other: &T) -> bool {
        (**self).is_prefix_of(other)
    }
}

impl<const N: usize> IsPrefixOf<[u8]> for [u8; N] {
    #[inline(always)]
    fn is_prefix_of(&self, other: &[u8]) -> bool {
        self[..].is_prefix_of(other)
    }
}
