//! Binary Galois field arithmetic, GF(2^m) with `m <= 8`, using log/antilog tables.
//!
//! Elements are kept either in polynomial form (the symbol value itself) or in index form
//! (the power of the primitive element alpha). Index form uses `nn = 2^m - 1` to represent
//! the zero element, see [GaloisField::A0].
use crate::{Error, Result};

/// Largest supported symbol size in bits.
pub const MAX_SYMSIZE: u32 = 8;

/// Log/antilog tables for a binary extension field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GaloisField {
    symsize: u32,
    nn: usize,
    alpha_to: Vec<u8>,
    index_of: Vec<u8>,
}

impl GaloisField {
    /// Build the tables for GF(2^`symsize`) generated by the field polynomial `gfpoly`.
    ///
    /// # Errors
    /// [Error::InvalidParameters] if `symsize` is not in `1..=8`, or
    /// [Error::NonPrimitivePolynomial] if `gfpoly` is not of degree `symsize` or does not
    /// generate all `2^symsize - 1` non-zero elements.
    pub fn new(symsize: u32, gfpoly: u32) -> Result<Self> {
        if symsize == 0 || symsize > MAX_SYMSIZE {
            return Err(Error::InvalidParameters(format!(
                "symbol size {symsize} not in 1..={MAX_SYMSIZE}"
            )));
        }
        if gfpoly >> symsize != 1 {
            return Err(Error::NonPrimitivePolynomial(gfpoly));
        }
        let size = 1usize << symsize;
        let nn = size - 1;
        let mut alpha_to = vec![0u8; size];
        let mut index_of = vec![0u8; size];

        // log(0) = -inf, represented by nn
        index_of[0] = nn as u8;
        alpha_to[nn] = 0;

        let mut sr: u32 = 1;
        for i in 0..nn {
            index_of[sr as usize] = i as u8;
            alpha_to[i] = sr as u8;
            sr <<= 1;
            if sr & (1 << symsize) != 0 {
                sr ^= gfpoly;
            }
            sr &= nn as u32;
            // returning to 1 early means alpha has order less than nn
            if sr == 1 && i + 1 < nn {
                return Err(Error::NonPrimitivePolynomial(gfpoly));
            }
        }
        if sr != 1 {
            return Err(Error::NonPrimitivePolynomial(gfpoly));
        }

        Ok(GaloisField {
            symsize,
            nn,
            alpha_to,
            index_of,
        })
    }

    /// Index form of the zero element for this field.
    #[must_use]
    pub fn a0(&self) -> usize {
        self.nn
    }

    /// Symbols per full-length block, `2^m - 1`.
    #[must_use]
    pub fn nn(&self) -> usize {
        self.nn
    }

    #[must_use]
    pub fn symsize(&self) -> u32 {
        self.symsize
    }

    /// Reduce `x` modulo `nn` using fold-back rather than division.
    ///
    /// Since `2^m ≡ 1 (mod 2^m - 1)` the high bits can be folded onto the low bits.
    #[inline]
    #[must_use]
    pub fn modnn(&self, mut x: usize) -> usize {
        while x >= self.nn {
            x -= self.nn;
            x = (x >> self.symsize) + (x & self.nn);
        }
        x
    }

    /// Antilog; the element alpha^`i` in polynomial form.
    #[inline]
    #[must_use]
    pub fn alpha(&self, i: usize) -> u8 {
        self.alpha_to[i]
    }

    /// Log; index form of `x`, with [Self::a0] for zero.
    #[inline]
    #[must_use]
    pub fn index(&self, x: u8) -> usize {
        self.index_of[x as usize] as usize
    }

    /// alpha^`i` for any `i`, reducing the exponent first.
    #[inline]
    #[must_use]
    pub fn pow(&self, i: usize) -> u8 {
        self.alpha_to[self.modnn(i)]
    }

    /// Field multiplication in polynomial form.
    #[must_use]
    pub fn mult(&self, a: u8, b: u8) -> u8 {
        if a == 0 || b == 0 {
            return 0;
        }
        self.pow(self.index(a) + self.index(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn tables_are_inverse() {
        let gf = GaloisField::new(8, 0x187).unwrap();
        for x in 1..=255u8 {
            assert_eq!(gf.alpha(gf.index(x)), x, "alpha(log({x})) != {x}");
        }
        assert_eq!(gf.index(0), gf.a0());
        assert_eq!(gf.alpha(gf.a0()), 0);
    }

    #[test]
    fn first_powers_of_alpha() {
        let gf = GaloisField::new(8, 0x187).unwrap();
        let expected = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x87, 0x89];
        for (i, x) in expected.iter().enumerate() {
            assert_eq!(gf.alpha(i), *x, "alpha^{i}");
        }
    }

    #[test]
    fn modnn_matches_remainder() {
        let gf = GaloisField::new(8, 0x187).unwrap();
        for x in [0usize, 1, 254, 255, 256, 509, 510, 1827, 65_000] {
            assert_eq!(gf.modnn(x), x % 255, "modnn({x})");
        }
    }

    #[test]
    fn mult_commutes_and_has_identity() {
        let gf = GaloisField::new(8, 0x187).unwrap();
        for a in [0u8, 1, 2, 0x53, 0xca, 0xff] {
            assert_eq!(gf.mult(a, 1), a);
            for b in [0u8, 3, 0x8e, 0xfe] {
                assert_eq!(gf.mult(a, b), gf.mult(b, a));
            }
        }
    }

    #[test_case(4, 0x13; "gf16")]
    #[test_case(8, 0x11d; "gf256 0x11d")]
    #[test_case(8, 0x187; "gf256 ccsds")]
    fn primitive_polynomials_build(symsize: u32, gfpoly: u32) {
        let gf = GaloisField::new(symsize, gfpoly).unwrap();
        assert_eq!(gf.symsize(), symsize);
        assert_eq!(gf.nn(), (1 << symsize) - 1);
    }

    #[test_case(0x11b; "irreducible with alpha of order 51")]
    #[test_case(0x100; "reducible x^8")]
    #[test_case(0x1ff; "reducible all ones")]
    #[test_case(0x87; "degree 7")]
    #[test_case(0x387; "degree 9")]
    #[test_case(0xfff_ff87; "high bits set")]
    fn non_primitive_polynomial_fails(gfpoly: u32) {
        let zult = GaloisField::new(8, gfpoly);
        assert!(
            matches!(zult, Err(Error::NonPrimitivePolynomial(p)) if p == gfpoly),
            "got {zult:?}"
        );
    }

    #[test_case(0; "zero")]
    #[test_case(9; "nine")]
    fn symsize_out_of_range_fails(symsize: u32) {
        let zult = GaloisField::new(symsize, 0x187);
        assert!(matches!(zult, Err(Error::InvalidParameters(_))), "got {zult:?}");
    }
}
