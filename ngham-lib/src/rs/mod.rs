//! Reed-Solomon encoding and decoding over GF(2^m) symbols, including shortened codes.
//!
//! The decoder performs errors-and-erasures decoding using Berlekamp-Massey to find the
//! error locator polynomial, a Chien search for its roots and Forney's algorithm for the
//! error values.
//!
//! # References
//! * [TM Synchronization and Channel Coding](https://ccsds.org/Pubs/131x0b5.pdf), Section 4
pub mod gf;

use tracing::trace;
use typed_builder::TypedBuilder;

use crate::{Error, Result};
use gf::GaloisField;

/// Field polynomial x^8 + x^7 + x^2 + x + 1, the CCSDS choice also used by NGHam.
pub const CCSDS_GFPOLY: u32 = 0x187;
/// First consecutive root of the generator polynomial, index form.
pub const CCSDS_FCR: usize = 112;
/// Primitive element used to generate roots, alpha^11.
pub const CCSDS_PRIM: usize = 11;

/// Parameters defining a Reed-Solomon code.
///
/// ```
/// use ngham::rs::Params;
///
/// // RS(47, 31) over GF(2^8): 16 parity symbols, shortened by 208 symbols
/// let params = Params::builder().nroots(16).pad(208).build();
/// assert_eq!(params.symsize, 8);
/// ```
#[derive(TypedBuilder, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Params {
    /// Bits per symbol.
    #[builder(default = 8)]
    pub symsize: u32,
    /// Field generator polynomial.
    #[builder(default = CCSDS_GFPOLY)]
    pub gfpoly: u32,
    /// First consecutive root, index form.
    #[builder(default = CCSDS_FCR)]
    pub fcr: usize,
    /// Primitive element, index form.
    #[builder(default = CCSDS_PRIM)]
    pub prim: usize,
    /// Number of generator roots, i.e., the number of parity symbols.
    pub nroots: usize,
    /// Number of leading symbols removed from a full block to shorten it.
    #[builder(default)]
    pub pad: usize,
}

/// Result of decoding a codeword.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum RSState {
    /// No errors were detected.
    Ok,
    /// Errors were corrected at these positions of the codeword (ascending).
    Corrected(Vec<usize>),
    /// The codeword contains more errors than can be corrected.
    Uncorrectable(String),
}

impl RSState {
    /// Return `true` if [Self::Ok] or [Self::Corrected].
    #[must_use]
    pub fn ok(&self) -> bool {
        matches!(self, Self::Ok | Self::Corrected(_))
    }

    /// Number of corrected symbols, or `None` if uncorrectable.
    #[must_use]
    pub fn num_corrected(&self) -> Option<usize> {
        match self {
            Self::Ok => Some(0),
            Self::Corrected(positions) => Some(positions.len()),
            Self::Uncorrectable(_) => None,
        }
    }
}

/// A decoded codeword.
#[derive(Debug, Clone)]
pub struct Block {
    pub state: RSState,
    /// The full codeword, corrected if the state is [RSState::Corrected], otherwise as
    /// provided.
    pub data: Vec<u8>,
}

/// Reed-Solomon codec for a single set of [Params].
///
/// Construction builds the field tables and generator polynomial which makes it much more
/// expensive than encoding or decoding a codeword, so a codec should be created once and
/// reused. It is immutable after construction and may be shared between threads.
#[derive(Clone, Debug)]
pub struct ReedSolomon {
    gf: GaloisField,
    /// Generator polynomial coefficients in index form, lowest order first.
    genpoly: Vec<usize>,
    fcr: usize,
    prim: usize,
    /// prim-th root of 1, index form
    iprim: usize,
    nroots: usize,
    pad: usize,
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl ReedSolomon {
    /// Create a codec for `params`.
    ///
    /// # Errors
    /// [Error::InvalidParameters] if any parameter is outside its valid range or
    /// [Error::NonPrimitivePolynomial] if the field polynomial is not primitive.
    pub fn new(params: Params) -> Result<Self> {
        let Params {
            symsize,
            gfpoly,
            fcr,
            prim,
            nroots,
            pad,
        } = params;
        if symsize == 0 || symsize > gf::MAX_SYMSIZE {
            return Err(Error::InvalidParameters(format!(
                "symbol size {symsize} not in 1..={}",
                gf::MAX_SYMSIZE
            )));
        }
        let size = 1usize << symsize;
        if fcr >= size {
            return Err(Error::InvalidParameters(format!(
                "first consecutive root {fcr} must be less than {size}"
            )));
        }
        if prim == 0 || prim >= size {
            return Err(Error::InvalidParameters(format!(
                "primitive element {prim} not in 1..{size}"
            )));
        }
        if nroots >= size {
            return Err(Error::InvalidParameters(format!(
                "number of roots {nroots} must be less than {size}"
            )));
        }
        if pad >= size - 1 - nroots {
            return Err(Error::InvalidParameters(format!(
                "pad {pad} leaves no data symbols with {nroots} roots"
            )));
        }
        if gcd(prim, size - 1) != 1 {
            return Err(Error::InvalidParameters(format!(
                "primitive element {prim} shares a factor with {}",
                size - 1
            )));
        }

        let gf = GaloisField::new(symsize, gfpoly)?;
        let nn = gf.nn();

        let mut iprim = 1;
        while iprim % prim != 0 {
            iprim += nn;
        }
        let iprim = iprim / prim;

        // Product of (x - alpha^(root)) for each of the nroots consecutive roots
        let mut genpoly = vec![0u8; nroots + 1];
        genpoly[0] = 1;
        let mut root = fcr * prim;
        for i in 0..nroots {
            genpoly[i + 1] = 1;
            for j in (1..=i).rev() {
                genpoly[j] = if genpoly[j] == 0 {
                    genpoly[j - 1]
                } else {
                    genpoly[j - 1] ^ gf.pow(gf.index(genpoly[j]) + root)
                };
            }
            // genpoly[0] can never be zero
            genpoly[0] = gf.pow(gf.index(genpoly[0]) + root);
            root += prim;
        }
        let genpoly = genpoly.iter().map(|g| gf.index(*g)).collect();

        Ok(ReedSolomon {
            gf,
            genpoly,
            fcr,
            prim,
            iprim,
            nroots,
            pad,
        })
    }

    /// Number of parity symbols.
    #[must_use]
    pub fn nroots(&self) -> usize {
        self.nroots
    }

    #[must_use]
    pub fn pad(&self) -> usize {
        self.pad
    }

    /// Length of a (shortened) codeword, data plus parity.
    #[must_use]
    pub fn codeword_len(&self) -> usize {
        self.gf.nn() - self.pad
    }

    /// Number of data symbols in a codeword.
    #[must_use]
    pub fn data_len(&self) -> usize {
        self.codeword_len() - self.nroots
    }

    #[must_use]
    pub fn field(&self) -> &GaloisField {
        &self.gf
    }

    /// Generator polynomial coefficients in polynomial form, lowest order first.
    #[must_use]
    pub fn generator(&self) -> Vec<u8> {
        self.genpoly.iter().map(|g| self.gf.alpha(*g)).collect()
    }

    /// Compute the parity symbols for `data`.
    ///
    /// `data` may either be just the data symbols or a full codeword, in which case the
    /// trailing parity symbols are ignored.
    ///
    /// # Errors
    /// [Error::CodewordLength] if `data` is neither [Self::data_len] nor
    /// [Self::codeword_len] symbols long.
    pub fn encode(&self, data: &[u8]) -> Result<Vec<u8>> {
        let data_len = self.data_len();
        if data.len() != data_len && data.len() != self.codeword_len() {
            return Err(Error::CodewordLength {
                actual: data.len(),
                expected: data_len,
            });
        }
        let gf = &self.gf;
        let a0 = gf.a0();
        let nroots = self.nroots;
        let mut parity = vec![0u8; nroots];
        if nroots == 0 {
            return Ok(parity);
        }

        for sym in &data[..data_len] {
            let feedback = gf.index(sym ^ parity[0]);
            if feedback != a0 {
                for j in 1..nroots {
                    let g = self.genpoly[nroots - j];
                    if g != a0 {
                        parity[j] ^= gf.pow(feedback + g);
                    }
                }
            }
            parity.copy_within(1.., 0);
            parity[nroots - 1] = if feedback == a0 || self.genpoly[0] == a0 {
                0
            } else {
                gf.pow(feedback + self.genpoly[0])
            };
        }

        Ok(parity)
    }

    /// Evaluate the codeword at each root of the generator, polynomial form.
    fn syndromes(&self, codeword: &[u8]) -> Vec<u8> {
        let gf = &self.gf;
        let mut synd = vec![codeword[0]; self.nroots];
        for sym in &codeword[1..] {
            for (i, s) in synd.iter_mut().enumerate() {
                *s = if *s == 0 {
                    *sym
                } else {
                    sym ^ gf.pow(gf.index(*s) + (self.fcr + i) * self.prim)
                };
            }
        }
        synd
    }

    /// Return `true` if `codeword` is not a valid codeword.
    ///
    /// # Errors
    /// [Error::CodewordLength] if `codeword` is not [Self::codeword_len] long.
    pub fn has_errors(&self, codeword: &[u8]) -> Result<bool> {
        self.check_len(codeword)?;
        Ok(self.syndromes(codeword).iter().any(|s| *s != 0))
    }

    fn check_len(&self, codeword: &[u8]) -> Result<()> {
        if codeword.len() != self.codeword_len() {
            return Err(Error::CodewordLength {
                actual: codeword.len(),
                expected: self.codeword_len(),
            });
        }
        Ok(())
    }

    fn check_erasures(&self, erasures: &[usize]) -> Result<()> {
        if erasures.len() > self.nroots {
            return Err(Error::Erasures(format!(
                "{} erasures exceeds the {} parity symbols",
                erasures.len(),
                self.nroots
            )));
        }
        if let Some(pos) = erasures.iter().find(|p| **p >= self.codeword_len()) {
            return Err(Error::Erasures(format!(
                "position {pos} is outside codeword of length {}",
                self.codeword_len()
            )));
        }
        let mut sorted = erasures.to_vec();
        sorted.sort_unstable();
        if sorted.windows(2).any(|w| w[0] == w[1]) {
            return Err(Error::Erasures("duplicate erasure positions".to_string()));
        }
        Ok(())
    }

    /// Decode `codeword`, correcting errors and `erasures`.
    ///
    /// `erasures` are positions within `codeword` known to be in error. Up to `nroots`
    /// erasures, or `nroots / 2` unknown errors, or any mix where
    /// `2 * errors + erasures <= nroots`, can be corrected.
    ///
    /// Corrections that fall within the shortening pad are not applied.
    ///
    /// # Errors
    /// [Error::CodewordLength] if `codeword` is not [Self::codeword_len] long, and
    /// [Error::Erasures] if there are more erasures than parity symbols, or any erasure is
    /// out of range or repeated.
    pub fn decode(&self, codeword: &[u8], erasures: &[usize]) -> Result<Block> {
        self.check_len(codeword)?;
        self.check_erasures(erasures)?;

        let gf = &self.gf;
        let nn = gf.nn();
        let a0 = gf.a0();
        let nroots = self.nroots;
        let pad = self.pad;
        let mut data = codeword.to_vec();

        let synd = self.syndromes(&data);
        if synd.iter().all(|s| *s == 0) {
            return Ok(Block {
                state: RSState::Ok,
                data,
            });
        }
        // index form from here on
        let synd: Vec<usize> = synd.iter().map(|s| gf.index(*s)).collect();

        // Initialize lambda to the erasure locator polynomial
        let no_eras = erasures.len();
        let mut lambda = vec![0u8; nroots + 1];
        lambda[0] = 1;
        if let Some(first) = erasures.first() {
            lambda[1] = gf.pow(self.prim * (nn - 1 - (first + pad)));
            for (i, pos) in erasures.iter().enumerate().skip(1) {
                let u = gf.modnn(self.prim * (nn - 1 - (pos + pad)));
                for j in (1..=i + 1).rev() {
                    let tmp = gf.index(lambda[j - 1]);
                    if tmp != a0 {
                        lambda[j] ^= gf.pow(u + tmp);
                    }
                }
            }
        }

        // Berlekamp-Massey
        let mut b: Vec<usize> = lambda.iter().map(|x| gf.index(*x)).collect();
        let mut t = vec![0u8; nroots + 1];
        let mut el = no_eras;
        for r in (no_eras + 1)..=nroots {
            let mut discr_r = 0u8;
            for i in 0..r {
                if lambda[i] != 0 && synd[r - i - 1] != a0 {
                    discr_r ^= gf.pow(gf.index(lambda[i]) + synd[r - i - 1]);
                }
            }
            let discr_r = gf.index(discr_r);
            if discr_r == a0 {
                // B(x) <- x*B(x)
                b.copy_within(..nroots, 1);
                b[0] = a0;
                continue;
            }
            // T(x) <- lambda(x) - discr_r*x*B(x)
            t[0] = lambda[0];
            for i in 0..nroots {
                t[i + 1] = if b[i] == a0 {
                    lambda[i + 1]
                } else {
                    lambda[i + 1] ^ gf.pow(discr_r + b[i])
                };
            }
            if 2 * el <= r + no_eras - 1 {
                el = r + no_eras - el;
                // B(x) <- inv(discr_r) * lambda(x)
                for (bi, li) in b.iter_mut().zip(&lambda) {
                    *bi = if *li == 0 {
                        a0
                    } else {
                        gf.modnn(gf.index(*li) + nn - discr_r)
                    };
                }
            } else {
                b.copy_within(..nroots, 1);
                b[0] = a0;
            }
            lambda.copy_from_slice(&t);
        }

        let lambda: Vec<usize> = lambda.iter().map(|x| gf.index(*x)).collect();
        let deg_lambda = lambda.iter().rposition(|x| *x != a0).unwrap_or(0);
        if deg_lambda == 0 {
            return Ok(Block {
                state: RSState::Uncorrectable("error locator has no roots".to_string()),
                data,
            });
        }

        // Chien search for the roots of lambda
        let mut reg = lambda.clone();
        let mut roots: Vec<usize> = Vec::with_capacity(deg_lambda);
        let mut locs: Vec<usize> = Vec::with_capacity(deg_lambda);
        let mut k = self.iprim - 1;
        for i in 1..=nn {
            let mut q = 1u8;
            for j in (1..=deg_lambda).rev() {
                if reg[j] != a0 {
                    reg[j] = gf.modnn(reg[j] + j);
                    q ^= gf.alpha(reg[j]);
                }
            }
            if q == 0 {
                roots.push(i);
                locs.push(k);
                if roots.len() == deg_lambda {
                    break;
                }
            }
            k = gf.modnn(k + self.iprim);
        }
        if roots.len() != deg_lambda {
            return Ok(Block {
                state: RSState::Uncorrectable(format!(
                    "found {} roots for error locator of degree {deg_lambda}",
                    roots.len()
                )),
                data,
            });
        }

        // Error evaluator omega(x) = s(x)*lambda(x) mod x^nroots, index form
        let deg_omega = deg_lambda - 1;
        let mut omega = vec![a0; nroots + 1];
        for (i, o) in omega.iter_mut().enumerate().take(deg_omega + 1) {
            let mut tmp = 0u8;
            for j in (0..=i).rev() {
                if synd[i - j] != a0 && lambda[j] != a0 {
                    tmp ^= gf.pow(synd[i - j] + lambda[j]);
                }
            }
            *o = gf.index(tmp);
        }

        // Forney: num1 = omega(inv(X(l))), num2 = inv(X(l))^(fcr-1),
        // den = lambda_pr(inv(X(l)))
        let mut corrections: Vec<(usize, u8)> = Vec::with_capacity(roots.len());
        for (root, loc) in roots.iter().zip(&locs).rev() {
            let mut num1 = 0u8;
            for (i, o) in omega.iter().enumerate().take(deg_omega + 1).rev() {
                if *o != a0 {
                    num1 ^= gf.pow(o + i * root);
                }
            }
            let num2 = if self.fcr == 0 {
                gf.pow(nn - root)
            } else {
                gf.pow(root * (self.fcr - 1) + nn)
            };
            // lambda[i+1] for even i is the formal derivative of lambda
            let mut den = 0u8;
            for i in (0..=(deg_lambda.min(nroots - 1) & !1)).rev().step_by(2) {
                if lambda[i + 1] != a0 {
                    den ^= gf.pow(lambda[i + 1] + i * root);
                }
            }
            if den == 0 {
                return Ok(Block {
                    state: RSState::Uncorrectable("zero error locator derivative".to_string()),
                    data,
                });
            }
            if num1 == 0 {
                continue;
            }
            if *loc < pad {
                trace!(loc, pad, "skipping correction inside shortening pad");
                continue;
            }
            let value = gf.pow(gf.index(num1) + gf.index(num2) + nn - gf.index(den));
            corrections.push((loc - pad, value));
        }

        let mut positions = Vec::with_capacity(corrections.len());
        for (pos, value) in corrections {
            data[pos] ^= value;
            positions.push(pos);
        }
        positions.sort_unstable();

        Ok(Block {
            state: RSState::Corrected(positions),
            data,
        })
    }
}
