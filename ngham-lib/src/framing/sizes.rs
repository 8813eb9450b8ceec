#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum number of differing bits for a received size tag to match a reference tag.
pub const TAG_TOLERANCE: u32 = 6;

/// Length of the header byte plus the CRC-16 that follow the payload.
pub const OVERHEAD_LEN: usize = 3;

/// One of the fixed packet sizes.
///
/// The size class determines how much payload fits in a packet, the length of the
/// Reed-Solomon codeword and the size tag that announces the codeword on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SizeClass {
    /// Index into [SIZE_CLASSES].
    pub index: usize,
    /// Largest payload, in bytes, carried by this class.
    pub capacity: usize,
    /// Number of Reed-Solomon data bytes; header, payload, CRC and zero padding.
    pub data_len: usize,
    /// Number of Reed-Solomon parity bytes.
    pub parity_len: usize,
    /// 24-bit size tag.
    pub tag: u32,
}

const fn class(index: usize, capacity: usize, parity_len: usize, tag: u32) -> SizeClass {
    SizeClass {
        index,
        capacity,
        data_len: capacity + OVERHEAD_LEN,
        parity_len,
        tag,
    }
}

/// All size classes, smallest first.
pub const SIZE_CLASSES: [SizeClass; 7] = [
    class(0, 28, 16, 0x3B_49CD),
    class(1, 60, 16, 0x4D_DA57),
    class(2, 92, 16, 0x76_939A),
    class(3, 124, 32, 0x9B_B4AE),
    class(4, 156, 32, 0xA0_FD63),
    class(5, 188, 32, 0xD6_6EF9),
    class(6, 220, 32, 0xED_2734),
];

/// Largest payload that can be carried by any size class.
pub const MAX_PAYLOAD_LEN: usize = SIZE_CLASSES[SIZE_CLASSES.len() - 1].capacity;

/// Return `true` if the 24-bit `candidate` is within [TAG_TOLERANCE] bits of `reference`.
#[must_use]
pub fn tag_check(reference: u32, candidate: u32) -> bool {
    ((reference ^ candidate) & 0x00ff_ffff).count_ones() <= TAG_TOLERANCE
}

impl SizeClass {
    /// The first size class whose tag matches `tag`, or `None`.
    #[must_use]
    pub fn from_tag(tag: u32) -> Option<&'static SizeClass> {
        SIZE_CLASSES.iter().find(|c| tag_check(c.tag, tag))
    }

    /// The smallest size class that can carry a payload of `len` bytes, or `None` if
    /// `len` exceeds [MAX_PAYLOAD_LEN].
    #[must_use]
    pub fn for_payload(len: usize) -> Option<&'static SizeClass> {
        SIZE_CLASSES.iter().find(|c| c.capacity >= len)
    }

    /// Reed-Solomon shortening for this class.
    #[must_use]
    pub fn pad(&self) -> usize {
        255 - self.data_len - self.parity_len
    }

    /// Length of the protected, scrambled region; data plus parity.
    #[must_use]
    pub fn codeword_len(&self) -> usize {
        self.data_len + self.parity_len
    }

    /// The size tag as sent on the wire.
    #[must_use]
    pub fn tag_bytes(&self) -> [u8; 3] {
        let [_, a, b, c] = self.tag.to_be_bytes();
        [a, b, c]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn classes_are_consistent() {
        for (i, class) in SIZE_CLASSES.iter().enumerate() {
            assert_eq!(class.index, i);
            assert_eq!(class.codeword_len() + class.pad(), 255);
            assert!(class.tag <= 0xff_ffff);
        }
        assert_eq!(SIZE_CLASSES[0].pad(), 208);
        assert_eq!(SIZE_CLASSES[6].pad(), 0);
        assert_eq!(MAX_PAYLOAD_LEN, 220);
    }

    #[test]
    fn tags_are_far_apart() {
        for a in &SIZE_CLASSES {
            for b in SIZE_CLASSES.iter().filter(|b| b.index != a.index) {
                let dist = (a.tag ^ b.tag).count_ones();
                assert!(dist > 2 * TAG_TOLERANCE, "{a:?} and {b:?} only {dist} apart");
            }
        }
    }

    #[test_case(1, 0)]
    #[test_case(28, 0)]
    #[test_case(29, 1)]
    #[test_case(124, 3)]
    #[test_case(125, 4)]
    #[test_case(220, 6)]
    fn smallest_class_for_payload(len: usize, expected: usize) {
        assert_eq!(SizeClass::for_payload(len).unwrap().index, expected);
    }

    #[test]
    fn payload_too_large_has_no_class() {
        assert!(SizeClass::for_payload(221).is_none());
    }

    #[test]
    fn tag_check_tolerates_six_bits() {
        let reference = 0x3B_49CD;
        assert!(tag_check(reference, reference));
        assert!(tag_check(reference, reference ^ 0x3f));
        assert!(tag_check(reference, reference ^ 0x81_0204));
        assert!(!tag_check(reference, reference ^ 0x7f));
    }

    #[test_case(0x00_007f; "low seven")]
    #[test_case(0x7f_0000; "high seven")]
    #[test_case(0x0f_e000; "middle seven")]
    #[test_case(0x55_5400; "spread seven")]
    fn seven_bit_errors_match_no_class(mask: u32) {
        for class in &SIZE_CLASSES {
            assert_eq!(
                SizeClass::from_tag(class.tag ^ mask),
                None,
                "class {} with mask {mask:#x}",
                class.index
            );
        }
    }

    #[test]
    fn from_tag_with_six_bit_errors() {
        for class in &SIZE_CLASSES {
            let found = SizeClass::from_tag(class.tag ^ 0x84_2109).unwrap();
            assert_eq!(found.index, class.index);
        }
    }

    #[test]
    fn tag_bytes_are_big_endian() {
        assert_eq!(SIZE_CLASSES[0].tag_bytes(), [0x3b, 0x49, 0xcd]);
    }
}
