// Property tests for the pointer classifier.
//
// The contract: a pure, total partition of all leading byte pairs into
// text, live nodes, freed nodes, and the end signal — with no byte that
// could begin well-formed UTF-8 ever reading as node memory.

use proptest::prelude::*;
use quill::{classify, classify_slice, verify_byte_invariants, PointerClass};

/// Exhaustive: every (b0, b1) pair maps to exactly one class, and the
/// node-range second-byte rule behaves.
#[test]
fn classify_is_total_and_single_valued() {
    for b0 in 0u8..=0xFF {
        for b1 in [0u8, 1, 0x42, 0x80, 0xFF] {
            let class = classify(b0, b1);
            // One of the six, always; the match itself proves totality,
            // this records the partition's shape.
            match class {
                PointerClass::Utf8 => {
                    assert!(b0 < 0x80 || b0 >= 0xC2, "byte {:#04x} is reserved", b0)
                }
                PointerClass::Cell | PointerClass::Stub => {
                    assert!((0x80..=0xBF).contains(&b0));
                    assert_ne!(b1, 0, "end signal misread as live node");
                }
                PointerClass::End => {
                    assert!((0x80..=0xBF).contains(&b0));
                    assert_eq!(b1, 0);
                }
                PointerClass::FreedStub => assert_eq!(b0, 0xC0),
                PointerClass::FreedCell => assert_eq!(b0, 0xC1),
            }
        }
    }
}

/// All 128 ASCII values classify as text.
#[test]
fn ascii_always_classifies_as_text() {
    for b0 in 0u8..=0x7F {
        for b1 in 0u8..=0xFF {
            assert_eq!(classify(b0, b1), PointerClass::Utf8);
        }
    }
}

/// No byte that can legally begin UTF-8 text collides with node memory,
/// and no live or freed node byte can begin UTF-8 text. `valid_up_to() ==
/// 0` pins the rejection to position zero rather than a later byte.
#[test]
fn node_bytes_and_utf8_starts_are_exclusive() {
    for b0 in 0u8..=0xFF {
        let class = classify(b0, 1);
        let is_node_class = !matches!(class, PointerClass::Utf8);

        let starts_text = match std::str::from_utf8(&[b0, 0x80, 0x80, 0x80]) {
            Ok(_) => true,
            Err(e) => e.valid_up_to() > 0,
        } || b0 < 0x80;

        assert!(
            !(is_node_class && starts_text),
            "byte {:#04x} is both node memory and a UTF-8 start",
            b0
        );
    }
}

/// The startup verifier agrees with all of the above.
#[test]
fn startup_verifier_passes() {
    verify_byte_invariants();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // Real strings always classify as text from their leading bytes.
    #[test]
    fn strings_classify_as_text(s in ".{1,64}") {
        prop_assert_eq!(classify_slice(s.as_bytes()), PointerClass::Utf8);
    }

    // The second byte is irrelevant outside the node range.
    #[test]
    fn second_byte_ignored_for_text(b0 in 0u8..=0x7F, b1 in any::<u8>(), b2 in any::<u8>()) {
        prop_assert_eq!(classify(b0, b1), classify(b0, b2));
    }
}
