//! EAC alpha block encoding for ETC2 RGBA8.
//!
//! An alpha block is 64 bits, big-endian:
//!
//! ```text
//! 63      56 55  52 51  48 47                                 0
//! ┌─────────┬──────┬──────┬────────────────────────────────────┐
//! │  base   │ mult │ table│ 16 × 3-bit indices (column-major)  │
//! └─────────┴──────┴──────┴────────────────────────────────────┘
//! ```
//!
//! Texel `(x, y)` uses index slot `x * 4 + y`; slot 0 occupies bits 47..45.
//! A texel decodes to `clamp(base + modifier[table][index] * mult, 0, 255)`.

/// EAC modifier tables.
pub(crate) const EAC_MODIFIERS: [[i32; 8]; 16] = [
    [-3, -6, -9, -15, 2, 5, 8, 14],
    [-3, -7, -10, -13, 2, 6, 9, 12],
    [-2, -5, -8, -13, 1, 4, 7, 12],
    [-2, -4, -6, -13, 1, 3, 5, 12],
    [-3, -6, -8, -12, 2, 5, 7, 11],
    [-3, -7, -9, -11, 2, 6, 8, 10],
    [-4, -7, -8, -11, 3, 6, 7, 10],
    [-3, -5, -8, -11, 2, 4, 7, 10],
    [-2, -6, -8, -10, 1, 5, 7, 9],
    [-2, -5, -8, -10, 1, 4, 7, 9],
    [-2, -4, -8, -10, 1, 3, 7, 9],
    [-2, -5, -7, -10, 1, 4, 6, 9],
    [-3, -4, -7, -10, 2, 3, 6, 9],
    [-1, -2, -3, -10, 0, 1, 2, 9],
    [-4, -6, -8, -9, 3, 5, 7, 8],
    [-3, -5, -7, -9, 2, 4, 6, 8],
];

/// Table 13 holds a zero modifier at index 4.
const FLAT_TABLE: usize = 13;
const FLAT_INDEX: u8 = 4;

#[derive(Clone, Copy)]
struct Candidate {
    error: u32,
    base: u8,
    mult: u8,
    table: u8,
    indices: [u8; 16],
}

/// Encode 16 alpha values (row-major, `y * 4 + x`) into one EAC block.
///
/// Higher `effort` widens the multiplier and base search around the
/// estimate derived from the alpha range.
pub(crate) fn encode_alpha_block(alpha: &[u8; 16], effort: u32) -> [u8; 8] {
    let min = *alpha.iter().min().unwrap_or(&0) as i32;
    let max = *alpha.iter().max().unwrap_or(&0) as i32;

    if min == max {
        return pack(min as u8, 1, FLAT_TABLE as u8, &[FLAT_INDEX; 16]);
    }

    let radius: i32 = match effort {
        0..=19 => 0,
        20..=59 => 1,
        _ => 2,
    };

    let mut best = Candidate {
        error: u32::MAX,
        base: 0,
        mult: 1,
        table: 0,
        indices: [0; 16],
    };

    for (table, modifiers) in EAC_MODIFIERS.iter().enumerate() {
        let lo = modifiers.iter().copied().min().unwrap_or(0);
        let hi = modifiers.iter().copied().max().unwrap_or(0);
        let span = hi - lo;
        let estimate = (((max - min) as f32 / span as f32).round() as i32).clamp(1, 15);

        for mult in (estimate - radius).max(1)..=(estimate + radius).min(15) {
            let center = (min + max) / 2 - (lo + hi) * mult / 2;
            for base in (center - radius - 1).max(0)..=(center + radius + 1).min(255) {
                try_candidate(alpha, modifiers, base, mult, table, &mut best);
            }
        }
    }

    pack(best.base, best.mult, best.table, &best.indices)
}

fn try_candidate(
    alpha: &[u8; 16],
    modifiers: &[i32; 8],
    base: i32,
    mult: i32,
    table: usize,
    best: &mut Candidate,
) {
    let mut error = 0u32;
    let mut indices = [0u8; 16];

    for (i, &a) in alpha.iter().enumerate() {
        let mut texel_best = (u32::MAX, 0u8);
        for (index, m) in modifiers.iter().enumerate() {
            let value = (base + m * mult).clamp(0, 255);
            let diff = (value - a as i32).unsigned_abs();
            let e = diff * diff;
            if e < texel_best.0 {
                texel_best = (e, index as u8);
            }
        }
        error += texel_best.0;
        if error >= best.error {
            return;
        }
        indices[i] = texel_best.1;
    }

    *best = Candidate {
        error,
        base: base as u8,
        mult: mult as u8,
        table: table as u8,
        indices,
    };
}

/// Pack an alpha block. `indices` are row-major like the input texels.
fn pack(base: u8, mult: u8, table: u8, indices: &[u8; 16]) -> [u8; 8] {
    let mut word = (base as u64) << 56 | (mult as u64 & 0xF) << 52 | (table as u64 & 0xF) << 48;
    for y in 0..4 {
        for x in 0..4 {
            let slot = x * 4 + y;
            word |= (indices[y * 4 + x] as u64 & 0x7) << (45 - 3 * slot);
        }
    }
    word.to_be_bytes()
}

/// Decode one EAC block to row-major alpha values.
#[cfg(test)]
pub(crate) fn decode_alpha_block(block: &[u8; 8]) -> [u8; 16] {
    let word = u64::from_be_bytes(*block);
    let base = (word >> 56) as i32;
    let mult = ((word >> 52) & 0xF) as i32;
    let table = ((word >> 48) & 0xF) as usize;

    let mut alpha = [0u8; 16];
    for y in 0..4 {
        for x in 0..4 {
            let slot = x * 4 + y;
            let index = ((word >> (45 - 3 * slot)) & 0x7) as usize;
            alpha[y * 4 + x] = (base + EAC_MODIFIERS[table][index] * mult).clamp(0, 255) as u8;
        }
    }
    alpha
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn max_error(a: &[u8; 16], b: &[u8; 16]) -> u8 {
        a.iter().zip(b).map(|(x, y)| x.abs_diff(*y)).max().unwrap()
    }

    #[test]
    fn test_flat_alpha_is_exact() {
        for value in [0u8, 1, 128, 254, 255] {
            let block = encode_alpha_block(&[value; 16], 0);
            assert_eq!(decode_alpha_block(&block), [value; 16]);
        }
    }

    #[test]
    fn test_flat_alpha_layout() {
        let block = encode_alpha_block(&[200; 16], 0);
        // base 200, mult 1, table 13, every index 4 (0b100)
        assert_eq!(block[0], 200);
        assert_eq!(block[1], 0x1D);
        assert_eq!(&block[2..], &[0x92, 0x49, 0x24, 0x92, 0x49, 0x24]);
    }

    #[test]
    fn test_two_level_alpha() {
        let mut alpha = [0u8; 16];
        for (i, a) in alpha.iter_mut().enumerate() {
            *a = if i % 2 == 0 { 0 } else { 255 };
        }
        let decoded = decode_alpha_block(&encode_alpha_block(&alpha, 0));
        assert!(max_error(&alpha, &decoded) <= 8, "{:?}", decoded);
    }

    #[test]
    fn test_column_major_index_order() {
        // Only texel (1, 0) is opaque
        let mut alpha = [0u8; 16];
        alpha[1] = 255;
        let decoded = decode_alpha_block(&encode_alpha_block(&alpha, 100));
        assert!(decoded[1] > 200);
        assert!(decoded[4] < 50);
    }

    #[test]
    fn test_higher_effort_not_worse() {
        let alpha: [u8; 16] = [
            3, 40, 90, 120, 7, 60, 77, 130, 15, 22, 95, 140, 8, 33, 111, 125,
        ];
        let err = |effort| {
            let decoded = decode_alpha_block(&encode_alpha_block(&alpha, effort));
            alpha
                .iter()
                .zip(decoded.iter())
                .map(|(a, b)| (*a as i32 - *b as i32).pow(2))
                .sum::<i32>()
        };
        assert!(err(100) <= err(0));
    }

    proptest! {
        #[test]
        fn prop_gradient_error_bounded(start in 0u8..=128, step in 0u8..=8) {
            let mut alpha = [0u8; 16];
            for (i, a) in alpha.iter_mut().enumerate() {
                *a = start.saturating_add(step.saturating_mul(i as u8));
            }
            let decoded = decode_alpha_block(&encode_alpha_block(&alpha, 50));
            prop_assert!(max_error(&alpha, &decoded) <= 24);
        }
    }
}
