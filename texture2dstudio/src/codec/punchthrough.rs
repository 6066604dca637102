//! ETC2 punch-through alpha (RGB8A1) block encoding.
//!
//! Blocks are always written in differential mode. When any texel of the
//! block is transparent the opaque bit is cleared, which changes the index
//! meaning:
//!
//! | index | opaque bit set | opaque bit clear |
//! |-------|----------------|------------------|
//! | 0b00  | `+a`           | `0`              |
//! | 0b01  | `+b`           | `+b`             |
//! | 0b10  | `-a`           | transparent      |
//! | 0b11  | `-b`           | `-b`             |
//!
//! where `(a, b)` is the sub-block's modifier pair.

/// ETC1 intensity modifier pairs.
const MODIFIERS: [[i32; 2]; 8] = [
    [2, 8],
    [5, 17],
    [9, 29],
    [13, 42],
    [18, 60],
    [24, 80],
    [33, 106],
    [47, 183],
];

/// Texels with alpha below this threshold are encoded as transparent.
pub(crate) const ALPHA_THRESHOLD: u8 = 128;

const TRANSPARENT_INDEX: u8 = 0b10;

#[derive(Clone, Copy)]
struct SubBlock {
    error: u32,
    table: u8,
}

#[derive(Clone, Copy)]
struct Encoding {
    error: u32,
    flip: bool,
    base: [[u8; 3]; 2],
    tables: [u8; 2],
    indices: [u8; 16],
}

/// Encode 16 RGBA texels (row-major, `y * 4 + x`) into one RGB8A1 block.
///
/// At effort 50 and above, midrange base colors are tried alongside the
/// sub-block means.
pub(crate) fn encode_block(texels: &[[u8; 4]; 16], effort: u32) -> [u8; 8] {
    let transparent: [bool; 16] = std::array::from_fn(|i| texels[i][3] < ALPHA_THRESHOLD);
    let opaque = !transparent.iter().any(|&t| t);

    let mut best: Option<Encoding> = None;
    for flip in [false, true] {
        let candidates = base_candidates(texels, &transparent, flip, effort >= 50);
        for base in candidates {
            let encoding = encode_with_base(texels, &transparent, opaque, flip, base);
            if best.map_or(true, |b| encoding.error < b.error) {
                best = Some(encoding);
            }
        }
    }

    match best {
        Some(encoding) => pack(&encoding, opaque),
        None => [0; 8],
    }
}

fn in_first_sub_block(i: usize, flip: bool) -> bool {
    let (x, y) = (i % 4, i / 4);
    if flip {
        y < 2
    } else {
        x < 2
    }
}

/// Quantized (5-bit, differential-safe) base colors for both sub-blocks.
fn base_candidates(
    texels: &[[u8; 4]; 16],
    transparent: &[bool; 16],
    flip: bool,
    midrange: bool,
) -> Vec<[[u8; 3]; 2]> {
    let mut stats = [[(0u32, 255u8, 0u8); 3]; 2];
    let mut counts = [0u32; 2];

    for (i, texel) in texels.iter().enumerate() {
        if transparent[i] {
            continue;
        }
        let s = usize::from(!in_first_sub_block(i, flip));
        counts[s] += 1;
        for c in 0..3 {
            let (sum, lo, hi) = &mut stats[s][c];
            *sum += texel[c] as u32;
            *lo = (*lo).min(texel[c]);
            *hi = (*hi).max(texel[c]);
        }
    }

    let mean = |s: usize| -> [u8; 3] {
        if counts[s] == 0 {
            return [0; 3];
        }
        std::array::from_fn(|c| ((stats[s][c].0 + counts[s] / 2) / counts[s]) as u8)
    };
    let mid = |s: usize| -> [u8; 3] {
        if counts[s] == 0 {
            return [0; 3];
        }
        std::array::from_fn(|c| ((stats[s][c].1 as u32 + stats[s][c].2 as u32 + 1) / 2) as u8)
    };

    // An empty sub-block borrows its neighbor's color so the delta stays small
    let fill = |colors: [[u8; 3]; 2]| -> [[u8; 3]; 2] {
        match (counts[0], counts[1]) {
            (0, _) => [colors[1], colors[1]],
            (_, 0) => [colors[0], colors[0]],
            _ => colors,
        }
    };

    let mut candidates = vec![quantize_pair(fill([mean(0), mean(1)]))];
    if midrange {
        candidates.push(quantize_pair(fill([mid(0), mid(1)])));
        candidates.push(quantize_pair(fill([mean(0), mid(1)])));
        candidates.push(quantize_pair(fill([mid(0), mean(1)])));
    }
    candidates
}

/// Quantize two colors to 5 bits, pulling the second within the 3-bit delta.
fn quantize_pair(colors: [[u8; 3]; 2]) -> [[u8; 3]; 2] {
    let first: [u8; 3] = std::array::from_fn(|c| quantize5(colors[0][c]));
    let second: [u8; 3] = std::array::from_fn(|c| {
        let target = quantize5(colors[1][c]) as i32;
        let delta = (target - first[c] as i32).clamp(-4, 3);
        (first[c] as i32 + delta) as u8
    });
    [first, second]
}

fn quantize5(value: u8) -> u8 {
    ((value as u32 * 31 + 127) / 255) as u8
}

fn expand5(value: u8) -> i32 {
    ((value << 3) | (value >> 2)) as i32
}

fn encode_with_base(
    texels: &[[u8; 4]; 16],
    transparent: &[bool; 16],
    opaque: bool,
    flip: bool,
    base: [[u8; 3]; 2],
) -> Encoding {
    let mut indices = [0u8; 16];
    let mut tables = [0u8; 2];
    let mut error = 0u32;

    for s in 0..2 {
        let color: [i32; 3] = std::array::from_fn(|c| expand5(base[s][c]));
        let members: Vec<usize> = (0..16)
            .filter(|&i| usize::from(!in_first_sub_block(i, flip)) == s)
            .collect();

        let mut best = SubBlock {
            error: u32::MAX,
            table: 0,
        };
        let mut best_indices = [0u8; 16];
        for (table, pair) in MODIFIERS.iter().enumerate() {
            let mut sub_error = 0u32;
            let mut sub_indices = [0u8; 16];
            for &i in &members {
                if transparent[i] {
                    sub_indices[i] = TRANSPARENT_INDEX;
                    continue;
                }
                let (e, index) = best_index(&texels[i], &color, pair, opaque);
                sub_error += e;
                sub_indices[i] = index;
            }
            if sub_error < best.error {
                best = SubBlock {
                    error: sub_error,
                    table: table as u8,
                };
                best_indices = sub_indices;
            }
        }

        tables[s] = best.table;
        error += best.error;
        for &i in &members {
            indices[i] = best_indices[i];
        }
    }

    Encoding {
        error,
        flip,
        base,
        tables,
        indices,
    }
}

fn best_index(texel: &[u8; 4], color: &[i32; 3], pair: &[i32; 2], opaque: bool) -> (u32, u8) {
    let [a, b] = *pair;
    let opaque_options = [(0b00, a), (0b01, b), (0b10, -a), (0b11, -b)];
    let masked_options = [(0b00, 0), (0b01, b), (0b11, -b)];
    let options: &[(u8, i32)] = if opaque {
        &opaque_options
    } else {
        &masked_options
    };

    let mut best = (u32::MAX, 0u8);
    for &(index, modifier) in options {
        let e: u32 = (0..3)
            .map(|c| {
                let value = (color[c] + modifier).clamp(0, 255);
                let d = (value - texel[c] as i32).unsigned_abs();
                d * d
            })
            .sum();
        if e < best.0 {
            best = (e, index);
        }
    }
    best
}

fn pack(encoding: &Encoding, opaque: bool) -> [u8; 8] {
    let [first, second] = encoding.base;
    let mut word = 0u64;

    for (c, shift) in [59u32, 51, 43].into_iter().enumerate() {
        let delta = (second[c] as i32 - first[c] as i32) as u64 & 0x7;
        word |= (first[c] as u64 & 0x1F) << shift;
        word |= delta << (shift - 3);
    }
    word |= (encoding.tables[0] as u64 & 0x7) << 37;
    word |= (encoding.tables[1] as u64 & 0x7) << 34;
    word |= (opaque as u64) << 33;
    word |= (encoding.flip as u64) << 32;

    for y in 0..4 {
        for x in 0..4 {
            let slot = x * 4 + y;
            let index = encoding.indices[y * 4 + x] as u64;
            word |= ((index >> 1) & 1) << (16 + slot);
            word |= (index & 1) << slot;
        }
    }
    word.to_be_bytes()
}
