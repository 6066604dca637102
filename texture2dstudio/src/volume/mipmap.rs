//! Box-filter mip level generation.

use super::CHANNELS;

/// Dimensions of the next mip level: `floor(dim / 2)`, minimum 1.
///
/// # Example
///
/// ```
/// use texture2dstudio::volume::next_level_dims;
///
/// assert_eq!(next_level_dims(16, 16), (8, 8));
/// assert_eq!(next_level_dims(5, 1), (2, 1));
/// ```
pub fn next_level_dims(width: u32, height: u32) -> (u32, u32) {
    ((width / 2).max(1), (height / 2).max(1))
}

/// Downsample one RGBA8 layer with a 2×2 box filter.
///
/// Source coordinates are clamped at the edges, so a 1-texel axis averages
/// the texel with itself.
pub(super) fn box_filter_rgba8(src: &[u8], width: u32, height: u32) -> Vec<u8> {
    let (dst_w, dst_h) = next_level_dims(width, height);
    let (w, h) = (width as usize, height as usize);
    let mut dst = vec![0u8; dst_w as usize * dst_h as usize * CHANNELS];

    for y in 0..dst_h as usize {
        let y0 = (2 * y).min(h - 1);
        let y1 = (2 * y + 1).min(h - 1);
        for x in 0..dst_w as usize {
            let x0 = (2 * x).min(w - 1);
            let x1 = (2 * x + 1).min(w - 1);
            let out = (y * dst_w as usize + x) * CHANNELS;
            for c in 0..CHANNELS {
                let sum = src[(y0 * w + x0) * CHANNELS + c] as u32
                    + src[(y0 * w + x1) * CHANNELS + c] as u32
                    + src[(y1 * w + x0) * CHANNELS + c] as u32
                    + src[(y1 * w + x1) * CHANNELS + c] as u32;
                dst[out + c] = ((sum + 2) / 4) as u8;
            }
        }
    }

    dst
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_level_dims_chain() {
        let mut dims = (16, 16);
        let mut chain = vec![dims];
        while dims != (1, 1) {
            dims = next_level_dims(dims.0, dims.1);
            chain.push(dims);
        }
        assert_eq!(chain, vec![(16, 16), (8, 8), (4, 4), (2, 2), (1, 1)]);
    }

    #[test]
    fn test_next_level_dims_non_square() {
        assert_eq!(next_level_dims(8, 2), (4, 1));
        assert_eq!(next_level_dims(4, 1), (2, 1));
        assert_eq!(next_level_dims(1, 1), (1, 1));
    }

    #[test]
    fn test_box_filter_averages_quad() {
        // 2×2 texels with red 0, 100, 200, 255
        let src = vec![
            0, 0, 0, 255, 100, 0, 0, 255, //
            200, 0, 0, 255, 255, 0, 0, 255,
        ];
        let dst = box_filter_rgba8(&src, 2, 2);
        assert_eq!(dst, vec![139, 0, 0, 255]);
    }

    #[test]
    fn test_box_filter_single_row() {
        let src = vec![10, 10, 10, 10, 30, 30, 30, 30];
        let dst = box_filter_rgba8(&src, 2, 1);
        assert_eq!(dst, vec![20, 20, 20, 20]);
    }
}
