use crate::foundation::error::{BookError, BookResult};

/// Premultiplied RGBA8 pixel.
pub type PremulRgba8 = [u8; 4];

/// Source-over for premultiplied pixels.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    if src[3] == 0 {
        return dst;
    }
    let inv = 255u16 - u16::from(src[3]);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = add_sat_u8(src[i], mul_div255(u16::from(dst[i]), inv));
    }
    out
}

/// Composite a premultiplied overlay onto straight-alpha RGBA8 pixels, in place.
///
/// The base keeps its own alpha where the overlay is transparent.
pub fn over_straight_in_place(base_rgba: &mut [u8], overlay_premul: &[u8]) -> BookResult<()> {
    if base_rgba.len() != overlay_premul.len() || !base_rgba.len().is_multiple_of(4) {
        return Err(BookError::Other(anyhow::anyhow!(
            "overlay expects equal-length rgba8 buffers ({} vs {})",
            base_rgba.len(),
            overlay_premul.len()
        )));
    }
    for (d, s) in base_rgba
        .chunks_exact_mut(4)
        .zip(overlay_premul.chunks_exact(4))
    {
        if s[3] == 0 {
            continue;
        }
        let dst = premultiply([d[0], d[1], d[2], d[3]]);
        let out = unpremultiply(over(dst, [s[0], s[1], s[2], s[3]]));
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Flatten a straight-alpha RGBA8 pixel onto white, returning RGB8.
pub fn flatten_on_white(px: [u8; 4]) -> [u8; 3] {
    let a = u16::from(px[3]);
    let inv = 255 - a;
    [
        add_sat_u8(mul_div255(u16::from(px[0]), a), inv as u8),
        add_sat_u8(mul_div255(u16::from(px[1]), a), inv as u8),
        add_sat_u8(mul_div255(u16::from(px[2]), a), inv as u8),
    ]
}

fn premultiply(px: [u8; 4]) -> PremulRgba8 {
    let a = u16::from(px[3]);
    if a == 0 {
        return [0, 0, 0, 0];
    }
    [
        mul_div255(u16::from(px[0]), a),
        mul_div255(u16::from(px[1]), a),
        mul_div255(u16::from(px[2]), a),
        px[3],
    ]
}

fn unpremultiply(px: PremulRgba8) -> [u8; 4] {
    let a = u32::from(px[3]);
    if a == 0 {
        return [0, 0, 0, 0];
    }
    let un = |c: u8| ((u32::from(c) * 255 + a / 2) / a).min(255) as u8;
    [un(px[0]), un(px[1]), un(px[2]), px[3]]
}

fn mul_div255(x: u16, y: u16) -> u8 {
    ((u32::from(x) * u32::from(y) + 127) / 255) as u8
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
