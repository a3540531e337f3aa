/// BT.601 luma weights in 14-bit fixed point (0.299, 0.587, 0.114).
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

/// Convertit RGB [0,255] → luma BT.601, arrondi au plus proche.
///
/// Weights sum to exactly `1 << 14`, so grey inputs map to themselves.
///
/// # Example
/// ```
/// use cg_core::color::luma;
/// assert_eq!(luma(0, 0, 0), 0);
/// assert_eq!(luma(255, 255, 255), 255);
/// assert_eq!(luma(128, 128, 128), 128);
/// ```
#[inline(always)]
#[must_use]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let sum = u32::from(r) * LUMA_R + u32::from(g) * LUMA_G + u32::from(b) * LUMA_B;
    ((sum + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8
}

/// Parse `#rrggbb` (leading `#` optional) into an RGB triple.
///
/// # Example
/// ```
/// use cg_core::color::parse_hex;
/// assert_eq!(parse_hex("#216e39"), Some((0x21, 0x6e, 0x39)));
/// assert_eq!(parse_hex("nope"), None);
/// ```
#[must_use]
pub fn parse_hex(s: &str) -> Option<(u8, u8, u8)> {
    let s = s.strip_prefix('#').unwrap_or(s);
    if s.len() != 6 || !s.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&s[0..2], 16).ok()?;
    let g = u8::from_str_radix(&s[2..4], 16).ok()?;
    let b = u8::from_str_radix(&s[4..6], 16).ok()?;
    Some((r, g, b))
}
