// Brightness scale conversion.
//
// The controller reports brightness as 0-100; host entities use 0-255.
// Both directions round half away from zero in integer arithmetic, so a
// value survives a 100 -> 255 -> 100 trip exactly and a 255 -> 100 -> 255
// trip within 1.

/// Convert a controller brightness (0-100) to the host scale (0-255).
///
/// Inputs above 100 are clamped.
pub fn to_255(value: u8) -> u8 {
    let clamped = u32::from(value.min(100));
    // round(x * 255 / 100), ties away from zero
    let scaled = (clamped * 510 + 100) / 200;
    u8::try_from(scaled).unwrap_or(u8::MAX)
}

/// Convert a host brightness (0-255) to the controller scale (0-100).
pub fn to_100(value: u8) -> u8 {
    // round(b * 100 / 255), ties away from zero
    let scaled = (u32::from(value) * 200 + 255) / 510;
    u8::try_from(scaled).unwrap_or(100).min(100)
}
