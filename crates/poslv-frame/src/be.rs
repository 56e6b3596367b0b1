//! Big-endian field extraction at fixed byte offsets.
//!
//! Every function returns `None` when `buf` is too short for the value at
//! `offset`; callers turn that into their own length error.

#[inline]
fn array_at<const N: usize>(buf: &[u8], offset: usize) -> Option<[u8; N]> {
    let end = offset.checked_add(N)?;
    buf.get(offset..end)?.try_into().ok()
}

/// Read one byte.
#[inline]
pub fn u8_at(buf: &[u8], offset: usize) -> Option<u8> {
    buf.get(offset).copied()
}

/// Read a big-endian `u16`.
#[inline]
pub fn u16_at(buf: &[u8], offset: usize) -> Option<u16> {
    array_at(buf, offset).map(u16::from_be_bytes)
}

/// Read a big-endian `u32`.
#[inline]
pub fn u32_at(buf: &[u8], offset: usize) -> Option<u32> {
    array_at(buf, offset).map(u32::from_be_bytes)
}

/// Read a big-endian IEEE-754 single.
#[inline]
pub fn f32_at(buf: &[u8], offset: usize) -> Option<f32> {
    array_at(buf, offset).map(f32::from_be_bytes)
}

/// Read a big-endian IEEE-754 double.
#[inline]
pub fn f64_at(buf: &[u8], offset: usize) -> Option<f64> {
    array_at(buf, offset).map(f64::from_be_bytes)
}
