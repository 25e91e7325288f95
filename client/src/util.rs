fn random_u32() -> u32 {
    (js_sys::Math::random() * (u32::MAX as f64 + 1.0)) as u32
}

/// Per-page prefix for element ids, so ids from two tabs never collide in a
/// shared export.
pub fn make_id_prefix() -> String {
    format!("{:08x}", random_u32())
}
