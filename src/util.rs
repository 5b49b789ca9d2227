use eframe::egui::{Vec2, vec2};

/// 32-bit rolling string hash (`h = h * 31 + c`, wrapping).
pub fn hash_code(value: &str) -> i32 {
    value.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}

pub fn stable_pair(id: &str) -> (f32, f32) {
    let hash = hash_code(id) as u32;
    let mixed = u64::from(hash).wrapping_mul(0x9e37_79b9_7f4a_7c15);

    let x = ((mixed & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((mixed >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

/// Unit vector derived from an identifier, used to split coincident nodes.
pub fn stable_direction(id: &str, salt: usize) -> Vec2 {
    let (jx, jy) = stable_pair(id);
    let direction = vec2(jx, jy);
    if direction.length_sq() > 0.0001 {
        return direction.normalized();
    }

    let angle = ((salt as f32) * 0.618_034 + 0.11) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_owned();
    }

    let mut shortened = label
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    shortened.push('…');
    shortened
}
