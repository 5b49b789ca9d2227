use std::f32::consts::PI;

const COUNT_DOMAIN: (f32, f32) = (1.0, 100.0);
const RADIUS_RANGE: (f32, f32) = (4.0, 50.0);
const OPACITY_RANGE: (f32, f32) = (0.3, 1.0);

/// Square-root scale from scan count to radius, clamped to the radius range.
pub fn size_scale(count: u32) -> f32 {
    let (d0, d1) = (COUNT_DOMAIN.0.sqrt(), COUNT_DOMAIN.1.sqrt());
    let t = ((count as f32).sqrt() - d0) / (d1 - d0);
    RADIUS_RANGE.0 + (RADIUS_RANGE.1 - RADIUS_RANGE.0) * t.clamp(0.0, 1.0)
}

pub fn mass_for_radius(radius: f32) -> f32 {
    PI * radius * radius
}

/// Linear scale from `[1, max_weight]` to the opacity range.
///
/// A degenerate domain (every link at weight 1) maps to the middle of the range.
pub fn link_opacity(weight: u32, max_weight: u32) -> f32 {
    let max_weight = max_weight.max(1);
    let t = if max_weight == 1 {
        0.5
    } else {
        (weight as f32 - 1.0) / (max_weight as f32 - 1.0)
    };
    OPACITY_RANGE.0 + (OPACITY_RANGE.1 - OPACITY_RANGE.0) * t
}
