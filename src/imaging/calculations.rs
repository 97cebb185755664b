//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Dimensions of an image scaled to fit inside a bounding box.
///
/// Aspect ratio is preserved and images are never enlarged: a source that
/// already fits is returned unchanged. Each edge is at least 1 pixel.
///
/// # Examples
/// ```
/// # use makerfolio::imaging::fit_within;
/// // 800x600 into 200x200 → 200x150
/// assert_eq!(fit_within((800, 600), (200, 200)), (200, 150));
///
/// // Already small enough: untouched
/// assert_eq!(fit_within((120, 90), (200, 200)), (120, 90));
/// ```
pub fn fit_within(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;

    if src_w <= max_w && src_h <= max_h {
        return source;
    }

    let scale = f64::min(max_w as f64 / src_w as f64, max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, max_w);
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, max_h);
    (w, h)
}
