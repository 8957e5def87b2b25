//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Scale `original` so its longer edge fits within `max_edge`.
///
/// Aspect ratio is preserved and images are never upscaled: if the longer
/// edge already fits, the original dimensions come back unchanged. Otherwise
/// the longer edge becomes exactly `max_edge` and the shorter edge is
/// rounded, never below one pixel.
///
/// # Examples
/// ```
/// # use fitting_room::imaging::fit_within;
/// // 4000x3000 landscape into 1024 → 1024x768
/// assert_eq!(fit_within((4000, 3000), 1024), (1024, 768));
///
/// // Already small enough → untouched
/// assert_eq!(fit_within((640, 480), 1024), (640, 480));
/// ```
pub fn fit_within(original: (u32, u32), max_edge: u32) -> (u32, u32) {
    let (orig_w, orig_h) = original;
    let max_edge = max_edge.max(1);
    let longer_edge = orig_w.max(orig_h);

    if longer_edge <= max_edge {
        return original;
    }

    if orig_w >= orig_h {
        // Landscape or square
        let ratio = max_edge as f64 / orig_w as f64;
        (max_edge, scaled(orig_h, ratio))
    } else {
        // Portrait
        let ratio = max_edge as f64 / orig_h as f64;
        (scaled(orig_w, ratio), max_edge)
    }
}

fn scaled(edge: u32, ratio: f64) -> u32 {
    ((edge as f64 * ratio).round() as u32).max(1)
}
