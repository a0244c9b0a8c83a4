/// Rating assigned to films that are hearted but carry no star rating
pub const LIKED_PLACEHOLDER: f32 = 4.0;

/// Sentinel returned for glyph strings that are not a known rating.
///
/// Not a valid score; callers must filter it out before training.
pub const NO_RATING: f32 = 0.0;

/// Converts a star-glyph string ("★★★½") into its half-point numeric value.
///
/// Pure and total: the ten known glyph strings map to their exact tabled
/// value, everything else (empty string, "No rating", junk) maps to
/// [`NO_RATING`].
pub fn parse_star_rating(glyphs: &str) -> f32 {
    match glyphs.trim() {
        "½" => 0.5,
        "★" => 1.0,
        "★½" => 1.5,
        "★★" => 2.0,
        "★★½" => 2.5,
        "★★★" => 3.0,
        "★★★½" => 3.5,
        "★★★★" => 4.0,
        "★★★★½" => 4.5,
        "★★★★★" => 5.0,
        _ => NO_RATING,
    }
}
