//! Glyphs used to draw particles.

/// Rain streaks: straight, falling right, falling left.
pub const RAIN_CHARS: &[char] = &['|', '\\', '/'];

/// Snowflakes from smallest to largest.
pub const SNOW_CHARS: &[char] = &['·', '•', '*', '❄'];
