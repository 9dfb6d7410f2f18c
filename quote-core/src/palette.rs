//! Deterministic per-user accent colors.
//!
//! Eight `{dark, light, avatar}` triples and a fixed permutation mapping a
//! numeric identity onto a palette slot. Everything here is a pure function
//! of the identity.

/// One palette slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteEntry {
    /// Name color used on dark backgrounds.
    pub dark: &'static str,
    /// Name color used on light backgrounds.
    pub light: &'static str,
    /// Fill color of synthesized avatars.
    pub avatar: &'static str,
}

/// The fixed user color table.
#[rustfmt::skip]
pub const USER_PALETTES: [PaletteEntry; 8] = [
    PaletteEntry { dark: "#fb6169", light: "#862a23", avatar: "#c03d33" },
    PaletteEntry { dark: "#85de85", light: "#37791f", avatar: "#4fad2d" },
    PaletteEntry { dark: "#f3bc5c", light: "#916604", avatar: "#d09306" },
    PaletteEntry { dark: "#65bdf3", light: "#0f608f", avatar: "#168acd" },
    PaletteEntry { dark: "#b48bf2", light: "#5d2f95", avatar: "#8544d6" },
    PaletteEntry { dark: "#ff5694", light: "#8f2c50", avatar: "#cd4073" },
    PaletteEntry { dark: "#62d4e3", light: "#1c6979", avatar: "#2996ad" },
    PaletteEntry { dark: "#faa357", light: "#904812", avatar: "#ce671b" },
];

/// Maps a clamped identity onto a palette slot.
pub const PALETTE_PERMUTATION: [usize; 8] = [0, 7, 4, 1, 6, 3, 5, 2];

/// Palette slot for a numeric identity.
///
/// The identity is clamped to `0..=7` before the permutation lookup, so
/// every id above 7 shares the last slot and negative ids share the first.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn palette_index(user_id: i64) -> usize {
    PALETTE_PERMUTATION[user_id.clamp(0, 7) as usize]
}

/// Palette triple for a numeric identity.
#[must_use]
pub fn user_palette(user_id: i64) -> &'static PaletteEntry {
    &USER_PALETTES[palette_index(user_id)]
}

/// Accent color of a user's name on the given background.
#[must_use]
pub fn user_color(user_id: i64, light_background: bool) -> &'static str {
    let palette = user_palette(user_id);
    if light_background {
        palette.light
    } else {
        palette.dark
    }
}

/// Fill color of a synthesized avatar.
#[must_use]
pub fn user_avatar_color(user_id: i64) -> &'static str {
    user_palette(user_id).avatar
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color;

    #[test]
    fn test_permutation_is_a_permutation() {
        let mut seen = PALETTE_PERMUTATION;
        seen.sort_unstable();
        assert_eq!(seen, [0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_palette_index_for_user_three() {
        assert_eq!(palette_index(3), PALETTE_PERMUTATION[3]);
        assert_eq!(palette_index(3), 1);
        assert_eq!(user_avatar_color(3), USER_PALETTES[1].avatar);
        assert_eq!(user_avatar_color(3), "#4fad2d");
    }

    #[test]
    fn test_palette_index_clamps() {
        assert_eq!(palette_index(-42), PALETTE_PERMUTATION[0]);
        assert_eq!(palette_index(7), PALETTE_PERMUTATION[7]);
        assert_eq!(palette_index(123_456_789), PALETTE_PERMUTATION[7]);
    }

    #[test]
    fn test_user_color_follows_background() {
        assert_eq!(user_color(1, false), "#faa357");
        assert_eq!(user_color(1, true), "#904812");
    }

    #[test]
    fn test_palette_colors_are_canonical() {
        for entry in &USER_PALETTES {
            for c in [entry.dark, entry.light, entry.avatar] {
                assert_eq!(color::normalize(c).unwrap(), c);
            }
        }
    }
}
