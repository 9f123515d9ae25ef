//! Built-in themes compiled into the binary.

macro_rules! preset {
    ($name:literal) => {
        (
            $name,
            include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/themes/", $name, ".json")),
        )
    };
}

/// `(name, json)` pairs, sorted by name.
pub(crate) const PRESETS: &[(&str, &str)] = &[
    preset!("autumn"),
    preset!("blueprint"),
    preset!("contrast_zones"),
    preset!("copper_patina"),
    preset!("emerald"),
    preset!("forest"),
    preset!("gradient_roads"),
    preset!("japanese_ink"),
    preset!("midnight_blue"),
    preset!("monochrome_blue"),
    preset!("neon_cyberpunk"),
    preset!("noir"),
    preset!("ocean"),
    preset!("pastel_dream"),
    preset!("sunset"),
    preset!("terracotta"),
    preset!("warm_beige"),
];

pub(crate) fn find(name: &str) -> Option<&'static str> {
    PRESETS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, json)| *json)
}
