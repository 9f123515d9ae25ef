use super::*;

#[test]
fn every_preset_loads_with_all_classes() {
    let registry = ThemeRegistry::builtin();
    let names = registry.list_themes().unwrap();
    assert_eq!(names.len(), presets::PRESETS.len());
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);

    for name in &names {
        let theme = registry.load_theme(name).unwrap();
        assert_eq!(&theme.name, name);
        for class in RoadClass::ALL {
            assert!(theme.road_styles.contains_key(&class), "{name}: {class}");
        }
    }
}

#[test]
fn terracotta_matches_its_palette() {
    let t = ThemeRegistry::builtin().load_theme("terracotta").unwrap();
    assert_eq!(t.display_name, "Terracotta");
    assert_eq!(t.background_color, Color::rgb(0xF5, 0xED, 0xE4));
    assert_eq!(t.label_color, Color::rgb(0x8B, 0x45, 0x13));
    assert_eq!(t.default_font, DEFAULT_FONT);

    let motorway = t.road_style(RoadClass::Motorway);
    assert_eq!(motorway.color, Color::rgb(0xA0, 0x52, 0x2D));
    assert_eq!((motorway.width, motorway.z_order), (1.2, 50));
    assert_eq!(t.road_style(RoadClass::Residential).z_order, 10);
    assert_eq!(t.road_style(RoadClass::Other).color, Color::rgb(0xD9, 0xA0, 0x8A));
}

#[test]
fn repeated_loads_are_equal() {
    let r = ThemeRegistry::builtin();
    assert_eq!(r.load_theme("noir").unwrap(), r.load_theme("noir").unwrap());
}

#[test]
fn unknown_and_hostile_names_are_not_found() {
    let r = ThemeRegistry::builtin();
    for name in ["does_not_exist", "../terracotta", "", "terracotta.json"] {
        assert!(
            matches!(r.load_theme(name), Err(PosterError::ThemeNotFound(_))),
            "{name}"
        );
    }
}

#[test]
fn optional_keys_fall_back_to_documented_defaults() {
    let json = r##"{
        "bg": "#101010", "text": "#F0F0F0", "water": "#202040", "parks": "#203020",
        "road_default": "#808080",
        "road_motorway": "#FF0000",
        "road_styles": { "primary": { "width": 2.5, "z_order": 99 } }
    }"##;
    let t = Theme::from_json("night_owl", json).unwrap();
    assert_eq!(t.display_name, "Night Owl");
    assert_eq!(t.gradient_color, t.background_color);
    assert_eq!(t.default_font, "Roboto");
    assert_eq!(t.road_style(RoadClass::Motorway).color, Color::rgb(255, 0, 0));

    let primary = t.road_style(RoadClass::Primary);
    assert_eq!(primary.color, Color::rgb(0x80, 0x80, 0x80));
    assert_eq!((primary.width, primary.z_order), (2.5, 99));

    let tertiary = t.road_style(RoadClass::Tertiary);
    assert_eq!((tertiary.width, tertiary.z_order), (0.6, 20));
}

#[test]
fn base_road_style_satisfies_the_road_requirement() {
    let json = r##"{
        "bg": "#FFFFFF", "text": "#000000", "water": "#0000FF", "parks": "#00FF00",
        "road_styles": { "base": { "color": "#333333", "width": 0.5 } }
    }"##;
    let t = Theme::from_json("base_only", json).unwrap();
    assert_eq!(t.road_style(RoadClass::Secondary).color, Color::rgb(0x33, 0x33, 0x33));
    assert_eq!(t.road_style(RoadClass::Secondary).width, 0.5);
    assert_eq!(t.road_style(RoadClass::Secondary).z_order, 30);
}

#[test]
fn missing_or_malformed_fields_are_validation_errors() {
    let no_roads = r##"{ "bg": "#FFFFFF", "text": "#000000", "water": "#0000FF", "parks": "#00FF00" }"##;
    let err = Theme::from_json("x", no_roads).unwrap_err().to_string();
    assert!(err.starts_with("validation error:"), "{err}");
    assert!(err.contains("road_default"), "{err}");

    let no_bg = r##"{ "text": "#000000", "water": "#0000FF", "parks": "#00FF00", "road_default": "#111111" }"##;
    let err = Theme::from_json("x", no_bg).unwrap_err().to_string();
    assert!(err.contains("'bg'"), "{err}");

    let bad_class = r##"{ "bg": "#FFFFFF", "text": "#000000", "water": "#0000FF", "parks": "#00FF00",
        "road_default": "#111111", "road_styles": { "cycleway": { "width": 1.0 } } }"##;
    assert!(matches!(
        Theme::from_json("x", bad_class),
        Err(PosterError::Validation(_))
    ));
}

#[test]
fn user_dir_adds_overrides_and_reports_invalid_files() {
    let dir = tempfile::tempdir().unwrap();
    let custom = r##"{ "name": "Mine", "bg": "#FFFFFF", "text": "#000000", "water": "#0000FF",
        "parks": "#00FF00", "road_default": "#111111" }"##;
    std::fs::write(dir.path().join("mine.json"), custom).unwrap();
    std::fs::write(dir.path().join("noir.json"), custom).unwrap();
    std::fs::write(dir.path().join("broken.json"), "{").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let r = ThemeRegistry::with_user_dir(dir.path());
    let names = r.list_themes().unwrap();
    assert!(names.contains(&"mine".to_string()));
    assert!(names.contains(&"terracotta".to_string()));
    assert!(!names.contains(&"broken".to_string()));
    assert!(!names.contains(&"notes".to_string()));
    for name in &names {
        r.load_theme(name).unwrap();
    }

    assert_eq!(r.load_theme("noir").unwrap().display_name, "Mine");
    match r.load_theme("broken") {
        Err(PosterError::Validation(msg)) => assert!(msg.contains("broken.json"), "{msg}"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn missing_user_dir_is_not_an_error() {
    let r = ThemeRegistry::with_user_dir("/definitely/not/here");
    assert_eq!(r.list_themes().unwrap().len(), presets::PRESETS.len());
}

#[test]
fn upper_case_extension_lists_and_loads() {
    let dir = tempfile::tempdir().unwrap();
    let custom = r##"{ "name": "Shout", "bg": "#FFFFFF", "text": "#000000", "water": "#0000FF",
        "parks": "#00FF00", "road_default": "#111111" }"##;
    std::fs::write(dir.path().join("shout.JSON"), custom).unwrap();

    let r = ThemeRegistry::with_user_dir(dir.path());
    assert!(r.list_themes().unwrap().contains(&"shout".to_string()));
    assert_eq!(r.load_theme("shout").unwrap().display_name, "Shout");
}
