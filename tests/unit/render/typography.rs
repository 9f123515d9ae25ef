use super::*;

#[test]
fn latin_titles_are_spaced_and_uppercased() {
    assert_eq!(city_title("Paris"), "P  A  R  I  S");
    assert_eq!(city_title(" São Paulo "), "S  Ã  O     P  A  U  L  O");
    assert_eq!(city_title("東京"), "東京");
    assert_eq!(city_title("Москва"), "МОСКВА");
}

#[test]
fn script_detection() {
    assert!(is_latin_script("Hà Nội"));
    assert!(is_latin_script("Zürich 2"));
    assert!(!is_latin_script("القاهرة"));
    assert!(!is_latin_script("Αθήνα"));
}

#[test]
fn long_names_shrink_with_a_floor() {
    assert_eq!(city_font_pt("New York"), 60.0);
    assert_eq!(city_font_pt("Copenhagen"), 60.0);
    assert_eq!(city_font_pt("Rio de Janeiro"), 60.0 * 10.0 / 14.0);
    assert_eq!(city_font_pt(&"x".repeat(100)), 10.0);
}

#[test]
fn coordinates_use_hemisphere_letters() {
    assert_eq!(
        coordinate_line(GeoPoint { lat: 40.7128, lon: -74.006 }),
        "40.7128° N / 74.0060° W"
    );
    assert_eq!(
        coordinate_line(GeoPoint { lat: -33.8688, lon: 151.2093 }),
        "33.8688° S / 151.2093° E"
    );
}

#[test]
fn escapes_markup() {
    assert_eq!(xml_escape("A&B <\"x\">"), "A&amp;B &lt;&quot;x&quot;&gt;");
    assert_eq!(xml_escape("tab\there"), "tabhere");
}
