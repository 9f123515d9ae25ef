use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

struct FakeCatalog {
    calls: AtomicUsize,
    faces: Option<Vec<FontFace>>,
}

impl FakeCatalog {
    fn serving(faces: Option<Vec<FontFace>>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            faces,
        })
    }
}

impl FontCatalog for FakeCatalog {
    fn fetch_family(&self, family: &str) -> anyhow::Result<Vec<FontFace>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.faces
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no such family '{family}'"))
    }
}

fn face(weight: u16) -> FontFace {
    FontFace {
        weight,
        data: vec![0, 1, 0, 0, weight as u8],
    }
}

#[test]
fn no_request_uses_theme_default_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FakeCatalog::serving(None);
    let fonts = FontManager::new(Arc::new(CacheService::new(dir.path())), catalog.clone());

    for family in [None, Some(""), Some("   ")] {
        let set = fonts.resolve_font(family, "Roboto");
        assert_eq!(set, FontSet::system("Roboto"));
    }
    assert_eq!(catalog.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn fetched_faces_are_cached_with_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(CacheService::new(dir.path()));
    let catalog = FakeCatalog::serving(Some(vec![face(300), face(400), face(700), face(900)]));
    let fonts = FontManager::new(cache.clone(), catalog.clone());

    let first = fonts.resolve_font(Some("Lato"), "Roboto");
    assert!(!first.is_fallback);
    assert_eq!(first.requested_family.as_deref(), Some("Lato"));
    assert_eq!(first.family(), "Lato");
    let FontSource::Files { faces, .. } = &first.source else {
        panic!("expected files, got {:?}", first.source);
    };
    assert_eq!(faces.keys().copied().collect::<Vec<_>>(), vec![300, 400, 700]);
    assert!(cache.entry_dir(CacheNamespace::Fonts, "Lato").join("manifest.json").is_file());

    let second = fonts.resolve_font(Some("Lato"), "Roboto");
    assert_eq!(first, second);
    assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn missing_weights_fall_back_to_regular() {
    let dir = tempfile::tempdir().unwrap();
    let fonts = FontManager::new(
        Arc::new(CacheService::new(dir.path())),
        FakeCatalog::serving(Some(vec![face(400)])),
    );
    let set = fonts.resolve_font(Some("Inter"), "Roboto");
    let regular = set.source.face(FontWeight::Regular).unwrap().to_path_buf();
    assert_eq!(set.source.face(FontWeight::Bold), Some(regular.as_path()));
    assert_eq!(set.source.face(FontWeight::Light), Some(regular.as_path()));
}

#[test]
fn fetch_failure_falls_back_and_is_flagged() {
    let dir = tempfile::tempdir().unwrap();
    let fonts = FontManager::new(
        Arc::new(CacheService::new(dir.path())),
        FakeCatalog::serving(None),
    );
    let set = fonts.resolve_font(Some("Nope Sans"), "Roboto");
    assert!(set.is_fallback);
    assert_eq!(set.requested_family.as_deref(), Some("Nope Sans"));
    assert_eq!(set.source, FontSource::System { family: "Roboto".into() });
}

#[test]
fn empty_or_unusable_catalog_answer_is_a_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let fonts = FontManager::new(
        Arc::new(CacheService::new(dir.path())),
        FakeCatalog::serving(Some(vec![face(900)])),
    );
    assert!(fonts.resolve_font(Some("Heavy"), "Roboto").is_fallback);
}

#[test]
fn partial_entry_without_manifest_is_refetched() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(CacheService::new(dir.path()));
    let entry = cache.entry_dir(CacheNamespace::Fonts, "Lato");
    std::fs::create_dir_all(&entry).unwrap();
    std::fs::write(entry.join("400.ttf"), b"half").unwrap();

    let catalog = FakeCatalog::serving(Some(vec![face(400)]));
    let fonts = FontManager::new(cache, catalog.clone());
    assert!(!fonts.resolve_font(Some("Lato"), "Roboto").is_fallback);
    assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);
    assert_eq!(std::fs::read(entry.join("400.ttf")).unwrap(), face(400).data);
}

#[test]
fn manager_is_send_and_sync() {
    fn is<T: Send + Sync>() {}
    is::<FontManager>();
}
