use std::collections::BTreeSet;

use super::*;
use crate::assets::storage::{BookStorage, Scope};
use crate::foundation::config::LibraryConfig;
use crate::manifest::model::PageImage;

fn probe(dir: &Path, names: &[&str]) -> BTreeSet<PathBuf> {
    names.iter().map(|n| dir.join(n)).collect()
}

#[test]
fn strategies_emit_expected_names() {
    assert_eq!(
        Strategy::CleanCover.candidates(AssetSlot::Cover),
        vec!["cover.png", "capa.png", "edit_base.png", "cover_base.png", "capa_base.png"]
    );
    assert_eq!(
        Strategy::LegacyFinalPage.candidates(AssetSlot::Page(3)),
        vec!["page_03_final.png", "page_3_final.png"]
    );
    assert_eq!(
        Strategy::UnpaddedPage.candidates(AssetSlot::Page(3)),
        vec!["page_3.png"]
    );
    assert!(Strategy::UnpaddedPage.candidates(AssetSlot::Page(12)).is_empty());
    assert!(Strategy::PaddedPage.candidates(AssetSlot::Cover).is_empty());
    assert_eq!(
        Strategy::FirstPageFallback.candidates(AssetSlot::Cover)[0],
        "page_01.png"
    );
    assert_eq!(
        Strategy::LegacyEdited.candidates(AssetSlot::Page(4)),
        vec!["edited/page_04.png"]
    );
}

#[test]
fn cover_prefers_clean_then_final_then_first_page() {
    let dir = Path::new("/b");
    let p = probe(dir, &["capa_final.png", "page_01.png", "capa_base.png"]);
    assert_eq!(resolve_base(dir, AssetSlot::Cover, &p), Some(dir.join("capa_base.png")));

    let p = probe(dir, &["capa_final.png", "page_01.png"]);
    assert_eq!(resolve_base(dir, AssetSlot::Cover, &p), Some(dir.join("capa_final.png")));

    let p = probe(dir, &["page_1.png"]);
    assert_eq!(resolve_base(dir, AssetSlot::Cover, &p), Some(dir.join("page_1.png")));

    assert_eq!(resolve_base(dir, AssetSlot::Cover, &BTreeSet::new()), None);
}

#[test]
fn page_prefers_padded_then_final_then_unpadded() {
    let dir = Path::new("/b");
    let slot = AssetSlot::Page(3);
    let p = probe(dir, &["page_3.png", "page_3_final.png", "page_03.png"]);
    assert_eq!(resolve_base(dir, slot, &p), Some(dir.join("page_03.png")));

    let p = probe(dir, &["page_3.png", "page_3_final.png"]);
    assert_eq!(resolve_base(dir, slot, &p), Some(dir.join("page_3_final.png")));

    let p = probe(dir, &["page_3.png"]);
    assert_eq!(resolve_base(dir, slot, &p), Some(dir.join("page_3.png")));
}

#[test]
fn edit_source_skips_final_when_clean_exists() {
    let dir = Path::new("/b");
    let slot = AssetSlot::Page(2);
    let p = probe(dir, &["page_02_final.png", "page_2.png"]);
    assert_eq!(resolve_base(dir, slot, &p), Some(dir.join("page_02_final.png")));
    assert_eq!(resolve_edit_source(dir, slot, &p), Some(dir.join("page_2.png")));

    let p = probe(dir, &["page_02_final.png"]);
    assert_eq!(resolve_edit_source(dir, slot, &p), Some(dir.join("page_02_final.png")));
}

#[test]
fn derived_or_final_markers() {
    assert!(is_derived_or_final("/files/books/b1/edited/page_03-1.png"));
    assert!(is_derived_or_final("C:\\books\\b1\\edited\\cover.png"));
    assert!(is_derived_or_final("cover_final.png"));
    assert!(is_derived_or_final("/x/page_3_final.png?v=1"));
    assert!(is_derived_or_final("page_03-edited.png"));
    assert!(!is_derived_or_final("/files/books/b1/page_03.png"));
    assert!(!is_derived_or_final("/files/books/finale/cover.png"));
    assert!(!is_derived_or_final(""));
}

#[test]
fn print_prefers_override_then_legacy_edited_then_final_then_base() {
    let loc = BookStorage::new(&LibraryConfig::rooted_at("/srv")).location(&Scope::Global, "b1");
    let dir = loc.dir.clone();
    let mut m = Manifest {
        id: "b1".into(),
        images: vec![PageImage {
            page: 2,
            url: "/files/books/b1/gen/p2.png".into(),
        }],
        ..Manifest::default()
    };
    m.overrides
        .pages_image_url
        .insert(2, "/files/books/b1/edited/page_02-7.png".into());
    let slot = AssetSlot::Page(2);

    let all = probe(
        &dir,
        &[
            "edited/page_02-7.png",
            "edited/page_02.png",
            "page_02_final.png",
            "page_02.png",
            "gen/p2.png",
        ],
    );
    let pick = |names: &[&str]| {
        let p: BTreeSet<PathBuf> = all
            .iter()
            .filter(|x| names.iter().any(|n| dir.join(n) == **x))
            .cloned()
            .collect();
        resolve_for_print(&loc, &m, slot, &p).map(|a| a.source)
    };

    assert_eq!(
        resolve_for_print(&loc, &m, slot, &all).unwrap().path,
        dir.join("edited/page_02-7.png")
    );
    assert_eq!(
        pick(&["edited/page_02.png", "page_02_final.png", "page_02.png"]),
        Some(PrintSource::LegacyEdited)
    );
    assert_eq!(
        pick(&["page_02_final.png", "page_02.png"]),
        Some(PrintSource::LegacyFinal)
    );
    assert_eq!(pick(&["page_02.png"]), Some(PrintSource::Base));
    assert_eq!(pick(&["gen/p2.png"]), Some(PrintSource::BaseUrl));
    assert_eq!(pick(&[]), None);
}

#[test]
fn expected_pattern_is_padded() {
    assert_eq!(expected_pattern(AssetSlot::Page(3)), "page_03.png");
    assert_eq!(expected_pattern(AssetSlot::Cover), "cover.png");
}
