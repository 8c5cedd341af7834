use std::collections::BTreeSet;
use std::path::PathBuf;

use super::*;
use crate::assets::storage::{BookStorage, Scope};
use crate::foundation::config::LibraryConfig;
use crate::manifest::model::PageImage;

fn location() -> BookLocation {
    BookStorage::new(&LibraryConfig::rooted_at("/lib")).location(&Scope::Global, "b1")
}

fn manifest(status: BookStatus) -> Manifest {
    let loc = location();
    Manifest {
        id: "b1".into(),
        status,
        child_name: Some("Ana".into()),
        images: (1..=3)
            .map(|page| PageImage {
                page,
                url: loc.url_for(&format!("page_{page:02}.png")),
            })
            .collect(),
        ..Default::default()
    }
}

fn probe(names: &[&str]) -> BTreeSet<PathBuf> {
    let dir = location().dir;
    names.iter().map(|n| dir.join(n)).collect()
}

#[test]
fn overrides_layer_over_base() {
    let mut m = manifest(BookStatus::Done);
    m.overrides.pages_image_url.insert(2, "/files/books/b1/edited/page_02-1.png".into());
    m.overrides.pages_text.insert(2, "Olá".into());
    m.overrides.pages_text.insert(4, "orphan text".into());

    let view = BookView::resolve(&m, &location(), &probe(&["cover.png"]));
    assert_eq!(view.title, "A Aventura de Ana");
    assert_eq!(view.cover_url.as_deref(), Some("/files/books/b1/cover.png"));
    assert_eq!(view.pages.len(), 4);
    assert_eq!(view.pages[0].url.as_deref(), Some("/files/books/b1/page_01.png"));
    assert!(!view.pages[0].edited);
    assert_eq!(view.pages[1].url.as_deref(), Some("/files/books/b1/edited/page_02-1.png"));
    assert!(view.pages[1].edited);
    assert_eq!(view.pages[1].text.as_deref(), Some("Olá"));
    assert_eq!(view.pages[3].url, None);
    assert_eq!(view.pages[3].title, "Página 4");
}

#[test]
fn cover_override_wins() {
    let mut m = manifest(BookStatus::Done);
    m.overrides.cover_url = Some("/files/books/b1/edited/cover-x.png".into());
    let view = BookView::resolve(&m, &location(), &probe(&["cover.png"]));
    assert_eq!(view.cover_url.as_deref(), Some("/files/books/b1/edited/cover-x.png"));
}

#[test]
fn resolve_is_deterministic() {
    let mut m = manifest(BookStatus::Done);
    m.overrides.pages_image_url.insert(1, "/x.png".into());
    m.updated_at = Some("2026-10-18T09:30:00Z".into());
    let p = probe(&["cover.png", "book-b1.pdf"]);
    assert_eq!(
        BookView::resolve(&m, &location(), &p),
        BookView::resolve(&m, &location(), &p)
    );
}

#[test]
fn pdf_needs_done_status_and_a_file() {
    let loc = location();
    let with_pdf = probe(&["book-b1.pdf"]);

    let generating = BookView::resolve(&manifest(BookStatus::Generating), &loc, &with_pdf);
    assert!(!generating.has_pdf);
    assert_eq!(generating.pdf_url, None);

    let done_no_file = BookView::resolve(&manifest(BookStatus::Done), &loc, &probe(&[]));
    assert!(!done_no_file.has_pdf);

    let done = BookView::resolve(&manifest(BookStatus::Done), &loc, &with_pdf);
    assert!(done.has_pdf);
    assert_eq!(done.pdf_url.as_deref(), Some("/files/books/b1/book-b1.pdf"));
}

#[test]
fn legacy_pdf_in_parent_dir_counts() {
    let loc = location();
    let parent: BTreeSet<PathBuf> = [PathBuf::from("/lib/books/b1.pdf")].into_iter().collect();
    let view = BookView::resolve(&manifest(BookStatus::Done), &loc, &parent);
    assert!(view.has_pdf);
    assert_eq!(view.pdf_url.as_deref(), Some("/files/books/b1.pdf"));
}

#[test]
fn timestamps_are_formatted_and_sorted() {
    let loc = location();
    let mut a = manifest(BookStatus::Done);
    a.updated_at = Some("2026-10-18T09:30:00Z".into());
    let mut b = manifest(BookStatus::Done);
    b.created_at = Some("2026-10-19T08:00:00Z".into());
    let mut c = manifest(BookStatus::Done);
    c.updated_at = Some("yesterday-ish".into());

    let mut views: Vec<BookView> = [&a, &b, &c]
        .iter()
        .map(|m| BookView::resolve(m, &loc, &probe(&[])))
        .collect();
    views[0].dir_id = "a".into();
    views[1].dir_id = "b".into();
    views[2].dir_id = "c".into();

    assert_eq!(views[0].updated_at_display.as_deref(), Some("18/10/2026 09:30"));
    assert_eq!(views[2].updated_at_display.as_deref(), Some("yesterday-ish"));
    assert_eq!(views[2].sort_key, 0);

    sort_views(&mut views);
    let order: Vec<_> = views.iter().map(|v| v.dir_id.as_str()).collect();
    assert_eq!(order, vec!["b", "a", "c"]);
}
