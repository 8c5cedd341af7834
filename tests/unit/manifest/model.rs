use super::*;

fn sample() -> Manifest {
    serde_json::from_str(
        r#"{
            "id": "b1",
            "dirId": "b1",
            "status": "done",
            "childName": "Lia",
            "createdAt": "2026-01-01T10:00:00Z",
            "images": [
                {"page": 2, "url": "/files/books/b1/page_02.png"},
                {"page": 1, "url": "/files/books/b1/page_01.png"}
            ],
            "overrides": {
                "pagesText": {"4": "extra page"},
                "pagesImageUrl": {"2": "/files/books/b1/edited/page_02-1.png"}
            },
            "generatorVersion": "v7"
        }"#,
    )
    .unwrap()
}

#[test]
fn parses_camel_case_and_integer_keys() {
    let m = sample();
    assert_eq!(m.status, BookStatus::Done);
    assert_eq!(m.child_name.as_deref(), Some("Lia"));
    assert_eq!(m.overrides.pages_text.get(&4).map(String::as_str), Some("extra page"));
    m.validate().unwrap();
}

#[test]
fn unknown_fields_survive_round_trip() {
    let m = sample();
    let json = serde_json::to_value(&m).unwrap();
    assert_eq!(json["generatorVersion"], "v7");
    assert_eq!(json["overrides"]["pagesImageUrl"]["2"], "/files/books/b1/edited/page_02-1.png");
}

#[test]
fn page_numbers_union_sorted() {
    assert_eq!(sample().page_numbers(), vec![1, 2, 4]);
}

#[test]
fn effective_url_prefers_override() {
    let m = sample();
    assert_eq!(m.effective_page_url(1), Some("/files/books/b1/page_01.png"));
    assert_eq!(m.effective_page_url(2), Some("/files/books/b1/edited/page_02-1.png"));
    assert_eq!(m.effective_page_url(4), None);
}

#[test]
fn duplicate_or_zero_pages_are_corrupt() {
    let mut m = sample();
    m.images.push(PageImage {
        page: 1,
        url: "x".into(),
    });
    assert_eq!(m.validate().unwrap_err().kind(), "corrupt_state");

    let mut m = sample();
    m.images[0].page = 0;
    assert_eq!(m.validate().unwrap_err().kind(), "corrupt_state");
}

#[test]
fn titles_fall_back_in_order() {
    let mut m = sample();
    assert_eq!(m.book_title(), "A Aventura de Lia");
    assert_eq!(m.page_title(3), "Página 3");

    m.story = Some(Story {
        title: Some("Lia e o Dragão".into()),
        pages: vec![StoryPage {
            page: 3,
            title: Some("O Castelo".into()),
            text: None,
        }],
    });
    assert_eq!(m.book_title(), "Lia e o Dragão");
    assert_eq!(m.page_title(3), "O Castelo");

    m.overrides.pages_title.insert(3, "  ".into());
    assert_eq!(m.page_title(3), "O Castelo");
    m.overrides.pages_title.insert(3, "A Ponte".into());
    assert_eq!(m.page_title(3), "A Ponte");

    m.title = Some("Título".into());
    assert_eq!(m.book_title(), "Título");
}

#[test]
fn ids_that_are_not_plain_names_are_corrupt() {
    let mut m = sample();
    m.id = "../escape".into();
    assert_eq!(m.validate().unwrap_err().kind(), "corrupt_state");

    let mut m = sample();
    m.dir_id = Some("a/b".into());
    assert_eq!(m.validate().unwrap_err().kind(), "corrupt_state");
}
