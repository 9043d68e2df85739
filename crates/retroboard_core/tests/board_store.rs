use chrono::{TimeZone, Utc};
use image::{Rgb as Pixel, RgbImage};
use retroboard_core::db::open_db_in_memory;
use retroboard_core::{
    BoardService, BoardServiceError, Note, NoteColor, NoteDraft, PixelBox, RecognizedFragment,
    RecoveryConfig, RepoError, Section, SequentialIdGenerator, SqliteBoardRepository,
    DEFAULT_BOARD_NAME,
};

const ACTOR: &str = "tester";

fn service(conn: &mut rusqlite::Connection) -> BoardService<SqliteBoardRepository<'_>> {
    BoardService::with_id_generator(
        SqliteBoardRepository::new(conn),
        Box::new(SequentialIdGenerator::new("id")),
    )
}

fn draft(text: &str, color: NoteColor, section: Section) -> NoteDraft {
    NoteDraft {
        text: text.to_string(),
        color,
        section,
        x: None,
        y: None,
    }
}

#[test]
fn create_board_uses_default_name_and_rejects_blank() {
    let mut conn = open_db_in_memory().unwrap();
    let service = service(&mut conn);

    let board = service.create_board(None, ACTOR).unwrap();
    assert_eq!(board.id, "id-1");
    assert_eq!(board.name, DEFAULT_BOARD_NAME);
    assert_eq!(board.created_by, ACTOR);
    assert_eq!(service.get_board("id-1").unwrap(), Some(board));

    assert!(matches!(
        service.create_board(Some("   "), ACTOR),
        Err(BoardServiceError::InvalidName)
    ));
    assert_eq!(service.get_board("missing").unwrap(), None);
}

#[test]
fn note_crud_round_trips_through_store() {
    let mut conn = open_db_in_memory().unwrap();
    let service = service(&mut conn);
    let board = service.create_board(Some("Sprint 12"), ACTOR).unwrap();

    let note = service
        .add_note(&board.id, ACTOR, NoteDraft::blank(Section::Keep))
        .unwrap();
    assert_eq!(note.color, NoteColor::Yellow);
    assert_eq!(note.text, "");

    service
        .update_note_text(&board.id, &note.id, "Quick code reviews")
        .unwrap();
    service.move_note(&board.id, &note.id, Section::More).unwrap();
    service
        .change_note_color(&board.id, &note.id, NoteColor::Green)
        .unwrap();

    let listed = service.list_notes(&board.id).unwrap();
    assert_eq!(
        listed,
        vec![Note::new(
            note.id.clone(),
            "Quick code reviews",
            NoteColor::Green,
            Section::More
        )]
    );

    service.delete_note(&board.id, &note.id).unwrap();
    assert!(service.list_notes(&board.id).unwrap().is_empty());

    assert!(matches!(
        service.delete_note(&board.id, &note.id),
        Err(BoardServiceError::Repo(RepoError::NoteNotFound { .. }))
    ));
    assert!(matches!(
        service.move_note("missing", &note.id, Section::Stop),
        Err(BoardServiceError::BoardNotFound(_))
    ));
}

#[test]
fn export_then_import_into_another_board_copies_content_with_new_ids() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = service(&mut conn);
    let source = service.create_board(Some("Source"), ACTOR).unwrap();
    let target = service.create_board(Some("Target"), ACTOR).unwrap();

    let first = service
        .add_note(&source.id, ACTOR, draft("Keep pairing", NoteColor::Blue, Section::Keep))
        .unwrap();
    let second = service
        .add_note(&source.id, ACTOR, draft("Stop skipping tests", NoteColor::Pink, Section::Stop))
        .unwrap();

    let exported_at = Utc.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap();
    let json = service.export_board_at(&source.id, exported_at).unwrap();
    assert!(json.contains("\"exportDate\": \"2026-10-19T10:00:00.000Z\""));

    let imported = service.import_document(&target.id, ACTOR, json.as_bytes()).unwrap();
    assert_eq!(imported.len(), 2);
    assert!(imported
        .iter()
        .all(|note| note.id != first.id && note.id != second.id));

    let stored = service.list_notes(&target.id).unwrap();
    assert_eq!(stored, imported);
    assert_eq!(stored[0].text, "Keep pairing");
    assert_eq!(stored[1].section, Section::Stop);

    // Importing the same document again into the same board cannot collide.
    service.import_document(&target.id, ACTOR, json.as_bytes()).unwrap();
    assert_eq!(service.list_notes(&target.id).unwrap().len(), 4);
}

#[test]
fn failed_imports_leave_existing_notes_untouched() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = service(&mut conn);
    let board = service.create_board(None, ACTOR).unwrap();
    service
        .add_note(&board.id, ACTOR, draft("Existing", NoteColor::Yellow, Section::Less))
        .unwrap();
    let before = service.list_notes(&board.id).unwrap();

    let version_err = service
        .import_document(
            &board.id,
            ACTOR,
            br#"{"version":"2.0","exportDate":"2026-10-19T10:00:00.000Z","notes":[]}"#,
        )
        .unwrap_err();
    assert!(matches!(
        version_err,
        BoardServiceError::Codec(ref err) if err.is_unsupported_version()
    ));

    let format_err = service
        .import_document(&board.id, ACTOR, b"not json at all")
        .unwrap_err();
    assert!(matches!(
        format_err,
        BoardServiceError::Codec(ref err) if err.is_format()
    ));

    assert_eq!(service.list_notes(&board.id).unwrap(), before);
}

#[test]
fn import_transaction_rolls_back_on_conflict() {
    let mut conn = open_db_in_memory().unwrap();
    let board_id = {
        let service = service(&mut conn);
        service.create_board(None, ACTOR).unwrap().id
    };

    {
        use retroboard_core::BoardRepository;
        let mut repo = SqliteBoardRepository::new(&mut conn);
        let duplicate = vec![
            Note::new("dup", "first", NoteColor::Blue, Section::Keep),
            Note::new("dup", "second", NoteColor::Blue, Section::Keep),
        ];
        assert!(repo.import_notes(&board_id, ACTOR, &duplicate).is_err());
        assert!(repo.list_notes(&board_id).unwrap().is_empty());
    }
}

#[test]
fn recovered_notes_are_stored_on_the_board() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = service(&mut conn);
    let board = service.create_board(None, ACTOR).unwrap();

    let image = RgbImage::from_pixel(1000, 1000, Pixel([102, 255, 102]));
    let fragments = vec![
        RecognizedFragment::new("Export", PixelBox::new(900, 0, 990, 30)),
        RecognizedFragment::new("Fewer meetings", PixelBox::new(50, 800, 250, 860)),
    ];
    let report = service
        .recover_into_board(&board.id, ACTOR, &image, &fragments, &RecoveryConfig::default())
        .unwrap();

    assert_eq!(report.discarded, 1);
    let stored = service.list_notes(&board.id).unwrap();
    assert_eq!(stored, report.notes);
    assert_eq!(stored[0].section, Section::Less);
    assert_eq!(stored[0].color, NoteColor::Green);
}

#[test]
fn clear_board_removes_every_note() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = service(&mut conn);
    let board = service.create_board(None, ACTOR).unwrap();
    for section in [Section::Keep, Section::Start] {
        service
            .add_note(&board.id, ACTOR, NoteDraft::blank(section))
            .unwrap();
    }

    assert_eq!(service.clear_board(&board.id).unwrap(), 2);
    assert!(service.list_notes(&board.id).unwrap().is_empty());
}
