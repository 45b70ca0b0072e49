mod common;

use antidupl::core::{
    ActionEnableType, FileType, GlobalActionType, LocalActionType, RenameCurrentType,
    ResultRecord, SelectionType, TargetType,
};
use antidupl::{EngineError, EngineSession, LocalEngine, SessionError};
use common::Fixture;
use std::path::PathBuf;

fn pair_paths(session: &mut EngineSession<LocalEngine>) -> (PathBuf, PathBuf) {
    match session.result_at(0).unwrap() {
        Some(ResultRecord::DuplPair(pair)) => (pair.first.path, pair.second.path),
        other => panic!("expected a pair, got {:?}", other),
    }
}

fn one_pair(fixture: &Fixture) -> EngineSession<LocalEngine> {
    fixture.write_gradient("a.png");
    fixture.write_gradient("b.png");
    let mut session = EngineSession::open(fixture.engine()).unwrap();
    session.search().unwrap();
    assert_eq!(session.result_size().unwrap(), 1);
    session
}

#[test]
fn test_delete_undo_redo_moves_files() {
    let fixture = Fixture::new();
    let mut session = one_pair(&fixture);
    let (first, second) = pair_paths(&mut session);

    session
        .apply_local(LocalActionType::DeleteSecond, TargetType::Current)
        .unwrap();
    assert!(first.exists());
    assert!(!second.exists());
    assert_eq!(session.result_size().unwrap(), 0);

    session.apply_global(GlobalActionType::Undo).unwrap();
    assert!(second.exists());
    assert_eq!(session.result_size().unwrap(), 1);

    session.apply_global(GlobalActionType::Redo).unwrap();
    assert!(!second.exists());
    assert_eq!(session.result_size().unwrap(), 0);
}

#[test]
fn test_rename_onto_replaces_target() {
    let fixture = Fixture::new();
    let mut session = one_pair(&fixture);
    let (first, second) = pair_paths(&mut session);

    session
        .apply_local(LocalActionType::RenameFirstToSecond, TargetType::Current)
        .unwrap();
    assert!(!first.exists());
    assert!(second.exists());
    assert_eq!(session.result_size().unwrap(), 0);

    session.apply_global(GlobalActionType::Undo).unwrap();
    assert!(first.exists());
    assert!(second.exists());
}

#[test]
fn test_rename_current_resolves_relative_names() {
    let fixture = Fixture::new();
    let mut session = one_pair(&fixture);
    let (_, second) = pair_paths(&mut session);

    session
        .rename_current(RenameCurrentType::Second, &PathBuf::from("renamed.png"))
        .unwrap();
    let renamed = fixture.pics().join("renamed.png");
    assert!(renamed.exists());
    assert!(!second.exists());
    assert_eq!(pair_paths(&mut session).1, renamed);

    let err = session
        .rename_current(RenameCurrentType::First, &renamed)
        .unwrap_err();
    assert!(matches!(err, SessionError::Engine(EngineError::CantCreateFile)));
}

#[test]
fn test_mistakes_are_skipped_by_later_searches() {
    let fixture = Fixture::new();
    let mut session = one_pair(&fixture);

    session
        .apply_local(LocalActionType::Mistake, TargetType::Current)
        .unwrap();
    session.search().unwrap();
    assert_eq!(session.result_size().unwrap(), 0);

    session.clear(FileType::MistakeDatabase).unwrap();
    session.search().unwrap();
    assert_eq!(session.result_size().unwrap(), 1);
}

#[test]
fn test_selected_target_without_selection_fails() {
    let fixture = Fixture::new();
    let mut session = one_pair(&fixture);

    let err = session
        .apply_local(LocalActionType::DeleteFirst, TargetType::Selected)
        .unwrap_err();
    assert!(matches!(err, SessionError::Engine(EngineError::ZeroTarget)));
    assert_eq!(session.result_size().unwrap(), 1);
}

#[test]
fn test_refresh_drops_missing_files() {
    let fixture = Fixture::new();
    let mut session = one_pair(&fixture);
    let (first, _) = pair_paths(&mut session);

    std::fs::remove_file(&first).unwrap();
    session.apply_global(GlobalActionType::Refresh).unwrap();
    assert_eq!(session.result_size().unwrap(), 0);
}

#[test]
fn test_partial_failure_is_reported_and_undoable() {
    let fixture = Fixture::new();
    fixture.write_gradient("a.png");
    fixture.write_gradient("b.png");
    fixture.write_checker("c.png");
    fixture.write_checker("d.png");
    let mut session = EngineSession::open(fixture.engine()).unwrap();
    session.search().unwrap();
    assert_eq!(session.result_size().unwrap(), 2);

    let firsts: Vec<PathBuf> = (0..2)
        .map(|i| match session.result_at(i).unwrap() {
            Some(ResultRecord::DuplPair(pair)) => pair.first.path,
            other => panic!("expected a pair, got {:?}", other),
        })
        .collect();
    std::fs::remove_file(&firsts[1]).unwrap();

    session.select(SelectionType::SelectAll).unwrap();
    let err = session
        .apply_local(LocalActionType::DeleteFirst, TargetType::Selected)
        .unwrap_err();
    assert!(matches!(err, SessionError::Engine(EngineError::FileIsNotExists)));
    assert!(!firsts[0].exists());
    assert_eq!(session.result_size().unwrap(), 1);
    assert!(session.can_apply(ActionEnableType::Undo).unwrap());

    session.apply_global(GlobalActionType::Undo).unwrap();
    assert!(firsts[0].exists());
    assert_eq!(session.result_size().unwrap(), 2);
}

#[test]
fn test_blocked_undo_leaves_files_and_history() {
    let fixture = Fixture::new();
    let mut session = one_pair(&fixture);
    let (first, _) = pair_paths(&mut session);

    session
        .apply_local(LocalActionType::DeleteFirst, TargetType::Current)
        .unwrap();
    std::fs::write(&first, "NEW").unwrap();

    let err = session.apply_global(GlobalActionType::Undo).unwrap_err();
    assert!(matches!(err, SessionError::Engine(EngineError::CantCreateFile)));
    assert_eq!(std::fs::read_to_string(&first).unwrap(), "NEW");
    assert_eq!(session.result_size().unwrap(), 0);
    assert!(session.can_apply(ActionEnableType::Undo).unwrap());
    assert!(!session.can_apply(ActionEnableType::Redo).unwrap());

    std::fs::remove_file(&first).unwrap();
    session.apply_global(GlobalActionType::Undo).unwrap();
    assert!(first.exists());
    assert_eq!(session.result_size().unwrap(), 1);
}

#[test]
fn test_blocked_redo_rolls_back_earlier_moves() {
    let fixture = Fixture::new();
    let mut session = one_pair(&fixture);
    let (first, second) = pair_paths(&mut session);

    // rename onto parks `second` in the trash, then moves `first` over it
    session
        .apply_local(LocalActionType::RenameFirstToSecond, TargetType::Current)
        .unwrap();
    session.apply_global(GlobalActionType::Undo).unwrap();
    std::fs::rename(&first, fixture.pics().join("held.png")).unwrap();

    let err = session.apply_global(GlobalActionType::Redo).unwrap_err();
    assert!(matches!(err, SessionError::Engine(EngineError::CantWriteFile)));
    assert!(second.exists());
    assert_eq!(session.result_size().unwrap(), 1);
    assert!(session.can_apply(ActionEnableType::Redo).unwrap());
}

#[test]
fn test_undo_keeps_mistakes_recorded_earlier() {
    let fixture = Fixture::new();
    let mut session = one_pair(&fixture);
    let saved = fixture.state().join("results.adr");
    session.save(FileType::Result, &saved).unwrap();

    session
        .apply_local(LocalActionType::Mistake, TargetType::Current)
        .unwrap();
    session.load(FileType::Result, &saved).unwrap();
    assert_eq!(session.result_size().unwrap(), 1);

    // marking the same pair again adds nothing new to the database
    session
        .apply_local(LocalActionType::Mistake, TargetType::Current)
        .unwrap();
    session.apply_global(GlobalActionType::Undo).unwrap();
    assert_eq!(session.result_size().unwrap(), 1);

    session.search().unwrap();
    assert_eq!(session.result_size().unwrap(), 0);
}
