mod common;

use common::{seeded_store, stored_field, GatedStore};
use ethernote_core::store::StoreOp;
use ethernote_core::{Error, NoteController, NoteDraft, NoteId, NoteMode, Operation};
use pretty_assertions::assert_eq;
use serde_json::json;

async fn open_groceries(store: &std::sync::Arc<GatedStore>) -> NoteController {
    let controller = NoteController::new(store.service());
    controller.open(NoteId::new("n1")).await.expect("open n1");
    controller
}

#[tokio::test]
async fn open_shows_note_and_edit_then_save_persists() {
    let store = seeded_store();
    let controller = open_groceries(&store).await;

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.mode, NoteMode::Viewing);
    assert_eq!(snapshot.draft, Some(NoteDraft::new("Groceries", "Milk")));

    controller.begin_edit().unwrap();
    controller.update_content("Milk, Eggs").unwrap();
    controller.save().await.unwrap();

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.mode, NoteMode::Viewing);
    assert_eq!(snapshot.note.as_ref().map(|note| note.content.as_str()), Some("Milk, Eggs"));
    assert!(!snapshot.has_unsaved_changes());
    assert_eq!(stored_field(&store, "n1", "content"), Some(json!("Milk, Eggs")));
    assert_eq!(store.inner.call_count(StoreOp::Update), 1);
}

#[tokio::test]
async fn save_trims_title_and_content() {
    let store = seeded_store();
    let controller = open_groceries(&store).await;

    controller.begin_edit().unwrap();
    controller.update_title("  Weekly shop ").unwrap();
    controller.update_content("\nMilk\n").unwrap();
    controller.save().await.unwrap();

    assert_eq!(stored_field(&store, "n1", "title"), Some(json!("Weekly shop")));
    assert_eq!(stored_field(&store, "n1", "content"), Some(json!("Milk")));
    assert_eq!(
        controller.snapshot().draft,
        Some(NoteDraft::new("Weekly shop", "Milk"))
    );
}

#[tokio::test]
async fn empty_title_is_rejected_without_store_call() {
    let store = seeded_store();
    let controller = open_groceries(&store).await;
    store.inner.clear_calls();

    controller.begin_edit().unwrap();
    controller.update_title("   ").unwrap();
    let error = controller.save().await.unwrap_err();

    assert!(matches!(error, Error::Validation(_)));
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.mode, NoteMode::Editing);
    assert_eq!(snapshot.last_error, Some(error));
    assert!(store.inner.calls().is_empty());
}

#[tokio::test]
async fn missing_note_shows_load_error() {
    let store = seeded_store();
    let controller = NoteController::new(store.service());

    let error = controller.open(NoteId::new("missing")).await.unwrap_err();

    assert!(matches!(error, Error::NotFound(_)));
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.mode, NoteMode::LoadError);
    assert_eq!(snapshot.draft, None);
    assert_eq!(snapshot.last_error, Some(error));
    assert!(controller.begin_edit().is_err());
}

#[tokio::test]
async fn failed_save_keeps_edits_and_can_be_retried() {
    let store = seeded_store();
    let controller = open_groceries(&store).await;
    controller.begin_edit().unwrap();
    controller.update_content("Milk, Eggs").unwrap();
    store.inner.fail_next(StoreOp::Update, "connection reset");

    let error = controller.save().await.unwrap_err();

    assert!(matches!(error, Error::Network(_)));
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.mode, NoteMode::Editing);
    assert_eq!(snapshot.draft, Some(NoteDraft::new("Groceries", "Milk, Eggs")));
    assert!(snapshot.last_error.is_some());
    assert_eq!(stored_field(&store, "n1", "content"), Some(json!("Milk")));

    controller.save().await.unwrap();
    assert_eq!(controller.mode(), NoteMode::Viewing);
    assert_eq!(controller.snapshot().last_error, None);
    assert_eq!(stored_field(&store, "n1", "content"), Some(json!("Milk, Eggs")));
}

#[tokio::test]
async fn cancel_restores_persisted_values() {
    let store = seeded_store();
    let controller = open_groceries(&store).await;

    controller.begin_edit().unwrap();
    controller.update_title("Chores").unwrap();
    controller.update_content("Laundry").unwrap();
    controller.cancel_edit().unwrap();

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.mode, NoteMode::Viewing);
    assert_eq!(snapshot.draft, Some(NoteDraft::new("Groceries", "Milk")));
    assert_eq!(store.inner.call_count(StoreOp::Update), 0);
}

#[tokio::test]
async fn second_save_while_saving_is_rejected() {
    let store = seeded_store();
    let controller = open_groceries(&store).await;
    controller.begin_edit().unwrap();
    controller.update_content("Milk, Eggs").unwrap();

    let release = store.hold_next(StoreOp::Update);
    let first = controller.save();
    tokio::pin!(first);
    assert!(futures::poll!(&mut first).is_pending());

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.mode, NoteMode::Saving);
    assert!(snapshot.is_busy);

    assert_eq!(controller.save().await, Err(Error::Busy(Operation::Save)));
    assert_eq!(controller.delete().await, Err(Error::Busy(Operation::Delete)));
    assert_eq!(
        controller.open(NoteId::new("n2")).await,
        Err(Error::Busy(Operation::Open))
    );
    assert_eq!(controller.snapshot().last_error, None);

    release.send(()).unwrap();
    first.await.unwrap();

    assert_eq!(store.inner.call_count(StoreOp::Update), 1);
    assert_eq!(store.inner.call_count(StoreOp::Delete), 0);
    assert_eq!(controller.mode(), NoteMode::Viewing);
}

#[tokio::test]
async fn stale_open_result_is_discarded() {
    let store = seeded_store();
    let controller = NoteController::new(store.service());

    let release_first = store.hold_next(StoreOp::Get);
    let release_second = store.hold_next(StoreOp::Get);

    let first = controller.open(NoteId::new("n1"));
    tokio::pin!(first);
    assert!(futures::poll!(&mut first).is_pending());

    let second = controller.open(NoteId::new("n2"));
    tokio::pin!(second);
    assert!(futures::poll!(&mut second).is_pending());

    release_second.send(()).unwrap();
    second.await.unwrap();
    assert_eq!(controller.snapshot().draft, Some(NoteDraft::new("Books", "Dune")));

    release_first.send(()).unwrap();
    assert_eq!(first.await, Err(Error::Superseded));

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.note_id, Some(NoteId::new("n2")));
    assert_eq!(snapshot.mode, NoteMode::Viewing);
    assert_eq!(snapshot.draft, Some(NoteDraft::new("Books", "Dune")));
}

#[tokio::test]
async fn delete_closes_and_removes_record() {
    let store = seeded_store();
    let controller = open_groceries(&store).await;

    controller.delete().await.unwrap();

    assert_eq!(controller.mode(), NoteMode::Closed);
    assert_eq!(stored_field(&store, "n1", "id"), None);
    assert!(controller.begin_edit().is_err());
}

#[tokio::test]
async fn failed_delete_keeps_edits() {
    let store = seeded_store();
    let controller = open_groceries(&store).await;
    controller.begin_edit().unwrap();
    controller.update_content("Milk, Eggs").unwrap();
    store.inner.fail_next(StoreOp::Delete, "timeout");

    let error = controller.delete().await.unwrap_err();

    assert!(matches!(error, Error::Network(_)));
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.mode, NoteMode::Editing);
    assert_eq!(snapshot.draft, Some(NoteDraft::new("Groceries", "Milk, Eggs")));
    assert_eq!(snapshot.last_error, Some(error));
    assert!(stored_field(&store, "n1", "id").is_some());
}

#[tokio::test]
async fn draft_save_inserts_and_adopts_id() {
    let store = GatedStore::new();
    let controller = NoteController::draft(store.service());
    assert!(controller.snapshot().is_new);

    controller.update_title("Ideas").unwrap();
    controller.update_content("Write more").unwrap();
    controller.save().await.unwrap();

    let snapshot = controller.snapshot();
    let id = snapshot.note_id.expect("assigned id");
    assert!(!snapshot.is_new);
    assert_eq!(snapshot.mode, NoteMode::Viewing);
    assert_eq!(store.inner.call_count(StoreOp::Insert), 1);
    assert_eq!(stored_field(&store, id.as_str(), "title"), Some(json!("Ideas")));

    controller.begin_edit().unwrap();
    controller.update_content("Write even more").unwrap();
    controller.save().await.unwrap();
    assert_eq!(store.inner.call_count(StoreOp::Insert), 1);
    assert_eq!(store.inner.call_count(StoreOp::Update), 1);
}

#[tokio::test]
async fn subscribers_see_mode_changes() {
    let store = seeded_store();
    let controller = NoteController::new(store.service());
    let mut updates = controller.subscribe();

    controller.open(NoteId::new("n1")).await.unwrap();

    assert!(updates.has_changed().unwrap());
    assert_eq!(updates.borrow_and_update().mode, NoteMode::Viewing);

    controller.begin_edit().unwrap();
    assert!(updates.has_changed().unwrap());
    assert_eq!(updates.borrow_and_update().mode, NoteMode::Editing);
}

#[tokio::test]
async fn edits_leave_persisted_copy_alone_until_saved() {
    let store = seeded_store();
    let controller = open_groceries(&store).await;
    let persisted = controller.snapshot().note;

    controller.begin_edit().unwrap();
    for text in ["M", "Mi", "Milk and", "Milk and honey"] {
        controller.update_content(text).unwrap();
        controller.update_title(format!("{text} list")).unwrap();
        assert_eq!(controller.snapshot().note, persisted);
    }
    controller.update_title("").unwrap();
    assert!(controller.save().await.is_err());

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.note, persisted);
    assert_eq!(snapshot.draft, Some(NoteDraft::new("", "Milk and honey")));
}

#[tokio::test]
async fn cancel_after_save_restores_saved_values() {
    let store = seeded_store();
    let controller = open_groceries(&store).await;
    controller.begin_edit().unwrap();
    controller.update_content("Milk, Eggs").unwrap();
    controller.save().await.unwrap();

    controller.begin_edit().unwrap();
    controller.update_content("Something else").unwrap();
    controller.cancel_edit().unwrap();

    assert_eq!(
        controller.snapshot().draft,
        Some(NoteDraft::new("Groceries", "Milk, Eggs"))
    );
}

#[tokio::test]
async fn dropped_save_returns_to_editing_and_can_be_retried() {
    let store = seeded_store();
    let controller = open_groceries(&store).await;
    controller.begin_edit().unwrap();
    controller.update_content("Milk, Eggs").unwrap();

    let release = store.hold_next(StoreOp::Update);
    {
        let save = controller.save();
        tokio::pin!(save);
        assert!(futures::poll!(&mut save).is_pending());
        assert_eq!(controller.mode(), NoteMode::Saving);
    }
    drop(release);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.mode, NoteMode::Editing);
    assert!(!snapshot.is_busy);
    assert_eq!(snapshot.draft, Some(NoteDraft::new("Groceries", "Milk, Eggs")));

    controller.save().await.unwrap();
    assert_eq!(controller.mode(), NoteMode::Viewing);
    assert_eq!(store.inner.call_count(StoreOp::Update), 1);
    assert_eq!(stored_field(&store, "n1", "content"), Some(json!("Milk, Eggs")));
}

#[tokio::test]
async fn dropped_delete_restores_prior_mode() {
    let store = seeded_store();
    let controller = open_groceries(&store).await;

    let release = store.hold_next(StoreOp::Delete);
    {
        let delete = controller.delete();
        tokio::pin!(delete);
        assert!(futures::poll!(&mut delete).is_pending());
        assert_eq!(controller.mode(), NoteMode::Deleting);
    }
    drop(release);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.mode, NoteMode::Viewing);
    assert!(!snapshot.is_busy);
    assert!(stored_field(&store, "n1", "id").is_some());

    controller.delete().await.unwrap();
    assert_eq!(controller.mode(), NoteMode::Closed);
}

#[tokio::test]
async fn dropped_open_leaves_controller_reopenable() {
    let store = seeded_store();
    let controller = NoteController::new(store.service());

    let release = store.hold_next(StoreOp::Get);
    {
        let open = controller.open(NoteId::new("n1"));
        tokio::pin!(open);
        assert!(futures::poll!(&mut open).is_pending());
    }
    drop(release);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.mode, NoteMode::Loading);
    assert!(!snapshot.is_busy);

    controller.open(NoteId::new("n2")).await.unwrap();
    assert_eq!(controller.snapshot().draft, Some(NoteDraft::new("Books", "Dune")));
}
