mod common;

use std::sync::atomic::Ordering;

use clinic_backend::{
    models::audit::{AuditAction, AuditLogQuery, NewAuditLog},
    services::rbac_service::PermAuditRead,
};
use common::TestApp;
use uuid::Uuid;

async fn seed(app: &TestApp, user_id: Uuid, module: &str, count: usize) {
    for i in 0..count {
        app.state
            .audit_logger
            .record(NewAuditLog::new(user_id, AuditAction::View, module).entity(i, format!("#{i}")))
            .await;
    }
}

#[tokio::test]
async fn list_is_newest_first_and_filtered() {
    let app = TestApp::new().await;
    let grant = app.admin_grant::<PermAuditRead>().await;
    let other = Uuid::new_v4();
    seed(&app, app.admin.id, "inventory", 3).await;
    seed(&app, other, "patients", 2).await;

    let logger = &app.state.audit_logger;
    let all = logger.list(&grant, AuditLogQuery::default()).await.unwrap();
    assert_eq!(all.len(), 5);
    assert_eq!(all[0].module, "patients");
    assert_eq!(all[0].entity_id.as_deref(), Some("1"));

    let inventory = logger
        .list(
            &grant,
            AuditLogQuery {
                module: Some("inventory".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(inventory.len(), 3);

    let by_user = logger
        .list(
            &grant,
            AuditLogQuery {
                user_id: Some(other),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(by_user.iter().all(|e| e.user_id == Some(other)));
    assert_eq!(by_user.len(), 2);
}

#[tokio::test]
async fn limit_is_clamped() {
    let app = TestApp::new().await;
    let grant = app.admin_grant::<PermAuditRead>().await;
    seed(&app, app.admin.id, "inventory", 4).await;

    let logger = &app.state.audit_logger;
    let at_least_one = logger
        .list(
            &grant,
            AuditLogQuery {
                limit: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(at_least_one.len(), 1);

    let two = logger
        .list(
            &grant,
            AuditLogQuery {
                limit: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(two.len(), 2);

    let huge = logger
        .list(
            &grant,
            AuditLogQuery {
                limit: Some(1_000_000),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(huge.len(), 4);
}

#[tokio::test]
async fn record_swallows_store_failures() {
    let app = TestApp::new().await;
    app.store.fail_audit.store(true, Ordering::SeqCst);

    // Não entra em pânico nem devolve erro
    seed(&app, app.admin.id, "inventory", 2).await;
    assert!(app.store.audit_entries().is_empty());

    app.store.fail_audit.store(false, Ordering::SeqCst);
    seed(&app, app.admin.id, "inventory", 1).await;
    assert_eq!(app.store.audit_entries().len(), 1);
}

#[tokio::test]
async fn empty_change_sets_are_stored_as_absent() {
    let app = TestApp::new().await;

    app.state
        .audit_logger
        .record(
            NewAuditLog::new(app.admin.id, AuditAction::Update, "settings")
                .changes(Default::default()),
        )
        .await;

    let entries = app.store.audit_entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].changes.is_none());
}
