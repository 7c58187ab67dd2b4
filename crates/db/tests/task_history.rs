//! Transactional guarantees of the task history: events are written and
//! removed together with the row they describe.

use sqlx::PgPool;
use taskboard_core::roles::Role;
use taskboard_core::task::{creation_actions, TaskStatus};
use taskboard_db::models::project::CreateProject;
use taskboard_db::models::task::CreateTask;
use taskboard_db::models::user::CreateUser;
use taskboard_db::repositories::{ProjectRepo, TaskRepo, TimelineRepo, UserRepo};

async fn seed_task(pool: &PgPool) -> (i64, i64) {
    let user = UserRepo::create(
        pool,
        &CreateUser {
            first_name: "Jack".into(),
            last_name: "Doe".into(),
            email: "admin@example.com".into(),
            password_hash: "hash".into(),
            role: Role::Admin,
        },
    )
    .await
    .unwrap();
    let project = ProjectRepo::create(
        pool,
        &CreateProject {
            title: "P1".into(),
            description: "Project one".into(),
        },
    )
    .await
    .unwrap();

    let mut tx = pool.begin().await.unwrap();
    let task = TaskRepo::create(
        &mut *tx,
        &CreateTask {
            title: "T1".into(),
            description: None,
            priority: None,
            project_id: project.id,
            assignee_id: user.id,
        },
    )
    .await
    .unwrap();
    TimelineRepo::create_many(&mut *tx, task.id, user.id, &creation_actions())
        .await
        .unwrap();
    tx.commit().await.unwrap();

    (task.id, user.id)
}

#[sqlx::test(migrations = "./migrations")]
async fn test_rolled_back_delete_leaves_task_and_events(pool: PgPool) {
    let (task_id, _) = seed_task(&pool).await;

    let mut tx = pool.begin().await.unwrap();
    let removed = TimelineRepo::delete_for_task(&mut *tx, task_id).await.unwrap();
    assert_eq!(removed, 2);
    assert!(TaskRepo::delete(&mut *tx, task_id).await.unwrap());
    tx.rollback().await.unwrap();

    assert!(TaskRepo::exists(&pool, task_id).await.unwrap());
    assert_eq!(TimelineRepo::count_for_task(&pool, task_id).await.unwrap(), 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_committed_delete_removes_everything(pool: PgPool) {
    let (task_id, _) = seed_task(&pool).await;

    let mut tx = pool.begin().await.unwrap();
    TimelineRepo::delete_for_task(&mut *tx, task_id).await.unwrap();
    TaskRepo::delete(&mut *tx, task_id).await.unwrap();
    tx.commit().await.unwrap();

    assert!(!TaskRepo::exists(&pool, task_id).await.unwrap());
    assert_eq!(TimelineRepo::count_for_task(&pool, task_id).await.unwrap(), 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_status_write_and_event_share_a_transaction(pool: PgPool) {
    let (task_id, actor_id) = seed_task(&pool).await;

    let mut tx = pool.begin().await.unwrap();
    TaskRepo::update_status(&mut *tx, task_id, TaskStatus::Done)
        .await
        .unwrap();
    TimelineRepo::create_many(
        &mut *tx,
        task_id,
        actor_id,
        &[TaskStatus::Done.transition_action()],
    )
    .await
    .unwrap();
    drop(tx);

    let task = TaskRepo::find_by_id(&pool, task_id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Todo, "dropped transaction rolls back");
    assert_eq!(TimelineRepo::count_for_task(&pool, task_id).await.unwrap(), 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_many_preserves_order(pool: PgPool) {
    let (task_id, _) = seed_task(&pool).await;
    let entries = TimelineRepo::list_for_task(&pool, task_id).await.unwrap();
    let actions: Vec<_> = entries.iter().map(|e| e.event.action).collect();
    let mut expected = creation_actions().to_vec();
    expected.reverse();
    assert_eq!(actions, expected, "newest first");
}
