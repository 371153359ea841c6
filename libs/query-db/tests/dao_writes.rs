mod common;

use anyhow::Result;
use common::{bring_up, bring_up_people, create_tables, new_person, person};
use query_core::{DirectiveSet, Operator};
use query_db::{connect, DaoError, DatabaseConfig, DynamicDao};
use sea_orm::{ActiveValue::Set, IntoActiveModel, TransactionTrait};
use tracing_test::traced_test;

#[tokio::test]
async fn save_inserts_then_merges() -> Result<()> {
    let dao = bring_up().await?;

    let saved = dao
        .save::<person::ActiveModel, _>(new_person(7, "Gina", "Lopez", 33, None))
        .await?;
    assert_eq!(saved.id, 7);
    assert_eq!(dao.count_all::<person::Entity>().await?, 1);

    let mut changed = saved.clone();
    changed.age = 34;
    changed.email = Some("gina@example.com".into());
    let merged = dao.save::<person::ActiveModel, _>(changed.clone()).await?;
    assert_eq!(merged, changed);
    assert_eq!(dao.count_all::<person::Entity>().await?, 1);

    let stored = dao.get_by_key::<person::Entity, _>(7).await?;
    assert_eq!(stored.age, 34);
    Ok(())
}

#[tokio::test]
async fn insert_of_stored_key_is_a_conflict() -> Result<()> {
    let dao = bring_up_people().await?;

    let err = dao
        .insert::<person::ActiveModel, _>(new_person(1, "Imposter", "Smith", 99, None))
        .await
        .unwrap_err();
    assert!(matches!(err, DaoError::Conflict { .. }), "unexpected error: {err}");

    let anna = dao.get_by_key::<person::Entity, _>(1).await?;
    assert_eq!(anna.name, "Anna");
    assert_eq!(anna.age, 15);
    assert_eq!(dao.count_all::<person::Entity>().await?, 5);

    let fresh = dao
        .insert::<person::ActiveModel, _>(new_person(6, "Femi", "Okoro", 22, None))
        .await?;
    assert_eq!(fresh.id, 6);
    assert_eq!(dao.count_all::<person::Entity>().await?, 6);
    Ok(())
}

#[tokio::test]
async fn save_is_idempotent() -> Result<()> {
    let dao = bring_up_people().await?;
    let anna = dao.get_by_key::<person::Entity, _>(1).await?;

    let first = dao.save::<person::ActiveModel, _>(anna.clone()).await?;
    let second = dao.save::<person::ActiveModel, _>(anna.clone()).await?;

    assert_eq!(first, anna);
    assert_eq!(second, anna);
    assert_eq!(dao.count_all::<person::Entity>().await?, 5);
    Ok(())
}

#[tokio::test]
async fn find_and_get_by_key() -> Result<()> {
    let dao = bring_up_people().await?;

    let found = dao.find_by_key::<person::Entity, _>(3).await?;
    assert_eq!(found.map(|p| p.name), Some("Chloé".to_owned()));
    assert!(dao.find_by_key::<person::Entity, _>(42).await?.is_none());

    let err = dao.get_by_key::<person::Entity, _>(42).await.unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err}");
    Ok(())
}

#[tokio::test]
async fn contains_checks_by_key() -> Result<()> {
    let dao = bring_up_people().await?;
    let mut bruno = dao.get_by_key::<person::Entity, _>(2).await?;
    assert!(dao.contains::<person::Entity>(&bruno).await?);

    bruno.id = 99;
    assert!(!dao.contains::<person::Entity>(&bruno).await?);

    assert!(dao.contains_active(&new_person(2, "x", "y", 0, None)).await?);
    assert!(!dao.contains_active(&person::ActiveModel::default()).await?);
    Ok(())
}

#[tokio::test]
async fn remove_deletes_the_stored_record() -> Result<()> {
    let dao = bring_up_people().await?;
    let eve = dao.get_by_key::<person::Entity, _>(5).await?;

    dao.remove::<person::Entity>(&eve).await?;
    assert!(!dao.contains::<person::Entity>(&eve).await?);
    assert_eq!(dao.count_all::<person::Entity>().await?, 4);

    dao.remove_by_key::<person::Entity, _>(1).await?;
    assert_eq!(dao.count_all::<person::Entity>().await?, 3);
    Ok(())
}

#[tokio::test]
async fn remove_missing_record_is_not_found() -> Result<()> {
    let dao = bring_up_people().await?;
    let ghost = person::Model {
        id: 77,
        name: "Ghost".into(),
        surname: "None".into(),
        age: 1,
        email: None,
    };

    let err = dao.remove::<person::Entity>(&ghost).await.unwrap_err();
    assert!(matches!(err, DaoError::NotFound { .. }), "unexpected error: {err}");

    let err = dao
        .remove_by_key::<person::Entity, _>(77)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    assert_eq!(dao.count_all::<person::Entity>().await?, 5);
    Ok(())
}

#[tokio::test]
async fn transaction_rollback_discards_writes() -> Result<()> {
    let conn = connect(&DatabaseConfig::default()).await?;
    create_tables(&conn).await?;

    let txn = conn.begin().await?;
    let dao = DynamicDao::new(txn);
    dao.save::<person::ActiveModel, _>(new_person(1, "Temp", "Row", 20, None))
        .await?;
    assert_eq!(dao.count_all::<person::Entity>().await?, 1);
    dao.into_inner().rollback().await?;

    let dao = DynamicDao::new(conn);
    assert_eq!(dao.count_all::<person::Entity>().await?, 0);
    Ok(())
}

#[tokio::test]
async fn transaction_commit_keeps_writes() -> Result<()> {
    let conn = connect(&DatabaseConfig::default()).await?;
    create_tables(&conn).await?;

    let txn = conn.begin().await?;
    let dao = DynamicDao::new(txn);
    let mut model = new_person(1, "Kept", "Row", 20, None);
    model.age = Set(21);
    dao.save::<person::ActiveModel, _>(model).await?;
    dao.into_inner().commit().await?;

    let dao = DynamicDao::new(conn);
    let kept = dao.get_by_key::<person::Entity, _>(1).await?;
    assert_eq!(kept.age, 21);
    Ok(())
}

#[traced_test]
#[tokio::test]
async fn dropped_directives_are_logged() -> Result<()> {
    let dao = bring_up_people().await?;
    let set = DirectiveSet::new()
        .filter("password", Operator::Equal, ["x"])
        .filter("age", Operator::Equal, ["eighteen"]);

    assert_eq!(dao.count::<person::Entity>(&set).await?, 5);
    assert!(logs_contain("dropping filter on non-queryable attribute"));
    assert!(logs_contain("dropping filter"));
    assert!(logs_contain("eighteen"));
    Ok(())
}

#[tokio::test]
async fn model_converts_into_saveable_active_model() -> Result<()> {
    let dao = bring_up_people().await?;
    let mut dmitri = dao
        .get_by_key::<person::Entity, _>(4)
        .await?
        .into_active_model();
    dmitri.surname = Set("Smith".into());
    dao.save::<person::ActiveModel, _>(dmitri).await?;

    let set = DirectiveSet::new().filter("surname", Operator::Equal, ["Smith"]);
    assert_eq!(dao.count::<person::Entity>(&set).await?, 2);
    Ok(())
}
