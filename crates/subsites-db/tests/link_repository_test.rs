//! Integration tests for cross-subsite link edges and related records.

use serde_json::json;
use subsites_core::SubsiteId;
use subsites_core::models::page::NewPage;
use subsites_core::models::related::CreateRelatedRecord;
use subsites_core::repository::{CrossLinkRepository, PageRepository, RelatedRecordRepository};
use subsites_db::repository::{
    SurrealCrossLinkRepository, SurrealPageRepository, SurrealRelatedRecordRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    subsites_db::run_migrations(&db).await.unwrap();
    db
}

#[tokio::test]
async fn replace_links_overwrites_previous_set() {
    let db = setup().await;
    let pages = SurrealPageRepository::new(db.clone());
    let links = SurrealCrossLinkRepository::new(db);

    let other = SubsiteId::new_v4();
    let source = pages
        .create(NewPage::new("Page", "Source", "source").with_subsite(SubsiteId::MAIN))
        .await
        .unwrap();
    let first = pages
        .create(NewPage::new("Page", "First", "first").with_subsite(other))
        .await
        .unwrap();
    let second = pages
        .create(NewPage::new("Page", "Second", "second").with_subsite(other))
        .await
        .unwrap();

    links
        .replace_links(source.id, "Content", &[first.id, first.id, second.id])
        .await
        .unwrap();
    let found = links.links_from(source.id).await.unwrap();
    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|l| l.field_name == "Content"));

    links
        .replace_links(source.id, "Content", &[second.id])
        .await
        .unwrap();
    let found = links.links_from(source.id).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].target_id, second.id);

    links.replace_links(source.id, "Content", &[]).await.unwrap();
    assert!(links.links_from(source.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn related_records_are_listed_per_owner_and_relation() {
    let db = setup().await;
    let repo = SurrealRelatedRecordRepository::new(db);
    let owner = uuid::Uuid::new_v4();

    repo.create(CreateRelatedRecord {
        owner_id: owner,
        relation: "Attachments".into(),
        data: json!({"file": "a.pdf"}),
    })
    .await
    .unwrap();
    repo.create(CreateRelatedRecord {
        owner_id: owner,
        relation: "Tags".into(),
        data: json!({"name": "news"}),
    })
    .await
    .unwrap();

    let attachments = repo.list_for_owner(owner, "Attachments").await.unwrap();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].data["file"], "a.pdf");

    let copy = attachments[0].duplicate_for(uuid::Uuid::new_v4());
    assert_eq!(copy.relation, "Attachments");
}
