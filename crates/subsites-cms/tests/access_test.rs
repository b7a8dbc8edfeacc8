//! Integration tests for subsite access checks backed by stored grants.

use subsites_cms::{AccessEvaluator, SubsitesConfig};
use subsites_core::models::page::NewPage;
use subsites_core::models::subsite::CreateSubsite;
use subsites_core::repository::{PageRepository, SubsiteRepository};
use subsites_core::{Principal, SubsiteId, TenantContext};
use subsites_db::repository::{
    SurrealGrantRepository, SurrealPageRepository, SurrealSubsiteRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

const EDIT: &str = "CMS_ACCESS_CMSMain";

struct Fixture {
    access: AccessEvaluator<SurrealGrantRepository<Db>>,
    grants: SurrealGrantRepository<Db>,
    pages: SurrealPageRepository<Db>,
    subsites: SurrealSubsiteRepository<Db>,
}

async fn setup() -> Fixture {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    subsites_db::run_migrations(&db).await.unwrap();

    Fixture {
        access: AccessEvaluator::new(
            SurrealGrantRepository::new(db.clone()),
            &SubsitesConfig::default(),
        ),
        grants: SurrealGrantRepository::new(db.clone()),
        pages: SurrealPageRepository::new(db.clone()),
        subsites: SurrealSubsiteRepository::new(db),
    }
}

async fn subsite(f: &Fixture, title: &str, is_default: bool, blacklist: &[&str]) -> SubsiteId {
    f.subsites
        .create(CreateSubsite {
            title: title.into(),
            domains: vec![],
            is_default,
            theme: None,
            page_type_blacklist: blacklist.iter().map(|t| t.to_string()).collect(),
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn edit_access_follows_the_page_subsite() {
    let f = setup().await;
    let a = subsite(&f, "A", false, &[]).await;
    let b = subsite(&f, "B", false, &[]).await;
    let member = Uuid::new_v4();
    f.grants.grant(member, a, EDIT).await.unwrap();

    let page_a = f
        .pages
        .create(NewPage::new("Page", "A", "a").with_subsite(a))
        .await
        .unwrap();
    let page_b = f
        .pages
        .create(NewPage::new("Page", "B", "b").with_subsite(b))
        .await
        .unwrap();

    let ctx = TenantContext::for_subsite(b);
    let principal = Principal::Member(member);
    assert!(f.access.can_edit(&ctx, &principal, &page_a).await.unwrap());
    assert!(!f.access.can_edit(&ctx, &principal, &page_b).await.unwrap());
    assert!(f.access.can_delete(&ctx, &principal, &page_a).await.unwrap());
    assert!(!f.access.can_publish(&ctx, &principal, &page_b).await.unwrap());
    assert!(!f.access.can_add_children(&ctx, &principal, &page_b).await.unwrap());
}

#[tokio::test]
async fn main_site_grant_edits_everything() {
    let f = setup().await;
    let a = subsite(&f, "A", false, &[]).await;
    let admin = Uuid::new_v4();
    f.grants.grant(admin, SubsiteId::MAIN, EDIT).await.unwrap();

    let page = f
        .pages
        .create(NewPage::new("Page", "A", "a").with_subsite(a))
        .await
        .unwrap();
    assert!(
        f.access
            .can_edit(&TenantContext::new(), &Principal::Member(admin), &page)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn anonymous_is_denied() {
    let f = setup().await;
    let page = f
        .pages
        .create(NewPage::new("Page", "Home", "home").with_subsite(SubsiteId::MAIN))
        .await
        .unwrap();
    assert!(
        !f.access
            .can_edit(&TenantContext::new(), &Principal::Anonymous, &page)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn unsaved_pages_fall_back_to_the_context() {
    let f = setup().await;
    let a = subsite(&f, "A", false, &[]).await;
    let member = Uuid::new_v4();
    f.grants.grant(member, a, EDIT).await.unwrap();
    let principal = Principal::Member(member);
    let draft = NewPage::new("Page", "Unsaved", "unsaved");

    assert!(
        f.access
            .can_edit(&TenantContext::for_subsite(a), &principal, &draft)
            .await
            .unwrap()
    );
    assert!(
        !f.access
            .can_edit(&TenantContext::new(), &principal, &draft)
            .await
            .unwrap()
    );

    // No resolvable subsite at all denies.
    let ctx = TenantContext::from_request_value(Some("garbage"));
    assert!(!f.access.can_edit(&ctx, &principal, &draft).await.unwrap());
}

#[tokio::test]
async fn create_respects_the_blacklist() {
    let f = setup().await;
    let a = subsite(&f, "A", false, &["BlogHolder"]).await;
    let member = Uuid::new_v4();
    f.grants.grant(member, a, EDIT).await.unwrap();
    let principal = Principal::Member(member);
    let ctx = TenantContext::for_subsite(a);

    assert!(
        !f.access
            .can_create(&ctx, &f.subsites, &principal, "BlogHolder")
            .await
            .unwrap()
    );
    assert!(
        f.access
            .can_create(&ctx, &f.subsites, &principal, "Page")
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn copy_targets_only_from_template_sites() {
    let f = setup().await;
    let template = subsite(&f, "Template", true, &[]).await;
    let a = subsite(&f, "A", false, &[]).await;
    let b = subsite(&f, "B", false, &[]).await;
    let member = Uuid::new_v4();
    f.grants.grant(member, a, EDIT).await.unwrap();
    let principal = Principal::Member(member);

    let main_page = f
        .pages
        .create(NewPage::new("Page", "Home", "home").with_subsite(SubsiteId::MAIN))
        .await
        .unwrap();
    let template_page = f
        .pages
        .create(NewPage::new("Page", "Home", "home").with_subsite(template))
        .await
        .unwrap();
    let page_b = f
        .pages
        .create(NewPage::new("Page", "Home", "home").with_subsite(b))
        .await
        .unwrap();

    let targets = f
        .access
        .copy_targets(&f.subsites, &principal, &main_page)
        .await
        .unwrap();
    assert_eq!(targets, vec![a]);

    let targets = f
        .access
        .copy_targets(&f.subsites, &principal, &template_page)
        .await
        .unwrap();
    assert_eq!(targets, vec![a]);

    assert!(
        f.access
            .copy_targets(&f.subsites, &principal, &page_b)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn default_subsite_pages_can_be_copied_to_main() {
    let f = setup().await;
    let template = subsite(&f, "Template", true, &[]).await;
    let a = subsite(&f, "A", false, &[]).await;
    let admin = Uuid::new_v4();
    let editor = Uuid::new_v4();
    f.grants.grant(admin, SubsiteId::MAIN, EDIT).await.unwrap();
    f.grants.grant(editor, a, EDIT).await.unwrap();

    let template_page = f
        .pages
        .create(NewPage::new("Page", "Home", "home").with_subsite(template))
        .await
        .unwrap();

    let targets = f
        .access
        .copy_targets(&f.subsites, &Principal::Member(admin), &template_page)
        .await
        .unwrap();
    assert_eq!(targets, vec![SubsiteId::MAIN, a]);

    // Access to a single subsite does not open up the main site.
    let targets = f
        .access
        .copy_targets(&f.subsites, &Principal::Member(editor), &template_page)
        .await
        .unwrap();
    assert_eq!(targets, vec![a]);
}
