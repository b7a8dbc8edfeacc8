//! Integration tests for scoped page reads and write-time binding.

use subsites_cms::PageService;
use subsites_core::models::page::{NewPage, Stage};
use subsites_core::models::subsite::CreateSubsite;
use subsites_core::repository::SubsiteRepository;
use subsites_core::{PageQuery, SubsiteId, SubsitesError, TenantContext};
use subsites_db::repository::{SurrealPageRepository, SurrealSubsiteRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

type Service = PageService<SurrealPageRepository<Db>, SurrealSubsiteRepository<Db>>;

async fn setup() -> (Service, SurrealSubsiteRepository<Db>) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    subsites_db::run_migrations(&db).await.unwrap();

    let service = PageService::new(
        SurrealPageRepository::new(db.clone()),
        SurrealSubsiteRepository::new(db.clone()),
    );
    (service, SurrealSubsiteRepository::new(db))
}

async fn subsite(
    repo: &SurrealSubsiteRepository<Db>,
    title: &str,
    blacklist: &[&str],
) -> SubsiteId {
    repo.create(CreateSubsite {
        title: title.into(),
        domains: vec![],
        is_default: false,
        theme: None,
        page_type_blacklist: blacklist.iter().map(|t| t.to_string()).collect(),
    })
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn created_pages_take_the_current_subsite() {
    let (service, subsites) = setup().await;
    let a = subsite(&subsites, "A", &[]).await;
    let ctx = TenantContext::for_subsite(a);

    let page = service
        .create(&ctx, NewPage::new("Page", "Home", "home"))
        .await
        .unwrap();
    assert_eq!(page.subsite_id, a);

    let explicit = service
        .create(
            &ctx,
            NewPage::new("Page", "Main home", "home").with_subsite(SubsiteId::MAIN),
        )
        .await
        .unwrap();
    assert!(explicit.is_main_site());
}

#[tokio::test]
async fn reads_never_cross_into_other_subsites() {
    let (service, subsites) = setup().await;
    let a = subsite(&subsites, "A", &[]).await;
    let b = subsite(&subsites, "B", &[]).await;

    let page_b = service
        .create(&TenantContext::for_subsite(b), NewPage::new("Page", "Team", "team"))
        .await
        .unwrap();

    let ctx_a = TenantContext::for_subsite(a);
    assert!(
        service
            .get_by_url_segment(&ctx_a, Stage::Draft, "team")
            .await
            .unwrap()
            .is_none()
    );
    assert!(service.children(&ctx_a, None).await.unwrap().is_empty());

    // Identity reads are allowed across subsites.
    let fetched = service.get(&ctx_a, Stage::Draft, page_b.id).await.unwrap();
    assert_eq!(fetched.id, page_b.id);

    // So are queries that opt out.
    let all = service
        .find(&ctx_a, PageQuery::draft().without_subsite_filter())
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn indeterminate_context_fails_open() {
    let (service, subsites) = setup().await;
    let a = subsite(&subsites, "A", &[]).await;
    service
        .create(&TenantContext::for_subsite(a), NewPage::new("Page", "Team", "team"))
        .await
        .unwrap();
    service
        .create(&TenantContext::new(), NewPage::new("Page", "Team", "team"))
        .await
        .unwrap();

    let ctx = TenantContext::from_request_value(Some("not-a-subsite"));
    let pages = service.find(&ctx, PageQuery::draft()).await.unwrap();
    assert_eq!(pages.len(), 2);
}

#[tokio::test]
async fn blacklisted_page_types_are_refused() {
    let (service, subsites) = setup().await;
    let a = subsite(&subsites, "A", &["BlogHolder"]).await;
    let ctx = TenantContext::for_subsite(a);

    let err = service
        .create(&ctx, NewPage::new("BlogHolder", "Blog", "blog"))
        .await
        .unwrap_err();
    assert!(matches!(err, SubsitesError::Validation { .. }));

    service
        .create(&ctx, NewPage::new("Page", "About", "about"))
        .await
        .unwrap();
}

#[tokio::test]
async fn published_pages_are_scoped_too() {
    let (service, subsites) = setup().await;
    let a = subsite(&subsites, "A", &[]).await;
    let b = subsite(&subsites, "B", &[]).await;
    let ctx_a = TenantContext::for_subsite(a);

    let page = service
        .create(&ctx_a, NewPage::new("Page", "News", "news"))
        .await
        .unwrap();
    service.publish(page.id).await.unwrap();

    assert!(
        service
            .get_by_url_segment(&ctx_a, Stage::Live, "news")
            .await
            .unwrap()
            .is_some()
    );
    assert!(
        service
            .get_by_url_segment(&TenantContext::for_subsite(b), Stage::Live, "news")
            .await
            .unwrap()
            .is_none()
    );
}
