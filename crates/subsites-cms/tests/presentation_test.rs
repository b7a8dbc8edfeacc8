//! Integration tests for presentation helpers and site config lookup.

use subsites_cms::{Presenter, SiteConfigResolver, SubsitesConfig};
use subsites_core::models::page::{NewPage, Page};
use subsites_core::models::subsite::{CreateSubsite, SubsiteDomain};
use subsites_core::repository::{PageRepository, SubsiteRepository};
use subsites_core::{SubsiteId, TenantContext};
use subsites_db::repository::{
    SurrealPageRepository, SurrealSiteConfigRepository, SurrealSubsiteRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

struct Fixture {
    db: Surreal<Db>,
    presenter: Presenter<SurrealSubsiteRepository<Db>>,
    sub2: SubsiteId,
    main_page: Page,
    sub_page: Page,
}

async fn setup() -> Fixture {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    subsites_db::run_migrations(&db).await.unwrap();

    let subsites = SurrealSubsiteRepository::new(db.clone());
    let sub2 = subsites
        .create(CreateSubsite {
            title: "Second".into(),
            domains: vec![
                SubsiteDomain {
                    domain: "*.example.net".into(),
                    is_primary: false,
                },
                SubsiteDomain {
                    domain: "sub2.example.com".into(),
                    is_primary: true,
                },
            ],
            is_default: false,
            theme: Some("simple".into()),
            page_type_blacklist: vec![],
        })
        .await
        .unwrap()
        .id;

    let pages = SurrealPageRepository::new(db.clone());
    let main_page = pages
        .create(NewPage::new("Page", "Home", "home").with_subsite(SubsiteId::MAIN))
        .await
        .unwrap();
    let sub_page = pages
        .create(NewPage::new("Page", "About", "about-us").with_subsite(sub2))
        .await
        .unwrap();

    Fixture {
        presenter: Presenter::new(subsites, SubsitesConfig::default()),
        db,
        sub2,
        main_page,
        sub_page,
    }
}

#[tokio::test]
async fn meta_tag_names_the_page_subsite() {
    let f = setup().await;

    assert_eq!(f.presenter.meta_tags(&f.main_page), "");
    assert_eq!(
        f.presenter.meta_tags(&f.sub_page),
        format!("<meta name=\"x-subsite-id\" content=\"{}\" />\n", f.sub2)
    );
}

#[tokio::test]
async fn cache_key_follows_the_context() {
    let f = setup().await;

    assert_eq!(f.presenter.cache_key_component(&TenantContext::new()), "subsite-0");
    assert_eq!(
        f.presenter.cache_key_component(&TenantContext::for_subsite(f.sub2)),
        format!("subsite-{}", f.sub2)
    );
}

#[tokio::test]
async fn links_move_onto_the_primary_domain() {
    let f = setup().await;

    let link = f
        .presenter
        .absolute_link(&f.sub_page, "http://localhost/about-us/")
        .await
        .unwrap();
    assert_eq!(link, "http://sub2.example.com/about-us/");

    let unchanged = f
        .presenter
        .absolute_link(&f.main_page, "http://localhost/home/")
        .await
        .unwrap();
    assert_eq!(unchanged, "http://localhost/home/");

    let preview = f
        .presenter
        .preview_link(&f.sub_page, "/about-us/")
        .await
        .unwrap();
    assert_eq!(
        preview,
        format!("http://sub2.example.com/about-us/?SubsiteID={}", f.sub2)
    );
}

#[tokio::test]
async fn url_prefix_uses_domain_and_parent() {
    let f = setup().await;

    assert_eq!(
        f.presenter.url_prefix(&f.sub_page, Some("/company/")).await.unwrap(),
        Some("http://sub2.example.com/company/".to_string())
    );
    assert_eq!(
        f.presenter.url_prefix(&f.sub_page, None).await.unwrap(),
        Some("http://sub2.example.com/".to_string())
    );
    assert_eq!(f.presenter.url_prefix(&f.main_page, None).await.unwrap(), None);
}

#[tokio::test]
async fn theme_comes_from_the_current_subsite() {
    let f = setup().await;
    assert_eq!(
        f.presenter
            .theme_for(&TenantContext::for_subsite(f.sub2))
            .await
            .unwrap()
            .as_deref(),
        Some("simple")
    );
    assert_eq!(f.presenter.theme_for(&TenantContext::new()).await.unwrap(), None);
}

#[tokio::test]
async fn site_config_is_created_lazily_for_subsite_pages() {
    let f = setup().await;
    let config = SubsitesConfig::default();
    let resolver = SiteConfigResolver::new(SurrealSiteConfigRepository::new(f.db.clone()), &config);

    assert!(resolver.site_config_for(&f.main_page).await.unwrap().is_none());

    let created = resolver.site_config_for(&f.sub_page).await.unwrap().unwrap();
    assert_eq!(created.subsite_id, f.sub2);
    assert_eq!(created.title, "Your Site Name");
    assert_eq!(created.tagline, "Your tagline here");

    let again = resolver.site_config_for(&f.sub_page).await.unwrap().unwrap();
    assert_eq!(again.id, created.id);
}
