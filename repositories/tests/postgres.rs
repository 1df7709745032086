use bulk_loader::{BulkInsert, ImportRecord, InsertError, Violation};
use ids::ThemeId;
use optional_field::Field;
use repositories::postgres::ConnectionDetails;
use repositories::postgres::initializer::RepoCreator;
use repositories::postgres::sets::SetRepo;
use repositories::postgres::themes::ThemeRepo;
use routing::list_criteria::ListFilter;
use routing::pagination::Pagination;
use rstest::{fixture, rstest};
use sets_core::SetRepository;
use sets_core::list_filter::SetFilter;
use sets_core::model::NewSet;
use testcontainers_modules::{
    postgres::Postgres,
    testcontainers::{ContainerAsync, runners::AsyncRunner},
};
use themes_core::ThemeRepository;
use themes_core::list_filter::ThemeFilter;
use themes_core::model::{NewTheme, PatchTheme};
use themes_core::result::Reason;

struct TestRuntime {
    _container: ContainerAsync<Postgres>,
    themes: ThemeRepo,
    sets: SetRepo,
}

#[fixture]
async fn runtime() -> TestRuntime {
    let container = Postgres::default()
        .with_db_name("catalog")
        .with_user("testuser")
        .with_password("testpass")
        .start()
        .await
        .unwrap();
    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(5432).await.unwrap();

    let (themes, sets) = RepoCreator::new()
        .with_sets()
        .create(
            ConnectionDetails::Url(format!(
                "postgresql://testuser:testpass@{host}:{port}/catalog"
            )),
            Some(2),
        )
        .await
        .unwrap();

    TestRuntime {
        _container: container,
        themes,
        sets,
    }
}

fn id(id: i64) -> ThemeId {
    ThemeId::new(id)
}

async fn seed(themes: &ThemeRepo) {
    themes
        .bulk_insert(vec![
            ImportRecord::root(id(1), "Town"),
            ImportRecord::child(id(2), "Police", id(1)),
            ImportRecord::child(id(3), "Harbour", id(2)),
        ])
        .await
        .unwrap();
}

#[rstest]
#[ignore = "requires a docker daemon"]
#[tokio::test]
async fn get_no_data_returns_none(#[future(awt)] runtime: TestRuntime) {
    assert!(runtime.themes.get(id(1)).await.unwrap().is_none());
}

#[rstest]
#[ignore = "requires a docker daemon"]
#[tokio::test]
async fn create_after_import_does_not_reuse_ids(#[future(awt)] runtime: TestRuntime) {
    seed(&runtime.themes).await;

    let created = runtime
        .themes
        .create(NewTheme::new("Fire", Some(id(1))))
        .await
        .unwrap();

    assert_eq!(id(4), created.id);
    assert_eq!(Some(created.clone()), runtime.themes.get(created.id).await.unwrap());
}

#[rstest]
#[ignore = "requires a docker daemon"]
#[tokio::test]
async fn create_with_unknown_parent_is_parent_not_found(#[future(awt)] runtime: TestRuntime) {
    let err = runtime
        .themes
        .create(NewTheme::new("Fire", Some(id(42))))
        .await
        .unwrap_err();

    assert_eq!(Reason::ParentNotFound, err.current_context().reason());
}

#[rstest]
#[ignore = "requires a docker daemon"]
#[tokio::test]
async fn list_children_of_a_theme(#[future(awt)] runtime: TestRuntime) {
    seed(&runtime.themes).await;

    let children = runtime
        .themes
        .list(ThemeFilter::criteria(Pagination::default()).with(ThemeFilter::Parent(Some(id(2)))))
        .await
        .unwrap();

    assert_eq!(vec![id(3)], children.iter().map(|t| t.id).collect::<Vec<_>>());
}

#[rstest]
#[ignore = "requires a docker daemon"]
#[tokio::test]
async fn patch_under_descendant_is_cyclic(#[future(awt)] runtime: TestRuntime) {
    seed(&runtime.themes).await;

    let err = runtime
        .themes
        .patch(id(1), PatchTheme::new(None, Field::Present(Some(id(3)))))
        .await
        .unwrap_err();

    assert_eq!(Reason::CyclicParent, err.current_context().reason());
}

#[rstest]
#[ignore = "requires a docker daemon"]
#[tokio::test]
async fn duplicate_theme_id_rolls_back_the_batch(#[future(awt)] runtime: TestRuntime) {
    seed(&runtime.themes).await;

    let err = runtime
        .themes
        .bulk_insert(vec![
            ImportRecord::root(id(10), "Castle"),
            ImportRecord::root(id(1), "Town"),
        ])
        .await
        .unwrap_err();

    assert_eq!(
        InsertError::Constraint(Violation::DuplicateKey),
        *err.current_context()
    );
    assert!(runtime.themes.get(id(10)).await.unwrap().is_none());
}

#[rstest]
#[ignore = "requires a docker daemon"]
#[tokio::test]
async fn deleting_a_theme_removes_descendant_sets(#[future(awt)] runtime: TestRuntime) {
    seed(&runtime.themes).await;
    runtime
        .sets
        .bulk_insert(vec![NewSet::new(
            "6540-1",
            "Pier Police",
            1991,
            335,
            "https://images.example.com/6540-1.jpg",
            id(3),
        )])
        .await
        .unwrap();

    runtime.themes.delete(id(1)).await.unwrap().unwrap();

    assert!(
        runtime
            .sets
            .list(SetFilter::criteria(Pagination::default()))
            .await
            .unwrap()
            .is_empty()
    );
}

#[rstest]
#[ignore = "requires a docker daemon"]
#[tokio::test]
async fn set_with_unknown_theme_is_a_missing_reference(#[future(awt)] runtime: TestRuntime) {
    let err = runtime
        .sets
        .bulk_insert(vec![NewSet::new(
            "6540-1",
            "Pier Police",
            1991,
            335,
            "https://images.example.com/6540-1.jpg",
            id(3),
        )])
        .await
        .unwrap_err();

    assert_eq!(
        InsertError::Constraint(Violation::MissingReference),
        *err.current_context()
    );
}
