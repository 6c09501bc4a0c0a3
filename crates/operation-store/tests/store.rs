use std::{fs, path::PathBuf, sync::Arc};

use graphql_operation_store::{Error, OperationKind, OperationStore, TypeRef};
use indoc::indoc;

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn store() -> OperationStore {
    OperationStore::new([fixtures()])
}

#[test]
fn resolves_the_path_of_an_operation() {
    let store = store();

    assert_eq!(
        store.resolve_file_path("Metaphysics", "artist"),
        Some(fixtures().join("metaphysics/artist.graphql"))
    );
    assert_eq!(store.resolve_file_path("Metaphysics", "does_not_exist"), None);
}

#[test]
fn renames_an_operation_without_variables() {
    let document = store().resolve("Metaphysics", "artwork").unwrap();

    assert_eq!(document.name(), "Metaphysics__Artwork");
    assert_eq!(document.kind(), OperationKind::Query);
    assert!(document.variables().is_empty());
    assert_eq!(
        document.to_query_string(),
        indoc! {r#"
            query Metaphysics__Artwork {
              artwork(id: "yayoi-kusama-pumpkin-yellow-and-black") {
                title
                artist {
                  name
                }
              }
            }"#}
    );
}

#[test]
fn renames_an_operation_with_variables() {
    let document = store().resolve("Metaphysics", "artist").unwrap();

    assert_eq!(document.name(), "Metaphysics__Artist");
    assert_eq!(document.variables().len(), 1);
    assert_eq!(document.variables()[0].name, "id");
    assert_eq!(document.variables()[0].ty, "String!".parse::<TypeRef>().unwrap());
    assert!(document.variables()[0].is_required());
    assert_eq!(
        document.to_query_string(),
        indoc! {r#"
            query Metaphysics__Artist($id: String!) {
              artist(id: $id) {
                name
                bio
                birthday
              }
            }"#}
    );
}

#[test]
fn appends_fragments_from_their_own_file() {
    let document = store().resolve("Metaphysics", "artists").unwrap();

    assert_eq!(document.fragments(), ["Metaphysics__ArtistFragment"]);
    assert_eq!(
        document.to_query_string(),
        indoc! {r#"
            query Metaphysics__Artists($size: Int!) {
              artists(size: $size) {
                name
                bio
                birthday
                ...Metaphysics__ArtistFragment
              }
            }

            fragment Metaphysics__ArtistFragment on Artist {
              hometown
              deathday
            }"#}
    );
}

#[test]
fn appends_each_fragment_once_in_first_spread_order() {
    let document = store().resolve("Metaphysics", "artworks_with_artists").unwrap();

    assert_eq!(
        document.fragments(),
        ["Metaphysics__ArtworkFragment", "Metaphysics__ArtistFragment"]
    );
    assert_eq!(
        document.to_query_string(),
        indoc! {r#"
            query Metaphysics__ArtworksWithArtists($ids: [ID!]!) {
              artworks(ids: $ids) {
                ...Metaphysics__ArtworkFragment
                artist {
                  ...Metaphysics__ArtistFragment
                }
              }
            }

            fragment Metaphysics__ArtworkFragment on Artwork {
              title
              artist {
                ...Metaphysics__ArtistFragment
              }
            }

            fragment Metaphysics__ArtistFragment on Artist {
              hometown
              deathday
            }"#}
    );
}

#[test]
fn keeps_mutations_as_mutations() {
    let document = store().resolve("Metaphysics", "update_artist").unwrap();

    assert_eq!(document.kind(), OperationKind::Mutation);
    assert!(document
        .to_query_string()
        .starts_with("mutation Metaphysics__UpdateArtist($id: ID!, $bio: String) {"));
}

#[test]
fn records_declared_variables() {
    let document = store().resolve("Metaphysics", "search").unwrap();

    let variables = document
        .variables()
        .iter()
        .map(|variable| (variable.name.as_str(), variable.ty.to_string(), variable.is_required()))
        .collect::<Vec<_>>();

    assert_eq!(
        variables,
        [
            ("term", "String!".to_string(), true),
            ("size", "Int".to_string(), false),
            ("after", "String".to_string(), false),
        ]
    );
    assert!(document.variable("size").unwrap().has_default);
}

#[test]
fn resolution_is_cached_and_idempotent() {
    let store = store();

    let first = store.resolve("Metaphysics", "artists").unwrap();
    let second = store.resolve("Metaphysics", "Artists").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.to_query_string(), second.to_query_string());

    store.reset();
    let third = store.resolve("Metaphysics", "artists").unwrap();

    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(first.to_query_string(), third.to_query_string());
}

#[test]
fn concurrent_resolutions_converge() {
    let store = Arc::new(store());

    let handles = (0..8)
        .map(|_| {
            let store = store.clone();
            std::thread::spawn(move || store.resolve("Metaphysics", "artists").unwrap())
        })
        .collect::<Vec<_>>();

    let documents = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect::<Vec<_>>();

    assert!(documents.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
}

#[test]
fn missing_documents_name_the_missing_file() {
    let error = store().resolve("Metaphysics", "does_not_exist").unwrap_err();

    let Error::DocumentNotFound { attempted, .. } = &error else {
        unreachable!("unexpected error: {error}");
    };

    assert_eq!(attempted, &[fixtures().join("metaphysics/does_not_exist.graphql")]);
    assert!(error
        .to_string()
        .starts_with("Query does_not_exist.graphql not found for operation Metaphysics__DoesNotExist"));
}

#[test]
fn documents_created_after_a_miss_are_picked_up() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("metaphysics")).unwrap();
    let store = OperationStore::new([dir.path()]);

    assert!(matches!(
        store.resolve("Metaphysics", "sale"),
        Err(Error::DocumentNotFound { .. })
    ));

    fs::write(dir.path().join("metaphysics/sale.graphql"), "query { sale { id } }").unwrap();

    assert_eq!(store.resolve("Metaphysics", "sale").unwrap().name(), "Metaphysics__Sale");
}

#[test]
fn lists_only_graphql_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("metaphysics")).unwrap();
    fs::write(dir.path().join("metaphysics/text.txt"), "").unwrap();
    fs::write(dir.path().join("metaphysics/sale.graphql"), "").unwrap();

    let store = OperationStore::new([dir.path()]);

    assert_eq!(&*store.list_files().unwrap(), [dir.path().join("metaphysics/sale.graphql")]);

    // The list is cached until reset.
    fs::write(dir.path().join("metaphysics/fair.graphql"), "").unwrap();
    assert_eq!(store.list_files().unwrap().len(), 1);

    store.reset();
    assert_eq!(store.list_files().unwrap().len(), 2);
}

#[test]
fn enumerates_the_operations_of_a_client() {
    let operations = store().operations("Metaphysics").unwrap();

    let names = operations
        .iter()
        .map(|operation| (operation.method_name.as_str(), operation.name.as_str()))
        .collect::<Vec<_>>();

    assert_eq!(
        names,
        [
            ("artist", "Metaphysics__Artist"),
            ("artists", "Metaphysics__Artists"),
            ("artwork", "Metaphysics__Artwork"),
            ("artworks_with_artists", "Metaphysics__ArtworksWithArtists"),
            ("search", "Metaphysics__Search"),
            ("update_artist", "Metaphysics__UpdateArtist"),
        ]
    );
}

#[test]
fn missing_fragments_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("metaphysics")).unwrap();
    fs::write(
        dir.path().join("metaphysics/sale.graphql"),
        "query { sale { ...SaleFragment } }",
    )
    .unwrap();

    let error = OperationStore::new([dir.path()])
        .resolve("Metaphysics", "sale")
        .unwrap_err();

    assert!(
        matches!(&error, Error::FragmentNotFound { fragment, .. } if fragment == "Metaphysics__SaleFragment"),
        "{error}"
    );
}

#[test]
fn fragment_cycles_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("metaphysics")).unwrap();
    fs::write(
        dir.path().join("metaphysics/sale.graphql"),
        indoc! {r#"
            query { sale { ...SaleFragment } }

            fragment SaleFragment on Sale { id artworks { ...ArtworkFragment } }

            fragment ArtworkFragment on Artwork { id sale { ...SaleFragment } }
        "#},
    )
    .unwrap();

    let error = OperationStore::new([dir.path()])
        .resolve("Metaphysics", "sale")
        .unwrap_err();

    assert!(matches!(error, Error::FragmentCycle { .. }), "{error}");
}

#[test]
fn one_operation_per_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("metaphysics")).unwrap();
    fs::write(
        dir.path().join("metaphysics/sale.graphql"),
        "query A { sale { id } }\nquery B { sale { id } }",
    )
    .unwrap();
    fs::write(dir.path().join("metaphysics/broken.graphql"), "query { sale {").unwrap();

    let store = OperationStore::new([dir.path()]);

    assert!(matches!(
        store.resolve("Metaphysics", "sale"),
        Err(Error::MultipleOperations { .. })
    ));
    assert!(matches!(
        store.resolve("Metaphysics", "broken"),
        Err(Error::Parse { .. })
    ));
}

#[test]
fn fragment_files_are_not_operations() {
    assert!(matches!(
        store().resolve("Metaphysics", "artist_fragment"),
        Err(Error::MissingOperation { .. })
    ));
}
