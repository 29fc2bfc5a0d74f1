//! Integration tests for `SqliteStore`, and the repository and service layers
//! running on top of it, against an in-memory database.

use std::{
  sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
  },
  time::Duration,
};

use chrono::{TimeZone, Utc};
use muses_core::{
  Error,
  artwork::{Artwork, ArtworkSearch},
  authority::{Authority, AuthorityError},
  filter::Filter,
  museum::{Coordinates, Museum, MuseumSearch},
  repository::Repository,
  service::EntityService,
  store::{Document, DocumentStore},
  user::{User, UserSearch},
};
use serde_json::json;
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> Arc<SqliteStore> {
  Arc::new(
    SqliteStore::open_in_memory()
      .await
      .expect("in-memory store"),
  )
}

fn doc(value: serde_json::Value) -> Document {
  match value {
    serde_json::Value::Object(map) => map,
    _ => panic!("not an object"),
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn user(username: &str, email: &str) -> User {
  User {
    firstname: "Ada".into(),
    lastname: "Lovelace".into(),
    username: username.into(),
    email: email.into(),
    birthday: Some(Utc.with_ymd_and_hms(1815, 12, 10, 0, 0, 0).unwrap()),
    country: "UK".into(),
    ..User::default()
  }
}

fn museum(name: &str, latitude: f64, longitude: f64, types: &[&str]) -> Museum {
  Museum {
    name: name.into(),
    description: "A museum".into(),
    location: Coordinates { latitude, longitude },
    hours: "9-17".into(),
    price: "10".into(),
    imageurl: "https://example.com/m.jpg".into(),
    types: types.iter().map(|t| t.to_string()).collect(),
    ..Museum::default()
  }
}

fn artwork(name: &str, museum: Uuid) -> Artwork {
  Artwork {
    name: name.into(),
    description: "An artwork".into(),
    imageurl: "https://example.com/a.jpg".into(),
    museum: Some(museum),
    is_exposed: Some(true),
    types: vec!["painting".into()],
    ..Artwork::default()
  }
}

/// Records calls and fails on demand.
#[derive(Default)]
struct FakeAuthority {
  fail:     AtomicBool,
  linked:   Mutex<Vec<(String, Uuid)>>,
  unlinked: Mutex<Vec<String>>,
}

impl Authority for FakeAuthority {
  async fn link(&self, actor: &str, entity_id: Uuid) -> Result<(), AuthorityError> {
    if self.fail.load(Ordering::SeqCst) {
      return Err(AuthorityError::Status(500));
    }
    self.linked.lock().unwrap().push((actor.to_owned(), entity_id));
    Ok(())
  }

  async fn unlink(&self, actor: &str) -> Result<(), AuthorityError> {
    if self.fail.load(Ordering::SeqCst) {
      return Err(AuthorityError::Transport("connection refused".into()));
    }
    self.unlinked.lock().unwrap().push(actor.to_owned());
    Ok(())
  }
}

type Service<E> = EntityService<E, SqliteStore, Arc<FakeAuthority>>;

async fn service<E: muses_core::entity::Entity>(
  collection: &str,
) -> (Service<E>, Arc<FakeAuthority>) {
  let authority = Arc::new(FakeAuthority::default());
  let repo = Repository::new(store().await, collection);
  (EntityService::new(repo, Some(Arc::clone(&authority))), authority)
}

// ─── Store ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_writes_id_into_body() {
  let s = store().await;
  let id = s.insert("things", doc(json!({ "a": 1 }))).await.unwrap();

  let stored = s.find_one("things", id).await.unwrap().unwrap();
  assert_eq!(stored["_id"], json!(id.to_string()));
  assert_eq!(stored["a"], json!(1));
}

#[tokio::test]
async fn client_supplied_id_is_replaced() {
  let s = store().await;
  let bogus = Uuid::new_v4();
  let id = s
    .insert("things", doc(json!({ "_id": bogus.to_string() })))
    .await
    .unwrap();
  assert_ne!(id, bogus);
  assert!(s.find_one("things", bogus).await.unwrap().is_none());
}

#[tokio::test]
async fn collections_are_isolated() {
  let s = store().await;
  let id = s.insert("a", doc(json!({}))).await.unwrap();
  assert!(s.find_one("b", id).await.unwrap().is_none());
  assert_eq!(s.find("b", &Filter::All).await.unwrap().len(), 0);
  assert_eq!(s.delete_one("b", id).await.unwrap(), 0);
}

#[tokio::test]
async fn update_one_merges_and_counts_matches() {
  let s = store().await;
  let id = s
    .insert("things", doc(json!({ "a": 1, "nested": { "x": 1, "y": 2 } })))
    .await
    .unwrap();

  let matched = s
    .update_one("things", id, doc(json!({ "b": 2, "nested": { "x": 9 } })))
    .await
    .unwrap();
  assert_eq!(matched, 1);

  let stored = s.find_one("things", id).await.unwrap().unwrap();
  assert_eq!(stored["a"], json!(1));
  assert_eq!(stored["b"], json!(2));
  assert_eq!(stored["nested"], json!({ "x": 9, "y": 2 }));

  let missing = s
    .update_one("things", Uuid::new_v4(), doc(json!({ "b": 3 })))
    .await
    .unwrap();
  assert_eq!(missing, 0);
}

#[tokio::test]
async fn find_preserves_insertion_order() {
  let s = store().await;
  for n in 0..5 {
    s.insert("things", doc(json!({ "n": n }))).await.unwrap();
  }
  let all = s.find("things", &Filter::All).await.unwrap();
  let ns: Vec<_> = all.iter().map(|d| d["n"].clone()).collect();
  assert_eq!(ns, [json!(0), json!(1), json!(2), json!(3), json!(4)]);
}

#[tokio::test]
async fn contains_is_literal_and_unicode_case_insensitive() {
  let s = store().await;
  s.insert("things", doc(json!({ "name": "Musée d'Orsay" }))).await.unwrap();
  s.insert("things", doc(json!({ "name": "100% Design" }))).await.unwrap();
  s.insert("things", doc(json!({ "name": "1000 Designs" }))).await.unwrap();

  let hits = s
    .find("things", &Filter::Contains { field: "name", value: "MUSÉE".into() })
    .await
    .unwrap();
  assert_eq!(hits.len(), 1);

  // `%` is a literal percent sign, not a wildcard.
  let hits = s
    .find("things", &Filter::Contains { field: "name", value: "0% d".into() })
    .await
    .unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0]["name"], json!("100% Design"));

  // Regex-looking input is plain text as well.
  let hits = s
    .find("things", &Filter::Contains { field: "name", value: ".*".into() })
    .await
    .unwrap();
  assert!(hits.is_empty());
}

#[tokio::test]
async fn empty_or_matches_nothing() {
  let s = store().await;
  s.insert("things", doc(json!({ "a": 1 }))).await.unwrap();
  assert!(s.find("things", &Filter::Or(vec![])).await.unwrap().is_empty());
}

#[tokio::test]
async fn ping_answers() {
  store().await.ping().await.unwrap();
}

// ─── Repository ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_sets_identifier_and_equal_timestamps() {
  let repo: Repository<User, _> = Repository::new(store().await, "users");
  let created = repo.insert(&user("ada", "ada@example.com")).await.unwrap();

  let id = created.meta.id.expect("id assigned");
  assert_eq!(created.meta.created_at, created.meta.updated_at);

  let fetched = repo.find_by_id(id).await.unwrap();
  assert_eq!(fetched.meta, created.meta);
  assert_eq!(fetched.username, "ada");
}

#[tokio::test]
async fn client_supplied_meta_is_ignored() {
  let repo: Repository<User, _> = Repository::new(store().await, "users");
  let mut candidate = user("ada", "ada@example.com");
  let bogus = Uuid::new_v4();
  let long_ago = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
  candidate.meta.id = Some(bogus);
  candidate.meta.created_at = Some(long_ago);

  let created = repo.insert(&candidate).await.unwrap();
  assert_ne!(created.meta.id, Some(bogus));
  assert_ne!(created.meta.created_at, Some(long_ago));
}

#[tokio::test]
async fn update_merges_and_refreshes_updated_at_only() {
  let repo: Repository<User, _> = Repository::new(store().await, "users");
  let mut candidate = user("ada", "ada@example.com");
  candidate.avatar_url = "https://example.com/ada.png".into();
  candidate.preferences = ["art".to_string()].into();
  let created = repo.insert(&candidate).await.unwrap();
  let id = created.meta.id.unwrap();

  tokio::time::sleep(Duration::from_millis(5)).await;

  // Fields left unset in the payload keep their stored values.
  let payload = User { country: "FR".into(), ..User::default() };
  let updated = repo.update_by_id(id, &payload).await.unwrap();

  assert_eq!(updated.country, "FR");
  assert_eq!(updated.firstname, "Ada");
  assert_eq!(updated.avatar_url, "https://example.com/ada.png");
  assert!(updated.preferences.contains("art"));
  assert_eq!(updated.meta.created_at, created.meta.created_at);
  assert!(updated.meta.updated_at > created.meta.updated_at);
}

#[tokio::test]
async fn update_missing_is_not_found() {
  let repo: Repository<User, _> = Repository::new(store().await, "users");
  let err = repo
    .update_by_id(Uuid::new_v4(), &user("ada", "ada@example.com"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotFound { label: "User", .. }));
}

#[tokio::test]
async fn double_delete_is_not_found() {
  let repo: Repository<Museum, _> = Repository::new(store().await, "museums");
  let created = repo.insert(&museum("Louvre", 48.86, 2.33, &["art"])).await.unwrap();
  let id = created.meta.id.unwrap();

  repo.delete_by_id(id).await.unwrap();
  let err = repo.delete_by_id(id).await.unwrap_err();
  assert!(matches!(err, Error::NotFound { label: "Museum", .. }));
  assert!(matches!(repo.find_by_id(id).await, Err(Error::NotFound { .. })));
}

#[tokio::test]
async fn ping_within_deadline() {
  let repo: Repository<Museum, _> = Repository::new(store().await, "museums");
  repo.ping(Duration::from_secs(2)).await.unwrap();
}

// ─── Searches ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_search_returns_everything() {
  let (svc, _) = service::<Museum>("museums").await;
  svc.create("u1", museum("A", 1.0, 1.0, &["art"])).await.unwrap();
  svc.create("u1", museum("B", 2.0, 2.0, &["science"])).await.unwrap();

  let all = svc.list().await.unwrap();
  let searched = svc.search(&MuseumSearch::default()).await.unwrap();
  assert_eq!(all, searched);
  assert_eq!(searched.len(), 2);
}

#[tokio::test]
async fn type_search_is_partial_and_case_insensitive() {
  let (svc, _) = service::<Museum>("museums").await;
  svc.create("u1", museum("A", 1.0, 1.0, &["Art History"])).await.unwrap();
  svc.create("u1", museum("B", 2.0, 2.0, &["Science"])).await.unwrap();
  svc.create("u1", museum("C", 3.0, 3.0, &["Modern ART", "Design"])).await.unwrap();

  let hits = svc
    .search(&MuseumSearch { types: vec!["art".into()], ..MuseumSearch::default() })
    .await
    .unwrap();
  let names: Vec<_> = hits.iter().map(|m| m.name.as_str()).collect();
  assert_eq!(names, ["A", "C"]);

  let hits = svc
    .search(&MuseumSearch {
      types: vec!["science".into(), "design".into()],
      ..MuseumSearch::default()
    })
    .await
    .unwrap();
  assert_eq!(hits.len(), 2);
}

#[tokio::test]
async fn bounding_box_is_inclusive() {
  let (svc, _) = service::<Museum>("museums").await;
  svc.create("u1", museum("Inside", 45.0, 10.0, &["art"])).await.unwrap();
  svc.create("u1", museum("Edge", 46.0, 11.0, &["art"])).await.unwrap();
  svc.create("u1", museum("Outside", 47.0, 10.5, &["art"])).await.unwrap();

  let hits = svc
    .search(&MuseumSearch {
      min_lat: Some(44.0),
      max_lat: Some(46.0),
      min_lon: Some(9.0),
      max_lon: Some(11.0),
      ..MuseumSearch::default()
    })
    .await
    .unwrap();
  let names: Vec<_> = hits.iter().map(|m| m.name.as_str()).collect();
  assert_eq!(names, ["Inside", "Edge"]);
}

#[tokio::test]
async fn name_and_type_combine_with_and() {
  let (svc, _) = service::<Museum>("museums").await;
  svc.create("u1", museum("Galleria Borghese", 41.9, 12.4, &["art"])).await.unwrap();
  svc.create("u1", museum("Galleria Ferrari", 44.5, 10.8, &["cars"])).await.unwrap();

  let hits = svc
    .search(&MuseumSearch {
      types: vec!["art".into()],
      name: Some("galleria".into()),
      ..MuseumSearch::default()
    })
    .await
    .unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].name, "Galleria Borghese");
}

#[tokio::test]
async fn artworks_filter_by_museum() {
  let (svc, _) = service::<Artwork>("opere").await;
  let louvre = Uuid::new_v4();
  let prado = Uuid::new_v4();
  svc.create("", artwork("Mona Lisa", louvre)).await.unwrap();
  svc.create("", artwork("Las Meninas", prado)).await.unwrap();
  svc.create("", artwork("Liberty Leading the People", louvre)).await.unwrap();

  let hits = svc
    .search(&ArtworkSearch { museum: Some(louvre), ..ArtworkSearch::default() })
    .await
    .unwrap();
  assert_eq!(hits.len(), 2);

  let hits = svc
    .search(&ArtworkSearch {
      museum: Some(louvre),
      name: Some("LISA".into()),
      ..ArtworkSearch::default()
    })
    .await
    .unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].name, "Mona Lisa");
}

#[tokio::test]
async fn user_search_matches_email_or_username_exactly() {
  let (svc, _) = service::<User>("users").await;
  svc.create("a", user("ada", "ada@example.com")).await.unwrap();
  svc.create("b", user("grace", "grace@example.com")).await.unwrap();

  let hits = svc
    .search(&UserSearch {
      email:    Some("ADA@example.com".into()),
      username: Some("grace".into()),
    })
    .await
    .unwrap();
  assert_eq!(hits.len(), 2);

  // Exact, not partial.
  let hits = svc
    .search(&UserSearch { username: Some("gra".into()), ..UserSearch::default() })
    .await
    .unwrap();
  assert!(hits.is_empty());
}

// ─── Service ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_links_with_actor() {
  let (svc, authority) = service::<User>("users").await;
  let created = svc.create("actor-1", user("ada", "ada@example.com")).await.unwrap();

  let linked = authority.linked.lock().unwrap().clone();
  assert_eq!(linked, vec![("actor-1".to_owned(), created.meta.id.unwrap())]);
  assert_eq!(created.range_preferences, 1.0);
}

#[tokio::test]
async fn duplicate_email_differing_in_case_is_rejected() {
  let (svc, _) = service::<User>("users").await;
  svc.create("a", user("ada", "ada@example.com")).await.unwrap();

  let err = svc.create("b", user("other", "ADA@Example.COM")).await.unwrap_err();
  assert!(matches!(err, Error::Duplicate));

  let err = svc.create("b", user("ADA", "other@example.com")).await.unwrap_err();
  assert!(matches!(err, Error::Duplicate));
  assert_eq!(svc.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn update_may_keep_own_unique_keys() {
  let (svc, _) = service::<User>("users").await;
  let ada = svc.create("a", user("ada", "ada@example.com")).await.unwrap();
  svc.create("b", user("grace", "grace@example.com")).await.unwrap();
  let id = ada.meta.id.unwrap();

  let renamed = User { lastname: "King".into(), ..user("ada", "ada@example.com") };
  let updated = svc.update(id, renamed).await.unwrap();
  assert_eq!(updated.lastname, "King");

  let stolen = user("grace", "ada@example.com");
  assert!(matches!(svc.update(id, stolen).await, Err(Error::Duplicate)));
}

#[tokio::test]
async fn link_failure_rolls_back_insert() {
  let (svc, authority) = service::<Museum>("museums").await;
  authority.fail.store(true, Ordering::SeqCst);

  let err = svc.create("u1", museum("Louvre", 48.86, 2.33, &["art"])).await.unwrap_err();
  assert!(matches!(err, Error::LinkFailed { kind: "museum", .. }));
  assert!(svc.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn unlink_failure_keeps_document() {
  let (svc, authority) = service::<User>("users").await;
  let created = svc.create("a", user("ada", "ada@example.com")).await.unwrap();
  let id = created.meta.id.unwrap();
  authority.fail.store(true, Ordering::SeqCst);

  let err = svc.delete("a", id).await.unwrap_err();
  assert!(matches!(err, Error::UnlinkFailed { kind: "user", .. }));
  assert!(svc.get(id).await.is_ok());

  authority.fail.store(false, Ordering::SeqCst);
  svc.delete("a", id).await.unwrap();
  assert_eq!(*authority.unlinked.lock().unwrap(), vec!["a".to_owned()]);
  assert!(matches!(svc.get(id).await, Err(Error::NotFound { .. })));
}

#[tokio::test]
async fn artworks_never_consult_the_authority() {
  let (svc, authority) = service::<Artwork>("opere").await;
  authority.fail.store(true, Ordering::SeqCst);

  let created = svc.create("", artwork("Mona Lisa", Uuid::new_v4())).await.unwrap();
  svc.delete("", created.meta.id.unwrap()).await.unwrap();
  assert!(authority.linked.lock().unwrap().is_empty());
}

#[tokio::test]
async fn origin_location_is_rejected() {
  let (svc, _) = service::<Museum>("museums").await;
  let err = svc.create("u1", museum("Null Island", 0.0, 0.0, &["art"])).await.unwrap_err();
  assert_eq!(err.to_string(), "location is required");
  assert!(svc.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn update_is_validated_in_full() {
  let (svc, _) = service::<Artwork>("opere").await;
  let created = svc.create("", artwork("Mona Lisa", Uuid::new_v4())).await.unwrap();

  let partial = Artwork { name: "Renamed".into(), ..Artwork::default() };
  let err = svc.update(created.meta.id.unwrap(), partial).await.unwrap_err();
  assert_eq!(err.to_string(), "description is required");
}

// ─── Preferences ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn preferences_replace_and_deduplicate() {
  let (svc, _) = service::<User>("users").await;
  let mut candidate = user("ada", "ada@example.com");
  candidate.preferences = ["history".to_string()].into();
  let created = svc.create("a", candidate).await.unwrap();
  let id = created.meta.id.unwrap();

  let updated = svc
    .set_preferences(id, vec!["art".into(), "art".into(), "science".into()])
    .await
    .unwrap();
  assert_eq!(updated.preferences.len(), 2);
  assert_eq!(updated.firstname, "Ada");
  assert!(updated.meta.updated_at >= created.meta.updated_at);

  let prefs = svc.preferences(id).await.unwrap();
  assert_eq!(prefs.into_iter().collect::<Vec<_>>(), ["art", "science"]);

  svc.set_preferences(id, vec![]).await.unwrap();
  assert!(svc.preferences(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn preferences_of_missing_user() {
  let (svc, _) = service::<User>("users").await;
  let err = svc.preferences(Uuid::new_v4()).await.unwrap_err();
  assert_eq!(err.to_string(), "User not found");
  let err = svc.set_preferences(Uuid::new_v4(), vec!["x".into()]).await.unwrap_err();
  assert!(matches!(err, Error::NotFound { .. }));
}
