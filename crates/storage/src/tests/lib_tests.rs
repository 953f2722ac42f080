use super::*;
use rand::{rngs::StdRng, SeedableRng};
use shared::domain::FlagValueType;

fn seeded(org_count: usize) -> FlagStore {
    FlagStore::seeded(&SeedOptions {
        org_count,
        seed: Some(7),
    })
}

#[tokio::test]
async fn seeding_creates_requested_number_of_unique_orgs() {
    let store = seeded(250);
    let (ids, total) = store.list_org_ids(0, usize::MAX).await;
    assert_eq!(total, 250);

    let unique: std::collections::HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), 250);
    assert!(ids.iter().all(|id| id.as_str().starts_with("org-") && id.as_str().len() == 10));
}

#[tokio::test]
async fn seeded_values_respect_declared_types() {
    let store = seeded(50);
    let (ids, _) = store.list_org_ids(0, 50).await;
    for id in ids {
        let flags = store.load_flags(&id).await.expect("seeded org");
        assert_eq!(flags.len(), directory::definitions().len());
        for def in directory::definitions() {
            let value = flags.get(def.key.as_str()).expect("every flag seeded");
            assert_eq!(value.value_type(), def.value_type);
        }
    }
}

#[tokio::test]
async fn same_seed_produces_same_store() {
    let first = seeded(20).list_org_ids(0, 20).await;
    let second = seeded(20).list_org_ids(0, 20).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn listing_slices_in_insertion_order() {
    let store = FlagStore::new();
    for name in ["org-a", "org-b", "org-c", "org-d", "org-e"] {
        store
            .insert_org(OrgId::from(name), FlagValueMap::new())
            .await
            .expect("insert");
    }

    let (page, total) = store.list_org_ids(2, 2).await;
    assert_eq!(total, 5);
    assert_eq!(page, vec![OrgId::from("org-c"), OrgId::from("org-d")]);

    let (past_end, total) = store.list_org_ids(10, 2).await;
    assert!(past_end.is_empty());
    assert_eq!(total, 5);
}

#[tokio::test]
async fn insert_org_rejects_duplicates() {
    let store = FlagStore::new();
    store
        .insert_org(OrgId::from("org-a"), FlagValueMap::new())
        .await
        .expect("insert");
    let err = store
        .insert_org(OrgId::from("org-a"), FlagValueMap::new())
        .await
        .expect_err("duplicate");
    assert!(err.to_string().contains("already exists"));
}

#[tokio::test]
async fn unknown_org_has_no_flags() {
    let store = seeded(3);
    assert!(store.load_flags(&OrgId::from("no-such-org-xyz")).await.is_none());
}

#[tokio::test]
async fn writing_to_unknown_org_creates_it_with_defaults() {
    let store = FlagStore::new();
    let org = OrgId::from("org-new");

    let outcome = store
        .store_flag(&org, FlagKey::DarkMode, FlagValue::Bool(false))
        .await;
    assert!(outcome.created_org);
    assert_eq!(store.org_count().await, 1);

    let flags = store.load_flags(&org).await.expect("created");
    assert_eq!(flags.get("DARK_MODE"), Some(&FlagValue::Bool(false)));
    assert_eq!(
        flags.get("REAL_TIME_NOTIFICATIONS"),
        Some(&FlagValue::Bool(true))
    );
    assert_eq!(flags.len(), directory::definitions().len());

    let second = store
        .store_flag(&org, FlagKey::DarkMode, FlagValue::Bool(true))
        .await;
    assert!(!second.created_org);
    assert_eq!(store.org_count().await, 1);
}

#[tokio::test]
async fn reads_observe_latest_write() {
    let store = seeded(1);
    let (ids, _) = store.list_org_ids(0, 1).await;
    let org = &ids[0];

    store
        .store_flag(org, FlagKey::DashboardRefreshSeconds, FlagValue::from(5))
        .await;
    store
        .store_flag(org, FlagKey::DashboardRefreshSeconds, FlagValue::from(90))
        .await;

    let flags = store.load_flags(org).await.expect("org");
    assert_eq!(flags.get("DASHBOARD_REFRESH_SECONDS"), Some(&FlagValue::from(90)));
}

#[test]
fn random_values_match_type_and_shape() {
    let mut rng = StdRng::seed_from_u64(1);
    for def in directory::definitions() {
        let value = random_value_for(def, &mut rng);
        assert_eq!(value.value_type(), def.value_type);
        match (&value, def.value_type) {
            (FlagValue::Number(n), FlagValueType::Number) => {
                let n = n.as_i64().expect("integer");
                assert!((0..100).contains(&n));
            }
            (FlagValue::String(s), FlagValueType::String) => {
                let prefix = format!("{}_", def.key.as_str().to_ascii_lowercase());
                assert!(s.starts_with(&prefix));
            }
            _ => {}
        }
    }
}
