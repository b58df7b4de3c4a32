use domainstore_core::{
    DomainStore, ItemType, RepoError, Resource, StoreConfig, ValidationError,
};
use serde_json::json;

fn sample_resource(id: &str, title: &str) -> Resource {
    let mut resource = Resource::new(id)
        .with_title(title)
        .with_content(format!("body of {title}"))
        .with_tags(["Go", "storage"]);
    resource.kind = "document".to_string();
    resource
        .metadata
        .insert("source".to_string(), json!({"url": "https://example.com", "rank": 3}));
    resource.search_terms = vec!["kv".to_string(), "prefix".to_string()];
    resource
}

#[test]
fn store_and_get_roundtrip() {
    let store = DomainStore::open_in_memory().unwrap();
    let resource = sample_resource("r1", "first");

    let stored = store.store_resource(resource.clone(), "proj1").unwrap();
    let loaded = store.get_resource("r1", "proj1").unwrap();

    assert_eq!(loaded, stored);
    assert_eq!(loaded.domain, "proj1");
    assert_eq!(loaded.title, resource.title);
    assert_eq!(loaded.content, resource.content);
    assert_eq!(loaded.metadata, resource.metadata);
    assert_eq!(loaded.tags, resource.tags);
    assert_eq!(loaded.search_terms, resource.search_terms);
    assert!(loaded.created_at.is_some());
    assert_eq!(loaded.created_at, loaded.updated_at);
}

#[test]
fn same_id_in_two_domains_does_not_collide() {
    let store = DomainStore::open_in_memory().unwrap();
    store
        .store_resource(sample_resource("abc", "from proj1"), "proj1")
        .unwrap();
    store
        .store_resource(sample_resource("abc", "from proj2"), "proj2")
        .unwrap();

    assert_eq!(store.get_resource("abc", "proj1").unwrap().title, "from proj1");
    assert_eq!(store.get_resource("abc", "proj2").unwrap().title, "from proj2");

    store.delete_resource("abc", "proj1").unwrap();
    assert!(store.get_resource("abc", "proj1").unwrap_err().is_not_found());
    assert_eq!(store.get_resource("abc", "proj2").unwrap().title, "from proj2");
}

#[test]
fn default_domain_aliases_address_the_same_entry() {
    let store = DomainStore::open_in_memory().unwrap();
    store.store_resource(sample_resource("x", "shared"), "").unwrap();

    let loaded = store.get_resource("x", "default").unwrap();
    assert_eq!(loaded.title, "shared");
    assert_eq!(loaded.domain, "default");
}

#[test]
fn overwrite_keeps_created_at_and_advances_updated_at() {
    let store = DomainStore::open_in_memory().unwrap();
    let first = store
        .store_resource(sample_resource("r1", "v1"), "proj")
        .unwrap();

    std::thread::sleep(std::time::Duration::from_millis(5));
    let mut edited = first.clone();
    edited.title = "v2".to_string();
    let second = store.store_resource(edited, "proj").unwrap();

    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at > first.updated_at);
    assert_eq!(store.get_resource("r1", "proj").unwrap().title, "v2");
}

#[test]
fn store_rejects_empty_and_ambiguous_identifiers() {
    let store = DomainStore::open_in_memory().unwrap();

    let err = store
        .store_resource(Resource::new(""), "proj")
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(ValidationError::EmptyId)));

    let err = store
        .store_resource(Resource::new("a:b"), "proj")
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::DelimiterInId(_))
    ));

    let err = store
        .store_resource(Resource::new("ok"), "bad:domain")
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::DelimiterInDomain(_))
    ));
    assert!(store.list_all_domains().unwrap().is_empty());
}

#[test]
fn get_missing_resource_is_not_found() {
    let store = DomainStore::open_in_memory().unwrap();

    let err = store.get_resource("ghost", "proj").unwrap_err();
    match &err {
        RepoError::NotFound {
            item_type,
            id,
            domain,
        } => {
            assert_eq!(*item_type, ItemType::Resource);
            assert_eq!(id, "ghost");
            assert_eq!(domain.name(), "proj");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.to_string(), "resource not found: ghost in proj");
}

#[test]
fn delete_is_idempotent() {
    let store = DomainStore::open_in_memory().unwrap();
    store.delete_resource("never-stored", "proj").unwrap();
    store.delete_resource("never-stored", "").unwrap();

    store.store_resource(sample_resource("r1", "t"), "proj").unwrap();
    store.delete_resource("r1", "proj").unwrap();
    store.delete_resource("r1", "proj").unwrap();
    assert!(store.get_resource("r1", "proj").unwrap_err().is_not_found());
}

#[test]
fn get_by_ref_understands_shorthand() {
    let store = DomainStore::open_in_memory().unwrap();
    store.store_resource(sample_resource("doc", "default doc"), "").unwrap();
    store.store_resource(sample_resource("doc", "team doc"), "team").unwrap();

    assert_eq!(store.get_resource_by_ref("doc").unwrap().title, "default doc");
    assert_eq!(store.get_resource_by_ref("::doc").unwrap().title, "default doc");
    assert_eq!(store.get_resource_by_ref("team:doc").unwrap().title, "team doc");
    assert!(matches!(
        store.get_resource_by_ref("a:b:c").unwrap_err(),
        RepoError::KeyFormat(_)
    ));
}

#[test]
fn corrupted_value_is_reported_as_invalid_data() {
    let mut conn = domainstore_core::db::open_db_in_memory().unwrap();
    {
        let tx = domainstore_core::db::WriteTx::begin(&mut conn).unwrap();
        tx.put(b"resource::broken", b"not json").unwrap();
        tx.commit().unwrap();
    }
    let store = DomainStore::from_connection(conn);

    let err = store.get_resource("broken", "").unwrap_err();
    assert!(matches!(err, RepoError::InvalidData { ref key, .. } if key == "resource::broken"));
}

#[test]
fn entries_survive_close_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::under(dir.path());

    let store = DomainStore::open(&config).unwrap();
    store.store_resource(sample_resource("r1", "kept"), "proj").unwrap();
    store.close().unwrap();

    assert!(config.index_path.is_dir());
    let store = DomainStore::open(&config).unwrap();
    assert_eq!(store.get_resource("r1", "proj").unwrap().title, "kept");
}

#[test]
fn stored_json_uses_external_field_names() {
    let store = DomainStore::open_in_memory().unwrap();
    let stored = store.store_resource(sample_resource("r1", "t"), "proj").unwrap();

    let value = serde_json::to_value(&stored).unwrap();
    assert_eq!(value["type"], "document");
    assert!(value["createdAt"].is_string());
    assert!(value["updatedAt"].is_string());
    assert_eq!(value["searchTerms"], json!(["kv", "prefix"]));
}

#[test]
fn one_store_is_shared_by_writer_threads() {
    let dir = tempfile::tempdir().unwrap();
    let store = DomainStore::open(&StoreConfig::under(dir.path())).unwrap();
    let domains = ["alpha", "beta", "gamma", ""];
    let per_thread = 25;

    std::thread::scope(|scope| {
        for domain in domains {
            let store = &store;
            scope.spawn(move || {
                for index in 0..per_thread {
                    let id = format!("r{index:03}");
                    store
                        .store_resource(sample_resource(&id, &format!("{domain}/{id}")), domain)
                        .unwrap();
                    assert_eq!(store.get_resource(&id, domain).unwrap().id, id);
                }
            });
        }
    });

    for domain in domains {
        assert_eq!(store.domain_stats(domain).unwrap().resources, per_thread);
        for index in 0..per_thread {
            let id = format!("r{index:03}");
            let loaded = store.get_resource(&id, domain).unwrap();
            assert_eq!(loaded.title, format!("{domain}/{id}"));
        }
    }
    assert_eq!(store.list_all_domains().unwrap().len(), domains.len());
    store.close().unwrap();
}
