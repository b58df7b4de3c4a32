use domainstore_core::{DomainStore, ListQuery, Prompt, TagQuery};
use std::thread::sleep;
use std::time::Duration;

#[test]
fn prompt_store_get_and_restore_keeps_created_at() {
    let store = DomainStore::open_in_memory().unwrap();
    let prompt = Prompt::new("p1", "greeting", "Hello {{name}}").with_variable("name", "");

    store.store_prompt(prompt, "team").unwrap();
    let first = store.get_prompt("p1", "team").unwrap();
    assert_eq!(first.template, "Hello {{name}}");
    assert_eq!(first.variables.get("name").map(String::as_str), Some(""));
    assert_eq!(first.domain, "team");
    assert!(first.created_at.is_some());
    assert_eq!(first.created_at, first.updated_at);

    sleep(Duration::from_millis(5));
    store.store_prompt(first.clone(), "team").unwrap();
    let second = store.get_prompt("p1", "team").unwrap();
    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at > first.updated_at);
}

#[test]
fn template_is_stored_verbatim() {
    let store = DomainStore::open_in_memory().unwrap();
    let template = "{{greeting}}, {{name}}!\n\tUnrendered {{ spaced }} {{missing}}";
    let prompt = Prompt::new("p2", "raw", template)
        .with_variable("greeting", "salutation to use")
        .with_variable("name", "who to greet");

    store.store_prompt(prompt, "").unwrap();
    let loaded = store.get_prompt("p2", "default").unwrap();
    assert_eq!(loaded.template, template);
    assert_eq!(loaded.variables.len(), 2);
}

#[test]
fn prompts_and_resources_with_same_id_are_separate() {
    let store = DomainStore::open_in_memory().unwrap();
    store
        .store_prompt(Prompt::new("shared", "prompt", "t"), "team")
        .unwrap();

    assert!(store.get_resource("shared", "team").unwrap_err().is_not_found());
    store.delete_resource("shared", "team").unwrap();
    assert_eq!(store.get_prompt("shared", "team").unwrap().name, "prompt");

    let stats = store.domain_stats("team").unwrap();
    assert_eq!(stats.prompts, 1);
    assert_eq!(stats.resources, 0);
}

#[test]
fn prompt_list_and_tag_search() {
    let store = DomainStore::open_in_memory().unwrap();
    store
        .store_prompt(
            Prompt::new("a", "summarize", "Summarize {{text}}").with_tags(["Writing"]),
            "team",
        )
        .unwrap();
    store
        .store_prompt(
            Prompt::new("b", "review", "Review {{diff}}").with_tags(["Code", "rust"]),
            "team",
        )
        .unwrap();
    store
        .store_prompt(Prompt::new("c", "other", "x").with_tags(["RUST"]), "")
        .unwrap();

    let listed = store
        .list_prompts(&ListQuery {
            domains: vec!["team".to_string()],
            ..ListQuery::default()
        })
        .unwrap();
    let ids: Vec<&str> = listed.iter().map(|prompt| prompt.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);

    let hits = store
        .search_prompts_by_tags(&TagQuery {
            tags: vec!["Rust".to_string()],
            domains: vec!["team".to_string(), "default".to_string()],
            limit: None,
        })
        .unwrap();
    let ids: Vec<&str> = hits.iter().map(|prompt| prompt.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "c"]);
}

#[test]
fn prompt_get_by_ref() {
    let store = DomainStore::open_in_memory().unwrap();
    store
        .store_prompt(Prompt::new("p1", "team prompt", "t"), "team")
        .unwrap();

    assert_eq!(store.get_prompt_by_ref("team:p1").unwrap().name, "team prompt");
    assert!(store.get_prompt_by_ref("p1").unwrap_err().is_not_found());

    store.delete_prompt("p1", "team").unwrap();
    assert!(store.get_prompt_by_ref("team:p1").unwrap_err().is_not_found());
}
