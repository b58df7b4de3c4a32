use domainstore_core::key::{parse_key_form, KeyForm};
use domainstore_core::{
    build_key, domain_prefix, parse_key, parse_user_input, Domain, ItemType, KeyFormatError,
};

#[test]
fn default_domain_aliases_build_the_same_key() {
    let from_default = build_key(ItemType::Resource, &Domain::from_name("default"), "x");
    let from_empty = build_key(ItemType::Resource, &Domain::from_name(""), "x");

    assert_eq!(from_default, from_empty);
    assert_eq!(from_default, b"resource::x".to_vec());
}

#[test]
fn named_domain_uses_explicit_form() {
    let key = build_key(ItemType::Prompt, &Domain::from_name("team"), "p1");
    assert_eq!(key, b"prompt:domain:team:p1".to_vec());
}

#[test]
fn parse_key_accepts_all_three_forms() {
    let (form, shorthand) = parse_key_form(b"resource::abc").unwrap();
    assert_eq!(form, KeyForm::Shorthand);
    assert_eq!(shorthand.domain, Domain::Default);
    assert_eq!(shorthand.id, "abc");

    let (form, explicit) = parse_key_form(b"prompt:domain:alpha:p9").unwrap();
    assert_eq!(form, KeyForm::Explicit);
    assert_eq!(explicit.item_type, ItemType::Prompt);
    assert_eq!(explicit.domain, Domain::Named("alpha".to_string()));
    assert_eq!(explicit.id, "p9");

    let (form, legacy) = parse_key_form(b"resource:old").unwrap();
    assert_eq!(form, KeyForm::Legacy);
    assert_eq!(legacy.domain, Domain::Default);
    assert_eq!(legacy.id, "old");
}

#[test]
fn parse_key_rejects_malformed_keys() {
    assert!(matches!(
        parse_key(b"badkey"),
        Err(KeyFormatError::InvalidFormat(_))
    ));
    assert!(matches!(
        parse_key(b"a:b:c:d:e"),
        Err(KeyFormatError::UnsupportedFormat(_))
    ));
    assert!(matches!(
        parse_key(b"resource:other:x:y"),
        Err(KeyFormatError::UnsupportedFormat(_))
    ));
    assert!(matches!(
        parse_key(b"widget::x"),
        Err(KeyFormatError::UnknownItemType(_))
    ));
}

#[test]
fn built_keys_parse_back_to_the_same_triple() {
    for domain in [Domain::Default, Domain::Named("proj1".to_string())] {
        let raw = build_key(ItemType::Resource, &domain, "r-1");
        let parsed = parse_key(&raw).unwrap();
        assert_eq!(parsed.item_type, ItemType::Resource);
        assert_eq!(parsed.domain, domain);
        assert_eq!(parsed.id, "r-1");
        assert!(raw.starts_with(&domain_prefix(ItemType::Resource, &domain)));
    }
}

#[test]
fn domain_prefixes_do_not_overlap_between_similar_names() {
    let short = domain_prefix(ItemType::Resource, &Domain::from_name("proj"));
    let long_key = build_key(ItemType::Resource, &Domain::from_name("proj1"), "a");
    assert!(!long_key.starts_with(&short));
}

#[test]
fn user_input_shapes_resolve_to_canonical_keys() {
    let explicit_default = parse_user_input(ItemType::Resource, "::doc").unwrap();
    assert_eq!(explicit_default.domain, Domain::Default);
    assert_eq!(explicit_default.to_key(), b"resource::doc".to_vec());

    let named = parse_user_input(ItemType::Prompt, "team:greeting").unwrap();
    assert_eq!(named.to_key(), b"prompt:domain:team:greeting".to_vec());

    let bare = parse_user_input(ItemType::Resource, "doc").unwrap();
    assert_eq!(bare, explicit_default);

    assert!(parse_user_input(ItemType::Resource, "team:").is_err());
    assert!(parse_user_input(ItemType::Resource, "").is_err());
}
