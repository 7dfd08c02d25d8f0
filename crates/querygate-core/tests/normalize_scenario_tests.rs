use querygate_core::{
    normalize, normalize_from_shareable_parameters, parse_search, ChoiceSet, FieldDescriptor,
    FilterValue, InputContract, RawInput, RawValue, SortOrder,
};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn base_query_contract() -> InputContract {
    InputContract::builder()
        .filter(FieldDescriptor::new("foo", "Foo").multiple())
        .filter(FieldDescriptor::new("bar", "Bar"))
        .base_query("foo", ["a", "b", "c"])
        .sort("created", "Created")
        .build()
        .expect("valid contract")
}

fn search_contract() -> InputContract {
    InputContract::builder()
        .filter(FieldDescriptor::new("foo", "Foo").multiple())
        .filter(FieldDescriptor::new("some", "Some"))
        .parsed_search()
        .sort("created", "Created")
        .build()
        .expect("valid contract")
}

// ============================================================================
// Base query
// ============================================================================

#[test]
fn base_query_trims_disallowed_values() {
    let contract = base_query_contract();
    let raw = RawInput::from_pairs([("foo", vec!["b", "c", "d", "e"])]);
    let query = normalize(&contract, &raw, "listing");

    assert_eq!(query.get("foo"), Some(&FilterValue::Multiple(strings(&["b", "c"]))));
    assert_eq!(
        query.shareable_parameters().get("foo").map(String::as_str),
        Some("b|c")
    );
}

#[test]
fn base_query_full_selection_is_not_shared() {
    let contract = base_query_contract();
    for order in [["a", "b", "c"], ["c", "b", "a"], ["b", "a", "c"]] {
        let raw = RawInput::from_pairs([("foo", order.to_vec())]);
        let query = normalize(&contract, &raw, "listing");

        assert!(!query.shareable_parameters().contains_key("foo"));
        assert_eq!(query.get_values("foo"), vec!["a", "b", "c"]);
    }
}

#[test]
fn base_query_narrowed_selection_is_shared() {
    let contract = base_query_contract();
    let raw = RawInput::from_query_string("foo=c|a");
    let query = normalize(&contract, &raw, "listing");

    assert_eq!(query.get_values("foo"), vec!["a", "c"]);
    assert_eq!(
        query.shareable_parameters().get("foo").map(String::as_str),
        Some("a|c")
    );
}

#[test]
fn base_query_unset_means_every_allowed_value() {
    let contract = base_query_contract();
    let query = normalize(&contract, &RawInput::new(), "listing");

    assert_eq!(query.get_values("foo"), vec!["a", "b", "c"]);
    assert!(query.shareable_parameters().is_empty());
}

#[test]
fn base_query_with_nothing_allowed_selected_is_empty() {
    let contract = base_query_contract();
    let raw = RawInput::from_query_string("foo=z");
    let query = normalize(&contract, &raw, "listing");

    assert_eq!(query.get("foo"), Some(&FilterValue::Multiple(Vec::new())));
    assert_eq!(
        query.shareable_parameters().get("foo").map(String::as_str),
        Some("")
    );
}

#[test]
fn full_base_selection_stays_shared_when_search_scopes_the_field() {
    let contract = InputContract::builder()
        .filter(FieldDescriptor::new("foo", "Foo").multiple())
        .base_query("foo", ["a", "b", "c"])
        .parsed_search()
        .build()
        .expect("valid contract");

    for search in ["foo:z", "foo:a"] {
        let raw = RawInput::from_pairs([("foo", "a|b|c"), ("search", search)]);
        let first = normalize(&contract, &raw, "listing");
        assert_eq!(first.get_values("foo"), vec!["a", "b", "c"], "search={search}");
        assert_eq!(
            first.shareable_parameters().get("foo").map(String::as_str),
            Some("a|b|c"),
            "search={search}"
        );

        let second =
            normalize_from_shareable_parameters(&contract, first.shareable_parameters(), "listing");
        assert_eq!(first.all(), second.all(), "search={search}");
    }

    // Without a scoped search token the full selection is still elided.
    let raw = RawInput::from_pairs([("foo", "a|b|c"), ("search", "hello")]);
    let query = normalize(&contract, &raw, "listing");
    assert!(!query.shareable_parameters().contains_key("foo"));
}

// ============================================================================
// Search
// ============================================================================

#[test]
fn parsed_search_merges_into_filters() {
    let contract = search_contract();
    let search = "foo:a foo:d foo:f some:other fulltext search";
    let raw = RawInput::from_pairs([
        ("foo", RawValue::from(vec!["c", "d", "e"])),
        ("search", RawValue::from(search)),
    ]);
    let query = normalize(&contract, &raw, "listing");

    let mut foo = query.get_values("foo");
    assert_eq!(foo.len(), 5);
    foo.sort();
    assert_eq!(foo, vec!["a", "c", "d", "e", "f"]);

    assert_eq!(query.get("some"), Some(&FilterValue::Single("other".into())));
    assert_eq!(
        query.shareable_parameters().get("search").map(String::as_str),
        Some(search)
    );
    assert_eq!(query.raw_search_string(), search);
    assert_eq!(query.search_string(), "fulltext search");
    // The search parameter itself is not a declared filter.
    assert!(!query.has("search"));
}

#[test]
fn search_string_is_read_before_pipe_decoding() {
    let contract = search_contract();
    let raw = RawInput::from_pairs([("search", "some:x|y hello|world")]);
    let query = normalize(&contract, &raw, "listing");

    assert_eq!(query.raw_search_string(), "some:x|y hello|world");
    assert_eq!(query.get("some"), Some(&FilterValue::Single("x|y".into())));
    assert_eq!(query.search_string(), "hello|world");
}

#[test]
fn parsed_search_feeds_the_first_search_field() {
    let contract = InputContract::builder()
        .filter(FieldDescriptor::new("title", "Title"))
        .filter(FieldDescriptor::new("status", "Status").multiple())
        .parsed_search()
        .search_fields(["title"])
        .build()
        .expect("valid contract");
    let raw = RawInput::from_query_string("search=status:live+hello+%22big+world%22");
    let query = normalize(&contract, &raw, "listing");

    assert_eq!(query.search_string(), "hello big world");
    assert_eq!(
        query.get("title"),
        Some(&FilterValue::Single("hello big world".into()))
    );
    assert_eq!(query.get_values("status"), vec!["live"]);
}

#[test]
fn unparsed_search_passes_through() {
    let contract = InputContract::builder()
        .filter(FieldDescriptor::new("title", "Title"))
        .enable_search()
        .search_fields(["title"])
        .build()
        .expect("valid contract");
    let raw = RawInput::from_pairs([("search", "foo:bar baz"), ("title", "a|b")]);
    let query = normalize(&contract, &raw, "listing");

    assert_eq!(query.search_string(), "foo:bar baz");
    assert!(!query.has("foo"));
    // Full-text fields are space-joined, never piped.
    assert_eq!(query.get("title"), Some(&FilterValue::Single("a b".into())));
    assert_eq!(
        query.shareable_parameters().get("title").map(String::as_str),
        Some("a b")
    );
}

#[test]
fn blank_search_is_ignored() {
    let contract = search_contract();
    let raw = RawInput::from_pairs([("search", "   ")]);
    let query = normalize(&contract, &raw, "listing");

    assert_eq!(query.raw_search_string(), "");
    assert_eq!(query.search_string(), "");
}

#[test]
fn disabled_search_leaves_the_parameter_alone() {
    let contract = base_query_contract();
    let raw = RawInput::from_pairs([("search", "bar:x")]);
    let query = normalize(&contract, &raw, "listing");

    assert_eq!(query.search_string(), "");
    assert!(!query.has("bar"));
}

#[test]
fn grammar_keeps_order_and_duplicates() {
    let parsed = parse_search(r#"field1:13 foo:"bar baz" bar:2 bar:test bar:bar"#, "search");

    let fields: Vec<&str> = parsed.keys().collect();
    assert_eq!(fields, vec!["field1", "foo", "bar"]);
    assert_eq!(parsed.get("field1"), Some(&strings(&["13"])));
    assert_eq!(parsed.get("foo"), Some(&strings(&["bar baz"])));
    assert_eq!(parsed.get("bar"), Some(&strings(&["2", "test", "bar"])));
}

// ============================================================================
// Sort, paging, display
// ============================================================================

fn paging_contract() -> InputContract {
    InputContract::builder()
        .filter(FieldDescriptor::new("bar", "Bar"))
        .sort("created", "Created")
        .sort("title", "Title")
        .allow_limit(30)
        .build()
        .expect("valid contract")
}

#[test]
fn sort_field_must_be_allowed() {
    let contract = paging_contract();

    let query = normalize(&contract, &RawInput::from_query_string("st=secret&by=asc"), "l");
    assert_eq!(query.sort_field(), Some("created"));
    assert_eq!(query.sort_order(), SortOrder::Desc);

    let query = normalize(&contract, &RawInput::from_query_string("st=title&by=asc"), "l");
    assert_eq!(query.sort_field(), Some("title"));
    assert_eq!(query.sort_order(), SortOrder::Asc);

    let query = normalize(&contract, &RawInput::from_query_string("st=title&by=DESC"), "l");
    assert_eq!(query.sort_order(), SortOrder::Desc);

    let query = normalize(&contract, &RawInput::from_query_string("st=title&by=up"), "l");
    assert_eq!(query.sort_order(), SortOrder::Asc);
}

#[test]
fn sort_order_without_field_uses_the_default() {
    let contract = InputContract::builder()
        .sort("created", "Created")
        .default_sort("created", SortOrder::Asc)
        .build()
        .expect("valid contract");
    let query = normalize(&contract, &RawInput::from_query_string("st=created"), "l");
    assert_eq!(query.sort_order(), SortOrder::Asc);
}

#[test]
fn paging_is_clamped() {
    let contract = paging_contract();

    for page in ["0", "-4", "abc", ""] {
        let raw = RawInput::from_pairs([("page", page)]);
        assert_eq!(normalize(&contract, &raw, "l").page(), 1, "page={page}");
    }
    for limit in ["0", "-1", "none"] {
        let raw = RawInput::from_pairs([("limit", limit)]);
        assert_eq!(normalize(&contract, &raw, "l").limit(), 30, "limit={limit}");
    }

    let query = normalize(&contract, &RawInput::from_query_string("page=3&limit=10"), "l");
    assert_eq!(query.page(), 3);
    assert_eq!(query.limit(), 10);
    assert_eq!(query.offset(), 20);
}

#[test]
fn limit_and_pager_can_be_locked() {
    let contract = InputContract::builder()
        .default_limit(15)
        .disable_pager()
        .build()
        .expect("valid contract");
    let query = normalize(&contract, &RawInput::from_query_string("page=3&limit=10"), "l");
    assert_eq!(query.page(), 1);
    assert_eq!(query.limit(), 15);
    assert_eq!(query.offset(), 0);
}

#[test]
fn display_and_route_pass_through() {
    let contract = paging_contract();
    let raw = RawInput::from_query_string("disp=grid&_route=admin.content");
    let query = normalize(&contract, &raw, "admin.content");

    assert_eq!(query.current_display(), "grid");
    assert_eq!(query.route_name(), "admin.content");
    assert!(!query.shareable_parameters().contains_key("_route"));
}

// ============================================================================
// Filters
// ============================================================================

#[test]
fn undeclared_filters_are_dropped() {
    let contract = InputContract::builder()
        .filter(
            FieldDescriptor::new("status", "Status")
                .with_choices(ChoiceSet::from_pairs([("live", "Live")])),
        )
        .build()
        .expect("valid contract");
    let raw = RawInput::from_query_string("status=live&junk=1");
    let query = normalize(&contract, &raw, "l");

    assert!(query.has("status"));
    assert!(!query.has("junk"));
    assert_eq!(query.all().len(), 1);
}

#[test]
fn stored_links_rebuild_the_same_query() {
    let contract = base_query_contract();
    let raw = RawInput::from_query_string("foo[]=b&foo[]=z&bar=x&st=created&by=asc&page=2");
    let first = normalize(&contract, &raw, "listing");
    let second =
        normalize_from_shareable_parameters(&contract, first.shareable_parameters(), "listing");

    assert_eq!(first, second);
}
