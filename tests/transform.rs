//! Tests for the screen transformation pipeline.
mod common;
use common::*;
use serde_json::json;
use tenkai::prelude::*;

fn missing_key_is_true() -> Vec<Condition> {
    vec![Condition::new("data.missing", Predicate::IsTrue, None)]
}

#[test]
fn test_flat_tree_is_unchanged() {
    let nodes = vec![
        screen("s", &["a", "stack", "b"]),
        rect("a"),
        vstack("stack", &["c", "d"]),
        rect("b"),
        text("c", "hello"),
        rect("d"),
    ];
    let experience = experience(nodes.clone());
    let transformer = Transformer::builder(&experience).build();
    let result = transformer.transform("s").expect("Failed to transform");

    assert_eq!(child_ids(&result, "s"), vec!["a", "stack", "b"]);
    assert_eq!(child_ids(&result, "stack"), vec!["c", "d"]);
    assert_eq!(result.len(), nodes.len());
    for node in &nodes {
        assert_eq!(result.node(&node.id), Some(node), "node {} changed", node.id);
    }
    assert!(result.collection_node_ids().is_empty());
}

#[test]
fn test_screen_is_emitted_first_in_pre_order() {
    let experience = experience(vec![
        screen("s", &["stack", "b"]),
        vstack("stack", &["a"]),
        rect("a"),
        rect("b"),
    ]);
    let result = Transformer::builder(&experience)
        .build()
        .transform("s")
        .expect("Failed to transform");
    assert_eq!(result.node_ids().collect::<Vec<_>>(), vec!["s", "stack", "a", "b"]);
    assert_eq!(result.screen().map(|node| node.id.as_str()), Some("s"));
}

#[test]
fn test_data_source_is_transparent() {
    let experience = experience(vec![
        screen("s", &["before", "ds", "after"]),
        rect("before"),
        data_source("ds", &["x", "y"]),
        text("x", "{{ data.title }}"),
        rect("y"),
        rect("after"),
    ]);
    let transformer = Transformer::builder(&experience)
        .with_payload("ds", json!({ "title": "Fetched" }))
        .build();
    let result = transformer.transform("s").expect("Failed to transform");

    assert_eq!(child_ids(&result, "s"), vec!["before", "x", "y", "after"]);
    assert!(!result.contains("ds"));
    assert_eq!(result.data_for("x"), Some(&json!({ "title": "Fetched" })));
    assert_eq!(result.data_for("before"), None);

    let interpolator = transformer.interpolator_for(&result, "x");
    assert_eq!(
        interpolator.interpolate("{{ data.title }}"),
        Ok(Some("Fetched".to_string()))
    );
}

#[test]
fn test_data_source_without_payload_still_splices_children() {
    let experience = experience(vec![
        screen("s", &["outer"]),
        data_source("outer", &["inner"]),
        data_source("inner", &["x"]),
        rect("x"),
    ]);
    let result = Transformer::builder(&experience)
        .with_payload("outer", json!({ "a": 1 }))
        .build()
        .transform("s")
        .expect("Failed to transform");

    assert_eq!(child_ids(&result, "s"), vec!["x"]);
    // The unloaded inner source hides the outer payload.
    assert_eq!(result.data_for("x"), None);
}

#[test]
fn test_data_source_without_children_contributes_nothing() {
    let experience = experience(vec![
        screen("s", &["a", "ds", "b"]),
        rect("a"),
        data_source("ds", &[]),
        rect("b"),
    ]);
    let result = Transformer::builder(&experience)
        .with_payload("ds", json!({}))
        .build()
        .transform("s")
        .expect("Failed to transform");
    assert_eq!(child_ids(&result, "s"), vec!["a", "b"]);
}

#[test]
fn test_conditional_gate() {
    let experience = experience(vec![
        screen("s", &["yes", "no"]),
        conditional(
            "yes",
            vec![Condition::new("user.plan", Predicate::Equals, Some(json!("pro")))],
            &["pro-badge"],
        ),
        conditional(
            "no",
            vec![Condition::new("user.plan", Predicate::Equals, Some(json!("free")))],
            &["free-badge"],
        ),
        rect("pro-badge"),
        rect("free-badge"),
    ]);
    let result = Transformer::builder(&experience)
        .with_user_info(user_info(&[("plan", json!("pro"))]))
        .build()
        .transform("s")
        .expect("Failed to transform");

    assert_eq!(child_ids(&result, "s"), vec!["pro-badge"]);
    assert!(!result.contains("yes"));
    assert!(!result.contains("no"));
    assert!(!result.contains("free-badge"));
}

#[test]
fn test_conditional_with_no_conditions_is_kept() {
    let experience = experience(vec![
        screen("s", &["c"]),
        conditional("c", vec![], &["r"]),
        rect("r"),
    ]);
    let result = Transformer::builder(&experience)
        .build()
        .transform("s")
        .expect("Failed to transform");
    assert_eq!(child_ids(&result, "s"), vec!["r"]);
}

#[test]
fn test_false_conditional_prunes_nested_collections() {
    let experience = experience(vec![
        screen("s", &["gate", "after"]),
        conditional("gate", missing_key_is_true(), &["list"]),
        collection("list", &["row"]),
        rect("row"),
        rect("after"),
    ]);
    let result = Transformer::builder(&experience)
        .with_items("list", items(3))
        .build()
        .transform("s")
        .expect("Failed to transform");

    assert_eq!(child_ids(&result, "s"), vec!["after"]);
    assert_eq!(result.len(), 2);
    assert!(result.collection_node_ids().is_empty());
}

#[test]
fn test_collection_end_to_end() {
    let experience = experience(vec![screen("s", &["K"]), collection("K", &["R"]), rect("R")]);
    let result = Transformer::builder(&experience)
        .with_items("K", vec![json!("a"), json!("b"), json!("c")])
        .build()
        .transform("s")
        .expect("Failed to transform");

    assert_eq!(child_ids(&result, "s"), vec!["K-0-R", "K-1-R", "K-2-R"]);
    assert_eq!(result.collection_node_ids(), vec!["K-0-R", "K-1-R", "K-2-R"]);
    assert_eq!(result.len(), 4);
    for id in ["K-0-R", "K-1-R", "K-2-R"] {
        assert_eq!(result.node(id).map(|node| node.type_name()), Some("Rectangle"));
    }
    assert!(!result.contains("R"));
    assert!(!result.contains("K"));
    assert_eq!(result.data_for("K-1-R"), Some(&json!("b")));
}

#[test]
fn test_collection_ids_are_unique_per_item() {
    let experience = experience(vec![
        screen("s", &["C"]),
        collection("C", &["card"]),
        vstack("card", &["title", "r"]),
        text("title", "{{ data.index }}"),
        rect("r"),
    ]);
    let n = 4;
    let result = Transformer::builder(&experience)
        .with_items("C", items(n))
        .build()
        .transform("s")
        .expect("Failed to transform");

    for i in 0..n {
        let card = format!("C-{i}-card");
        assert_eq!(child_ids(&result, &card), vec![format!("C-{i}-title"), format!("C-{i}-r")]);
        assert!(result.contains(&format!("C-{i}-r")));
        assert_eq!(result.data_for(&format!("C-{i}-title")), Some(&json!({ "index": i })));
    }
    assert!(!result.contains("r"));
    assert!(!result.contains("card"));
    assert_eq!(result.len(), 1 + 3 * n);
    // Only the replica roots are recorded.
    assert_eq!(
        result.collection_node_ids(),
        (0..n).map(|i| format!("C-{i}-card")).collect::<Vec<_>>()
    );
}

#[test]
fn test_order_is_preserved_around_collections() {
    let experience = experience(vec![
        screen("s", &["rect2", "C", "rect3"]),
        rect("rect2"),
        collection("C", &["r"]),
        rect("r"),
        rect("rect3"),
    ]);
    let result = Transformer::builder(&experience)
        .with_items("C", items(3))
        .build()
        .transform("s")
        .expect("Failed to transform");
    assert_eq!(
        child_ids(&result, "s"),
        vec!["rect2", "C-0-r", "C-1-r", "C-2-r", "rect3"]
    );
}

#[test]
fn test_nested_collections_multiply() {
    let experience = experience(vec![
        screen("s", &["C1"]),
        collection("C1", &["C2"]),
        collection("C2", &["r"]),
        rect("r"),
    ]);
    let result = Transformer::builder(&experience)
        .with_items("C1", items(2))
        .with_items("C2", items(3))
        .build()
        .transform("s")
        .expect("Failed to transform");

    let expected: Vec<String> = (0..2)
        .flat_map(|i| (0..3).map(move |j| format!("C1-{i}-C2-{j}-r")))
        .collect();
    assert_eq!(child_ids(&result, "s"), expected);
    assert_eq!(result.collection_node_ids(), expected);
    assert_eq!(result.len(), 1 + 6);
}

#[test]
fn test_nested_collection_scopes_shadow_outer_items() {
    let experience = experience(vec![
        screen("s", &["outer"]),
        Node::new("outer", NodeKind::collection("data.groups")).with_children(["group"]),
        vstack("group", &["inner"]),
        Node::new("inner", NodeKind::collection("data.members")).with_children(["member"]),
        text("member", "{{ data.name }}"),
    ]);
    let payload = json!({
        "groups": [
            { "members": [{ "name": "Ada" }, { "name": "Alan" }] },
            { "members": [{ "name": "Grace" }] }
        ]
    });
    let transformer = Transformer::builder(&experience)
        .with_items("outer", payload["groups"].as_array().cloned().unwrap_or_default())
        .resolve_missing_items(true)
        .build();
    let result = transformer.transform("s").expect("Failed to transform");

    assert_eq!(child_ids(&result, "outer-0-group"), vec!["outer-0-inner-0-member", "outer-0-inner-1-member"]);
    assert_eq!(child_ids(&result, "outer-1-group"), vec!["outer-1-inner-0-member"]);

    let names: Vec<String> = ["outer-0-inner-0-member", "outer-0-inner-1-member", "outer-1-inner-0-member"]
        .iter()
        .map(|id| {
            transformer
                .interpolator_for(&result, id)
                .interpolate_or_original("{{ data.name }}")
        })
        .collect();
    assert_eq!(names, vec!["Ada", "Alan", "Grace"]);
    assert_eq!(
        result.collection_node_ids(),
        vec![
            "outer-0-group",
            "outer-1-group",
            "outer-0-inner-0-member",
            "outer-0-inner-1-member",
            "outer-1-inner-0-member"
        ]
    );
}

#[test]
fn test_false_conditional_inside_collection() {
    let experience = experience(vec![
        screen("s", &["C"]),
        collection("C", &["gate"]),
        conditional("gate", missing_key_is_true(), &["R"]),
        rect("R"),
    ]);
    let result = Transformer::builder(&experience)
        .with_items("C", vec![json!("a"), json!("b")])
        .build()
        .transform("s")
        .expect("Failed to transform");

    assert!(child_ids(&result, "s").is_empty());
    assert!(result.collection_node_ids().is_empty());
    assert_eq!(result.len(), 1);
}

#[test]
fn test_conditionals_see_the_item_scope() {
    let experience = experience(vec![
        screen("s", &["C"]),
        collection("C", &["gate"]),
        conditional(
            "gate",
            vec![Condition::new("data.featured", Predicate::IsTrue, None)],
            &["star"],
        ),
        rect("star"),
    ]);
    let result = Transformer::builder(&experience)
        .with_items(
            "C",
            vec![
                json!({ "featured": false }),
                json!({ "featured": true }),
                json!({}),
                json!({ "featured": "true" }),
            ],
        )
        .build()
        .transform("s")
        .expect("Failed to transform");

    assert_eq!(child_ids(&result, "s"), vec!["C-1-star", "C-3-star"]);
    assert_eq!(result.collection_node_ids(), vec!["C-1-star", "C-3-star"]);
}

#[test]
fn test_transparent_wrappers_inside_replicas_record_effective_children() {
    let experience = experience(vec![
        screen("s", &["C"]),
        collection("C", &["ds", "plain"]),
        data_source("ds", &["wrapped"]),
        rect("wrapped"),
        rect("plain"),
    ]);
    let result = Transformer::builder(&experience)
        .with_items("C", items(2))
        .build()
        .transform("s")
        .expect("Failed to transform");
    assert_eq!(
        result.collection_node_ids(),
        vec!["C-0-wrapped", "C-0-plain", "C-1-wrapped", "C-1-plain"]
    );
}

#[test]
fn test_absent_or_null_items_mean_no_replicas() {
    let experience = experience(vec![
        screen("s", &["absent", "null", "empty", "tail"]),
        collection("absent", &["a"]),
        collection("null", &["b"]),
        collection("empty", &["c"]),
        rect("a"),
        rect("b"),
        rect("c"),
        rect("tail"),
    ]);
    let result = Transformer::builder(&experience)
        .with_null_items("null")
        .with_items("empty", vec![])
        .build()
        .transform("s")
        .expect("Failed to transform");
    assert_eq!(child_ids(&result, "s"), vec!["tail"]);
    assert!(result.collection_node_ids().is_empty());
}

#[test]
fn test_collections_resolve_their_own_items_when_enabled() {
    let experience = experience(vec![
        screen("s", &["ds"]),
        data_source("ds", &["products"]),
        Node::new(
            "products",
            NodeKind::Collection(Collection {
                key_path: "data.products".to_string(),
                filters: vec![Condition::new("data.stock", Predicate::IsGreaterThan, Some(json!(0)))],
                sort_descriptors: vec![tenkai::node::SortDescriptor {
                    key_path: "data.price".to_string(),
                    ascending: true,
                }],
                limit: Some(tenkai::node::Limit { show: 2, start_at: 2 }),
            }),
        )
        .with_children(["name"]),
        text("name", "{{ data.name }}"),
    ]);
    let payload = json!({
        "products": [
            { "name": "lamp", "price": 40, "stock": 3 },
            { "name": "chair", "price": 25, "stock": 0 },
            { "name": "desk", "price": 120, "stock": 1 },
            { "name": "mug", "price": 8, "stock": 12 },
            { "name": "rug", "price": 60, "stock": 2 }
        ]
    });

    let disabled = Transformer::builder(&experience)
        .with_payload("ds", payload.clone())
        .build()
        .transform("s")
        .expect("Failed to transform");
    assert!(child_ids(&disabled, "s").is_empty());

    let transformer = Transformer::builder(&experience)
        .with_payload("ds", payload)
        .resolve_missing_items(true)
        .build();
    let result = transformer.transform("s").expect("Failed to transform");
    // In stock, by price: mug, lamp, rug, desk. Starting at the second, show two.
    assert_eq!(child_ids(&result, "s"), vec!["products-0-name", "products-1-name"]);
    assert_eq!(result.data_for("products-0-name").and_then(|d| d.get("name")), Some(&json!("lamp")));
    assert_eq!(result.data_for("products-1-name").and_then(|d| d.get("name")), Some(&json!("rug")));
}

#[test]
fn test_supplied_items_take_precedence_over_resolution() {
    let experience = experience(vec![screen("s", &["C"]), collection("C", &["r"]), rect("r")]);
    let result = Transformer::builder(&experience)
        .with_null_items("C")
        .resolve_missing_items(true)
        .build()
        .transform("s")
        .expect("Failed to transform");
    assert!(child_ids(&result, "s").is_empty());
}

#[test]
fn test_resolve_items_directly() {
    let collection = Collection {
        key_path: "data.list".to_string(),
        ..Collection::default()
    };
    let user = UserInfo::new();
    let url = UrlParameters::new();
    let functions = FunctionRegistry::default();
    let data = json!({ "list": [1, 2, 3], "notAList": { "a": 1 } });
    let context = DataContext::new(&user, &url).with_data(&data);
    assert_eq!(collection.resolve_items(&context, &functions), vec![json!(1), json!(2), json!(3)]);

    let not_a_list = Collection {
        key_path: "data.notAList".to_string(),
        ..Collection::default()
    };
    assert!(resolve_items(&not_a_list, &context, &functions).is_empty());
}

#[test]
fn test_unknown_screen() {
    let experience = experience(vec![screen("s", &[]), rect("r")]);
    let transformer = Transformer::builder(&experience).build();
    assert_eq!(
        transformer.transform("missing"),
        Err(TransformError::ScreenNotFound("missing".to_string()))
    );
    assert_eq!(
        transformer.transform("r"),
        Err(TransformError::NotAScreen {
            node_id: "r".to_string(),
            type_name: "Rectangle".to_string()
        })
    );
}

#[test]
fn test_dangling_child_reference() {
    let experience = experience(vec![screen("s", &["stack"]), vstack("stack", &["ghost"])]);
    let result = Transformer::builder(&experience).build().transform("s");
    assert_eq!(
        result,
        Err(TransformError::NodeNotFound {
            missing_node_id: "ghost".to_string(),
            parent_node_id: "stack".to_string()
        })
    );
}

#[test]
fn test_cycles_are_rejected() {
    let experience = experience(vec![
        screen("s", &["a"]),
        vstack("a", &["b"]),
        conditional("b", vec![], &["a"]),
    ]);
    let result = Transformer::builder(&experience).build().transform("s");
    assert_eq!(result, Err(TransformError::CycleDetected("a".to_string())));
}

#[test]
fn test_colliding_output_ids_are_rejected() {
    // An author ID that already looks like a rewritten replica ID.
    let experience = experience(vec![
        screen("s", &["C", "C-0-r"]),
        collection("C", &["r"]),
        rect("r"),
        rect("C-0-r"),
    ]);
    let result = Transformer::builder(&experience)
        .with_items("C", items(1))
        .build()
        .transform("s");
    assert_eq!(result, Err(TransformError::DuplicateOutputId("C-0-r".to_string())));
}

#[test]
fn test_non_container_children_are_ignored() {
    let experience = experience(vec![
        screen("s", &["t"]),
        text("t", "leaf").with_children(["nowhere"]),
    ]);
    let result = Transformer::builder(&experience)
        .build()
        .transform("s")
        .expect("Failed to transform");
    assert_eq!(child_ids(&result, "t"), Vec::<&str>::new());
}

#[test]
fn test_transformation_is_deterministic() {
    let experience = experience(vec![
        screen("s", &["C1", "gate"]),
        collection("C1", &["C2", "r1"]),
        collection("C2", &["r2"]),
        rect("r1"),
        rect("r2"),
        conditional("gate", vec![], &["r3"]),
        rect("r3"),
    ]);
    let transformer = Transformer::builder(&experience)
        .with_items("C1", items(3))
        .with_items("C2", items(2))
        .build();
    let first = transformer.transform("s").expect("Failed to transform");
    let second = transformer.transform("s").expect("Failed to transform");
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).expect("serialize"),
        serde_json::to_string(&second).expect("serialize")
    );
}

#[test]
fn test_transformers_are_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Transformer<'static>>();
    assert_send_sync::<TransformedScreen>();

    let experience = experience(vec![screen("s", &["C"]), collection("C", &["r"]), rect("r")]);
    let transformer = Transformer::builder(&experience).with_items("C", items(5)).build();
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| transformer.transform("s").map(|screen| screen.len())))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().expect("thread panicked"), Ok(6));
        }
    });
}

#[test]
fn test_node_lookup_matches_the_emitted_nodes() {
    let experience = experience(vec![screen("s", &["C"]), collection("C", &["r"]), rect("r")]);
    let result = Transformer::builder(&experience)
        .with_items("C", items(2))
        .build()
        .transform("s")
        .expect("Failed to transform");

    for node in result.nodes() {
        assert_eq!(result.node(&node.id), Some(node));
    }
    assert_eq!(result.node("C-2-r"), None);
    assert_eq!(result.children_of("missing"), Vec::<&Node>::new());

    let owned = result.clone().into_nodes();
    assert_eq!(owned.len(), 3);
    assert_eq!(owned.as_slice(), result.nodes());
    assert_eq!(result.node("C-1-r").map(|node| node.id.as_str()), Some("C-1-r"));
}

#[test]
fn test_context_for_unknown_node_is_the_root_context() {
    let experience = experience(vec![screen("s", &[])]);
    let transformer = Transformer::builder(&experience)
        .with_url_parameters(url_parameters(&[("ref", "ad")]))
        .build();
    let result = transformer.transform("s").expect("Failed to transform");
    let context = transformer.context_for(&result, "nope");
    assert!(context.data().is_none());
    assert_eq!(
        context.resolve_key_path("url.ref").as_deref(),
        Some(&json!("ad"))
    );
}

#[test]
fn test_initial_screen() {
    let experience = experience(vec![rect("r"), screen("first", &[]), screen("second", &["r"])])
        .with_initial_screen("second")
        .expect("second is a screen");
    let result = Transformer::builder(&experience)
        .build()
        .transform_initial_screen()
        .expect("Failed to transform");
    assert_eq!(result.screen_id, "second");

    let fallback = experience_without_initial();
    let result = Transformer::builder(&fallback)
        .build()
        .transform_initial_screen()
        .expect("Failed to transform");
    assert_eq!(result.screen_id, "first");
}

fn experience_without_initial() -> Experience {
    experience(vec![rect("r"), screen("first", &[]), screen("second", &["r"])])
}

#[test]
fn test_transform_free_function() {
    let experience = experience(vec![screen("s", &["C"]), collection("C", &["r"]), rect("r")]);
    let mut runtime = RuntimeData::default();
    runtime.items.insert("C".to_string(), Some(items(2)));
    let result = tenkai::transform::transform(&experience, "s", runtime).expect("Failed to transform");
    assert_eq!(result.collection_node_ids(), vec!["C-0-r", "C-1-r"]);
}
