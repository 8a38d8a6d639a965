use ahash::AHashMap;
use clap::Parser;
use rand::{Rng, rngs::ThreadRng};
use serde_json::{Value, json};
use std::fs;
use tenkai::condition::{Condition, Predicate};
use tenkai::node::{Collection, Limit, Node, NodeKind, Screen, SortDescriptor, Stack};
use tenkai::transform::RuntimeData;

const TAGS: [&str; 8] = [
    "news", "sport", "music", "travel", "food", "science", "design", "games",
];

/// A CLI tool to generate a synthetic experience and runtime context for tenkai
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated experience JSON to
    #[arg(long, default_value = "generated_experience.json")]
    experience: String,

    /// The path to write the generated runtime context JSON to
    #[arg(long, default_value = "generated_context.json")]
    context: String,

    /// The number of feeds (top-level collections) on the screen
    #[arg(long, default_value_t = 3)]
    feeds: usize,

    /// The minimum number of posts per feed
    #[arg(long, default_value_t = 0)]
    min: usize,

    /// The maximum number of posts per feed
    #[arg(long, default_value_t = 20)]
    max: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut rng = rand::rng();

    if cli.min > cli.max {
        eprintln!(
            "Error: --min ({}) cannot be greater than --max ({})",
            cli.min, cli.max
        );
        std::process::exit(1);
    }

    println!(
        "Generating a screen with {} feed(s) ({} to {} posts each)...",
        cli.feeds, cli.min, cli.max
    );

    let mut nodes = vec![Node::new("home", NodeKind::Screen(Screen::default())).with_children(["root"])];
    let mut feed_ids = Vec::with_capacity(cli.feeds);
    let mut runtime = RuntimeData::default();

    for feed in 0..cli.feeds {
        let (feed_nodes, data_source_id) = generate_feed(feed);
        nodes.extend(feed_nodes);
        feed_ids.push(data_source_id.clone());

        let count = rng.random_range(cli.min..=cli.max);
        let posts: Vec<Value> = (0..count).map(|post| generate_post(&mut rng, post)).collect();
        runtime.payloads.insert(data_source_id, json!({ "posts": posts, "title": format!("Feed {}", feed) }));
        println!("-> Generated feed {} with {} post(s).", feed, count);
    }
    nodes.push(
        Node::new("root", NodeKind::VStack(Stack { spacing: 16.0 })).with_children(feed_ids),
    );

    runtime.user_info = generate_user(&mut rng);
    runtime
        .url_parameters
        .insert("utm_source".to_string(), "doc-gen".to_string());

    let document = json!({ "initialScreenID": "home", "nodes": nodes });
    fs::write(&cli.experience, serde_json::to_string_pretty(&document)?)?;
    fs::write(&cli.context, serde_json::to_string_pretty(&runtime)?)?;

    println!(
        "Successfully generated and saved '{}' and '{}'",
        cli.experience, cli.context
    );
    println!("Collections resolve their items from the feed payloads: run tenkai-cli with --resolve-missing-items.");

    Ok(())
}

/// A data source wrapping a collection of post cards. Each card holds a title, a
/// badge gated on `data.featured`, and a nested collection of tags.
fn generate_feed(feed: usize) -> (Vec<Node>, String) {
    let id = |suffix: &str| format!("feed{}-{}", feed, suffix);

    let nodes = vec![
        Node::new(id("source"), NodeKind::data_source(format!("https://example.com/feeds/{}", feed)))
            .with_children([id("heading"), id("posts")]),
        Node::new(id("heading"), NodeKind::text("{{ uppercase data.title }}")),
        Node::new(
            id("posts"),
            NodeKind::Collection(Collection {
                key_path: "data.posts".to_string(),
                filters: vec![Condition::new("data.hidden", Predicate::DoesNotEqual, Some(json!(true)))],
                sort_descriptors: vec![SortDescriptor {
                    key_path: "data.likes".to_string(),
                    ascending: false,
                }],
                limit: Some(Limit { show: 10, start_at: 1 }),
            }),
        )
        .with_children([id("card")]),
        Node::new(id("card"), NodeKind::VStack(Stack { spacing: 4.0 }))
            .with_children([id("title"), id("featured"), id("tags")]),
        Node::new(id("title"), NodeKind::text("{{ data.title }} ({{ data.likes }} likes)")),
        Node::new(
            id("featured"),
            NodeKind::conditional(vec![Condition::new("data.featured", Predicate::IsTrue, None)]),
        )
        .with_children([id("badge")]),
        Node::new(id("badge"), NodeKind::text("Picked for {{ user.firstName }}")),
        Node::new(id("tags"), NodeKind::collection("data.tags")).with_children([id("tag")]),
        Node::new(id("tag"), NodeKind::text("#{{ data.name }}")),
    ];
    (nodes, id("source"))
}

fn generate_post(rng: &mut ThreadRng, post: usize) -> Value {
    let tag_count = rng.random_range(0..=3);
    let tags: Vec<Value> = (0..tag_count)
        .map(|_| json!({ "name": TAGS[rng.random_range(0..TAGS.len())] }))
        .collect();
    json!({
        "title": format!("Post {}", post),
        "likes": rng.random_range(0..5000),
        "featured": rng.random_bool(0.2),
        "hidden": rng.random_bool(0.1),
        "tags": tags,
    })
}

fn generate_user(rng: &mut ThreadRng) -> AHashMap<String, Value> {
    let names = ["Ada", "Grace", "Linus", "Barbara", "Ken"];
    let mut user = AHashMap::new();
    user.insert(
        "firstName".to_string(),
        json!(names[rng.random_range(0..names.len())]),
    );
    user.insert("isPremium".to_string(), json!(rng.random_bool(0.5)));
    user
}
