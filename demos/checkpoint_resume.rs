//! Checkpoint and Resume
//!
//! This example demonstrates checkpointing a branching log so a session can
//! survive a restart, including handlers that must be re-resolved by name.
//!
//! Key concepts:
//! - The checkpoint envelope carries a version, an id, and the encoded tree
//! - Restoring replays every add, so the reducer re-validates history
//! - Functions serialize by name and resolve through a registry
//!
//! Run with: cargo run --example checkpoint_resume

use accrete::cascade::{Handler, Message};
use accrete::checkpoint::Checkpoint;
use accrete::record;
use accrete::tree::{Combine, Registry, Tree};
use accrete::value::Value;

fn inc_handler() -> Handler {
    Handler::new("inc", |_core: &Value, msg: &Message| {
        let amount = msg
            .payload
            .get("amount")
            .and_then(Value::as_number)
            .unwrap_or(1.0);
        Ok(record! { "total" => amount })
    })
}

fn main() {
    println!("=== Checkpoint and Resume Example ===\n");

    // Session 1: accumulate some history.
    let mut tree = Tree::new(record! { "total" => 0.0 });
    tree.add(Value::Handler(inc_handler())).unwrap();
    tree.add(Message::new("inc").field("amount", 10.0).into())
        .unwrap();
    tree.add(Message::new("inc").field("amount", 32.0).into())
        .unwrap();
    println!(
        "Session 1 total: {}",
        tree.residue(tree.last()).unwrap().get("total").unwrap()
    );

    let checkpoint = Checkpoint::capture(&tree).unwrap();
    let json = checkpoint.to_json().unwrap();
    println!(
        "Captured checkpoint {} (version {}, {} bytes as JSON)",
        checkpoint.id,
        checkpoint.version,
        json.len()
    );

    // Session 2: a fresh process parses the envelope and resumes. The
    // handler is resolved by name through the registry.
    let parsed = Checkpoint::from_json(&json).unwrap();
    let registry = Registry::new().with_handler(inc_handler());
    let mut resumed = parsed.restore(Combine, &registry).unwrap();
    println!(
        "Resumed with {} nodes; total = {}",
        resumed.node_count(),
        resumed.residue(resumed.last()).unwrap().get("total").unwrap()
    );

    resumed
        .add(Message::new("inc").field("amount", 5.0).into())
        .unwrap();
    println!(
        "After one more increment: total = {}",
        resumed.residue(resumed.last()).unwrap().get("total").unwrap()
    );

    // A checkpoint from a foreign format version is refused outright.
    let mut foreign = checkpoint.clone();
    foreign.version = 99;
    match foreign.restore(Combine, &registry) {
        Ok(_) => println!("unexpected: foreign version restored"),
        Err(err) => println!("Foreign checkpoint refused: {err}"),
    }

    println!("\nKey Takeaways:");
    println!("- The raw log format stays bare; the envelope carries versioning");
    println!("- Restore is a full replay, so invalid history cannot sneak back in");
    println!("- Registries are the replay seam for named functions");

    println!("\n=== Example Complete ===");
}
