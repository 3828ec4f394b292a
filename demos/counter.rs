//! Counter Cascade
//!
//! This example demonstrates the handler cascade end to end: registering a
//! handler, dispatching messages, and watching the reducer gate history.
//!
//! Key concepts:
//! - Handlers are values; registering one is just a combine
//! - Messages are recorded in causal order with stable ids
//! - A handler failure rejects the add atomically
//!
//! Run with: cargo run --example counter

use accrete::cascade::{Handler, Message};
use accrete::record;
use accrete::tree::Tree;
use accrete::value::Value;
use accrete::CombineError;

fn dec_handler() -> Handler {
    Handler::new("dec", |core: &Value, msg: &Message| {
        let count = core.get("count").and_then(Value::as_number).unwrap_or(0.0);
        if count <= 0.0 {
            return Err(CombineError::HandlerFailed {
                name: "dec".to_string(),
                reason: format!("count is exhausted at {count}"),
            });
        }
        let amount = msg
            .payload
            .get("amount")
            .and_then(Value::as_number)
            .unwrap_or(1.0);
        Ok(record! { "count" => -amount })
    })
}

fn main() {
    println!("=== Counter Cascade Example ===\n");

    let mut tree = Tree::new(record! { "count" => 100.0 });
    tree.add(Value::Handler(dec_handler())).unwrap();
    println!("Registered 'dec' against a counter starting at 100");

    for _ in 0..3 {
        tree.add(Message::new("dec").into()).unwrap();
    }
    tree.add(Message::new("dec").field("amount", 50.0).into())
        .unwrap();

    let residue = tree.residue(tree.last()).unwrap();
    println!(
        "After three unit decrements and one of 50: count = {}",
        residue.get("count").unwrap()
    );

    // Push the counter below zero, then watch the gate close.
    tree.add(Message::new("dec").field("amount", 200.0).into())
        .unwrap();
    let residue = tree.residue(tree.last()).unwrap();
    println!("After an oversized decrement: count = {}", residue.get("count").unwrap());

    let nodes_before = tree.node_count();
    match tree.add(Message::new("dec").into()) {
        Ok(_) => println!("unexpected: the exhausted counter accepted a decrement"),
        Err(err) => println!("Further decrements are refused: {err}"),
    }
    println!(
        "History is untouched by the refusal: {} nodes before, {} after",
        nodes_before,
        tree.node_count()
    );

    println!("\nKey Takeaways:");
    println!("- Dispatch appends to the causal message log and folds patches in order");
    println!("- The reducer doubles as a validity gate over history");
    println!("- A rejected message never becomes a node");

    println!("\n=== Example Complete ===");
}
