//! Forking History
//!
//! This example demonstrates branches: every node in the log can sprout an
//! independent line of history, and every branch keeps a memoized residue.
//!
//! Key concepts:
//! - Extending a branch tip costs one reduction
//! - Forking an interior node creates a new branch, never disturbs the old
//! - The flat encoding round-trips values, parents, and residues
//!
//! Run with: cargo run --example forking

use accrete::record;
use accrete::tree::{Combine, Registry, Tree};

fn main() {
    println!("=== Forking History Example ===\n");

    let mut tree = Tree::new(record! { "balance" => 0.0 });
    let deposit = tree.add(record! { "balance" => 100.0 }).unwrap();
    tree.add(record! { "balance" => -30.0 }).unwrap();
    println!(
        "Trunk after deposit and withdrawal: {}",
        tree.residue(tree.last()).unwrap()
    );

    // What if the withdrawal had never happened? Fork the deposit node.
    let alternate = tree.add_to(record! { "balance" => -5.0 }, deposit).unwrap();
    println!(
        "Alternate history from node {}: {}",
        deposit,
        tree.residue(alternate).unwrap()
    );

    println!("\nBranches ({}):", tree.branches().len());
    for (i, branch) in tree.branches().iter().enumerate() {
        println!("  [{}] tip={} residue={}", i, branch.tip(), branch.residue());
    }

    let text = tree.encode().unwrap();
    println!("\nFlat encoding:\n  {text}");

    let replayed = Tree::decode(&text, Combine, &Registry::new()).unwrap();
    println!(
        "Replayed tree agrees at every tip: {}",
        tree.branch_tips()
            .iter()
            .all(|&tip| replayed.residue(tip).unwrap() == tree.residue(tip).unwrap())
    );

    println!("\nKey Takeaways:");
    println!("- Branches are append-only; forking never rewrites lineage");
    println!("- Residues are memoized per branch and recomputed only for forks");
    println!("- A bare integer in the encoding switches the replay cursor");

    println!("\n=== Example Complete ===");
}
