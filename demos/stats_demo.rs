use std::collections::hash_map::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;

use clap::Parser;
use robin_hash::HashTable;
use robin_hash::hash_table::Entry;

#[derive(Parser, Debug)]
struct Args {
    /// Number of values to insert.
    #[arg(short = 'n', long = "count", default_value_t = 1000)]
    count: u64,

    /// Remove every value not divisible by this after filling.
    #[arg(short = 'k', long = "keep_every")]
    keep_every: Option<u64>,
}

fn hash_u64(value: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn report(table: &HashTable<u64>) {
    println!(
        "Load factor: {:.2}% ({} of {} buckets)",
        (table.len() as f64 / table.capacity() as f64) * 100.0,
        table.len(),
        table.capacity()
    );
    table.print_probe_histogram();
    table.debug_stats().print();
}

fn main() {
    let args = Args::parse();

    let mut table: HashTable<u64> = HashTable::new();
    println!("Initial capacity: {}", table.capacity());
    println!("Filling table with {} u64 values...", args.count);

    let mut resizes = 0;
    for value in 0..args.count {
        let before = table.capacity();
        match table.entry(hash_u64(value), |&v| v == value) {
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
            Entry::Occupied(_) => {
                panic!("Value already exists in table: {}", value);
            }
        }
        if table.capacity() != before {
            resizes += 1;
        }
    }

    println!("Inserted {} values after {} resizes", table.len(), resizes);
    report(&table);

    if let Some(keep_every) = args.keep_every.filter(|&k| k > 0) {
        for value in (0..args.count).filter(|v| v % keep_every != 0) {
            table.remove(hash_u64(value), |&v| v == value);
        }
        println!();
        println!("After keeping every {}th value:", keep_every);
        report(&table);
    }
}
