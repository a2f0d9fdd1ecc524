//! Demonstrates the single-owner `Lexicon` and the typed `Inter` adapter as a
//! small stock ledger.
//!
//! Run with: cargo run --example inventory

use sovran_lexicon::{Inter, Lexicon, MapError};

fn main() -> Result<(), MapError> {
    env_logger::init();

    // Plain lexicon for the price list
    let mut prices = Lexicon::new();
    prices
        .add("apple", 120u32)
        .add("banana", 45)
        .add("cherry", 600)
        .add("durian", 1500);

    // Typed, shareable lexicon for the stock counts
    let stock = Inter::<&str>::new();
    stock.add_many([vec![("apple", 30), ("banana", 120)], vec![("cherry", 4)]])?;

    // A delivery arrives; only new products are registered
    let registered = stock.add_many_ok([[("apple", 999), ("durian", 2)]])?;
    println!("Delivery registered new products: {:?}", registered);

    // Sell a few items
    stock.with_mut("banana", |count| *count -= 20)?;
    stock.with_mut("cherry", |count| *count -= 4)?;

    // Products that sold out
    let sold_out = stock.filter(|_, count| *count == 0)?.keys()?;
    println!("Sold out: {:?}", sold_out);

    // Value of what is left, in cents
    let mut total = 0u64;
    stock.each(|product, count| {
        let price = prices.fetch(product);
        total += price as u64 * (*count).max(0) as u64;
    })?;
    println!("Stock value: ${}.{:02}", total / 100, total % 100);

    // Drop products nobody buys, then stop selling them
    stock.delete_many_func(|_, count| *count == 0)?;
    prices.delete_many_func(|product, _| !matches!(stock.has(product), Ok(true)));
    println!("Still listed: {} products", prices.len());

    // Restock everything that runs low
    stock.replace_many(|_, count| (*count < 10).then(|| count + 50))?;

    let mut report = stock.snapshot()?.into_iter().collect::<Vec<_>>();
    report.sort();
    for (product, count) in report {
        println!("  {:<8} {:>4}", product, count);
    }

    Ok(())
}
