use data_loader::RatingIndex;
use std::path::Path;
use std::time::Instant;

fn main() {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/ratings.txt".to_string());

    println!("Loading ratings from {}...\n", path);

    let start = Instant::now();
    let (index, queries) = RatingIndex::load_from_file(Path::new(&path))
        .expect("Failed to load ratings");
    let elapsed = start.elapsed();

    let (users, items, ratings) = index.counts();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Users: {}", users);
    println!("Items: {}", items);
    println!("Ratings: {}", ratings);
    println!("Queries: {}", queries.len());
    println!("\nPerformance: {:.0} ratings/second",
             ratings as f64 / elapsed.as_secs_f64());
}
