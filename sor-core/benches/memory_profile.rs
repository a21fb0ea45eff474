use std::sync::Arc;
use std::time::Instant;

use sor_core::cache::{HeuristicCache, QuoteCache};
use sor_core::graph::builder::{build_graph, PoolRecord, TokenRecord};
use sor_core::graph::pool::PoolVariant;
use sor_core::graph::Graph;
use sor_core::routing::{QuoteRequest, Quoter, RoutingConfig};
use sor_core::utils::address_from_u64;

/// Rough, non-criterion memory/latency profile. Run with:
/// `cargo run --release --bin memory_profile` is not wired up (this file
/// lives under benches/ so `cargo bench` builds it); invoke it directly
/// via the built binary under target/release/.

fn token_record(n: u64, symbol: &str, decimals: u8, reserve: u128) -> TokenRecord {
    TokenRecord {
        addr: address_from_u64(n),
        symbol: symbol.to_string(),
        decimals,
        reserve_raw: reserve,
    }
}

fn setup_large_graph(token_count: usize) -> Graph {
    let mut records = Vec::new();
    for i in 0..token_count {
        for j in (i + 1)..token_count.min(i + 4) {
            records.push(PoolRecord {
                pool_addr: [((i * 37 + j) % 256) as u8; 32],
                variant: PoolVariant::ConstantProduct,
                fee: 0.003,
                token_a: token_record(i as u64, &format!("T{i}"), 18, 10_000_000_000_000_000_000_000),
                token_b: token_record(j as u64, &format!("T{j}"), 18, 10_000_000_000_000_000_000_000),
            });
        }
    }
    build_graph(&records)
}

fn benchmark_graph_memory() {
    println!("\nGraph build cost by size");
    println!("------------------------");

    for size in [10, 50, 100, 500] {
        let start = Instant::now();
        let graph = setup_large_graph(size);
        let setup_time = start.elapsed();
        let stats = graph.stats();

        println!(
            "{size:>4} tokens: {:>5} pools, built in {setup_time:?}",
            stats.pool_count
        );
    }
}

fn benchmark_cache_memory() {
    println!("\nQuote cache fill + lookup cost");
    println!("-------------------------------");

    let graph = Arc::new(setup_large_graph(30));
    let quoter = Quoter::new(graph);
    let cache = QuoteCache::default();

    let request = QuoteRequest {
        source_addr: address_from_u64(0),
        target_addr: address_from_u64(29),
        swap_amount_human: 1.0,
        config: RoutingConfig {
            max_hops: 3,
            target_usd_price: Some(1.0),
            ..RoutingConfig::default()
        },
    };

    let Ok(response) = quoter.quote(&request) else {
        println!("no route in synthetic graph, skipping cache fill");
        return;
    };

    let start = Instant::now();
    for i in 0..2_000u128 {
        cache.insert(
            request.source_addr,
            request.target_addr,
            1_000_000_000_000_000_000 + i,
            request.config.max_hops,
            request.config.top_k,
            request.config.enable_splitting,
            response.clone(),
        );
    }
    println!("filled 2000 entries in {:?}", start.elapsed());
    println!("cache stats: {:?}", cache.stats());
}

fn benchmark_heuristic_cache_reuse() {
    println!("\nHeuristic cache reuse across repeated targets");
    println!("----------------------------------------------");

    let graph = setup_large_graph(50);
    let cache = HeuristicCache::default();
    let target = graph.token_id(address_from_u64(49)).unwrap();

    let start = Instant::now();
    for _ in 0..1_000 {
        cache.get_or_build(&graph, target, 0.0);
    }
    println!("1000 lookups (first is a build, rest hit cache): {:?}", start.elapsed());
}

fn benchmark_concurrent_quote_access() {
    println!("\nConcurrent quote() calls over a shared graph");
    println!("---------------------------------------------");

    let graph = Arc::new(setup_large_graph(40));
    let quoter = Arc::new(Quoter::new(graph));

    let start = Instant::now();
    let handles: Vec<_> = (0..16)
        .map(|i| {
            let quoter = quoter.clone();
            std::thread::spawn(move || {
                let request = QuoteRequest {
                    source_addr: address_from_u64((i % 40) as u64),
                    target_addr: address_from_u64(((i + 20) % 40) as u64),
                    swap_amount_human: 1.0,
                    config: RoutingConfig {
                        max_hops: 3,
                        target_usd_price: Some(1.0),
                        ..RoutingConfig::default()
                    },
                };
                let _ = quoter.quote(&request);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    println!("16 concurrent quote() calls completed in {:?}", start.elapsed());
}

fn main() {
    println!("sor-core memory/latency profile");
    println!("================================");

    benchmark_graph_memory();
    benchmark_cache_memory();
    benchmark_heuristic_cache_reuse();
    benchmark_concurrent_quote_access();

    println!("\ndone");
}
