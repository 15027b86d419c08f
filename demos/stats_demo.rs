use clap::Parser;
use hamt_trie::BytesKey;
use hamt_trie::HamtError;
use hamt_trie::Trie;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'w', long = "table_bits", default_value_t = 5)]
    table_bits: usize,

    #[arg(short = 't', long = "root_bits", default_value_t = 0)]
    root_bits: usize,

    #[arg(short = 'c', long = "count", default_value_t = 100_000)]
    count: usize,

    #[arg(short = 'd', long = "delete_percent", default_value_t = 0)]
    delete_percent: usize,
}

fn main() {
    let args = Args::parse();

    let mut trie: Trie<BytesKey, u64> = match Trie::new(args.table_bits, args.root_bits) {
        Ok(trie) => trie,
        Err(err) => {
            eprintln!("Cannot create trie: {err}");
            std::process::exit(1);
        }
    };

    println!(
        "Created trie: w = {}, t = {}, max depth = {}",
        trie.w(),
        trie.t(),
        trie.max_depth()
    );
    println!("Inserting {} random keys...", args.count);

    let mut rng = SmallRng::from_os_rng();
    let mut keys = Vec::with_capacity(args.count);
    let mut num_collisions = 0;
    for i in 0..args.count {
        let mut bytes = [0u8; 16];
        rng.fill(&mut bytes);
        let key = BytesKey::new(bytes).expect("sixteen bytes make a valid key");

        match trie.insert(key.clone(), i as u64) {
            Ok(None) => keys.push(key),
            Ok(Some(_)) => {}
            Err(HamtError::MaxTableDepthExceeded { .. }) => num_collisions += 1,
            Err(err) => panic!("Unexpected insert failure: {err}"),
        }
    }

    let num_deletes = keys.len() * args.delete_percent.min(100) / 100;
    for key in keys.iter().take(num_deletes) {
        if let Err(err) = trie.delete(key) {
            panic!("Inserted key went missing: {err}");
        }
    }

    println!("Inserted {} keys, deleted {}", keys.len(), num_deletes);
    println!("Live entries: {}", trie.len());
    trie.stats().print();
    println!(
        "Number of full hash collisions: {} ({:.02}%)",
        num_collisions,
        num_collisions as f64 / args.count.max(1) as f64 * 100.0
    );
}
