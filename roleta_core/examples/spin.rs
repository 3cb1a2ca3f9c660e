use roleta_core::{resolve, ProvablyFairRng, Promotion};

fn main() {
    // Example end-to-end spin of the starter wheel
    let wheel = Promotion::starter("example", "Example Wheel");
    let rng = ProvablyFairRng::new("example-server-seed", "example-client-seed", 1);
    match resolve(&wheel.options, &rng) {
        Ok(index) => println!(
            "server_seed_hash={} result={} prize={}",
            rng.server_seed_hash_hex(),
            index,
            wheel.options[index].text
        ),
        Err(e) => eprintln!("spin failed: {e}"),
    }
}
