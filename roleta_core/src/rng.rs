use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

// Provably-fair randomness: HMAC-SHA256(server_seed, "client_seed:nonce") -> bytes -> floats in [0,1)

pub type HmacSha256 = Hmac<Sha256>;

/// Uniform source of floats in `[0, 1)` consumed by the weighted draw.
///
/// Implementations must be shareable across threads; the draw only reads.
pub trait RandomSource: Send + Sync {
    fn next_unit(&self) -> f64;
}

pub fn derive_hash_hex(input: &[u8]) -> String {
    hex::encode(Sha256::digest(input))
}

pub fn derive_floats(hmac_bytes: &[u8], count: usize) -> Vec<f64> {
    // Successive 4-byte big-endian chunks mapped to [0,1)
    let mut out = Vec::with_capacity(count);
    let mut buffer = hmac_bytes.to_vec();
    let mut i = 0usize;
    while out.len() < count {
        if i + 4 > buffer.len() {
            // stretch deterministically by hashing what we already consumed
            buffer = Sha256::digest(&buffer).to_vec();
            i = 0;
            continue;
        }
        let v = u32::from_be_bytes([buffer[i], buffer[i + 1], buffer[i + 2], buffer[i + 3]]);
        out.push(v as f64 / (u32::MAX as f64 + 1.0));
        i += 4;
    }
    out
}

#[derive(Debug, Clone)]
pub struct ProvablyFairRng {
    pub server_seed: String, // secret until rotated
    pub client_seed: String,
    pub nonce: u64,
}

impl ProvablyFairRng {
    pub fn new(server_seed: impl Into<String>, client_seed: impl Into<String>, nonce: u64) -> Self {
        Self {
            server_seed: server_seed.into(),
            client_seed: client_seed.into(),
            nonce,
        }
    }

    pub fn server_seed_hash_hex(&self) -> String {
        derive_hash_hex(self.server_seed.as_bytes())
    }

    pub fn hmac_bytes(&self) -> [u8; 32] {
        let mut mac =
            HmacSha256::new_from_slice(self.server_seed.as_bytes()).expect("HMAC takes any key length");
        mac.update(format!("{}:{}", self.client_seed, self.nonce).as_bytes());
        let mut out = [0u8; 32];
        out.copy_from_slice(&mac.finalize().into_bytes());
        out
    }
}

impl RandomSource for ProvablyFairRng {
    /// First float of the HMAC stream.
    fn next_unit(&self) -> f64 {
        derive_floats(&self.hmac_bytes(), 1)[0]
    }
}

/// Fresh secret for a server seed: 32 random bytes, hex encoded.
pub fn generate_server_seed() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}
