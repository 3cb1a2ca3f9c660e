pub mod editor;
pub mod engine;
pub mod error;
pub mod rng;
pub mod starter;
pub mod store;
pub mod wheel;

pub use crate::engine::{resolve, resolve_weights, spin_with_seeds, verify_spin};
pub use crate::error::{WheelError, WheelResult};
pub use crate::rng::{derive_floats, derive_hash_hex, generate_server_seed, ProvablyFairRng, RandomSource};
pub use crate::store::{Asset, PromotionStore, PromotionSummary, SeedLedger, Session, SpinTicket};
pub use crate::wheel::{Branding, ConfirmationContent, PrizeOption, Promotion, SpinButtonStyle};
