use guess_core::{Answer, Identity};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Simulated player who knows the secret identity and sometimes misremembers.
pub struct NoisyOracle<'a> {
    secret: &'a Identity,
    noise: f64,
    rng: StdRng,
    flipped: u32,
}

impl<'a> NoisyOracle<'a> {
    pub fn new(secret: &'a Identity, noise: f64, seed: u64) -> Self {
        Self {
            secret,
            noise,
            rng: StdRng::seed_from_u64(seed),
            flipped: 0,
        }
    }

    pub fn answer(&mut self, attribute: &str) -> Answer {
        let truth = self.secret.has(attribute);
        let flip = self.noise > 0.0 && self.rng.gen_bool(self.noise);
        if flip {
            self.flipped += 1;
        }
        Answer::from(truth != flip)
    }

    pub fn secret(&self) -> &'a Identity {
        self.secret
    }

    /// Number of answers that disagreed with the secret's true attributes.
    pub fn flipped(&self) -> u32 {
        self.flipped
    }
}
