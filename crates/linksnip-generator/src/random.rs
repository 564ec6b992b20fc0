use crate::Generator;
use linksnip_core::ShortCode;
use rand::distr::Alphanumeric;
use rand::Rng;
use typed_builder::TypedBuilder;

pub const DEFAULT_LENGTH: usize = 6;
const MAX_LENGTH: usize = 32;

/// Generates random codes drawn uniformly from `[A-Za-z0-9]`.
///
/// Draws come from the thread-local CSPRNG, so codes cannot be enumerated
/// from previously issued ones. With the default length of 6 there are
/// 62^6 (about 5.7e10) possible codes.
#[derive(Debug, Clone, TypedBuilder)]
pub struct RandomGenerator {
    /// Code length, clamped to `1..=32`.
    #[builder(
        default = DEFAULT_LENGTH,
        setter(transform = |length: usize| length.clamp(1, MAX_LENGTH))
    )]
    length: usize,
}

impl RandomGenerator {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for RandomGenerator {
    type Output = ShortCode;

    fn generate(&self) -> Self::Output {
        let mut rng = rand::rng();
        loop {
            let code: String = (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(self.length)
                .map(char::from)
                .collect();
            if !ShortCode::is_reserved(&code) {
                return ShortCode::new_unchecked(code);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_length_is_six() {
        let code = RandomGenerator::new().generate();
        assert_eq!(code.as_str().len(), DEFAULT_LENGTH);
    }

    #[test]
    fn only_alphanumeric_characters() {
        let generator = RandomGenerator::new();
        for _ in 0..1_000 {
            let code = generator.generate();
            assert!(code.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn generated_codes_pass_validation() {
        let generator = RandomGenerator::builder().length(12).build();
        for _ in 0..100 {
            let code = generator.generate();
            assert!(ShortCode::new(code.as_str()).is_ok());
        }
    }

    #[test]
    fn length_is_clamped() {
        assert_eq!(RandomGenerator::builder().length(0).build().length(), 1);
        assert_eq!(
            RandomGenerator::builder().length(64).build().length(),
            MAX_LENGTH
        );
    }

    #[test]
    fn codes_are_not_repeated() {
        let generator = RandomGenerator::new();
        let codes: HashSet<String> = (0..1_000)
            .map(|_| generator.generate().as_str().to_owned())
            .collect();
        // 1000 draws from 62^6 collide with probability below 1e-5.
        assert!(codes.len() >= 999);
    }
}
