//! Human-readable order identifiers of the form `ORD-<year>-<6 base36 chars>`.

use rand::Rng;

use super::errors::DomainError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SUFFIX_LEN: usize = 6;

pub fn random_code<R: Rng + ?Sized>(rng: &mut R, year: i32) -> String {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("ORD-{year:04}-{suffix}")
}

pub fn is_well_formed(code: &str) -> bool {
    let mut parts = code.splitn(3, '-');
    let (Some("ORD"), Some(year), Some(suffix)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    year.len() == 4
        && year.bytes().all(|b| b.is_ascii_digit())
        && suffix.len() == SUFFIX_LEN
        && suffix.bytes().all(|b| ALPHABET.contains(&b))
}

/// Draws candidates from `next` until `taken` reports one free, giving up
/// after `max_attempts`. Only race-free when `taken` reads inside the same
/// transaction as the insert, with a unique index behind it.
pub fn generate_unique<N, T>(
    max_attempts: u32,
    mut next: N,
    mut taken: T,
) -> Result<String, DomainError>
where
    N: FnMut() -> String,
    T: FnMut(&str) -> Result<bool, DomainError>,
{
    for attempt in 1..=max_attempts {
        let candidate = next();
        if !taken(&candidate)? {
            return Ok(candidate);
        }
        log::debug!("Order code {} already taken (attempt {})", candidate, attempt);
    }
    Err(DomainError::CodeGenerationExhausted {
        attempts: max_attempts,
    })
}
