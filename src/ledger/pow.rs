use std::time::Instant;

use sha2::{Digest, Sha256};

/// Required prefix of the guess hash: four leading zero nibbles, roughly one
/// valid proof per 65536 tries. Fixed difficulty, not configurable.
const DIFFICULTY_PREFIX: &str = "0000";

/// Checks whether `proof` solves the puzzle posed by `last_proof`
///
/// The guess is the decimal concatenation `{last_proof}{proof}` hashed with
/// SHA-256; it is valid when the hex digest starts with four zeros.
pub fn valid_proof(last_proof: u64, proof: u64) -> bool {
    let guess = format!("{}{}", last_proof, proof);

    let mut hasher = Sha256::new();
    hasher.update(guess.as_bytes());
    let guess_hash = hex::encode(hasher.finalize());

    guess_hash.starts_with(DIFFICULTY_PREFIX)
}

/// Finds the smallest proof solving the puzzle posed by `last_proof`
///
/// Brute-force ascending scan from 0. Runs to completion; latency is
/// unbounded but a solution always exists.
pub fn solve(last_proof: u64) -> u64 {
    let mut proof = 0;
    while !valid_proof(last_proof, proof) {
        proof += 1;
    }

    proof
}

/// Deadline-bounded variant of [`solve`]
///
/// Scans ascending like `solve` but gives up once `deadline` passes,
/// returning `None` instead of blocking indefinitely. The deadline is
/// checked periodically rather than per guess to keep the scan tight.
pub fn solve_until(last_proof: u64, deadline: Instant) -> Option<u64> {
    let mut proof = 0;
    loop {
        if valid_proof(last_proof, proof) {
            return Some(proof);
        }
        if proof % 1024 == 0 && Instant::now() >= deadline {
            return None;
        }
        proof += 1;
    }
}
