//! Counter-based short-name generation.

use std::collections::HashSet;

const BASE62: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Base-62 digits of `n` (`0` → `"0"`).
pub fn base62(mut n: usize) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE62[n % 62]);
        n /= 62;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Key code for a frequency rank: `0`..`Z`, then `|a`, `|b`, ...
pub fn key_code(rank: usize) -> String {
    if rank < 62 {
        return (BASE62[rank] as char).to_string();
    }
    format!("|{}", base62(rank - 62 + 10))
}

/// Sequential letters: `a`..`z`, `aa`, `ab`, ...
pub fn letter_name(index: usize) -> String {
    let mut n = index + 1;
    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        out.push(b'a' + (n % 26) as u8);
        n /= 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Prefixed counter: `t0`, `t1`, ...
pub fn prefixed(prefix: &str, index: usize) -> String {
    format!("{prefix}{index}")
}

/// Hands out names from a scheme, skipping any that are already taken.
pub struct NameAllocator<F: Fn(usize) -> String> {
    scheme: F,
    next: usize,
    taken: HashSet<String>,
}

impl<F: Fn(usize) -> String> NameAllocator<F> {
    pub fn new(scheme: F, taken: HashSet<String>) -> Self {
        Self { scheme, next: 0, taken }
    }

    pub fn next_name(&mut self) -> String {
        loop {
            let name = (self.scheme)(self.next);
            self.next += 1;
            if self.taken.insert(name.clone()) {
                return name;
            }
        }
    }
}
