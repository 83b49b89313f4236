//! Prime search for the double hashing table size.

/// Deterministic trial division over `6k ± 1` candidates up to `sqrt(n)`.
#[must_use]
#[allow(clippy::arithmetic_side_effects)]
pub fn is_prime(n: usize) -> bool {
    if n <= 1 {
        return false;
    }
    if n <= 3 {
        return true;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }
    let mut i: usize = 5;
    // `i <= n / i` is `i * i <= n` without the overflow
    while i <= n / i {
        if n % i == 0 || n % (i + 2) == 0 {
            return false;
        }
        i += 6;
    }
    true
}

/// Smallest prime greater than or equal to `n`; `2` for `n <= 1`.
#[must_use]
pub fn next_prime(n: usize) -> usize {
    if n <= 2 {
        return 2;
    }
    let mut candidate = n;
    while !is_prime(candidate) {
        candidate = candidate.saturating_add(1);
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_prime() {
        let primes: Vec<usize> = (0..50).filter(|&n| is_prime(n)).collect();
        assert_eq!(primes, vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47]);
        assert!(is_prime(131));
        assert!(!is_prime(121));
        assert!(!is_prime(25));
    }

    #[test]
    fn test_next_prime() {
        assert_eq!(next_prime(0), 2);
        assert_eq!(next_prime(1), 2);
        assert_eq!(next_prime(6), 7);
        assert_eq!(next_prime(14), 17);
        assert_eq!(next_prime(32), 37);
        assert_eq!(next_prime(64), 67);
        assert_eq!(next_prime(128), 131);
        assert_eq!(next_prime(131), 131);
    }
}
