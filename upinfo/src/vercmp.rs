use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::package::Evr;

/// Total order over (epoch, version, release) triples.
///
/// Implementations may refuse to order defective values; that failure is a
/// data-integrity fault which aborts the whole report.
pub trait VersionOrder {
    fn cmp_evr(&self, a: &Evr, b: &Evr) -> Result<Ordering>;
}

/// rpm-style ordering: numeric epoch first, then segment-wise comparison of
/// version and release. Digit runs compare numerically, letter runs
/// lexically, a digit run outranks a letter run, and `~` sorts before
/// everything including the end of the string.
#[derive(Debug, Default, Clone, Copy)]
pub struct RpmOrder;

impl VersionOrder for RpmOrder {
    fn cmp_evr(&self, a: &Evr, b: &Evr) -> Result<Ordering> {
        if a.version.is_empty() || b.version.is_empty() {
            return Err(Error::Comparison {
                left: a.to_string(),
                right: b.to_string(),
            });
        }
        Ok(a.epoch
            .cmp(&b.epoch)
            .then_with(|| cmp_component(&a.version, &b.version))
            .then_with(|| cmp_component(&a.release, &b.release)))
    }
}

fn cmp_component(a: &str, b: &str) -> Ordering {
    let mut x = a.as_bytes();
    let mut y = b.as_bytes();
    loop {
        x = skip_separators(x);
        y = skip_separators(y);

        match (x.first() == Some(&b'~'), y.first() == Some(&b'~')) {
            (true, true) => {
                x = &x[1..];
                y = &y[1..];
                continue;
            }
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }

        if x.is_empty() || y.is_empty() {
            return x.len().cmp(&y.len());
        }

        let digits = x[0].is_ascii_digit();
        let (xs, xr) = take_run(x, digits);
        let (ys, yr) = take_run(y, digits);
        if ys.is_empty() {
            // The runs are of different classes; a digit run wins.
            return if digits { Ordering::Greater } else { Ordering::Less };
        }

        let ord = if digits {
            cmp_digit_runs(xs, ys)
        } else {
            xs.cmp(ys)
        };
        if ord != Ordering::Equal {
            return ord;
        }
        x = xr;
        y = yr;
    }
}

fn skip_separators(mut s: &[u8]) -> &[u8] {
    while let Some(c) = s.first() {
        if c.is_ascii_alphanumeric() || *c == b'~' {
            break;
        }
        s = &s[1..];
    }
    s
}

fn take_run(s: &[u8], digits: bool) -> (&[u8], &[u8]) {
    let end = s
        .iter()
        .position(|c| c.is_ascii_digit() != digits || !c.is_ascii_alphanumeric())
        .unwrap_or(s.len());
    s.split_at(end)
}

fn cmp_digit_runs(a: &[u8], b: &[u8]) -> Ordering {
    let a = trim_leading_zeros(a);
    let b = trim_leading_zeros(b);
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn trim_leading_zeros(mut s: &[u8]) -> &[u8] {
    while let [b'0', rest @ ..] = s {
        s = rest;
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmp(a: &str, b: &str) -> Ordering {
        RpmOrder
            .cmp_evr(&a.parse().unwrap(), &b.parse().unwrap())
            .unwrap()
    }

    #[test]
    fn equal_versions() {
        assert_eq!(cmp("5-1", "5-1"), Ordering::Equal);
        assert_eq!(cmp("1.2.3-4", "1.2.3-4"), Ordering::Equal);
    }

    #[test]
    fn numeric_runs_compare_numerically() {
        assert_eq!(cmp("10-1", "9-1"), Ordering::Greater);
        assert_eq!(cmp("1.10", "1.9"), Ordering::Greater);
    }

    #[test]
    fn leading_zeros_are_insignificant() {
        assert_eq!(cmp("1.010", "1.10"), Ordering::Equal);
        assert_eq!(cmp("0001", "1"), Ordering::Equal);
    }

    #[test]
    fn release_breaks_version_ties() {
        assert_eq!(cmp("5-1", "5-0"), Ordering::Greater);
        assert_eq!(cmp("5-0", "5-1"), Ordering::Less);
    }

    #[test]
    fn missing_release_sorts_below_any_release() {
        assert_eq!(cmp("5", "5-1"), Ordering::Less);
    }

    #[test]
    fn epoch_outranks_version() {
        assert_eq!(cmp("1:1-1", "2-1"), Ordering::Greater);
    }

    #[test]
    fn digit_run_beats_letter_run() {
        assert_eq!(cmp("1.1", "1.a"), Ordering::Greater);
    }

    #[test]
    fn longer_tail_wins() {
        assert_eq!(cmp("1.0.1", "1.0"), Ordering::Greater);
    }

    #[test]
    fn separators_are_ignored() {
        assert_eq!(cmp("1.0", "1_0"), Ordering::Equal);
    }

    #[test]
    fn tilde_sorts_before_release() {
        assert_eq!(cmp("1.0~rc1", "1.0"), Ordering::Less);
        assert_eq!(cmp("1.0~rc1", "1.0~rc2"), Ordering::Less);
    }

    #[test]
    fn alpha_runs_compare_lexically() {
        assert_eq!(cmp("1.0a", "1.0b"), Ordering::Less);
    }

    #[test]
    fn empty_version_is_incomparable() {
        let bad = Evr {
            epoch: 0,
            version: String::new(),
            release: String::new(),
        };
        let good: Evr = "1-1".parse().unwrap();
        let err = RpmOrder.cmp_evr(&bad, &good).unwrap_err();
        assert!(matches!(err, Error::Comparison { .. }));
    }
}
