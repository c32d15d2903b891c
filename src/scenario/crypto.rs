// Credential hashing scenarios, backed by HashPolicy

use super::{Invocation, Outcome, Scenario};
use crate::error::{Error, Result};
use crate::hashing::{
    combined_credential, Algorithm, HashMode, HashPolicy, HashRequest, HashResult, BCRYPT_MAX_INPUT,
};
use crate::models::Category;
use serde::Serialize;

pub fn scenarios(policy: &HashPolicy) -> Vec<Scenario> {
    let pbkdf2 = policy.clone().with_algorithm(Algorithm::Pbkdf2Sha256);
    let bcrypt = policy.clone().with_algorithm(Algorithm::Bcrypt);

    vec![
        {
            let (u, s) = (pbkdf2.clone(), pbkdf2.clone());
            Scenario::new(
                "crypto/pbkdf2-static-salt",
                Category::Crypto,
                "PBKDF2 with one hardcoded salt and a low iteration count",
                move |inv: &Invocation<'_>| {
                    let record = u.compute(&HashRequest::new(inv.raw), HashMode::UnsafeStaticSalt)?;
                    render(
                        &record,
                        inv.raw.len(),
                        format!(
                            "shared salt '{}' and {} iterations: equal passwords share a digest",
                            u.static_salt, record.work_factor
                        ),
                    )
                },
                move |inv: &Invocation<'_>| safe_record(&s, inv.raw.as_bytes()),
            )
            .with_sample_input("password123")
        },
        {
            let (u, s) = (pbkdf2.clone(), pbkdf2);
            Scenario::new(
                "crypto/pbkdf2-low-iteration",
                Category::Crypto,
                "PBKDF2 with a random salt but a brute-forceable work factor",
                move |inv: &Invocation<'_>| {
                    let record =
                        u.compute(&HashRequest::new(inv.raw), HashMode::UnsafeLowIteration)?;
                    render(
                        &record,
                        inv.raw.len(),
                        format!(
                            "{} iterations, below the floor of {}",
                            record.work_factor,
                            Algorithm::Pbkdf2Sha256.safe_floor()
                        ),
                    )
                },
                move |inv: &Invocation<'_>| safe_record(&s, inv.raw.as_bytes()),
            )
            .with_sample_input("password123")
        },
        {
            let (u, s) = (bcrypt.clone(), bcrypt);
            Scenario::new(
                "crypto/bcrypt-combined",
                Category::Crypto,
                "bcrypt over username|password, input is <username>:<password>",
                move |inv: &Invocation<'_>| {
                    let (username, password) = split_credentials(inv.raw)?;
                    let combined = combined_credential(username, password);
                    let record = u.bcrypt_unchecked(&combined)?;
                    let ignored = combined.len().saturating_sub(BCRYPT_MAX_INPUT);
                    let side_effect = if ignored > 0 {
                        format!(
                            "hashed username|password at cost {}; the last {} bytes are ignored, so any password sharing the first {} bytes verifies",
                            record.work_factor,
                            ignored,
                            BCRYPT_MAX_INPUT.saturating_sub(username.len() + 1)
                        )
                    } else {
                        format!("hashed username|password at cost {}", record.work_factor)
                    };
                    render(&record, combined.len(), side_effect)
                },
                move |inv: &Invocation<'_>| {
                    let (_, password) = split_credentials(inv.raw)?;
                    safe_record(&s, password.as_bytes())
                },
            )
            .with_sample_input(format!("alice:{}", "x".repeat(80)))
        },
    ]
}

fn split_credentials(raw: &str) -> Result<(&str, &str)> {
    raw.split_once(':')
        .ok_or_else(|| Error::InvalidInput("expected <username>:<password>".to_string()))
}

fn safe_record(policy: &HashPolicy, secret: &[u8]) -> Result<Outcome> {
    let record = policy.compute(&HashRequest::new(secret), HashMode::Safe)?;
    let note = match record.algorithm {
        Algorithm::Pbkdf2Sha256 => format!(
            "fresh {}-byte salt, {} iterations; store salt and digest together",
            policy.salt_len, record.work_factor
        ),
        Algorithm::Bcrypt => format!(
            "password hashed alone at cost {}, salt embedded in the digest",
            record.work_factor
        ),
    };
    render(&record, secret.len(), note)
}

/// The stored record plus how many bytes went into it
#[derive(Serialize)]
struct HashOutput<'a> {
    #[serde(flatten)]
    record: &'a HashResult,
    hashed_bytes: usize,
}

fn render(record: &HashResult, hashed_bytes: usize, side_effect: String) -> Result<Outcome> {
    let output = HashOutput {
        record,
        hashed_bytes,
    };
    Ok(Outcome::new(serde_json::to_string(&output)?, side_effect))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_need_separator() {
        assert!(split_credentials("alice").is_err());
        assert_eq!(split_credentials("alice:p:w").unwrap(), ("alice", "p:w"));
    }

    fn bcrypt_combined() -> Scenario {
        scenarios(&HashPolicy::default())
            .into_iter()
            .find(|s| s.id == "crypto/bcrypt-combined")
            .unwrap()
    }

    #[test]
    fn combined_credential_collides_past_72_bytes() {
        // "alice|" leaves 66 bytes of password inside bcrypt's window.
        let shared = "x".repeat(BCRYPT_MAX_INPUT - "alice|".len());
        let stored = format!("alice:{}tail-one", shared);
        let out = bcrypt_combined().run_unsafe(&Invocation::new(&stored)).unwrap();
        let record: HashResult = serde_json::from_str(&out.output).unwrap();

        assert_eq!(record.work_factor, 12);
        assert!(out.side_effect.contains("the last 8 bytes are ignored"));
        let guess = combined_credential("alice", &format!("{}something else", shared));
        assert!(crate::hashing::verify(&guess, &record).unwrap());
        assert!(!crate::hashing::verify(&combined_credential("alice", "x"), &record).unwrap());
    }

    #[test]
    fn safe_variant_refuses_long_password() {
        let input = format!("alice:{}", "x".repeat(80));
        assert!(matches!(
            bcrypt_combined().run_safe(&Invocation::new(&input)),
            Err(Error::InputTooLong { length: 80, max: 72 })
        ));
    }
}
