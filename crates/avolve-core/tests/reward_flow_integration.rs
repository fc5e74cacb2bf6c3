//! Integration tests for the reward economy.
//!
//! Walks a new member through onboarding, a run of daily challenges with a
//! broken streak, recognition from a peer and spending, then checks the
//! balance cache against the transaction log.

use avolve_core::{
    streak_bonus_multiplier, CodeStatus, Config, CoreError, Database, LedgerError,
    OnboardingStep, RateLimiter, Recognition, StepOutcome, TokenType, TransactionKind,
};
use chrono::{Duration, NaiveDate, Utc};

fn day(n: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + Duration::days(n)
}

#[test]
fn test_full_member_journey() {
    let db = Database::open_memory().unwrap();
    let config = Config::default();

    // Onboarding pays GEN for every step, in order.
    let mut onboarding_total = 0;
    for step in OnboardingStep::ALL {
        let done = db
            .complete_onboarding_step("maya", step, Utc::now(), &config.onboarding)
            .unwrap();
        match done.outcome {
            StepOutcome::Completed { reward } => onboarding_total += reward,
            StepOutcome::AlreadyCompleted => panic!("{step} was already complete"),
        }
    }
    assert!(db.onboarding_progress("maya").unwrap().is_complete());
    assert_eq!(db.balance("maya", TokenType::Gen).unwrap(), onboarding_total);

    // Twelve straight days, then a gap, then one more day.
    let base = config.rewards.daily_challenge_base;
    let mut expected_gen = onboarding_total;
    for n in 0..12 {
        let claim = db
            .claim_reward("maya", TokenType::Gen, base, "daily challenge", day(n))
            .unwrap();
        let streak = n + 1;
        assert_eq!(claim.streak.after, streak);
        assert_eq!(claim.multiplier, streak_bonus_multiplier(streak));
        expected_gen += claim.transaction.amount;
    }
    let twelfth = &db.history("maya", 1).unwrap()[0];
    assert_eq!(twelfth.multiplier, Some(2.2));
    assert_eq!(twelfth.amount, 22);

    let after_gap = db
        .claim_reward("maya", TokenType::Gen, base, "daily challenge", day(14))
        .unwrap();
    assert!(after_gap.streak.broken);
    assert_eq!(after_gap.multiplier, 1.0);
    expected_gen += after_gap.transaction.amount;

    let streak = db.streak("maya").unwrap();
    assert_eq!(streak.current, 1);
    assert_eq!(streak.best, 12);
    assert_eq!(db.balance("maya", TokenType::Gen).unwrap(), expected_gen);

    // A peer recognizes her with SAP.
    let rec = Recognition {
        from: "jon".into(),
        to: "maya".into(),
        token: TokenType::Sap,
        amount: config.recognition.amount,
        message: "Ran a great session".into(),
    };
    let tx = db
        .recognize(&rec, config.recognition.daily_limit, Utc::now())
        .unwrap();
    assert_eq!(tx.kind, TransactionKind::Recognition);

    // Spending more SAP than held fails and leaves the balance alone.
    let err = db
        .spend("maya", TokenType::Sap, config.recognition.amount + 1, "course")
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Ledger(LedgerError::InsufficientBalance { .. })
    ));
    db.spend("maya", TokenType::Sap, config.recognition.amount, "course")
        .unwrap();

    let balances = db.balances("maya").unwrap();
    assert_eq!(balances.gen, expected_gen);
    assert_eq!(balances.sap, 0);
    assert_eq!(balances.psp, 0);

    assert!(db.verify_balances().unwrap().is_empty());
}

#[test]
fn test_invitation_checks_behind_rate_limiter() {
    let db = Database::open_memory().unwrap();
    let config = Config::default();
    let now = Utc::now();
    db.create_invitation("WXYZ-2345", "admin", 1, Some(now + Duration::days(7)))
        .unwrap();

    let mut limiter = RateLimiter::from_config(&config.rate_limit).unwrap();
    let mut statuses = Vec::new();
    for _ in 0..config.rate_limit.max_attempts {
        assert!(limiter.check("203.0.113.9", now).is_allowed());
        statuses.push(db.check_invitation("guess-0000", now).unwrap());
    }
    assert!(statuses.iter().all(|s| *s == CodeStatus::Unknown));
    assert!(!limiter.check("203.0.113.9", now).is_allowed());

    // A different caller is unaffected and can redeem the real code.
    assert!(limiter.check("198.51.100.4", now).is_allowed());
    assert_eq!(
        db.redeem_invitation("wxyz2345", now).unwrap(),
        CodeStatus::Valid { remaining_uses: 0 }
    );
    assert_eq!(
        db.check_invitation("WXYZ-2345", now).unwrap(),
        CodeStatus::Exhausted
    );
}

#[test]
fn test_ledger_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("avolve.db");
    {
        let db = Database::open_at(&path).unwrap();
        db.claim_reward("sam", TokenType::Psp, 40, "challenge", day(0))
            .unwrap();
        db.claim_reward("sam", TokenType::Psp, 40, "challenge", day(1))
            .unwrap();
    }

    let db = Database::open_at(&path).unwrap();
    assert_eq!(db.streak("sam").unwrap().current, 2);
    let third = db
        .claim_reward("sam", TokenType::Psp, 40, "challenge", day(2))
        .unwrap();
    assert_eq!(third.transaction.amount, 52);
    assert_eq!(db.balance("sam", TokenType::Psp).unwrap(), 132);
}
