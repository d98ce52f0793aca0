use chain_core::{Chain, ChainConfig, PowError, TamperError, TamperOutcome, Trust};

#[test]
fn end_to_end_tamper_demo() {
    // create at difficulty 2, append "a" and "b"
    let mut chain = Chain::new(2).expect("genesis mines");
    chain.append("a").expect("block mines");
    chain.append("b").expect("block mines");

    let snapshot = chain.snapshot();
    assert_eq!(snapshot.len(), 3);
    assert!(snapshot.iter().all(|b| b.valid));
    assert!(chain.is_chain_valid());

    // tamper block 1: it and block 2 become invalid, genesis is untouched
    assert_eq!(chain.tamper(1, "a2"), Ok(TamperOutcome::Applied));

    let snapshot = chain.snapshot();
    assert!(snapshot[0].valid);
    assert!(!snapshot[1].valid);
    assert!(!snapshot[2].valid);
    assert_eq!(snapshot[1].data, "a2");
    assert!(!chain.is_chain_valid());
}

#[test]
fn tampered_chain_rejects_further_edits_of_genesis() {
    let mut chain = Chain::new(1).expect("genesis mines");
    chain.append("a").expect("block mines");
    chain.tamper(1, "X").expect("tamper applies");

    assert_eq!(chain.tamper(0, "Y"), Err(TamperError::GenesisProtected));
    assert_eq!(chain.blocks()[0].trust(), Trust::Sealed);
}

#[test]
fn independently_configured_chains_do_not_interfere() {
    // difficulty is a per-chain field, not shared state
    let easy = Chain::new(0).expect("genesis mines");
    let harder = Chain::new(2).expect("genesis mines");

    assert_eq!(easy.difficulty(), 0);
    assert_eq!(harder.difficulty(), 2);
    assert!(easy.is_chain_valid());
    assert!(harder.is_chain_valid());
}

#[test]
fn genesis_mining_respects_the_attempt_cap() {
    let result = Chain::with_config(ChainConfig {
        difficulty: 64,
        max_attempts: 5,
    });
    assert!(matches!(
        result,
        Err(PowError::SearchExhausted {
            attempts: 5,
            difficulty: 64
        })
    ));
}
