//! Drives the three reward pools through the token ledger block by block.

use celes_economics::{pool_emission, EconomicsParams, RewardPoolKind};
use celes_treasury::{InMemoryTokenLedger, SystemAccounts, TokenLedger};
use celes_types::{Asset, Symbol};

fn core() -> Symbol {
    Symbol::new("CELES", 4).unwrap()
}

fn funded_ledger(accounts: &SystemAccounts, params: &EconomicsParams, fill: u64) -> InMemoryTokenLedger {
    let mut ledger = InMemoryTokenLedger::new();
    for pool in RewardPoolKind::ALL {
        let amount = (params.pool_capacity(pool) / fill) as i64;
        ledger
            .issue(accounts.pool_account(pool), Asset::new(amount, core()))
            .unwrap();
    }
    ledger
}

#[test]
fn top_ups_conserve_tokens_and_slow_down() {
    let accounts = SystemAccounts::default();
    let params = EconomicsParams {
        block_pay_pool_capacity: 64_000,
        wood_pay_pool_capacity: 64_000,
        dapp_pay_pool_capacity: 128_000,
        ..Default::default()
    };
    let mut ledger = funded_ledger(&accounts, &params, 1);

    let mut emitted = Vec::new();
    for _ in 0..20 {
        let balance = ledger
            .get_balance(&accounts.pool_account(RewardPoolKind::BlockPay), core())
            .unwrap();
        let Some(emission) = pool_emission(RewardPoolKind::BlockPay, balance.amount, &params) else {
            break;
        };
        ledger.transfer(&accounts.top_up(&emission, core())).unwrap();
        emitted.push(emission.amount);
    }

    // full pool pays the origin reward, then halves once drained below half
    assert_eq!(emitted[0], 5000);
    assert!(emitted.windows(2).all(|w| w[1] <= w[0]));

    let holding = ledger
        .get_balance(&accounts.block_pay_pool, core())
        .unwrap()
        .amount;
    let accrued = ledger.get_balance(&accounts.block_pay, core()).unwrap().amount;
    assert_eq!(holding + accrued, 64_000);
    assert_eq!(accrued, emitted.iter().sum::<i64>());
}

#[test]
fn empty_pool_stops_emitting() {
    let accounts = SystemAccounts::default();
    let params = EconomicsParams::default();
    let ledger = InMemoryTokenLedger::new();
    for pool in RewardPoolKind::ALL {
        let balance = ledger
            .get_balance(&accounts.pool_account(pool), core())
            .unwrap();
        assert!(pool_emission(pool, balance.amount, &params).is_none());
    }
}
