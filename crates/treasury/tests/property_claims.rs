use mintgate_crypto::SortedMerkleTree;
use mintgate_treasury::RewardsDistributor;
use mintgate_types::{AccessControl, Address, Amount, InMemoryToken, ManualClock, MintableToken, Role};
use proptest::prelude::*;
use std::sync::Arc;

// Over any sequence of growing cumulative rounds and any claim order, an
// account is paid exactly the highest entitlement it has proven.

const ACCOUNTS: usize = 4;

proptest! {
    #[test]
    fn payouts_equal_highest_claimed_entitlement(
        increments in prop::collection::vec(prop::collection::vec(0u128..500, ACCOUNTS), 1..5),
        claims in prop::collection::vec((0usize..5, 0usize..ACCOUNTS), 0..40),
    ) {
        let admin = Address::derive("admin");
        let acl = Arc::new(AccessControl::new(admin));
        acl.grant_role(&admin, Role::RootSetter, admin).unwrap();
        acl.grant_role(&admin, Role::Minter, admin).unwrap();
        let token = Arc::new(InMemoryToken::new(Amount::MAX, acl.clone()));
        let d = RewardsDistributor::new(
            Address::derive("distributor"),
            acl,
            token.clone(),
            Arc::new(ManualClock::new(0)),
        );
        token.mint(&admin, &d.address(), 1_000_000).unwrap();

        let accounts: Vec<Address> = (0..ACCOUNTS).map(|i| Address::derive(&format!("acct-{i}"))).collect();
        let mut running = vec![0u128; ACCOUNTS];
        let mut rounds = Vec::new();
        for inc in &increments {
            for (r, i) in running.iter_mut().zip(inc) {
                *r += i + 1;
            }
            let allocations: Vec<(Address, Amount)> = accounts.iter().copied().zip(running.iter().copied()).collect();
            let tree = SortedMerkleTree::from_allocations(&allocations).unwrap();
            let id = d.publish_root(&admin, tree.root(), running.iter().sum()).unwrap();
            rounds.push((id, tree, running.clone()));
        }

        let mut expected = vec![0u128; ACCOUNTS];
        for (round, who) in claims {
            let (id, tree, amounts) = &rounds[round % rounds.len()];
            let proof = tree.proof(who).unwrap();
            let result = d.claim(*id, accounts[who], amounts[who], &proof);
            if amounts[who] > expected[who] {
                prop_assert_eq!(result.map(|r| r.paid), Ok(amounts[who] - expected[who]));
                expected[who] = amounts[who];
            } else {
                prop_assert!(result.is_err());
            }
        }

        for (i, account) in accounts.iter().enumerate() {
            prop_assert_eq!(token.balance_of(account), expected[i]);
            prop_assert_eq!(d.claimed_cumulative(account), expected[i]);
        }
        prop_assert_eq!(d.balance(), 1_000_000 - expected.iter().sum::<u128>());
    }
}
