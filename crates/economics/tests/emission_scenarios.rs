//! End-to-end emission and supply accounting scenarios.

use mintgate_economics::*;
use mintgate_types::{
    AccessControl, Address, InMemoryToken, ManualClock, MintableToken, Role, TokenError,
};
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Deployment {
    scheduler: Address,
    emitter: Address,
    recorder: Address,
    clock: Arc<ManualClock>,
    token: Arc<InMemoryToken>,
    registry: Arc<SupplyRegistry>,
    controller: EmissionsController,
}

fn deploy(now: u64, cap: u128) -> Deployment {
    init_tracing();
    let admin = Address::derive("admin");
    let scheduler = Address::derive("scheduler");
    let emitter = Address::derive("emitter");
    let recorder = Address::derive("bridge-recorder");
    let controller_addr = Address::derive("emissions-controller");

    let acl = Arc::new(AccessControl::new(admin));
    acl.grant_role(&admin, Role::Scheduler, scheduler).unwrap();
    acl.grant_role(&admin, Role::Emitter, emitter).unwrap();
    acl.grant_role(&admin, Role::Recorder, recorder).unwrap();
    acl.grant_role(&admin, Role::Recorder, controller_addr).unwrap();
    acl.grant_role(&admin, Role::Minter, controller_addr).unwrap();

    let clock = Arc::new(ManualClock::new(now));
    let token = Arc::new(InMemoryToken::new(cap, acl.clone()));
    let registry = Arc::new(SupplyRegistry::new(acl.clone()));
    let controller = EmissionsController::new(
        controller_addr,
        acl,
        token.clone(),
        registry.clone(),
        clock.clone(),
    );

    Deployment {
        scheduler,
        emitter,
        recorder,
        clock,
        token,
        registry,
        controller,
    }
}

#[test]
fn scenario_a_budget_is_enforced_across_calls() {
    let t = 1_700_000_000;
    let d = deploy(t, 1_000_000);
    let user = Address::derive("user");

    let id = d
        .controller
        .schedule_epoch(&d.scheduler, t + 100, t + 86_500, 1_000)
        .unwrap();
    assert_eq!(id, 1);

    d.clock.set(t + 101);
    let receipt = d.controller.emit_to(&d.emitter, user, 100).unwrap();
    assert_eq!(receipt.epoch_minted, 100);
    assert_eq!(d.controller.epoch(id).unwrap().minted, 100);
    assert_eq!(d.token.balance_of(&user), 100);
    assert_eq!(d.registry.native_circulating(), 100);

    let err = d.controller.emit_to(&d.emitter, user, 901).unwrap_err();
    assert_eq!(
        err,
        EmissionError::BudgetExceeded {
            epoch: id,
            minted: 100,
            requested: 901,
            budget: 1_000
        }
    );
    assert_eq!(d.controller.epoch(id).unwrap().minted, 100);
    assert_eq!(d.token.balance_of(&user), 100);
    assert_eq!(d.registry.native_circulating(), 100);
}

#[test]
fn scenario_c_bridge_pending_settlement() {
    let d = deploy(0, 1_000);
    assert_eq!(d.registry.record_bridge_burn(&d.recorder, 2_000), Ok(()));
    assert_eq!(
        d.registry.record_bridge_mint(&d.recorder, 2_500),
        Err(SupplyError::InsufficientPending {
            requested: 2_500,
            pending: 2_000
        })
    );
    d.registry.record_bridge_mint(&d.recorder, 2_000).unwrap();
    assert_eq!(d.registry.bridge_pending(), 0);
}

#[test]
fn finalized_epoch_rejects_emission_before_its_end() {
    let d = deploy(1_000, 1_000_000);
    let user = Address::derive("user");
    let id = d.controller.schedule_epoch(&d.scheduler, 1_000, 9_000, 500).unwrap();

    d.clock.set(2_000);
    d.controller.emit_to(&d.emitter, user, 200).unwrap();
    assert_eq!(d.controller.finalize_epoch(&d.scheduler, id), Ok(300));

    d.clock.set(3_000);
    assert_eq!(
        d.controller.emit_to(&d.emitter, user, 1),
        Err(EmissionError::EpochNotActive { now: 3_000 })
    );
    assert!(d.controller.active_epoch().is_none());
}

#[test]
fn global_cap_binds_even_with_budget_left() {
    let d = deploy(0, 150);
    let user = Address::derive("user");
    d.controller.schedule_epoch(&d.scheduler, 0, 100, 1_000).unwrap();

    d.controller.emit_to(&d.emitter, user, 100).unwrap();
    assert!(matches!(
        d.controller.emit_to(&d.emitter, user, 51),
        Err(EmissionError::Token(TokenError::CapExceeded { remaining: 50, .. }))
    ));
    d.controller.emit_to(&d.emitter, user, 50).unwrap();
    assert_eq!(d.token.total_supply(), d.token.cap());
    assert_eq!(d.registry.native_circulating(), 150);
}

#[test]
fn emission_fails_cleanly_when_controller_cannot_record() {
    init_tracing();
    let admin = Address::derive("admin");
    let emitter = Address::derive("emitter");
    let controller_addr = Address::derive("unrecorded-controller");
    let acl = Arc::new(AccessControl::new(admin));
    acl.grant_role(&admin, Role::Scheduler, admin).unwrap();
    acl.grant_role(&admin, Role::Emitter, emitter).unwrap();
    acl.grant_role(&admin, Role::Minter, controller_addr).unwrap();

    let clock = Arc::new(ManualClock::new(0));
    let token = Arc::new(InMemoryToken::new(1_000, acl.clone()));
    let registry = Arc::new(SupplyRegistry::new(acl.clone()));
    let controller = EmissionsController::new(controller_addr, acl, token.clone(), registry, clock);
    controller.schedule_epoch(&admin, 0, 10, 100).unwrap();

    let user = Address::derive("user");
    assert!(matches!(
        controller.emit_to(&emitter, user, 10),
        Err(EmissionError::Supply(SupplyError::Access(_)))
    ));
    assert_eq!(token.total_supply(), 0);
    assert_eq!(controller.epoch(1).unwrap().minted, 0);
}

#[test]
fn event_log_reconstructs_epoch_table() {
    let d = deploy(0, 1_000_000);
    let user = Address::derive("user");
    d.controller.schedule_epoch(&d.scheduler, 0, 100, 500).unwrap();
    d.controller.increase_epoch_budget(&d.scheduler, 1, 250).unwrap();
    d.controller.emit_batch(&d.emitter, &[user, user], &[10, 20]).unwrap();
    d.controller.finalize_epoch(&d.scheduler, 1).unwrap();

    let mut rebuilt: Vec<Epoch> = Vec::new();
    for event in d.controller.events().events() {
        match event {
            EmissionEvent::EpochScheduled { id, start, end, budget } => {
                rebuilt.push(Epoch::new(id, start, end, budget))
            }
            EmissionEvent::EpochBudgetIncreased { id, budget, .. } => {
                rebuilt[id as usize - 1].budget = budget
            }
            EmissionEvent::Emitted { epoch_id, amount, .. } => {
                rebuilt[epoch_id as usize - 1].minted += amount
            }
            EmissionEvent::EpochFinalized { id, .. } => rebuilt[id as usize - 1].finalized = true,
            _ => {}
        }
    }
    assert_eq!(rebuilt, d.controller.epochs());
    assert!(d.controller.events().to_json_lines().unwrap().contains("epoch_finalized"));
}
