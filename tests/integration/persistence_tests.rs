//! Integration tests for the command → ParameterPort → storage path.
//!
//! Parameters written through the controller must come back on the next
//! boot exactly as the boot path in `main` reads them.

use crate::mock_hw::{MemStore, Rig};

use vbm::adapters::params::{ParameterStore, NAMESPACE};
use vbm::app::commands::AppCommand;
use vbm::app::ports::{ParameterPort, StoragePort};
use vbm::config::MachineConfig;

/// Boot path: defaults overlaid with whatever the store holds.
fn reboot(store: MemStore) -> MachineConfig {
    let params = ParameterStore::new(store);
    let mut config = MachineConfig::default();
    config.apply(&params.load().expect("load"));
    config
}

#[test]
fn setpoints_survive_reboot() {
    let mut rig = Rig::new();
    rig.command(AppCommand::SetBrewSetpoint(93.5)).unwrap();
    rig.command(AppCommand::SetSteamSetpoint(128.0)).unwrap();

    let config = reboot(rig.params.into_inner());
    assert_eq!(config.brew_setpoint_c, 93.5);
    assert_eq!(config.steam_setpoint_c, 128.0);
}

#[test]
fn schedule_survives_reboot() {
    let mut rig = Rig::new();
    rig.command(AppCommand::SetScheduleDays(0b011_1110)).unwrap();
    rig.command(AppCommand::SetTurnOnAt(420)).unwrap();
    rig.command(AppCommand::SetTurnOffAt(540)).unwrap();

    let config = reboot(rig.params.into_inner());
    assert_eq!(config.schedule_days, 0b011_1110);
    assert_eq!(config.turn_on_at_min, 420);
    assert_eq!(config.turn_off_at_min, 540);
    assert!(config.validate().is_ok());
}

#[test]
fn only_the_changed_parameter_is_written() {
    let mut rig = Rig::new();
    rig.command(AppCommand::SetSteamSetpoint(125.0)).unwrap();

    let store = rig.params.storage();
    assert_eq!(store.data.len(), 1);
    assert!(store.exists(NAMESPACE, "sp_steam"));
}

#[test]
fn rejected_setpoint_is_not_persisted() {
    let mut rig = Rig::new();
    assert!(rig.command(AppCommand::SetBrewSetpoint(400.0)).is_err());
    assert!(rig.params.storage().data.is_empty());
    assert_eq!(rig.ctl.config().brew_setpoint_c, 100.0);
}

#[test]
fn full_storage_keeps_the_live_value() {
    let mut rig = Rig::new();
    rig.params = ParameterStore::new(MemStore {
        full: true,
        ..MemStore::default()
    });
    rig.command(AppCommand::SetBrewSetpoint(95.0)).unwrap();
    assert_eq!(rig.ctl.config().brew_setpoint_c, 95.0);

    let config = reboot(rig.params.into_inner());
    assert_eq!(config.brew_setpoint_c, 100.0);
}

#[test]
fn corrupted_slot_falls_back_to_default() {
    let mut store = MemStore::new();
    store
        .data
        .insert((NAMESPACE.to_owned(), "sp_brew".to_owned()), vec![0xFF]);
    let mut params = ParameterStore::new(store);
    params
        .save(vbm::app::ports::Parameter::SteamSetpoint(127.0))
        .unwrap();

    let config = reboot(params.into_inner());
    assert_eq!(config.brew_setpoint_c, MachineConfig::default().brew_setpoint_c);
    assert_eq!(config.steam_setpoint_c, 127.0);
}

#[test]
fn restored_schedule_drives_the_machine() {
    let mut rig = Rig::new();
    rig.command(AppCommand::SetScheduleDays(0x7F)).unwrap();
    rig.command(AppCommand::SetTurnOnAt(480)).unwrap();

    let mut rig = Rig::with_config(reboot(rig.params.into_inner()));
    // Sunday 2024-01-07 08:00 UTC.
    rig.clock.unix = Some(1_704_585_600 + 480 * 60);
    rig.step(10);
    assert!(rig.ctl.state().is_on());
}
