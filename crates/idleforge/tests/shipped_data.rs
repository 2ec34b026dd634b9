//! The balance data in `data/` must load and drive every engine.

use std::path::PathBuf;

use idleforge::core::Skill;
use idleforge::runtime::{EndReason, Session};
use idleforge::simulate_afk;

fn load() -> Session {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data");
    Session::load(dir.join("catalog.toml"), dir.join("runtime.toml")).unwrap()
}

#[test]
fn test_data_loads() {
    let session = load();
    let catalog = session.catalog();

    for skill in [Skill::Mining, Skill::Woodcutting, Skill::Fishing] {
        assert!(catalog.gathering(skill).is_some(), "{skill} gathering");
    }
    for skill in [Skill::Smithing, Skill::Crafting] {
        assert!(catalog.production(skill).is_some(), "{skill} production");
    }
    assert_eq!(session.drivers().len(), 5);
    assert_eq!(session.config().afk_session_ms, 1_800_000);
    assert_eq!(session.config().rng_seed, Some(42));
}

#[test]
fn test_full_session_of_copper() {
    let mut session = load();
    let report = simulate_afk(&mut session, Skill::Mining, Some("copper"), u64::MAX);

    // 30 minutes of 2.5s cycles, shorter once the level rises.
    assert!(report.cycles >= 720);
    assert_eq!(report.failed, 0);
    assert_eq!(report.end, Some(EndReason::Expired));
    assert!(report.items.get("copper_ore").copied().unwrap_or(0) >= 720);
}

#[test]
fn test_locked_target_never_starts() {
    let mut session = load();
    let report = simulate_afk(&mut session, Skill::Woodcutting, Some("willow"), 60_000);

    assert_eq!(report.cycles, 0);
    assert!(report.items.is_empty());
}

#[test]
fn test_tool_buff_applies() {
    let mut session = load();
    session.player.inventory.add("miners_charm", 1);
    assert_eq!(session.equip_tool("miners_charm"), Ok(Skill::Mining));

    let report = simulate_afk(&mut session, Skill::Mining, Some("tin"), 600_000);
    assert!(report.doubles > 0, "10% over 240 cycles with a fixed seed");
}
