use dice_match::{
    autoplay::Autoplayer,
    config::{ConfigLoader, DiceProfile},
    snapshot::SnapshotWriter,
    GameConfig, LevelSession, LevelStatus,
};

fn config_loader() -> ConfigLoader {
    ConfigLoader::new(env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn fixtures_load() {
    let loader = config_loader();
    let classic = loader.load("configs/classic.yaml").unwrap();
    assert_eq!(classic.seed, Some(7));
    assert_eq!(classic.dice.profile, DiceProfile::Classic);
    assert!(!classic.defer_processing);

    let adaptive = loader.load("configs/adaptive.yaml").unwrap();
    assert_eq!(adaptive.dice.profile, DiceProfile::Adaptive);
    assert_eq!(adaptive.dice.bonus_die_ceiling, 25);
    assert!(adaptive.defer_processing);
    assert_eq!(adaptive.board.total_tiles, 12);
    assert_eq!(adaptive.logging.level, "debug");
}

#[test]
fn same_seed_same_run() {
    let config = config_loader().load("configs/classic.yaml").unwrap();
    let player = Autoplayer::headless();

    let mut first = LevelSession::new(config.clone());
    let mut second = LevelSession::new(config);
    first.start_level(1);
    second.start_level(1);
    let a = player.run(&mut first, 3, |_, _| {});
    let b = player.run(&mut second, 3, |_, _| {});
    assert_eq!(a, b);
    assert_eq!(first.roll_history(), second.roll_history());
}

#[test]
fn autoplayer_clears_early_levels() {
    let mut session = LevelSession::new(GameConfig::seeded(2024));
    session.start_level(1);
    let mut seen = Vec::new();
    let summary = Autoplayer::headless().run(&mut session, 3, |session, report| {
        assert_eq!(report.level, session.level());
        seen.push(report.level);
    });

    assert_eq!(seen.len(), summary.reports.len());
    let won: Vec<u32> = summary
        .reports
        .iter()
        .filter(|r| matches!(r.status, LevelStatus::Won { .. }))
        .map(|r| r.level)
        .collect();
    assert_eq!(won.len() as u32, summary.levels_won);
    assert_eq!(summary.final_score, session.score());
    if !summary.gave_up {
        assert_eq!(won, vec![1, 2, 3]);
    }
}

#[test]
fn adaptive_profile_plays_deferred_levels() {
    let config = config_loader().load("configs/adaptive.yaml").unwrap();
    let mut session = LevelSession::new(config);
    session.start_level(55);
    assert_eq!(
        session.dice_ai().rule_names(),
        vec![
            "opening",
            "low_dice_rescue",
            "six_drought",
            "struggling",
            "throttle"
        ]
    );

    let status = Autoplayer::headless().play_level(&mut session);
    assert!(status.is_over());
    assert_eq!(session.quota(), 0);
}

#[test]
fn run_writes_a_snapshot_per_level() {
    let temp = tempfile::tempdir().unwrap();
    let mut writer = SnapshotWriter::new(temp.path());
    let mut session = LevelSession::new(GameConfig::seeded(8));
    session.start_level(1);

    let mut written = Vec::new();
    let summary = Autoplayer::headless().run(&mut session, 2, |session, _| {
        written.push(writer.write(&session.snapshot()).unwrap());
    });
    assert_eq!(written.len(), summary.reports.len());
    for path in &written {
        assert!(path.exists());
    }
}
