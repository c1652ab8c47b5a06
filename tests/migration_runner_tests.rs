use rits_migrate::{
    Actor, ActorKind, Attribute, Change, ChangeMode, ConfigStore, Effect, FieldOp, MemoryWorld,
    MigrationConfig, MigrationRunner, MigrationStep, Numeric, OutcomeStatus, ReferenceSchema,
    RenameTable, Scene, Skill, Token, UpdatePayload, migrate_actor, register_system_settings,
};
use serde_json::json;
use std::sync::Arc;

fn legacy_character(id: &str, name: &str) -> Actor {
    Actor::new(id, name, ActorKind::Character)
        .with_attribute(
            "insight",
            Attribute::new("BITD.Insight")
                .with_skill("tinker", Skill::new("BITD.Tinker", "5"))
                .with_skill("hunt", Skill::new("BITD.Hunt", 1))
                .with_skill("study", Skill::new("BITD.Study", "0")),
        )
        .with_attribute(
            "prowess",
            Attribute::new("BITD.Prowess")
                .with_skill("skirmish", Skill::new("BITD.Skirmish", "2"))
                .with_skill("finesse", Skill::new("BITD.Finesse", 0)),
        )
        .with_attribute(
            "resolve",
            Attribute::new("BITD.Resolve").with_skill("sway", Skill::new("BITD.Sway", "abc")),
        )
        .with_healing_clock("3")
        .with_effect(Effect::new("e1").with_change(Change::new(
            "system.attributes.prowess.skills.skirmish.value",
            ChangeMode::Add,
            json!("1"),
        )))
}

async fn world_with(actors: Vec<Actor>, scenes: Vec<Scene>) -> Arc<MemoryWorld> {
    let world = Arc::new(MemoryWorld::new().with_actors(actors).with_scenes(scenes));
    register_system_settings(world.as_ref(), &MigrationConfig::default())
        .await
        .unwrap();
    world
}

fn runner(world: &Arc<MemoryWorld>, version: &str) -> MigrationRunner {
    MigrationRunner::new(world.clone(), world.clone(), world.clone())
        .with_config(MigrationConfig::new().target_version(version))
}

#[test]
fn test_insight_tinker_update_shape() {
    let actor = Actor::new("a1", "Vex", ActorKind::Character)
        .with_attribute(
            "insight",
            Attribute::new("BITD.Insight").with_skill("tinker", Skill::new("BITD.Tinker", "5")),
        )
        .with_healing_clock(0);

    let patch =
        migrate_actor(&actor, &ReferenceSchema::character(), RenameTable::global()).unwrap();
    let update = UpdatePayload::Actor(patch).to_host_json();

    let attributes = &update["system"]["attributes"];
    assert_eq!(attributes["intuition"]["skills"]["engineer"]["value"], json!(5));
    assert_eq!(attributes["intuition"]["skills"]["engineer"]["label"], json!("RITS.Engineer"));
    assert_eq!(attributes["intuition"]["label"], json!("RITS.Intuition"));
    assert!(attributes.as_object().unwrap().contains_key("-=insight"));
    assert!(attributes["intuition"]["skills"]
        .as_object()
        .unwrap()
        .contains_key("-=tinker"));
    assert!(update.get("effects").is_none());
}

#[test]
fn test_every_renamed_attribute_gets_reference_label() {
    let schema = ReferenceSchema::character();
    let actor = legacy_character("a1", "Vex");
    let patch = migrate_actor(&actor, &schema, RenameTable::global()).unwrap();

    for old in ["insight", "prowess", "resolve"] {
        let new = RenameTable::global().get(old).unwrap();
        assert_eq!(patch.attribute(old), Some(&FieldOp::Delete));
        let moved = patch.attribute(new).and_then(FieldOp::as_set).unwrap();
        assert_eq!(
            moved.label.as_set().map(String::as_str),
            Some(schema.attribute_label(new).unwrap())
        );
    }
}

#[tokio::test]
async fn test_full_run_migrates_world() {
    let crew = Actor::new("c1", "Gilded Rats", ActorKind::Crew);
    let npc = Actor::new("n1", "Harbor Master", ActorKind::Other("npc".to_string()));
    let scene = Scene::new("s1", "Docks")
        .with_token(Token::new("t1").for_actor("a1").with_override("name", json!("Vex?")))
        .with_token(Token::new("t2").for_actor("c1").linked(true));
    let world = world_with(vec![legacy_character("a1", "Vex"), crew, npc], vec![scene]).await;

    let report = runner(&world, "2.0.0").run().await;
    assert!(report.is_clean(), "{}", report);
    assert_eq!(report.applied(), 4);

    let vex = world.actor("a1").await.unwrap();
    let attributes = &vex.system.attributes;
    assert_eq!(
        attributes.keys().collect::<Vec<_>>(),
        vec!["body", "intuition", "willpower"]
    );
    let intuition = &attributes["intuition"];
    assert_eq!(intuition.label, "RITS.Intuition");
    assert_eq!(intuition.skills["engineer"].value, Some(Numeric::Integer(5)));
    assert_eq!(intuition.skills["stalk"].value, Some(Numeric::Integer(1)));
    assert_eq!(intuition.skills["study"].value, Some(Numeric::Integer(0)));
    assert!(!intuition.skills.contains_key("tinker"));
    assert_eq!(attributes["body"].skills["fight"].label, "RITS.Fight");
    assert_eq!(
        attributes["willpower"].skills["influence"].value,
        Some(Numeric::NotANumber)
    );
    assert_eq!(vex.system.healing_clock, Some(Numeric::Integer(3)));
    assert_eq!(
        vex.effects[0].changes[0].key,
        "system.attributes.body.skills.fight.value"
    );
    assert!(vex.prototype_token.actor_link);

    assert!(world.actor("c1").await.unwrap().prototype_token.actor_link);
    let npc = world.actor("n1").await.unwrap();
    assert!(!npc.prototype_token.actor_link);
    assert!(report.outcomes.iter().all(|o| o.record_id != "n1"));

    let docks = world.scene("s1").await.unwrap();
    assert_eq!(docks.tokens.len(), 2);
    assert!(docks.tokens.iter().all(|t| t.actor_link && t.actor_data.is_empty()));

    assert_eq!(
        world.get("rits", "systemMigrationVersion").await.unwrap(),
        json!("2.0.0")
    );
}

#[tokio::test]
async fn test_second_run_only_relinks_tokens() {
    let world = world_with(vec![legacy_character("a1", "Vex")], Vec::new()).await;
    runner(&world, "2.0.0").run().await;

    let report = runner(&world, "2.0.0").run().await;
    assert_eq!(
        report
            .outcome("a1", MigrationStep::ActorAttributes)
            .map(|o| &o.status),
        Some(&OutcomeStatus::NoOp)
    );
    assert_eq!(
        report.outcome("a1", MigrationStep::TokenLink).map(|o| &o.status),
        Some(&OutcomeStatus::Applied)
    );

    let updates = world.update_log().unwrap();
    let actor_updates_after_first_run = updates
        .iter()
        .skip(2)
        .filter(|(_, payload)| matches!(payload, UpdatePayload::Actor(_)))
        .count();
    assert_eq!(actor_updates_after_first_run, 0);
}

#[tokio::test]
async fn test_failing_record_does_not_stop_run() {
    let world = world_with(
        vec![legacy_character("a1", "Vex"), legacy_character("a2", "Rook")],
        vec![Scene::new("s1", "Docks").with_token(Token::new("t1"))],
    )
    .await;
    world.fail_updates_for("a1").unwrap();

    let report = runner(&world, "2.0.0").run().await;

    let failed: Vec<_> = report.failures().map(|o| (o.record_id.as_str(), o.step)).collect();
    assert_eq!(
        failed,
        vec![
            ("a1", MigrationStep::ActorAttributes),
            ("a1", MigrationStep::TokenLink),
        ]
    );
    assert!(world.actor("a1").await.unwrap().system.attributes.contains_key("insight"));
    assert!(world.actor("a2").await.unwrap().system.attributes.contains_key("intuition"));
    assert!(world.scene("s1").await.unwrap().tokens[0].actor_link);
    assert!(report.version_recorded);
    assert!(!report.is_clean());
}

#[tokio::test]
async fn test_transform_error_is_isolated() {
    let odd = Actor::new("a1", "Odd", ActorKind::Character)
        .with_attribute("heart", Attribute::new("Heart"));
    let world = world_with(vec![odd, legacy_character("a2", "Rook")], Vec::new()).await;

    let report = runner(&world, "2.0.0").run().await;
    let outcome = report.outcome("a1", MigrationStep::ActorAttributes).unwrap();
    assert!(matches!(&outcome.status, OutcomeStatus::Failed(msg) if msg.contains("heart")));
    // Token link is a separate step and still goes through.
    assert_eq!(
        report.outcome("a1", MigrationStep::TokenLink).map(|o| &o.status),
        Some(&OutcomeStatus::Applied)
    );
    assert_eq!(
        report.outcome("a2", MigrationStep::ActorAttributes).map(|o| &o.status),
        Some(&OutcomeStatus::Applied)
    );
}

#[tokio::test]
async fn test_empty_world_records_version() {
    let world = world_with(Vec::new(), Vec::new()).await;
    assert_eq!(
        world.get("rits", "systemMigrationVersion").await.unwrap(),
        json!([0])
    );

    let report = runner(&world, "1.3.0").run().await;
    assert!(report.outcomes.is_empty());
    assert!(report.is_clean());
    assert_eq!(
        world.get("rits", "systemMigrationVersion").await.unwrap(),
        json!("1.3.0")
    );
}

#[tokio::test]
async fn test_notifications_bracket_the_run() {
    let world = world_with(Vec::new(), Vec::new()).await;
    runner(&world, "1.3.0").run().await;

    let notifications = world.notifications().unwrap();
    assert_eq!(notifications.len(), 2);
    assert!(notifications.iter().all(|n| n.permanent));
    assert_eq!(
        notifications[0].message,
        "Applying RITS Actors migration for version 1.3.0. Please be patient and do not close your game or shut down your server."
    );
    assert_eq!(
        notifications[1].message,
        "RITS System Migration to version 1.3.0 completed!"
    );
}

#[tokio::test]
async fn test_unreadable_actors_still_migrates_scenes() {
    let world = world_with(
        vec![legacy_character("a1", "Vex")],
        vec![Scene::new("s1", "Docks").with_token(Token::new("t1"))],
    )
    .await;
    world.fail_actor_listing().unwrap();

    let report = runner(&world, "2.0.0").run().await;
    assert_eq!(report.collection_failures.len(), 1);
    assert_eq!(report.collection_failures[0].collection, "actors");
    assert_eq!(report.applied(), 1);
    assert!(report.version_recorded);
}

#[tokio::test]
async fn test_unregistered_setting_is_reported() {
    let world = Arc::new(MemoryWorld::new());
    let report = runner(&world, "2.0.0").run().await;
    assert!(!report.version_recorded);
    assert_eq!(world.notifications().unwrap().len(), 2);
}

#[tokio::test]
async fn test_enforced_types_reject_not_a_number() {
    let world = world_with(vec![legacy_character("a1", "Vex")], Vec::new()).await;
    let report = MigrationRunner::new(world.clone(), world.clone(), world.clone())
        .with_config(MigrationConfig::new().target_version("2.0.0").enforce_types(true))
        .run()
        .await;

    let outcome = report.outcome("a1", MigrationStep::ActorAttributes).unwrap();
    assert!(matches!(&outcome.status, OutcomeStatus::Failed(msg) if msg.contains("influence")));
    assert!(world.actor("a1").await.unwrap().system.attributes.contains_key("resolve"));
}
