use rits_migrate::{
    MemoryWorld, MigrationConfig, MigrationStep, Numeric, OutcomeStatus, UpdatePayload, WorldFile,
    migrate_world, needs_migration,
};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn legacy_export() -> serde_json::Value {
    json!({
        "actors": [
            {
                "_id": "a1",
                "name": "Vex",
                "type": "character",
                "img": "icons/vex.webp",
                "system": {
                    "attributes": {
                        "insight": {
                            "label": "BITD.Insight",
                            "skills": {
                                "hunt": { "label": "BITD.Hunt", "value": "2", "max": 4 },
                                "study": { "label": "BITD.Study", "value": 1, "max": 4 }
                            }
                        }
                    },
                    "healing-clock": "1",
                    "stress": 2
                },
                "effects": [],
                "prototypeToken": { "actorLink": false, "name": "Vex" }
            },
            { "_id": "c1", "name": "Gilded Rats", "type": "crew" }
        ],
        "scenes": [
            {
                "_id": "s1",
                "name": "Docks",
                "tokens": [
                    { "_id": "t1", "actorId": "a1", "actorLink": false,
                      "actorData": { "system": { "stress": 5 } }, "x": 100, "y": 200 }
                ]
            }
        ]
    })
}

#[tokio::test]
async fn test_exported_world_migrates_and_saves() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("world.json");
    std::fs::write(&path, serde_json::to_vec(&legacy_export()).unwrap()).unwrap();

    let file = WorldFile::new(&path);
    let world = Arc::new(MemoryWorld::from_snapshot(file.load().await.unwrap()));
    let report = migrate_world(world.clone(), MigrationConfig::new().target_version("2.0.0")).await;
    assert!(report.is_clean(), "{}", report);
    file.save(&world.snapshot().await).await.unwrap();

    let saved: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();

    let vex = &saved["actors"][0];
    assert_eq!(vex["img"], json!("icons/vex.webp"));
    assert_eq!(vex["system"]["stress"], json!(2));
    assert_eq!(vex["system"]["healing-clock"], json!(1));
    assert!(vex["system"]["attributes"].get("insight").is_none());
    let stalk = &vex["system"]["attributes"]["intuition"]["skills"]["stalk"];
    assert_eq!(stalk, &json!({ "label": "RITS.Stalk", "value": 2, "max": 4 }));
    assert_eq!(vex["prototypeToken"], json!({ "actorLink": true, "name": "Vex" }));

    assert_eq!(saved["actors"][1]["prototypeToken"]["actorLink"], json!(true));

    let token = &saved["scenes"][0]["tokens"][0];
    assert_eq!(token["actorLink"], json!(true));
    assert_eq!(token["actorData"], json!({}));
    assert_eq!(token["x"], json!(100));

    assert_eq!(saved["settings"]["rits.systemMigrationVersion"], json!("2.0.0"));
}

#[tokio::test]
async fn test_reloaded_world_is_up_to_date() {
    let temp_dir = TempDir::new().unwrap();
    let file = WorldFile::new(temp_dir.path().join("world.json"));
    let snapshot = serde_json::from_value(legacy_export()).unwrap();

    let world = Arc::new(MemoryWorld::from_snapshot(snapshot));
    migrate_world(world.clone(), MigrationConfig::new().target_version("2.0.0")).await;
    file.save(&world.snapshot().await).await.unwrap();

    let reloaded = file.load().await.unwrap();
    let stored = &reloaded.settings["rits.systemMigrationVersion"];
    assert!(!needs_migration(stored, "2.0.0"));
    assert!(needs_migration(stored, "2.1.0"));

    let study = &reloaded.actors[0].system.attributes["intuition"].skills["study"];
    assert_eq!(study.value, Some(Numeric::Integer(1)));
    assert_eq!(study.label, "RITS.Study");
}

#[tokio::test]
async fn test_not_a_number_survives_reload_without_new_updates() {
    let temp_dir = TempDir::new().unwrap();
    let file = WorldFile::new(temp_dir.path().join("world.json"));
    let raw = json!({
        "actors": [{
            "_id": "a1", "name": "Vex", "type": "character",
            "system": {
                "attributes": {
                    "prowess": {
                        "label": "BITD.Prowess",
                        "skills": { "prowl": { "label": "BITD.Prowl", "value": "abc" } }
                    }
                }
            }
        }]
    });
    std::fs::write(file.path(), serde_json::to_vec(&raw).unwrap()).unwrap();

    let world = Arc::new(MemoryWorld::from_snapshot(file.load().await.unwrap()));
    migrate_world(world.clone(), MigrationConfig::new().target_version("2.0.0")).await;
    file.save(&world.snapshot().await).await.unwrap();

    let reloaded = file.load().await.unwrap();
    let body = &reloaded.actors[0].system.attributes["body"];
    assert_eq!(body.skills["prowl"].value, Some(Numeric::NotANumber));
    assert_eq!(reloaded.actors[0].system.healing_clock, Some(Numeric::NotANumber));

    let world = Arc::new(MemoryWorld::from_snapshot(reloaded));
    let report = migrate_world(world.clone(), MigrationConfig::new().target_version("2.0.0")).await;
    assert_eq!(
        report
            .outcome("a1", MigrationStep::ActorAttributes)
            .map(|o| &o.status),
        Some(&OutcomeStatus::NoOp)
    );
    let actor_updates = world
        .update_log()
        .unwrap()
        .iter()
        .filter(|(_, payload)| matches!(payload, UpdatePayload::Actor(_)))
        .count();
    assert_eq!(actor_updates, 0);
}

#[tokio::test]
async fn test_malformed_actor_does_not_block_the_world() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("world.json");
    let mut raw = legacy_export();
    let actors = raw["actors"].as_array_mut().unwrap();
    actors.insert(
        1,
        json!({
            "_id": "odd", "name": "Odd", "type": "character",
            "system": { "attributes": {
                "insight": { "label": null, "skills": { "hunt": { "label": "BITD.Hunt", "value": true } } }
            } },
            "effects": [{ "_id": "e1", "changes": [{ "key": "system.attributes.insight.value", "mode": 9, "value": 1 }] }]
        }),
    );
    actors.push(json!({ "_id": "broken", "type": "character", "system": { "attributes": [1, 2] } }));
    std::fs::write(&path, serde_json::to_vec(&raw).unwrap()).unwrap();

    let file = WorldFile::new(&path);
    let snapshot = file.load().await.unwrap();
    assert_eq!(snapshot.actors.len(), 3);
    assert_eq!(snapshot.unreadable.len(), 1);
    assert_eq!(snapshot.unreadable[0].id(), Some("broken"));

    let world = Arc::new(MemoryWorld::from_snapshot(snapshot));
    let report = migrate_world(world.clone(), MigrationConfig::new().target_version("2.0.0")).await;
    assert!(report.is_clean(), "{}", report);

    let vex = world.actor("a1").await.unwrap();
    assert!(vex.system.attributes.contains_key("intuition"));

    let odd = world.actor("odd").await.unwrap();
    let intuition = &odd.system.attributes["intuition"];
    assert_eq!(intuition.label, "RITS.Intuition");
    assert_eq!(intuition.skills["stalk"].value, Some(Numeric::NotANumber));
    assert_eq!(
        odd.effects[0].changes[0].key,
        "system.attributes.intuition.value"
    );

    file.save(&world.snapshot().await).await.unwrap();
    let saved: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(saved["actors"][3], raw["actors"][3]);
    assert_eq!(saved["actors"][1]["effects"][0]["changes"][0]["mode"], json!(9));
}
