use super::patch::{ActorPatch, AttributePatch, EffectPatch, FieldOp, SkillPatch};
use super::rename::RenameTable;
use crate::core::{Numeric, Result};
use crate::model::{Actor, Attribute, Change, ReferenceSchema};
use std::collections::BTreeMap;

/// Computes the attribute/skill rename and coercion update for a character.
///
/// Renamed attributes and skills are copied whole under their new key,
/// labelled from `schema`, and their old key is deleted. Keys without a
/// rename stay put and only receive the label and value fields that differ
/// from `schema` and the coerced value, so an already migrated actor yields
/// an empty patch. Effect change keys are rewritten through
/// [`RenameTable::rewrite_path`]; when any of them changes, the full list of
/// effects is sent back.
///
/// Fails when `schema` lacks a label for a target attribute or skill.
pub fn migrate_actor(
    actor: &Actor,
    schema: &ReferenceSchema,
    renames: &RenameTable,
) -> Result<ActorPatch> {
    let mut patch = ActorPatch::default();

    for (key, attribute) in &actor.system.attributes {
        match renames.get(key) {
            Some(new_key) => {
                let moved = move_attribute(attribute, new_key, schema, renames)?;
                // A renamed attribute wins over one already stored under its new key.
                patch.attributes.insert(new_key.to_string(), FieldOp::Set(moved));
                patch.attributes.insert(key.clone(), FieldOp::Delete);
            }
            None => {
                let refreshed = refresh_attribute(attribute, key, schema, renames)?;
                if !refreshed.is_empty() {
                    patch
                        .attributes
                        .entry(key.clone())
                        .or_insert(FieldOp::Set(refreshed));
                }
            }
        }
    }

    patch.effects = migrate_effects(actor, renames);

    patch.healing_clock = match &actor.system.healing_clock {
        Some(value) if value.is_numeric() => FieldOp::Keep,
        Some(value) => FieldOp::Set(value.coerce_or_nan()),
        None => FieldOp::Set(Numeric::NotANumber),
    };

    Ok(patch)
}

fn move_attribute(
    attribute: &Attribute,
    new_key: &str,
    schema: &ReferenceSchema,
    renames: &RenameTable,
) -> Result<AttributePatch> {
    Ok(AttributePatch {
        label: FieldOp::Set(schema.attribute_label(new_key)?.to_string()),
        skills: migrate_skills(attribute, new_key, schema, renames, true)?,
        fields: attribute.extra.clone(),
    })
}

fn refresh_attribute(
    attribute: &Attribute,
    key: &str,
    schema: &ReferenceSchema,
    renames: &RenameTable,
) -> Result<AttributePatch> {
    Ok(AttributePatch {
        label: FieldOp::diff(Some(&attribute.label), schema.attribute_label(key)?.to_string()),
        skills: migrate_skills(attribute, key, schema, renames, false)?,
        fields: Default::default(),
    })
}

/// `template_key` names the attribute whose template supplies skill labels.
/// With `whole` set every skill is written in full, as needed when the
/// parent attribute itself moves.
fn migrate_skills(
    attribute: &Attribute,
    template_key: &str,
    schema: &ReferenceSchema,
    renames: &RenameTable,
    whole: bool,
) -> Result<BTreeMap<String, FieldOp<SkillPatch>>> {
    let mut skills = BTreeMap::new();

    for (key, skill) in &attribute.skills {
        let value = skill
            .value
            .as_ref()
            .map(Numeric::coerce_or_nan)
            .unwrap_or(Numeric::NotANumber);

        match renames.get(key) {
            Some(new_key) => {
                let label = schema.skill_label(template_key, new_key)?.to_string();
                skills.insert(
                    new_key.to_string(),
                    FieldOp::Set(SkillPatch {
                        label: FieldOp::Set(label),
                        value: FieldOp::Set(value),
                        fields: skill.extra.clone(),
                    }),
                );
                skills.insert(key.clone(), FieldOp::Delete);
            }
            None => {
                let label = schema.skill_label(template_key, key)?.to_string();
                let refreshed = if whole {
                    SkillPatch {
                        label: FieldOp::Set(label),
                        value: FieldOp::Set(value),
                        fields: skill.extra.clone(),
                    }
                } else {
                    SkillPatch {
                        label: FieldOp::diff(Some(&skill.label), label),
                        value: FieldOp::diff(skill.value.as_ref(), value),
                        fields: Default::default(),
                    }
                };
                if !refreshed.is_empty() {
                    skills.entry(key.clone()).or_insert(FieldOp::Set(refreshed));
                }
            }
        }
    }

    Ok(skills)
}

fn migrate_effects(actor: &Actor, renames: &RenameTable) -> FieldOp<Vec<EffectPatch>> {
    let rewritten: Vec<EffectPatch> = actor
        .effects
        .iter()
        .map(|effect| EffectPatch {
            id: effect.id.clone(),
            changes: effect
                .changes
                .iter()
                .map(|change| Change {
                    key: renames.rewrite_path(&change.key),
                    mode: change.mode,
                    value: change.value.clone(),
                })
                .collect(),
        })
        .collect();

    let changed = rewritten
        .iter()
        .zip(&actor.effects)
        .any(|(patch, effect)| patch.changes != effect.changes);

    if changed {
        FieldOp::Set(rewritten)
    } else {
        FieldOp::Keep
    }
}
