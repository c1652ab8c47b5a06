use crate::core::{MigrationError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Labels of the current character template, keyed by attribute and skill.
///
/// Migrated attributes and skills take their display label from here, the
/// same way a freshly created character would.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSchema {
    pub attributes: BTreeMap<String, AttributeTemplate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeTemplate {
    pub label: String,
    #[serde(default)]
    pub skills: BTreeMap<String, SkillTemplate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillTemplate {
    pub label: String,
}

impl ReferenceSchema {
    pub fn empty() -> Self {
        Self {
            attributes: BTreeMap::new(),
        }
    }

    /// The RITS character template after the rename.
    pub fn character() -> Self {
        Self::empty()
            .with_attribute(
                "intuition",
                "RITS.Intuition",
                &[
                    ("stalk", "RITS.Stalk"),
                    ("study", "RITS.Study"),
                    ("survey", "RITS.Survey"),
                    ("engineer", "RITS.Engineer"),
                ],
            )
            .with_attribute(
                "body",
                "RITS.Body",
                &[
                    ("finesse", "RITS.Finesse"),
                    ("prowl", "RITS.Prowl"),
                    ("fight", "RITS.Fight"),
                    ("wreck", "RITS.Wreck"),
                ],
            )
            .with_attribute(
                "willpower",
                "RITS.Willpower",
                &[
                    ("attune", "RITS.Attune"),
                    ("command", "RITS.Command"),
                    ("consort", "RITS.Consort"),
                    ("influence", "RITS.Influence"),
                ],
            )
    }

    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        label: impl Into<String>,
        skills: &[(&str, &str)],
    ) -> Self {
        let skills = skills
            .iter()
            .map(|(skill_key, skill_label)| {
                (
                    skill_key.to_string(),
                    SkillTemplate {
                        label: skill_label.to_string(),
                    },
                )
            })
            .collect();
        self.attributes.insert(
            key.into(),
            AttributeTemplate {
                label: label.into(),
                skills,
            },
        );
        self
    }

    pub fn attribute_label(&self, attribute: &str) -> Result<&str> {
        self.attributes
            .get(attribute)
            .map(|template| template.label.as_str())
            .ok_or_else(|| MigrationError::MissingAttributeSchema {
                attribute: attribute.to_string(),
            })
    }

    pub fn skill_label(&self, attribute: &str, skill: &str) -> Result<&str> {
        let template = self.attributes.get(attribute).ok_or_else(|| {
            MigrationError::MissingAttributeSchema {
                attribute: attribute.to_string(),
            }
        })?;
        template
            .skills
            .get(skill)
            .map(|skill| skill.label.as_str())
            .ok_or_else(|| MigrationError::MissingSkillSchema {
                attribute: attribute.to_string(),
                skill: skill.to_string(),
            })
    }
}

impl Default for ReferenceSchema {
    fn default() -> Self {
        Self::character()
    }
}
