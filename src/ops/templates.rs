use indexmap::IndexMap;

use crate::model::status::{StatusDefinition, StatusTemplate};

/// Error type for template lookups
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("status template not found: {0}")]
    TemplateNotFound(String),
}

/// Catalog of status templates plus the one currently shaping the board.
///
/// The active id always names a catalog entry, so callers never observe a
/// board without a template.
#[derive(Debug, Clone)]
pub struct StatusTemplateRegistry {
    catalog: IndexMap<String, StatusTemplate>,
    active: String,
}

impl StatusTemplateRegistry {
    /// Build a registry over `templates` (catalog order = iteration order).
    pub fn new(
        templates: impl IntoIterator<Item = StatusTemplate>,
        active: &str,
    ) -> Result<Self, RegistryError> {
        let catalog: IndexMap<String, StatusTemplate> = templates
            .into_iter()
            .map(|t| (t.id.clone(), t))
            .collect();
        if !catalog.contains_key(active) {
            return Err(RegistryError::TemplateNotFound(active.to_string()));
        }
        Ok(StatusTemplateRegistry {
            catalog,
            active: active.to_string(),
        })
    }

    /// Registry over the built-in catalog with `default` active
    pub fn builtin() -> Self {
        StatusTemplateRegistry {
            catalog: builtin_templates()
                .into_iter()
                .map(|t| (t.id.clone(), t))
                .collect(),
            active: "default".to_string(),
        }
    }

    pub fn get_template(&self, id: &str) -> Result<&StatusTemplate, RegistryError> {
        self.catalog
            .get(id)
            .ok_or_else(|| RegistryError::TemplateNotFound(id.to_string()))
    }

    /// All templates in catalog order. The iterator is lazy and can be
    /// cloned to restart from the current position.
    pub fn list_templates(&self) -> impl Iterator<Item = &StatusTemplate> + Clone + '_ {
        self.catalog.values()
    }

    /// Swap the active template. Tasks are not touched here; the caller runs
    /// reconciliation right after.
    pub fn set_active(&mut self, id: &str) -> Result<&StatusTemplate, RegistryError> {
        let template = self
            .catalog
            .get(id)
            .ok_or_else(|| RegistryError::TemplateNotFound(id.to_string()))?;
        self.active = template.id.clone();
        Ok(template)
    }

    pub fn active(&self) -> &StatusTemplate {
        &self.catalog[self.active.as_str()]
    }

    pub fn active_id(&self) -> &str {
        &self.active
    }
}

fn template(id: &str, name: &str, category: &str, description: &str, statuses: Vec<StatusDefinition>) -> StatusTemplate {
    StatusTemplate {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        description: description.to_string(),
        statuses,
    }
}

/// The built-in workflow catalog
pub fn builtin_templates() -> Vec<StatusTemplate> {
    use StatusDefinition as S;
    vec![
        template(
            "default",
            "Default Business",
            "General",
            "Standard business project with comprehensive status tracking.",
            vec![
                S::new("not_started", "Not Started", "#95a5a6"),
                S::new("in_progress", "In Progress", "#4a6fa5"),
                S::special(
                    "under_review",
                    "Under Review",
                    "#f39c12",
                    2,
                    "Requires approval from 2 assignees before proceeding",
                ),
                S::new("completed", "Completed", "#2ecc71"),
                S::new("on_hold", "On Hold", "#e74c3c"),
            ],
        ),
        template(
            "agile",
            "Agile Development",
            "Development",
            "Agile development project for software teams using Scrum.",
            vec![
                S::new("backlog", "Product Backlog", "#95a5a6"),
                S::new("sprint_ready", "Sprint Ready", "#17a2b8"),
                S::new("in_development", "In Development", "#4a6fa5"),
                S::special(
                    "code_review",
                    "Code Review",
                    "#f39c12",
                    2,
                    "Requires approval from 2 senior developers",
                ),
                S::new("testing", "Testing", "#9b59b6"),
                S::new("deployed", "Deployed", "#2ecc71"),
            ],
        ),
        template(
            "creative",
            "Creative Project",
            "Creative",
            "Client projects from concept through final delivery.",
            vec![
                S::new("brief_review", "Brief Review", "#95a5a6"),
                S::new("concept_development", "Concept Development", "#9b59b6"),
                S::new("initial_design", "Initial Design", "#4a6fa5"),
                S::special("client_review", "Client Review", "#f39c12", 1, "Requires client approval"),
                S::special(
                    "final_approval",
                    "Final Approval",
                    "#fd7e14",
                    2,
                    "Requires approval from Creative Director and Account Manager",
                ),
                S::new("delivered", "Delivered", "#2ecc71"),
            ],
        ),
        template(
            "manufacturing",
            "Manufacturing",
            "Operations",
            "Manufacturing project with quality control checkpoints.",
            vec![
                S::new("design_review", "Design Review", "#95a5a6"),
                S::new("material_sourcing", "Material Sourcing", "#17a2b8"),
                S::new("prototype", "Prototype", "#4a6fa5"),
                S::special(
                    "quality_approval",
                    "Quality Approval",
                    "#f39c12",
                    2,
                    "Requires approval from 2 quality control engineers",
                ),
                S::new("production", "Production", "#9b59b6"),
                S::new("shipped", "Shipped", "#2ecc71"),
            ],
        ),
        template(
            "academic",
            "Academic Research",
            "Research",
            "Research project from proposal through publication.",
            vec![
                S::new("proposal", "Research Proposal", "#95a5a6"),
                S::special(
                    "ethics_review",
                    "Ethics Review",
                    "#f39c12",
                    3,
                    "Requires approval from 3 ethics committee members",
                ),
                S::new("data_collection", "Data Collection", "#4a6fa5"),
                S::new("analysis", "Data Analysis", "#9b59b6"),
                S::special(
                    "peer_review",
                    "Peer Review",
                    "#fd7e14",
                    3,
                    "Requires approval from 3 peer reviewers",
                ),
                S::new("published", "Published", "#2ecc71"),
            ],
        ),
        template(
            "simple",
            "Simple (3 Status)",
            "General",
            "Three-stage board for small teams.",
            vec![
                S::new("to_do", "To Do", "#95a5a6"),
                S::new("in_progress", "In Progress", "#4a6fa5"),
                S::new("completed", "Completed", "#2ecc71"),
            ],
        ),
    ]
}
