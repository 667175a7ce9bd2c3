//! Stage descriptors. The default sequence adds one CoNLL-U column group per stage.

use std::fmt;

use crate::pipeline::prompts::{
    BASE_SCHEMA, STAGE_INSTRUCTIONS_TEMPLATE, TASK_DEPREL, TASK_DEPS, TASK_FEATS, TASK_HEAD,
    TASK_LEXICAL,
};

/// The eight columns the model is asked to produce. XPOS and MISC are never
/// requested; the finalizer fills them with `_`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Id,
    Form,
    Lemma,
    Upos,
    Feats,
    Head,
    Deprel,
    Deps,
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Column::Id => "ID",
            Column::Form => "FORM",
            Column::Lemma => "LEMMA",
            Column::Upos => "UPOS",
            Column::Feats => "FEATS",
            Column::Head => "HEAD",
            Column::Deprel => "DEPREL",
            Column::Deps => "DEPS",
        };
        f.write_str(name)
    }
}

/// One ordered stage: the columns it adds and the task text shown to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub adds: Vec<Column>,
    pub description: String,
}

impl TaskSpec {
    pub fn new(adds: Vec<Column>, description: impl Into<String>) -> Self {
        Self {
            adds,
            description: description.into(),
        }
    }

    /// `ID, FORM, LEMMA, UPOS`
    pub fn columns_label(&self) -> String {
        self.adds
            .iter()
            .map(Column::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Instructions for this stage: the base schema followed by the task text.
    pub fn instructions(&self) -> String {
        STAGE_INSTRUCTIONS_TEMPLATE
            .replace("{schema}", BASE_SCHEMA)
            .replace("{task}", &self.description)
    }
}

/// The five-stage sequence used for every sentence.
pub fn default_tasks() -> Vec<TaskSpec> {
    vec![
        TaskSpec::new(
            vec![Column::Id, Column::Form, Column::Lemma, Column::Upos],
            TASK_LEXICAL,
        ),
        TaskSpec::new(vec![Column::Feats], TASK_FEATS),
        TaskSpec::new(vec![Column::Head], TASK_HEAD),
        TaskSpec::new(vec![Column::Deprel], TASK_DEPREL),
        TaskSpec::new(vec![Column::Deps], TASK_DEPS),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tasks_cover_every_column_once_in_order() {
        let columns: Vec<Column> = default_tasks()
            .into_iter()
            .flat_map(|t| t.adds)
            .collect();
        assert_eq!(
            columns,
            vec![
                Column::Id,
                Column::Form,
                Column::Lemma,
                Column::Upos,
                Column::Feats,
                Column::Head,
                Column::Deprel,
                Column::Deps,
            ]
        );
    }

    #[test]
    fn test_instructions_start_with_schema() {
        for task in default_tasks() {
            let instructions = task.instructions();
            assert!(instructions.starts_with(BASE_SCHEMA));
            assert!(instructions.ends_with(&task.description));
            assert!(instructions.contains("\nNow perform:\n"));
        }
    }

    #[test]
    fn test_first_stage_instructions_exact() {
        let tasks = default_tasks();
        assert_eq!(
            tasks[0].instructions(),
            format!("{BASE_SCHEMA}\nNow perform:\n- Task 1\nAssign ID, FORM, LEMMA, UPOS.")
        );
    }

    #[test]
    fn test_columns_label() {
        assert_eq!(default_tasks()[0].columns_label(), "ID, FORM, LEMMA, UPOS");
        assert_eq!(default_tasks()[4].columns_label(), "DEPS");
    }

    #[test]
    fn test_column_display_matches_schema_names() {
        let header = default_tasks()
            .iter()
            .flat_map(|t| t.adds.iter().map(|c| c.to_string()))
            .collect::<Vec<_>>()
            .join("⟶");
        assert!(BASE_SCHEMA.contains(&header));
    }
}
